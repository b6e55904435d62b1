use glam::Vec2;

/// Split `total_samples` across the spans of a half outline by span length.
///
/// There are `points.len() + 1` spans: origin to the first point, between
/// consecutive points, and the last point to the tip at (0, 1). Each span
/// gets `floor(length / total_length * total_samples)` independently, so
/// the allocations sum to at most `total_samples` and usually a little
/// less. A zero-length outline allocates nothing.
pub fn allocate_samples(points: &[Vec2], total_samples: usize) -> Vec<usize> {
    let tip = Vec2::new(0.0, 1.0);

    let mut lengths = Vec::with_capacity(points.len() + 1);
    let mut prev = Vec2::ZERO;
    for &p in points {
        lengths.push(prev.distance(p));
        prev = p;
    }
    if !points.is_empty() {
        lengths.push(prev.distance(tip));
    }

    let total: f32 = lengths.iter().sum();
    if total <= 0.0 || !total.is_finite() {
        return vec![0; lengths.len()];
    }

    lengths
        .into_iter()
        .map(|l| (l / total * total_samples as f32).floor() as usize)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_count() {
        let points = [Vec2::new(0.2, 0.3), Vec2::new(0.3, 0.6), Vec2::new(0.1, 0.9)];
        assert_eq!(allocate_samples(&points, 20).len(), 4);
    }

    #[test]
    fn test_proportional_to_length() {
        // Spans of length 0.5 and 0.5
        let points = [Vec2::new(0.0, 0.5)];
        assert_eq!(allocate_samples(&points, 20), vec![10, 10]);

        // Spans of length 0.25 and 0.75
        let points = [Vec2::new(0.0, 0.25)];
        assert_eq!(allocate_samples(&points, 8), vec![2, 6]);
    }

    #[test]
    fn test_sum_never_exceeds_total() {
        let outlines: [&[Vec2]; 3] = [
            &[Vec2::new(0.1, 0.1), Vec2::new(0.25, 0.4), Vec2::new(0.2, 0.8)],
            &[Vec2::new(0.5, 0.0)],
            &[Vec2::new(0.05, 0.3), Vec2::new(0.45, 0.31), Vec2::new(0.05, 0.95)],
        ];
        for points in outlines {
            for total in [1, 7, 20, 101] {
                let counts = allocate_samples(points, total);
                assert!(counts.iter().sum::<usize>() <= total);
            }
        }
    }

    #[test]
    fn test_point_at_origin() {
        let points = [Vec2::ZERO];
        let counts = allocate_samples(&points, 20);
        assert_eq!(counts, vec![0, 20]);

        assert!(allocate_samples(&[], 20).is_empty());
    }

    #[test]
    fn test_degenerate_total_length() {
        let points = [Vec2::new(f32::NAN, 0.0)];
        assert_eq!(allocate_samples(&points, 20), vec![0, 0]);
    }
}
