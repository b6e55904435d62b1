//! Whole-tree bloom controller
//!
//! Owns the root of a part tree and drives it once per host frame.

use log::debug;

use super::part::PartNode;

#[derive(Debug, Clone)]
pub struct GrowthScheduler {
    root: PartNode,
    /// Seconds since the last start
    elapsed: f32,
    playing: bool,
    complete: bool,
}

impl GrowthScheduler {
    /// Wrap a built tree without starting it
    pub fn new(root: PartNode) -> Self {
        Self {
            root,
            elapsed: 0.0,
            playing: false,
            complete: false,
        }
    }

    /// Wrap a tree and show it fully grown
    pub fn instant(root: PartNode) -> Self {
        let mut scheduler = Self::new(root);
        scheduler.complete_instantly();
        scheduler
    }

    /// Start blooming from the root
    pub fn start(&mut self, speed: f32) {
        self.elapsed = 0.0;
        self.playing = true;
        self.complete = false;
        self.root.activate(speed);
        debug!("bloom started at speed {} over {} parts", speed, self.root.count());
    }

    pub fn update(&mut self, dt: f32) {
        if !self.playing || self.complete {
            return;
        }

        let dt = dt.max(0.0);
        self.elapsed += dt;
        self.root.tick(dt);

        if self.root.is_settled() {
            self.playing = false;
            self.complete = true;
            debug!("bloom settled after {:.2}s", self.elapsed);
        }
    }

    /// Jump to the fully bloomed state
    pub fn complete_instantly(&mut self) {
        self.root.settle_all();
        self.playing = false;
        self.complete = true;
    }

    /// Hide everything and wait for the next start
    pub fn reset(&mut self) {
        self.root.reset_all();
        self.elapsed = 0.0;
        self.playing = false;
        self.complete = false;
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn root(&self) -> &PartNode {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::part::{GrowthState, PartKind, FULLY_VISIBLE};

    fn tree() -> PartNode {
        let mut root = PartNode::new("root", PartKind::Stover);
        let mut head = PartNode::new("head", PartKind::None);
        for i in 0..4 {
            head.add(PartNode::new("petal", PartKind::Petal), i as f32 / 4.0);
        }
        root.add(PartNode::new("leaf", PartKind::Stover), 0.5);
        root.add(head, 1.0);
        root
    }

    #[test]
    fn test_idle_until_started() {
        let mut scheduler = GrowthScheduler::new(tree());
        scheduler.update(1.0);
        assert!(!scheduler.is_playing());
        assert!(!scheduler.is_complete());
        assert_eq!(scheduler.root().timer(), 0.0);
    }

    #[test]
    fn test_runs_to_completion() {
        let mut scheduler = GrowthScheduler::new(tree());
        scheduler.start(1.0);
        assert!(scheduler.is_playing());

        let mut frames = 0;
        while scheduler.is_playing() && frames < 1000 {
            scheduler.update(1.0 / 60.0);
            frames += 1;
        }

        assert!(scheduler.is_complete());
        assert!(!scheduler.is_playing());
        // Head starts at 1.0s, its last petal at 1.75s, which settles 1.1s later
        assert!(scheduler.elapsed() > 2.8 && scheduler.elapsed() < 3.0);
        assert!(scheduler.root().is_settled());
        assert!(scheduler
            .root()
            .iter_preorder()
            .filter(|n| n.kind() != PartKind::None)
            .all(|n| n.render().fade > 1.0));
    }

    #[test]
    fn test_speed_shortens_bloom() {
        let mut scheduler = GrowthScheduler::new(tree());
        scheduler.start(2.0);
        for _ in 0..200 {
            scheduler.update(1.0 / 60.0);
        }
        assert!(scheduler.is_complete());
        assert!(scheduler.elapsed() < 1.6);
    }

    #[test]
    fn test_complete_instantly_and_reset() {
        let mut scheduler = GrowthScheduler::instant(tree());
        assert!(scheduler.is_complete());
        assert!(scheduler.root().is_settled());
        assert_eq!(scheduler.root().render().fade, FULLY_VISIBLE);

        scheduler.reset();
        assert!(!scheduler.is_complete());
        assert!(scheduler
            .root()
            .iter_preorder()
            .all(|n| n.state() == GrowthState::Dormant && n.render().fade == 0.0));

        scheduler.start(1.0);
        scheduler.update(0.1);
        assert!((scheduler.root().timer() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_negative_dt_ignored() {
        let mut scheduler = GrowthScheduler::new(tree());
        scheduler.start(1.0);
        scheduler.update(-1.0);
        assert_eq!(scheduler.root().timer(), 0.0);
    }
}
