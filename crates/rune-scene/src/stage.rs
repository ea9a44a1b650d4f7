//! Frame driver.
//!
//! The stage owns the scene tree, the frame clock and the interaction
//! manager. The host calls [`Stage::tick`] once per display frame with a
//! monotonic timestamp in milliseconds; the stage turns it into a snippet,
//! updates the whole tree, then clears and repaints the surface.

use engine_core::{Matrix, Point, Rectangle, Surface};
use rune_config::StageConfig;

use crate::interaction::{EventResult, InteractionEvent, InteractionManager};
use crate::node::NodeId;
use crate::tree::SceneTree;

#[derive(Debug)]
pub struct Stage {
    tree: SceneTree,
    config: StageConfig,
    width: u32,
    height: u32,
    /// Displayed size of the surface, used to map host coordinates.
    style_size: (f64, f64),
    pixel_ratio: f64,
    /// Multiplies every snippet before it reaches the tree.
    pub time_scale: f64,
    pub auto_clear: bool,
    /// Timestamp of the previous tick.
    pt: Option<f64>,
    fps: f64,
    average_fps: f64,
    frames: u64,
    since_fps_log: f64,
    interaction: InteractionManager,
}

impl Stage {
    pub fn new(width: u32, height: u32) -> Self {
        let mut config = StageConfig::default();
        config.stage.width = width;
        config.stage.height = height;
        Self::with_config(&config)
    }

    pub fn with_config(config: &StageConfig) -> Self {
        let mut tree = SceneTree::new();
        tree.set_clip_interval(config.timing.default_clip_interval_ms);
        let mut interaction = InteractionManager::new();
        interaction.enabled = config.stage.interactive;

        let mut stage = Self {
            tree,
            config: config.clone(),
            width: 0,
            height: 0,
            style_size: (0.0, 0.0),
            pixel_ratio: 1.0,
            time_scale: config.stage.time_scale,
            auto_clear: config.stage.auto_clear,
            pt: None,
            fps: 0.0,
            average_fps: 0.0,
            frames: 0,
            since_fps_log: 0.0,
            interaction,
        };
        stage.set_pixel_ratio(config.stage.pixel_ratio);
        stage.resize(config.stage.width, config.stage.height, None);
        stage
    }

    pub fn config(&self) -> &StageConfig {
        &self.config
    }

    pub fn tree(&self) -> &SceneTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut SceneTree {
        &mut self.tree
    }

    pub fn root(&self) -> NodeId {
        self.tree.root()
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Pixel size the surface should have: logical size times pixel ratio.
    pub fn backing_size(&self) -> (u32, u32) {
        (
            (f64::from(self.width) * self.pixel_ratio).round() as u32,
            (f64::from(self.height) * self.pixel_ratio).round() as u32,
        )
    }

    pub fn pixel_ratio(&self) -> f64 {
        self.pixel_ratio
    }

    /// The root node carries the ratio as its scale, so the whole tree is
    /// laid out in logical pixels.
    pub fn set_pixel_ratio(&mut self, ratio: f64) {
        if !(ratio.is_finite() && ratio > 0.0) {
            tracing::warn!(ratio, "ignoring invalid pixel ratio");
            return;
        }
        self.pixel_ratio = ratio;
        let root = self.tree.root();
        if let Some(node) = self.tree.node_mut(root) {
            node.posture.scale_x = ratio;
            node.posture.scale_y = ratio;
        }
        self.tree.update_transform(root);
    }

    /// Change the logical size, and optionally the displayed size.
    pub fn resize(&mut self, width: u32, height: u32, style: Option<(f64, f64)>) {
        self.width = width;
        self.height = height;
        self.style_size = style.unwrap_or((f64::from(width), f64::from(height)));
        tracing::debug!(width, height, style = ?self.style_size, "stage resized");
    }

    /// Instantaneous and running-average frames per second.
    pub fn fps(&self) -> (f64, f64) {
        (self.fps, self.average_fps)
    }

    /// Map a point in displayed (host) coordinates to surface pixels, the
    /// space hit-testing runs in.
    pub fn to_stage_point(&self, x: f64, y: f64) -> Point {
        let (backing_w, backing_h) = self.backing_size();
        let (style_w, style_h) = self.style_size;
        let sx = if style_w > 0.0 { f64::from(backing_w) / style_w } else { 1.0 };
        let sy = if style_h > 0.0 { f64::from(backing_h) / style_h } else { 1.0 };
        Point::new(x * sx, y * sy)
    }

    /// Elapsed time since the previous call. The first call, a clock that
    /// went backwards, or a gap longer than `max_frame_gap_ms` yield zero.
    pub fn timeline(&mut self, now: f64) -> f64 {
        let max_gap = self.config.timing.max_frame_gap_ms;
        let snippet = match self.pt {
            Some(pt) if now >= pt && now - pt <= max_gap => now - pt,
            Some(pt) => {
                tracing::debug!(gap = now - pt, "frame gap too large; clock reset");
                0.0
            }
            None => 0.0,
        };
        self.pt = Some(now);
        if snippet > 0.0 {
            self.record_fps(snippet);
        }
        snippet
    }

    fn record_fps(&mut self, snippet: f64) {
        self.fps = 1000.0 / snippet.max(self.config.timing.min_frame_ms);
        self.frames += 1;
        self.average_fps += (self.fps - self.average_fps) / self.frames as f64;

        if self.config.diagnostics.log_fps {
            self.since_fps_log += snippet;
            if self.since_fps_log >= 1000.0 {
                self.since_fps_log = 0.0;
                tracing::debug!(fps = self.fps, average = self.average_fps, "fps");
            }
        }
    }

    /// Advance every animation and refresh world transforms.
    pub fn update(&mut self, snippet: f64) {
        let root = self.tree.root();
        tracing::trace!(snippet, "stage update");
        self.tree.update_posture(root, self.time_scale * snippet);
    }

    /// Clear (when `auto_clear` is set) and paint the tree.
    pub fn render(&self, surface: &mut dyn Surface) {
        if self.auto_clear {
            let (w, h) = surface.size();
            surface.set_transform(&Matrix::IDENTITY);
            surface.clear_rect(Rectangle::new(0.0, 0.0, f64::from(w), f64::from(h)));
        }
        self.tree.render(self.tree.root(), surface);
    }

    /// One frame: measure, update, render. Returns the snippet used.
    pub fn tick(&mut self, now: f64, surface: &mut dyn Surface) -> f64 {
        let backing = self.backing_size();
        if surface.size() != backing {
            surface.resize(backing.0, backing.1);
        }
        let snippet = self.timeline(now);
        self.update(snippet);
        self.render(surface);
        snippet
    }

    /// Route a normalized input event through hit-testing and bubbling.
    pub fn dispatch(&mut self, event: InteractionEvent) -> EventResult {
        let root = self.tree.root();
        self.interaction.dispatch(&self.tree, root, event)
    }

    pub fn interaction(&self) -> &InteractionManager {
        &self.interaction
    }

    pub fn interaction_mut(&mut self) -> &mut InteractionManager {
        &mut self.interaction
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;
    use engine_core::{Command, DisplayList};

    const EPSILON: f64 = 1e-9;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn test_timeline_resets_on_first_frame_and_gaps() {
        let mut stage = Stage::new(100, 100);
        assert_eq!(stage.timeline(1000.0), 0.0);
        assert_eq!(stage.timeline(1016.0), 16.0);
        assert_eq!(stage.timeline(1216.0), 200.0);
        assert_eq!(stage.timeline(1500.0), 0.0);
        assert_eq!(stage.timeline(1400.0), 0.0);
        assert_eq!(stage.timeline(1410.0), 10.0);
    }

    #[test]
    fn test_fps_uses_frame_floor() {
        let mut stage = Stage::new(100, 100);
        stage.timeline(0.0);
        stage.timeline(5.0);
        assert!(approx_eq(stage.fps().0, 1000.0 / 15.0));
        stage.timeline(25.0);
        assert!(approx_eq(stage.fps().0, 50.0));
        assert!(approx_eq(stage.fps().1, (1000.0 / 15.0 + 50.0) / 2.0));
    }

    #[test]
    fn test_time_scale_scales_snippet() {
        let mut stage = Stage::new(100, 100);
        stage.time_scale = 2.0;
        let root = stage.root();
        let id = stage.tree_mut().create(root, Node::container());
        let linear = crate::animation::AnimateOptions::new()
            .duration(100.0)
            .ease(crate::animation::EasingFunction::Linear);
        stage.tree_mut().node_mut(id).unwrap().animation.to(
            crate::animation::TransitionOptions::to(
                crate::animation::Pose::new().with(crate::animation::Prop::X, 50.0),
                linear,
            ),
            false,
        );
        stage.update(25.0);
        assert!(approx_eq(stage.tree().node(id).unwrap().posture.x, 25.0));
    }

    #[test]
    fn test_pixel_ratio_scales_backing_and_root() {
        let mut config = StageConfig::default();
        config.stage.width = 100;
        config.stage.height = 50;
        config.stage.pixel_ratio = 2.0;
        let mut stage = Stage::with_config(&config);
        assert_eq!(stage.backing_size(), (200, 100));

        let root = stage.root();
        let child = stage.tree_mut().create(root, Node::container().at(10.0, 10.0));
        let mut list = DisplayList::new(1, 1);
        stage.tick(0.0, &mut list);
        assert_eq!(list.size(), (200, 100));
        assert_eq!(stage.tree().node(child).unwrap().world_transform().tx, 20.0);

        stage.resize(100, 50, Some((50.0, 25.0)));
        let p = stage.to_stage_point(25.0, 5.0);
        assert!(approx_eq(p.x, 100.0));
        assert!(approx_eq(p.y, 20.0));
    }

    #[test]
    fn test_undrained_infinite_animation_stays_bounded() {
        use crate::animation::{AnimateOptions, EVENT_QUEUE_CAPACITY, Pose, Prop, TransitionOptions};

        let mut stage = Stage::new(100, 100);
        let root = stage.root();
        let id = stage.tree_mut().create(root, Node::container());
        stage.tree_mut().node_mut(id).unwrap().animation.to(
            TransitionOptions::to(
                Pose::new().with(Prop::X, 10.0),
                AnimateOptions::new().duration(16.0).infinity(true),
            ),
            false,
        );

        let mut list = DisplayList::new(1, 1);
        for frame in 0..10_000 {
            list.reset();
            stage.tick(f64::from(frame) * 16.0, &mut list);
        }
        let host = &stage.tree().node(id).unwrap().animation;
        assert_eq!(host.len(), 1);
        assert!(host.pending_events() <= EVENT_QUEUE_CAPACITY);

        let events = stage.tree_mut().drain_animation_events();
        assert!(events.iter().all(|(node, _)| *node == id));
        assert!(matches!(
            events.last(),
            Some((_, crate::animation::AnimationEvent::Iteration { iteration, .. })) if *iteration > 9_000
        ));
    }

    #[test]
    fn test_render_clears_first() {
        let mut stage = Stage::new(10, 10);
        let mut list = DisplayList::new(10, 10);
        stage.render(&mut list);
        assert!(matches!(list.commands.get(1), Some(Command::ClearRect(r)) if r.width == 10.0));

        stage.auto_clear = false;
        list.reset();
        stage.render(&mut list);
        assert!(!list.commands.iter().any(|c| matches!(c, Command::ClearRect(_))));
    }
}
