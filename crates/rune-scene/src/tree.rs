//! The scene graph.
//!
//! Nodes live in an arena owned by `SceneTree` and are addressed by
//! [`NodeId`]. A node has at most one parent; its children list is the paint
//! and hit-test order, re-sorted by z-index whenever a z-index changed.
//!
//! Per frame the tree runs two separate passes:
//!
//! ```text
//! update_posture(root, snippet)        render(root, surface)
//!   skip if not ready                    skip if invisible or not ready
//!   stable z-sort if dirty               save, set world transform + alpha
//!   snippet *= time_scale                clip to mask
//!   tick animations (unless paused)      render_me
//!   world = parent.world · local         children in order
//!   recurse with the scaled snippet      blur, restore
//! ```
//!
//! Structural misuse (self-parenting, cycles, unknown ids) is logged and the
//! call becomes a no-op, so one bad call site cannot stop the frame loop.
//! The `try_*` variants return the error instead.

use std::cmp::Ordering;

use engine_core::{BlurFilter, Bounds, HitArea, Matrix, Point, Rectangle, Surface};

use crate::animation::{AnimateOptions, AnimationEvent, AnimationId, DEFAULT_CLIP_INTERVAL};
use crate::elements::Renderable;
use crate::error::SceneError;
use crate::eventer::ListenerId;
use crate::interaction::InteractionEvent;
use crate::node::{Node, NodeId};

#[derive(Debug)]
pub struct SceneTree {
    nodes: Vec<Option<Node>>,
    root: NodeId,
    /// Frame interval for clips that declare no fps.
    clip_interval: f64,
}

impl Default for SceneTree {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneTree {
    /// Empty tree holding only the root container.
    pub fn new() -> Self {
        Self {
            nodes: vec![Some(Node::container().named("stage"))],
            root: NodeId(0),
            clip_interval: DEFAULT_CLIP_INTERVAL,
        }
    }

    /// The root container; it can't be destroyed.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Frame interval in ms for clips without their own fps.
    pub fn set_clip_interval(&mut self, ms: f64) {
        self.clip_interval = if ms > 0.0 { ms } else { DEFAULT_CLIP_INTERVAL };
    }

    /// Add a detached node to the arena.
    pub fn insert(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Some(node));
        id
    }

    /// Insert `node` and attach it to `parent`.
    pub fn create(&mut self, parent: NodeId, node: Node) -> NodeId {
        let id = self.insert(node);
        self.adds(parent, &[id]);
        id
    }

    /// The node behind `id`, if it is still alive.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    /// Mutable access to a live node.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    fn get(&self, id: NodeId) -> Result<&Node, SceneError> {
        self.node(id).ok_or(SceneError::UnknownNode(id))
    }

    fn get_mut(&mut self, id: NodeId) -> Result<&mut Node, SceneError> {
        self.node_mut(id).ok_or(SceneError::UnknownNode(id))
    }

    /// Whether `id` refers to a live node.
    pub fn contains_node(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    /// Live node count, root included.
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ids of every live node, in arena order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(i, _)| NodeId(i))
    }

    /// Parent of `id`; `None` for the root and detached nodes.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(Node::parent)
    }

    /// Children of `id` in paint order.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(Node::children).unwrap_or_default()
    }

    /// Whether `ancestor` is `id` or lies on its parent chain.
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    /// Attach `child` as the last child of `parent`, detaching it from its
    /// previous parent. Fails on self-parenting and on cycles.
    pub fn try_add(&mut self, parent: NodeId, child: NodeId) -> Result<(), SceneError> {
        if parent == child {
            return Err(SceneError::SelfParenting(child));
        }
        self.get(parent)?;
        self.get(child)?;
        if self.is_ancestor(child, parent) {
            return Err(SceneError::Cycle { parent, child });
        }
        self.detach(child);

        let node = self.get_mut(child)?;
        node.parent = Some(parent);
        let parent_node = self.get_mut(parent)?;
        parent_node.children.push(child);
        parent_node.should_sort = true;
        Ok(())
    }

    /// Attach `children` to `parent` in order, detaching each from its
    /// previous parent first. Invalid entries are logged and skipped.
    pub fn adds(&mut self, parent: NodeId, children: &[NodeId]) {
        for &child in children {
            if let Err(err) = self.try_add(parent, child) {
                tracing::error!(%err, "adds: child ignored");
            }
        }
    }

    /// Detach `child` from `parent`; fails when it is not a child of `parent`.
    pub fn try_remove(&mut self, parent: NodeId, child: NodeId) -> Result<(), SceneError> {
        let node = self.get(child)?;
        if node.parent != Some(parent) {
            return Err(SceneError::DetachedNode(child));
        }
        self.detach(child);
        Ok(())
    }

    /// Detach each of `children` from `parent`, logging the ones that aren't.
    pub fn remove(&mut self, parent: NodeId, children: &[NodeId]) {
        for &child in children {
            if let Err(err) = self.try_remove(parent, child) {
                tracing::warn!(%err, "remove: child ignored");
            }
        }
    }

    /// Unlink `id` from its parent, if any. The node stays in the arena.
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        if let Some(parent_node) = self.node_mut(parent) {
            parent_node.children.retain(|&c| c != id);
        }
        if let Some(node) = self.node_mut(id) {
            node.parent = None;
        }
    }

    /// Detach `id` and free it together with its whole subtree.
    pub fn destroy(&mut self, id: NodeId) {
        if id == self.root {
            tracing::error!("the root node cannot be destroyed");
            return;
        }
        self.detach(id);
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get_mut(current.0).and_then(Option::take) {
                stack.extend(node.children);
            }
        }
        for node in self.nodes.iter_mut().flatten() {
            if node.mask.is_some_and(|m| m == id) {
                node.mask = None;
            }
        }
    }

    /// Change a node's z-index and mark its parent for re-sorting.
    pub fn set_z_index(&mut self, id: NodeId, z_index: f64) {
        let Some(node) = self.node_mut(id) else {
            tracing::warn!(?id, "set_z_index on unknown node");
            return;
        };
        if node.z_index == z_index {
            return;
        }
        node.z_index = z_index;
        let parent = node.parent;
        if let Some(parent) = parent.and_then(|p| self.node_mut(p)) {
            parent.should_sort = true;
        }
    }

    /// Clip `id` and its subtree to `mask`'s geometry. A mask that is not
    /// attached anywhere follows `id`'s transform.
    pub fn set_mask(&mut self, id: NodeId, mask: Option<NodeId>) {
        if mask == Some(id) {
            tracing::error!(?id, "a node cannot mask itself");
            return;
        }
        if let Some(m) = mask.filter(|&m| !self.contains_node(m)) {
            tracing::warn!(mask = ?m, "unknown mask node");
            return;
        }
        if let Some(node) = self.node_mut(id) {
            node.mask = mask;
        }
    }

    /// Replace the node's hit area, in local coordinates.
    pub fn set_area(&mut self, id: NodeId, area: impl Into<HitArea>) {
        if let Some(node) = self.node_mut(id) {
            node.event_area = Some(area.into());
        }
    }

    /// Use the element's own local extent as its hit area.
    pub fn set_bound(&mut self, id: NodeId) {
        let Some(node) = self.node_mut(id) else {
            return;
        };
        match node.kind.local_bounds() {
            Some(rect) => node.event_area = Some(HitArea::Rectangle(rect)),
            None => tracing::warn!(?id, "set_bound: node has no local extent"),
        }
    }

    /// Blur the node's rendered subtree; `None` removes the filter.
    pub fn set_blur(&mut self, id: NodeId, blur: Option<BlurFilter>) {
        if let Some(node) = self.node_mut(id) {
            node.blur = blur;
        }
    }

    fn parent_world(&self, id: NodeId) -> (Matrix, f64) {
        match self.parent(id).and_then(|p| self.node(p)) {
            Some(parent) => (parent.world_transform, parent.world_alpha),
            None => (Matrix::IDENTITY, 1.0),
        }
    }

    /// Recompute one node's world transform from its parent's current one.
    pub fn update_transform(&mut self, id: NodeId) {
        let (world, alpha) = self.parent_world(id);
        if let Some(node) = self.node_mut(id) {
            node.update_transform(&world, alpha);
        }
    }

    /// Advance animations and refresh world transforms for `id`'s subtree.
    pub fn update_posture(&mut self, id: NodeId, snippet: f64) {
        let (world, alpha) = self.parent_world(id);
        self.update_node(id, snippet, &world, alpha);
    }

    fn update_node(&mut self, id: NodeId, snippet: f64, parent: &Matrix, parent_alpha: f64) {
        let Some(node) = self.node_mut(id) else {
            return;
        };
        if !node.is_ready() {
            return;
        }
        let resort = std::mem::take(&mut node.should_sort);
        if resort {
            self.sort_children(id);
        }

        let Some(node) = self.node_mut(id) else {
            return;
        };
        let snippet = snippet * node.time_scale;
        if !node.paused {
            let (host, mut target) = node.animation_target();
            host.update(snippet, &mut target);
        }
        if let Some(next) = node.animation.take_next_clip() {
            self.play(id, &next, &AnimateOptions::default());
        }

        let Some(node) = self.node_mut(id) else {
            return;
        };
        node.update_transform(parent, parent_alpha);
        let world = node.world_transform;
        let alpha = node.world_alpha;
        let mask = node.mask;
        let children = node.children.clone();

        if let Some(mask) = mask.filter(|&m| self.parent(m).is_none() && m != self.root) {
            self.update_node(mask, snippet, &world, alpha);
        }
        for child in children {
            self.update_node(child, snippet, &world, alpha);
        }
    }

    /// Stable sort by z-index; equal keys keep their insertion order.
    fn sort_children(&mut self, id: NodeId) {
        let mut keyed: Vec<(f64, NodeId)> = self
            .children(id)
            .iter()
            .map(|&c| (self.node(c).map_or(0.0, Node::z_index), c))
            .collect();
        keyed.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
        if let Some(node) = self.node_mut(id) {
            node.children = keyed.into_iter().map(|(_, c)| c).collect();
        }
    }

    /// Recompute and store world-space bounds for `id`'s subtree.
    pub fn calculate_bounds(&mut self, id: NodeId) -> Bounds {
        let Some(node) = self.node_mut(id) else {
            return Bounds::new();
        };
        node.bounds.clear();
        if !node.is_visible() {
            return node.bounds;
        }
        let mut bounds = Bounds::new();
        if let Some(rect) = node.kind.local_bounds() {
            bounds.add_frame(&node.world_transform, &rect);
        }
        let children = node.children.clone();
        for child in children {
            let child_bounds = self.calculate_bounds(child);
            bounds.add_bounds(&child_bounds);
        }
        if let Some(node) = self.node_mut(id) {
            node.bounds = bounds;
        }
        bounds
    }

    /// Bounds of `id`'s subtree from the current transforms, without storing.
    pub fn world_bounds(&self, id: NodeId) -> Bounds {
        let mut bounds = Bounds::new();
        let Some(node) = self.node(id) else {
            return bounds;
        };
        if !node.is_visible() {
            return bounds;
        }
        if let Some(rect) = node.kind.local_bounds() {
            bounds.add_frame(&node.world_transform, &rect);
        }
        for &child in &node.children {
            bounds.add_bounds(&self.world_bounds(child));
        }
        bounds
    }

    /// Whether the global point falls inside the node's hit area.
    pub fn contains(&self, id: NodeId, global: Point) -> bool {
        let Some(node) = self.node(id) else {
            return false;
        };
        let Some(area) = &node.event_area else {
            return false;
        };
        let local = node.world_transform.apply_inverse(global);
        area.contains(local.x, local.y)
    }

    /// Topmost node under `global` in `id`'s subtree, children before parents
    /// and later siblings before earlier ones.
    pub fn hit_test(&self, id: NodeId, global: Point) -> Option<NodeId> {
        let node = self.node(id)?;
        if !node.is_visible() || !node.is_ready() {
            return None;
        }
        if node.interactive_children {
            for &child in node.children.iter().rev() {
                if let Some(hit) = self.hit_test(child, global) {
                    return Some(hit);
                }
            }
        }
        if !node.pass_event && self.contains(id, global) {
            Some(id)
        } else {
            None
        }
    }

    /// Paint `id`'s subtree depth-first.
    pub fn render(&self, id: NodeId, surface: &mut dyn Surface) {
        let Some(node) = self.node(id) else {
            return;
        };
        if !node.is_visible() || !node.is_ready() {
            return;
        }
        surface.save();
        surface.set_transform(&node.world_transform);
        surface.set_global_alpha(node.world_alpha);

        if let Some(mask) = node.mask.and_then(|m| self.node(m)) {
            surface.set_transform(&mask.world_transform);
            if !mask.kind.clip_me(surface) {
                tracing::debug!(?id, "mask has no clip geometry");
            }
            surface.set_transform(&node.world_transform);
        }

        node.kind.render_me(surface);
        for &child in &node.children {
            self.render(child, surface);
        }

        if let Some(blur) = node.blur {
            self.apply_blur(id, &blur, surface);
        }
        surface.restore();
    }

    fn apply_blur(&self, id: NodeId, blur: &BlurFilter, surface: &mut dyn Surface) {
        let bounds = self.world_bounds(id);
        if bounds.is_empty() {
            return;
        }
        let area = bounds.rectangle();
        let (px, py) = blur.padding();
        let (px, py) = (f64::from(px), f64::from(py));
        let region = Rectangle::new(
            area.x - px,
            area.y - py,
            area.width + 2.0 * px,
            area.height + 2.0 * py,
        );
        match surface.get_image_data(region) {
            Some(mut pixels) => {
                blur.apply(&mut pixels);
                let x = region.x.floor().max(0.0) as i64;
                let y = region.y.floor().max(0.0) as i64;
                surface.put_image_data(&pixels, x, y);
            }
            None => tracing::trace!(?id, "surface has no pixel access; blur skipped"),
        }
    }

    /// Start the sprite clip `name` on `id`, replacing any running clip.
    pub fn try_play(
        &mut self,
        id: NodeId,
        name: &str,
        timing: &AnimateOptions,
    ) -> Result<AnimationId, SceneError> {
        let interval = self.clip_interval;
        let node = self.get_mut(id)?;
        let sprite = node
            .kind
            .as_sprite_mut()
            .ok_or(SceneError::NotASprite(id))?;
        let clip = sprite
            .clip(name)
            .cloned()
            .ok_or_else(|| SceneError::MissingClip(name.to_string()))?;
        if let Some(&first) = clip.frames.resolve().first() {
            sprite.set_frame(first);
        }
        node.animation.clear_clips();
        Ok(node.animation.movie_clip(name, &clip, timing, interval, false))
    }

    /// Like [`try_play`](Self::try_play), logging failures instead.
    pub fn play(&mut self, id: NodeId, name: &str, timing: &AnimateOptions) -> Option<AnimationId> {
        match self.try_play(id, name, timing) {
            Ok(animation) => Some(animation),
            Err(err) => {
                tracing::warn!(%err, "play ignored");
                None
            }
        }
    }

    /// Subscribe to interaction events of `name` on `id`.
    pub fn on(
        &self,
        id: NodeId,
        name: &str,
        callback: impl FnMut(&InteractionEvent) + 'static,
    ) -> Option<ListenerId> {
        self.node(id).map(|node| node.listeners.on(name, callback))
    }

    /// Subscribe a listener that runs at most once.
    pub fn once(
        &self,
        id: NodeId,
        name: &str,
        callback: impl FnMut(&InteractionEvent) + 'static,
    ) -> Option<ListenerId> {
        self.node(id).map(|node| node.listeners.once(name, callback))
    }

    /// Unsubscribe; returns false when the listener was already gone.
    pub fn off(&self, id: NodeId, listener: ListenerId) -> bool {
        self.node(id).is_some_and(|node| node.listeners.off(listener))
    }

    /// Run `id`'s listeners for `name`; returns how many ran.
    pub fn emit(&self, id: NodeId, name: &str, event: &InteractionEvent) -> usize {
        self.node(id)
            .map_or(0, |node| node.listeners.emit(name, event))
    }

    /// Animation lifecycle events from every node, tagged with the node.
    pub fn drain_animation_events(&mut self) -> Vec<(NodeId, AnimationEvent)> {
        let mut events = Vec::new();
        for (index, slot) in self.nodes.iter_mut().enumerate() {
            if let Some(node) = slot {
                events.extend(node.animation.drain_events().map(|e| (NodeId(index), e)));
            }
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{ClipDescriptor, Pose, Prop, TransitionOptions};
    use crate::elements::{Graphics, Sprite};
    use crate::texture::Texture;
    use engine_core::{Color, Command, DisplayList};

    const EPSILON: f64 = 1e-9;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < EPSILON
    }

    fn square(size: f64) -> Node {
        let mut g = Graphics::new();
        g.rect(0.0, 0.0, size, size).fill(Color::WHITE);
        Node::graphics(g)
    }

    #[test]
    fn test_add_rejects_self_and_cycles() {
        let mut tree = SceneTree::new();
        let root = tree.root();
        let a = tree.create(root, Node::container());
        let b = tree.create(a, Node::container());

        assert_eq!(tree.try_add(a, a), Err(SceneError::SelfParenting(a)));
        assert_eq!(tree.try_add(b, a), Err(SceneError::Cycle { parent: b, child: a }));
        tree.adds(b, &[a]);
        assert_eq!(tree.parent(a), Some(root));
        assert_eq!(tree.children(a), &[b]);
    }

    #[test]
    fn test_reparenting_detaches_first() {
        let mut tree = SceneTree::new();
        let root = tree.root();
        let a = tree.create(root, Node::container());
        let b = tree.create(root, Node::container());
        let c = tree.create(a, Node::container());

        tree.adds(b, &[c]);
        assert!(tree.children(a).is_empty());
        assert_eq!(tree.children(b), &[c]);
        assert_eq!(tree.parent(c), Some(b));

        tree.remove(a, &[c]);
        assert_eq!(tree.parent(c), Some(b));
        tree.remove(b, &[c]);
        assert_eq!(tree.parent(c), None);
        assert!(tree.contains_node(c));
    }

    #[test]
    fn test_destroy_frees_subtree() {
        let mut tree = SceneTree::new();
        let root = tree.root();
        let a = tree.create(root, Node::container());
        let b = tree.create(a, Node::container());
        tree.destroy(a);
        assert!(!tree.contains_node(a));
        assert!(!tree.contains_node(b));
        assert!(tree.children(root).is_empty());
        tree.destroy(root);
        assert!(tree.contains_node(root));
    }

    #[test]
    fn test_z_sort_only_when_dirty() {
        let mut tree = SceneTree::new();
        let root = tree.root();
        let a = tree.create(root, Node::container().with_z(2.0));
        let b = tree.create(root, Node::container().with_z(1.0));
        tree.update_posture(root, 0.0);
        assert_eq!(tree.children(root), &[b, a]);

        tree.set_z_index(a, 0.0);
        assert_eq!(tree.children(root), &[b, a]);
        tree.update_posture(root, 0.0);
        assert_eq!(tree.children(root), &[a, b]);
    }

    #[test]
    fn test_time_scale_compounds_and_pause_is_local() {
        let mut tree = SceneTree::new();
        let root = tree.root();
        let parent = tree.create(root, Node::container());
        let child = tree.create(parent, Node::container());
        tree.node_mut(parent).unwrap().time_scale = 0.5;
        tree.node_mut(parent).unwrap().paused = true;

        let linear = AnimateOptions::new()
            .duration(100.0)
            .ease(crate::animation::EasingFunction::Linear);
        for id in [parent, child] {
            tree.node_mut(id).unwrap().animation.to(
                TransitionOptions::to(Pose::new().with(Prop::X, 100.0), linear.clone()),
                false,
            );
        }
        tree.update_posture(root, 40.0);
        assert_eq!(tree.node(parent).unwrap().posture.x, 0.0);
        assert!(approx_eq(tree.node(child).unwrap().posture.x, 20.0));
    }

    #[test]
    fn test_not_ready_subtree_is_frozen() {
        let mut tree = SceneTree::new();
        let root = tree.root();
        let texture = Texture::new("late", "late.png");
        let sprite = tree.create(root, Node::sprite(Sprite::new(texture)).at(5.0, 5.0));
        let child = tree.create(sprite, Node::container().at(1.0, 1.0));
        tree.update_posture(root, 16.0);
        assert_eq!(tree.node(child).unwrap().world_transform().tx, 0.0);

        let mut list = DisplayList::new(10, 10);
        tree.render(root, &mut list);
        assert!(list.images().next().is_none());
    }

    #[test]
    fn test_contains_uses_inverse_transform() {
        let mut tree = SceneTree::new();
        let root = tree.root();
        let id = tree.create(root, square(10.0).at(100.0, 100.0));
        tree.node_mut(id).unwrap().posture.scale_x = 2.0;
        tree.set_bound(id);
        tree.update_posture(root, 0.0);

        assert!(tree.contains(id, Point::new(115.0, 105.0)));
        assert!(!tree.contains(id, Point::new(95.0, 105.0)));
        assert!(!tree.contains(root, Point::new(115.0, 105.0)));
    }

    #[test]
    fn test_hit_test_order_and_pass_event() {
        let mut tree = SceneTree::new();
        let root = tree.root();
        let below = tree.create(root, square(10.0));
        let above = tree.create(root, square(10.0));
        tree.set_bound(below);
        tree.set_bound(above);
        tree.update_posture(root, 0.0);

        let p = Point::new(5.0, 5.0);
        assert_eq!(tree.hit_test(root, p), Some(above));
        tree.node_mut(above).unwrap().pass_event = true;
        assert_eq!(tree.hit_test(root, p), Some(below));
        tree.node_mut(root).unwrap().interactive_children = false;
        assert_eq!(tree.hit_test(root, p), None);
    }

    #[test]
    fn test_render_order_and_state_balance() {
        let mut tree = SceneTree::new();
        let root = tree.root();
        let a = tree.create(root, square(4.0).at(10.0, 0.0));
        let hidden = tree.create(root, square(4.0));
        tree.node_mut(hidden).unwrap().visible = false;
        tree.node_mut(a).unwrap().posture.alpha = 0.5;
        tree.update_posture(root, 0.0);

        let mut list = DisplayList::new(50, 50);
        tree.render(root, &mut list);
        assert_eq!(list.depth(), 0);
        let fills: Vec<_> = list
            .commands
            .iter()
            .filter_map(|c| match c {
                Command::FillPath { transform, alpha, .. } => Some((*transform, *alpha)),
                _ => None,
            })
            .collect();
        assert_eq!(fills.len(), 1);
        assert_eq!(fills[0].0.tx, 10.0);
        assert!(approx_eq(fills[0].1, 0.5));
    }

    #[test]
    fn test_mask_clips_before_content() {
        let mut tree = SceneTree::new();
        let root = tree.root();
        let content = tree.create(root, square(20.0));
        let mask = tree.insert(square(5.0).at(3.0, 0.0));
        tree.set_mask(content, Some(mask));
        tree.update_posture(root, 0.0);
        assert_eq!(tree.node(mask).unwrap().world_transform().tx, 3.0);

        let mut list = DisplayList::new(50, 50);
        tree.render(root, &mut list);
        let clip = list
            .commands
            .iter()
            .position(|c| matches!(c, Command::Clip { .. }));
        let fill = list
            .commands
            .iter()
            .position(|c| matches!(c, Command::FillPath { .. }));
        assert!(clip.is_some() && clip < fill);
        // The free-standing mask is not painted itself.
        assert_eq!(
            list.commands
                .iter()
                .filter(|c| matches!(c, Command::FillPath { .. }))
                .count(),
            1
        );
    }

    #[test]
    fn test_play_clip_and_chain_next() {
        let mut tree = SceneTree::new();
        let root = tree.root();
        let sprite = Sprite::new(Texture::loaded("sheet", 64, 16))
            .with_grid(16.0, 16.0)
            .with_clip("jump", ClipDescriptor::frames(vec![1, 2]).next("idle"))
            .with_clip("idle", ClipDescriptor::frames(vec![0, 3]).infinity(true));
        let id = tree.create(root, Node::sprite(sprite));

        assert!(tree.play(id, "fly", &AnimateOptions::default()).is_none());
        assert!(tree.play(root, "jump", &AnimateOptions::default()).is_none());
        assert!(tree.play(id, "jump", &AnimateOptions::default()).is_some());
        let frame = |tree: &SceneTree| tree.node(id).unwrap().kind.as_sprite().unwrap().frame();
        assert_eq!(frame(&tree), 1);

        tree.update_posture(root, 16.0);
        assert_eq!(frame(&tree), 2);
        // Finishing "jump" starts "idle" on the same tick.
        tree.update_posture(root, 16.0);
        assert_eq!(frame(&tree), 0);
        tree.update_posture(root, 16.0);
        assert_eq!(frame(&tree), 3);
        assert_eq!(tree.node(id).unwrap().animation.len(), 1);
    }

    #[test]
    fn test_drain_animation_events_tags_nodes() {
        let mut tree = SceneTree::new();
        let root = tree.root();
        let id = tree.create(root, Node::container());
        tree.node_mut(id).unwrap().animation.to(
            TransitionOptions::to(Pose::new().with(Prop::Alpha, 0.0), AnimateOptions::new().duration(10.0)),
            false,
        );
        tree.update_posture(root, 10.0);
        let events = tree.drain_animation_events();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|(node, _)| *node == id));
        assert!(events[1].1.is_completed());
    }
}
