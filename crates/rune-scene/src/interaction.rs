//! Pointer and touch dispatch.
//!
//! The host normalizes raw input into canvas space and hands the stage an
//! [`InteractionEvent`]. The manager hit-tests the tree back to front,
//! emits the event on the hit node and bubbles it up the parent chain until a
//! listener calls `stop_propagation`.

use std::any::Any;
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use engine_core::Point;

use crate::node::NodeId;
use crate::tree::SceneTree;

const MOVE_KINDS: [&str; 3] = ["pointermove", "mousemove", "touchmove"];

/// Canonical input event, already in stage coordinates.
#[derive(Clone)]
pub struct InteractionEvent {
    pub kind: String,
    pub global: Point,
    pub touches: Vec<Point>,
    /// Raw event as the host received it, for listeners that need more than
    /// the normalized fields.
    pub original: Option<Rc<dyn Any>>,
    /// Node the hit test landed on.
    pub target: Option<NodeId>,
    /// Node whose listeners are running.
    pub current_target: Option<NodeId>,
    stopped: Cell<bool>,
}

impl InteractionEvent {
    pub fn new(kind: &str, global: Point) -> Self {
        Self {
            kind: kind.to_string(),
            global,
            touches: Vec::new(),
            original: None,
            target: None,
            current_target: None,
            stopped: Cell::new(false),
        }
    }

    pub fn with_touches(mut self, touches: Vec<Point>) -> Self {
        self.touches = touches;
        self
    }

    /// Attach the host's raw event.
    pub fn with_original<T: Any>(mut self, original: T) -> Self {
        self.original = Some(Rc::new(original));
        self
    }

    /// The host's raw event, if it is a `T`.
    pub fn original<T: Any>(&self) -> Option<&T> {
        self.original.as_deref().and_then(|o| o.downcast_ref::<T>())
    }

    /// Keep the event from reaching ancestors of the current node.
    pub fn stop_propagation(&self) {
        self.stopped.set(true);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.get()
    }

    fn is_move(&self) -> bool {
        MOVE_KINDS.contains(&self.kind.as_str())
    }
}

impl fmt::Debug for InteractionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InteractionEvent")
            .field("kind", &self.kind)
            .field("global", &self.global)
            .field("touches", &self.touches)
            .field("original", &self.original.is_some())
            .field("target", &self.target)
            .field("current_target", &self.current_target)
            .field("stopped", &self.stopped.get())
            .finish()
    }
}

/// Result of an event handling operation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EventResult {
    /// At least one listener ran.
    Handled,
    /// Nothing was hit or nobody listened.
    Ignored,
}

impl EventResult {
    pub fn is_handled(&self) -> bool {
        matches!(self, EventResult::Handled)
    }
}

#[derive(Debug)]
pub struct InteractionManager {
    hovered: Option<NodeId>,
    pub enabled: bool,
}

impl Default for InteractionManager {
    fn default() -> Self {
        Self {
            hovered: None,
            enabled: true,
        }
    }
}

impl InteractionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Node currently under the pointer, as of the last move event.
    pub fn hovered(&self) -> Option<NodeId> {
        self.hovered
    }

    /// Hit-test `event.global` from `root` and bubble the event from the hit
    /// node upward. Move events also emit `pointerout` / `pointerover` when
    /// the node under the pointer changes.
    pub fn dispatch(&mut self, tree: &SceneTree, root: NodeId, event: InteractionEvent) -> EventResult {
        if !self.enabled {
            return EventResult::Ignored;
        }
        let target = tree.hit_test(root, event.global);
        tracing::trace!(kind = %event.kind, ?target, "dispatch");

        let mut handled = 0;
        if event.is_move() && target != self.hovered {
            if let Some(previous) = self.hovered.filter(|&id| tree.contains_node(id)) {
                handled += bubble(tree, previous, Self::derive(&event, "pointerout", previous));
            }
            if let Some(current) = target {
                handled += bubble(tree, current, Self::derive(&event, "pointerover", current));
            }
            self.hovered = target;
        }

        if let Some(target) = target {
            let mut event = event;
            event.target = Some(target);
            handled += bubble(tree, target, event);
        }

        if handled > 0 {
            EventResult::Handled
        } else {
            EventResult::Ignored
        }
    }

    fn derive(event: &InteractionEvent, kind: &str, target: NodeId) -> InteractionEvent {
        let mut derived = InteractionEvent::new(kind, event.global).with_touches(event.touches.clone());
        derived.original = event.original.clone();
        derived.target = Some(target);
        derived
    }
}

/// Emit on `from` and each ancestor in turn. Returns how many listeners ran.
fn bubble(tree: &SceneTree, from: NodeId, mut event: InteractionEvent) -> usize {
    let kind = event.kind.clone();
    let mut ran = 0;
    let mut cursor = Some(from);
    while let Some(id) = cursor {
        event.current_target = Some(id);
        ran += tree.emit(id, &kind, &event);
        if event.is_stopped() {
            break;
        }
        cursor = tree.parent(id);
    }
    ran
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::Graphics;
    use crate::node::Node;
    use engine_core::{Color, Rectangle};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn scene() -> (SceneTree, NodeId, NodeId, NodeId) {
        let mut tree = SceneTree::new();
        let root = tree.root();
        let group = tree.create(root, Node::container().at(10.0, 10.0));
        let mut g = Graphics::new();
        g.rect(0.0, 0.0, 20.0, 20.0).fill(Color::WHITE);
        let button = tree.create(group, Node::graphics(g).with_area(Rectangle::new(0.0, 0.0, 20.0, 20.0)));
        tree.update_posture(root, 0.0);
        (tree, root, group, button)
    }

    fn record(tree: &SceneTree, id: NodeId, name: &str, log: &Rc<RefCell<Vec<String>>>) {
        let log = Rc::clone(log);
        let tag = format!("{}@{}", name, id.index());
        tree.on(id, name, move |_| log.borrow_mut().push(tag.clone()));
    }

    #[test]
    fn test_click_bubbles_to_root() {
        let (tree, root, group, button) = scene();
        let log = Rc::new(RefCell::new(Vec::new()));
        for id in [root, group, button] {
            record(&tree, id, "click", &log);
        }
        let mut manager = InteractionManager::new();

        let result = manager.dispatch(&tree, root, InteractionEvent::new("click", Point::new(15.0, 15.0)));
        assert!(result.is_handled());
        let expected: Vec<String> = [button, group, root]
            .iter()
            .map(|id| format!("click@{}", id.index()))
            .collect();
        assert_eq!(*log.borrow(), expected);

        // Outside the button's area nothing is hit.
        let result = manager.dispatch(&tree, root, InteractionEvent::new("click", Point::new(5.0, 5.0)));
        assert_eq!(result, EventResult::Ignored);
    }

    #[test]
    fn test_stop_propagation() {
        let (tree, root, group, button) = scene();
        let reached_root = Rc::new(Cell::new(false));
        tree.on(button, "tap", |event| event.stop_propagation());
        let flag = Rc::clone(&reached_root);
        tree.on(root, "tap", move |_| flag.set(true));
        let _ = group;

        InteractionManager::new().dispatch(&tree, root, InteractionEvent::new("tap", Point::new(12.0, 12.0)));
        assert!(!reached_root.get());
    }

    #[test]
    fn test_hover_tracking() {
        let (tree, root, _, button) = scene();
        let log = Rc::new(RefCell::new(Vec::new()));
        record(&tree, button, "pointerover", &log);
        record(&tree, button, "pointerout", &log);
        let mut manager = InteractionManager::new();

        manager.dispatch(&tree, root, InteractionEvent::new("pointermove", Point::new(15.0, 15.0)));
        manager.dispatch(&tree, root, InteractionEvent::new("pointermove", Point::new(16.0, 16.0)));
        assert_eq!(manager.hovered(), Some(button));
        manager.dispatch(&tree, root, InteractionEvent::new("pointermove", Point::new(100.0, 100.0)));
        assert_eq!(manager.hovered(), None);

        let over = format!("pointerover@{}", button.index());
        let out = format!("pointerout@{}", button.index());
        assert_eq!(*log.borrow(), vec![over, out]);
    }

    struct RawPointer {
        button: u8,
    }

    #[test]
    fn test_original_event_reaches_every_listener() {
        let (tree, root, group, button) = scene();
        let seen = Rc::new(RefCell::new(Vec::new()));
        for id in [button, group] {
            let seen = Rc::clone(&seen);
            tree.on(id, "pointerdown", move |event| {
                seen.borrow_mut()
                    .push(event.original::<RawPointer>().map(|raw| raw.button));
            });
        }
        let event = InteractionEvent::new("pointerdown", Point::new(15.0, 15.0))
            .with_original(RawPointer { button: 2 });
        assert!(event.original::<String>().is_none());

        InteractionManager::new().dispatch(&tree, root, event);
        assert_eq!(*seen.borrow(), vec![Some(2), Some(2)]);
    }

    #[test]
    fn test_disabled_manager_ignores_input() {
        let (tree, root, _, button) = scene();
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        tree.on(button, "click", move |_| counter.set(counter.get() + 1));
        let mut manager = InteractionManager::new();
        manager.enabled = false;
        manager.dispatch(&tree, root, InteractionEvent::new("click", Point::new(15.0, 15.0)));
        assert_eq!(hits.get(), 0);
    }
}
