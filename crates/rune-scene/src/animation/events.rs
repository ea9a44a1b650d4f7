//! Animation lifecycle events.
//!
//! Besides the per-animation `on_update` / `on_complete` callbacks, every
//! animation host records lifecycle events in an [`EventQueue`]. The
//! application polls them after a frame:
//!
//! ```ignore
//! stage.update(16.0);
//! for (node, event) in stage.tree_mut().drain_animation_events() {
//!     if event.is_completed() {
//!         println!("{:?} finished {:?}", node, event.animation_id());
//!     }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use super::types::AnimationId;

/// Which factory produced an animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimatorKind {
    Transition,
    PathMotion,
    KeyFrames,
    Runner,
    MovieClip,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnimationEvent {
    /// Animation was created on a host.
    Started {
        animation_id: AnimationId,
        kind: AnimatorKind,
    },
    /// Last cycle ended; completion callbacks have run.
    Completed {
        animation_id: AnimationId,
        kind: AnimatorKind,
    },
    /// Removed before completing; no completion callback ran.
    Cancelled {
        animation_id: AnimationId,
        kind: AnimatorKind,
    },
    /// A cycle ended and another started.
    Iteration {
        animation_id: AnimationId,
        kind: AnimatorKind,
        /// Cycles completed so far.
        iteration: u32,
    },
}

impl AnimationEvent {
    pub fn animation_id(&self) -> AnimationId {
        match self {
            Self::Started { animation_id, .. }
            | Self::Completed { animation_id, .. }
            | Self::Cancelled { animation_id, .. }
            | Self::Iteration { animation_id, .. } => *animation_id,
        }
    }

    pub fn kind(&self) -> AnimatorKind {
        match self {
            Self::Started { kind, .. }
            | Self::Completed { kind, .. }
            | Self::Cancelled { kind, .. }
            | Self::Iteration { kind, .. } => *kind,
        }
    }

    pub fn is_started(&self) -> bool {
        matches!(self, Self::Started { .. })
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

/// Events a host keeps before dropping the oldest.
pub const EVENT_QUEUE_CAPACITY: usize = 256;

/// Queue for collecting animation events during update cycles.
///
/// The queue is bounded: hosts that never drain it (an infinite clip on a
/// stage nobody polls) lose their oldest events instead of growing.
#[derive(Debug)]
pub struct EventQueue {
    events: VecDeque<AnimationEvent>,
    capacity: usize,
    dropped: u64,
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::with_capacity(EVENT_QUEUE_CAPACITY)
    }
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue holding at most `capacity` events (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: VecDeque::new(),
            capacity: capacity.max(1),
            dropped: 0,
        }
    }

    pub fn push(&mut self, event: AnimationEvent) {
        if self.events.len() >= self.capacity {
            self.events.pop_front();
            self.dropped += 1;
            if self.dropped == 1 {
                tracing::debug!(capacity = self.capacity, "animation event queue full, dropping oldest");
            }
        }
        self.events.push_back(event);
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Events discarded because the queue was full.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn pop(&mut self) -> Option<AnimationEvent> {
        self.events.pop_front()
    }

    pub fn drain(&mut self) -> impl Iterator<Item = AnimationEvent> + '_ {
        self.events.drain(..)
    }

    pub fn peek(&self) -> Option<&AnimationEvent> {
        self.events.front()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Pending events of one animation, oldest first.
    pub fn events_for(&self, animation_id: AnimationId) -> Vec<&AnimationEvent> {
        self.events
            .iter()
            .filter(|e| e.animation_id() == animation_id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_accessors() {
        let event = AnimationEvent::Iteration {
            animation_id: AnimationId(4),
            kind: AnimatorKind::KeyFrames,
            iteration: 2,
        };
        assert_eq!(event.animation_id(), AnimationId(4));
        assert_eq!(event.kind(), AnimatorKind::KeyFrames);
        assert!(!event.is_started());
        assert!(!event.is_completed());
        assert!(!event.is_cancelled());
    }

    #[test]
    fn test_event_queue_operations() {
        let mut queue = EventQueue::new();
        assert!(queue.is_empty());

        queue.push(AnimationEvent::Started {
            animation_id: AnimationId(1),
            kind: AnimatorKind::Transition,
        });
        queue.push(AnimationEvent::Completed {
            animation_id: AnimationId(1),
            kind: AnimatorKind::Transition,
        });
        assert_eq!(queue.len(), 2);
        assert!(queue.peek().is_some_and(AnimationEvent::is_started));

        let event = queue.pop().unwrap();
        assert!(event.is_started());
        let event = queue.pop().unwrap();
        assert!(event.is_completed());
        assert!(queue.pop().is_none());
    }

    #[test]
    fn test_events_for_animation() {
        let mut queue = EventQueue::new();
        for id in [1, 2, 1] {
            queue.push(AnimationEvent::Started {
                animation_id: AnimationId(id),
                kind: AnimatorKind::MovieClip,
            });
        }
        assert_eq!(queue.events_for(AnimationId(1)).len(), 2);
        assert_eq!(queue.events_for(AnimationId(3)).len(), 0);

        let drained: Vec<_> = queue.drain().collect();
        assert_eq!(drained.len(), 3);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_full_queue_drops_oldest() {
        let mut queue = EventQueue::with_capacity(3);
        for iteration in 1..=5 {
            queue.push(AnimationEvent::Iteration {
                animation_id: AnimationId(9),
                kind: AnimatorKind::Transition,
                iteration,
            });
        }
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.dropped(), 2);
        let kept: Vec<u32> = queue
            .drain()
            .filter_map(|e| match e {
                AnimationEvent::Iteration { iteration, .. } => Some(iteration),
                _ => None,
            })
            .collect();
        assert_eq!(kept, vec![3, 4, 5]);
    }

    #[test]
    fn test_event_serialization() {
        let event = AnimationEvent::Cancelled {
            animation_id: AnimationId(42),
            kind: AnimatorKind::PathMotion,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("cancelled"));
        assert!(json.contains("path_motion"));

        let parsed: AnimationEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, parsed);
    }
}
