//! Scene-level error type.
//!
//! Public tree operations never surface these to the frame loop; they log the
//! error and turn the call into a no-op. The typed variants exist so internal
//! helpers can use `?` and so tests can assert on the exact failure.

use crate::node::NodeId;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SceneError {
    #[error("node {0:?} cannot be added to itself")]
    SelfParenting(NodeId),

    #[error("node {child:?} is an ancestor of {parent:?}; adding it would create a cycle")]
    Cycle { parent: NodeId, child: NodeId },

    #[error("unknown node {0:?}")]
    UnknownNode(NodeId),

    #[error("node {0:?} has no parent")]
    DetachedNode(NodeId),

    #[error("node {0:?} is not a sprite")]
    NotASprite(NodeId),

    #[error("no clip named {0:?}")]
    MissingClip(String),

    #[error("texture {0:?} is not loaded")]
    NotReady(String),

    #[error("unknown easing {0:?}")]
    UnknownEasing(String),

    #[error("unknown texture key {0:?}")]
    UnknownTexture(String),
}
