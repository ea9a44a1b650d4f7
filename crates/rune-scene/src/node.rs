//! Scene nodes.
//!
//! A node carries its local posture (translate, scale, skew, rotation, pivot,
//! alpha), the derived world transform and alpha, its animation host and the
//! element it renders. Structure (parent, children, mask) is managed by
//! [`SceneTree`](crate::tree::SceneTree); nodes refer to each other by
//! [`NodeId`] only.

use engine_core::{BlurFilter, Bounds, HitArea, Matrix};

use crate::animation::{Animatable, AnimationManager, Prop};
use crate::elements::{Graphics, Renderable, Sprite, TextFace};
use crate::eventer::Eventer;
use crate::interaction::InteractionEvent;

/// Arena index of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Local pose of a node. Angles are in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Posture {
    pub x: f64,
    pub y: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    pub skew_x: f64,
    pub skew_y: f64,
    pub rotation: f64,
    pub pivot_x: f64,
    pub pivot_y: f64,
    pub alpha: f64,
}

impl Default for Posture {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            skew_x: 0.0,
            skew_y: 0.0,
            rotation: 0.0,
            pivot_x: 0.0,
            pivot_y: 0.0,
            alpha: 1.0,
        }
    }
}

impl Posture {
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            ..Self::default()
        }
    }

    /// Local matrix composed in one step from all properties.
    pub fn local_transform(&self) -> Matrix {
        let mut m = Matrix::identity();
        m.set_transform(
            self.x,
            self.y,
            self.pivot_x,
            self.pivot_y,
            self.scale_x,
            self.scale_y,
            self.rotation.to_radians(),
            self.skew_x.to_radians(),
            self.skew_y.to_radians(),
        );
        m
    }
}

impl Animatable for Posture {
    fn get_prop(&self, prop: Prop) -> f64 {
        match prop {
            Prop::X => self.x,
            Prop::Y => self.y,
            Prop::ScaleX => self.scale_x,
            Prop::ScaleY => self.scale_y,
            Prop::SkewX => self.skew_x,
            Prop::SkewY => self.skew_y,
            Prop::Rotation => self.rotation,
            Prop::PivotX => self.pivot_x,
            Prop::PivotY => self.pivot_y,
            Prop::Alpha => self.alpha,
        }
    }

    fn set_prop(&mut self, prop: Prop, value: f64) {
        match prop {
            Prop::X => self.x = value,
            Prop::Y => self.y = value,
            Prop::ScaleX => self.scale_x = value,
            Prop::ScaleY => self.scale_y = value,
            Prop::SkewX => self.skew_x = value,
            Prop::SkewY => self.skew_y = value,
            Prop::Rotation => self.rotation = value,
            Prop::PivotX => self.pivot_x = value,
            Prop::PivotY => self.pivot_y = value,
            Prop::Alpha => self.alpha = value,
        }
    }
}

/// What an animation writes into: the posture, plus the sprite frame when
/// the node shows a sprite sheet.
pub(crate) struct NodeTarget<'a> {
    pub posture: &'a mut Posture,
    pub frame: Option<&'a mut usize>,
}

impl Animatable for NodeTarget<'_> {
    fn get_prop(&self, prop: Prop) -> f64 {
        self.posture.get_prop(prop)
    }

    fn set_prop(&mut self, prop: Prop, value: f64) {
        self.posture.set_prop(prop, value);
    }

    fn set_frame(&mut self, frame: usize) {
        match self.frame.as_deref_mut() {
            Some(current) => *current = frame,
            None => tracing::debug!(frame, "frame update on a node without a sprite"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub enum NodeKind {
    /// Grouping only; draws nothing itself.
    #[default]
    Container,
    Sprite(Sprite),
    Graphics(Graphics),
    Text(TextFace),
}

impl NodeKind {
    pub fn as_sprite(&self) -> Option<&Sprite> {
        match self {
            NodeKind::Sprite(sprite) => Some(sprite),
            _ => None,
        }
    }

    pub fn as_sprite_mut(&mut self) -> Option<&mut Sprite> {
        match self {
            NodeKind::Sprite(sprite) => Some(sprite),
            _ => None,
        }
    }

    pub fn as_graphics_mut(&mut self) -> Option<&mut Graphics> {
        match self {
            NodeKind::Graphics(graphics) => Some(graphics),
            _ => None,
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut TextFace> {
        match self {
            NodeKind::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl Renderable for NodeKind {
    fn render_me(&self, surface: &mut dyn engine_core::Surface) -> bool {
        match self {
            NodeKind::Container => true,
            NodeKind::Sprite(sprite) => sprite.render_me(surface),
            NodeKind::Graphics(graphics) => graphics.render_me(surface),
            NodeKind::Text(text) => text.render_me(surface),
        }
    }

    fn local_bounds(&self) -> Option<engine_core::Rectangle> {
        match self {
            NodeKind::Container => None,
            NodeKind::Sprite(sprite) => sprite.local_bounds(),
            NodeKind::Graphics(graphics) => graphics.local_bounds(),
            NodeKind::Text(text) => text.local_bounds(),
        }
    }

    fn clip_me(&self, surface: &mut dyn engine_core::Surface) -> bool {
        match self {
            NodeKind::Graphics(graphics) => graphics.clip_me(surface),
            NodeKind::Sprite(sprite) => match sprite.local_bounds() {
                // A sprite masks with its frame rectangle.
                Some(rect) => {
                    surface.begin_path();
                    surface.rect(rect);
                    surface.clip();
                    true
                }
                None => false,
            },
            _ => false,
        }
    }

    fn is_ready(&self) -> bool {
        match self {
            NodeKind::Sprite(sprite) => sprite.is_ready(),
            _ => true,
        }
    }
}

#[derive(Debug)]
pub struct Node {
    pub name: String,
    pub posture: Posture,
    pub visible: bool,
    /// Multiplies every snippet reaching this node and its subtree.
    pub time_scale: f64,
    /// Freezes this node's own animations; children keep running.
    pub paused: bool,
    /// Skip this node in hit testing; its children are still tested.
    pub pass_event: bool,
    pub interactive_children: bool,
    pub event_area: Option<HitArea>,
    pub blur: Option<BlurFilter>,
    pub animation: AnimationManager,
    pub kind: NodeKind,
    pub(crate) z_index: f64,
    pub(crate) world_transform: Matrix,
    pub(crate) world_alpha: f64,
    /// Rotation the cached `sr`/`cr` were computed for.
    pub(crate) rotation_cache: f64,
    pub(crate) sr: f64,
    pub(crate) cr: f64,
    pub(crate) bounds: Bounds,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) should_sort: bool,
    pub(crate) mask: Option<NodeId>,
    pub(crate) listeners: Eventer<InteractionEvent>,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            name: String::new(),
            posture: Posture::default(),
            visible: true,
            time_scale: 1.0,
            paused: false,
            pass_event: false,
            interactive_children: true,
            event_area: None,
            blur: None,
            animation: AnimationManager::new(),
            kind,
            z_index: 0.0,
            world_transform: Matrix::identity(),
            world_alpha: 1.0,
            rotation_cache: f64::NAN,
            sr: 0.0,
            cr: 1.0,
            bounds: Bounds::new(),
            parent: None,
            children: Vec::new(),
            should_sort: false,
            mask: None,
            listeners: Eventer::new(),
        }
    }

    pub fn container() -> Self {
        Self::new(NodeKind::Container)
    }

    pub fn sprite(sprite: Sprite) -> Self {
        Self::new(NodeKind::Sprite(sprite))
    }

    pub fn graphics(graphics: Graphics) -> Self {
        Self::new(NodeKind::Graphics(graphics))
    }

    pub fn text(text: TextFace) -> Self {
        Self::new(NodeKind::Text(text))
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.posture.x = x;
        self.posture.y = y;
        self
    }

    pub fn with_posture(mut self, posture: Posture) -> Self {
        self.posture = posture;
        self
    }

    pub fn with_z(mut self, z_index: f64) -> Self {
        self.z_index = z_index;
        self
    }

    pub fn with_area(mut self, area: impl Into<HitArea>) -> Self {
        self.event_area = Some(area.into());
        self
    }

    pub fn z_index(&self) -> f64 {
        self.z_index
    }

    pub fn world_transform(&self) -> &Matrix {
        &self.world_transform
    }

    pub fn world_alpha(&self) -> f64 {
        self.world_alpha
    }

    /// Bounds from the last `calculate_bounds`.
    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn mask(&self) -> Option<NodeId> {
        self.mask
    }

    /// Whether the rotation cache matches the current rotation.
    pub fn rotation_cached(&self) -> bool {
        self.rotation_cache == self.posture.rotation
    }

    pub fn is_ready(&self) -> bool {
        self.kind.is_ready()
    }

    /// Visible flag set, alpha above zero and neither scale axis exactly zero.
    pub fn is_visible(&self) -> bool {
        self.visible
            && self.posture.alpha > 0.0
            && self.posture.scale_x != 0.0
            && self.posture.scale_y != 0.0
    }

    pub(crate) fn animation_target(&mut self) -> (&mut AnimationManager, NodeTarget<'_>) {
        let frame = self.kind.as_sprite_mut().map(Sprite::frame_mut);
        (
            &mut self.animation,
            NodeTarget {
                posture: &mut self.posture,
                frame,
            },
        )
    }

    /// Recompute the world transform and alpha from the parent's.
    ///
    /// Three paths, cheapest last: skewed nodes compose the full matrix;
    /// rotated nodes reuse the cached sine and cosine; unrotated nodes skip
    /// trigonometry entirely.
    pub(crate) fn update_transform(&mut self, parent: &Matrix, parent_alpha: f64) {
        let p = &self.posture;
        let wt = &mut self.world_transform;

        if p.skew_x != 0.0 || p.skew_y != 0.0 {
            let local = p.local_transform();
            *wt = *parent;
            wt.append(&local);
        } else if p.rotation % 360.0 != 0.0 {
            if self.rotation_cache != p.rotation {
                self.rotation_cache = p.rotation;
                let (sr, cr) = p.rotation.to_radians().sin_cos();
                self.sr = sr;
                self.cr = cr;
            }
            let a = self.cr * p.scale_x;
            let b = self.sr * p.scale_x;
            let c = -self.sr * p.scale_y;
            let d = self.cr * p.scale_y;
            let tx = p.x - (p.pivot_x * a + p.pivot_y * c);
            let ty = p.y - (p.pivot_x * b + p.pivot_y * d);

            wt.a = a * parent.a + b * parent.c;
            wt.b = a * parent.b + b * parent.d;
            wt.c = c * parent.a + d * parent.c;
            wt.d = c * parent.b + d * parent.d;
            wt.tx = tx * parent.a + ty * parent.c + parent.tx;
            wt.ty = tx * parent.b + ty * parent.d + parent.ty;
        } else {
            let tx = p.x - p.pivot_x * p.scale_x;
            let ty = p.y - p.pivot_y * p.scale_y;

            wt.a = p.scale_x * parent.a;
            wt.b = p.scale_x * parent.b;
            wt.c = p.scale_y * parent.c;
            wt.d = p.scale_y * parent.d;
            wt.tx = tx * parent.a + ty * parent.c + parent.tx;
            wt.ty = tx * parent.b + ty * parent.d + parent.ty;
        }
        self.world_alpha = p.alpha * parent_alpha;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::Point;

    const EPSILON: f64 = 1e-9;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < EPSILON
    }

    fn matrix_eq(m: &Matrix, n: &Matrix) -> bool {
        approx_eq(m.a, n.a)
            && approx_eq(m.b, n.b)
            && approx_eq(m.c, n.c)
            && approx_eq(m.d, n.d)
            && approx_eq(m.tx, n.tx)
            && approx_eq(m.ty, n.ty)
    }

    fn parent() -> Matrix {
        let mut m = Matrix::from_rotation(0.3);
        m.scale(2.0, 1.5).translate(10.0, -4.0);
        m
    }

    fn composed(posture: Posture) -> (Matrix, Matrix) {
        let mut node = Node::container().with_posture(posture);
        node.update_transform(&parent(), 1.0);
        let mut expected = parent();
        expected.append(&posture.local_transform());
        (node.world_transform, expected)
    }

    #[test]
    fn test_all_three_paths_match_full_composition() {
        let base = Posture {
            x: 12.0,
            y: -3.0,
            scale_x: 1.5,
            scale_y: 0.5,
            pivot_x: 4.0,
            pivot_y: 2.0,
            ..Posture::default()
        };
        let skewed = Posture {
            skew_x: 10.0,
            skew_y: -5.0,
            rotation: 30.0,
            ..base
        };
        let rotated = Posture {
            rotation: 45.0,
            ..base
        };
        for posture in [base, rotated, skewed] {
            let (world, expected) = composed(posture);
            assert!(matrix_eq(&world, &expected), "{:?} vs {:?}", world, expected);
        }
    }

    #[test]
    fn test_rotation_cache_tracks_rotation() {
        let mut node = Node::container();
        node.posture.rotation = 90.0;
        assert!(!node.rotation_cached());
        node.update_transform(&Matrix::IDENTITY, 1.0);
        assert!(node.rotation_cached());
        let p = node.world_transform.apply(Point::new(1.0, 0.0));
        assert!(approx_eq(p.x, 0.0));
        assert!(approx_eq(p.y, 1.0));

        node.posture.rotation = 180.0;
        assert!(!node.rotation_cached());
        node.update_transform(&Matrix::IDENTITY, 1.0);
        assert!(node.rotation_cached());
    }

    #[test]
    fn test_full_turn_takes_fast_path() {
        let mut node = Node::container();
        node.posture.rotation = 360.0;
        node.update_transform(&Matrix::IDENTITY, 1.0);
        assert_eq!(node.world_transform, Matrix::IDENTITY);
        assert!(!node.rotation_cached());
    }

    #[test]
    fn test_world_alpha_multiplies() {
        let mut node = Node::container();
        node.posture.alpha = 0.5;
        node.update_transform(&Matrix::IDENTITY, 0.5);
        assert!(approx_eq(node.world_alpha(), 0.25));
    }

    #[test]
    fn test_visibility_rule() {
        let mut node = Node::container();
        assert!(node.is_visible());
        node.posture.scale_y = 0.0;
        assert!(!node.is_visible());
        node.posture.scale_y = 1.0;
        node.posture.alpha = 0.0;
        assert!(!node.is_visible());
        node.posture.alpha = 1.0;
        node.visible = false;
        assert!(!node.is_visible());
    }

    #[test]
    fn test_posture_is_animatable() {
        let mut posture = Posture::default();
        for (i, prop) in Prop::ALL.iter().enumerate() {
            posture.set_prop(*prop, i as f64);
            assert_eq!(posture.get_prop(*prop), i as f64);
        }
    }
}
