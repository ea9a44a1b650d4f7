//! Per-node animation host.
//!
//! Every scene node owns one `AnimationManager`. Factories create an animation,
//! append it to the host's list and hand back its [`AnimationId`]; `update`
//! ticks the list in creation order against the node's properties and prunes
//! whatever stopped living.
//!
//! # Usage
//!
//! ```ignore
//! let mut host = AnimationManager::new();
//! let id = host.to(
//!     TransitionOptions::to(Pose::new().with(Prop::X, 100.0), AnimateOptions::new().duration(500.0)),
//!     false,
//! );
//! host.on_complete(id, Box::new(|pose| println!("done at {:?}", pose)));
//!
//! // Each frame
//! host.update(16.0, &mut posture);
//! for event in host.drain_events() { /* ... */ }
//! ```

use super::animate::{
    Animate, AnimateOptions, CompleteCallback, Tick, UpdateCallback,
};
use super::events::{AnimationEvent, AnimatorKind, EventQueue};
use super::keyframes::{KeyFrames, KeyFramesOptions};
use super::movie_clip::{ClipDescriptor, MovieClip};
use super::path_motion::{MotionOptions, PathMotion};
use super::runner::{AnimateRunner, RunnerOptions};
use super::transition::{Transition, TransitionOptions};
use super::types::{Animatable, AnimationId, AnimationState};

/// One live animation of any kind.
#[derive(Debug)]
pub enum Animator {
    /// From/to property interpolation.
    Transition(Transition),
    /// Movement along a bezier path.
    PathMotion(PathMotion),
    /// Multi-segment keyframes.
    KeyFrames(KeyFrames),
    /// Sequence of transitions and motions.
    Runner(AnimateRunner),
    /// Sprite sheet frame stepping.
    MovieClip(MovieClip),
}

impl Animator {
    /// Shared timing state.
    pub fn base(&self) -> &Animate {
        match self {
            Animator::Transition(a) => &a.base,
            Animator::PathMotion(a) => &a.base,
            Animator::KeyFrames(a) => &a.base,
            Animator::Runner(a) => &a.base,
            Animator::MovieClip(a) => &a.base,
        }
    }

    /// Mutable timing state, for pause/start/stop and callbacks.
    pub fn base_mut(&mut self) -> &mut Animate {
        match self {
            Animator::Transition(a) => &mut a.base,
            Animator::PathMotion(a) => &mut a.base,
            Animator::KeyFrames(a) => &mut a.base,
            Animator::Runner(a) => &mut a.base,
            Animator::MovieClip(a) => &mut a.base,
        }
    }

    /// Which factory built this animation.
    pub fn kind(&self) -> AnimatorKind {
        match self {
            Animator::Transition(_) => AnimatorKind::Transition,
            Animator::PathMotion(_) => AnimatorKind::PathMotion,
            Animator::KeyFrames(_) => AnimatorKind::KeyFrames,
            Animator::Runner(_) => AnimatorKind::Runner,
            Animator::MovieClip(_) => AnimatorKind::MovieClip,
        }
    }

    /// Advance by `snippet` ms against `target`.
    pub fn update(&mut self, snippet: f64, target: &mut dyn Animatable) -> Tick {
        match self {
            Animator::Transition(a) => a.update(snippet, target),
            Animator::PathMotion(a) => a.update(snippet, target),
            Animator::KeyFrames(a) => a.update(snippet, target),
            Animator::Runner(a) => a.update(snippet, target),
            Animator::MovieClip(a) => a.update(snippet, target),
        }
    }

    /// Clip to chain into, for a finished movie clip.
    pub fn next_clip(&self) -> Option<&str> {
        match self {
            Animator::MovieClip(clip) => clip.next(),
            _ => None,
        }
    }
}

/// Animations attached to one node, ticked in creation order.
#[derive(Debug, Default)]
pub struct AnimationManager {
    /// Live animations in creation order.
    animations: Vec<(AnimationId, Animator)>,
    event_queue: EventQueue,
    /// Clip named by a movie clip that finished during the last update.
    pending_clip: Option<String>,
    /// Whether the last update applied any pose.
    dirty: bool,
}

impl AnimationManager {
    /// Host with no animations.
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, animator: Animator, clear: bool) -> AnimationId {
        if clear {
            self.clear_all();
        }
        let id = AnimationId::new();
        self.event_queue.push(AnimationEvent::Started {
            animation_id: id,
            kind: animator.kind(),
        });
        tracing::trace!(?id, kind = ?animator.kind(), "animation created");
        self.animations.push((id, animator));
        id
    }

    /// Transition with explicit start values.
    pub fn from_to(&mut self, options: TransitionOptions, clear: bool) -> AnimationId {
        self.push(Animator::Transition(Transition::new(options)), clear)
    }

    /// Transition starting from the target's values at its first tick.
    pub fn to(&mut self, mut options: TransitionOptions, clear: bool) -> AnimationId {
        options.from = None;
        self.push(Animator::Transition(Transition::new(options)), clear)
    }

    /// Move along a bezier path. `clear` cancels existing animations first.
    pub fn motion(&mut self, options: MotionOptions, clear: bool) -> AnimationId {
        self.push(Animator::PathMotion(PathMotion::new(options)), clear)
    }

    /// Play through a list of poses.
    pub fn key_frames(&mut self, options: KeyFramesOptions, clear: bool) -> AnimationId {
        self.push(Animator::KeyFrames(KeyFrames::new(options)), clear)
    }

    /// Run transitions and motions one after another.
    pub fn runners(&mut self, options: RunnerOptions, clear: bool) -> AnimationId {
        self.push(Animator::Runner(AnimateRunner::new(options)), clear)
    }

    /// Step a sprite clip. `default_interval` applies when the clip has no
    /// fps of its own.
    pub fn movie_clip(
        &mut self,
        name: &str,
        clip: &ClipDescriptor,
        timing: &AnimateOptions,
        default_interval: f64,
        clear: bool,
    ) -> AnimationId {
        let clip = MovieClip::new(name, clip, timing, default_interval);
        self.push(Animator::MovieClip(clip), clear)
    }

    /// Tick every animation in creation order, then drop the dead ones.
    pub fn update(&mut self, snippet: f64, target: &mut dyn Animatable) {
        self.dirty = false;
        for (id, animator) in self.animations.iter_mut() {
            let kind = animator.kind();
            match animator.update(snippet, target) {
                Tick::Idle => {}
                Tick::Running => self.dirty = true,
                Tick::Iteration => {
                    self.dirty = true;
                    self.event_queue.push(AnimationEvent::Iteration {
                        animation_id: *id,
                        kind,
                        iteration: animator.base().cycles,
                    });
                }
                Tick::Completed => {
                    self.dirty = true;
                    tracing::debug!(?id, ?kind, "animation completed");
                    self.event_queue.push(AnimationEvent::Completed {
                        animation_id: *id,
                        kind,
                    });
                    if let Some(next) = animator.next_clip() {
                        self.pending_clip = Some(next.to_string());
                    }
                }
            }
        }
        self.animations.retain(|(_, animator)| animator.base().living);
    }

    fn find_mut(&mut self, id: AnimationId) -> Option<&mut Animator> {
        self.animations
            .iter_mut()
            .find(|(aid, _)| *aid == id)
            .map(|(_, animator)| animator)
    }

    /// Live animation by id.
    pub fn get(&self, id: AnimationId) -> Option<&Animator> {
        self.animations
            .iter()
            .find(|(aid, _)| *aid == id)
            .map(|(_, animator)| animator)
    }

    /// Timing state of one animation.
    pub fn animate(&self, id: AnimationId) -> Option<&Animate> {
        self.get(id).map(Animator::base)
    }

    /// Lifecycle state; `Dead` once the animation has been pruned.
    pub fn state(&self, id: AnimationId) -> AnimationState {
        self.animate(id)
            .map(Animate::state)
            .unwrap_or(AnimationState::Dead)
    }

    /// Whether the animation is still on this host and alive.
    pub fn is_living(&self, id: AnimationId) -> bool {
        self.animate(id).is_some_and(|a| a.living)
    }

    /// Freeze progress. Returns false for unknown ids.
    pub fn pause(&mut self, id: AnimationId) -> bool {
        self.with_base(id, Animate::pause)
    }

    /// Resume a paused animation.
    pub fn start(&mut self, id: AnimationId) -> bool {
        self.with_base(id, Animate::start)
    }

    /// Fast-forward to the end of the cycle; completion fires on the next
    /// update.
    pub fn stop(&mut self, id: AnimationId) -> bool {
        self.with_base(id, Animate::stop)
    }

    /// Remove without firing completion.
    pub fn cancel(&mut self, id: AnimationId) -> bool {
        let Some(pos) = self.animations.iter().position(|(aid, _)| *aid == id) else {
            return false;
        };
        let (_, mut animator) = self.animations.remove(pos);
        animator.base_mut().cancel();
        self.event_queue.push(AnimationEvent::Cancelled {
            animation_id: id,
            kind: animator.kind(),
        });
        true
    }

    /// Called with the applied pose and eased ratio on every running tick.
    pub fn on_update(&mut self, id: AnimationId, callback: UpdateCallback) -> bool {
        self.with_base(id, |base| base.set_on_update(callback))
    }

    /// Called once, when the last cycle ends.
    pub fn on_complete(&mut self, id: AnimationId, callback: CompleteCallback) -> bool {
        self.with_base(id, |base| base.set_on_complete(callback))
    }

    fn with_base(&mut self, id: AnimationId, f: impl FnOnce(&mut Animate)) -> bool {
        match self.find_mut(id) {
            Some(animator) => {
                f(animator.base_mut());
                true
            }
            None => {
                tracing::debug!(?id, "no such animation on this host");
                false
            }
        }
    }

    /// Pause every animation on this host.
    pub fn pause_all(&mut self) {
        for (_, animator) in self.animations.iter_mut() {
            animator.base_mut().pause();
        }
    }

    /// Resume every animation on this host.
    pub fn start_all(&mut self) {
        for (_, animator) in self.animations.iter_mut() {
            animator.base_mut().start();
        }
    }

    /// Cancel every animation on this host.
    pub fn clear_all(&mut self) {
        for (id, mut animator) in self.animations.drain(..) {
            animator.base_mut().cancel();
            self.event_queue.push(AnimationEvent::Cancelled {
                animation_id: id,
                kind: animator.kind(),
            });
        }
    }

    /// Cancel every movie clip, leaving other animations running.
    pub fn clear_clips(&mut self) {
        let clips: Vec<AnimationId> = self
            .animations
            .iter()
            .filter(|(_, animator)| matches!(animator, Animator::MovieClip(_)))
            .map(|(id, _)| *id)
            .collect();
        for id in clips {
            self.cancel(id);
        }
    }

    /// Number of animations still attached.
    pub fn len(&self) -> usize {
        self.animations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.animations.is_empty()
    }

    /// Ids in creation order.
    pub fn ids(&self) -> impl Iterator<Item = AnimationId> + '_ {
        self.animations.iter().map(|(id, _)| *id)
    }

    /// Whether the last update applied any pose or frame.
    pub fn needs_redraw(&self) -> bool {
        self.dirty
    }

    /// Clip a finished movie clip asked to chain into, if any.
    pub fn take_next_clip(&mut self) -> Option<String> {
        self.pending_clip.take()
    }

    /// Take every pending lifecycle event, oldest first.
    pub fn drain_events(&mut self) -> impl Iterator<Item = AnimationEvent> + '_ {
        self.event_queue.drain()
    }

    /// Whether any lifecycle event is waiting to be drained.
    pub fn has_pending_events(&self) -> bool {
        !self.event_queue.is_empty()
    }

    /// Number of events waiting; never above the queue capacity.
    pub fn pending_events(&self) -> usize {
        self.event_queue.len()
    }

    /// Pending events of one animation, without draining.
    pub fn events_for(&self, id: AnimationId) -> Vec<&AnimationEvent> {
        self.event_queue.events_for(id)
    }
}
