//! Discrete frame stepping for sprite-sheet playback.
//!
//! A clip is not interpolated: every `interval` ms of scaled time the frame
//! index moves by `direction`. Running off the end applies the usual repeat
//! policy; a finished clip snaps to its fill frame and may name a `next` clip
//! for the owner to chain into.

use serde::{Deserialize, Serialize};

use super::animate::{Animate, AnimateOptions, Tick};
use super::types::{Animatable, Pose};

/// Interval used when a clip declares no (or a non-positive) fps.
pub const DEFAULT_CLIP_INTERVAL: f64 = 16.0;

/// Shortest frame interval in ms; faster fps values are clamped to it.
pub const MIN_CLIP_INTERVAL: f64 = 1.0;

/// Frames stepped in one update before the rest of the backlog is dropped.
const MAX_CATCH_UP_STEPS: usize = 1024;

/// Frame list of a clip: explicit indices or an inclusive range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FrameSpec {
    List(Vec<usize>),
    Range { start: usize, end: usize },
}

impl FrameSpec {
    pub fn resolve(&self) -> Vec<usize> {
        match self {
            FrameSpec::List(frames) => frames.clone(),
            FrameSpec::Range { start, end } if start <= end => (*start..=*end).collect(),
            FrameSpec::Range { start, end } => (*end..=*start).rev().collect(),
        }
    }
}

/// Named clip declared on a sprite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClipDescriptor {
    pub frames: FrameSpec,
    /// Frames per second; `0` uses the default interval.
    pub fps: f64,
    /// Position in `frames` shown once the clip has finished.
    pub fill_mode: usize,
    /// Clip to play after this one finishes.
    pub next: Option<String>,
    pub repeats: u32,
    pub infinity: bool,
    pub alternate: bool,
}

impl Default for ClipDescriptor {
    fn default() -> Self {
        Self {
            frames: FrameSpec::List(Vec::new()),
            fps: 0.0,
            fill_mode: 0,
            next: None,
            repeats: 0,
            infinity: false,
            alternate: false,
        }
    }
}

impl ClipDescriptor {
    pub fn frames(frames: Vec<usize>) -> Self {
        Self {
            frames: FrameSpec::List(frames),
            ..Self::default()
        }
    }

    pub fn range(start: usize, end: usize) -> Self {
        Self {
            frames: FrameSpec::Range { start, end },
            ..Self::default()
        }
    }

    pub fn fps(mut self, fps: f64) -> Self {
        self.fps = fps;
        self
    }

    pub fn next(mut self, clip: impl Into<String>) -> Self {
        self.next = Some(clip.into());
        self
    }

    pub fn infinity(mut self, infinity: bool) -> Self {
        self.infinity = infinity;
        self
    }

    pub fn alternate(mut self, alternate: bool) -> Self {
        self.alternate = alternate;
        self
    }

    pub fn repeats(mut self, repeats: u32) -> Self {
        self.repeats = repeats;
        self
    }

    pub fn fill_mode(mut self, index: usize) -> Self {
        self.fill_mode = index;
        self
    }
}

#[derive(Debug)]
pub struct MovieClip {
    pub base: Animate,
    name: String,
    frames: Vec<usize>,
    interval: f64,
    elapsed: f64,
    index: isize,
    fill_mode: usize,
    next: Option<String>,
}

impl MovieClip {
    /// `default_interval` applies when the descriptor's fps is not positive.
    pub fn new(name: &str, clip: &ClipDescriptor, timing: &AnimateOptions, default_interval: f64) -> Self {
        let frames = clip.frames.resolve();
        let timing = AnimateOptions {
            repeats: clip.repeats,
            infinity: clip.infinity,
            alternate: clip.alternate,
            ..timing.clone()
        };
        let mut base = Animate::new(&timing);
        if frames.is_empty() {
            tracing::warn!(clip = name, "clip has no frames");
            base.living = false;
        }
        let interval = if clip.fps > 0.0 {
            (1000.0 / clip.fps).max(MIN_CLIP_INTERVAL)
        } else if default_interval > 0.0 {
            default_interval.max(MIN_CLIP_INTERVAL)
        } else {
            DEFAULT_CLIP_INTERVAL
        };
        Self {
            base,
            name: name.to_string(),
            frames,
            interval,
            elapsed: 0.0,
            index: 0,
            fill_mode: clip.fill_mode,
            next: clip.next.clone(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn index(&self) -> usize {
        self.index.max(0) as usize
    }

    /// Sheet frame currently shown.
    pub fn frame(&self) -> Option<usize> {
        self.frames.get(self.index()).copied()
    }

    pub fn interval(&self) -> f64 {
        self.interval
    }

    /// Clip to chain into once this one has finished.
    pub fn next(&self) -> Option<&str> {
        self.next.as_deref()
    }

    pub fn update(&mut self, snippet: f64, target: &mut dyn Animatable) -> Tick {
        if !self.base.gate(snippet) {
            return Tick::Idle;
        }
        self.elapsed += (self.base.time_scale * snippet).abs();

        let len = self.frames.len() as isize;
        let mut tick = Tick::Running;
        let mut steps = 0;
        while self.elapsed >= self.interval && self.base.delay_cut <= 0.0 {
            if steps == MAX_CATCH_UP_STEPS {
                tracing::debug!(clip = %self.name, backlog = self.elapsed, "dropping clip backlog");
                self.elapsed %= self.interval;
                break;
            }
            steps += 1;
            self.elapsed -= self.interval;
            self.index += isize::from(self.base.direction);

            if self.index < 0 || self.index >= len {
                if !self.base.take_repeat() {
                    self.index = (self.fill_mode as isize).min(len - 1);
                    self.show(target);
                    return self.base.complete();
                }
                if self.base.alternate {
                    self.base.direction = -self.base.direction;
                    self.index += 2 * isize::from(self.base.direction);
                    self.index = self.index.clamp(0, len - 1);
                } else {
                    self.base.direction = 1;
                    self.index = 0;
                }
                if self.base.delay_cut > 0.0 {
                    self.elapsed = 0.0;
                }
                tick = Tick::Iteration;
            }
            self.show(target);
        }
        tick
    }

    fn show(&mut self, target: &mut dyn Animatable) {
        if let Some(frame) = self.frame() {
            target.set_frame(frame);
            let ratio = if self.frames.len() > 1 {
                self.index() as f64 / (self.frames.len() - 1) as f64
            } else {
                1.0
            };
            self.base.notify(Pose::new(), ratio);
        }
    }
}
