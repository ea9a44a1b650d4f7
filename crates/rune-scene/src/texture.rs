//! Textures and the keyed texture loader.
//!
//! Loading is owned by the host: the loader only records which keys were
//! requested and from where, and the host later reports each outcome through
//! [`Loader::resolve`]. A [`Texture`] is a shared handle, so every sprite that
//! references a key sees it become ready at the same moment.
//!
//! Loader events, by name:
//! - `"load"` / `"error"`: one item finished
//! - `"update"`: progress after any item finished
//! - `"complete"`: every requested item finished, successfully or not

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::SceneError;
use crate::eventer::{Eventer, ListenerId};

#[derive(Debug, Clone, PartialEq)]
pub enum TextureState {
    Pending,
    Loaded { width: u32, height: u32 },
    Failed(String),
}

#[derive(Debug)]
struct TextureInner {
    key: String,
    source: String,
    state: RefCell<TextureState>,
}

/// Shared handle to one texture.
#[derive(Debug, Clone)]
pub struct Texture(Rc<TextureInner>);

impl Texture {
    pub fn new(key: impl Into<String>, source: impl Into<String>) -> Self {
        Self(Rc::new(TextureInner {
            key: key.into(),
            source: source.into(),
            state: RefCell::new(TextureState::Pending),
        }))
    }

    /// Texture that is ready immediately.
    pub fn loaded(key: impl Into<String>, width: u32, height: u32) -> Self {
        let texture = Self::new(key, "");
        texture.set_state(TextureState::Loaded { width, height });
        texture
    }

    pub fn key(&self) -> &str {
        &self.0.key
    }

    pub fn source(&self) -> &str {
        &self.0.source
    }

    pub fn state(&self) -> TextureState {
        self.0.state.borrow().clone()
    }

    fn set_state(&self, state: TextureState) {
        *self.0.state.borrow_mut() = state;
    }

    pub fn is_loaded(&self) -> bool {
        matches!(*self.0.state.borrow(), TextureState::Loaded { .. })
    }

    pub fn is_settled(&self) -> bool {
        !matches!(*self.0.state.borrow(), TextureState::Pending)
    }

    /// Natural pixel size once loaded.
    pub fn size(&self) -> Option<(u32, u32)> {
        match *self.0.state.borrow() {
            TextureState::Loaded { width, height } => Some((width, height)),
            _ => None,
        }
    }

    pub fn width(&self) -> f64 {
        self.size().map_or(0.0, |(w, _)| f64::from(w))
    }

    pub fn height(&self) -> f64 {
        self.size().map_or(0.0, |(_, h)| f64::from(h))
    }

    pub fn same(&self, other: &Texture) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoaderEvent {
    Load { key: String },
    Error { key: String, message: String },
    Update { settled: usize, total: usize },
    Complete { loaded: usize, failed: usize },
}

#[derive(Debug, Default)]
pub struct Loader {
    /// Requested textures in request order.
    textures: Vec<Texture>,
    events: Eventer<LoaderEvent>,
}

impl Loader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request one texture. Requesting a known key returns the existing handle.
    pub fn add(&mut self, key: &str, source: &str) -> Texture {
        if let Some(existing) = self.get(key) {
            return existing;
        }
        let texture = Texture::new(key, source);
        self.textures.push(texture.clone());
        texture
    }

    /// Request several textures at once.
    pub fn load<'a, I>(&mut self, items: I) -> Vec<Texture>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        items
            .into_iter()
            .map(|(key, source)| self.add(key, source))
            .collect()
    }

    pub fn get(&self, key: &str) -> Option<Texture> {
        self.textures.iter().find(|t| t.key() == key).cloned()
    }

    /// Keys still waiting for an outcome, with their sources.
    pub fn pending(&self) -> Vec<(&str, &str)> {
        self.textures
            .iter()
            .filter(|t| !t.is_settled())
            .map(|t| (t.key(), t.source()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.textures.iter().all(Texture::is_settled)
    }

    /// Fraction of requested textures that have settled.
    pub fn progress(&self) -> f64 {
        if self.textures.is_empty() {
            return 1.0;
        }
        self.settled() as f64 / self.textures.len() as f64
    }

    fn settled(&self) -> usize {
        self.textures.iter().filter(|t| t.is_settled()).count()
    }

    pub fn on(&self, name: &str, callback: impl FnMut(&LoaderEvent) + 'static) -> ListenerId {
        self.events.on(name, callback)
    }

    pub fn once(&self, name: &str, callback: impl FnMut(&LoaderEvent) + 'static) -> ListenerId {
        self.events.once(name, callback)
    }

    pub fn off(&self, id: ListenerId) -> bool {
        self.events.off(id)
    }

    /// Report the outcome of loading `key`.
    pub fn resolve(&mut self, key: &str, outcome: Result<(u32, u32), String>) -> Result<(), SceneError> {
        let texture = self
            .get(key)
            .ok_or_else(|| SceneError::UnknownTexture(key.to_string()))?;
        if texture.is_settled() {
            tracing::debug!(key, "texture already settled; ignoring outcome");
            return Ok(());
        }

        match outcome {
            Ok((width, height)) => {
                texture.set_state(TextureState::Loaded { width, height });
                tracing::debug!(key, width, height, "texture loaded");
                self.events.emit("load", &LoaderEvent::Load { key: key.to_string() });
            }
            Err(message) => {
                tracing::warn!(key, %message, "texture failed to load");
                texture.set_state(TextureState::Failed(message.clone()));
                self.events.emit(
                    "error",
                    &LoaderEvent::Error {
                        key: key.to_string(),
                        message,
                    },
                );
            }
        }

        let settled = self.settled();
        let total = self.textures.len();
        self.events.emit("update", &LoaderEvent::Update { settled, total });
        if settled == total {
            let loaded = self.textures.iter().filter(|t| t.is_loaded()).count();
            self.events.emit(
                "complete",
                &LoaderEvent::Complete {
                    loaded,
                    failed: total - loaded,
                },
            );
        }
        Ok(())
    }
}
