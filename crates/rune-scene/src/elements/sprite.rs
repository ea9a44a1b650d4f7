use std::collections::BTreeMap;

use engine_core::{Rectangle, Surface};

use super::Renderable;
use crate::animation::ClipDescriptor;
use crate::texture::Texture;

/// Textured quad, optionally cut into a uniform grid of frames.
///
/// Frame `n` of a grid sheet sits at column `n % columns`, row
/// `n / columns`, where `columns = texture_width / frame_width`.
#[derive(Debug, Clone)]
pub struct Sprite {
    texture: Texture,
    frame_size: Option<(f64, f64)>,
    clips: BTreeMap<String, ClipDescriptor>,
    frame: usize,
}

impl Sprite {
    pub fn new(texture: Texture) -> Self {
        Self {
            texture,
            frame_size: None,
            clips: BTreeMap::new(),
            frame: 0,
        }
    }

    /// Cut the texture into `frame_width × frame_height` cells.
    pub fn with_grid(mut self, frame_width: f64, frame_height: f64) -> Self {
        if frame_width > 0.0 && frame_height > 0.0 {
            self.frame_size = Some((frame_width, frame_height));
        } else {
            tracing::warn!(frame_width, frame_height, "ignoring empty frame grid");
        }
        self
    }

    pub fn with_clip(mut self, name: &str, clip: ClipDescriptor) -> Self {
        self.add_clip(name, clip);
        self
    }

    pub fn add_clip(&mut self, name: &str, clip: ClipDescriptor) {
        self.clips.insert(name.to_string(), clip);
    }

    pub fn clip(&self, name: &str) -> Option<&ClipDescriptor> {
        self.clips.get(name)
    }

    pub fn clip_names(&self) -> impl Iterator<Item = &str> {
        self.clips.keys().map(String::as_str)
    }

    pub fn texture(&self) -> &Texture {
        &self.texture
    }

    pub fn set_texture(&mut self, texture: Texture) {
        self.texture = texture;
    }

    pub fn frame(&self) -> usize {
        self.frame
    }

    pub fn set_frame(&mut self, frame: usize) {
        self.frame = frame;
    }

    pub(crate) fn frame_mut(&mut self) -> &mut usize {
        &mut self.frame
    }

    /// Displayed size: one grid cell, or the whole texture.
    pub fn size(&self) -> (f64, f64) {
        self.frame_size
            .unwrap_or_else(|| (self.texture.width(), self.texture.height()))
    }

    pub fn columns(&self) -> usize {
        match self.frame_size {
            Some((fw, _)) => ((self.texture.width() / fw).floor() as usize).max(1),
            None => 1,
        }
    }

    /// Source rectangle of `frame` on the texture.
    pub fn frame_rect(&self, frame: usize) -> Option<Rectangle> {
        if !self.texture.is_loaded() {
            return None;
        }
        let Some((fw, fh)) = self.frame_size else {
            return Some(Rectangle::new(0.0, 0.0, self.texture.width(), self.texture.height()));
        };
        let columns = self.columns();
        let x = (frame % columns) as f64 * fw;
        let y = (frame / columns) as f64 * fh;
        if y + fh > self.texture.height() + f64::EPSILON {
            tracing::warn!(frame, texture = self.texture.key(), "frame outside the sheet");
            return None;
        }
        Some(Rectangle::new(x, y, fw, fh))
    }
}

impl Renderable for Sprite {
    fn render_me(&self, surface: &mut dyn Surface) -> bool {
        let Some(src) = self.frame_rect(self.frame) else {
            return false;
        };
        let (w, h) = self.size();
        surface.draw_image(self.texture.key(), src, Rectangle::new(0.0, 0.0, w, h));
        true
    }

    fn local_bounds(&self) -> Option<Rectangle> {
        let (w, h) = self.size();
        Some(Rectangle::new(0.0, 0.0, w, h))
    }

    fn is_ready(&self) -> bool {
        self.texture.is_loaded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::{Command, DisplayList};

    fn sheet() -> Sprite {
        Sprite::new(Texture::loaded("hero", 128, 64)).with_grid(32.0, 32.0)
    }

    #[test]
    fn test_grid_frames() {
        let sprite = sheet();
        assert_eq!(sprite.columns(), 4);
        assert_eq!(sprite.frame_rect(0), Some(Rectangle::new(0.0, 0.0, 32.0, 32.0)));
        assert_eq!(sprite.frame_rect(5), Some(Rectangle::new(32.0, 32.0, 32.0, 32.0)));
        assert_eq!(sprite.frame_rect(8), None);
    }

    #[test]
    fn test_whole_texture_without_grid() {
        let sprite = Sprite::new(Texture::loaded("bg", 300, 200));
        assert_eq!(sprite.size(), (300.0, 200.0));
        assert_eq!(sprite.frame_rect(3), Some(Rectangle::new(0.0, 0.0, 300.0, 200.0)));
    }

    #[test]
    fn test_not_ready_until_loaded() {
        let sprite = Sprite::new(Texture::new("late", "late.png"));
        assert!(!sprite.is_ready());
        let mut list = DisplayList::new(10, 10);
        assert!(!sprite.render_me(&mut list));
        assert!(list.commands.is_empty());
    }

    #[test]
    fn test_render_draws_current_frame() {
        let mut sprite = sheet();
        sprite.set_frame(2);
        let mut list = DisplayList::new(10, 10);
        assert!(sprite.render_me(&mut list));
        match &list.commands[0] {
            Command::DrawImage { image, src, dst, .. } => {
                assert_eq!(image, "hero");
                assert_eq!(*src, Rectangle::new(64.0, 0.0, 32.0, 32.0));
                assert_eq!(*dst, Rectangle::new(0.0, 0.0, 32.0, 32.0));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
