//! Pixel post-processing.
//!
//! `BlurFilter` approximates a gaussian blur with repeated horizontal and
//! vertical box blurs over a straight RGBA8 buffer.

use serde::{Deserialize, Serialize};

/// Straight-alpha RGBA8 pixel buffer, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl PixelBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0u8; width as usize * height as usize * 4],
        }
    }

    pub fn get_pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        Some([self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]])
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        self.data[i..i + 4].copy_from_slice(&rgba);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlurFilter {
    /// Horizontal radius in pixels.
    pub blur_x: u32,
    /// Vertical radius in pixels.
    pub blur_y: u32,
    /// Number of box passes; 3 is close to gaussian.
    pub quality: u32,
}

impl Default for BlurFilter {
    fn default() -> Self {
        Self {
            blur_x: 2,
            blur_y: 2,
            quality: 3,
        }
    }
}

impl BlurFilter {
    pub fn new(blur_x: u32, blur_y: u32) -> Self {
        Self {
            blur_x,
            blur_y,
            ..Self::default()
        }
    }

    /// Extra pixels the blur bleeds outside the source region.
    pub fn padding(&self) -> (u32, u32) {
        (self.blur_x * self.quality, self.blur_y * self.quality)
    }

    pub fn apply(&self, buffer: &mut PixelBuffer) {
        if buffer.width == 0 || buffer.height == 0 {
            return;
        }
        let mut scratch = vec![0u8; buffer.data.len()];
        for _ in 0..self.quality.max(1) {
            if self.blur_x > 0 {
                box_blur_h(&buffer.data, &mut scratch, buffer.width, buffer.height, self.blur_x);
                std::mem::swap(&mut buffer.data, &mut scratch);
            }
            if self.blur_y > 0 {
                box_blur_v(&buffer.data, &mut scratch, buffer.width, buffer.height, self.blur_y);
                std::mem::swap(&mut buffer.data, &mut scratch);
            }
        }
    }
}

fn box_blur_h(src: &[u8], dst: &mut [u8], width: u32, height: u32, radius: u32) {
    let (w, r) = (width as i64, radius as i64);
    let span = (2 * r + 1) as u32;
    for y in 0..height as i64 {
        let row = (y * w * 4) as usize;
        let mut acc = [0u32; 4];
        // Edge pixels are clamped into the window.
        for k in -r..=r {
            let x = k.clamp(0, w - 1) as usize;
            for c in 0..4 {
                acc[c] += src[row + x * 4 + c] as u32;
            }
        }
        for x in 0..w {
            let o = row + x as usize * 4;
            for c in 0..4 {
                dst[o + c] = (acc[c] / span) as u8;
            }
            let out = (x - r).clamp(0, w - 1) as usize;
            let inc = (x + r + 1).clamp(0, w - 1) as usize;
            for c in 0..4 {
                acc[c] = acc[c] + src[row + inc * 4 + c] as u32 - src[row + out * 4 + c] as u32;
            }
        }
    }
}

fn box_blur_v(src: &[u8], dst: &mut [u8], width: u32, height: u32, radius: u32) {
    let (w, h, r) = (width as usize, height as i64, radius as i64);
    let span = (2 * r + 1) as u32;
    for x in 0..w {
        let mut acc = [0u32; 4];
        for k in -r..=r {
            let y = k.clamp(0, h - 1) as usize;
            for c in 0..4 {
                acc[c] += src[(y * w + x) * 4 + c] as u32;
            }
        }
        for y in 0..h {
            let o = (y as usize * w + x) * 4;
            for c in 0..4 {
                dst[o + c] = (acc[c] / span) as u8;
            }
            let out = (y - r).clamp(0, h - 1) as usize;
            let inc = (y + r + 1).clamp(0, h - 1) as usize;
            for c in 0..4 {
                acc[c] = acc[c] + src[(inc * w + x) * 4 + c] as u32 - src[(out * w + x) * 4 + c] as u32;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_buffer_is_unchanged() {
        let mut buf = PixelBuffer::new(8, 8);
        for y in 0..8 {
            for x in 0..8 {
                buf.set_pixel(x, y, [100, 50, 25, 255]);
            }
        }
        let before = buf.clone();
        BlurFilter::new(2, 2).apply(&mut buf);
        assert_eq!(buf, before);
    }

    #[test]
    fn test_single_pixel_spreads() {
        let mut buf = PixelBuffer::new(9, 9);
        buf.set_pixel(4, 4, [255, 255, 255, 255]);
        BlurFilter {
            blur_x: 1,
            blur_y: 1,
            quality: 1,
        }
        .apply(&mut buf);

        let center = buf.get_pixel(4, 4).unwrap();
        let neighbor = buf.get_pixel(5, 5).unwrap();
        let far = buf.get_pixel(0, 0).unwrap();
        assert!(center[3] > 0 && center[3] < 255);
        assert_eq!(neighbor[3], center[3]);
        assert_eq!(far[3], 0);
    }
}
