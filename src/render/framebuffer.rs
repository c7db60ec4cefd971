//! Pixel surfaces owned by the camera.
//!
//! - [`Canvas`]: an ARGB8888 color surface with bounds-checked pixel access.
//! - [`DepthBuffer`]: per-pixel nearest depth for the current frame.
//! - [`DoubleBuffer`]: foreground/background canvases swapped once per frame.
//! - [`Present`]: where a finished frame goes after the swap.
//!
//! # Depth convention
//!
//! Depth is the post-divide NDC z of the projection, `0` at the near plane
//! and `1` at the far plane. Smaller is nearer, so the buffer is cleared to
//! `+inf` and keeps the minimum.

use std::path::Path;

use image::{ImageResult, Rgba, RgbaImage};

/// A 2D surface of packed ARGB8888 pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    pixels: Vec<u32>,
    width: u32,
    height: u32,
}

impl Canvas {
    pub fn new(width: u32, height: u32, color: u32) -> Self {
        Self {
            pixels: vec![color; (width * height) as usize],
            width,
            height,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn clear(&mut self, color: u32) {
        self.pixels.fill(color);
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x >= 0 && x < self.width as i32 && y >= 0 && y < self.height as i32 {
            Some((y as u32 * self.width + x as u32) as usize)
        } else {
            None
        }
    }

    /// Writes a pixel. Out-of-bounds coordinates are ignored; returns whether
    /// the pixel was on the surface.
    #[inline]
    pub fn set_pixel(&mut self, x: i32, y: i32, color: u32) -> bool {
        match self.index(x, y) {
            Some(idx) => {
                self.pixels[idx] = color;
                true
            }
            None => false,
        }
    }

    /// Get the color at (x, y), or None if out of bounds.
    #[inline]
    pub fn get_pixel(&self, x: i32, y: i32) -> Option<u32> {
        self.index(x, y).map(|idx| self.pixels[idx])
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// The pixel data as bytes, in native-endian ARGB8888 order as SDL expects.
    pub fn as_bytes(&self) -> &[u8] {
        // SAFETY: u32 has no padding and any byte pattern is a valid u8; the
        // slice covers exactly the Vec's initialized elements.
        unsafe {
            std::slice::from_raw_parts(
                self.pixels.as_ptr() as *const u8,
                self.pixels.len() * std::mem::size_of::<u32>(),
            )
        }
    }

    /// Converts the canvas into an RGBA image for encoding.
    pub fn to_image(&self) -> RgbaImage {
        RgbaImage::from_fn(self.width, self.height, |x, y| {
            let argb = self.pixels[(y * self.width + x) as usize];
            Rgba([
                (argb >> 16) as u8,
                (argb >> 8) as u8,
                argb as u8,
                (argb >> 24) as u8,
            ])
        })
    }

    /// Encodes the canvas to an image file; the format follows the extension.
    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> ImageResult<()> {
        self.to_image().save(path)
    }
}

/// A destination for finished frames, such as a window or an off-screen copy.
pub trait Present {
    fn present(&mut self, frame: &Canvas) -> Result<(), String>;
}

/// Presenting into a canvas copies the frame. Sizes must match.
impl Present for Canvas {
    fn present(&mut self, frame: &Canvas) -> Result<(), String> {
        if (self.width, self.height) != (frame.width, frame.height) {
            return Err(format!(
                "frame is {}x{} but surface is {}x{}",
                frame.width, frame.height, self.width, self.height
            ));
        }
        self.pixels.copy_from_slice(&frame.pixels);
        Ok(())
    }
}

/// Per-pixel depth of the nearest fragment written this frame.
#[derive(Debug, Clone)]
pub struct DepthBuffer {
    depths: Vec<f32>,
    width: u32,
    height: u32,
}

impl DepthBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            depths: vec![f32::INFINITY; (width * height) as usize],
            width,
            height,
        }
    }

    pub fn clear(&mut self) {
        self.depths.fill(f32::INFINITY);
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x >= 0 && x < self.width as i32 && y >= 0 && y < self.height as i32 {
            Some((y as u32 * self.width + x as u32) as usize)
        } else {
            None
        }
    }

    /// Records `depth` at (x, y) if it is nearer than what is stored.
    #[inline]
    pub fn write_nearest(&mut self, x: i32, y: i32, depth: f32) {
        if let Some(idx) = self.index(x, y) {
            if depth < self.depths[idx] {
                self.depths[idx] = depth;
            }
        }
    }

    /// A fragment passes when it is at least as near as the stored depth.
    /// Off-surface coordinates never pass.
    #[inline]
    pub fn test(&self, x: i32, y: i32, depth: f32) -> bool {
        self.index(x, y)
            .map(|idx| depth <= self.depths[idx])
            .unwrap_or(false)
    }

    #[inline]
    pub fn get(&self, x: i32, y: i32) -> Option<f32> {
        self.index(x, y).map(|idx| self.depths[idx])
    }
}

/// Two canvases: the foreground is drawn into, the background is presented.
#[derive(Debug, Clone)]
pub struct DoubleBuffer {
    foreground: Canvas,
    background: Canvas,
}

impl DoubleBuffer {
    pub fn new(width: u32, height: u32, color: u32) -> Self {
        Self {
            foreground: Canvas::new(width, height, color),
            background: Canvas::new(width, height, color),
        }
    }

    pub fn foreground(&self) -> &Canvas {
        &self.foreground
    }

    pub fn foreground_mut(&mut self) -> &mut Canvas {
        &mut self.foreground
    }

    pub fn background(&self) -> &Canvas {
        &self.background
    }

    /// Exchanges the two canvases. Only the buffer handles move.
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.foreground, &mut self.background);
    }
}
