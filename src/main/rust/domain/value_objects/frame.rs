use std::fmt;

use serde::Serialize;

/// Frame dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Resolution {
    width: u32,
    height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// True when either axis is zero
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A four-byte-per-pixel frame buffer owned by one relay worker.
///
/// Sources fill it in place; the buffer is reallocated only when the
/// resolution changes.
#[derive(Debug, Clone, Default)]
pub struct VideoFrame {
    resolution: Resolution,
    data: Vec<u8>,
}

impl VideoFrame {
    pub fn new(resolution: Resolution) -> Self {
        Self {
            resolution,
            data: vec![0; resolution.pixel_count() * 4],
        }
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn pixel_count(&self) -> usize {
        self.resolution.pixel_count()
    }

    /// Match the buffer to `resolution`; returns true when it had to change
    pub fn resize(&mut self, resolution: Resolution) -> bool {
        if resolution == self.resolution {
            return false;
        }
        self.resolution = resolution;
        self.data = vec![0; resolution.pixel_count() * 4];
        true
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}
