//! Crop geometry
//!
//! Regions are kept normalized (0.0-1.0) relative to the image so the same
//! selection applies regardless of resolution or rotation.

use std::str::FromStr;

/// Rectangular selection normalized to image size: (x, y, width, height)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropRegion {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Pixel rectangle inside a concrete image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Default for CropRegion {
    fn default() -> Self {
        Self::full()
    }
}

impl CropRegion {
    /// The whole image
    pub fn full() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 1.0,
            height: 1.0,
        }
    }

    /// Build a region, clamping it to the image
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        let x = x.clamp(0.0, 1.0);
        let y = y.clamp(0.0, 1.0);
        Self {
            x,
            y,
            width: width.clamp(0.0, 1.0 - x),
            height: height.clamp(0.0, 1.0 - y),
        }
    }

    /// Convert to pixels for an image of the given size
    ///
    /// The result is never empty and never leaves the image.
    pub fn to_pixels(&self, image_width: u32, image_height: u32) -> PixelRect {
        let x = ((self.x * image_width as f32).round() as u32).min(image_width.saturating_sub(1));
        let y = ((self.y * image_height as f32).round() as u32).min(image_height.saturating_sub(1));
        let width = ((self.width * image_width as f32).round() as u32).clamp(1, (image_width - x).max(1));
        let height = ((self.height * image_height as f32).round() as u32).clamp(1, (image_height - y).max(1));

        PixelRect { x, y, width, height }
    }
}

impl FromStr for CropRegion {
    type Err = String;

    /// Parse `x,y,width,height` with normalized components
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<f32> = s
            .split(',')
            .map(|p| p.trim().parse::<f32>().map_err(|e| format!("invalid region component '{}': {}", p.trim(), e)))
            .collect::<Result<_, _>>()?;

        let [x, y, width, height] = parts[..] else {
            return Err(format!("expected x,y,width,height but got {} values", parts.len()));
        };

        if parts.iter().any(|p| !p.is_finite()) {
            return Err("region components must be finite numbers".to_string());
        }
        if width <= 0.0 || height <= 0.0 {
            return Err("region width and height must be positive".to_string());
        }

        Ok(Self::new(x, y, width, height))
    }
}

impl PixelRect {
    /// Shrink to the largest centered rectangle with the given aspect ratio
    pub fn fit_aspect(&self, ratio: (u32, u32)) -> PixelRect {
        let (rw, rh) = (ratio.0.max(1) as u64, ratio.1.max(1) as u64);
        let (w, h) = (self.width as u64, self.height as u64);

        // Compare w/h against rw/rh without floating point
        let (width, height) = if w * rh > h * rw {
            ((h * rw / rh).max(1), h)
        } else {
            (w, (w * rh / rw).max(1))
        };

        PixelRect {
            x: self.x + ((w - width) / 2) as u32,
            y: self.y + ((h - height) / 2) as u32,
            width: width as u32,
            height: height as u32,
        }
    }
}

/// Clockwise rotation applied before cropping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    #[default]
    None,
    Cw90,
    Cw180,
    Cw270,
}

impl Rotation {
    /// Accepts any multiple of 90, including negative angles
    pub fn from_degrees(degrees: i32) -> Result<Self, String> {
        match degrees.rem_euclid(360) {
            0 => Ok(Rotation::None),
            90 => Ok(Rotation::Cw90),
            180 => Ok(Rotation::Cw180),
            270 => Ok(Rotation::Cw270),
            _ => Err(format!("rotation must be a multiple of 90 degrees, got {}", degrees)),
        }
    }
}
