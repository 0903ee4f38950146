use crate::accumulation::AccumulationState;
use crate::math::Vec3;
use image::{Rgb, RgbImage};

/// Display-ready pixels, each channel in `[0, 1]`, row 0 at the top.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<[f32; 3]>,
}

impl DisplayImage {
    pub fn pixel(&self, x: u32, y: u32) -> [f32; 3] {
        self.pixels[(y * self.width + x) as usize]
    }

    pub fn to_rgb8(&self) -> RgbImage {
        RgbImage::from_fn(self.width, self.height, |x, y| {
            let [r, g, b] = self.pixel(x, y);
            Rgb([quantize(r), quantize(g), quantize(b)])
        })
    }
}

fn quantize(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u8
}

/// Reinhard compression followed by gamma encoding.
#[derive(Debug, Clone, Copy)]
pub struct ToneMapper {
    pub gamma: f32,
}

impl Default for ToneMapper {
    fn default() -> Self {
        Self { gamma: 2.2 }
    }
}

impl ToneMapper {
    pub fn map(&self, state: &AccumulationState) -> DisplayImage {
        self.map_buffer(state.buffer(), state.sample_count(), state.viewport().width, state.viewport().height)
    }

    pub fn map_buffer(&self, buffer: &[Vec3], sample_count: u32, width: u32, height: u32) -> DisplayImage {
        let pixels = buffer
            .iter()
            .map(|sum| self.map_pixel(*sum, sample_count).to_array())
            .collect();

        DisplayImage {
            width,
            height,
            pixels,
        }
    }

    /// `sum / count`, then `c / (c + 1)`, then `c^(1/gamma)`.
    pub fn map_pixel(&self, sum: Vec3, sample_count: u32) -> Vec3 {
        if sample_count == 0 {
            return Vec3::zero();
        }

        let inv_gamma = 1.0 / self.gamma;
        (sum / sample_count as f32).map(|c| {
            // NaN fails the comparison and lands on zero as well.
            let c = if c > 0.0 { c } else { 0.0 };
            let compressed = if c.is_infinite() { 1.0 } else { c / (c + 1.0) };
            compressed.powf(inv_gamma)
        })
    }
}
