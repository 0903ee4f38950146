//! Pseudorandom sample streams, threaded explicitly through ray generation
//! and path tracing.

use crate::math::Vec3;
use std::f32::consts::PI;

const ONE_MINUS_EPSILON: f32 = 1.0 - f32::EPSILON / 2.0;

pub trait SampleStream {
    /// Uniform value in `[0, 1)`.
    fn next_f32(&mut self) -> f32;
}

/// Which generator seeds each pixel sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamKind {
    /// 64-bit LCG seeded from a hash of frame, pixel and sample index.
    #[default]
    Hashed,
    /// Golden-ratio recurrence over `fract(sin(seed) * 43758.5453)`.
    Legacy,
}

/// Inputs that decide a single pixel sample's stream.
#[derive(Debug, Clone, Copy)]
pub struct StreamKey {
    pub frame_seed: u64,
    pub elapsed: f32,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub sample: u32,
}

impl StreamKind {
    pub fn stream(self, key: &StreamKey) -> PixelStream {
        match self {
            StreamKind::Hashed => PixelStream::Hashed(HashedStream::new(hash_seed(
                key.frame_seed,
                key.x,
                key.y,
                key.sample,
            ))),
            StreamKind::Legacy => {
                let u = (key.x as f64 + 0.5) / key.width.max(1) as f64;
                let v = (key.y as f64 + 0.5) / key.height.max(1) as f64;
                let seed = key.elapsed as f64 + u * 1000.0 + v * 100.0 + key.sample as f64;
                PixelStream::Legacy(GoldenRatioStream::new(seed))
            }
        }
    }
}

pub enum PixelStream {
    Hashed(HashedStream),
    Legacy(GoldenRatioStream),
}

impl SampleStream for PixelStream {
    fn next_f32(&mut self) -> f32 {
        match self {
            PixelStream::Hashed(stream) => stream.next_f32(),
            PixelStream::Legacy(stream) => stream.next_f32(),
        }
    }
}

/// Seed for one frame, mixing the configured seed with the elapsed-time
/// entropy source and the frame index.
pub fn frame_seed(seed: u64, elapsed: f32, frame: u64) -> u64 {
    mix64(seed ^ mix64(u64::from(elapsed.to_bits()) ^ (frame << 32)))
}

pub fn hash_seed(seed: u64, x: u32, y: u32, sample: u32) -> u64 {
    mix64(seed ^ ((x as u64) << 32) ^ ((y as u64) << 16) ^ sample as u64)
}

fn mix64(mut v: u64) -> u64 {
    v = v.wrapping_add(0x9e3779b97f4a7c15);
    v = (v ^ (v >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
    v = (v ^ (v >> 27)).wrapping_mul(0x94d049bb133111eb);
    v ^ (v >> 31)
}

pub struct HashedStream {
    state: u64,
}

impl HashedStream {
    pub fn new(seed: u64) -> Self {
        let state = if seed == 0 { 0xdeadbeefcafebabe } else { seed };
        Self { state }
    }

    fn next_u32(&mut self) -> u32 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.state >> 32) as u32
    }
}

impl SampleStream for HashedStream {
    fn next_f32(&mut self) -> f32 {
        // Top 24 bits fill the f32 mantissa exactly.
        (self.next_u32() >> 8) as f32 * (1.0 / (1u32 << 24) as f32)
    }
}

/// `seed = seed * PHI + 0.1` after every draw.
///
/// The state lives in f64 and is folded back below `FOLD`; unfolded it
/// overflows to infinity after a few hundred draws.
pub struct GoldenRatioStream {
    seed: f64,
}

impl GoldenRatioStream {
    pub const PHI: f64 = 1.61803398875;
    pub const INCREMENT: f64 = 0.1;
    const FOLD: f64 = 1_048_576.0;

    pub fn new(seed: f64) -> Self {
        Self {
            seed: seed.rem_euclid(Self::FOLD),
        }
    }

    pub fn seed(&self) -> f64 {
        self.seed
    }

    pub fn advance(&mut self) {
        self.seed = (self.seed * Self::PHI + Self::INCREMENT).rem_euclid(Self::FOLD);
    }
}

impl SampleStream for GoldenRatioStream {
    fn next_f32(&mut self) -> f32 {
        let x = self.seed.sin() * 43758.5453;
        let value = (x - x.floor()) as f32;
        self.advance();
        value.min(ONE_MINUS_EPSILON)
    }
}

/// Uniformly distributed unit vector.
pub fn uniform_sphere(stream: &mut impl SampleStream) -> Vec3 {
    let a = stream.next_f32() * 2.0 * PI;
    let z = stream.next_f32() * 2.0 - 1.0;
    let r = (1.0 - z * z).max(0.0).sqrt();
    Vec3::new(r * a.cos(), r * a.sin(), z)
}

/// Cosine-weighted direction about `normal`: a unit normal plus a uniform
/// unit vector, renormalised, has density proportional to `cos(theta)`.
pub fn cosine_hemisphere(normal: Vec3, stream: &mut impl SampleStream) -> Vec3 {
    let dir = normal + uniform_sphere(stream);
    let len = dir.length();
    if len < 1e-6 {
        normal
    } else {
        dir / len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(x: u32, y: u32, sample: u32) -> StreamKey {
        StreamKey {
            frame_seed: frame_seed(1, 0.25, 0),
            elapsed: 0.25,
            x,
            y,
            width: 64,
            height: 48,
            sample,
        }
    }

    #[test]
    fn streams_stay_in_unit_interval() {
        for kind in [StreamKind::Hashed, StreamKind::Legacy] {
            let mut stream = kind.stream(&key(3, 7, 0));
            for _ in 0..10_000 {
                let v = stream.next_f32();
                assert!((0.0..1.0).contains(&v), "{kind:?} produced {v}");
            }
        }
    }

    #[test]
    fn same_key_replays_same_values() {
        let mut a = StreamKind::Hashed.stream(&key(5, 5, 2));
        let mut b = StreamKind::Hashed.stream(&key(5, 5, 2));
        for _ in 0..16 {
            assert_eq!(a.next_f32(), b.next_f32());
        }
    }

    #[test]
    fn neighbouring_pixels_get_different_streams() {
        let first = |x, y| StreamKind::Hashed.stream(&key(x, y, 0)).next_f32();
        assert_ne!(first(10, 10), first(11, 10));
        assert_ne!(first(10, 10), first(10, 11));
    }

    #[test]
    fn golden_ratio_state_never_overflows() {
        let mut stream = GoldenRatioStream::new(1234.5);
        for _ in 0..100_000 {
            stream.next_f32();
        }
        assert!(stream.seed().is_finite());
        assert!(stream.seed() >= 0.0);
    }

    #[test]
    fn golden_ratio_follows_recurrence() {
        let mut stream = GoldenRatioStream::new(2.0);
        stream.next_f32();
        assert!((stream.seed() - (2.0 * GoldenRatioStream::PHI + 0.1)).abs() < 1e-12);
    }

    #[test]
    fn cosine_hemisphere_has_cosine_mean() {
        let normal = Vec3::new(0.0, 1.0, 0.0);
        let mut stream = HashedStream::new(42);
        let n = 50_000;
        let mut sum = 0.0;
        for _ in 0..n {
            let d = cosine_hemisphere(normal, &mut stream);
            let cos = d.dot(normal);
            assert!(cos >= -1e-6);
            assert!((d.length() - 1.0).abs() < 1e-4);
            sum += cos as f64;
        }
        // E[cos] is 2/3 under a cosine density and 1/2 under a uniform one.
        let mean = sum / n as f64;
        assert!((mean - 2.0 / 3.0).abs() < 0.02, "mean cos {mean}");
    }
}
