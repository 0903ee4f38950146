use crate::math::{Ray, Vec3};
use crate::sampling::SampleStream;
use pathlight_model::PoseRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportSize {
    pub width: u32,
    pub height: u32,
}

impl ViewportSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

/// Where the camera is and what it looks at. `fov` is the vertical field of
/// view in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub position: Vec3,
    pub direction: Vec3,
    pub up: Vec3,
    pub fov: f32,
}

/// Orthonormal camera frame.
#[derive(Debug, Clone, Copy)]
pub struct Basis {
    pub forward: Vec3,
    pub right: Vec3,
    pub up: Vec3,
}

impl CameraPose {
    pub fn new(position: Vec3, direction: Vec3, up: Vec3, fov: f32) -> Self {
        Self {
            position,
            direction,
            up,
            fov,
        }
    }

    pub fn basis(&self) -> Basis {
        let forward = self.direction.normalized();
        let right = forward.cross(self.up).normalized();
        let up = right.cross(forward).normalized();
        Basis { forward, right, up }
    }

    /// Bit-exact comparison of position, direction and fov. `up` is ignored.
    pub fn same_view(&self, other: &CameraPose) -> bool {
        self.position.bits_eq(other.position)
            && self.direction.bits_eq(other.direction)
            && self.fov.to_bits() == other.fov.to_bits()
    }

    pub fn record(&self) -> PoseRecord {
        PoseRecord {
            position: self.position.to_array(),
            direction: self.direction.to_array(),
            up: self.up.to_array(),
            fov_deg: self.fov.to_degrees(),
        }
    }
}

/// Builds primary rays through the pixel grid. Row 0 is the top of the view.
#[derive(Debug, Clone, Copy)]
pub struct RayGenerator {
    /// Randomly offset each sample inside its pixel instead of using the centre.
    pub jitter: bool,
}

impl Default for RayGenerator {
    fn default() -> Self {
        Self { jitter: true }
    }
}

impl RayGenerator {
    /// Primary ray for pixel `(x, y)`. The sub-sample index reaches this
    /// function through `stream`, which is keyed on it.
    pub fn generate(
        &self,
        x: u32,
        y: u32,
        viewport: ViewportSize,
        pose: &CameraPose,
        stream: &mut impl SampleStream,
    ) -> Ray {
        let (jx, jy) = if self.jitter {
            (stream.next_f32(), stream.next_f32())
        } else {
            (0.5, 0.5)
        };

        let u = (x as f32 + jx) / viewport.width.max(1) as f32;
        let v = 1.0 - (y as f32 + jy) / viewport.height.max(1) as f32;
        self.ray_at(u, v, viewport.aspect(), pose)
    }

    /// Ray through normalized screen coordinates, `(0, 0)` bottom-left.
    pub fn ray_at(&self, u: f32, v: f32, aspect: f32, pose: &CameraPose) -> Ray {
        let basis = pose.basis();
        let scale = (pose.fov * 0.5).tan();
        let sx = (u * 2.0 - 1.0) * aspect;
        let sy = v * 2.0 - 1.0;

        let direction = basis.forward + basis.right * (sx * scale) + basis.up * (sy * scale);
        Ray::new(pose.position, direction)
    }
}

/// How the pose moved since the last committed frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoseChange {
    /// No hint; compare against the last pose exactly.
    Unknown,
    Moved,
    Unchanged,
}

/// Yaw/pitch fly camera. Every mutation raises a dirty flag that the frame
/// loop drains with [`CameraRig::take_change`].
#[derive(Debug, Clone)]
pub struct CameraRig {
    position: Vec3,
    yaw_deg: f32,
    pitch_deg: f32,
    fov_deg: f32,
    dirty: bool,
}

impl Default for CameraRig {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, 0.0, 25.0))
    }
}

impl CameraRig {
    const WORLD_UP: Vec3 = Vec3::new(0.0, 1.0, 0.0);
    const PITCH_LIMIT: f32 = 89.0;

    /// Looking down -Z with a 60 degree field of view.
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            yaw_deg: -90.0,
            pitch_deg: 0.0,
            fov_deg: 60.0,
            dirty: true,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn fov_deg(&self) -> f32 {
        self.fov_deg
    }

    pub fn direction(&self) -> Vec3 {
        let (yaw, pitch) = (self.yaw_deg.to_radians(), self.pitch_deg.to_radians());
        Vec3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos()).normalized()
    }

    pub fn pose(&self) -> CameraPose {
        let direction = self.direction();
        let right = direction.cross(Self::WORLD_UP).normalized();
        let up = right.cross(direction).normalized();
        CameraPose::new(self.position, direction, up, self.fov_deg.to_radians())
    }

    pub fn translate(&mut self, delta: Vec3) {
        if delta != Vec3::zero() {
            self.position += delta;
            self.dirty = true;
        }
    }

    pub fn set_position(&mut self, position: Vec3) {
        if !position.bits_eq(self.position) {
            self.position = position;
            self.dirty = true;
        }
    }

    pub fn rotate(&mut self, yaw_deg: f32, pitch_deg: f32) {
        if yaw_deg == 0.0 && pitch_deg == 0.0 {
            return;
        }
        self.yaw_deg += yaw_deg;
        self.pitch_deg = (self.pitch_deg + pitch_deg).clamp(-Self::PITCH_LIMIT, Self::PITCH_LIMIT);
        self.dirty = true;
    }

    pub fn set_fov(&mut self, fov_deg: f32) {
        if fov_deg.to_bits() != self.fov_deg.to_bits() {
            self.fov_deg = fov_deg;
            self.dirty = true;
        }
    }

    /// Report and clear the dirty flag.
    pub fn take_change(&mut self) -> PoseChange {
        if std::mem::take(&mut self.dirty) {
            PoseChange::Moved
        } else {
            PoseChange::Unchanged
        }
    }
}
