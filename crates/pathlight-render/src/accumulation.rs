//! Cross-frame accumulation of per-pixel radiance.
//!
//! Each frame is first planned (reset or accumulate, and how many samples to
//! spend) and only later committed. Nothing changes between the two calls,
//! so a frame that is abandoned half way leaves the state exactly as the
//! previous commit left it.

use crate::camera::{CameraPose, PoseChange, ViewportSize};
use crate::math::Vec3;

/// Samples per pixel per frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplePolicy {
    /// Budget on a frame that restarts accumulation.
    pub moving: u32,
    /// Budget on a frame that adds to the existing sum.
    pub still: u32,
}

impl Default for SamplePolicy {
    fn default() -> Self {
        Self { moving: 4, still: 16 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramePlan {
    pub reset: bool,
    pub samples_per_pixel: u32,
}

/// HDR running sum, one entry per pixel in row-major order, top row first.
#[derive(Debug, Clone)]
pub struct AccumulationState {
    viewport: ViewportSize,
    buffer: Vec<Vec3>,
    sample_count: u32,
    last_pose: Option<CameraPose>,
}

impl AccumulationState {
    pub fn new(viewport: ViewportSize) -> Self {
        Self {
            viewport,
            buffer: vec![Vec3::zero(); viewport.pixel_count()],
            sample_count: 0,
            last_pose: None,
        }
    }

    pub fn viewport(&self) -> ViewportSize {
        self.viewport
    }

    /// Summed, not averaged, radiance.
    pub fn buffer(&self) -> &[Vec3] {
        &self.buffer
    }

    /// Number of committed frames since the last reset.
    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    pub fn last_pose(&self) -> Option<&CameraPose> {
        self.last_pose.as_ref()
    }

    pub fn sum_at(&self, x: u32, y: u32) -> Vec3 {
        self.buffer[y as usize * self.viewport.width as usize + x as usize]
    }

    /// Mean radiance at a pixel, zero before the first commit.
    pub fn average_at(&self, x: u32, y: u32) -> Vec3 {
        if self.sample_count == 0 {
            Vec3::zero()
        } else {
            self.sum_at(x, y) / self.sample_count as f32
        }
    }
}

#[derive(Debug, Clone)]
pub struct AccumulationController {
    policy: SamplePolicy,
    state: AccumulationState,
}

impl AccumulationController {
    pub fn new(viewport: ViewportSize, policy: SamplePolicy) -> Self {
        Self {
            policy,
            state: AccumulationState::new(viewport),
        }
    }

    pub fn policy(&self) -> SamplePolicy {
        self.policy
    }

    pub fn state(&self) -> &AccumulationState {
        &self.state
    }

    /// Throw the state away and start over at a new size.
    pub fn resize(&mut self, viewport: ViewportSize) {
        self.state = AccumulationState::new(viewport);
    }

    pub fn plan(&self, pose: &CameraPose, change: PoseChange) -> FramePlan {
        let reset = match self.state.last_pose {
            None => true,
            Some(last) => match change {
                PoseChange::Moved => true,
                PoseChange::Unchanged => false,
                PoseChange::Unknown => !last.same_view(pose),
            },
        };

        FramePlan {
            reset,
            samples_per_pixel: if reset {
                self.policy.moving
            } else {
                self.policy.still
            },
        }
    }

    /// Fold one finished frame into the sum. `frame` holds each pixel's mean
    /// over the frame's samples and must match the viewport size.
    pub fn commit(&mut self, plan: FramePlan, pose: &CameraPose, frame: &[Vec3]) {
        assert_eq!(
            frame.len(),
            self.state.buffer.len(),
            "frame does not match the accumulation viewport"
        );

        let state = &mut self.state;
        if plan.reset {
            state.buffer.fill(Vec3::zero());
            state.sample_count = 0;
        }
        for (sum, value) in state.buffer.iter_mut().zip(frame) {
            *sum += *value;
        }
        state.sample_count += 1;
        state.last_pose = Some(*pose);
    }
}
