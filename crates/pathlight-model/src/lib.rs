//! Shared data records for Pathlight.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SceneFile {
    pub version: u32,
    pub spheres: Vec<SphereRecord>,
    pub boxes: Vec<BoxRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MaterialRecord {
    pub emittance: [f32; 3],
    pub reflectance: [f32; 3],
    pub roughness: f32,
    pub opacity: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SphereRecord {
    pub center: [f32; 3],
    pub radius: f32,
    pub material: MaterialRecord,
}

/// Oriented box. `rotation` holds the three local axes as columns.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BoxRecord {
    pub center: [f32; 3],
    pub half_extents: [f32; 3],
    pub rotation: [[f32; 3]; 3],
    pub material: MaterialRecord,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PoseRecord {
    pub position: [f32; 3],
    pub direction: [f32; 3],
    pub up: [f32; 3],
    pub fov_deg: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FrameRecord {
    pub index: u32,
    pub reset: bool,
    pub samples_per_pixel: u32,
    pub sample_count: u32,
    pub millis: f64,
    pub pose: PoseRecord,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunSettings {
    pub width: u32,
    pub height: u32,
    pub frames: u32,
    pub fov_deg: f32,
    pub distance: f32,
    pub orbit_deg: f32,
    pub max_depth: u32,
    pub moving_spp: u32,
    pub still_spp: u32,
    pub stream: String,
    pub seed: u64,
    pub threads: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunOutputs {
    pub image: String,
    pub hdr: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HostInfo {
    pub os: String,
    pub arch: String,
}

/// Written next to the image after a `render` run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunReceipt {
    pub version: String,
    pub started_at_utc: String,
    pub finished_at_utc: String,
    /// True when the run stopped early on Ctrl-C.
    pub interrupted: bool,
    pub settings: RunSettings,
    pub frames: Vec<FrameRecord>,
    pub outputs: RunOutputs,
    pub host: HostInfo,
}
