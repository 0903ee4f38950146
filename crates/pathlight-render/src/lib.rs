//! Progressive CPU path tracer for a fixed scene of spheres and oriented
//! boxes.

pub mod math;
pub mod material;
pub mod geometry;
pub mod error;
pub mod scene;
pub mod intersect;
pub mod sampling;
pub mod camera;
pub mod integrator;
pub mod accumulation;
pub mod tonemap;
pub mod renderer;
pub mod image_out;

pub use accumulation::{AccumulationController, AccumulationState, FramePlan, SamplePolicy};
pub use camera::{CameraPose, CameraRig, PoseChange, RayGenerator, ViewportSize};
pub use error::{RenderError, SceneError};
pub use image_out::{encode_hdr, encode_png, write_hdr, write_png};
pub use integrator::PathIntegrator;
pub use renderer::{CancelFlag, FrameInput, FrameReport, RenderSettings, Renderer};
pub use sampling::StreamKind;
pub use scene::Scene;
pub use tonemap::{DisplayImage, ToneMapper};
