use crate::geometry::Hit;
use crate::intersect::closest_hit;
use crate::math::{Ray, Vec3};
use crate::sampling::{cosine_hemisphere, SampleStream};
use crate::scene::Scene;

pub const DEFAULT_MAX_DEPTH: u32 = 8;
pub const SURFACE_OFFSET: f32 = 0.001;

/// State after one bounce, handed to [`PathIntegrator::trace_observed`].
#[derive(Debug, Clone, Copy)]
pub struct Bounce {
    pub depth: u32,
    pub hit: Hit,
    /// Throughput after multiplying in this surface's reflectance.
    pub throughput: Vec3,
    pub radiance: Vec3,
}

/// Bounded-depth path tracer. A path ends when it escapes the scene or
/// after `max_depth` surfaces; there is no Russian roulette.
#[derive(Debug, Clone, Copy)]
pub struct PathIntegrator {
    pub max_depth: u32,
    pub surface_offset: f32,
}

impl Default for PathIntegrator {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            surface_offset: SURFACE_OFFSET,
        }
    }
}

impl PathIntegrator {
    pub fn new(max_depth: u32) -> Self {
        Self {
            max_depth,
            ..Self::default()
        }
    }

    pub fn trace(&self, ray: &Ray, scene: &Scene, stream: &mut impl SampleStream) -> Vec3 {
        self.trace_observed(ray, scene, stream, |_| {})
    }

    pub fn trace_observed(
        &self,
        ray: &Ray,
        scene: &Scene,
        stream: &mut impl SampleStream,
        mut observe: impl FnMut(&Bounce),
    ) -> Vec3 {
        let mut current_ray = *ray;
        let mut throughput = Vec3::one();
        let mut radiance = Vec3::zero();

        for depth in 0..self.max_depth {
            let Some(hit) = closest_hit(&current_ray, scene) else {
                break;
            };

            radiance += throughput.mul_elem(hit.material.emittance);
            throughput = throughput.mul_elem(hit.material.reflectance);
            observe(&Bounce {
                depth,
                hit,
                throughput,
                radiance,
            });

            let direction = next_direction(current_ray.direction, &hit, stream);
            current_ray = Ray::new(hit.point + hit.normal * self.surface_offset, direction);
        }

        radiance
    }
}

/// Mirror direction blended toward a cosine-distributed one by roughness.
fn next_direction(incoming: Vec3, hit: &Hit, stream: &mut impl SampleStream) -> Vec3 {
    let mirror = incoming.reflect(hit.normal);
    let roughness = hit.material.roughness;
    if roughness <= 0.0 {
        return mirror;
    }

    let diffuse = cosine_hemisphere(hit.normal, stream);
    let blended = mirror.lerp(diffuse, roughness);
    if blended.length() < 1e-6 {
        diffuse
    } else {
        blended.normalized()
    }
}
