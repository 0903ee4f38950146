//! Ray/primitive tests over a [`Scene`].
//!
//! Every function here is a pure function of its inputs. The closest-hit
//! query is a linear scan: spheres first, then boxes, keeping the smallest
//! positive distance. At exactly equal distances the primitive scanned
//! first wins; that is an ordering artefact, not a geometric rule.

use crate::geometry::{Hit, OrientedBox, Primitive, Sphere};
use crate::math::{Ray, Vec3};
use crate::scene::Scene;

/// Hits farther than this count as misses.
pub const FAR_DISTANCE: f32 = 1.0e6;

/// Distance to the near intersection, or `None` when the ray misses or the
/// near root is behind the origin. A ray starting inside the sphere misses.
pub fn intersect_sphere(ray: &Ray, sphere: &Sphere) -> Option<f32> {
    let oc = ray.origin - sphere.center;
    let b = oc.dot(ray.direction);
    let c = oc.dot(oc) - sphere.radius * sphere.radius;
    let h = b * b - c;
    if h < 0.0 {
        return None;
    }

    let t = -b - h.sqrt();
    (t > 0.0).then_some(t)
}

/// Slab test in the box's local frame.
///
/// Zero direction components are not special-cased: the reciprocal becomes
/// a signed infinity and the per-axis interval collapses to `(-inf, inf)`
/// inside the slab or to an empty one outside it. Near/far planes are
/// picked from the reciprocal's sign bit so `-0.0` orders like `+0.0`.
pub fn intersect_box(ray: &Ray, cuboid: &OrientedBox) -> Option<f32> {
    let ro = cuboid.to_local(ray.origin);
    let rd = cuboid.rotation.transpose_mul_vec(ray.direction);
    slab(ro, rd, cuboid.half_extents)
}

fn slab(ro: Vec3, rd: Vec3, half_extents: Vec3) -> Option<f32> {
    let m = rd.recip();
    let s = m.map(|v| if v.is_sign_negative() { 1.0 } else { -1.0 });
    let k = s.mul_elem(half_extents);
    let t1 = m.mul_elem(-ro + k);
    let t2 = m.mul_elem(-ro - k);

    let t_near = t1.max_component();
    let t_far = t2.min_component();
    if t_near > t_far || t_far < 0.0 {
        return None;
    }

    Some(if t_near > 0.0 { t_near } else { t_far })
}

/// Outward unit normal at a point on the primitive's surface.
pub fn normal_at(point: Vec3, primitive: Primitive<'_>) -> Vec3 {
    match primitive {
        Primitive::Sphere(sphere) => (point - sphere.center).normalized(),
        Primitive::Box(cuboid) => box_normal(point, cuboid),
    }
}

fn box_normal(point: Vec3, cuboid: &OrientedBox) -> Vec3 {
    let local = cuboid.to_local(point);
    let scaled = local.div_elem(cuboid.half_extents).abs();
    let max = scaled.max_component();
    let [x, y, z] = cuboid.rotation.cols;

    if scaled.x == max {
        x * local.x.signum()
    } else if scaled.y == max {
        y * local.y.signum()
    } else {
        z * local.z.signum()
    }
}

pub fn intersect(ray: &Ray, primitive: Primitive<'_>) -> Option<f32> {
    match primitive {
        Primitive::Sphere(sphere) => intersect_sphere(ray, sphere),
        Primitive::Box(cuboid) => intersect_box(ray, cuboid),
    }
}

pub fn closest_hit(ray: &Ray, scene: &Scene) -> Option<Hit> {
    let mut closest_t = FAR_DISTANCE;
    let mut closest = None;

    for primitive in scene.primitives() {
        if let Some(t) = intersect(ray, primitive) {
            if t > 0.0 && t < closest_t {
                closest_t = t;
                closest = Some(primitive);
            }
        }
    }

    let primitive = closest?;
    let point = ray.at(closest_t);
    Some(Hit {
        t: closest_t,
        point,
        normal: normal_at(point, primitive),
        material: *primitive.material(),
    })
}
