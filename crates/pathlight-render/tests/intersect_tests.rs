use pathlight_render::geometry::{OrientedBox, Primitive, Sphere};
use pathlight_render::intersect::{closest_hit, intersect_box, intersect_sphere, normal_at};
use pathlight_render::material::Material;
use pathlight_render::math::{Mat3, Ray, Vec3};
use pathlight_render::scene::Scene;

#[test]
fn sphere_hit_distance_is_center_distance_minus_radius() {
    for &(d, r) in &[(5.0f32, 1.0f32), (10.0, 2.5), (3.0, 2.999)] {
        let sphere = Sphere::new(Vec3::zero(), r, Material::black());
        let ray = Ray::new(Vec3::new(0.0, 0.0, -d), Vec3::new(0.0, 0.0, 1.0));
        let t = intersect_sphere(&ray, &sphere).unwrap();
        assert!((t - (d - r)).abs() < 1e-4, "d={d} r={r} t={t}");
    }
}

#[test]
fn sphere_miss_when_ray_passes_by() {
    let sphere = Sphere::new(Vec3::zero(), 1.0, Material::black());
    let beside = Ray::new(Vec3::new(1.5, 0.0, -5.0), Vec3::new(0.0, 0.0, 1.0));
    let away = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::new(0.0, 0.0, -1.0));
    assert!(intersect_sphere(&beside, &sphere).is_none());
    assert!(intersect_sphere(&away, &sphere).is_none());
}

#[test]
fn unit_box_front_face_hit() {
    let cuboid = OrientedBox::axis_aligned(Vec3::zero(), Vec3::one(), Material::black());
    let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::new(0.0, 0.0, 1.0));

    let t = intersect_box(&ray, &cuboid).unwrap();
    assert!((t - 4.0).abs() < 1e-5);

    let normal = normal_at(ray.at(t), Primitive::Box(&cuboid));
    assert!((normal - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-6);
}

#[test]
fn closest_hit_reports_nearest_primitive() {
    let near = Material::surface(Vec3::new(1.0, 0.0, 0.0), 0.0);
    let far = Material::surface(Vec3::new(0.0, 0.0, 1.0), 0.0);
    let scene = Scene::new(
        vec![Sphere::new(Vec3::new(0.0, 0.0, 10.0), 1.0, far)],
        vec![OrientedBox::axis_aligned(Vec3::new(0.0, 0.0, 4.0), Vec3::one(), near)],
    )
    .unwrap();

    let ray = Ray::new(Vec3::zero(), Vec3::new(0.0, 0.0, 1.0));
    let hit = closest_hit(&ray, &scene).unwrap();
    assert!((hit.t - 3.0).abs() < 1e-5);
    assert_eq!(hit.material, near);
    assert!((hit.normal - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-6);
    assert!((hit.point - Vec3::new(0.0, 0.0, 3.0)).length() < 1e-5);
}

#[test]
fn rotated_box_hits_lie_on_surface() {
    let mut rng = TestRng::new(1);

    for _ in 0..32 {
        let rotation = Mat3::rotation_y(rng.range(0.0, 6.28));
        let cuboid = OrientedBox::new(
            Vec3::new(rng.range(-2.0, 2.0), rng.range(-2.0, 2.0), rng.range(-2.0, 2.0)),
            Vec3::new(rng.range(0.3, 2.0), rng.range(0.3, 2.0), rng.range(0.3, 2.0)),
            rotation,
            Material::black(),
        );

        for _ in 0..64 {
            let origin = Vec3::new(rng.range(-8.0, 8.0), rng.range(-8.0, 8.0), 12.0);
            let target = cuboid.center
                + Vec3::new(rng.range(-1.0, 1.0), rng.range(-1.0, 1.0), rng.range(-1.0, 1.0));
            let ray = Ray::new(origin, target - origin);

            let Some(t) = intersect_box(&ray, &cuboid) else {
                continue;
            };
            let point = ray.at(t);
            let local = cuboid.to_local(point).div_elem(cuboid.half_extents).abs();
            assert!((local.max_component() - 1.0).abs() < 1e-3, "{local:?}");

            let normal = normal_at(point, Primitive::Box(&cuboid));
            assert!((normal.length() - 1.0).abs() < 1e-5);
            // Entering from outside means the ray opposes the face normal.
            assert!(normal.dot(ray.direction) <= 1e-5);
        }
    }
}

#[test]
fn sphere_normals_are_unit_and_outward() {
    let mut rng = TestRng::new(7);
    let sphere = Sphere::new(Vec3::new(1.0, -2.0, 0.5), 1.7, Material::black());

    for _ in 0..256 {
        let origin = Vec3::new(rng.range(-8.0, 8.0), rng.range(-8.0, 8.0), rng.range(6.0, 9.0));
        let direction = (sphere.center - origin
            + Vec3::new(rng.range(-1.0, 1.0), rng.range(-1.0, 1.0), rng.range(-1.0, 1.0)))
        .normalized();
        let ray = Ray::new(origin, direction);

        if let Some(t) = intersect_sphere(&ray, &sphere) {
            let point = ray.at(t);
            assert!(((point - sphere.center).length() - sphere.radius).abs() < 1e-3);
            let normal = normal_at(point, Primitive::Sphere(&sphere));
            assert!((normal.length() - 1.0).abs() < 1e-5);
            assert!(normal.dot(ray.direction) <= 1e-5);
        }
    }
}

#[test]
fn camera_ray_through_cornell_box_hits_back_wall() {
    let scene = Scene::cornell_box().unwrap();
    let ray = Ray::new(Vec3::new(1.0, 0.5, 25.0), Vec3::new(0.0, 0.0, -1.0));
    let hit = closest_hit(&ray, &scene).unwrap();
    assert!((hit.point.z + 5.0).abs() < 1e-3, "{:?}", hit.point);
    assert!((hit.normal - Vec3::new(0.0, 0.0, 1.0)).length() < 1e-5);
}

struct TestRng {
    state: u64,
}

impl TestRng {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u32(&mut self) -> u32 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1);
        (self.state >> 32) as u32
    }

    fn next_f32(&mut self) -> f32 {
        self.next_u32() as f32 / u32::MAX as f32
    }

    fn range(&mut self, min: f32, max: f32) -> f32 {
        min + (max - min) * self.next_f32()
    }
}
