use crate::error::{PrimitiveKind, SceneError};
use crate::geometry::{OrientedBox, Primitive, Sphere};
use crate::material::Material;
use crate::math::{Mat3, Vec3};
use pathlight_model::{BoxRecord, MaterialRecord, SceneFile, SphereRecord};
use std::f32::consts::FRAC_PI_4;

/// Allowed drift of a box rotation from orthonormal.
pub const ORTHONORMAL_TOLERANCE: f32 = 1e-3;

/// Immutable set of primitives, scanned spheres first, then boxes.
#[derive(Debug, Clone)]
pub struct Scene {
    spheres: Vec<Sphere>,
    boxes: Vec<OrientedBox>,
}

impl Scene {
    pub fn new(spheres: Vec<Sphere>, boxes: Vec<OrientedBox>) -> Result<Self, SceneError> {
        for (index, sphere) in spheres.iter().enumerate() {
            // Written as a negation so NaN is rejected too.
            if !(sphere.radius > 0.0) {
                return Err(SceneError::NonPositiveRadius {
                    index,
                    radius: sphere.radius,
                });
            }
            check_material(PrimitiveKind::Sphere, index, &sphere.material)?;
        }

        for (index, cuboid) in boxes.iter().enumerate() {
            let h = cuboid.half_extents;
            if !(h.x > 0.0 && h.y > 0.0 && h.z > 0.0) {
                return Err(SceneError::NonPositiveHalfExtent {
                    index,
                    half_extents: h,
                });
            }
            if !cuboid.rotation.is_orthonormal(ORTHONORMAL_TOLERANCE) {
                return Err(SceneError::NonOrthonormalRotation { index });
            }
            check_material(PrimitiveKind::Box, index, &cuboid.material)?;
        }

        Ok(Self { spheres, boxes })
    }

    pub fn spheres(&self) -> &[Sphere] {
        &self.spheres
    }

    pub fn boxes(&self) -> &[OrientedBox] {
        &self.boxes
    }

    /// All primitives in scan order.
    pub fn primitives(&self) -> impl Iterator<Item = Primitive<'_>> {
        self.spheres
            .iter()
            .map(Primitive::Sphere)
            .chain(self.boxes.iter().map(Primitive::Box))
    }

    pub fn len(&self) -> usize {
        self.spheres.len() + self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cornell-style enclosure lit by an emissive ceiling panel, with three
    /// spheres and two blocks yawed by 45 degrees.
    pub fn cornell_box() -> Result<Self, SceneError> {
        let white = Vec3::one();
        let wall = Vec3::new(5.0, 0.5, 5.0);

        // Side walls stand the slab on its edge: local x becomes world y.
        let side = Mat3::from_cols(
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(-1.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
        );
        let back = Mat3::from_cols(
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(0.0, 1.0, 0.0),
        );
        let yawed = Mat3::rotation_y(-FRAC_PI_4);

        let spheres = vec![
            Sphere::new(
                Vec3::new(2.5, 1.5, -1.5),
                1.5,
                Material::surface(Vec3::new(1.0, 0.0, 0.0), 1.0),
            ),
            Sphere::new(
                Vec3::new(-2.5, 2.5, -1.0),
                1.0,
                Material::surface(Vec3::new(1.0, 0.4, 0.0), 0.8),
            ),
            Sphere::new(
                Vec3::new(0.5, -4.0, 3.0),
                1.0,
                Material::surface(white, 1.0).with_opacity(0.8),
            ),
        ];

        let boxes = vec![
            // ceiling
            OrientedBox::axis_aligned(Vec3::new(0.0, 5.5, 0.0), wall, Material::surface(white, 0.0)),
            // floor
            OrientedBox::axis_aligned(Vec3::new(0.0, -5.5, 0.0), wall, Material::surface(white, 0.3)),
            OrientedBox::new(
                Vec3::new(5.5, 0.0, 0.0),
                wall,
                side,
                Material::surface(Vec3::new(0.0, 1.0, 0.0), 0.0),
            ),
            OrientedBox::new(
                Vec3::new(-5.5, 0.0, 0.0),
                wall,
                side,
                Material::surface(Vec3::new(1.0, 0.0, 0.0), 0.0),
            ),
            OrientedBox::new(Vec3::new(0.0, 0.0, -5.5), wall, back, Material::surface(white, 0.0)),
            // light panel, just below the ceiling
            OrientedBox::axis_aligned(
                Vec3::new(0.0, 4.8, 0.0),
                Vec3::new(2.5, 0.2, 2.5),
                Material::emitter(Vec3::splat(6.0)),
            ),
            OrientedBox::new(
                Vec3::new(-2.0, -2.0, 0.0),
                Vec3::new(1.5, 3.0, 1.5),
                yawed,
                Material::surface(white, 0.0),
            ),
            OrientedBox::new(
                Vec3::new(2.5, -3.5, 0.0),
                Vec3::new(1.0, 1.5, 1.0),
                yawed,
                Material::surface(white, 0.0),
            ),
        ];

        Self::new(spheres, boxes)
    }

    pub fn describe(&self) -> SceneFile {
        SceneFile {
            version: 1,
            spheres: self
                .spheres
                .iter()
                .map(|sphere| SphereRecord {
                    center: sphere.center.to_array(),
                    radius: sphere.radius,
                    material: material_record(&sphere.material),
                })
                .collect(),
            boxes: self
                .boxes
                .iter()
                .map(|cuboid| BoxRecord {
                    center: cuboid.center.to_array(),
                    half_extents: cuboid.half_extents.to_array(),
                    rotation: cuboid.rotation.to_cols_array(),
                    material: material_record(&cuboid.material),
                })
                .collect(),
        }
    }
}

fn check_material(kind: PrimitiveKind, index: usize, material: &Material) -> Result<(), SceneError> {
    match material.check() {
        Some(reason) => Err(SceneError::InvalidMaterial {
            kind,
            index,
            reason,
        }),
        None => Ok(()),
    }
}

fn material_record(material: &Material) -> MaterialRecord {
    MaterialRecord {
        emittance: material.emittance.to_array(),
        reflectance: material.reflectance.to_array(),
        roughness: material.roughness,
        opacity: material.opacity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grey() -> Material {
        Material::surface(Vec3::splat(0.5), 0.5)
    }

    #[test]
    fn cornell_box_is_valid() {
        let scene = Scene::cornell_box().unwrap();
        assert_eq!(scene.spheres().len(), 3);
        assert_eq!(scene.boxes().len(), 8);

        let emitters = scene
            .primitives()
            .filter(|p| p.material().emittance.max_component() > 0.0)
            .count();
        assert_eq!(emitters, 1);
    }

    #[test]
    fn rejects_zero_radius() {
        let err = Scene::new(vec![Sphere::new(Vec3::zero(), 0.0, grey())], vec![]).unwrap_err();
        assert_eq!(err, SceneError::NonPositiveRadius { index: 0, radius: 0.0 });
    }

    #[test]
    fn rejects_nan_radius() {
        let result = Scene::new(vec![Sphere::new(Vec3::zero(), f32::NAN, grey())], vec![]);
        assert!(matches!(result, Err(SceneError::NonPositiveRadius { index: 0, .. })));
    }

    #[test]
    fn rejects_negative_half_extent() {
        let boxes = vec![
            OrientedBox::axis_aligned(Vec3::zero(), Vec3::one(), grey()),
            OrientedBox::axis_aligned(Vec3::zero(), Vec3::new(1.0, -1.0, 1.0), grey()),
        ];
        let result = Scene::new(vec![], boxes);
        assert!(matches!(result, Err(SceneError::NonPositiveHalfExtent { index: 1, .. })));
    }

    #[test]
    fn rejects_sheared_rotation() {
        let rotation = Mat3::from_cols(
            Vec3::new(0.7, 0.0, -0.7),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.7, 0.0, 0.7),
        );
        let boxes = vec![OrientedBox::new(Vec3::zero(), Vec3::one(), rotation, grey())];
        let err = Scene::new(vec![], boxes).unwrap_err();
        assert_eq!(err, SceneError::NonOrthonormalRotation { index: 0 });
    }

    #[test]
    fn rejects_negative_emittance() {
        let material = Material::emitter(Vec3::new(1.0, -1.0, 1.0));
        let result = Scene::new(vec![Sphere::new(Vec3::zero(), 1.0, material)], vec![]);
        assert!(matches!(
            result,
            Err(SceneError::InvalidMaterial {
                kind: PrimitiveKind::Sphere,
                index: 0,
                ..
            })
        ));
    }

    #[test]
    fn describe_keeps_scan_order() {
        let scene = Scene::cornell_box().unwrap();
        let file = scene.describe();
        assert_eq!(file.spheres.len(), 3);
        assert_eq!(file.boxes.len(), 8);
        assert_eq!(file.spheres[0].radius, 1.5);
        assert_eq!(file.boxes[5].material.emittance, [6.0, 6.0, 6.0]);
    }
}
