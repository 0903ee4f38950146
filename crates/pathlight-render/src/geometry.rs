use crate::material::Material;
use crate::math::{Mat3, Vec3};

#[derive(Debug, Clone, Copy)]
pub struct Hit {
    pub t: f32,
    pub point: Vec3,
    pub normal: Vec3,
    pub material: Material,
}

#[derive(Debug, Clone)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f32,
    pub material: Material,
}

impl Sphere {
    pub fn new(center: Vec3, radius: f32, material: Material) -> Self {
        Self {
            center,
            radius,
            material,
        }
    }
}

/// Box with arbitrary orientation. `rotation` maps local axes to world.
#[derive(Debug, Clone)]
pub struct OrientedBox {
    pub center: Vec3,
    pub half_extents: Vec3,
    pub rotation: Mat3,
    pub material: Material,
}

impl OrientedBox {
    pub fn new(center: Vec3, half_extents: Vec3, rotation: Mat3, material: Material) -> Self {
        Self {
            center,
            half_extents,
            rotation,
            material,
        }
    }

    pub fn axis_aligned(center: Vec3, half_extents: Vec3, material: Material) -> Self {
        Self::new(center, half_extents, Mat3::identity(), material)
    }

    pub fn to_local(&self, point: Vec3) -> Vec3 {
        self.rotation.transpose_mul_vec(point - self.center)
    }
}

/// Borrowed view of any scene primitive.
#[derive(Debug, Clone, Copy)]
pub enum Primitive<'a> {
    Sphere(&'a Sphere),
    Box(&'a OrientedBox),
}

impl<'a> Primitive<'a> {
    pub fn material(&self) -> &'a Material {
        match self {
            Primitive::Sphere(sphere) => &sphere.material,
            Primitive::Box(cuboid) => &cuboid.material,
        }
    }
}
