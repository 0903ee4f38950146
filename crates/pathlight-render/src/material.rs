use crate::math::Vec3;

/// Surface response of a primitive.
///
/// `opacity` is carried through the scene description but the bounce logic
/// does not read it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub emittance: Vec3,
    pub reflectance: Vec3,
    pub roughness: f32,
    pub opacity: f32,
}

impl Material {
    pub const fn new(emittance: Vec3, reflectance: Vec3, roughness: f32, opacity: f32) -> Self {
        Self {
            emittance,
            reflectance,
            roughness,
            opacity,
        }
    }

    /// Non-emissive surface with the given reflectance and roughness.
    pub const fn surface(reflectance: Vec3, roughness: f32) -> Self {
        Self::new(Vec3::zero(), reflectance, roughness, 0.0)
    }

    pub const fn emitter(emittance: Vec3) -> Self {
        Self::new(emittance, Vec3::one(), 0.0, 0.0)
    }

    /// Absorbs everything and emits nothing.
    pub const fn black() -> Self {
        Self::new(Vec3::zero(), Vec3::zero(), 0.0, 0.0)
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    /// Reason the material is out of range, if it is.
    pub fn check(&self) -> Option<&'static str> {
        let unit = |v: f32| (0.0..=1.0).contains(&v);

        if !self.emittance.is_finite() || self.emittance.min_component() < 0.0 {
            Some("emittance must be finite and non-negative")
        } else if !(unit(self.reflectance.x) && unit(self.reflectance.y) && unit(self.reflectance.z)) {
            Some("reflectance components must lie in [0, 1]")
        } else if !unit(self.roughness) {
            Some("roughness must lie in [0, 1]")
        } else if !unit(self.opacity) {
            Some("opacity must lie in [0, 1]")
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_accepts_reference_ranges() {
        assert_eq!(Material::emitter(Vec3::splat(6.0)).check(), None);
        assert_eq!(Material::surface(Vec3::new(1.0, 0.4, 0.0), 0.8).check(), None);
    }

    #[test]
    fn check_rejects_amplifying_reflectance() {
        let material = Material::surface(Vec3::new(1.2, 0.5, 0.5), 0.0);
        assert!(material.check().is_some());
    }

    #[test]
    fn check_rejects_nan_roughness() {
        let material = Material::surface(Vec3::one(), f32::NAN);
        assert!(material.check().is_some());
    }
}
