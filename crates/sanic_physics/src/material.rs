//! Surface properties for collision response

/// Friction and elasticity of a shape's surface
///
/// Both coefficients combine multiplicatively when two shapes touch. Friction
/// may be `f32::INFINITY` for surfaces that must never slide (wheels).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhysicsMaterial {
    pub friction: f32,
    pub elasticity: f32,
}

impl Default for PhysicsMaterial {
    fn default() -> Self {
        Self {
            friction: 0.0,
            elasticity: 0.0,
        }
    }
}

impl PhysicsMaterial {
    /// Infinite grip, no bounce
    pub const GRIP: Self = Self {
        friction: f32::INFINITY,
        elasticity: 0.0,
    };

    /// Solid footing, no bounce
    pub const SOLID: Self = Self {
        friction: 1.0,
        elasticity: 0.0,
    };

    pub fn new(friction: f32, elasticity: f32) -> Self {
        Self {
            friction: friction.max(0.0),
            elasticity: elasticity.max(0.0),
        }
    }

    /// Combine two materials for a contact
    pub fn combine(&self, other: &Self) -> Self {
        Self {
            friction: combine_coefficient(self.friction, other.friction),
            elasticity: combine_coefficient(self.elasticity, other.elasticity),
        }
    }
}

// inf * 0 must not turn into NaN
fn combine_coefficient(a: f32, b: f32) -> f32 {
    if a == 0.0 || b == 0.0 {
        0.0
    } else {
        a * b
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_material() {
        let material = PhysicsMaterial::default();
        assert_eq!(material.friction, 0.0);
        assert_eq!(material.elasticity, 0.0);
    }

    #[test]
    fn test_new_rejects_negative() {
        let material = PhysicsMaterial::new(-1.0, -0.5);
        assert_eq!(material.friction, 0.0);
        assert_eq!(material.elasticity, 0.0);
    }

    #[test]
    fn test_combine_is_multiplicative() {
        let a = PhysicsMaterial::new(0.5, 0.5);
        let b = PhysicsMaterial::new(0.6, 0.2);
        let combined = a.combine(&b);
        assert!((combined.friction - 0.3).abs() < 1e-6);
        assert!((combined.elasticity - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_grip_combines_without_nan() {
        let combined = PhysicsMaterial::GRIP.combine(&PhysicsMaterial::default());
        assert_eq!(combined.friction, 0.0);

        let combined = PhysicsMaterial::GRIP.combine(&PhysicsMaterial::SOLID);
        assert!(combined.friction.is_infinite());
    }
}
