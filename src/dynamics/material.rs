//! Surface materials and coefficient mixing.

use serde::{Deserialize, Serialize};

use crate::core::fixed::FixedScalar;

/// Friction and bounce coefficients of a body's surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Material {
    /// Friction while the contact is sticking
    pub static_friction: FixedScalar,
    /// Friction while the contact is sliding
    pub kinetic_friction: FixedScalar,
    /// Fraction of closing speed returned as separation speed
    pub restitution: FixedScalar,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            static_friction: FixedScalar::from_ratio(6, 10),
            kinetic_friction: FixedScalar::from_ratio(3, 10),
            restitution: FixedScalar::ZERO,
        }
    }
}

impl Material {
    /// Material with the given coefficients.
    pub const fn new(
        static_friction: FixedScalar,
        kinetic_friction: FixedScalar,
        restitution: FixedScalar,
    ) -> Self {
        Self {
            static_friction,
            kinetic_friction,
            restitution,
        }
    }
}

/// How the coefficients of two touching materials combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MaterialCoefficientMixing {
    /// Larger of the two
    TakeMaximum,
    /// Smaller of the two
    TakeMinimum,
    /// Arithmetic mean
    #[default]
    UseAverage,
}

impl MaterialCoefficientMixing {
    /// Combine a single coefficient.
    #[inline]
    pub fn mix(self, a: FixedScalar, b: FixedScalar) -> FixedScalar {
        match self {
            Self::TakeMaximum => a.max(b),
            Self::TakeMinimum => a.min(b),
            Self::UseAverage => (a + b) * FixedScalar::HALF,
        }
    }

    /// Combine every coefficient of two materials.
    pub fn mix_materials(self, a: &Material, b: &Material) -> Material {
        Material {
            static_friction: self.mix(a.static_friction, b.static_friction),
            kinetic_friction: self.mix(a.kinetic_friction, b.kinetic_friction),
            restitution: self.mix(a.restitution, b.restitution),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
