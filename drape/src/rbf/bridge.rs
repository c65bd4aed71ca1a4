//! Conversion of field data from the authoring convention into the mesh convention.
//!
//! A bridge is an orthonormal basis `C` taking authoring coordinates to target
//! coordinates. Centers, weights and the polynomial bias map through `C`. The
//! linear polynomial coefficients must also account for the *input* point now
//! arriving in the target convention, so with `P = [Cx Cy Cz]` (columns) the
//! target coefficients are the columns of `C * P * C^-1`. That keeps
//! `Poly_target(C p) == C Poly_authoring(p)` for every `p`.

use crate::config::BridgePreset;
use crate::error::{BakeError, Result};
use crate::math::*;
use crate::rbf::{BoundedField, RbfField};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateBridge {
    basis: Mat33,
    inverse: Mat33,
}

impl CoordinateBridge {
    /// Accepts any orthonormal basis (rotation or reflection). Other bases would not
    /// preserve kernel distances and are rejected.
    pub fn from_basis(basis: Mat33) -> Result<Self> {
        let gram = basis.transpose() * basis;
        let identity = Mat33::identity();
        let orthonormal = gram.0.iter().zip(identity.0.iter()).all(|(a, b)| (a - b).abs() < 1e-9);
        if !orthonormal {
            return Err(BakeError::malformed("bridge", "coordinate basis is not orthonormal"));
        }
        Ok(Self { basis, inverse: basis.transpose() })
    }

    /// `(x, y, z) -> (-x, z, -y)`: right-handed Z-up to left-handed Y-up.
    pub fn blender_to_unity() -> Self {
        Self::signed_permutation(Mat33([
            -1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, //
            0.0, -1.0, 0.0,
        ]))
    }

    /// `(x, y, z) -> (x, z, y)`.
    pub fn swap_yz() -> Self {
        Self::signed_permutation(Mat33([
            1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, //
            0.0, 1.0, 0.0,
        ]))
    }

    pub fn identity() -> Self {
        Self::signed_permutation(Mat33::identity())
    }

    pub fn from_preset(preset: BridgePreset) -> Self {
        match preset {
            BridgePreset::BlenderToUnity => Self::blender_to_unity(),
            BridgePreset::SwapYz => Self::swap_yz(),
            BridgePreset::Identity => Self::identity(),
        }
    }

    fn signed_permutation(basis: Mat33) -> Self {
        Self { basis, inverse: basis.transpose() }
    }

    pub fn basis(&self) -> Mat33 {
        self.basis
    }

    /// Authoring point or vector to target convention.
    pub fn convert(&self, v: Vec3) -> Vec3 {
        self.basis * v
    }

    /// Target point or vector back to the authoring convention.
    pub fn convert_back(&self, v: Vec3) -> Vec3 {
        self.inverse * v
    }

    pub fn convert_poly(&self, poly: &[Vec3; 4]) -> [Vec3; 4] {
        let bias = self.convert(poly[0]);
        let linear = Mat33::from_columns(poly[1], poly[2], poly[3]);
        let remapped = self.basis * linear * self.inverse;
        [bias, remapped.column(0), remapped.column(1), remapped.column(2)]
    }

    /// Converts every corner, then takes the envelope: sign flips can swap which corner is the minimum.
    pub fn convert_bounds(&self, bounds: &AABB) -> AABB {
        let corners = bounds.corners().map(|c| self.convert(c));
        AABB::from_points(&corners)
    }

    pub fn convert_field(&self, field: &RbfField) -> RbfField {
        RbfField {
            epsilon: field.epsilon,
            centers: field.centers.iter().map(|&c| self.convert(c)).collect(),
            weights: field.weights.iter().map(|&w| self.convert(w)).collect(),
            poly: self.convert_poly(&field.poly),
        }
    }

    pub fn convert_bounded(&self, field: &BoundedField) -> BoundedField {
        BoundedField {
            field: self.convert_field(&field.field),
            bounds: field.bounds.as_ref().map(|b| self.convert_bounds(b)),
        }
    }
}

impl Default for CoordinateBridge {
    fn default() -> Self {
        Self::blender_to_unity()
    }
}
