use crate::error::{BakeError, Result};
use crate::math::*;

/// A scalar-kernel displacement field: multiquadric radial terms plus a linear polynomial.
///
/// `disp(p) = sum_j weights[j] * sqrt(|p - centers[j]|^2 + epsilon^2) + poly[0] + poly[1]*p.x + poly[2]*p.y + poly[3]*p.z`
#[derive(Debug, Clone, PartialEq)]
pub struct RbfField {
    pub(crate) epsilon: f64,
    pub(crate) centers: Vec<Vec3>,
    pub(crate) weights: Vec<Vec3>,
    pub(crate) poly: [Vec3; 4],
}

impl RbfField {
    pub fn new(epsilon: f64, centers: Vec<Vec3>, weights: Vec<Vec3>, poly: [Vec3; 4]) -> Result<Self> {
        Self::named("field", epsilon, centers, weights, poly)
    }

    /// Same as [`RbfField::new`], with `name` used in diagnostics.
    pub fn named(name: &str, epsilon: f64, centers: Vec<Vec3>, weights: Vec<Vec3>, poly: [Vec3; 4]) -> Result<Self> {
        if weights.len() != centers.len() {
            return Err(BakeError::malformed(
                name,
                format!("{} weights for {} centers", weights.len(), centers.len()),
            ));
        }
        if !epsilon.is_finite() {
            return Err(BakeError::malformed(name, format!("epsilon {} is not finite", epsilon)));
        }
        let all_finite = centers.iter().chain(weights.iter()).chain(poly.iter()).all(|v| v.is_finite());
        if !all_finite {
            return Err(BakeError::malformed(name, "non-finite center, weight or polynomial coefficient"));
        }
        Ok(Self { epsilon, centers, weights, poly })
    }

    /// Builds a field from raw rows, checking that `poly_weights` has exactly 4 rows.
    pub fn from_rows(
        name: &str,
        epsilon: f64,
        centers: &[[f64; 3]],
        weights: &[[f64; 3]],
        poly_weights: &[[f64; 3]],
    ) -> Result<Self> {
        let poly: [[f64; 3]; 4] = poly_weights.try_into().map_err(|_| {
            BakeError::malformed(name, format!("expected 4 polynomial rows, got {}", poly_weights.len()))
        })?;
        Self::named(
            name,
            epsilon,
            centers.iter().copied().map(Vec3::from).collect(),
            weights.iter().copied().map(Vec3::from).collect(),
            poly.map(Vec3::from),
        )
    }

    /// The field that never moves anything.
    pub fn identity() -> Self {
        Self { epsilon: 0.0, centers: Vec::new(), weights: Vec::new(), poly: [Vec3::ZERO; 4] }
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn centers(&self) -> &[Vec3] {
        &self.centers
    }

    pub fn weights(&self) -> &[Vec3] {
        &self.weights
    }

    pub fn poly(&self) -> &[Vec3; 4] {
        &self.poly
    }

    pub fn len(&self) -> usize {
        self.centers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.centers.is_empty()
    }

    pub fn evaluate(&self, p: Vec3) -> Vec3 {
        let eps2 = self.epsilon * self.epsilon;
        let mut disp = Vec3::ZERO;
        for (&c, &w) in self.centers.iter().zip(&self.weights) {
            let r2 = (p - c).length_squared();
            disp += w * (r2 + eps2).sqrt();
        }
        disp + self.poly[0] + self.poly[1] * p.x + self.poly[2] * p.y + self.poly[3] * p.z
    }
}

/// An [`RbfField`] that only acts inside an optional world-space box.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundedField {
    pub field: RbfField,
    pub bounds: Option<AABB>,
}

impl BoundedField {
    pub fn new(field: RbfField, bounds: Option<AABB>) -> Self {
        Self { field, bounds }
    }

    pub fn unbounded(field: RbfField) -> Self {
        Self { field, bounds: None }
    }

    pub fn evaluate(&self, p: Vec3) -> Vec3 {
        match &self.bounds {
            Some(bounds) if !bounds.contains(p) => Vec3::ZERO,
            _ => self.field.evaluate(p),
        }
    }
}

/// Anything that maps a world-space point to a displacement. Must be shareable across workers.
pub trait DisplacementField: Sync {
    fn displacement(&self, p: Vec3) -> Vec3;
}

impl DisplacementField for RbfField {
    fn displacement(&self, p: Vec3) -> Vec3 {
        self.evaluate(p)
    }
}

impl DisplacementField for BoundedField {
    fn displacement(&self, p: Vec3) -> Vec3 {
        self.evaluate(p)
    }
}

/// One step of a progressive shape key.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeKeyStep {
    pub weight: f64,
    pub field: BoundedField,
}

/// Steps of one morph target, ascending by weight. Applied as a chain.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeKeyFieldGroup {
    pub name: String,
    pub steps: Vec<ShapeKeyStep>,
}

/// Groups steps by name, keeping the order in which names first appear.
/// Steps inside a group are sorted ascending by weight; equal weights keep input order.
pub fn group_shape_keys<I>(steps: I) -> Vec<ShapeKeyFieldGroup>
where
    I: IntoIterator<Item = (String, ShapeKeyStep)>,
{
    let mut groups: Vec<ShapeKeyFieldGroup> = Vec::new();
    for (name, step) in steps {
        match groups.iter_mut().find(|g| g.name == name) {
            Some(group) => group.steps.push(step),
            None => groups.push(ShapeKeyFieldGroup { name, steps: vec![step] }),
        }
    }
    for group in &mut groups {
        group.steps.sort_by(|a, b| a.weight.total_cmp(&b.weight));
    }
    groups
}
