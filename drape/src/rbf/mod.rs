pub mod bridge;
pub mod data;
pub mod field;

pub use bridge::*;
pub use data::*;
pub use field::*;

use crate::error::{BakeError, Result};
use crate::math::*;

/// Every field one bake needs, already converted into the mesh convention.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSet {
    pub primary: RbfField,
    pub shape_keys: Vec<ShapeKeyFieldGroup>,
}

impl FieldSet {
    pub fn new(primary: RbfField, shape_keys: Vec<ShapeKeyFieldGroup>) -> Self {
        Self { primary, shape_keys }
    }

    /// Validates and converts parsed data. Any malformed field aborts: nothing after it would be meaningful.
    pub fn from_data(data: &RbfData, bridge: &CoordinateBridge) -> Result<Self> {
        let primary =
            RbfField::from_rows("primary", data.epsilon, &data.centers, &data.weights, &data.poly_weights)?;

        let mut steps = Vec::with_capacity(data.shape_keys().len());
        for key in data.shape_keys() {
            let field = RbfField::from_rows(&key.name, key.epsilon, &key.centers, &key.weights, &key.poly_weights)?;
            let bounds = match (key.bounds_min, key.bounds_max) {
                (Some(min), Some(max)) => Some(AABB::from_points(&[Vec3::from(min), Vec3::from(max)])),
                (None, None) => None,
                _ => return Err(BakeError::malformed(&key.name, "bounds_min and bounds_max must be given together")),
            };
            let authored = BoundedField::new(field, bounds);
            steps.push((
                key.name.clone(),
                ShapeKeyStep { weight: key.effective_weight(), field: bridge.convert_bounded(&authored) },
            ));
        }

        Ok(Self { primary: bridge.convert_field(&primary), shape_keys: group_shape_keys(steps) })
    }

    /// Total number of shape-key steps across groups.
    pub fn shape_key_steps(&self) -> usize {
        self.shape_keys.iter().map(|g| g.steps.len()).sum()
    }
}
