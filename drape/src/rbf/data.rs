//! Pre-parsed field data as produced by the upstream fitting tool.
//!
//! Everything here is still in the authoring convention; see
//! [`FieldSet::from_data`](super::FieldSet::from_data) for conversion.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Weight assumed for shape keys whose stored weight is zero, negative or missing.
pub const DEFAULT_SHAPE_KEY_WEIGHT: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RbfData {
    pub epsilon: f64,
    pub centers: Vec<[f64; 3]>,
    pub weights: Vec<[f64; 3]>,
    /// Bias row followed by the x, y and z coefficient rows.
    pub poly_weights: Vec<[f64; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape_keys: Option<Vec<ShapeKeyData>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeKeyData {
    pub name: String,
    #[serde(default)]
    pub weight: f64,
    pub epsilon: f64,
    pub centers: Vec<[f64; 3]>,
    pub weights: Vec<[f64; 3]>,
    pub poly_weights: Vec<[f64; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds_min: Option<[f64; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds_max: Option<[f64; 3]>,
}

impl RbfData {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn shape_keys(&self) -> &[ShapeKeyData] {
        self.shape_keys.as_deref().unwrap_or(&[])
    }
}

impl ShapeKeyData {
    pub fn effective_weight(&self) -> f64 {
        if self.weight.is_finite() && self.weight > 0.0 { self.weight } else { DEFAULT_SHAPE_KEY_WEIGHT }
    }
}
