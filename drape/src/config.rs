//! Bake configuration.

use serde::Deserialize;

/// Which authoring-to-target coordinate conversion to apply to incoming field data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BridgePreset {
    /// Right-handed Z-up to left-handed Y-up: `(x, y, z) -> (-x, z, -y)`.
    #[default]
    BlenderToUnity,
    /// Plain Y/Z swap: `(x, y, z) -> (x, z, y)`.
    SwapYz,
    /// Field data already lives in the mesh convention.
    Identity,
}

/// Bake parameters (immutable for the duration of a bake).
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct BakeConfig {
    /// Vertices per parallel task in a deformation pass.
    pub chunk_size: usize,
    /// Upper bound on bytes held by working buffers at once. `None` = unbounded.
    pub memory_budget: Option<usize>,
    /// Bake the meshes of one hierarchy concurrently.
    pub parallel_meshes: bool,
    pub bridge: BridgePreset,
}

impl BakeConfig {
    pub const DEFAULT_CHUNK_SIZE: usize = 64;

    /// Chunk size clamped to at least one vertex.
    #[inline]
    pub fn effective_chunk_size(&self) -> usize {
        self.chunk_size.max(1)
    }
}

impl Default for BakeConfig {
    fn default() -> Self {
        Self {
            chunk_size: Self::DEFAULT_CHUNK_SIZE,
            memory_budget: None,
            parallel_meshes: true,
            bridge: BridgePreset::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bake_config_default() {
        let config = BakeConfig::default();
        assert_eq!(config.chunk_size, 64);
        assert_eq!(config.memory_budget, None);
        assert!(config.parallel_meshes);
        assert_eq!(config.bridge, BridgePreset::BlenderToUnity);
    }

    #[test]
    fn test_zero_chunk_size_is_clamped() {
        let config = BakeConfig { chunk_size: 0, ..Default::default() };
        assert_eq!(config.effective_chunk_size(), 1);
    }

    #[test]
    fn test_partial_config_from_json() {
        let config: BakeConfig = serde_json::from_str(r#"{ "chunk_size": 256, "bridge": "swap-yz" }"#).unwrap();
        assert_eq!(config.chunk_size, 256);
        assert_eq!(config.bridge, BridgePreset::SwapYz);
        assert!(config.parallel_meshes);
    }
}
