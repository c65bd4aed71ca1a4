use std::fmt;

/// Something a bake passed over, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedItem {
    pub item: String,
    pub reason: String,
}

impl SkippedItem {
    pub fn new(item: impl Into<String>, reason: impl ToString) -> Self {
        Self { item: item.into(), reason: reason.to_string() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BakeReport {
    pub meshes_processed: usize,
    /// Authored morph targets re-derived plus shape-key groups written as morph targets.
    pub morph_targets_processed: usize,
    pub shape_key_frames: usize,
    /// Nodes showing their own earlier bake output, baked again from the registered original.
    pub rebaked_from_registry: usize,
    pub skipped: Vec<SkippedItem>,
}

impl BakeReport {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}

impl fmt::Display for BakeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} mesh(es), {} morph target(s), {} shape-key frame(s)",
            self.meshes_processed, self.morph_targets_processed, self.shape_key_frames
        )?;
        if self.rebaked_from_registry > 0 {
            write!(f, "; {} from registered original(s)", self.rebaked_from_registry)?;
        }
        if !self.skipped.is_empty() {
            write!(f, "; skipped {}:", self.skipped.len())?;
            for skipped in &self.skipped {
                write!(f, "\n  - {}: {}", skipped.item, skipped.reason)?;
            }
        }
        Ok(())
    }
}
