//! On-disk shape of the identifier map.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Persisted identifier map. Keys are sorted so successive files diff cleanly.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct IdMapFile {
    #[serde(default)]
    pub metadata: IdMapMetadata,
    /// entity type -> source id -> stable id
    #[serde(default)]
    pub mappings: BTreeMap<String, BTreeMap<String, String>>,
    /// stable id -> [entity type, source id]; informational, rebuilt on load
    #[serde(default)]
    pub reverse: BTreeMap<String, (String, String)>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct IdMapMetadata {
    /// RFC 3339 timestamp of the last write
    #[serde(default)]
    pub last_updated: String,
    #[serde(default)]
    pub total_mappings: usize,
    /// Namespace UUID the ids were derived with
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<String>,
}

impl IdMapFile {
    /// Number of forward mappings in the file.
    pub fn mapping_count(&self) -> usize {
        self.mappings.values().map(BTreeMap::len).sum()
    }
}
