// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Per-workspace settings, persisted in `.visioannotate/workspace.json`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Settings stored alongside a working folder.
///
/// Keys this version does not know about are kept in `extra` and written
/// back unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceSettings {
    /// Label vocabulary offered when renaming annotations.
    pub labels: Vec<String>,
    /// Longest side of exported images; larger images are downsized.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export_max_dimension: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_default() {
        let settings: WorkspaceSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, WorkspaceSettings::default());
    }

    #[test]
    fn test_unknown_keys_round_trip() {
        let json = r#"{"labels":["cat","dog"],"theme":"dark","grid":{"size":8}}"#;
        let settings: WorkspaceSettings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.labels, ["cat", "dog"]);
        assert_eq!(settings.extra["theme"], "dark");

        let value = serde_json::to_value(&settings).unwrap();
        assert_eq!(value["grid"]["size"], 8);
        assert!(value.get("export_max_dimension").is_none());
    }
}
