//! Serializable joiner settings

use serde::{Deserialize, Serialize};

use crate::order::JoiningOrder;

/// Settings of a [`ContourJoiner`](crate::ContourJoiner); every field may be omitted in JSON
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JoinConfig {
    /// `None` picks the step automatically, `Some(0)` disables the visited grid
    pub grid_step_log: Option<u32>,
    pub joining_order: JoiningOrder,
    /// Pack output contours into minimal vertex lists
    pub pack_result: bool,
    /// Label of contours whose label is not covered by the map
    pub default_joined_label: i32,
    /// Maps contour labels to joined labels; labels beyond its end are kept as is
    pub joined_labels_map: Option<Vec<i32>>,
}

impl Default for JoinConfig {
    fn default() -> Self {
        Self {
            grid_step_log: None,
            joining_order: JoiningOrder::Unordered,
            pack_result: true,
            default_joined_label: 0,
            joined_labels_map: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_take_defaults() {
        let config: JoinConfig =
            serde_json::from_str(r#"{"joining_order": "large-first"}"#).unwrap();
        assert_eq!(config.joining_order, JoiningOrder::LargeFirst);
        assert!(config.pack_result);
        assert_eq!(config.grid_step_log, None);
        assert_eq!(config.joined_labels_map, None);
    }

    #[test]
    fn test_explicit_fields() {
        let config: JoinConfig = serde_json::from_str(
            r#"{"grid_step_log": 0, "pack_result": false, "joined_labels_map": [1, 1, 2]}"#,
        )
        .unwrap();
        assert_eq!(config.grid_step_log, Some(0));
        assert!(!config.pack_result);
        assert_eq!(config.joined_labels_map, Some(vec![1, 1, 2]));
    }
}
