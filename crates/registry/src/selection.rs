//! Selected-feature state.

use serde::{Deserialize, Serialize};
use viewer_common::LayerCode;

/// The single selected feature, scoped to one layer. At most one
/// selection exists per workspace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSelection {
    pub layer: LayerCode,
    attributes: Vec<(String, String)>,
}

impl FeatureSelection {
    /// Build a selection from attribute pairs, skipping entries with
    /// empty values so they never reach a filter rule.
    pub fn new(
        layer: LayerCode,
        attributes: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        Self {
            layer,
            attributes: attributes
                .into_iter()
                .filter(|(_, value)| !value.is_empty())
                .collect(),
        }
    }

    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_values_are_skipped() {
        let selection = FeatureSelection::new(
            LayerCode::new("HS:res"),
            vec![
                ("name".to_string(), "Logan River".to_string()),
                ("notes".to_string(), String::new()),
            ],
        );
        assert_eq!(
            selection.attributes(),
            &[("name".to_string(), "Logan River".to_string())]
        );
    }

    #[test]
    fn test_all_empty_is_empty_selection() {
        let selection = FeatureSelection::new(
            LayerCode::new("HS:res"),
            vec![("a".to_string(), String::new())],
        );
        assert!(selection.is_empty());
    }
}
