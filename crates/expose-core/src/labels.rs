//! Typed access to the exposure label
//!
//! Decision logic asks these helpers instead of looking at raw label strings.

use std::collections::BTreeMap;

use crate::constants::{EXPOSE_LABEL_DISABLED, EXPOSE_LABEL_KEY, EXPOSE_LABEL_VALUE};

/// `true` when the labels carry `expose=true`
pub fn exposure_requested(labels: Option<&BTreeMap<String, String>>) -> bool {
    labels
        .and_then(|l| l.get(EXPOSE_LABEL_KEY))
        .map(String::as_str)
        == Some(EXPOSE_LABEL_VALUE)
}

/// `true` when the exposure label key is present, whatever its value
pub fn has_exposure_label(labels: Option<&BTreeMap<String, String>>) -> bool {
    labels.is_some_and(|l| l.contains_key(EXPOSE_LABEL_KEY))
}

/// `true` when the labels no longer ask for exposure: key absent or `false`
pub fn exposure_withdrawn(labels: Option<&BTreeMap<String, String>>) -> bool {
    match labels.and_then(|l| l.get(EXPOSE_LABEL_KEY)) {
        None => true,
        Some(value) => value == EXPOSE_LABEL_DISABLED,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_exposure_requested() {
        assert!(exposure_requested(Some(&labels(&[("expose", "true")]))));
        assert!(!exposure_requested(Some(&labels(&[("expose", "false")]))));
        assert!(!exposure_requested(Some(&labels(&[("expose", "yes")]))));
        assert!(!exposure_requested(Some(&labels(&[]))));
        assert!(!exposure_requested(None));
    }

    #[test]
    fn test_exposure_withdrawn() {
        assert!(exposure_withdrawn(None));
        assert!(exposure_withdrawn(Some(&labels(&[("app", "web")]))));
        assert!(exposure_withdrawn(Some(&labels(&[("expose", "false")]))));
        assert!(!exposure_withdrawn(Some(&labels(&[("expose", "true")]))));
        // Any other value is not an explicit withdrawal
        assert!(!exposure_withdrawn(Some(&labels(&[("expose", "maybe")]))));
    }

    #[test]
    fn test_has_exposure_label() {
        assert!(has_exposure_label(Some(&labels(&[("expose", "false")]))));
        assert!(!has_exposure_label(Some(&labels(&[("app", "web")]))));
        assert!(!has_exposure_label(None));
    }
}
