//! Driver map: which actuator each driver id controls and how its states
//! are labelled.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One driver entry.
///
/// Serialized flat, the way the controller configuration stores it:
/// `{"name": "ArmA", "1": "Extend", "0": "Retract"}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverSpec {
    /// Display name of the driven actuator
    pub name: String,
    /// Raw state value -> event label
    #[serde(flatten)]
    pub states: BTreeMap<String, String>,
}

impl DriverSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            states: BTreeMap::new(),
        }
    }

    /// Builder-style helper to add a state label.
    pub fn with_state(mut self, value: impl Into<String>, label: impl Into<String>) -> Self {
        self.states.insert(value.into(), label.into());
        self
    }
}

/// Mapping from driver id to its [`DriverSpec`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DriverMap(BTreeMap<u32, DriverSpec>);

impl DriverMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, driver_id: u32, spec: DriverSpec) {
        self.0.insert(driver_id, spec);
    }

    pub fn get(&self, driver_id: u32) -> Option<&DriverSpec> {
        self.0.get(&driver_id)
    }

    /// Label for `value` on driver `driver_id`, if both are known.
    pub fn state_label(&self, driver_id: u32, value: &str) -> Option<&str> {
        self.get(driver_id)?.states.get(value).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&u32, &DriverSpec)> {
        self.0.iter()
    }
}

impl FromIterator<(u32, DriverSpec)> for DriverMap {
    fn from_iter<I: IntoIterator<Item = (u32, DriverSpec)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_label_lookup() {
        let drivers: DriverMap = [(
            2,
            DriverSpec::new("ArmA")
                .with_state("1", "Extend")
                .with_state("0", "Retract"),
        )]
        .into_iter()
        .collect();

        assert_eq!(drivers.state_label(2, "1"), Some("Extend"));
        assert_eq!(drivers.state_label(2, "0"), Some("Retract"));
        assert_eq!(drivers.state_label(2, "7"), None);
        assert_eq!(drivers.state_label(3, "1"), None);
        assert_eq!(drivers.get(2).map(|d| d.name.as_str()), Some("ArmA"));
    }

    #[test]
    fn test_flat_json_format() {
        let json = r#"{"2": {"name": "ArmA", "1": "Extend", "0": "Retract"}}"#;
        let drivers: DriverMap = serde_json::from_str(json).unwrap();

        assert_eq!(drivers.len(), 1);
        assert_eq!(drivers.state_label(2, "1"), Some("Extend"));
        assert_eq!(drivers.get(2).unwrap().states.len(), 2);

        let back = serde_json::to_string(&drivers).unwrap();
        let reparsed: DriverMap = serde_json::from_str(&back).unwrap();
        assert_eq!(reparsed, drivers);
    }
}
