//! Core field names and the core-field mapping.
//!
//! The recognized field set is closed (an enum) so that typos cannot create
//! phantom fields, while the mapping is built from an open string-keyed map
//! so that keys the source adds later are tolerated and ignored.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A recognized core field of a case record.
///
/// Declaration order is the order fields are compared and reported in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldName {
    SubCategory,
    Instance,
    CaseNumber,
    MaterialNumber,
    Uid,
    UidLink,
    DateOfReceipt,
    CategoryOfCase,
    Judge,
    DateOfConsideration,
    ResultOfConsideration,
    IndicationOfConsideration,
    CourtComposition,
}

impl FieldName {
    /// Every recognized field, in comparison order.
    pub const ALL: [FieldName; 13] = [
        FieldName::SubCategory,
        FieldName::Instance,
        FieldName::CaseNumber,
        FieldName::MaterialNumber,
        FieldName::Uid,
        FieldName::UidLink,
        FieldName::DateOfReceipt,
        FieldName::CategoryOfCase,
        FieldName::Judge,
        FieldName::DateOfConsideration,
        FieldName::ResultOfConsideration,
        FieldName::IndicationOfConsideration,
        FieldName::CourtComposition,
    ];

    /// The case/reference number field checked before ordinary field diffing.
    pub const IDENTITY: FieldName = FieldName::CaseNumber;

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldName::SubCategory => "sub_category",
            FieldName::Instance => "instance",
            FieldName::CaseNumber => "case_number",
            FieldName::MaterialNumber => "material_number",
            FieldName::Uid => "uid",
            FieldName::UidLink => "uid_link",
            FieldName::DateOfReceipt => "date_of_receipt",
            FieldName::CategoryOfCase => "category_of_case",
            FieldName::Judge => "judge",
            FieldName::DateOfConsideration => "date_of_consideration",
            FieldName::ResultOfConsideration => "result_of_consideration",
            FieldName::IndicationOfConsideration => "indication_of_consideration",
            FieldName::CourtComposition => "court_composition",
        }
    }

    /// Look up a recognized field by its key; `None` for unrecognized keys.
    pub fn from_key(key: &str) -> Option<FieldName> {
        let key = key.trim();
        FieldName::ALL.iter().copied().find(|f| f.as_str() == key)
    }

    /// The recognized field set as a set, as stamped on new summaries.
    pub fn all_tracked() -> BTreeSet<FieldName> {
        FieldName::ALL.iter().copied().collect()
    }
}

impl std::fmt::Display for FieldName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mapping of recognized field → optional value.
///
/// A key mapped to `None` and a missing key both mean "no value"; see
/// [`CoreFields::get`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, Option<String>>",
    into = "BTreeMap<String, Option<String>>"
)]
pub struct CoreFields(BTreeMap<FieldName, Option<String>>);

impl CoreFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from an open mapping, returning the keys that were ignored.
    pub fn from_raw<I, K, V>(raw: I) -> (Self, Vec<String>)
    where
        I: IntoIterator<Item = (K, Option<V>)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut fields = BTreeMap::new();
        let mut ignored = Vec::new();
        for (key, value) in raw {
            match FieldName::from_key(key.as_ref()) {
                Some(name) => {
                    fields.insert(name, value.map(Into::into));
                }
                None => ignored.push(key.as_ref().to_string()),
            }
        }
        (Self(fields), ignored)
    }

    pub fn set(&mut self, field: FieldName, value: Option<String>) {
        self.0.insert(field, value);
    }

    pub fn with(mut self, field: FieldName, value: impl Into<String>) -> Self {
        self.0.insert(field, Some(value.into()));
        self
    }

    /// The value of `field`, treating a missing key and an explicit `None` alike.
    pub fn get(&self, field: FieldName) -> Option<&str> {
        self.0.get(&field).and_then(|v| v.as_deref())
    }

    pub fn contains(&self, field: FieldName) -> bool {
        self.0.contains_key(&field)
    }

    /// Field names present as keys, in comparison order.
    pub fn names(&self) -> impl Iterator<Item = FieldName> + '_ {
        self.0.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FieldName, Option<&str>)> + '_ {
        self.0.iter().map(|(k, v)| (*k, v.as_deref()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<BTreeMap<String, Option<String>>> for CoreFields {
    fn from(raw: BTreeMap<String, Option<String>>) -> Self {
        let (fields, ignored) = CoreFields::from_raw(raw);
        if !ignored.is_empty() {
            tracing::debug!(ignored = ?ignored, "ignoring unrecognized core fields");
        }
        fields
    }
}

impl From<CoreFields> for BTreeMap<String, Option<String>> {
    fn from(fields: CoreFields) -> Self {
        fields
            .0
            .into_iter()
            .map(|(k, v)| (k.as_str().to_string(), v))
            .collect()
    }
}

/// Deserialize a tracked-field list, skipping names this build does not know.
pub(crate) fn deserialize_tracked<'de, D>(deserializer: D) -> Result<BTreeSet<FieldName>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Vec<String> = Vec::deserialize(deserializer)?;
    Ok(raw.iter().filter_map(|k| FieldName::from_key(k)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_key_roundtrips_every_field() {
        for field in FieldName::ALL {
            assert_eq!(FieldName::from_key(field.as_str()), Some(field));
        }
        assert_eq!(FieldName::from_key("courtroom"), None);
    }

    #[test]
    fn test_from_raw_reports_ignored_keys() {
        let raw = vec![
            ("judge", Some("A. Ivanov")),
            ("courtroom", Some("12")),
            ("case_number", None),
        ];
        let (fields, ignored) = CoreFields::from_raw(raw);
        assert_eq!(fields.get(FieldName::Judge), Some("A. Ivanov"));
        assert!(fields.contains(FieldName::CaseNumber));
        assert_eq!(fields.get(FieldName::CaseNumber), None);
        assert_eq!(ignored, vec!["courtroom".to_string()]);
    }

    #[test]
    fn test_deserialize_tolerates_unknown_keys() {
        let json = r#"{"judge": "B. Petrov", "hearing_room": "3"}"#;
        let fields: CoreFields = serde_json::from_str(json).unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields.get(FieldName::Judge), Some("B. Petrov"));
    }

    #[test]
    fn test_serialize_uses_snake_case_keys() {
        let fields = CoreFields::new().with(FieldName::DateOfReceipt, "01.02.2024");
        let json = serde_json::to_string(&fields).unwrap();
        assert_eq!(json, r#"{"date_of_receipt":"01.02.2024"}"#);
    }
}
