use std::{borrow::Borrow, collections::HashSet, fmt};

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::error::{InferenceError, InferenceResult};

/// Non-empty field name taken from a header row.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldName(String);

impl FieldName {
    pub fn new(name: impl Into<String>) -> InferenceResult<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(InferenceError::InvalidFieldName);
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for FieldName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for FieldName {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for FieldName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        FieldName::new(raw).map_err(de::Error::custom)
    }
}

/// One row of a delimited source: field names paired with raw values, in
/// header order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(FieldName, String)>,
}

impl Record {
    pub fn new(fields: Vec<(FieldName, String)>) -> InferenceResult<Self> {
        let mut seen = HashSet::with_capacity(fields.len());
        for (name, _) in &fields {
            if !seen.insert(name.as_str()) {
                return Err(InferenceError::DuplicateField(name.to_string()));
            }
        }
        Ok(Self { fields })
    }

    /// Builds a record from plain string pairs, validating every name.
    pub fn from_pairs<I, K, V>(pairs: I) -> InferenceResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let fields = pairs
            .into_iter()
            .map(|(name, value)| FieldName::new(name).map(|name| (name, value.into())))
            .collect::<InferenceResult<Vec<_>>>()?;
        Self::new(fields)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field.as_str() == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FieldName, &str)> {
        self.fields.iter().map(|(name, value)| (name, value.as_str()))
    }

    pub fn field_names(&self) -> impl Iterator<Item = &FieldName> {
        self.fields.iter().map(|(name, _)| name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_name_rejects_empty() {
        assert_eq!(FieldName::new(""), Err(InferenceError::InvalidFieldName));
        assert_eq!(FieldName::new("Pedal name").unwrap().as_str(), "Pedal name");
    }

    #[test]
    fn record_preserves_header_order() {
        let record = Record::from_pairs([("b", "2"), ("a", "1")]).unwrap();
        let names: Vec<&str> = record.field_names().map(FieldName::as_str).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(record.get("a"), Some("1"));
        assert_eq!(record.get("c"), None);
    }

    #[test]
    fn record_rejects_duplicate_fields() {
        let err = Record::from_pairs([("a", "1"), ("a", "2")]).unwrap_err();
        assert_eq!(err, InferenceError::DuplicateField("a".to_string()));
    }
}
