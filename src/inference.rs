//! Per-field type inference and schema merging.
//!
//! A source is reduced to a [`FieldTypeMap`] by seeding with
//! [`build_field_types`] on its first record and folding
//! [`update_field_types`] over the rest, one record at a time. Maps from
//! several sources feeding the same table are combined with
//! [`merge_field_types`]. All three operations widen through
//! [`DataType::widen`], so the result does not depend on record or file order.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::{
    data::{BooleanTokens, DataType, classify},
    error::{InferenceError, InferenceResult},
    record::{FieldName, Record},
};

/// Field name to inferred type, kept in header order.
///
/// Equality compares the mapping only; field order is ignored.
#[derive(Debug, Clone, Default)]
pub struct FieldTypeMap {
    fields: Vec<(FieldName, DataType)>,
    index: HashMap<FieldName, usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldType {
    pub name: FieldName,
    pub datatype: DataType,
}

impl FieldTypeMap {
    pub fn from_fields<I>(fields: I) -> InferenceResult<Self>
    where
        I: IntoIterator<Item = (FieldName, DataType)>,
    {
        let mut map = FieldTypeMap::default();
        for (name, datatype) in fields {
            map.insert(name, datatype)?;
        }
        Ok(map)
    }

    /// Convenience constructor from plain names, validating each one.
    pub fn from_pairs<I, K>(pairs: I) -> InferenceResult<Self>
    where
        I: IntoIterator<Item = (K, DataType)>,
        K: Into<String>,
    {
        let fields = pairs
            .into_iter()
            .map(|(name, datatype)| FieldName::new(name).map(|name| (name, datatype)))
            .collect::<InferenceResult<Vec<_>>>()?;
        Self::from_fields(fields)
    }

    fn insert(&mut self, name: FieldName, datatype: DataType) -> InferenceResult<()> {
        if self.index.contains_key(&name) {
            return Err(InferenceError::DuplicateField(name.to_string()));
        }
        self.index.insert(name.clone(), self.fields.len());
        self.fields.push((name, datatype));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<DataType> {
        self.index.get(name).map(|&idx| self.fields[idx].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FieldName, DataType)> {
        self.fields.iter().map(|(name, datatype)| (name, *datatype))
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

    pub fn to_field_types(&self) -> Vec<FieldType> {
        self.fields
            .iter()
            .map(|(name, datatype)| FieldType {
                name: name.clone(),
                datatype: *datatype,
            })
            .collect()
    }

    /// Fails unless `names` is exactly this map's field-name set.
    pub(crate) fn ensure_same_fields<'a, I>(&self, names: I) -> InferenceResult<()>
    where
        I: IntoIterator<Item = &'a FieldName>,
    {
        let other: BTreeSet<&str> = names.into_iter().map(FieldName::as_str).collect();
        if other.len() == self.len() && other.iter().all(|name| self.index.contains_key(*name)) {
            return Ok(());
        }
        let missing = self
            .field_names()
            .map(FieldName::as_str)
            .filter(|name| !other.contains(name))
            .map(str::to_string)
            .collect::<BTreeSet<_>>();
        let unexpected = other
            .iter()
            .filter(|name| !self.index.contains_key(**name))
            .map(|name| name.to_string())
            .collect::<BTreeSet<_>>();
        Err(InferenceError::SchemaMismatch {
            missing: missing.into_iter().collect(),
            unexpected: unexpected.into_iter().collect(),
        })
    }
}

impl PartialEq for FieldTypeMap {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(name, datatype)| other.get(name.as_str()) == Some(datatype))
    }
}

impl Eq for FieldTypeMap {}

/// Classifies every value of the first record of a source.
pub fn build_field_types(
    first_record: &Record,
    tokens: &BooleanTokens,
) -> InferenceResult<FieldTypeMap> {
    let fields = first_record
        .iter()
        .map(|(name, value)| classify(value, tokens).map(|(datatype, _)| (name.clone(), datatype)))
        .collect::<InferenceResult<Vec<_>>>()?;
    FieldTypeMap::from_fields(fields)
}

/// Widens every field of `current` with the type of the matching value in
/// `next_record`.
pub fn update_field_types(
    mut current: FieldTypeMap,
    next_record: &Record,
    tokens: &BooleanTokens,
) -> InferenceResult<FieldTypeMap> {
    current.ensure_same_fields(next_record.field_names())?;
    for (name, value) in next_record.iter() {
        let (observed, _) = classify(value, tokens)?;
        let idx = current.index[name.as_str()];
        let slot = &mut current.fields[idx].1;
        *slot = slot.widen(observed);
    }
    Ok(current)
}

/// Combines the maps of two sources feeding the same table. Field order
/// follows `first`.
pub fn merge_field_types(
    first: &FieldTypeMap,
    second: &FieldTypeMap,
) -> InferenceResult<FieldTypeMap> {
    first.ensure_same_fields(second.field_names())?;
    let fields = first
        .iter()
        .map(|(name, datatype)| {
            let other = second.get(name.as_str()).unwrap_or(datatype);
            (name.clone(), datatype.widen(other))
        })
        .collect::<Vec<_>>();
    FieldTypeMap::from_fields(fields)
}

/// Folds a stream of records into one map, stopping at the first error from
/// either the stream or the fold. Returns `None` for an empty stream.
pub fn infer_field_types<I, E>(
    records: I,
    tokens: &BooleanTokens,
) -> Result<Option<FieldTypeMap>, E>
where
    I: IntoIterator<Item = Result<Record, E>>,
    E: From<InferenceError>,
{
    let mut current: Option<FieldTypeMap> = None;
    for record in records {
        let record = record?;
        current = Some(match current {
            None => build_field_types(&record, tokens)?,
            Some(map) => update_field_types(map, &record, tokens)?,
        });
    }
    Ok(current)
}

/// Left fold of [`merge_field_types`], seeded by the first map. Returns
/// `None` when no maps are given.
pub fn merge_all<I, E>(maps: I) -> Result<Option<FieldTypeMap>, E>
where
    I: IntoIterator<Item = Result<FieldTypeMap, E>>,
    E: From<InferenceError>,
{
    let mut maps = maps.into_iter();
    let Some(first) = maps.next() else {
        return Ok(None);
    };
    let mut merged = first?;
    for map in maps {
        merged = merge_field_types(&merged, &map?)?;
    }
    Ok(Some(merged))
}
