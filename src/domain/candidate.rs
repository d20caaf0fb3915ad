use std::collections::{btree_map, BTreeMap};

use crate::domain::{
    record::AssetRecord,
    schema::{Field, Schema},
};

/// Raw, unvalidated field values for one prospective record.
///
/// This is what a form or an import hands to the register: a mapping from
/// field to whatever text the user entered. Nothing is checked until the
/// candidate is resolved against the [`Schema`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateFields {
    values: BTreeMap<Field, String>,
}

impl CandidateFields {
    /// Creates an empty candidate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a field, returning the previous value.
    pub fn insert(&mut self, field: Field, value: impl Into<String>) -> Option<String> {
        self.values.insert(field, value.into())
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, field: Field, value: impl Into<String>) -> Self {
        self.insert(field, value);
        self
    }

    /// Removes a field.
    pub fn remove(&mut self, field: Field) -> Option<String> {
        self.values.remove(&field)
    }

    /// The raw value of a field, exactly as entered.
    #[must_use]
    pub fn get(&self, field: Field) -> Option<&str> {
        self.values.get(&field).map(String::as_str)
    }

    /// The raw value of a field, or `None` if it is absent or blank.
    #[must_use]
    pub fn text(&self, field: Field) -> Option<&str> {
        self.get(field).filter(|value| !value.trim().is_empty())
    }

    /// The number of fields set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates over the fields that are set, in column order.
    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.values
            .iter()
            .map(|(&field, value)| (field, value.as_str()))
    }
}

impl From<&AssetRecord> for CandidateFields {
    fn from(record: &AssetRecord) -> Self {
        Schema::columns()
            .iter()
            .map(|&field| (field, record.value(field).into_owned()))
            .collect()
    }
}

impl FromIterator<(Field, String)> for CandidateFields {
    fn from_iter<I: IntoIterator<Item = (Field, String)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl Extend<(Field, String)> for CandidateFields {
    fn extend<I: IntoIterator<Item = (Field, String)>>(&mut self, iter: I) {
        self.values.extend(iter);
    }
}

impl IntoIterator for CandidateFields {
    type Item = (Field, String);
    type IntoIter = btree_map::IntoIter<Field, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_values_read_as_absent() {
        let candidate = CandidateFields::new()
            .with(Field::AssetName, "   ")
            .with(Field::Owner, "Jane Smith");

        assert_eq!(candidate.get(Field::AssetName), Some("   "));
        assert_eq!(candidate.text(Field::AssetName), None);
        assert_eq!(candidate.text(Field::Owner), Some("Jane Smith"));
        assert_eq!(candidate.text(Field::Supplier), None);
    }

    #[test]
    fn iterates_in_column_order() {
        let candidate = CandidateFields::new()
            .with(Field::LastAuditDate, "2024-01-15")
            .with(Field::AssetName, "Payroll");

        let fields: Vec<_> = candidate.iter().map(|(field, _)| field).collect();
        assert_eq!(fields, vec![Field::AssetName, Field::LastAuditDate]);
    }
}
