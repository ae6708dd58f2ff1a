use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One record of a record list: field name to raw text value
pub type Record = IndexMap<String, String>;

/// Value of a list-typed parameter
///
/// Positions are 1-based. Writing past the end pads with empty placeholders
/// (an empty string for scalar lists, an empty record for record lists).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", content = "values", rename_all = "snake_case")]
pub enum ListValue {
    Scalar(Vec<String>),
    Records(Vec<Record>),
}

/// Order-preserving comparison form of a list
///
/// Scalar values are trimmed. Records become field-sorted tuples of trimmed
/// values; records with no fields are dropped so padding placeholders do not
/// register as content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListKey {
    Scalar(Vec<String>),
    Records(Vec<Vec<(String, String)>>),
}

impl ListValue {
    pub fn len(&self) -> usize {
        match self {
            ListValue::Scalar(values) => values.len(),
            ListValue::Records(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, ListValue::Scalar(_))
    }

    /// Write `value` at 1-based `index`, padding with empty strings
    ///
    /// Returns `false` if this is a record list or `index` is 0.
    pub fn set_scalar(&mut self, index: usize, value: impl Into<String>) -> bool {
        let ListValue::Scalar(values) = self else {
            return false;
        };
        if index == 0 {
            return false;
        }
        if values.len() < index {
            values.resize(index, String::new());
        }
        values[index - 1] = value.into();
        true
    }

    /// Upsert `fields` into the record at 1-based `index`, padding with empty records
    ///
    /// Returns `false` if this is a scalar list or `index` is 0.
    pub fn set_record_fields<'a, I>(&mut self, index: usize, fields: I) -> bool
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let ListValue::Records(records) = self else {
            return false;
        };
        if index == 0 {
            return false;
        }
        if records.len() < index {
            records.resize_with(index, Record::new);
        }
        let record = &mut records[index - 1];
        for (field, value) in fields {
            record.insert(field.to_string(), value.to_string());
        }
        true
    }

    pub fn comparison_key(&self) -> ListKey {
        match self {
            ListValue::Scalar(values) => {
                ListKey::Scalar(values.iter().map(|v| v.trim().to_string()).collect())
            }
            ListValue::Records(records) => ListKey::Records(
                records
                    .iter()
                    .filter(|record| !record.is_empty())
                    .map(|record| {
                        let mut fields: Vec<(String, String)> = record
                            .iter()
                            .map(|(k, v)| (k.clone(), v.trim().to_string()))
                            .collect();
                        fields.sort();
                        fields
                    })
                    .collect(),
            ),
        }
    }
}
