//! Value translation of a change-set
//!
//! Values whose `(class, name)` appears in a [`FormulaCatalog`] are passed
//! through the formula engine. Scalar parameters are keyed by parameter
//! name, scalar lists by list name, record fields by field name. A failed
//! translation falls back to the catalog default, or to the original value
//! when there is none, and leaves a diagnostic.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::diagnostics::{Diagnostic, DiagnosticSource};
use crate::diff::{ChangeEntry, Changeset};
use crate::formula::{transcode, TranscodeMode};
use crate::log_fallback;
use crate::model::ListValue;

/// Formula for one parameter, with the value to use when it cannot be applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormulaEntry {
    pub formula: String,
    #[serde(default)]
    pub default: Option<String>,
}

impl FormulaEntry {
    pub fn new(formula: impl Into<String>) -> Self {
        Self {
            formula: formula.into(),
            default: None,
        }
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// `class -> name -> formula`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormulaCatalog {
    entries: BTreeMap<String, BTreeMap<String, FormulaEntry>>,
}

impl FormulaCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, class: &str, name: &str, entry: FormulaEntry) {
        self.entries
            .entry(class.to_string())
            .or_default()
            .insert(name.to_string(), entry);
    }

    pub fn get(&self, class: &str, name: &str) -> Option<&FormulaEntry> {
        self.entries.get(class).and_then(|m| m.get(name))
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Translate every catalogued value of `changeset`; never fails
pub fn translate_changeset(
    changeset: &Changeset,
    catalog: &FormulaCatalog,
    mode: TranscodeMode,
) -> (Changeset, Vec<Diagnostic>) {
    let mut diagnostics = Vec::new();
    let entries = changeset
        .iter()
        .map(|entry| translate_entry(entry, catalog, mode, &mut diagnostics))
        .collect();
    (Changeset::new(changeset.mode, entries), diagnostics)
}

fn translate_entry(
    entry: &ChangeEntry,
    catalog: &FormulaCatalog,
    mode: TranscodeMode,
    diagnostics: &mut Vec<Diagnostic>,
) -> ChangeEntry {
    let mut out = entry.clone();
    let obj = &mut out.object;
    let class = obj.class.clone();
    let dist_name = obj.dist_name.to_string();
    let mut translator = Translator {
        catalog,
        mode,
        class: &class,
        dist_name: &dist_name,
        diagnostics,
    };

    for (name, value) in obj.parameters.iter_mut() {
        translator.apply(name, value);
    }
    for (name, list) in obj.lists.iter_mut() {
        match list {
            ListValue::Scalar(values) => {
                for value in values.iter_mut() {
                    translator.apply(name, value);
                }
            }
            ListValue::Records(records) => {
                for record in records.iter_mut() {
                    for (field, value) in record.iter_mut() {
                        translator.apply(field, value);
                    }
                }
            }
        }
    }
    out
}

struct Translator<'a> {
    catalog: &'a FormulaCatalog,
    mode: TranscodeMode,
    class: &'a str,
    dist_name: &'a str,
    diagnostics: &'a mut Vec<Diagnostic>,
}

impl Translator<'_> {
    fn apply(&mut self, name: &str, value: &mut String) {
        let Some(entry) = self.catalog.get(self.class, name) else {
            return;
        };
        if value.trim().is_empty() {
            return;
        }
        let result = transcode(value, &entry.formula, self.mode);
        if let Some(err) = result.diagnostic {
            let replacement = entry.default.clone().unwrap_or_else(|| value.clone());
            log_fallback!(
                "translate_value",
                "formula failed; using fallback value",
                class = self.class,
                parameter = name,
                dist_name = self.dist_name
            );
            self.diagnostics.push(
                Diagnostic::warning(
                    DiagnosticSource::Translation,
                    format!(
                        "{}.{}: {}; using '{}'",
                        self.class, name, err, replacement
                    ),
                )
                .at(self.dist_name),
            );
            *value = replacement;
        } else {
            *value = result.value;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::diff::DiffMode;
    use crate::model::{DistName, ManagedObject, OperationTag, Record};

    const F: &str = "(UI_VALUE + 140) * 2 / 1";

    fn catalog() -> FormulaCatalog {
        let mut c = FormulaCatalog::new();
        c.insert("CELL", "power", FormulaEntry::new(F));
        c.insert("CELL", "offsets", FormulaEntry::new(F));
        c.insert("CELL", "lo", FormulaEntry::new(F));
        c.insert("CELL", "tilt", FormulaEntry::new(F).with_default("0"));
        c.insert("CELL", "gain", FormulaEntry::new(F));
        c
    }

    fn changeset() -> Changeset {
        let mut cell = ManagedObject::new("CELL", None, DistName::parse("R-1/CELL-1").unwrap(), "1");
        cell.set_parameter("power", "-70");
        cell.set_parameter("name", "north");
        cell.set_parameter("tilt", "steep");
        cell.set_parameter("gain", "loud");
        cell.set_parameter("empty", "");
        cell.lists
            .insert("offsets".into(), ListValue::Scalar(vec!["0".into(), "".into()]));
        let mut rec = Record::new();
        rec.insert("lo".into(), "-140".into());
        rec.insert("hi".into(), "5".into());
        cell.lists.insert("bands".into(), ListValue::Records(vec![rec]));
        Changeset::new(DiffMode::Snapshot, vec![ChangeEntry::new(OperationTag::Create, &cell)])
    }

    #[test]
    fn test_translates_catalogued_values_only() {
        let (out, diagnostics) = translate_changeset(&changeset(), &catalog(), TranscodeMode::Once);
        let cell = &out.entries[0].object;
        assert_eq!(cell.parameter("power"), Some("140"));
        assert_eq!(cell.parameter("name"), Some("north"));
        assert_eq!(
            cell.list("offsets"),
            Some(&ListValue::Scalar(vec!["280".into(), "".into()]))
        );
        let ListValue::Records(records) = cell.list("bands").unwrap() else {
            panic!("expected records");
        };
        assert_eq!(records[0].get("lo").map(String::as_str), Some("0"));
        assert_eq!(records[0].get("hi").map(String::as_str), Some("5"));
        assert_eq!(diagnostics.len(), 2);
    }

    #[test]
    fn test_failures_fall_back_and_never_abort() {
        let (out, diagnostics) = translate_changeset(&changeset(), &catalog(), TranscodeMode::Once);
        let cell = &out.entries[0].object;
        assert_eq!(cell.parameter("tilt"), Some("0"));
        assert_eq!(cell.parameter("gain"), Some("loud"));
        assert!(diagnostics
            .iter()
            .all(|d| d.source == DiagnosticSource::Translation));
    }

    #[test]
    fn test_reverse_mode() {
        let (out, _) = translate_changeset(&changeset(), &catalog(), TranscodeMode::Reverse);
        assert_eq!(out.entries[0].object.parameter("power"), Some("-175.0"));
    }
}
