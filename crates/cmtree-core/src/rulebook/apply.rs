use regex::Regex;

use crate::config::SessionConfig;
use crate::diagnostics::{Diagnostic, DiagnosticSource};
use crate::log_fallback;
use crate::model::DistName;
use crate::ops::object_ops::{self, SCALAR_LIST_FIELD};
use crate::ops::ConfigTree;
use crate::schema::SchemaCatalog;

use super::resolver::{resolve, ResolutionStep, RuleQuery};
use super::table::{RuleObject, RuleTable, RuleValue};

/// Value written for a rule entry or list field that carries no value
const MISSING_VALUE_DEFAULT: &str = "0";

fn rule_text(value: &RuleValue) -> String {
    value
        .value_text()
        .unwrap_or_else(|| MISSING_VALUE_DEFAULT.to_string())
}

/// What the rulebook did for one created object
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RulebookOutcome {
    /// Resolution step and selector, `None` when nothing matched or the class is exempt
    pub resolution: Option<(ResolutionStep, String)>,
    /// Number of parameter and list-entry writes that succeeded
    pub applied: usize,
    pub diagnostics: Vec<Diagnostic>,
}

/// Seed a freshly created object at `path` from the rule table
///
/// Never fails: an unmatched class, a guessed entry, or a value the catalog
/// rejects each leave a diagnostic and the rest of the entry is still applied.
pub fn apply_defaults(
    tree: &mut ConfigTree,
    catalog: &dyn SchemaCatalog,
    table: &RuleTable,
    config: &SessionConfig,
    path: &DistName,
    root_id: Option<&str>,
) -> RulebookOutcome {
    let mut outcome = RulebookOutcome::default();
    let (Some(class), Some(id)) = (path.class(), path.id()) else {
        return outcome;
    };
    if config.is_rulebook_exempt(class) {
        return outcome;
    }

    let query = RuleQuery { class, id, path };
    let Some(resolved) = resolve(table, &query, config, catalog.root_class()) else {
        log_fallback!("rulebook_resolve", "no rule entries for class", class = class, dist_name = %path);
        outcome.diagnostics.push(
            Diagnostic::info(DiagnosticSource::Rulebook, format!("no rule entries for class {}", class))
                .at(path),
        );
        return outcome;
    };

    if resolved.step == ResolutionStep::FirstKey {
        log_fallback!(
            "rulebook_resolve",
            "no specific entry; using first selector",
            class = class,
            selector = resolved.key.as_str(),
            dist_name = %path
        );
        outcome.diagnostics.push(
            Diagnostic::warning(
                DiagnosticSource::Rulebook,
                format!(
                    "no rule entry for {}-{}; fell back to selector '{}'",
                    class, id, resolved.key
                ),
            )
            .at(path),
        );
    }

    let root_class = catalog.root_class().to_string();
    apply_rule(
        tree,
        catalog,
        path,
        resolved.rule,
        &|value| substitute_root_id(value, root_id, config, &root_class),
        &mut outcome,
    );
    outcome.resolution = Some((resolved.step, resolved.key));
    outcome
}

fn apply_rule(
    tree: &mut ConfigTree,
    catalog: &dyn SchemaCatalog,
    path: &DistName,
    rule: &RuleObject,
    substitute: &dyn Fn(&str) -> String,
    outcome: &mut RulebookOutcome,
) {
    for (name, rule_value) in rule {
        if rule_value.is_list() {
            for (i, child) in rule_value.children.iter().enumerate() {
                let fields: Vec<(String, String)> = match child.get(SCALAR_LIST_FIELD) {
                    Some(val) if child.len() == 1 => vec![(
                        SCALAR_LIST_FIELD.to_string(),
                        substitute(&rule_text(val)),
                    )],
                    _ => child
                        .iter()
                        .map(|(field, v)| (field.clone(), substitute(&rule_text(v))))
                        .collect(),
                };
                match object_ops::set_list_item(tree, catalog, path, name, i + 1, &fields) {
                    Ok(()) => outcome.applied += 1,
                    Err(err) => outcome.diagnostics.push(
                        Diagnostic::warning(
                            DiagnosticSource::Rulebook,
                            format!("rule value for list {}[{}] rejected: {}", name, i + 1, err),
                        )
                        .at(path),
                    ),
                }
            }
        } else {
            let value = substitute(&rule_text(rule_value));
            match object_ops::set_parameter(tree, catalog, path, name, &value) {
                Ok(()) => outcome.applied += 1,
                Err(err) => outcome.diagnostics.push(
                    Diagnostic::warning(
                        DiagnosticSource::Rulebook,
                        format!("rule value for {} rejected: {}", name, err),
                    )
                    .at(path),
                ),
            }
        }
    }
}

/// Replace `CLASS-<placeholder>` tokens with `CLASS-<root id>` for root-mirroring classes
pub fn substitute_root_id(
    value: &str,
    root_id: Option<&str>,
    config: &SessionConfig,
    root_class: &str,
) -> String {
    let Some(root_id) = root_id else {
        return value.to_string();
    };
    if !value.contains(config.placeholder_id.as_str()) {
        return value.to_string();
    }
    let mut classes: Vec<&str> = vec![root_class];
    classes.extend(config.root_id_classes.iter().map(String::as_str));
    let alternatives: Vec<String> = classes.iter().map(|c| regex::escape(c)).collect();
    let pattern = format!(
        r"\b({})-{}\b",
        alternatives.join("|"),
        regex::escape(&config.placeholder_id)
    );
    match Regex::new(&pattern) {
        Ok(re) => re
            .replace_all(value, |caps: &regex::Captures<'_>| format!("{}-{}", &caps[1], root_id))
            .into_owned(),
        Err(_) => value.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::model::ListValue;
    use crate::schema::{ParameterMeta, StaticCatalog};
    use indexmap::IndexMap;

    fn list_meta(fields: &[&str]) -> ParameterMeta {
        ParameterMeta {
            kind: "list".into(),
            children: fields.iter().map(|f| f.to_string()).collect(),
            ..ParameterMeta::default()
        }
    }

    #[test]
    fn test_list_entries_without_value_default_to_zero() {
        let cat = StaticCatalog::new("ROOT")
            .with_default_version("1.0")
            .with_class("ROOT", ["B"])
            .with_class("B", Vec::<String>::new())
            .with_param("B", "tags", list_meta(&["val"]))
            .with_param("B", "levels", list_meta(&["lo", "hi"]));
        let mut tree = ConfigTree::new();
        let root = object_ops::create_object(&mut tree, &cat, None, "ROOT", "1", "1.0").unwrap();
        let path =
            object_ops::create_object(&mut tree, &cat, Some(&root), "B", "1", "1.0").unwrap();

        let mut bare_tag = IndexMap::new();
        bare_tag.insert(SCALAR_LIST_FIELD.to_string(), RuleValue::default());
        let mut level = IndexMap::new();
        level.insert("lo".to_string(), RuleValue::scalar("3"));
        level.insert("hi".to_string(), RuleValue::default());
        let mut rule = RuleObject::new();
        rule.insert("tags".to_string(), RuleValue::list(vec![bare_tag]));
        rule.insert("levels".to_string(), RuleValue::list(vec![level]));
        let mut table = RuleTable::new();
        table.insert("B", "1", rule);

        let config = SessionConfig::default();
        let outcome = apply_defaults(&mut tree, &cat, &table, &config, &path, Some("1"));
        assert_eq!(outcome.applied, 2);

        let b = tree.find(&path).unwrap();
        match b.list("tags").unwrap() {
            ListValue::Scalar(items) => assert_eq!(items, &vec!["0".to_string()]),
            other => panic!("expected scalar list, got {:?}", other),
        }
        match b.list("levels").unwrap() {
            ListValue::Records(records) => {
                assert_eq!(records[0].get("lo").map(String::as_str), Some("3"));
                assert_eq!(records[0].get("hi").map(String::as_str), Some("0"));
            }
            other => panic!("expected record list, got {:?}", other),
        }
    }

    #[test]
    fn test_substitute_root_id() {
        let cfg = SessionConfig {
            root_id_classes: vec!["BTS".to_string()],
            ..SessionConfig::default()
        };
        assert_eq!(
            substitute_root_id("ROOT-000/BTS-000/CELL-000", Some("42"), &cfg, "ROOT"),
            "ROOT-42/BTS-42/CELL-000"
        );
        assert_eq!(
            substitute_root_id("ROOT-0001", Some("42"), &cfg, "ROOT"),
            "ROOT-0001"
        );
        assert_eq!(
            substitute_root_id("ROOT-000", None, &cfg, "ROOT"),
            "ROOT-000"
        );
        assert_eq!(substitute_root_id("15", Some("42"), &cfg, "ROOT"), "15");
    }
}
