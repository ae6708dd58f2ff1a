//! Rule-entry resolution
//!
//! Picks the one rule entry that seeds a newly created object. The order is
//! fixed and every step is reported back so callers can tell a precise match
//! from a guess.

use std::collections::BTreeMap;

use crate::config::SessionConfig;
use crate::model::{DistName, PathSegment};

use super::table::{RuleObject, RuleTable, DEFAULT_SELECTOR};

/// Which step of the resolution order produced the match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionStep {
    /// The only selector ending in `CLASS-id`
    UniquePath,
    /// Several path selectors matched; the normalized full path won
    NormalizedPath,
    /// Several path selectors matched; the bare `CLASS-id` selector won
    SegmentKey,
    /// Selector equal to the instance id
    InstanceId,
    /// Selector equal to the placeholder id
    Placeholder,
    /// The class-wide default selector
    ClassDefault,
    /// Lexicographically first selector; a guess
    FirstKey,
}

/// What the rulebook is asked about
#[derive(Debug, Clone, Copy)]
pub struct RuleQuery<'a> {
    pub class: &'a str,
    pub id: &'a str,
    /// Full path of the object being created
    pub path: &'a DistName,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<'a> {
    pub step: ResolutionStep,
    pub key: String,
    /// A sentinel rule replaced the instance id before lookup
    pub redirected: bool,
    pub rule: &'a RuleObject,
}

/// Resolve the rule entry for a new object
///
/// 1. Sentinel redirection may replace the instance id with a reserved key.
/// 2. Selectors ending in `CLASS-id`: one match wins outright. With several,
///    the object's full path with root-mirroring ids replaced by the
///    placeholder is tried, then the bare `CLASS-id` selector.
/// 3. The instance id, then the placeholder id, then the class default.
/// 4. The lexicographically first selector of the class.
///
/// Returns `None` only when the class has no rule entries at all.
pub fn resolve<'a>(
    table: &'a RuleTable,
    query: &RuleQuery<'_>,
    config: &SessionConfig,
    root_class: &str,
) -> Option<Resolved<'a>> {
    let rules = table.class_rules(query.class).filter(|r| !r.is_empty())?;

    let sentinel = sentinel_key(query, config);
    let redirected = sentinel.is_some();
    let id = sentinel.unwrap_or(query.id);
    let found = |step: ResolutionStep, key: &str| {
        rules.get_key_value(key).map(|(k, rule)| Resolved {
            step,
            key: k.clone(),
            redirected,
            rule,
        })
    };

    let segment = format!("{}-{}", query.class, id);
    let matches: Vec<&String> = rules
        .keys()
        .filter(|k| ends_with_segment(k, &segment))
        .collect();
    let by_path = match matches.as_slice() {
        [] => None,
        [only] => found(ResolutionStep::UniquePath, only),
        _ => {
            let full = normalized_path(query, id, config, root_class).to_string();
            found(ResolutionStep::NormalizedPath, &full)
                .or_else(|| found(ResolutionStep::SegmentKey, &segment))
        }
    };
    if by_path.is_some() {
        return by_path;
    }

    found(ResolutionStep::InstanceId, id)
        .or_else(|| found(ResolutionStep::Placeholder, &config.placeholder_id))
        .or_else(|| found(ResolutionStep::ClassDefault, DEFAULT_SELECTOR))
        .or_else(|| first_key(rules, redirected))
}

fn first_key(rules: &BTreeMap<String, RuleObject>, redirected: bool) -> Option<Resolved<'_>> {
    rules.iter().next().map(|(key, rule)| Resolved {
        step: ResolutionStep::FirstKey,
        key: key.clone(),
        redirected,
        rule,
    })
}

fn ends_with_segment(key: &str, segment: &str) -> bool {
    key == segment
        || key
            .strip_suffix(segment)
            .is_some_and(|head| head.ends_with('/'))
}

fn sentinel_key<'c>(query: &RuleQuery<'_>, config: &'c SessionConfig) -> Option<&'c str> {
    config
        .sentinels
        .iter()
        .find(|s| {
            if s.anchor_class == query.class {
                return s.anchor_id == query.id;
            }
            s.dependents.iter().any(|d| d == query.class)
                && query
                    .path
                    .segments()
                    .iter()
                    .any(|seg| seg.class == s.anchor_class && seg.id == s.anchor_id)
        })
        .map(|s| s.key.as_str())
}

/// The object's path with root-mirroring ids replaced by the placeholder
fn normalized_path(
    query: &RuleQuery<'_>,
    effective_id: &str,
    config: &SessionConfig,
    root_class: &str,
) -> DistName {
    let segments = query.path.segments();
    let last = segments.len().saturating_sub(1);
    DistName::new(
        segments
            .iter()
            .enumerate()
            .map(|(i, seg)| {
                if config.mirrors_root_id(&seg.class, root_class) {
                    PathSegment::new(seg.class.clone(), config.placeholder_id.clone())
                } else if i == last {
                    PathSegment::new(seg.class.clone(), effective_id)
                } else {
                    seg.clone()
                }
            })
            .collect(),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::SentinelRule;
    use crate::rulebook::table::RuleValue;

    fn rule(param: &str, value: &str) -> RuleObject {
        let mut r = RuleObject::new();
        r.insert(param.to_string(), RuleValue::scalar(value));
        r
    }

    fn config() -> SessionConfig {
        SessionConfig {
            root_id_classes: vec!["BTS".to_string()],
            ..SessionConfig::default()
        }
    }

    fn query<'a>(class: &'a str, id: &'a str, path: &'a DistName) -> RuleQuery<'a> {
        RuleQuery { class, id, path }
    }

    #[test]
    fn test_unknown_class_resolves_to_none() {
        let table = RuleTable::new();
        let path = DistName::parse("ROOT-7/CELL-1").unwrap();
        assert!(resolve(&table, &query("CELL", "1", &path), &config(), "ROOT").is_none());
    }

    #[test]
    fn test_unique_path_match_wins() {
        let mut table = RuleTable::new();
        table.insert("CELL", "ROOT-000/BTS-000/CELL-1", rule("p", "path"));
        table.insert("CELL", "1", rule("p", "id"));
        let path = DistName::parse("ROOT-7/BTS-7/CELL-1").unwrap();
        let r = resolve(&table, &query("CELL", "1", &path), &config(), "ROOT").unwrap();
        assert_eq!(r.step, ResolutionStep::UniquePath);
        assert_eq!(r.key, "ROOT-000/BTS-000/CELL-1");
    }

    #[test]
    fn test_segment_boundary_is_respected() {
        let mut table = RuleTable::new();
        table.insert("CELL", "ROOT-000/XCELL-1", rule("p", "wrong"));
        table.insert("CELL", "1", rule("p", "id"));
        let path = DistName::parse("ROOT-7/CELL-1").unwrap();
        let r = resolve(&table, &query("CELL", "1", &path), &config(), "ROOT").unwrap();
        assert_eq!(r.step, ResolutionStep::InstanceId);
    }

    #[test]
    fn test_multiple_matches_use_normalized_path() {
        let mut table = RuleTable::new();
        table.insert("CELL", "ROOT-000/BTS-000/GRP-1/CELL-1", rule("p", "g1"));
        table.insert("CELL", "ROOT-000/BTS-000/GRP-2/CELL-1", rule("p", "g2"));
        let path = DistName::parse("ROOT-42/BTS-42/GRP-2/CELL-1").unwrap();
        let r = resolve(&table, &query("CELL", "1", &path), &config(), "ROOT").unwrap();
        assert_eq!(r.step, ResolutionStep::NormalizedPath);
        assert_eq!(r.key, "ROOT-000/BTS-000/GRP-2/CELL-1");
    }

    #[test]
    fn test_multiple_matches_fall_back_to_segment_key() {
        let mut table = RuleTable::new();
        table.insert("CELL", "ROOT-000/GRP-1/CELL-1", rule("p", "g1"));
        table.insert("CELL", "CELL-1", rule("p", "seg"));
        let path = DistName::parse("ROOT-42/GRP-9/CELL-1").unwrap();
        let r = resolve(&table, &query("CELL", "1", &path), &config(), "ROOT").unwrap();
        assert_eq!(r.step, ResolutionStep::SegmentKey);
        assert_eq!(r.key, "CELL-1");
    }

    #[test]
    fn test_id_then_placeholder_then_default() {
        let path = DistName::parse("ROOT-1/CELL-5").unwrap();
        let mut table = RuleTable::new();
        table.insert("CELL", DEFAULT_SELECTOR, rule("p", "d"));
        let r = resolve(&table, &query("CELL", "5", &path), &config(), "ROOT").unwrap();
        assert_eq!(r.step, ResolutionStep::ClassDefault);

        table.insert("CELL", "000", rule("p", "ph"));
        let r = resolve(&table, &query("CELL", "5", &path), &config(), "ROOT").unwrap();
        assert_eq!(r.step, ResolutionStep::Placeholder);

        table.insert("CELL", "5", rule("p", "five"));
        let r = resolve(&table, &query("CELL", "5", &path), &config(), "ROOT").unwrap();
        assert_eq!(r.step, ResolutionStep::InstanceId);
    }

    #[test]
    fn test_first_key_is_last_resort() {
        let mut table = RuleTable::new();
        table.insert("CELL", "9", rule("p", "nine"));
        table.insert("CELL", "3", rule("p", "three"));
        let path = DistName::parse("ROOT-1/CELL-5").unwrap();
        let r = resolve(&table, &query("CELL", "5", &path), &config(), "ROOT").unwrap();
        assert_eq!(r.step, ResolutionStep::FirstKey);
        assert_eq!(r.key, "3");
    }

    #[test]
    fn test_sentinel_redirects_anchor_and_dependents() {
        let mut cfg = config();
        cfg.sentinels.push(SentinelRule {
            anchor_class: "CELL".to_string(),
            anchor_id: "8".to_string(),
            dependents: vec!["SIB".to_string()],
            key: "999".to_string(),
        });
        let mut table = RuleTable::new();
        table.insert("CELL", "999", rule("p", "iot"));
        table.insert("CELL", "8", rule("p", "plain"));
        table.insert("SIB", "999", rule("q", "iot"));
        table.insert("SIB", "1", rule("q", "plain"));

        let cell = DistName::parse("ROOT-1/CELL-8").unwrap();
        let r = resolve(&table, &query("CELL", "8", &cell), &cfg, "ROOT").unwrap();
        assert!(r.redirected);
        assert_eq!(r.key, "999");

        let sib = DistName::parse("ROOT-1/CELL-8/SIB-1").unwrap();
        let r = resolve(&table, &query("SIB", "1", &sib), &cfg, "ROOT").unwrap();
        assert_eq!(r.key, "999");

        let other = DistName::parse("ROOT-1/CELL-2/SIB-1").unwrap();
        let r = resolve(&table, &query("SIB", "1", &other), &cfg, "ROOT").unwrap();
        assert!(!r.redirected);
        assert_eq!(r.key, "1");
    }
}
