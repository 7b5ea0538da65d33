//! Structural diff engine
//!
//! Compares two JSON trees path by path. Arrays are compared as multisets,
//! so reordering elements never produces a difference. Subtrees named by an
//! ignore rule are skipped entirely, including whether they exist at all.

use std::fmt;

use apicmp_core::Body;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::path::{IgnoreRules, JsonPath};
use crate::value::{is_scalar, json_type, number_eq, same_number_kind, values_identical};

/// Kind of a structural difference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffKind {
    /// Same path and type, different scalar value
    ValueChanged,
    /// Present only on the right
    ItemAdded,
    /// Present only on the left
    ItemRemoved,
    /// Same path, different JSON types
    TypeChanged,
}

impl fmt::Display for DiffKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiffKind::ValueChanged => write!(f, "value_changed"),
            DiffKind::ItemAdded => write!(f, "item_added"),
            DiffKind::ItemRemoved => write!(f, "item_removed"),
            DiffKind::TypeChanged => write!(f, "type_changed"),
        }
    }
}

/// A single difference between two trees
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiffEntry {
    pub kind: DiffKind,
    pub path: JsonPath,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right: Option<Value>,
}

impl DiffEntry {
    fn to_json(&self) -> Value {
        let mut map = Map::new();
        map.insert("path".to_string(), Value::String(self.path.to_string()));
        if let Some(left) = &self.left {
            map.insert("left".to_string(), left.clone());
        }
        if let Some(right) = &self.right {
            map.insert("right".to_string(), right.clone());
        }
        Value::Object(map)
    }
}

impl fmt::Display for DiffEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |v: &Option<Value>| match v {
            Some(value) => value.to_string(),
            None => "(absent)".to_string(),
        };
        write!(
            f,
            "[{}] {}: {} -> {}",
            self.kind,
            self.path,
            show(&self.left),
            show(&self.right)
        )
    }
}

/// All differences found between two trees
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StructuralDiffReport {
    pub entries: Vec<DiffEntry>,
    /// Ignore rules the report was computed with, as written
    pub ignored_paths: Vec<String>,
}

impl StructuralDiffReport {
    /// Check if the trees were equivalent
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Number of entries of one kind
    pub fn count(&self, kind: DiffKind) -> usize {
        self.entries.iter().filter(|e| e.kind == kind).count()
    }

    /// Entries grouped by kind, in order of first appearance
    pub fn grouped(&self) -> Value {
        let mut groups: IndexMap<String, Vec<Value>> = IndexMap::new();
        for entry in &self.entries {
            groups
                .entry(entry.kind.to_string())
                .or_default()
                .push(entry.to_json());
        }
        Value::Object(
            groups
                .into_iter()
                .map(|(kind, entries)| (kind, Value::Array(entries)))
                .collect(),
        )
    }
}

/// Compute the structural diff of two JSON trees
pub fn diff(left: &Value, right: &Value, ignore: &IgnoreRules) -> StructuralDiffReport {
    let mut differ = Differ::new(ignore, None);
    differ.walk(&JsonPath::root(), left, right);
    debug!(
        "Structural diff: {} entries ({} ignore rules)",
        differ.entries.len(),
        ignore.len()
    );
    StructuralDiffReport {
        entries: differ.entries,
        ignored_paths: ignore.sources(),
    }
}

struct Differ<'r> {
    rules: &'r IgnoreRules,
    entries: Vec<DiffEntry>,
    /// Stop after this many entries; used for equivalence checks
    limit: Option<usize>,
}

impl<'r> Differ<'r> {
    fn new(rules: &'r IgnoreRules, limit: Option<usize>) -> Self {
        Self {
            rules,
            entries: Vec::new(),
            limit,
        }
    }

    fn full(&self) -> bool {
        self.limit.map_or(false, |limit| self.entries.len() >= limit)
    }

    fn push(&mut self, kind: DiffKind, path: JsonPath, left: Option<&Value>, right: Option<&Value>) {
        if self.full() {
            return;
        }
        self.entries.push(DiffEntry {
            kind,
            path,
            left: left.cloned(),
            right: right.cloned(),
        });
    }

    fn walk(&mut self, path: &JsonPath, left: &Value, right: &Value) {
        if self.full() || self.rules.is_ignored(path) {
            return;
        }

        match (left, right) {
            (Value::Object(l), Value::Object(r)) => {
                for (key, lv) in l {
                    let child = path.key(key);
                    if self.rules.is_ignored(&child) {
                        continue;
                    }
                    match r.get(key) {
                        Some(rv) => self.walk(&child, lv, rv),
                        None => self.push(DiffKind::ItemRemoved, child, Some(lv), None),
                    }
                }
                for (key, rv) in r {
                    if l.contains_key(key) {
                        continue;
                    }
                    let child = path.key(key);
                    if !self.rules.is_ignored(&child) {
                        self.push(DiffKind::ItemAdded, child, None, Some(rv));
                    }
                }
            }
            (Value::Array(l), Value::Array(r)) => self.walk_array(path, l, r),
            (Value::Number(l), Value::Number(r)) if !same_number_kind(l, r) => {
                self.push(DiffKind::TypeChanged, path.clone(), Some(left), Some(right));
            }
            (Value::Number(l), Value::Number(r)) => {
                if !number_eq(l, r) {
                    self.push(DiffKind::ValueChanged, path.clone(), Some(left), Some(right));
                }
            }
            _ if json_type(left) == json_type(right) => {
                if left != right {
                    self.push(DiffKind::ValueChanged, path.clone(), Some(left), Some(right));
                }
            }
            _ => self.push(DiffKind::TypeChanged, path.clone(), Some(left), Some(right)),
        }
    }

    fn walk_array(&mut self, path: &JsonPath, left: &[Value], right: &[Value]) {
        let mut taken: Vec<bool> = (0..right.len())
            .map(|j| self.rules.is_ignored(&path.index(j)))
            .collect();

        // Each left element claims the first equivalent right element
        let mut unmatched_left = Vec::new();
        for (i, lv) in left.iter().enumerate() {
            let child = path.index(i);
            if self.rules.is_ignored(&child) {
                continue;
            }
            let found = (0..right.len()).find(|&j| !taken[j] && self.equivalent(&child, lv, &right[j]));
            match found {
                Some(j) => taken[j] = true,
                None => unmatched_left.push(i),
            }
        }
        let mut unmatched_right: Vec<usize> = (0..right.len()).filter(|&j| !taken[j]).collect();

        for i in unmatched_left {
            let child = path.index(i);
            match best_partner(&left[i], &unmatched_right, right) {
                Some(pos) => {
                    let j = unmatched_right.remove(pos);
                    self.walk(&child, &left[i], &right[j]);
                }
                None => self.push(DiffKind::ItemRemoved, child, Some(&left[i]), None),
            }
        }
        for j in unmatched_right {
            self.push(DiffKind::ItemAdded, path.index(j), None, Some(&right[j]));
        }
    }

    /// Check if two values differ only in ignored places
    fn equivalent(&self, path: &JsonPath, left: &Value, right: &Value) -> bool {
        if values_identical(left, right) {
            return true;
        }
        let mut trial = Differ::new(self.rules, Some(1));
        trial.walk(path, left, right);
        trial.entries.is_empty()
    }
}

/// Position in `candidates` of the right object sharing the most identical
/// scalar members with `left`, if any share at least one
fn best_partner(left: &Value, candidates: &[usize], right: &[Value]) -> Option<usize> {
    let left = left.as_object()?;
    let mut best: Option<(usize, usize)> = None;
    for (pos, &j) in candidates.iter().enumerate() {
        let Some(candidate) = right[j].as_object() else {
            continue;
        };
        let shared = left
            .iter()
            .filter(|(key, lv)| {
                is_scalar(lv) && candidate.get(*key).map_or(false, |rv| values_identical(lv, rv))
            })
            .count();
        if shared > 0 && best.map_or(true, |(_, score)| shared > score) {
            best = Some((pos, shared));
        }
    }
    best.map(|(pos, _)| pos)
}

/// Outcome of comparing two response bodies
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BodyDifferences {
    /// Non-structured bodies with identical content
    Identical,
    /// Structured bodies; the report may be empty
    Structural(StructuralDiffReport),
    /// At least one body is not structured and the contents differ
    ContentDiffers,
}

impl BodyDifferences {
    /// Check if the bodies count as matching
    pub fn is_match(&self) -> bool {
        match self {
            BodyDifferences::Identical => true,
            BodyDifferences::Structural(report) => report.is_empty(),
            BodyDifferences::ContentDiffers => false,
        }
    }

    /// The structural report, when both bodies were structured
    pub fn report(&self) -> Option<&StructuralDiffReport> {
        match self {
            BodyDifferences::Structural(report) => Some(report),
            _ => None,
        }
    }
}

/// Compare two bodies
///
/// JSON objects and arrays get a structural diff; anything else falls back to
/// exact equality.
pub fn compare_body_pair(left: &Body, right: &Body, ignore: &IgnoreRules) -> BodyDifferences {
    match (left, right) {
        (Body::Json(l), Body::Json(r)) if left.is_structured() && right.is_structured() => {
            BodyDifferences::Structural(diff(l, r, ignore))
        }
        (Body::Json(l), Body::Json(r)) if is_scalar(l) && is_scalar(r) && values_identical(l, r) => {
            BodyDifferences::Identical
        }
        (Body::Text(l), Body::Text(r)) if l == r => BodyDifferences::Identical,
        _ => BodyDifferences::ContentDiffers,
    }
}

/// Body comparison between two named endpoints
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairwiseDiff {
    pub left_endpoint: String,
    pub right_endpoint: String,
    pub differences: BodyDifferences,
}

impl PairwiseDiff {
    pub fn is_match(&self) -> bool {
        self.differences.is_match()
    }
}

/// Body comparison across every endpoint of a comparison
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BodyComparison {
    pub body_match: bool,
    pub pairs: Vec<PairwiseDiff>,
}

/// Compare the bodies of named endpoints
///
/// The first endpoint is the pivot: it is compared with each other endpoint
/// in turn, and the other endpoints are never compared with each other.
/// Bodies match when every pair matches; with fewer than two endpoints there
/// is nothing to compare and the result is a match.
pub fn compare_bodies(endpoints: &[(&str, &Body)], ignore: &IgnoreRules) -> BodyComparison {
    let Some(((pivot_name, pivot), others)) = endpoints.split_first() else {
        return BodyComparison {
            body_match: true,
            pairs: Vec::new(),
        };
    };

    let pairs: Vec<PairwiseDiff> = others
        .iter()
        .map(|(name, body)| PairwiseDiff {
            left_endpoint: pivot_name.to_string(),
            right_endpoint: name.to_string(),
            differences: compare_body_pair(pivot, body, ignore),
        })
        .collect();

    BodyComparison {
        body_match: pairs.iter().all(PairwiseDiff::is_match),
        pairs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn no_rules() -> IgnoreRules {
        IgnoreRules::none()
    }

    fn kinds(report: &StructuralDiffReport) -> Vec<(DiffKind, String)> {
        report
            .entries
            .iter()
            .map(|e| (e.kind, e.path.to_string()))
            .collect()
    }

    #[test]
    fn test_identical_trees() {
        let value = json!({"a": [1, 2, {"b": null}], "c": "x"});
        assert!(diff(&value, &value, &no_rules()).is_empty());
    }

    #[test]
    fn test_value_changed() {
        let report = diff(&json!({"a": 1}), &json!({"a": 2}), &no_rules());
        assert_eq!(report.entries.len(), 1);
        let entry = &report.entries[0];
        assert_eq!(entry.kind, DiffKind::ValueChanged);
        assert_eq!(entry.path.to_string(), "root['a']");
        assert_eq!(entry.left, Some(json!(1)));
        assert_eq!(entry.right, Some(json!(2)));
    }

    #[test]
    fn test_int_and_float_are_distinct_types() {
        let report = diff(&json!({"price": 1}), &json!({"price": 1.0}), &no_rules());
        assert_eq!(kinds(&report), vec![(DiffKind::TypeChanged, "root['price']".to_string())]);
        assert_eq!(report.entries[0].left, Some(json!(1)));
        assert_eq!(report.entries[0].right, Some(json!(1.0)));

        let report = diff(&json!({"a": 1.0}), &json!({"a": 1.5}), &no_rules());
        assert_eq!(report.entries[0].kind, DiffKind::ValueChanged);
        assert!(diff(&json!({"a": 2.5}), &json!({"a": 2.5}), &no_rules()).is_empty());
    }

    #[test]
    fn test_unordered_arrays_keep_number_kind() {
        let report = diff(&json!([1, 2]), &json!([2, 1.0]), &no_rules());
        assert_eq!(
            kinds(&report),
            vec![
                (DiffKind::ItemRemoved, "root[0]".to_string()),
                (DiffKind::ItemAdded, "root[1]".to_string()),
            ]
        );
    }

    #[test]
    fn test_scalar_bodies_keep_number_kind() {
        let pair = compare_body_pair(&Body::Json(json!(3)), &Body::Json(json!(3.0)), &no_rules());
        assert_eq!(pair, BodyDifferences::ContentDiffers);
        let pair = compare_body_pair(&Body::Json(json!(3)), &Body::Json(json!(3)), &no_rules());
        assert_eq!(pair, BodyDifferences::Identical);
    }

    #[test]
    fn test_type_changed() {
        let report = diff(&json!({"a": 1}), &json!({"a": "1"}), &no_rules());
        assert_eq!(kinds(&report), vec![(DiffKind::TypeChanged, "root['a']".to_string())]);

        let report = diff(&json!({"a": {}}), &json!({"a": []}), &no_rules());
        assert_eq!(report.entries[0].kind, DiffKind::TypeChanged);
    }

    #[test]
    fn test_added_and_removed_keys() {
        let report = diff(&json!({"a": 1, "b": 2}), &json!({"b": 2, "c": 3}), &no_rules());
        assert_eq!(
            kinds(&report),
            vec![
                (DiffKind::ItemRemoved, "root['a']".to_string()),
                (DiffKind::ItemAdded, "root['c']".to_string()),
            ]
        );
    }

    #[test]
    fn test_arrays_ignore_order() {
        let report = diff(&json!([3, 1, 2, 1]), &json!([1, 1, 2, 3]), &no_rules());
        assert!(report.is_empty());
    }

    #[test]
    fn test_array_multiset_counts() {
        let report = diff(&json!([1, 1, 2]), &json!([1, 2, 2]), &no_rules());
        assert_eq!(
            kinds(&report),
            vec![
                (DiffKind::ItemRemoved, "root[1]".to_string()),
                (DiffKind::ItemAdded, "root[2]".to_string()),
            ]
        );
    }

    #[test]
    fn test_array_objects_are_paired_by_shared_members() {
        let left = json!([{"id": 1, "name": "a"}, {"id": 2, "name": "b"}]);
        let right = json!([{"id": 2, "name": "B"}, {"id": 1, "name": "a"}]);
        let report = diff(&left, &right, &no_rules());
        assert_eq!(
            kinds(&report),
            vec![(DiffKind::ValueChanged, "root[1]['name']".to_string())]
        );
    }

    #[test]
    fn test_unrelated_objects_are_added_and_removed() {
        let report = diff(&json!([{"a": 1}]), &json!([{"b": 2}]), &no_rules());
        assert_eq!(report.count(DiffKind::ItemRemoved), 1);
        assert_eq!(report.count(DiffKind::ItemAdded), 1);
    }

    #[test]
    fn test_ignored_subtree_is_skipped_entirely() {
        let rules = IgnoreRules::parse(["meta"]).unwrap();
        let report = diff(
            &json!({"id": 1, "meta": {"a": 1}}),
            &json!({"id": 1, "meta": [1, 2, 3]}),
            &rules,
        );
        assert!(report.is_empty());

        let report = diff(&json!({"id": 1, "meta": 1}), &json!({"id": 1}), &rules);
        assert!(report.is_empty());
        assert_eq!(report.ignored_paths, vec!["meta"]);
    }

    #[test]
    fn test_ignore_rules_inside_arrays() {
        let rules = IgnoreRules::parse(["items[*].ts"]).unwrap();
        let left = json!({"items": [{"id": 1, "ts": 10}, {"id": 2, "ts": 20}]});
        let right = json!({"items": [{"id": 2, "ts": 99}, {"id": 1, "ts": 98}]});
        assert!(diff(&left, &right, &rules).is_empty());
    }

    #[test]
    fn test_grouped_view() {
        let report = diff(&json!({"a": 1, "b": 2}), &json!({"a": 2}), &no_rules());
        assert_eq!(
            report.grouped(),
            json!({
                "value_changed": [{"path": "root['a']", "left": 1, "right": 2}],
                "item_removed": [{"path": "root['b']", "left": 2}]
            })
        );
    }

    #[test]
    fn test_entry_display() {
        let report = diff(&json!({"a": 1}), &json!({}), &no_rules());
        assert_eq!(
            report.entries[0].to_string(),
            "[item_removed] root['a']: 1 -> (absent)"
        );
    }

    #[test]
    fn test_non_structured_bodies() {
        let text = Body::Text("hello".to_string());
        let other = Body::Text("world".to_string());
        let json = Body::Json(json!({"a": 1}));

        assert_eq!(compare_body_pair(&text, &text, &no_rules()), BodyDifferences::Identical);
        assert_eq!(
            compare_body_pair(&text, &other, &no_rules()),
            BodyDifferences::ContentDiffers
        );
        assert_eq!(
            compare_body_pair(&json, &text, &no_rules()),
            BodyDifferences::ContentDiffers
        );
        assert!(compare_body_pair(&Body::Json(json!(1)), &Body::Json(json!(1)), &no_rules()).is_match());
    }

    #[test]
    fn test_pivot_comparison() {
        let a = Body::Json(json!({"v": 1}));
        let b = Body::Json(json!({"v": 1}));
        let c = Body::Json(json!({"v": 2}));
        let result = compare_bodies(&[("a", &a), ("b", &b), ("c", &c)], &no_rules());

        assert!(!result.body_match);
        assert_eq!(result.pairs.len(), 2);
        assert_eq!(result.pairs[0].left_endpoint, "a");
        assert_eq!(result.pairs[0].right_endpoint, "b");
        assert!(result.pairs[0].is_match());
        assert_eq!(result.pairs[1].right_endpoint, "c");
        assert!(!result.pairs[1].is_match());
    }

    #[test]
    fn test_single_endpoint_has_nothing_to_compare() {
        let a = Body::Json(json!({}));
        let result = compare_bodies(&[("a", &a)], &no_rules());
        assert!(result.body_match);
        assert!(result.pairs.is_empty());
    }
}
