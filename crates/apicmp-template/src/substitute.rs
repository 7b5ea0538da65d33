//! Variable substitution engine
//!
//! Substitution is textual. Inside every string of a JSON value:
//!
//! 1. each `{{uuid}}` becomes the shared identifier when one is supplied, or
//!    else a v4 UUID generated once for the whole call;
//! 2. each `{{name}}` becomes the text of `scope[name]`.
//!
//! Placeholders with no matching variable are left verbatim. Object keys are
//! never rewritten, and non-string scalars pass through unchanged.

use std::borrow::Cow;
use std::cell::OnceCell;
use std::sync::OnceLock;

use apicmp_core::{VariableScope, SHARED_ID_TOKEN};
use regex::{Captures, Regex};
use serde_json::Value;
use uuid::Uuid;

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{([^{}]+)\}\}").expect("placeholder pattern is valid"))
}

/// Generate a fresh identifier suitable for `{{uuid}}`
pub fn new_shared_id() -> String {
    Uuid::new_v4().to_string()
}

/// Text form of a JSON value as used in URLs, headers and substitutions
///
/// Strings are used verbatim; every other value uses its JSON text.
pub fn value_text(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s.as_str()),
        other => Cow::Owned(other.to_string()),
    }
}

/// Resolve placeholders in a single string
pub fn resolve_str(text: &str, scope: &VariableScope, shared_id: Option<&str>) -> String {
    Substitution::new(scope, shared_id).string(text)
}

/// Resolve placeholders recursively through a JSON value
pub fn resolve_value(value: &Value, scope: &VariableScope, shared_id: Option<&str>) -> Value {
    Substitution::new(scope, shared_id).value(value)
}

/// Names of all `{{name}}` placeholders in a string, in order of appearance
pub fn placeholders(text: &str) -> Vec<&str> {
    placeholder_re()
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect()
}

/// One substitution pass
///
/// A pass owns at most one generated identifier, so every `{{uuid}}` it
/// expands without a supplied shared id gets the same value.
pub(crate) struct Substitution<'a> {
    scope: &'a VariableScope,
    shared_id: Option<&'a str>,
    generated: OnceCell<String>,
}

impl<'a> Substitution<'a> {
    pub(crate) fn new(scope: &'a VariableScope, shared_id: Option<&'a str>) -> Self {
        Self {
            scope,
            shared_id,
            generated: OnceCell::new(),
        }
    }

    fn id(&self) -> &str {
        match self.shared_id {
            Some(id) => id,
            None => self.generated.get_or_init(new_shared_id).as_str(),
        }
    }

    pub(crate) fn string(&self, text: &str) -> String {
        let text: Cow<'_, str> = if text.contains(SHARED_ID_TOKEN) {
            Cow::Owned(text.replace(SHARED_ID_TOKEN, self.id()))
        } else {
            Cow::Borrowed(text)
        };

        if !text.contains("{{") {
            return text.into_owned();
        }

        placeholder_re()
            .replace_all(&text, |caps: &Captures<'_>| match self.scope.text(&caps[1]) {
                Some(replacement) => replacement.into_owned(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }

    pub(crate) fn value(&self, value: &Value) -> Value {
        match value {
            Value::String(s) => Value::String(self.string(s)),
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), self.value(v)))
                    .collect(),
            ),
            Value::Array(items) => Value::Array(items.iter().map(|v| self.value(v)).collect()),
            other => other.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scope() -> VariableScope {
        VariableScope::new()
            .with("user_id", "42")
            .with("port", 8080)
            .with("token", "abc")
    }

    #[test]
    fn test_simple_placeholder() {
        assert_eq!(resolve_str("/users/{{user_id}}", &scope(), None), "/users/42");
    }

    #[test]
    fn test_non_string_variable_uses_json_text() {
        assert_eq!(resolve_str("port={{port}}", &scope(), None), "port=8080");
    }

    #[test]
    fn test_unknown_placeholder_left_verbatim() {
        assert_eq!(
            resolve_str("{{missing}}/{{user_id}}", &scope(), None),
            "{{missing}}/42"
        );
    }

    #[test]
    fn test_shared_id_replaces_every_token() {
        let out = resolve_str("{{uuid}}-{{uuid}}", &scope(), Some("fixed"));
        assert_eq!(out, "fixed-fixed");
    }

    #[test]
    fn test_generated_id_is_shared_within_one_call() {
        let out = resolve_value(&json!({"a": "{{uuid}}", "b": ["{{uuid}}"]}), &scope(), None);
        let a = out["a"].as_str().unwrap();
        let b = out["b"][0].as_str().unwrap();
        assert_eq!(a, b);
        assert!(Uuid::parse_str(a).is_ok());
    }

    #[test]
    fn test_generated_id_differs_between_calls() {
        let first = resolve_str("{{uuid}}", &scope(), None);
        let second = resolve_str("{{uuid}}", &scope(), None);
        assert_ne!(first, second);
    }

    #[test]
    fn test_reserved_token_wins_over_scope_entry() {
        let scope = scope().with("uuid", "from-scope");
        assert_eq!(resolve_str("{{uuid}}", &scope, Some("shared")), "shared");
    }

    #[test]
    fn test_nested_values() {
        let value = json!({
            "user": "{{user_id}}",
            "count": 3,
            "flags": [true, null, "{{token}}"],
            "{{token}}": "key stays"
        });
        let out = resolve_value(&value, &scope(), None);
        assert_eq!(
            out,
            json!({
                "user": "42",
                "count": 3,
                "flags": [true, null, "abc"],
                "{{token}}": "key stays"
            })
        );
    }

    #[test]
    fn test_single_pass_does_not_reexpand() {
        let scope = VariableScope::new().with("a", "{{b}}").with("b", "x");
        assert_eq!(resolve_str("{{a}}", &scope, None), "{{b}}");
    }

    #[test]
    fn test_placeholders_lists_names() {
        assert_eq!(placeholders("{{a}}/{x}/{{b c}}"), vec!["a", "b c"]);
    }
}
