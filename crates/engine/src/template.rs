//! Template resolution — `{{path}}` references against a context map.
//!
//! Resolution is total: any input yields some output, and references that
//! cannot be resolved pass through verbatim. Substituted content is never
//! rescanned, which is what makes resolution idempotent over ordinary
//! context values.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_json::{Map, Value};

// First segment is an identifier; later segments may also be list indexes.
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{([A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z0-9_]+)*)\}\}")
        .unwrap()
});

/// Resolve every `{{path}}` placeholder in `template` against `context`.
pub fn resolve_str(template: &str, context: &Map<String, Value>) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| match lookup(&caps[1], context) {
            Some(value) => stringify(value),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Resolve templates recursively over a structured configuration value.
///
/// Every string leaf is resolved; non-string leaves are returned unchanged.
/// Resolved values are not introspected for further templates.
pub fn resolve_value(config: &Value, context: &Map<String, Value>) -> Value {
    match config {
        Value::String(s) => Value::String(resolve_str(s, context)),
        Value::Array(items) => Value::Array(
            items.iter().map(|item| resolve_value(item, context)).collect(),
        ),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, value)| (key.clone(), resolve_value(value, context)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Walk a dot-separated path through the context. `None` leaves the
/// placeholder untouched.
fn lookup<'a>(path: &str, context: &'a Map<String, Value>) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = context.get(segments.next()?)?;

    for segment in segments {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }

    Some(current)
}

/// The text form a resolved value takes inside the surrounding string.
fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        // Maps and lists substitute their compact JSON form; serde_json
        // object keys are ordered, so the form is canonical.
        structured => structured.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn context(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("context fixture must be an object"),
        }
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(resolve_str("no templates here", &Map::new()), "no templates here");
    }

    #[test]
    fn top_level_reference_is_substituted() {
        let ctx = context(json!({ "topic": "rust" }));
        assert_eq!(resolve_str("about {{topic}}!", &ctx), "about rust!");
    }

    #[test]
    fn dotted_path_walks_into_maps() {
        let ctx = context(json!({ "a": { "b": { "c": 7 } } }));
        assert_eq!(resolve_str("{{a.b.c}}", &ctx), "7");
    }

    #[test]
    fn numeric_segment_indexes_into_lists() {
        let ctx = context(json!({ "items": ["x", "y", "z"] }));
        assert_eq!(resolve_str("{{items.1}}", &ctx), "y");
        // Out of range: untouched.
        assert_eq!(resolve_str("{{items.9}}", &ctx), "{{items.9}}");
    }

    #[test]
    fn missing_reference_passes_through_verbatim() {
        assert_eq!(
            resolve_str("{{missing.key}}", &Map::new()),
            "{{missing.key}}"
        );
    }

    #[test]
    fn partial_path_through_a_scalar_passes_through() {
        let ctx = context(json!({ "n": 5 }));
        assert_eq!(resolve_str("{{n.deeper}}", &ctx), "{{n.deeper}}");
    }

    #[test]
    fn scalar_substitution_forms() {
        let ctx = context(json!({ "s": "txt", "n": 4.5, "b": true, "nil": null }));
        assert_eq!(resolve_str("{{s}}/{{n}}/{{b}}/({{nil}})", &ctx), "txt/4.5/true/()");
    }

    #[test]
    fn structured_values_substitute_as_json() {
        let ctx = context(json!({ "m": { "k": [1, 2] } }));
        assert_eq!(resolve_str("v={{m}}", &ctx), r#"v={"k":[1,2]}"#);
    }

    #[test]
    fn several_placeholders_in_one_string() {
        let ctx = context(json!({ "l": "42", "u": "42" }));
        assert_eq!(resolve_str("{{l}}|{{u}}", &ctx), "42|42");
    }

    #[test]
    fn resolution_is_idempotent() {
        let ctx = context(json!({ "a": "A", "deep": { "n": [1, { "b": "B" }] } }));
        for template in ["{{a}}-{{deep.n.1.b}}", "{{missing}}", "{{a.too.far}}"] {
            let once = resolve_str(template, &ctx);
            assert_eq!(resolve_str(&once, &ctx), once);
        }
    }

    #[test]
    fn config_resolution_recurses_but_keeps_non_string_leaves() {
        let ctx = context(json!({ "who": "world" }));
        let config = json!({
            "greeting": "hello {{who}}",
            "count": 3,
            "nested": { "inner": ["{{who}}", false] }
        });
        assert_eq!(
            resolve_value(&config, &ctx),
            json!({
                "greeting": "hello world",
                "count": 3,
                "nested": { "inner": ["world", false] }
            })
        );
    }

    #[test]
    fn resolved_content_is_not_rescanned() {
        // `wrapped` resolves to text that *looks* like a template; a single
        // resolve pass must leave that text alone.
        let ctx = context(json!({ "wrapped": "{{inner}}", "inner": "surprise" }));
        assert_eq!(resolve_str("{{wrapped}}", &ctx), "{{inner}}");
    }
}
