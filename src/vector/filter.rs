//! Structured filter model and simple-map translation.
//!
//! The vector store natively accepts an AND/OR/NOT condition tree
//! (`must`/`should`/`must_not`). Tool callers usually pass a flat
//! field→value map instead; [`convert_filter`] translates the flat form and
//! passes an already-structured filter through unchanged. Translation never
//! fails — unconvertible shapes degrade to exact-match on the raw value.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The store's native filter: all `must` conditions AND, `should` OR,
/// `must_not` NOT.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub must: Vec<Condition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub should: Vec<Condition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub must_not: Vec<Condition>,
}

/// One field condition: either a match clause or a numeric range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r#match: Option<MatchClause>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<RangeClause>,
}

/// Exact-value or any-of matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MatchClause {
    Any { any: Vec<Value> },
    Value { value: Value },
}

/// Numeric range bounds, passed through to the store verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RangeClause {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gt: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gte: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lt: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lte: Option<f64>,
}

impl Condition {
    /// Exact-match condition.
    pub fn value(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            r#match: Some(MatchClause::Value { value: value.into() }),
            range: None,
        }
    }

    /// Any-of (OR within the field) condition.
    pub fn any(key: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            key: key.into(),
            r#match: Some(MatchClause::Any { any: values }),
            range: None,
        }
    }
}

impl Filter {
    /// A filter with a single `must` condition.
    pub fn must(condition: Condition) -> Self {
        Self {
            must: vec![condition],
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.must.is_empty() && self.should.is_empty() && self.must_not.is_empty()
    }

    /// Client-side evaluation of this filter against a payload. The
    /// production store evaluates filters server-side; this predicate backs
    /// the in-memory test store and local post-filtering.
    pub fn matches(&self, payload: &Value) -> bool {
        self.must.iter().all(|c| c.matches(payload))
            && (self.should.is_empty() || self.should.iter().any(|c| c.matches(payload)))
            && !self.must_not.iter().any(|c| c.matches(payload))
    }
}

impl Condition {
    fn matches(&self, payload: &Value) -> bool {
        let field = match lookup_path(payload, &self.key) {
            Some(v) => v,
            None => return false,
        };
        if let Some(m) = &self.r#match {
            return match m {
                MatchClause::Value { value } => field_matches_value(&field, value),
                MatchClause::Any { any } => any.iter().any(|v| field_matches_value(&field, v)),
            };
        }
        if let Some(r) = &self.range {
            let n = match field.first().and_then(Value::as_f64) {
                Some(n) => n,
                None => return false,
            };
            return r.gt.is_none_or(|b| n > b)
                && r.gte.is_none_or(|b| n >= b)
                && r.lt.is_none_or(|b| n < b)
                && r.lte.is_none_or(|b| n <= b);
        }
        false
    }
}

/// Resolve a dotted key path, fanning out across arrays (so
/// `entities.type` hits every entity). Returns all leaf values.
fn lookup_path(payload: &Value, key: &str) -> Option<Vec<Value>> {
    let mut current = vec![payload.clone()];
    for segment in key.split('.') {
        let mut next = Vec::new();
        for value in current {
            match value {
                Value::Object(map) => {
                    if let Some(v) = map.get(segment) {
                        next.push(v.clone());
                    }
                }
                Value::Array(items) => {
                    for item in items {
                        if let Some(v) = item.get(segment) {
                            next.push(v.clone());
                        }
                    }
                }
                _ => {}
            }
        }
        if next.is_empty() {
            return None;
        }
        current = next;
    }
    Some(current)
}

/// A scalar target matches equal scalars; an array field matches when it
/// contains the target.
fn field_matches_value(field: &[Value], target: &Value) -> bool {
    field.iter().any(|v| match v {
        Value::Array(items) => items.contains(target),
        other => other == target,
    })
}

/// Translate a simple field→value map into a [`Filter`].
///
/// - Empty/absent input ⇒ `None` (no filter).
/// - Top-level `must`/`should`/`must_not` keys ⇒ already structured, passed
///   through.
/// - Otherwise each pair becomes one `must` condition: arrays become any-of,
///   objects with range keywords become ranges, everything else exact-match.
///   `null` fields are skipped.
pub fn convert_filter(filter: Option<&Value>) -> Option<Filter> {
    let map = match filter {
        Some(Value::Object(map)) if !map.is_empty() => map,
        _ => return None,
    };

    const OPERATOR_KEYS: [&str; 3] = ["must", "should", "must_not"];
    if map.keys().any(|k| OPERATOR_KEYS.contains(&k.as_str())) {
        // Already in structured form. Malformed structured input degrades to
        // field-by-field translation rather than failing.
        if let Ok(parsed) = serde_json::from_value::<Filter>(Value::Object(map.clone())) {
            return Some(parsed);
        }
    }

    let mut must = Vec::new();
    for (key, value) in map {
        match value {
            Value::Null => continue,
            Value::Array(items) => must.push(Condition::any(key.clone(), items.clone())),
            Value::Object(obj) => {
                let is_range = ["gt", "gte", "lt", "lte"].iter().any(|k| obj.contains_key(*k));
                if is_range {
                    let range = RangeClause {
                        gt: obj.get("gt").and_then(Value::as_f64),
                        gte: obj.get("gte").and_then(Value::as_f64),
                        lt: obj.get("lt").and_then(Value::as_f64),
                        lte: obj.get("lte").and_then(Value::as_f64),
                    };
                    must.push(Condition {
                        key: key.clone(),
                        r#match: None,
                        range: Some(range),
                    });
                } else {
                    must.push(Condition::value(key.clone(), value.clone()));
                }
            }
            scalar => must.push(Condition::value(key.clone(), scalar.clone())),
        }
    }

    if must.is_empty() {
        None
    } else {
        Some(Filter {
            must,
            ..Filter::default()
        })
    }
}

/// User-facing filter usage guide, served by the `filter_guide` tool.
pub fn filter_guide() -> &'static str {
    r#"# Filter guide

## Simple form (recommended)

Pass a flat key-value map; it is converted to the store's native form.

| Filter | Meaning |
|--------|---------|
| `{ "category": "system" }` | category equals "system" |
| `{ "category": "system", "importance": "high" }` | both must hold (AND) |
| `{ "keywords": ["docker", "mcp"] }` | keywords contains "docker" OR "mcp" |
| `{ "chunk_count": { "gte": 3 } }` | numeric range |

Filterable fields: `category`, `sub_category`, `topic_id`, `importance`,
`keywords`, `source`, `entities.type`.

## Native form (advanced)

Use `must` (AND), `should` (OR), and `must_not` (NOT) directly:

```json
{
  "must": [{ "key": "category", "match": { "value": "system" } }],
  "should": [
    { "key": "importance", "match": { "value": "high" } },
    { "key": "importance", "match": { "value": "medium" } }
  ]
}
```

Canon search tools (`memorize`, `find`) never see lore data; lore search
tools (`recall`, `recall_find`) never see canon data."#
}

/// Error text pointing the caller at the guide when a filtered call fails.
pub fn filter_error_message(error: &str) -> String {
    format!(
        "{error}\n\nCheck that the filter is well-formed. \
         Call the 'filter_guide' tool for the accepted formats."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_and_absent_input_yield_no_filter() {
        assert_eq!(convert_filter(None), None);
        assert_eq!(convert_filter(Some(&json!({}))), None);
        assert_eq!(convert_filter(Some(&json!(null))), None);
    }

    #[test]
    fn scalar_becomes_single_must_exact_match() {
        let filter = convert_filter(Some(&json!({"category": "system"}))).unwrap();
        assert_eq!(filter.must.len(), 1);
        assert_eq!(filter.must[0], Condition::value("category", "system"));
        assert!(filter.should.is_empty());
    }

    #[test]
    fn array_becomes_any_match() {
        let filter = convert_filter(Some(&json!({"keywords": ["Docker", "MCP"]}))).unwrap();
        assert_eq!(filter.must.len(), 1);
        assert_eq!(
            filter.must[0],
            Condition::any("keywords", vec![json!("Docker"), json!("MCP")])
        );
    }

    #[test]
    fn multiple_fields_combine_with_and() {
        let filter =
            convert_filter(Some(&json!({"category": "system", "importance": "high"}))).unwrap();
        assert_eq!(filter.must.len(), 2);
    }

    #[test]
    fn range_object_becomes_range_condition() {
        let filter = convert_filter(Some(&json!({"chunk_count": {"gte": 3, "lt": 10}}))).unwrap();
        let range = filter.must[0].range.as_ref().unwrap();
        assert_eq!(range.gte, Some(3.0));
        assert_eq!(range.lt, Some(10.0));
        assert_eq!(range.gt, None);
    }

    #[test]
    fn other_object_degrades_to_exact_match() {
        let filter = convert_filter(Some(&json!({"entities": {"name": "qdrant"}}))).unwrap();
        assert_eq!(
            filter.must[0],
            Condition::value("entities", json!({"name": "qdrant"}))
        );
    }

    #[test]
    fn null_fields_are_skipped() {
        let filter = convert_filter(Some(&json!({"category": null, "importance": "low"}))).unwrap();
        assert_eq!(filter.must.len(), 1);
        assert_eq!(filter.must[0].key, "importance");

        assert_eq!(convert_filter(Some(&json!({"category": null}))), None);
    }

    #[test]
    fn structured_filter_passes_through() {
        let structured = json!({
            "must": [{"key": "category", "match": {"value": "system"}}],
            "should": [{"key": "importance", "match": {"value": "high"}}]
        });
        let filter = convert_filter(Some(&structured)).unwrap();
        assert_eq!(filter.must, vec![Condition::value("category", "system")]);
        assert_eq!(filter.should, vec![Condition::value("importance", "high")]);
    }

    #[test]
    fn matches_exact_and_array_contains() {
        let filter = Filter::must(Condition::value("category", "system"));
        assert!(filter.matches(&json!({"category": "system"})));
        assert!(!filter.matches(&json!({"category": "project"})));
        assert!(!filter.matches(&json!({})));

        let filter = Filter::must(Condition::any(
            "keywords",
            vec![json!("docker"), json!("mcp")],
        ));
        assert!(filter.matches(&json!({"keywords": ["mcp", "rust"]})));
        assert!(!filter.matches(&json!({"keywords": ["rust"]})));
    }

    #[test]
    fn matches_dotted_path_across_array() {
        let filter = Filter::must(Condition::value("entities.type", "person"));
        let payload = json!({
            "entities": [
                {"name": "ada", "type": "person"},
                {"name": "qdrant", "type": "technology"}
            ]
        });
        assert!(filter.matches(&payload));
        let filter = Filter::must(Condition::value("entities.type", "organization"));
        assert!(!filter.matches(&payload));
    }

    #[test]
    fn matches_range_and_must_not() {
        let filter = Filter {
            must: vec![Condition {
                key: "chunk_count".into(),
                r#match: None,
                range: Some(RangeClause {
                    gte: Some(2.0),
                    lt: Some(5.0),
                    ..RangeClause::default()
                }),
            }],
            must_not: vec![Condition::value("category", "hidden")],
            ..Filter::default()
        };
        assert!(filter.matches(&json!({"chunk_count": 3, "category": "system"})));
        assert!(!filter.matches(&json!({"chunk_count": 5, "category": "system"})));
        assert!(!filter.matches(&json!({"chunk_count": 3, "category": "hidden"})));
    }

    #[test]
    fn serializes_to_store_wire_shape() {
        let filter = Filter::must(Condition::any("keywords", vec![json!("a")]));
        let wire = serde_json::to_value(&filter).unwrap();
        assert_eq!(
            wire,
            json!({"must": [{"key": "keywords", "match": {"any": ["a"]}}]})
        );
    }
}
