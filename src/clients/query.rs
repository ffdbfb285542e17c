//! Query string serialization.
//!
//! Parameters are given as a JSON object and encoded with these rules:
//!
//! - scalars: `key=value`
//! - arrays: `key[0]=a&key[1]=b`
//! - one level of nesting: `key[sub]=value` (and `key[sub][0]=...` for arrays)
//! - `null` values are dropped at every level
//! - anything nested deeper is sent as compact JSON
//!
//! Keys and values are percent-encoded; the bracket delimiters are kept
//! literal.

use serde_json::Value;

/// Serializes a JSON object into a query string (without the leading `?`).
///
/// Non-object values produce an empty string.
///
/// # Example
///
/// ```rust
/// use sellauth::clients::build_query;
/// use serde_json::json;
///
/// let query = build_query(&json!({"statuses": ["pending", "paid"]}));
/// assert_eq!(query, "statuses[0]=pending&statuses[1]=paid");
/// ```
#[must_use]
pub fn build_query(params: &Value) -> String {
    let Value::Object(map) = params else {
        return String::new();
    };

    let mut pairs: Vec<String> = Vec::new();
    for (key, value) in map {
        let key = urlencoding::encode(key);
        match value {
            Value::Null => {}
            Value::Array(items) => push_array(&mut pairs, &key, items),
            Value::Object(nested) => {
                for (sub, nested_value) in nested {
                    let nested_key = format!("{key}[{}]", urlencoding::encode(sub));
                    match nested_value {
                        Value::Null => {}
                        Value::Array(items) => push_array(&mut pairs, &nested_key, items),
                        other => push_pair(&mut pairs, &nested_key, other),
                    }
                }
            }
            other => push_pair(&mut pairs, &key, other),
        }
    }
    pairs.join("&")
}

/// Appends a query string to a URL, respecting an existing `?`.
#[must_use]
pub fn append_query(url: &str, query: &str) -> String {
    if query.is_empty() {
        return url.to_string();
    }
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}{query}")
}

fn push_array(pairs: &mut Vec<String>, key: &str, items: &[Value]) {
    for (index, item) in items.iter().enumerate() {
        if !item.is_null() {
            push_pair(pairs, &format!("{key}[{index}]"), item);
        }
    }
}

fn push_pair(pairs: &mut Vec<String>, key: &str, value: &Value) {
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    };
    pairs.push(format!("{key}={}", urlencoding::encode(&text)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde::Serialize;
    use serde_json::json;

    #[test]
    fn test_flat_scalars() {
        let query = build_query(&json!({"page": 2, "archived": false, "email": "a@b.co"}));
        let mut parts: Vec<&str> = query.split('&').collect();
        parts.sort_unstable();
        assert_eq!(parts, vec!["archived=false", "email=a%40b.co", "page=2"]);
    }

    #[test]
    fn test_arrays_use_indexed_keys() {
        let query = build_query(&json!({"statuses": ["pending", "paid"]}));
        assert_eq!(query, "statuses[0]=pending&statuses[1]=paid");
    }

    #[test]
    fn test_nested_objects_use_bracket_keys() {
        let query = build_query(&json!({"gateways": {"stripe": true, "paypal": null}}));
        assert_eq!(query, "gateways[stripe]=true");
    }

    #[test]
    fn test_nested_arrays() {
        let query = build_query(&json!({"filter": {"ids": [1, 2]}}));
        assert_eq!(query, "filter[ids][0]=1&filter[ids][1]=2");
    }

    #[test]
    fn test_nulls_are_dropped() {
        assert_eq!(build_query(&json!({"a": null, "b": [null]})), "");
    }

    #[test]
    fn test_deeper_values_are_json_encoded() {
        let query = build_query(&json!({"a": {"b": {"c": 1}}}));
        assert_eq!(query, "a[b]=%7B%22c%22%3A1%7D");
    }

    #[test]
    fn test_values_are_percent_encoded() {
        let query = build_query(&json!({"q": "a b&c"}));
        assert_eq!(query, "q=a%20b%26c");
    }

    #[test]
    fn test_dates_serialize_as_iso8601() {
        #[derive(Serialize)]
        struct Filters {
            created_at_start: chrono::DateTime<Utc>,
        }
        let filters = Filters {
            created_at_start: Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
        };
        let query = build_query(&serde_json::to_value(filters).unwrap());
        assert_eq!(query, "created_at_start=2024-01-02T03%3A04%3A05Z");
    }

    #[test]
    fn test_non_object_is_empty() {
        assert_eq!(build_query(&json!([1, 2])), "");
        assert_eq!(build_query(&Value::Null), "");
    }

    #[test]
    fn test_append_query() {
        assert_eq!(append_query("https://x/a", ""), "https://x/a");
        assert_eq!(append_query("https://x/a", "b=1"), "https://x/a?b=1");
        assert_eq!(append_query("https://x/a?z=0", "b=1"), "https://x/a?z=0&b=1");
    }
}
