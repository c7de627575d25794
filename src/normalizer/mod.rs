use serde_json::{Map, Value};

use crate::domain::Post;
use crate::response::Payload;

const ENVELOPE_KEYS: [&str; 2] = ["posts", "post"];
const ATTRIBUTE_KEYS: [&str; 2] = ["@attributes", "attributes"];

/// Records pulled out of whatever envelope the API chose to send.
#[derive(Debug, Clone, PartialEq)]
pub enum Records {
    List(Vec<Map<String, Value>>),
    Empty,
}

impl Records {
    pub fn extract(payload: &Payload) -> Self {
        let Payload::Data(value) = payload else {
            return Records::Empty;
        };

        match value {
            Value::Array(items) => Self::from_items(items),
            Value::Object(map) => ENVELOPE_KEYS
                .iter()
                .find_map(|key| match map.get(*key) {
                    Some(Value::Array(items)) => Some(Self::from_items(items)),
                    Some(Value::Object(record)) => Some(Records::List(vec![record.clone()])),
                    _ => None,
                })
                .unwrap_or(Records::Empty),
            _ => Records::Empty,
        }
    }

    fn from_items(items: &[Value]) -> Self {
        let records: Vec<_> = items
            .iter()
            .filter_map(|item| item.as_object().cloned())
            .collect();

        if records.is_empty() {
            Records::Empty
        } else {
            Records::List(records)
        }
    }

    pub fn into_vec(self) -> Vec<Map<String, Value>> {
        match self {
            Records::List(records) => records,
            Records::Empty => Vec::new(),
        }
    }
}

#[derive(Clone)]
pub struct Normalizer;

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    pub fn normalize(&self, payload: &Payload) -> Vec<Post> {
        Records::extract(payload)
            .into_vec()
            .into_iter()
            .filter_map(|record| self.normalize_record(record))
            .collect()
    }

    /// Reshape a single record, or `None` when it has no usable image URL.
    pub fn normalize_record(&self, record: Map<String, Value>) -> Option<Post> {
        let mut fields = flatten_attributes(record);

        let has_full_source = fields.contains_key("file_url") || fields.contains_key("sample_url");
        let file_url = first_non_empty(&fields, &["file_url", "sample_url"]).or_else(|| {
            if has_full_source {
                first_non_empty(&fields, &["preview_url"])
            } else {
                None
            }
        })?;

        let preview_url =
            first_non_empty(&fields, &["preview_url", "sample_url"]).unwrap_or_else(|| file_url.clone());

        let score = parse_score(fields.get("score"));

        fields.remove("file_url");
        fields.remove("preview_url");
        fields.remove("score");

        Some(Post {
            file_url,
            preview_url,
            score,
            fields,
        })
    }
}

/// Merge a nested attributes object over the record, attributes winning.
fn flatten_attributes(mut record: Map<String, Value>) -> Map<String, Value> {
    for key in ATTRIBUTE_KEYS {
        if matches!(record.get(key), Some(Value::Object(_))) {
            if let Some(Value::Object(attributes)) = record.remove(key) {
                record.extend(attributes);
            }
            break;
        }
    }
    record
}

fn first_non_empty(fields: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        fields
            .get(*key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
    })
}

fn parse_score(raw: Option<&Value>) -> i64 {
    match raw {
        None | Some(Value::Null) => 0,
        Some(Value::Number(n)) => {
            if let Some(i) = n.as_i64() {
                i
            } else if let Some(f) = n.as_f64().filter(|f| f.is_finite()) {
                f.trunc() as i64
            } else {
                0
            }
        }
        Some(Value::String(s)) => parse_leading_int(s).unwrap_or(0),
        Some(_) => 0,
    }
}

/// Base-10 parse of a leading integer, ignoring surrounding whitespace and any
/// trailing garbage ("12px" is 12).
fn parse_leading_int(s: &str) -> Option<i64> {
    let s = s.trim();
    let (negative, sign_len) = match s.as_bytes().first() {
        Some(b'-') => (true, 1),
        Some(b'+') => (false, 1),
        _ => (false, 0),
    };

    let digits = s[sign_len..]
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(s.len() - sign_len);
    if digits == 0 {
        return None;
    }

    // Out of range saturates towards the sign.
    let saturated = if negative { i64::MIN } else { i64::MAX };
    Some(s[..sign_len + digits].parse().unwrap_or(saturated))
}
