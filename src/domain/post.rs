use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A post in the uniform shape produced by the normalizer.
///
/// `file_url` is never empty. Every field of the source record other than the
/// three normalized ones is kept in `fields` untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub file_url: String,
    pub preview_url: String,
    pub score: i64,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Post {
    /// The post id as display text, whether the API sent it as a number or a string.
    pub fn id(&self) -> Option<String> {
        match self.fields.get("id")? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn display_id(&self) -> String {
        self.id().unwrap_or_else(|| "N/A".to_string())
    }

    pub fn field_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    /// Flatten back into a single JSON object.
    pub fn to_value(&self) -> Value {
        let mut map = self.fields.clone();
        map.insert("file_url".into(), Value::String(self.file_url.clone()));
        map.insert("preview_url".into(), Value::String(self.preview_url.clone()));
        map.insert("score".into(), Value::from(self.score));
        Value::Object(map)
    }
}
