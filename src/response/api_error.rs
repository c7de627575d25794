use std::fmt;

use serde_json::Value;

use crate::response::Payload;

/// The API explicitly refused the query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRejection {
    pub reason: Option<String>,
}

impl fmt::Display for ApiRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            Some(reason) => write!(f, "API rejected the request: {}", reason),
            None => f.write_str("API rejected the request"),
        }
    }
}

/// Look for a `success` flag set to false (or 0) in an object payload.
pub fn detect_api_error(payload: &Payload) -> Option<ApiRejection> {
    let Payload::Data(Value::Object(map)) = payload else {
        return None;
    };

    let indicator = match map.get("success") {
        None | Some(Value::Null) => return None,
        Some(Value::String(s)) => s.trim().to_lowercase(),
        // 0, 0.0 and -0.0 all read as "0"
        Some(Value::Number(n)) if n.as_f64() == Some(0.0) => "0".to_string(),
        Some(other) => other.to_string().trim().to_lowercase(),
    };

    if indicator != "false" && indicator != "0" {
        return None;
    }

    let reason = ["message", "reason", "error"].iter().find_map(|key| {
        map.get(*key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
    });

    Some(ApiRejection { reason })
}
