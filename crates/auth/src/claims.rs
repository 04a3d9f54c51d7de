//! Custom claims carried by inbound tokens.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Application claims embedded in a token, beyond the standard time fields
/// the codec validates itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Issuer claim - identifies the principal that issued the token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// Audience claim - a single string or an array of strings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<Value>,

    /// Subject claim - identifies the principal the token is about.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Remaining claims, kept for configurable identity mapping.
    #[serde(flatten)]
    pub additional: HashMap<String, Value>,
}

impl TokenClaims {
    /// Get the issuer claim.
    pub fn issuer(&self) -> Option<&str> {
        self.iss.as_deref()
    }

    /// Get the audience claim as a list of strings.
    pub fn audiences(&self) -> Vec<String> {
        match &self.aud {
            Some(Value::String(s)) => vec![s.clone()],
            Some(Value::Array(arr)) => arr.iter().filter_map(|v| v.as_str().map(String::from)).collect(),
            _ => Vec::new(),
        }
    }

    /// Check if the given audience is present in the audience claim.
    pub fn has_audience(&self, expected: &str) -> bool {
        self.audiences().iter().any(|aud| aud == expected)
    }

    /// Extract a claim value by path, supporting nested claims.
    ///
    /// Paths can be simple (e.g. `sub`) or nested (e.g. `user.name`).
    /// Numbers and booleans are rendered as strings so numeric subjects
    /// remain usable as lookup values.
    pub fn get_claim(&self, path: &str) -> Option<String> {
        match path {
            "iss" => return self.iss.clone(),
            "sub" => return self.sub.clone(),
            "aud" => return self.audiences().first().cloned(),
            _ => {}
        }

        let mut parts = path.split('.');
        let mut current = self.additional.get(parts.next()?)?;

        for part in parts {
            current = current.as_object()?.get(part)?;
        }

        match current {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}
