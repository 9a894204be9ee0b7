use serde::Serialize;
use serde_json::Value;

/// Outline of a JSON body: its kind, size, top-level keys and first element.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayloadShape {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub length: usize,
    pub keys: Vec<String>,
    pub sample: Option<Value>,
}

impl PayloadShape {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Array(items) => Self {
                kind: "array",
                length: items.len(),
                keys: Vec::new(),
                sample: items.first().cloned(),
            },
            Value::Object(map) => Self {
                kind: "object",
                length: map.len(),
                keys: map.keys().cloned().collect(),
                sample: map.values().next().cloned(),
            },
            Value::String(_) => Self::scalar("string"),
            Value::Number(_) => Self::scalar("number"),
            Value::Bool(_) => Self::scalar("boolean"),
            Value::Null => Self::scalar("null"),
        }
    }

    fn scalar(kind: &'static str) -> Self {
        Self {
            kind,
            length: 0,
            keys: Vec::new(),
            sample: None,
        }
    }
}

/// Result of calling one upstream endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointCheck {
    pub path: String,
    /// `None` when no response arrived.
    pub status: Option<u16>,
    pub ok: bool,
    pub status_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<PayloadShape>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Upstream connectivity report. Endpoints are skipped without a credential.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCheck {
    #[serde(rename = "isAuthenticated")]
    pub authenticated: bool,
    pub conferences: Option<EndpointCheck>,
    pub sessions: Option<EndpointCheck>,
}
