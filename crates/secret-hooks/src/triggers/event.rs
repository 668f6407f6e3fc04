//! Identity-directory trigger event.
//!
//! Only the fields the handlers read or write are modeled; everything else
//! the directory sends (pool id, region, caller context, …) is kept in
//! `extra` and written back untouched.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Event passed to and returned from every trigger handler.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerEvent {
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub trigger_source: String,
    #[serde(default)]
    pub request: TriggerRequest,
    #[serde(default)]
    pub response: Map<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The `request` half of a trigger event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerRequest {
    #[serde(default)]
    pub user_attributes: BTreeMap<String, String>,
    /// Verification code placeholder, present on custom-message events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_parameter: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TriggerEvent {
    pub fn new(user_name: impl Into<String>, trigger_source: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
            trigger_source: trigger_source.into(),
            ..Self::default()
        }
    }

    /// Builder-style attribute insert.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request.user_attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_code_parameter(mut self, code: impl Into<String>) -> Self {
        self.request.code_parameter = Some(code.into());
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.request.user_attributes.get(name).map(String::as_str)
    }

    /// `email` attribute, empty when absent.
    pub fn email(&self) -> &str {
        self.attribute("email").unwrap_or("")
    }

    pub fn set_response(&mut self, field: &str, value: impl Into<Value>) {
        self.response.insert(field.to_string(), value.into());
    }

    pub fn response_str(&self, field: &str) -> Option<&str> {
        self.response.get(field).and_then(Value::as_str)
    }

    pub fn from_json_str(json: &str) -> crate::Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| crate::HookError::MalformedTriggerEvent(e.to_string()))
    }
}
