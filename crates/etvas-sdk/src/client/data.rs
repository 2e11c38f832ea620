use reqwest::Method;
use serde_json::{json, Value};
use tracing::warn;

use super::{is_truthy, EtvasClient};
use crate::error::ApiError;
use crate::request::OutboundRequest;
use crate::signing::encode_uri_component;
use crate::validation::validate_key;

fn external_data_url(key: &str) -> String {
    format!("/external-data/{}", encode_uri_component(key))
}

impl EtvasClient {
    /// Read a value stored under `key`.
    ///
    /// Values are stored as JSON text. Text that does not parse is returned
    /// as a JSON string. Returns `None` when nothing is stored.
    pub async fn read_data(&self, key: &str) -> Result<Option<Value>, ApiError> {
        validate_key(key, "readData")?;

        let response = self.execute(OutboundRequest::new(external_data_url(key))).await?;

        let stored = match response.body.get("data") {
            Some(stored) if is_truthy(stored) => stored.clone(),
            _ => return Ok(None),
        };

        match stored {
            Value::String(text) => match serde_json::from_str(&text) {
                Ok(value) => Ok(Some(value)),
                Err(_) => {
                    warn!(key = %key, "Saved data is not in JSON format");
                    Ok(Some(Value::String(text)))
                }
            },
            other => Ok(Some(other)),
        }
    }

    /// Store `value` under `key`, or delete the key when `value` is `None`
    /// or JSON `null`.
    ///
    /// Returns whether the platform answered with data.
    pub async fn write_data(&self, key: &str, value: Option<Value>) -> Result<bool, ApiError> {
        validate_key(key, "writeData")?;

        let url = external_data_url(key);
        let request = match value.filter(|v| !v.is_null()) {
            Some(value) => OutboundRequest::new(url)
                .with_method(Method::PUT)
                .with_json(json!({ "data": value.to_string() })),
            None => OutboundRequest::new(url).with_method(Method::DELETE),
        };

        let response = self.execute(request).await?;
        Ok(is_truthy(&response.body))
    }
}

#[cfg(test)]
#[path = "data_tests.rs"]
mod tests;
