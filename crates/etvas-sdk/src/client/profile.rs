use serde_json::{Map, Value};

use super::{is_truthy, EtvasClient};
use crate::error::ApiError;
use crate::request::OutboundRequest;
use crate::signing::{query_string, CONTEXT_HEADER};
use crate::validation::validate_context_id;

impl EtvasClient {
    /// Fetch the customer profile for a context.
    ///
    /// The profile comes back with `contextId` merged in, or `None` when the
    /// platform returns no data.
    pub async fn get_profile(&self, context_id: &str) -> Result<Option<Value>, ApiError> {
        validate_context_id(context_id, "getCustomerProfile")?;

        let request = OutboundRequest::new("/user/profile").with_header(CONTEXT_HEADER, context_id);
        let response = self.execute(request).await?;

        Ok(with_context(context_id, response.body))
    }

    /// Fetch purchase details for a context.
    ///
    /// `params` are appended to the path as a query string, in order.
    pub async fn get_purchase<K, V>(
        &self,
        context_id: &str,
        params: &[(K, V)],
    ) -> Result<Option<Value>, ApiError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        validate_context_id(context_id, "getPurchaseDetails")?;

        let url = format!("/purchase{}", query_string(params));
        let request = OutboundRequest::new(url).with_header(CONTEXT_HEADER, context_id);
        let response = self.execute(request).await?;

        Ok(with_context(context_id, response.body))
    }
}

/// Merge `contextId` into a response object. Fields from the response win.
///
/// Non-object data is returned unchanged; empty data yields `None`.
fn with_context(context_id: &str, data: Value) -> Option<Value> {
    if !is_truthy(&data) {
        return None;
    }

    match data {
        Value::Object(fields) => {
            let mut merged = Map::new();
            merged.insert("contextId".to_string(), Value::String(context_id.to_string()));
            merged.extend(fields);
            Some(Value::Object(merged))
        }
        other => Some(other),
    }
}

#[cfg(test)]
#[path = "profile_tests.rs"]
mod tests;
