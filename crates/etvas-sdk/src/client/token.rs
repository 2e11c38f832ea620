use reqwest::Method;
use serde_json::{json, Value};

use super::EtvasClient;
use crate::error::ApiError;
use crate::request::OutboundRequest;
use crate::validation;

impl EtvasClient {
    /// Validate a customer token with the platform.
    ///
    /// Returns the platform's verification result, which carries the
    /// `contextId` the token resolves to.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` for an empty token and
    /// `ApiError::Upstream` when the platform rejects it.
    pub async fn validate_token(&self, token: &str) -> Result<Value, ApiError> {
        validation::validate_token(token, "validateToken")?;

        let request = OutboundRequest::new("/verify-token")
            .with_method(Method::POST)
            .with_json(json!({ "token": token }));

        let response = self.execute(request).await?;
        Ok(response.body)
    }
}

#[cfg(test)]
#[path = "token_tests.rs"]
mod tests;
