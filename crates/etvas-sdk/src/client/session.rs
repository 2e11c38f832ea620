use std::fmt;

use serde_json::Value;

use super::EtvasClient;
use crate::error::ApiError;
use crate::validation::validate_token;

/// Platform calls on behalf of one customer token.
///
/// The token is validated once and the result cached on the client for the
/// configured token TTL; every call resolves the context id from it.
#[derive(Clone)]
pub struct TokenSession<'a> {
    client: &'a EtvasClient,
    token: String,
}

impl<'a> TokenSession<'a> {
    pub(crate) fn new(client: &'a EtvasClient, token: String) -> Self {
        Self { client, token }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Token validation result, served from the cache when fresh.
    pub async fn validate(&self) -> Result<Value, ApiError> {
        validate_token(&self.token, "validateToken")?;

        let cache_key = format!("token:{}", self.token);
        self.client
            .token_cache()
            .read(&cache_key, || self.client.validate_token(&self.token))
            .await
    }

    /// Context id the token resolves to.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidContext` when the validation result has no
    /// `contextId`.
    pub async fn context_id(&self) -> Result<String, ApiError> {
        let validation = self.validate().await?;
        validation
            .get("contextId")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .ok_or(ApiError::InvalidContext)
    }

    /// Profile of the customer behind the token.
    pub async fn customer_profile(&self) -> Result<Option<Value>, ApiError> {
        let context_id = self.context_id().await?;
        self.client.get_profile(&context_id).await
    }

    /// Purchase details for the token's context.
    pub async fn purchase<K, V>(&self, params: &[(K, V)]) -> Result<Option<Value>, ApiError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let context_id = self.context_id().await?;
        self.client.get_purchase(&context_id, params).await
    }

    /// Data stored for the token's context.
    pub async fn read(&self) -> Result<Option<Value>, ApiError> {
        let context_id = self.context_id().await?;
        self.client.read_data(&context_id).await
    }

    /// Store (or with `None`, delete) data for the token's context.
    pub async fn write(&self, value: Option<Value>) -> Result<bool, ApiError> {
        let context_id = self.context_id().await?;
        self.client.write_data(&context_id, value).await
    }
}

impl fmt::Debug for TokenSession<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSession")
            .field("token", &"<REDACTED>")
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
