use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::resolver::{AddressPair, DistanceError, DistanceResolver, ResolvedDistance};

/// Client for the external routing service:
/// `GET {base_url}/distance?from=..&to=..` answering `{ "distance_km": 21.7 }`.
pub struct HttpDistanceResolver {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<SecretString>,
}

#[derive(Debug, Deserialize)]
struct DistanceResponse {
    distance_km: f64,
}

impl HttpDistanceResolver {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<SecretString>,
        timeout_secs: u64,
    ) -> Result<Self, DistanceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|error| DistanceError::Transport(error.to_string()))?;

        Ok(Self { client, base_url: base_url.into(), api_key })
    }

    fn endpoint(&self) -> String {
        format!("{}/distance", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl DistanceResolver for HttpDistanceResolver {
    async fn resolve(&self, request: &AddressPair) -> Result<ResolvedDistance, DistanceError> {
        let mut http_request = self
            .client
            .get(self.endpoint())
            .query(&[("from", request.from.as_str()), ("to", request.to.as_str())]);
        if let Some(api_key) = &self.api_key {
            http_request = http_request.bearer_auth(api_key.expose_secret());
        }

        let response = http_request
            .send()
            .await
            .map_err(|error| DistanceError::Transport(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DistanceError::Status { status: status.as_u16() });
        }

        let payload: DistanceResponse = response
            .json()
            .await
            .map_err(|error| DistanceError::BadResponse(error.to_string()))?;

        let distance_km = Decimal::try_from(payload.distance_km)
            .map_err(|_| DistanceError::BadResponse(format!(
                "distance_km `{}` is not a representable number",
                payload.distance_km
            )))?;
        if distance_km < Decimal::ZERO {
            return Err(DistanceError::BadResponse(format!(
                "distance_km `{distance_km}` is negative"
            )));
        }

        Ok(ResolvedDistance { request: request.clone(), distance_km })
    }
}
