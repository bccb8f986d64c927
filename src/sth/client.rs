use reqwest::{Client, StatusCode};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::sth::models::{SensorSample, SthResponse};

pub struct SthClient {
    http_client: Client,
    base_url: String,
    fiware_service: String,
    fiware_servicepath: String,
}

impl SthClient {
    /// Build a client for the STH instance named in `config`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Internal` if the HTTP client cannot be constructed.
    pub fn new(config: &Config) -> AppResult<Self> {
        let http_client = Client::builder()
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            base_url: config.sth_base_url(),
            fiware_service: config.fiware_service.clone(),
            fiware_servicepath: config.fiware_servicepath.clone(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn history_url(
        &self,
        entity_type: &str,
        entity_id: &str,
        attribute: &str,
        last_n: u32,
    ) -> String {
        format!(
            "{}/STH/v1/contextEntities/type/{}/id/{}/attributes/{}?lastN={}",
            self.base_url, entity_type, entity_id, attribute, last_n
        )
    }

    /// Fetch the last `last_n` samples of one attribute.
    ///
    /// Never fails: transport errors, non-200 statuses and unexpected response
    /// shapes are logged and reported as "no samples".
    pub async fn fetch(
        &self,
        entity_type: &str,
        entity_id: &str,
        attribute: &str,
        last_n: u32,
    ) -> Vec<SensorSample> {
        match self
            .try_fetch(entity_type, entity_id, attribute, last_n)
            .await
        {
            Ok(samples) => samples,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    entity_id,
                    attribute,
                    "STH fetch returned no samples"
                );
                Vec::new()
            }
        }
    }

    /// Fetch the last `last_n` samples of one attribute, surfacing failures.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Sth` if the request fails, the status is not 200, or the
    /// body lacks `contextResponses[0].contextElement.attributes[0].values`.
    pub async fn try_fetch(
        &self,
        entity_type: &str,
        entity_id: &str,
        attribute: &str,
        last_n: u32,
    ) -> AppResult<Vec<SensorSample>> {
        let url = self.history_url(entity_type, entity_id, attribute, last_n);

        let response = self
            .http_client
            .get(&url)
            .header("fiware-service", &self.fiware_service)
            .header("fiware-servicepath", &self.fiware_servicepath)
            .send()
            .await
            .map_err(|e| AppError::Sth(format!("Request to {url} failed: {e}")))?;

        // Only 200 carries history; 202/204 and friends have no usable body
        let status = response.status();
        if status != StatusCode::OK {
            return Err(AppError::Sth(format!("Error accessing {url}: HTTP {status}")));
        }

        let text = response
            .text()
            .await
            .map_err(|e| AppError::Sth(format!("Failed to get response text: {e}")))?;

        let parsed: SthResponse = serde_json::from_str(&text).map_err(|e| {
            tracing::debug!(
                error = %e,
                body_preview = %text.chars().take(500).collect::<String>(),
                "Failed to parse STH response"
            );
            AppError::Sth(format!("Malformed response from {url}: {e}"))
        })?;

        let samples = parsed
            .into_values()
            .ok_or_else(|| AppError::Sth(format!("No attribute values in response from {url}")))?;

        tracing::debug!(entity_id, attribute, count = samples.len(), "Fetched STH samples");
        Ok(samples)
    }
}
