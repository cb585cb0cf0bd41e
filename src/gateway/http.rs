use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

use super::{GatewayError, LogPerformance, ProgramGateway};
use crate::models::{DaySelector, Program, ProgramDay, TransitionOptions, Workout};

#[derive(Debug, Clone)]
pub struct HttpGatewayConfig {
    /// Base URL of the program service, without the `/api` suffix.
    pub base_url: String,
    pub token: Option<String>,
    pub timeout: Duration,
}

impl Default for HttpGatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3000".to_string(),
            token: None,
            timeout: Duration::from_secs(30),
        }
    }
}

/// JSON-over-HTTP client for a remote program service.
pub struct HttpGateway {
    config: HttpGatewayConfig,
    client: Client,
}

impl HttpGateway {
    pub fn new(config: HttpGatewayConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::Network(e.to_string()))?;
        Ok(Self { config, client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response, GatewayError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        Err(match status {
            StatusCode::NOT_FOUND => GatewayError::NotFound(message),
            StatusCode::BAD_REQUEST | StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
                GatewayError::Validation(message)
            }
            _ => GatewayError::Api {
                status: status.as_u16(),
                message,
            },
        })
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        what: &'static str,
    ) -> Result<T, GatewayError> {
        let response = self.send(request).await?;
        let text = response
            .text()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;
        serde_json::from_str(&text).map_err(|e| GatewayError::Decode {
            what,
            message: e.to_string(),
        })
    }

    async fn transition(
        &self,
        program_id: &str,
        template_id: &str,
        action: &str,
        body: serde_json::Value,
    ) -> Result<(), GatewayError> {
        let url = self.url(&format!(
            "/programs/{}/templates/{}/{}",
            program_id, template_id, action
        ));
        tracing::debug!("POST {}", url);
        self.send(self.client.post(&url).json(&body)).await?;
        Ok(())
    }
}

fn to_body<T: serde::Serialize>(value: &T) -> Result<serde_json::Value, GatewayError> {
    serde_json::to_value(value).map_err(|e| GatewayError::Decode {
        what: "request body",
        message: e.to_string(),
    })
}

#[async_trait]
impl ProgramGateway for HttpGateway {
    async fn load_program(&self, program_id: &str) -> Result<Program, GatewayError> {
        let url = self.url(&format!("/programs/{}", program_id));
        self.fetch(self.client.get(&url), "program").await
    }

    async fn load_workout_templates(
        &self,
        program_id: &str,
        selector: DaySelector,
    ) -> Result<ProgramDay, GatewayError> {
        let url = self.url(&format!("/programs/{}/templates", program_id));
        let request = self.client.get(&url).query(&selector.query_pairs());
        self.fetch(request, "program day").await
    }

    async fn log_workout_from_template(
        &self,
        program_id: &str,
        template_id: &str,
        performance: &LogPerformance,
        options: &TransitionOptions,
    ) -> Result<(), GatewayError> {
        let mut body = to_body(options)?;
        if let serde_json::Value::Object(map) = &mut body {
            map.insert(
                "userPerformance".to_string(),
                serde_json::Value::String(performance.user_performance.clone()),
            );
        }
        self.transition(program_id, template_id, "log", body).await
    }

    async fn skip_workout_template(
        &self,
        program_id: &str,
        template_id: &str,
        options: &TransitionOptions,
    ) -> Result<(), GatewayError> {
        self.transition(program_id, template_id, "skip", to_body(options)?)
            .await
    }

    async fn unskip_workout_template(
        &self,
        program_id: &str,
        template_id: &str,
        options: &TransitionOptions,
    ) -> Result<(), GatewayError> {
        self.transition(program_id, template_id, "unskip", to_body(options)?)
            .await
    }

    async fn load_workout(&self, workout_id: &str) -> Result<Workout, GatewayError> {
        let url = self.url(&format!("/workouts/{}", workout_id));
        self.fetch(self.client.get(&url), "workout").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_base_and_api_prefix() {
        let gateway = HttpGateway::new(HttpGatewayConfig {
            base_url: "http://example.test/".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            gateway.url("/programs/p1"),
            "http://example.test/api/programs/p1"
        );
    }
}
