use chrono::{DateTime, Utc};
use serde::Serialize;

use super::meal_analysis::truncate;

const PROBE_BODY_LIMIT: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProbeMethod {
    Get,
    Post,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum ProbeResult {
    Responded { status: u16, body: Option<String> },
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct ProbeOutcome {
    pub endpoint: String,
    pub method: ProbeMethod,
    pub result: ProbeResult,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConnectivityReport {
    pub checked_at: DateTime<Utc>,
    pub outcomes: Vec<ProbeOutcome>,
}

impl ConnectivityReport {
    pub fn reachable_endpoints(&self) -> Vec<&str> {
        let mut reachable: Vec<&str> = Vec::new();
        for outcome in &self.outcomes {
            if matches!(outcome.result, ProbeResult::Responded { .. })
                && !reachable.contains(&outcome.endpoint.as_str())
            {
                reachable.push(&outcome.endpoint);
            }
        }
        reachable
    }
}

/// Side-channel diagnostic: hits each endpoint with a GET and a test POST.
pub struct ConnectivityProbe {
    endpoints: Vec<String>,
    client: reqwest::Client,
}

impl ConnectivityProbe {
    pub fn new(endpoints: Vec<String>, client: reqwest::Client) -> Self {
        Self { endpoints, client }
    }

    pub async fn run(&self) -> ConnectivityReport {
        log::info!("🧪 Testing webhook connectivity ({} endpoints)...", self.endpoints.len());

        let mut outcomes = Vec::with_capacity(self.endpoints.len() * 2);
        for endpoint in &self.endpoints {
            outcomes.push(self.probe_get(endpoint).await);
            outcomes.push(self.probe_post(endpoint).await);
        }

        ConnectivityReport {
            checked_at: Utc::now(),
            outcomes,
        }
    }

    async fn probe_get(&self, endpoint: &str) -> ProbeOutcome {
        log::info!("Testing: GET {}", endpoint);

        let result = match self
            .client
            .get(endpoint)
            .header("Accept", "application/json")
            .send()
            .await
        {
            Ok(response) => {
                log::info!("✅ GET {} responded with status: {}", endpoint, response.status());
                ProbeResult::Responded {
                    status: response.status().as_u16(),
                    body: None,
                }
            }
            Err(e) => {
                log::warn!("❌ GET {} failed: {}", endpoint, e);
                ProbeResult::Failed { error: e.to_string() }
            }
        };

        ProbeOutcome {
            endpoint: endpoint.to_string(),
            method: ProbeMethod::Get,
            result,
        }
    }

    async fn probe_post(&self, endpoint: &str) -> ProbeOutcome {
        log::info!("Testing: POST {}", endpoint);

        let result = match self
            .client
            .post(endpoint)
            .json(&serde_json::json!({ "test": "data" }))
            .send()
            .await
        {
            Ok(response) => {
                let status = response.status();
                log::info!("✅ POST {} responded with status: {}", endpoint, status);
                let body = match response.text().await {
                    Ok(text) => truncate(&text, PROBE_BODY_LIMIT).to_string(),
                    Err(e) => format!("<unreadable body: {}>", e),
                };
                log::debug!("Response: {}", body);
                ProbeResult::Responded {
                    status: status.as_u16(),
                    body: Some(body),
                }
            }
            Err(e) => {
                log::warn!("❌ POST {} failed: {}", endpoint, e);
                ProbeResult::Failed { error: e.to_string() }
            }
        };

        ProbeOutcome {
            endpoint: endpoint.to_string(),
            method: ProbeMethod::Post,
            result,
        }
    }
}
