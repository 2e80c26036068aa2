use std::time::Duration;

use anyhow::Result;
use reqwest::multipart::{Form, Part};
use serde::Serialize;

use super::fallback::{delayed_canned_result, DEFAULT_FALLBACK_DELAY};
use super::normalizer::normalize_body;
use super::strategy::{Attempt, Encoding, StrategyPlan};
use super::MealAnalyzer;
use crate::config::AppConfig;
use crate::error::AttemptError;
use crate::models::{AnalysisRequest, AnalysisResult, ClientConfiguration};

const LOG_BODY_LIMIT: usize = 500;

/// Per-request timeout; a silent endpoint fails its attempt instead of stalling the plan.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

fn build_http_client(timeout: Duration) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}

/// Where the returned result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ResultSource {
    /// Attempt with this zero-based index succeeded.
    Live { attempt: usize },
    /// Offline mode was requested, no network call was made.
    Offline,
    /// Every attempt failed; canned data substituted.
    Fallback,
}

/// Diagnostic record of one executed attempt.
#[derive(Debug, Clone, Serialize)]
pub struct AttemptRecord {
    pub index: usize,
    pub endpoint: String,
    pub encoding: String,
    pub succeeded: bool,
    /// `None` on success, otherwise the rejection reason.
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisOutcome {
    pub result: AnalysisResult,
    pub source: ResultSource,
    pub attempts: Vec<AttemptRecord>,
}

/// Webhook client that walks a [`StrategyPlan`] until one attempt yields a
/// valid analysis, substituting canned data when none does.
pub struct MealAnalysisClient {
    plan: StrategyPlan,
    fallback_delay: Duration,
    client: reqwest::Client,
}

impl MealAnalysisClient {
    pub fn new(plan: StrategyPlan) -> Result<Self> {
        Ok(Self {
            plan,
            fallback_delay: DEFAULT_FALLBACK_DELAY,
            client: build_http_client(DEFAULT_REQUEST_TIMEOUT)?,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Ok(Self {
            plan: config.strategy_plan(),
            fallback_delay: config.fallback_delay,
            client: build_http_client(config.request_timeout)?,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = build_http_client(timeout)?;
        Ok(self)
    }

    pub fn with_fallback_delay(mut self, delay: Duration) -> Self {
        self.fallback_delay = delay;
        self
    }

    pub fn plan(&self) -> &StrategyPlan {
        &self.plan
    }

    pub fn http_client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Like [`MealAnalyzer::analyze`] but also reports which attempts ran.
    pub async fn analyze_with_report(
        &self,
        request: &AnalysisRequest,
        config: &ClientConfiguration,
    ) -> AnalysisOutcome {
        log::info!(
            "🔄 Starting image analysis: name={} size={} bytes type={}",
            request.file_name(),
            request.len(),
            request.media_type()
        );

        if config.use_offline_fallback {
            log::info!("🧪 Offline mode enabled, using sample data");
            return AnalysisOutcome {
                result: delayed_canned_result(self.fallback_delay).await,
                source: ResultSource::Offline,
                attempts: Vec::new(),
            };
        }

        let total = self.plan.len();
        let mut records = Vec::new();

        for (index, attempt) in self.plan.attempts().iter().enumerate() {
            log::info!(
                "🎯 Attempt {}/{}: {} via {}",
                index + 1,
                total,
                attempt.endpoint,
                attempt.encoding
            );

            match self.run_attempt(attempt, request).await {
                Ok(result) => {
                    log::info!("✅ Success on attempt {}", index + 1);
                    records.push(AttemptRecord {
                        index,
                        endpoint: attempt.endpoint.clone(),
                        encoding: attempt.encoding.to_string(),
                        succeeded: true,
                        error: None,
                    });
                    return AnalysisOutcome {
                        result,
                        source: ResultSource::Live { attempt: index },
                        attempts: records,
                    };
                }
                Err(e) => {
                    log::warn!("❌ Attempt {} failed ({}): {}", index + 1, e.kind(), e);
                    records.push(AttemptRecord {
                        index,
                        endpoint: attempt.endpoint.clone(),
                        encoding: attempt.encoding.to_string(),
                        succeeded: false,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        log::error!("❌ All {} webhook attempts failed, falling back to sample data", total);
        AnalysisOutcome {
            result: delayed_canned_result(self.fallback_delay).await,
            source: ResultSource::Fallback,
            attempts: records,
        }
    }

    /// Execute a single attempt. Attempts share nothing but the HTTP client.
    pub async fn run_attempt(
        &self,
        attempt: &Attempt,
        request: &AnalysisRequest,
    ) -> Result<AnalysisResult, AttemptError> {
        let builder = self.client.post(&attempt.endpoint);

        let builder = match &attempt.encoding {
            Encoding::Multipart { .. } => {
                let fields = attempt.encoding.multipart_fields();
                log::debug!("📦 Form fields: {:?} (file: {})", fields, request.file_name());
                builder.multipart(build_form(&fields, request)?)
            }
            Encoding::Base64Json(envelope) => {
                let payload = envelope.payload(request);
                log::debug!(
                    "📦 JSON payload format '{}', {} bytes",
                    envelope.as_str(),
                    payload.to_string().len()
                );
                builder.json(&payload)
            }
        };

        let response = builder.send().await.map_err(AttemptError::Transport)?;
        let status = response.status();
        log::debug!("📡 Response status: {}", status);

        let body = response.text().await.map_err(AttemptError::Transport)?;
        log::debug!("📝 Raw response: {}", truncate(&body, LOG_BODY_LIMIT));

        if !status.is_success() {
            return Err(AttemptError::HttpStatus {
                status,
                body: truncate(&body, LOG_BODY_LIMIT).to_string(),
            });
        }

        normalize_body(&body)
    }
}

fn build_form(fields: &[&str], request: &AnalysisRequest) -> Result<Form, AttemptError> {
    let mut form = Form::new();
    for field in fields {
        let part = Part::bytes(request.bytes().to_vec())
            .file_name(request.file_name().to_string())
            .mime_str(request.media_type())
            .map_err(AttemptError::Encoding)?;
        form = form.part(field.to_string(), part);
    }
    Ok(form)
}

/// First `max` chars of `text`.
pub(crate) fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

#[async_trait::async_trait]
impl MealAnalyzer for MealAnalysisClient {
    async fn analyze(&self, request: &AnalysisRequest, config: &ClientConfiguration) -> AnalysisResult {
        self.analyze_with_report(request, config).await.result
    }
}
