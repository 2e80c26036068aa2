use std::fmt;
use std::str::FromStr;

use base64::{engine::general_purpose, Engine};
use serde_json::{json, Value};

use crate::models::AnalysisRequest;

/// JSON body shapes used when the image is sent inline as base64.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonEnvelope {
    /// `{"image": <data uri>, "filename": .., "mimetype": ..}`
    Flat,
    /// `{"data": {"image": .., "filename": .., "mimetype": ..}}`
    Nested,
    /// `{"body": <data uri>}`
    Body,
}

impl JsonEnvelope {
    pub const ALL: [JsonEnvelope; 3] = [JsonEnvelope::Flat, JsonEnvelope::Nested, JsonEnvelope::Body];

    pub fn as_str(&self) -> &'static str {
        match self {
            JsonEnvelope::Flat => "flat",
            JsonEnvelope::Nested => "nested",
            JsonEnvelope::Body => "body",
        }
    }

    pub fn payload(&self, request: &AnalysisRequest) -> Value {
        let data_uri = data_uri(request);
        match self {
            JsonEnvelope::Flat => json!({
                "image": data_uri,
                "filename": request.file_name(),
                "mimetype": request.media_type(),
            }),
            JsonEnvelope::Nested => json!({
                "data": {
                    "image": data_uri,
                    "filename": request.file_name(),
                    "mimetype": request.media_type(),
                }
            }),
            JsonEnvelope::Body => json!({ "body": data_uri }),
        }
    }
}

impl FromStr for JsonEnvelope {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "flat" => Ok(JsonEnvelope::Flat),
            "nested" => Ok(JsonEnvelope::Nested),
            "body" => Ok(JsonEnvelope::Body),
            other => anyhow::bail!("Unknown JSON envelope '{}' (expected flat, nested or body)", other),
        }
    }
}

/// `data:<mime>;base64,<payload>`
pub fn data_uri(request: &AnalysisRequest) -> String {
    format!(
        "data:{};base64,{}",
        request.media_type(),
        general_purpose::STANDARD.encode(request.bytes())
    )
}

/// How the image is put on the wire for one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Encoding {
    /// `multipart/form-data` with the file under `field`, repeated under each
    /// of `companions`.
    Multipart { field: String, companions: Vec<String> },
    /// `application/json` with a base64 data URI.
    Base64Json(JsonEnvelope),
}

impl Encoding {
    /// Every form field name that receives a copy of the file, primary first.
    pub fn multipart_fields(&self) -> Vec<&str> {
        match self {
            Encoding::Multipart { field, companions } => {
                let mut fields = vec![field.as_str()];
                for companion in companions {
                    if !fields.contains(&companion.as_str()) {
                        fields.push(companion.as_str());
                    }
                }
                fields
            }
            Encoding::Base64Json(_) => Vec::new(),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Encoding::Multipart { field, .. } => write!(f, "multipart[{}]", field),
            Encoding::Base64Json(envelope) => write!(f, "base64-json[{}]", envelope.as_str()),
        }
    }
}

/// One (endpoint, encoding) combination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub endpoint: String,
    pub encoding: Encoding,
}

impl Attempt {
    pub fn multipart(endpoint: impl Into<String>, field: impl Into<String>, companions: &[String]) -> Self {
        Self {
            endpoint: endpoint.into(),
            encoding: Encoding::Multipart {
                field: field.into(),
                companions: companions.to_vec(),
            },
        }
    }

    pub fn base64(endpoint: impl Into<String>, envelope: JsonEnvelope) -> Self {
        Self {
            endpoint: endpoint.into(),
            encoding: Encoding::Base64Json(envelope),
        }
    }
}

/// Ordered list of attempts, evaluated first to last.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StrategyPlan {
    attempts: Vec<Attempt>,
}

impl StrategyPlan {
    pub fn new(attempts: Vec<Attempt>) -> Self {
        Self { attempts }
    }

    /// All multipart attempts (endpoint-major), then all base64 attempts.
    pub fn from_parts(
        endpoints: &[String],
        field_names: &[String],
        companion_fields: &[String],
        envelopes: &[JsonEnvelope],
    ) -> Self {
        let mut attempts = Vec::with_capacity(endpoints.len() * (field_names.len() + envelopes.len()));

        for endpoint in endpoints {
            for field in field_names {
                attempts.push(Attempt::multipart(endpoint.clone(), field.clone(), companion_fields));
            }
        }

        for endpoint in endpoints {
            for envelope in envelopes {
                attempts.push(Attempt::base64(endpoint.clone(), *envelope));
            }
        }

        Self { attempts }
    }

    pub fn attempts(&self) -> &[Attempt] {
        &self.attempts
    }

    pub fn len(&self) -> usize {
        self.attempts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attempts.is_empty()
    }

    /// Distinct endpoints in first-seen order.
    pub fn endpoints(&self) -> Vec<String> {
        let mut endpoints: Vec<String> = Vec::new();
        for attempt in &self.attempts {
            if !endpoints.contains(&attempt.endpoint) {
                endpoints.push(attempt.endpoint.clone());
            }
        }
        endpoints
    }
}
