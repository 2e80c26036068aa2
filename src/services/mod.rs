pub mod fallback; // Canned sample analysis
pub mod meal_analysis; // Webhook client
pub mod normalizer;
pub mod probe; // Connectivity diagnostics
pub mod strategy;

pub use meal_analysis::{AnalysisOutcome, AttemptRecord, MealAnalysisClient, ResultSource};
pub use probe::{ConnectivityProbe, ConnectivityReport};
pub use strategy::{Attempt, Encoding, JsonEnvelope, StrategyPlan};

use crate::models::{AnalysisRequest, AnalysisResult, ClientConfiguration};

/// Trait for meal analysis backends (webhook client, test doubles, etc.)
///
/// Never fails from the caller's point of view: when live analysis is
/// unavailable the implementation returns sample data instead.
#[async_trait::async_trait]
pub trait MealAnalyzer: Send + Sync {
    async fn analyze(&self, request: &AnalysisRequest, config: &ClientConfiguration) -> AnalysisResult;
}
