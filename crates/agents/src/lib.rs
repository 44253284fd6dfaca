pub mod budget;
pub mod config;
pub mod extractor;
pub mod logistics;
pub mod planner;
pub mod research;

#[cfg(test)]
pub(crate) mod testing;

use dreamtrip_core::{parse_shape, CollaboratorError, GenerativeInference, ShapeError, ValidatedShape};
use dreamtrip_observability::AppMetrics;
use thiserror::Error;

pub use budget::BudgetStage;
pub use config::PlannerConfig;
pub use extractor::ParameterExtractor;
pub use logistics::LogisticsStage;
pub use planner::TripPlanner;
pub use research::{QueryCache, ResearchStage};

/// Why a primary inference attempt was rejected. Every variant sends the
/// stage to its deterministic fallback.
#[derive(Debug, Error)]
pub(crate) enum AttemptError {
    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),

    #[error(transparent)]
    Shape(#[from] ShapeError),
}

impl AttemptError {
    pub(crate) fn reason(&self) -> &'static str {
        match self {
            Self::Collaborator(err) if err.is_unconfigured() => "unconfigured",
            Self::Collaborator(_) => "collaborator",
            Self::Shape(err) => err.reason(),
        }
    }
}

pub(crate) async fn infer<T: ValidatedShape>(
    inference: &dyn GenerativeInference,
    metrics: &AppMetrics,
    prompt: &str,
) -> Result<T, AttemptError> {
    let raw = inference.generate(prompt).await.map_err(|err| {
        note_failure(metrics, "inference", &err);
        err
    })?;
    Ok(parse_shape::<T>(&raw)?)
}

/// Counts a collaborator failure. Missing credentials are expected and not
/// counted.
pub(crate) fn note_failure(metrics: &AppMetrics, service: &'static str, err: &CollaboratorError) {
    if !err.is_unconfigured() {
        metrics.inc_collaborator_failure(service);
    }
}
