use std::sync::Arc;

use dreamtrip_core::extraction::extraction_prompt;
use dreamtrip_core::{
    fallback_parameters, ExtractedTrip, GenerativeInference, NormalizationPass, PlaceLookup,
    TripParameters, UNKNOWN_DESTINATION,
};
use dreamtrip_observability::AppMetrics;
use tracing::{debug, instrument, warn};

use crate::{infer, note_failure, AttemptError};

/// Turns free text into normalized trip parameters.
#[derive(Clone)]
pub struct ParameterExtractor {
    inference: Arc<dyn GenerativeInference>,
    places: Arc<dyn PlaceLookup>,
    metrics: Arc<AppMetrics>,
}

impl ParameterExtractor {
    pub fn new(
        inference: Arc<dyn GenerativeInference>,
        places: Arc<dyn PlaceLookup>,
        metrics: Arc<AppMetrics>,
    ) -> Self {
        Self {
            inference,
            places,
            metrics,
        }
    }

    /// Candidate extraction followed by exactly one normalization pass.
    pub async fn interpret(&self, text: &str) -> TripParameters {
        let candidate = self.extract(text).await;
        self.normalize(candidate).await
    }

    #[instrument(skip_all, fields(text_len = text.len()))]
    pub async fn extract(&self, text: &str) -> TripParameters {
        match self.extract_with_inference(text).await {
            Ok(params) => params,
            Err(err) => {
                warn!(
                    stage = "extraction",
                    reason = err.reason(),
                    error = %err,
                    "using heuristic extraction"
                );
                self.metrics.inc_extraction_fallback();
                fallback_parameters(text)
            }
        }
    }

    async fn extract_with_inference(&self, text: &str) -> Result<TripParameters, AttemptError> {
        let extracted: ExtractedTrip =
            infer(self.inference.as_ref(), &self.metrics, &extraction_prompt(text)).await?;
        Ok(extracted.into_parameters(text))
    }

    #[instrument(skip_all, fields(destination = %candidate.destination))]
    pub async fn normalize(&self, candidate: TripParameters) -> TripParameters {
        let mut pass = NormalizationPass::begin(candidate);

        if !pass.destination().eq_ignore_ascii_case(UNKNOWN_DESTINATION) {
            let lookup = self.places.find(pass.destination()).await;
            match lookup {
                Ok(places) => {
                    pass.adopt_lookup_name(places.first().map(|place| place.name.as_str()))
                }
                Err(err) => {
                    note_failure(&self.metrics, "places", &err);
                    debug!(error = %err, "destination lookup skipped");
                }
            }
        }

        pass.finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use dreamtrip_core::normalize::{TAG_DESTINATION_NORMALIZED, TAG_DESTINATION_VALIDATED};
    use dreamtrip_observability::AppMetrics;

    use super::*;
    use crate::testing::{offline, ScriptedInference, StubPlaces};

    fn extractor(inference: ScriptedInference, places: StubPlaces) -> ParameterExtractor {
        ParameterExtractor::new(Arc::new(inference), Arc::new(places), AppMetrics::shared())
    }

    #[tokio::test]
    async fn offline_extraction_normalizes_bali_request() {
        let collaborators = offline();
        let metrics = AppMetrics::shared();
        let extractor = ParameterExtractor::new(
            collaborators.inference,
            collaborators.places,
            metrics.clone(),
        );

        let params = extractor.interpret("10 day trip to bali under $1000").await;
        assert_eq!(params.destination.to_lowercase(), "bali");
        assert_eq!(params.duration_days, 10);
        assert_eq!(params.budget_total, Some(1000.0));
        assert_eq!(params.currency, "USD");
        assert_eq!(params.original_request(), "10 day trip to bali under $1000");
        assert_eq!(metrics.snapshot().extraction_fallback_total, 1);
    }

    #[tokio::test]
    async fn inferred_destination_is_cleaned_and_canonicalized() {
        let inference = ScriptedInference::default().reply(
            "trip interpreter",
            "```json\n{\"destination\": \"bali under $1000\", \"duration_days\": 3, \"currency\": \"EUR\"}\n```",
        );
        let places = StubPlaces::default().with("bali", &["Bali"]);
        let extractor = extractor(inference, places);

        let params = extractor.interpret("10 day trip to bali under $1000").await;
        assert_eq!(params.destination, "Bali");
        assert_eq!(params.duration_days, 10);
        assert_eq!(params.budget_total, Some(1000.0));
        assert_eq!(params.currency, "USD");
        assert!(params.validation_warnings.contains(TAG_DESTINATION_NORMALIZED));
        assert!(params.validation_warnings.contains(TAG_DESTINATION_VALIDATED));
    }

    #[tokio::test]
    async fn malformed_inference_falls_back_to_heuristics() {
        let inference = ScriptedInference::default()
            .reply("trip interpreter", "Sure! Japan sounds lovely.");
        let extractor = extractor(inference, StubPlaces::default());

        let params = extractor
            .interpret("7-day trip to Japan under $5000 for culture and food")
            .await;
        assert_eq!(params.duration_days, 7);
        assert!(["Japan", "Unknown Destination"].contains(&params.destination.as_str()));
        assert_eq!(params.preferences.interests, vec!["General Exploration"]);
    }

    #[tokio::test]
    async fn normalizing_twice_keeps_values() {
        let places = StubPlaces::default().with("bali", &["Bali"]);
        let extractor = extractor(ScriptedInference::default(), places);

        let once = extractor.interpret("10 day trip to bali under $1000").await;
        let twice = extractor.normalize(once.clone()).await;
        assert_eq!(once.destination, twice.destination);
        assert_eq!(once.budget_total, twice.budget_total);
        assert_eq!(once.duration_days, twice.duration_days);
        assert_eq!(once.validation_warnings, twice.validation_warnings);
    }
}
