use std::sync::Arc;

use dreamtrip_core::itinerary::{
    adjacent_pairs, fallback_itinerary, itinerary_prompt, GeneratedItinerary,
};
use dreamtrip_core::{Coordinates, DayPlan, Findings, Itinerary, TripParameters};
use dreamtrip_integrations::Collaborators;
use dreamtrip_observability::AppMetrics;
use futures::future::join_all;
use tracing::{debug, info, instrument, warn};

use crate::{infer, note_failure, AttemptError};

pub struct LogisticsStage {
    collaborators: Collaborators,
    metrics: Arc<AppMetrics>,
}

impl LogisticsStage {
    pub fn new(collaborators: Collaborators, metrics: Arc<AppMetrics>) -> Self {
        Self {
            collaborators,
            metrics,
        }
    }

    #[instrument(skip_all, fields(destination = %params.destination, days = params.duration_days))]
    pub async fn run(&self, params: &TripParameters, findings: &Findings) -> Itinerary {
        match self.generate(params, findings).await {
            Ok(mut itinerary) => {
                for day in &mut itinerary {
                    self.place_day(day, &params.destination).await;
                }
                info!(days = itinerary.len(), "itinerary generated");
                itinerary
            }
            Err(err) => {
                warn!(
                    stage = "logistics",
                    reason = err.reason(),
                    error = %err,
                    "using template itinerary"
                );
                self.metrics.inc_stage_fallback("logistics");
                fallback_itinerary(params)
            }
        }
    }

    async fn generate(
        &self,
        params: &TripParameters,
        findings: &Findings,
    ) -> Result<Itinerary, AttemptError> {
        let prompt = itinerary_prompt(params, findings);
        let generated: GeneratedItinerary =
            infer(self.collaborators.inference.as_ref(), &self.metrics, &prompt).await?;
        Ok(generated.for_duration(params.duration_days)?)
    }

    /// Geocodes the day's slots, then times each leg between two directly
    /// consecutive resolved slots.
    async fn place_day(&self, day: &mut DayPlan, destination: &str) {
        let lookups = day
            .slots()
            .map(|slot| slot.lookup_name().map(|name| format!("{name} in {destination}")))
            .map(|query| self.geocode(query));
        let resolved = join_all(lookups).await;

        for (slot, coordinates) in day.slots_mut().into_iter().zip(&resolved) {
            if let Some(point) = coordinates {
                slot.lat = Some(point.lat);
                slot.lng = Some(point.lng);
            }
        }

        let legs = adjacent_pairs(&resolved)
            .into_iter()
            .map(|(from, to)| self.leg_seconds(from, to));
        let times = join_all(legs).await.into_iter().flatten().collect::<Vec<_>>();

        day.travel_times_seconds = if times.is_empty() { None } else { Some(times) };
    }

    async fn geocode(&self, query: Option<String>) -> Option<Coordinates> {
        let query = query?;
        match self.collaborators.places.find(&query).await {
            Ok(places) => places.first().and_then(|place| place.coordinates()),
            Err(err) => {
                note_failure(&self.metrics, "places", &err);
                debug!(query = %query, error = %err, "slot left unresolved");
                None
            }
        }
    }

    async fn leg_seconds(&self, from: Coordinates, to: Coordinates) -> Option<f64> {
        match self.collaborators.routes.duration_seconds(from, to).await {
            Ok(seconds) => seconds,
            Err(err) => {
                note_failure(&self.metrics, "routing", &err);
                debug!(error = %err, "travel time omitted");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use dreamtrip_core::WeatherReport;

    use super::*;
    use crate::testing::{offline, ScriptedInference, StubPlaces};

    fn findings() -> Findings {
        Findings {
            activities: Vec::new(),
            accommodations: Vec::new(),
            dining: Vec::new(),
            weather: WeatherReport::unavailable(),
            top_places: Vec::new(),
        }
    }

    fn slot(activity: &str, location: Option<&str>) -> serde_json::Value {
        serde_json::json!({ "activity": activity, "description": "", "location": location })
    }

    fn generated_two_days() -> String {
        serde_json::json!([
            {
                "day_number": 1,
                "morning": slot("Temple visit", Some("Senso-ji")),
                "afternoon": slot("Wander", Some("Nowhere Street")),
                "evening": slot("Ramen", Some("Ichiran")),
            },
            {
                "day_number": 2,
                "morning": slot("Fish market", Some("Tsukiji")),
                "afternoon": slot("Meiji Jingu", None),
                "evening": slot("Shibuya Crossing", Some("")),
            }
        ])
        .to_string()
    }

    fn stage_with(inference: ScriptedInference) -> LogisticsStage {
        let places = StubPlaces::default()
            .with("Senso-ji in Tokyo", &["Senso-ji"])
            .with("Ichiran in Tokyo", &["Ichiran"])
            .with("Tsukiji in Tokyo", &["Tsukiji Outer Market"])
            .with("Meiji Jingu in Tokyo", &["Meiji Jingu"])
            .with("Shibuya Crossing in Tokyo", &["Shibuya Crossing"]);
        let collaborators = Collaborators {
            inference: Arc::new(inference),
            places: Arc::new(places),
            ..offline()
        };
        LogisticsStage::new(collaborators, AppMetrics::shared())
    }

    #[tokio::test]
    async fn offline_itinerary_covers_every_day() {
        let stage = LogisticsStage::new(offline(), AppMetrics::shared());
        let params = TripParameters::new("Tokyo", 5, "tokyo");
        let itinerary = stage.run(&params, &findings()).await;

        assert_eq!(itinerary.len(), 5);
        assert!(itinerary.iter().all(|day| day.slots().iter().all(|slot| !slot.activity.is_empty())));
        assert!(itinerary.iter().all(|day| day.travel_times_seconds.is_none()));
    }

    #[tokio::test]
    async fn generated_itinerary_is_geocoded_and_timed() {
        let inference = ScriptedInference::default()
            .reply("day-by-day itinerary", format!("```json\n{}\n```", generated_two_days()));
        let stage = stage_with(inference);
        let params = TripParameters::new("Tokyo", 2, "tokyo");
        let itinerary = stage.run(&params, &findings()).await;

        let first = &itinerary[0];
        assert!(first.morning.coordinates().is_some());
        assert!(first.afternoon.coordinates().is_none());
        assert!(first.evening.coordinates().is_some());
        // the unresolved afternoon separates morning from evening
        assert_eq!(first.travel_times_seconds, None);

        let second = &itinerary[1];
        assert!(second.afternoon.coordinates().is_some());
        assert!(second.evening.coordinates().is_some());
        assert_eq!(second.travel_times_seconds, Some(vec![600.0, 600.0]));
    }

    #[tokio::test]
    async fn wrong_day_count_uses_template() {
        let inference = ScriptedInference::default()
            .reply("day-by-day itinerary", generated_two_days());
        let stage = stage_with(inference);
        let params = TripParameters::new("Tokyo", 3, "tokyo");
        let itinerary = stage.run(&params, &findings()).await;

        assert_eq!(itinerary.len(), 3);
        assert_eq!(itinerary[0].morning.activity, "Explore Tokyo");
    }
}
