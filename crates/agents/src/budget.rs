use std::sync::Arc;

use dreamtrip_core::budget::{
    apply_currency, apply_flights, budget_prompt, fallback_estimate, EstimatedBudget,
};
use dreamtrip_core::{BudgetInfo, Itinerary, TripParameters, DEFAULT_CURRENCY};
use dreamtrip_integrations::Collaborators;
use dreamtrip_observability::AppMetrics;
use tracing::{debug, info, instrument, warn};

use crate::{infer, note_failure, PlannerConfig};

pub struct BudgetStage {
    collaborators: Collaborators,
    config: PlannerConfig,
    metrics: Arc<AppMetrics>,
}

impl BudgetStage {
    pub fn new(
        collaborators: Collaborators,
        config: PlannerConfig,
        metrics: Arc<AppMetrics>,
    ) -> Self {
        Self {
            collaborators,
            config,
            metrics,
        }
    }

    #[instrument(skip_all, fields(destination = %params.destination, currency = %params.currency))]
    pub async fn run(&self, params: &TripParameters, itinerary: &Itinerary) -> BudgetInfo {
        let prompt = budget_prompt(params, itinerary);
        let inference = self.collaborators.inference.as_ref();
        let mut info = match infer::<EstimatedBudget>(inference, &self.metrics, &prompt).await {
            Ok(estimate) => BudgetInfo::from(estimate),
            Err(err) => {
                warn!(
                    stage = "budget",
                    reason = err.reason(),
                    error = %err,
                    "using rate table estimate"
                );
                self.metrics.inc_stage_fallback("budget");
                fallback_estimate(params, self.config.alternative_threshold)
            }
        };

        self.convert_currency(&mut info, &params.currency).await;
        if let Some(origin) = params.origin.as_deref() {
            self.add_flights(&mut info, origin, params).await;
        }

        info!(total = info.total_estimated_cost, "budget estimated");
        info
    }

    async fn convert_currency(&self, info: &mut BudgetInfo, currency: &str) {
        if currency.eq_ignore_ascii_case(DEFAULT_CURRENCY) {
            return;
        }
        match self.collaborators.currency.usd_rate(currency).await {
            Ok(Some(rate)) if rate.is_finite() && rate > 0.0 => {
                apply_currency(info, rate, currency);
            }
            Ok(_) => debug!(currency, "no usable rate, amounts stay in USD"),
            Err(err) => {
                note_failure(&self.metrics, "currency", &err);
                debug!(currency, error = %err, "rate lookup failed, amounts stay in USD");
            }
        }
    }

    async fn add_flights(&self, info: &mut BudgetInfo, origin: &str, params: &TripParameters) {
        match self.collaborators.flights.quote(origin, &params.destination).await {
            Ok(options) => apply_flights(
                info,
                options,
                params.travelers,
                self.config.flight_options_limit,
            ),
            Err(err) => {
                note_failure(&self.metrics, "flights", &err);
                debug!(origin, error = %err, "flight prices omitted");
            }
        }
    }
}
