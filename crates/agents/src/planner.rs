use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use dreamtrip_core::{PlanStatus, TripParameters, TripPlan};
use dreamtrip_integrations::{Capabilities, Collaborators};
use dreamtrip_observability::AppMetrics;
use dreamtrip_storage::{ContextRepository, InteractionRecord};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::{BudgetStage, LogisticsStage, ParameterExtractor, PlannerConfig, ResearchStage};

pub const LAST_PLAN_KEY: &str = "last_plan";

/// Runs extraction and the research, logistics and budget stages in order.
#[derive(Clone)]
pub struct TripPlanner<S>
where
    S: ContextRepository,
{
    collaborators: Collaborators,
    config: PlannerConfig,
    extractor: ParameterExtractor,
    store: Arc<S>,
    metrics: Arc<AppMetrics>,
}

impl<S> TripPlanner<S>
where
    S: ContextRepository,
{
    pub fn new(
        collaborators: Collaborators,
        config: PlannerConfig,
        store: Arc<S>,
        metrics: Arc<AppMetrics>,
    ) -> Self {
        let extractor = ParameterExtractor::new(
            collaborators.inference.clone(),
            collaborators.places.clone(),
            metrics.clone(),
        );
        Self {
            collaborators,
            config,
            extractor,
            store,
            metrics,
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        self.collaborators.capabilities
    }

    pub fn metrics(&self) -> &Arc<AppMetrics> {
        &self.metrics
    }

    #[instrument(skip_all, fields(text_len = text.len()))]
    pub async fn interpret(&self, text: &str) -> TripParameters {
        let started = Instant::now();
        self.metrics.inc_request();

        let params = self.extractor.interpret(text).await;
        self.remember("interpret", text, &params, None).await;

        self.metrics.observe_latency(started.elapsed());
        info!(
            destination = %params.destination,
            duration_days = params.duration_days,
            warnings = params.validation_warnings.len(),
            "trip interpreted"
        );
        params
    }

    /// Fails only when `params` break the parameter invariants; every stage
    /// recovers from its own failures.
    #[instrument(skip_all, fields(destination = %params.destination))]
    pub async fn generate(&self, params: TripParameters) -> Result<TripPlan> {
        params
            .check_invariants()
            .map_err(|reason| anyhow!(reason))
            .context("invalid trip parameters")?;

        let started = Instant::now();
        self.metrics.inc_request();

        let research = ResearchStage::new(
            self.collaborators.clone(),
            self.config.clone(),
            self.metrics.clone(),
        );
        let findings = research.run(&params).await;

        let logistics = LogisticsStage::new(self.collaborators.clone(), self.metrics.clone());
        let itinerary = logistics.run(&params, &findings).await;

        let budget = BudgetStage::new(
            self.collaborators.clone(),
            self.config.clone(),
            self.metrics.clone(),
        );
        let budget_info = budget.run(&params, &itinerary).await;

        let plan = TripPlan {
            parameters: params,
            itinerary,
            budget_info,
            research_info: findings,
            status: PlanStatus::Generated,
        };

        self.remember(
            "generate",
            plan.parameters.original_request(),
            &plan,
            Some(LAST_PLAN_KEY),
        )
        .await;

        self.metrics.inc_plan_generated();
        self.metrics.observe_latency(started.elapsed());
        info!(
            days = plan.itinerary.len(),
            total = plan.budget_info.total_estimated_cost,
            "plan generated"
        );
        Ok(plan)
    }

    /// Extraction followed by plan generation.
    pub async fn plan(&self, text: &str) -> Result<TripPlan> {
        let params = self.interpret(text).await;
        self.generate(params).await
    }

    pub async fn history(&self, limit: usize) -> Result<Vec<InteractionRecord>> {
        self.store.recent_interactions(limit).await
    }

    pub async fn last_plan(&self) -> Result<Option<TripPlan>> {
        let Some(value) = self.store.get_context(LAST_PLAN_KEY).await? else {
            return Ok(None);
        };
        let plan = serde_json::from_value(value).context("stored plan is unreadable")?;
        Ok(Some(plan))
    }

    /// Store failures are logged and never fail the request.
    async fn remember<T: Serialize>(
        &self,
        kind: &str,
        user_input: &str,
        response: &T,
        context_key: Option<&str>,
    ) {
        let value = match serde_json::to_value(response) {
            Ok(value) => value,
            Err(err) => {
                warn!(kind, error = %err, "could not serialize interaction");
                return;
            }
        };

        if let Some(key) = context_key {
            if let Err(err) = self.store.update_context(key, &value).await {
                self.metrics.inc_collaborator_failure("store");
                warn!(key, error = %err, "context update failed");
            }
        }

        let record = InteractionRecord::new(kind, user_input, value);
        if let Err(err) = self.store.add_interaction(&record).await {
            self.metrics.inc_collaborator_failure("store");
            warn!(kind, error = %err, "interaction not recorded");
        }
    }
}
