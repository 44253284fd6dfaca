//! Deterministic budget math: the daily rate table, the proportional split,
//! alternative scenarios, currency conversion and flight augmentation.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::models::{
    AlternativeScenario, BreakdownEntry, BudgetInfo, FlightOption, Itinerary, TripParameters,
};
use crate::shape::{ShapeError, ValidatedShape};

pub const BREAKDOWN_CATEGORIES: [&str; 4] = ["accommodation", "food", "activities", "transport"];
pub const FLIGHTS_CATEGORY: &str = "flights";
pub const BUDGET_FRIENDLY_TIER: &str = "Budget Friendly";

const SPLIT: [(&str, f64); 4] = [
    ("accommodation", 0.40),
    ("food", 0.30),
    ("activities", 0.15),
    ("transport", 0.15),
];

const DAILY_RATES: &[(&str, f64)] = &[
    ("low budget", 30.0),
    ("budget friendly", 50.0),
    ("budget", 50.0),
    ("moderate", 120.0),
    ("luxury", 300.0),
    ("ultra luxury", 600.0),
];

const UNKNOWN_TIER_RATE: f64 = 100.0;

const FALLBACK_SUGGESTIONS: [&str; 3] = [
    "Book accommodations in advance",
    "Use public transportation",
    "Look for combo tickets",
];

/// Per-person daily rate for a quality tier. Lookup ignores case.
pub fn daily_rate(tier: Option<&str>) -> f64 {
    let Some(tier) = tier.map(str::trim) else {
        return UNKNOWN_TIER_RATE;
    };
    DAILY_RATES
        .iter()
        .find(|(label, _)| label.eq_ignore_ascii_case(tier))
        .map_or(UNKNOWN_TIER_RATE, |(_, rate)| *rate)
}

pub fn fallback_estimate(params: &TripParameters, alternative_threshold: f64) -> BudgetInfo {
    let rate = daily_rate(params.quality_tier());
    let travelers = f64::from(params.travelers);
    let total = rate * f64::from(params.duration_days) * travelers;

    let breakdown = SPLIT
        .iter()
        .map(|(category, share)| (category.to_string(), BreakdownEntry::Amount(total * share)))
        .collect::<BTreeMap<_, _>>();

    let alternative_scenarios = params
        .budget_total
        .filter(|limit| total > limit * alternative_threshold)
        .map(|limit| fallback_scenarios(params, rate, limit));

    BudgetInfo {
        total_estimated_cost: total,
        breakdown,
        suggestions: FALLBACK_SUGGESTIONS.iter().map(ToString::to_string).collect(),
        alternative_scenarios,
        flight_options: None,
        currency: None,
    }
}

fn fallback_scenarios(params: &TripParameters, rate: f64, limit: f64) -> Vec<AlternativeScenario> {
    let travelers = f64::from(params.travelers);
    let affordable_days = ((limit / (rate * travelers)).floor() as u32).max(1);
    let tier_label = params.quality_tier().unwrap_or("current");
    let friendly_rate = daily_rate(Some(BUDGET_FRIENDLY_TIER));

    vec![
        AlternativeScenario {
            title: format!("Reduce to {affordable_days} Days"),
            description: format!("Keep {tier_label} quality, shorter trip"),
            new_duration_days: affordable_days,
            new_budget_range: params.preferences.budget_range.clone(),
            estimated_cost: f64::from(affordable_days) * rate * travelers,
        },
        AlternativeScenario {
            title: "Switch to Budget-Friendly".to_string(),
            description: format!("Keep {} days, lower quality", params.duration_days),
            new_duration_days: params.duration_days,
            new_budget_range: Some(BUDGET_FRIENDLY_TIER.to_string()),
            estimated_cost: friendly_rate * f64::from(params.duration_days) * travelers,
        },
    ]
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Converts every amount from USD with `rate` and stamps `currency`.
/// Notes in the breakdown pass through untouched.
pub fn apply_currency(info: &mut BudgetInfo, rate: f64, currency: &str) {
    info.total_estimated_cost = round_cents(info.total_estimated_cost * rate);
    for entry in info.breakdown.values_mut() {
        if let BreakdownEntry::Amount(amount) = entry {
            *amount = round_cents(*amount * rate);
        }
    }
    for scenario in info.alternative_scenarios.iter_mut().flatten() {
        scenario.estimated_cost = round_cents(scenario.estimated_cost * rate);
    }
    info.currency = Some(currency.to_string());
}

/// Adds the cheapest option for every traveler. `options` must already be
/// sorted ascending by price.
pub fn apply_flights(info: &mut BudgetInfo, options: Vec<FlightOption>, travelers: u32, limit: usize) {
    let Some(cheapest) = options.first() else {
        return;
    };
    let flight_cost = cheapest.price * f64::from(travelers);
    info.total_estimated_cost += flight_cost;
    info.breakdown
        .insert(FLIGHTS_CATEGORY.to_string(), BreakdownEntry::Amount(flight_cost));
    info.flight_options = Some(options.into_iter().take(limit).collect());
}

/// Cost estimate requested from inference.
#[derive(Debug, Clone, Deserialize)]
pub struct EstimatedBudget {
    pub total_estimated_cost: f64,
    pub breakdown: BTreeMap<String, BreakdownEntry>,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default)]
    pub alternative_scenarios: Option<Vec<AlternativeScenario>>,
}

impl ValidatedShape for EstimatedBudget {
    fn validate(self) -> Result<Self, ShapeError> {
        if !self.total_estimated_cost.is_finite() || self.total_estimated_cost < 0.0 {
            return Err(ShapeError::violation("total_estimated_cost must be non-negative"));
        }
        for category in BREAKDOWN_CATEGORIES {
            match self.breakdown.get(category).and_then(BreakdownEntry::amount) {
                Some(amount) if amount.is_finite() && amount >= 0.0 => {}
                Some(_) => {
                    return Err(ShapeError::violation(format!(
                        "breakdown '{category}' must be non-negative"
                    )))
                }
                None => {
                    return Err(ShapeError::violation(format!(
                        "breakdown '{category}' is missing or not a number"
                    )))
                }
            }
        }
        if let Some(scenarios) = &self.alternative_scenarios {
            if scenarios.iter().any(|scenario| {
                scenario.new_duration_days == 0 || !scenario.estimated_cost.is_finite()
            }) {
                return Err(ShapeError::violation("alternative scenario is not usable"));
            }
        }
        Ok(self)
    }
}

impl From<EstimatedBudget> for BudgetInfo {
    fn from(estimate: EstimatedBudget) -> Self {
        Self {
            total_estimated_cost: estimate.total_estimated_cost,
            breakdown: estimate.breakdown,
            suggestions: estimate.suggestions,
            alternative_scenarios: estimate.alternative_scenarios.filter(|list| !list.is_empty()),
            flight_options: None,
            currency: None,
        }
    }
}

pub fn budget_prompt(params: &TripParameters, itinerary: &Itinerary) -> String {
    let itinerary_json = serde_json::to_string(itinerary).unwrap_or_else(|_| "[]".to_string());
    let tier = params.quality_tier().unwrap_or("unspecified");
    let limit = params
        .budget_total
        .map_or_else(|| "No specific limit".to_string(), |limit| limit.to_string());
    format!(
        "You are a travel budget expert. Estimate the REALISTIC total cost of this itinerary in USD.\n\n\
         Destination: {destination}\n\
         Duration: {days} days\n\
         Travelers: {travelers}\n\
         Budget Range/Quality: {tier}\n\
         Requested Budget Limit: {limit}\n\n\
         Itinerary:\n{itinerary_json}\n\n\
         Base the estimate on actual market prices at the stated quality level. Do not lower \
         costs to match the budget limit.\n\n\
         Return a JSON object with:\n\
         - total_estimated_cost (number)\n\
         - breakdown (object with numeric accommodation, food, activities, transport)\n\
         - suggestions (list of strings)\n\
         - alternative_scenarios (only when the realistic cost clearly exceeds the limit): 2-3 \
         items of {{title, description, new_duration_days, new_budget_range, estimated_cost}}, \
         one with a reduced duration at \"{tier}\" and one keeping {days} days at \
         \"{BUDGET_FRIENDLY_TIER}\"",
        destination = params.destination,
        days = params.duration_days,
        travelers = params.travelers,
    )
}
