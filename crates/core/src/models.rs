use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

pub const DEFAULT_CURRENCY: &str = "USD";
pub const DEFAULT_DURATION_DAYS: u32 = 7;
/// Longest trip the planner accepts.
pub const MAX_DURATION_DAYS: u32 = 365;
pub const UNKNOWN_DESTINATION: &str = "Unknown";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TripPreferences {
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub budget_range: Option<String>,
    #[serde(default)]
    pub travel_style: Option<String>,
    #[serde(default)]
    pub dietary_restrictions: Vec<String>,
}

/// Structured trip parameters.
///
/// `original_request` is fixed at construction; every other field may be
/// rewritten by the normalizer before the pipeline starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripParameters {
    pub destination: String,
    pub duration_days: u32,
    #[serde(default)]
    pub budget_total: Option<f64>,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_travelers")]
    pub travelers: u32,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default)]
    pub preferences: TripPreferences,
    #[serde(default)]
    original_request: String,
    #[serde(default)]
    pub validation_warnings: BTreeSet<String>,
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

fn default_travelers() -> u32 {
    1
}

impl TripParameters {
    pub fn new(
        destination: impl Into<String>,
        duration_days: u32,
        original_request: impl Into<String>,
    ) -> Self {
        Self {
            destination: destination.into(),
            duration_days,
            budget_total: None,
            currency: default_currency(),
            travelers: default_travelers(),
            start_date: None,
            origin: None,
            preferences: TripPreferences::default(),
            original_request: original_request.into(),
            validation_warnings: BTreeSet::new(),
        }
    }

    pub fn original_request(&self) -> &str {
        &self.original_request
    }

    pub fn quality_tier(&self) -> Option<&str> {
        self.preferences.budget_range.as_deref()
    }

    pub fn record_warnings<I, S>(&mut self, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.validation_warnings
            .extend(tags.into_iter().map(Into::into));
    }

    /// Checks the invariants a caller-supplied parameter set must hold before
    /// it may enter the planning pipeline.
    pub fn check_invariants(&self) -> Result<(), String> {
        if self.destination.trim().is_empty() {
            return Err("destination must not be empty".to_string());
        }
        if self.duration_days == 0 {
            return Err("duration_days must be at least 1".to_string());
        }
        if self.duration_days > MAX_DURATION_DAYS {
            return Err(format!("duration_days must be at most {MAX_DURATION_DAYS}"));
        }
        if self.travelers == 0 {
            return Err("travelers must be at least 1".to_string());
        }
        if let Some(budget) = self.budget_total {
            if !budget.is_finite() || budget < 0.0 {
                return Err("budget_total must be a non-negative number".to_string());
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EstimatedCost {
    Amount(f64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FindingItem {
    pub name: String,
    pub description: String,
    pub estimated_cost: EstimatedCost,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherStatus {
    Unavailable,
    Error,
    Ok,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyTemperature {
    pub date: String,
    pub avg_temp_c: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub status: WeatherStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub daily: Vec<DailyTemperature>,
}

impl WeatherReport {
    pub fn unavailable() -> Self {
        Self {
            status: WeatherStatus::Unavailable,
            daily: Vec::new(),
        }
    }

    pub fn error() -> Self {
        Self {
            status: WeatherStatus::Error,
            daily: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceRecord {
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
}

impl PlaceRecord {
    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Some(Coordinates { lat, lng }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub snippet: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResults {
    pub query: String,
    pub organic_results: Vec<SearchHit>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Findings {
    pub activities: Vec<FindingItem>,
    pub accommodations: Vec<FindingItem>,
    pub dining: Vec<FindingItem>,
    pub weather: WeatherReport,
    pub top_places: Vec<PlaceRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotPlan {
    pub activity: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
}

impl SlotPlan {
    pub fn new(activity: impl Into<String>, description: impl Into<String>, location: &str) -> Self {
        Self {
            activity: activity.into(),
            description: description.into(),
            location: Some(location.to_string()),
            lat: None,
            lng: None,
        }
    }

    /// Name used to geocode the slot: its location, or the activity when no
    /// location was given.
    pub fn lookup_name(&self) -> Option<&str> {
        self.location
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .or_else(|| Some(self.activity.trim()).filter(|value| !value.is_empty()))
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Some(Coordinates { lat, lng }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayPlan {
    pub day_number: u32,
    pub morning: SlotPlan,
    pub afternoon: SlotPlan,
    pub evening: SlotPlan,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub travel_times_seconds: Option<Vec<f64>>,
}

impl DayPlan {
    pub fn slots(&self) -> [&SlotPlan; 3] {
        [&self.morning, &self.afternoon, &self.evening]
    }

    pub fn slots_mut(&mut self) -> [&mut SlotPlan; 3] {
        [&mut self.morning, &mut self.afternoon, &mut self.evening]
    }
}

pub type Itinerary = Vec<DayPlan>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BreakdownEntry {
    Amount(f64),
    Note(String),
}

impl BreakdownEntry {
    pub fn amount(&self) -> Option<f64> {
        match self {
            Self::Amount(value) => Some(*value),
            Self::Note(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlternativeScenario {
    pub title: String,
    pub description: String,
    pub new_duration_days: u32,
    #[serde(default)]
    pub new_budget_range: Option<String>,
    pub estimated_cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightLeg {
    pub duration: String,
    pub stops: u8,
    pub departure_time: String,
    pub arrival_time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightOption {
    pub airline: String,
    pub price: f64,
    pub currency: String,
    #[serde(rename = "type")]
    pub trip_type: String,
    pub outbound: FlightLeg,
    #[serde(rename = "return")]
    pub return_leg: FlightLeg,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetInfo {
    pub total_estimated_cost: f64,
    pub breakdown: BTreeMap<String, BreakdownEntry>,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternative_scenarios: Option<Vec<AlternativeScenario>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flight_options: Option<Vec<FlightOption>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    Draft,
    Generated,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripPlan {
    pub parameters: TripParameters,
    pub itinerary: Itinerary,
    pub budget_info: BudgetInfo,
    pub research_info: Findings,
    pub status: PlanStatus,
}
