use serde::Deserialize;

use crate::models::{
    TripParameters, TripPreferences, DEFAULT_DURATION_DAYS, MAX_DURATION_DAYS,
    UNKNOWN_DESTINATION,
};
use crate::shape::{ShapeError, ValidatedShape};

/// Parameter record requested from inference during extraction.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractedTrip {
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default)]
    pub duration_days: Option<u32>,
    #[serde(default)]
    pub budget_total: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub travelers: Option<u32>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub preferences: Option<ExtractedPreferences>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtractedPreferences {
    #[serde(default)]
    pub interests: Option<Vec<String>>,
    #[serde(default)]
    pub budget_range: Option<String>,
    #[serde(default)]
    pub travel_style: Option<String>,
    #[serde(default)]
    pub dietary_restrictions: Option<Vec<String>>,
}

impl ValidatedShape for ExtractedTrip {
    fn validate(mut self) -> Result<Self, ShapeError> {
        match self.duration_days {
            Some(0) => return Err(ShapeError::violation("duration_days must be at least 1")),
            Some(days) if days > MAX_DURATION_DAYS => {
                return Err(ShapeError::violation(format!(
                    "duration_days must be at most {MAX_DURATION_DAYS}"
                )))
            }
            _ => {}
        }
        if self.travelers == Some(0) {
            return Err(ShapeError::violation("travelers must be at least 1"));
        }
        if let Some(budget) = self.budget_total {
            if !budget.is_finite() || budget < 0.0 {
                return Err(ShapeError::violation("budget_total must be non-negative"));
            }
        }
        if let Some(currency) = self.currency.take() {
            let code = currency.trim().to_ascii_uppercase();
            if code.len() != 3 || !code.chars().all(|ch| ch.is_ascii_alphabetic()) {
                return Err(ShapeError::violation(format!(
                    "currency '{currency}' is not a 3-letter code"
                )));
            }
            self.currency = Some(code);
        }
        Ok(self)
    }
}

impl ExtractedTrip {
    pub fn into_parameters(self, original_request: &str) -> TripParameters {
        let destination = self
            .destination
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| UNKNOWN_DESTINATION.to_string());

        let mut params = TripParameters::new(
            destination,
            self.duration_days.unwrap_or(DEFAULT_DURATION_DAYS),
            original_request,
        );
        params.budget_total = self.budget_total;
        if let Some(currency) = self.currency {
            params.currency = currency;
        }
        params.travelers = self.travelers.unwrap_or(1);
        params.start_date = non_empty(self.start_date);
        params.origin = non_empty(self.origin);

        let prefs = self.preferences.unwrap_or_default();
        params.preferences = TripPreferences {
            interests: prefs.interests.unwrap_or_default(),
            budget_range: non_empty(prefs.budget_range),
            travel_style: non_empty(prefs.travel_style),
            dietary_restrictions: prefs.dietary_restrictions.unwrap_or_default(),
        };
        params
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn extraction_prompt(text: &str) -> String {
    format!(
        r#"You are the trip interpreter for a travel planning application.
Extract structured travel parameters from the traveler's description.

Traveler description: "{text}"

Return ONLY a JSON object with these fields:
- destination (string, required). Capitalize properly ("bali" -> "Bali"). If impossible to infer, use "Unknown".
- origin (string or null). Where the trip starts ("from London").
- duration_days (integer, default 7). "1-week" -> 7, "2 weeks" -> 14, "weekend" -> 3, "10 days" -> 10.
- budget_total (number or null). "under $500", "max 1000" -> the number.
- currency (3-letter code, default "USD")
- travelers (integer, default 1)
- start_date (YYYY-MM-DD or null)
- preferences: {{
    "interests": [strings inferred from keywords],
    "budget_range": "budget" | "moderate" | "luxury" or a similar quality label,
    "travel_style": "relaxed" | "adventurous" | "balanced",
    "dietary_restrictions": [strings]
  }}"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::parse_shape;

    #[test]
    fn parses_fenced_extraction() {
        let raw = "```json\n{\"destination\":\"Kyoto\",\"duration_days\":5,\"currency\":\"jpy\",\"travelers\":2,\"preferences\":{\"interests\":[\"Temples\"]}}\n```";
        let params = parse_shape::<ExtractedTrip>(raw)
            .unwrap()
            .into_parameters("five days in kyoto for two");
        assert_eq!(params.destination, "Kyoto");
        assert_eq!(params.duration_days, 5);
        assert_eq!(params.currency, "JPY");
        assert_eq!(params.travelers, 2);
        assert_eq!(params.preferences.interests, vec!["Temples"]);
        assert_eq!(params.original_request(), "five days in kyoto for two");
    }

    #[test]
    fn missing_fields_take_defaults() {
        let params = parse_shape::<ExtractedTrip>("{}")
            .unwrap()
            .into_parameters("something");
        assert_eq!(params.destination, UNKNOWN_DESTINATION);
        assert_eq!(params.duration_days, 7);
        assert_eq!(params.currency, "USD");
        assert_eq!(params.travelers, 1);
    }

    #[test]
    fn rejects_invalid_shapes() {
        assert!(parse_shape::<ExtractedTrip>("{\"duration_days\": 0}").is_err());
        assert!(parse_shape::<ExtractedTrip>("{\"duration_days\": 4000000000}").is_err());
        assert!(parse_shape::<ExtractedTrip>("{\"budget_total\": -5}").is_err());
        assert!(parse_shape::<ExtractedTrip>("{\"currency\": \"dollars\"}").is_err());
        assert!(parse_shape::<ExtractedTrip>("{\"duration_days\": \"ten\"}").is_err());
        assert!(parse_shape::<ExtractedTrip>("[1, 2]").is_err());
    }
}
