use serde::Deserialize;

use crate::models::{Coordinates, DayPlan, Findings, Itinerary, SlotPlan, TripParameters};
use crate::shape::{ShapeError, ValidatedShape};

/// Day list returned by inference, before it is checked against the trip
/// length with [`GeneratedItinerary::for_duration`].
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct GeneratedItinerary(pub Vec<DayPlan>);

impl ValidatedShape for GeneratedItinerary {
    fn validate(mut self) -> Result<Self, ShapeError> {
        if self.0.is_empty() {
            return Err(ShapeError::violation("itinerary has no days"));
        }
        for (idx, day) in self.0.iter_mut().enumerate() {
            let expected = idx as u32 + 1;
            if day.day_number != expected {
                return Err(ShapeError::violation(format!(
                    "day {} found where day {expected} was expected",
                    day.day_number
                )));
            }
            for slot in day.slots_mut() {
                if slot.activity.trim().is_empty() {
                    return Err(ShapeError::violation(format!(
                        "day {expected} has a slot without an activity"
                    )));
                }
                // coordinates come from the place lookup, never from inference
                slot.lat = None;
                slot.lng = None;
            }
            day.travel_times_seconds = None;
        }
        Ok(self)
    }
}

impl GeneratedItinerary {
    pub fn for_duration(self, duration_days: u32) -> Result<Itinerary, ShapeError> {
        if self.0.len() != duration_days as usize {
            return Err(ShapeError::violation(format!(
                "itinerary has {} days, trip has {duration_days}",
                self.0.len()
            )));
        }
        Ok(self.0)
    }
}

pub fn fallback_itinerary(params: &TripParameters) -> Itinerary {
    (1..=params.duration_days)
        .map(|day_number| DayPlan {
            day_number,
            morning: SlotPlan::new(
                format!("Explore {}", params.destination),
                "Visit local landmarks.",
                "City Center",
            ),
            afternoon: SlotPlan::new(
                "Local Culture",
                "Immerse in the local atmosphere.",
                "Old Town",
            ),
            evening: SlotPlan::new("Dinner & Relax", "Enjoy local cuisine.", "Restaurant District"),
            travel_times_seconds: None,
        })
        .collect()
}

/// Pairs of slots that follow each other directly and were both resolved.
/// An unresolved slot ends the run.
pub fn adjacent_pairs(resolved: &[Option<Coordinates>]) -> Vec<(Coordinates, Coordinates)> {
    resolved
        .windows(2)
        .filter_map(|window| match (window[0], window[1]) {
            (Some(from), Some(to)) => Some((from, to)),
            _ => None,
        })
        .collect()
}

pub fn itinerary_prompt(params: &TripParameters, findings: &Findings) -> String {
    let findings_json = serde_json::to_string(findings).unwrap_or_else(|_| "{}".to_string());
    let destination = &params.destination;
    format!(
        "Create a logical day-by-day itinerary for a {days}-day trip to {destination}.\n\n\
         Research Findings:\n{findings_json}\n\n\
         Constraints:\n\
         - Travel Style: {style}\n\
         - Interests: {interests}\n\
         - Budget Range: {tier}\n\n\
         The budget range is a quality level, not a strict dollar limit. Suggest what \
         travellers actually do in {destination} at that level.\n\n\
         Return a JSON list with exactly {days} items, one per day, each with 'day_number' \
         (starting at 1), 'morning', 'afternoon' and 'evening'. Each slot has 'activity', \
         'description' and 'location'.",
        days = params.duration_days,
        style = params.preferences.travel_style.as_deref().unwrap_or("unspecified"),
        interests = params.preferences.interests.join(", "),
        tier = params.quality_tier().unwrap_or("unspecified"),
    )
}
