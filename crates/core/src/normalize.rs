use crate::heuristics::{
    budget_from_text, destination_after_to, duration_from_text, strip_destination_noise,
};
use crate::models::{TripParameters, UNKNOWN_DESTINATION};

pub const TAG_DESTINATION_NORMALIZED: &str = "destination_normalized";
pub const TAG_DESTINATION_VALIDATED: &str = "destination_validated";
pub const TAG_BUDGET_EXTRACTED: &str = "budget_extracted";

/// One normalization pass over a candidate parameter set.
///
/// The pass is split around the place lookup: `begin` runs the destination
/// text rules, the caller resolves `destination()` against a place lookup and
/// hands the first result to `adopt_lookup_name`, and `finish` applies the
/// budget and duration rules and merges the fired tags.
#[derive(Debug)]
pub struct NormalizationPass {
    params: TripParameters,
    destination: String,
    tags: Vec<&'static str>,
}

impl NormalizationPass {
    pub fn begin(params: TripParameters) -> Self {
        let mut tags = Vec::new();

        let current = if params.destination.is_empty() {
            UNKNOWN_DESTINATION.to_string()
        } else {
            params.destination.clone()
        };

        let mut destination = strip_destination_noise(&current);
        if destination.is_empty() {
            destination = UNKNOWN_DESTINATION.to_string();
        }
        if destination != current {
            tags.push(TAG_DESTINATION_NORMALIZED);
        }

        if destination.eq_ignore_ascii_case(UNKNOWN_DESTINATION) {
            if let Some(found) = destination_after_to(params.original_request())
                .map(|found| strip_destination_noise(&found))
                .filter(|found| !found.is_empty())
            {
                destination = found;
            }
        }

        Self {
            params,
            destination,
            tags,
        }
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// Adopts a canonical name from the place lookup when it differs from the
    /// current destination. Names the text rules would rewrite are ignored so
    /// that a second pass leaves the destination unchanged.
    pub fn adopt_lookup_name(&mut self, name: Option<&str>) {
        let Some(name) = name.map(str::trim).filter(|name| !name.is_empty()) else {
            return;
        };
        if name == self.destination || strip_destination_noise(name) != name {
            return;
        }
        self.destination = name.to_string();
        self.tags.push(TAG_DESTINATION_VALIDATED);
    }

    pub fn finish(self) -> TripParameters {
        let Self {
            mut params,
            destination,
            mut tags,
        } = self;

        params.destination = destination;

        if params.budget_total.is_none() {
            if let Some(budget) = budget_from_text(params.original_request()) {
                params.budget_total = Some(budget);
                params.currency = "USD".to_string();
                tags.push(TAG_BUDGET_EXTRACTED);
            }
        }

        params.duration_days = duration_from_text(params.original_request(), params.duration_days);
        params.record_warnings(tags);
        params
    }
}

/// Runs a pass with no place lookup result.
pub fn normalize_offline(params: TripParameters) -> TripParameters {
    NormalizationPass::begin(params).finish()
}
