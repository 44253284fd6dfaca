//! Deterministic text heuristics for trip parameter extraction.
//!
//! These rules are used when inference is unavailable and by the normalizer
//! to cross-check inferred parameters against the original text. Tie-break
//! and ordering rules are intentionally literal.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

use crate::models::{TripParameters, TripPreferences, DEFAULT_DURATION_DAYS, MAX_DURATION_DAYS};

pub const FALLBACK_DESTINATION: &str = "Unknown Destination";

const PHRASE_CONNECTORS: &[&str] = &[
    "for", "with", "and", "day", "days", "week", "weeks", "under", "below", "max",
];

static FALLBACK_BUDGET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\s?(\d+(?:,\d{3})*)").expect("valid fallback budget regex"));

static DOLLAR_AMOUNT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\s?\d+(?:,\d{3})*(?:\.\d+)?").expect("valid dollar amount regex")
});

static DESTINATION_NOISE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:under|below|max|upto|up to|budget|cheap|affordable|usd|eur|gbp|dollars)\b",
    )
    .expect("valid destination noise regex")
});

static TO_DESTINATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bto\s+([A-Za-z ]+?)(?:\s+(?:under|for|with|on|in|by|from)\b|\s+\d|$)")
        .expect("valid secondary destination regex")
});

static CAPPED_BUDGET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:under|below|max|upto|up to)\s*\$?\s*(\d+(?:,\d{3})*)")
        .expect("valid capped budget regex")
});

static ANY_BUDGET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\s*(\d+(?:,\d{3})*)").expect("valid budget regex"));

static DAYS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d+)[\s-]*days?\b").expect("valid days regex"));

static WEEKS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d+)[\s-]*weeks?\b").expect("valid weeks regex"));

static WEEKEND: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)weekend").expect("valid weekend regex"));

/// Builds candidate parameters from raw text without any collaborator.
pub fn fallback_parameters(text: &str) -> TripParameters {
    let budget_total = fallback_budget(text);
    let budget_range = if budget_total.is_some_and(|budget| budget < 1000.0) {
        "budget"
    } else {
        "moderate"
    };

    let mut params = TripParameters::new(fallback_destination(text), DEFAULT_DURATION_DAYS, text);
    params.budget_total = budget_total;
    params.preferences = TripPreferences {
        interests: vec!["General Exploration".to_string()],
        budget_range: Some(budget_range.to_string()),
        travel_style: Some("relaxed".to_string()),
        dietary_restrictions: Vec::new(),
    };
    params
}

/// "(in|to) <phrase>" scan, then the longest capitalized token.
pub fn fallback_destination(text: &str) -> String {
    let words = text.split_whitespace().collect::<Vec<_>>();

    for (idx, word) in words.iter().enumerate() {
        let lower = word.to_lowercase();
        if (lower != "in" && lower != "to") || idx + 1 >= words.len() {
            continue;
        }

        let mut phrase = words[idx + 1].to_string();
        for next in &words[idx + 2..] {
            let continues = starts_uppercase(next)
                || !PHRASE_CONNECTORS.contains(&next.to_lowercase().as_str());
            if !continues {
                break;
            }
            phrase.push(' ');
            phrase.push_str(next);
        }

        let trimmed = strip_punctuation(&phrase);
        if !trimmed.is_empty() {
            return title_case(trimmed);
        }
    }

    let mut best: Option<&str> = None;
    for word in &words {
        if !starts_uppercase(word) || word.chars().count() <= 2 {
            continue;
        }
        let candidate = strip_punctuation(word);
        let longer = best.map_or(true, |current| {
            candidate.chars().count() > current.chars().count()
        });
        if longer {
            best = Some(candidate);
        }
    }

    best.filter(|value| !value.is_empty())
        .map(ToString::to_string)
        .unwrap_or_else(|| FALLBACK_DESTINATION.to_string())
}

pub fn fallback_budget(text: &str) -> Option<f64> {
    FALLBACK_BUDGET
        .captures(text)
        .and_then(|caps| parse_amount(caps.get(1)?.as_str()))
}

/// Removes dollar amounts and budget words from a destination and trims it.
pub fn strip_destination_noise(destination: &str) -> String {
    let without_amounts = DOLLAR_AMOUNT.replace_all(destination, "");
    DESTINATION_NOISE
        .replace_all(&without_amounts, "")
        .trim()
        .to_string()
}

/// Secondary "to <words>" match used when the destination is unknown.
pub fn destination_after_to(text: &str) -> Option<String> {
    TO_DESTINATION
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|found| found.as_str().trim())
        .filter(|found| !found.is_empty())
        .map(title_case)
}

/// Budget mentioned in text: a capped amount first, then any dollar amount.
pub fn budget_from_text(text: &str) -> Option<f64> {
    CAPPED_BUDGET
        .captures(text)
        .or_else(|| ANY_BUDGET.captures(text))
        .and_then(|caps| parse_amount(caps.get(1)?.as_str()))
}

/// Duration priority: "<N> days" > "<N> weeks" > "weekend" > current > 7.
/// Mentions longer than `MAX_DURATION_DAYS` are ignored and the result never
/// exceeds it.
pub fn duration_from_text(text: &str, current: u32) -> u32 {
    let explicit_days = DAYS
        .captures(text)
        .and_then(|caps| caps.get(1)?.as_str().parse::<u32>().ok())
        .filter(|days| *days <= MAX_DURATION_DAYS);
    let explicit_weeks = || {
        WEEKS
            .captures(text)
            .and_then(|caps| caps.get(1)?.as_str().parse::<u32>().ok())
            .and_then(|weeks| weeks.checked_mul(7))
            .filter(|days| *days <= MAX_DURATION_DAYS)
    };

    let duration = explicit_days
        .or_else(explicit_weeks)
        .or_else(|| WEEKEND.is_match(text).then_some(3))
        .unwrap_or(current);

    if duration == 0 {
        DEFAULT_DURATION_DAYS
    } else {
        duration.min(MAX_DURATION_DAYS)
    }
}

pub fn title_case(input: &str) -> String {
    input
        .split_word_bounds()
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) if first.is_alphabetic() => {
                    first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
                }
                _ => segment.to_string(),
            }
        })
        .collect()
}

fn parse_amount(digits: &str) -> Option<f64> {
    digits.replace(',', "").parse::<f64>().ok()
}

fn starts_uppercase(word: &str) -> bool {
    word.chars().next().is_some_and(char::is_uppercase)
}

fn strip_punctuation(word: &str) -> &str {
    word.trim_matches(|ch| matches!(ch, ',' | '.' | '!' | '?'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_finds_destination_after_to() {
        let params = fallback_parameters("7-day trip to Japan under $5000 for culture and food");
        assert_eq!(params.destination, "Japan");
        assert_eq!(params.duration_days, 7);
        assert_eq!(params.budget_total, Some(5000.0));
        assert_eq!(params.preferences.budget_range.as_deref(), Some("moderate"));
        assert_eq!(params.preferences.interests, vec!["General Exploration"]);
        assert_eq!(params.preferences.travel_style.as_deref(), Some("relaxed"));
    }

    #[test]
    fn fallback_title_cases_lowercase_destination() {
        assert_eq!(fallback_destination("10 day trip to bali under $1000"), "Bali");
        assert_eq!(fallback_destination("a week in new york with friends"), "New York");
    }

    #[test]
    fn fallback_keeps_multi_word_phrase_until_connector() {
        assert_eq!(
            fallback_destination("Take me to Rio de Janeiro, for carnival"),
            "Rio De Janeiro"
        );
    }

    #[test]
    fn fallback_uses_longest_capitalized_token_first_on_tie() {
        assert_eq!(fallback_destination("Lisbon or Madrid please"), "Lisbon");
        assert_eq!(fallback_destination("Somewhere near Amsterdam!"), "Somewhere");
        assert_eq!(fallback_destination("beach vibes only"), FALLBACK_DESTINATION);
    }

    #[test]
    fn fallback_budget_handles_thousands_separator() {
        assert_eq!(fallback_budget("about $2,500 total"), Some(2500.0));
        assert_eq!(fallback_budget("no money talk"), None);
        let params = fallback_parameters("trip to Rome for $800");
        assert_eq!(params.preferences.budget_range.as_deref(), Some("budget"));
    }

    #[test]
    fn strips_amounts_and_budget_words() {
        assert_eq!(strip_destination_noise("Bali under $1000"), "Bali");
        assert_eq!(strip_destination_noise("cheap Lisbon USD"), "Lisbon");
        assert_eq!(strip_destination_noise("Budapest"), "Budapest");
        assert_eq!(strip_destination_noise("budget $500"), "");
    }

    #[test]
    fn secondary_match_stops_at_connector_or_digit() {
        assert_eq!(
            destination_after_to("trip to costa rica for surfing").as_deref(),
            Some("Costa Rica")
        );
        assert_eq!(destination_after_to("going to peru 5 days").as_deref(), Some("Peru"));
        assert_eq!(destination_after_to("to iceland").as_deref(), Some("Iceland"));
        assert_eq!(destination_after_to("somewhere warm"), None);
    }

    #[test]
    fn capped_budget_takes_priority() {
        assert_eq!(budget_from_text("$200 flights but under $1,500 overall"), Some(1500.0));
        assert_eq!(budget_from_text("max 900 please"), Some(900.0));
        assert_eq!(budget_from_text("costs $300"), Some(300.0));
        assert_eq!(budget_from_text("no budget"), None);
    }

    #[test]
    fn duration_priority_order() {
        assert_eq!(duration_from_text("10 day trip", 7), 10);
        assert_eq!(duration_from_text("2 weeks and 3 days", 7), 3);
        assert_eq!(duration_from_text("2 weeks in Peru", 7), 14);
        assert_eq!(duration_from_text("a weekend in Paris", 7), 3);
        assert_eq!(duration_from_text("a trip to Paris", 5), 5);
        assert_eq!(duration_from_text("0 days anywhere", 5), 7);
        assert_eq!(duration_from_text("7-day trip", 4), 7);
    }

    #[test]
    fn oversized_durations_are_ignored_or_capped() {
        assert_eq!(duration_from_text("4000000000 days in Rome", 7), 7);
        assert_eq!(duration_from_text("400 days in Rome", 5), 5);
        assert_eq!(duration_from_text("60 weeks in Peru", 7), 7);
        assert_eq!(duration_from_text("a trip to Rome", 100_000), MAX_DURATION_DAYS);
        assert_eq!(duration_from_text("365 days in Rome", 7), 365);
    }

    #[test]
    fn title_case_matches_word_boundaries() {
        assert_eq!(title_case("new YORK city"), "New York City");
        assert_eq!(title_case("são paulo"), "São Paulo");
    }
}
