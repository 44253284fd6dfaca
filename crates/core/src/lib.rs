pub mod budget;
pub mod collaborators;
pub mod extraction;
pub mod heuristics;
pub mod itinerary;
pub mod models;
pub mod normalize;
pub mod research;
pub mod shape;

pub use collaborators::{
    CollaboratorError, CurrencyRate, FlightPrices, GenerativeInference, PlaceLookup,
    RouteDuration, TextSearch, WeatherForecast,
};
pub use extraction::ExtractedTrip;
pub use heuristics::fallback_parameters;
pub use models::*;
pub use normalize::{normalize_offline, NormalizationPass};
pub use shape::{parse_shape, ShapeError, ValidatedShape};
