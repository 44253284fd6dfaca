use async_trait::async_trait;
use dreamtrip_core::{CollaboratorError, FlightLeg, FlightOption, FlightPrices};
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sha2::{Digest, Sha256};
use tracing::instrument;

const AIRLINES: [&str; 4] = ["SkyHigh Air", "Oceanic Airlines", "Global Wings", "BudgetFly"];
const OPTIONS_PER_ROUTE: usize = 3;
const STOPS: [u8; 3] = [0, 1, 2];

/// Flight quotes generated from the route alone. There is no live provider;
/// the same origin and destination always produce the same options.
#[derive(Debug, Default, Clone, Copy)]
pub struct SimulatedFlights;

#[async_trait]
impl FlightPrices for SimulatedFlights {
    #[instrument(skip(self))]
    async fn quote(
        &self,
        origin: &str,
        destination: &str,
    ) -> Result<Vec<FlightOption>, CollaboratorError> {
        Ok(simulate_route(origin, destination))
    }
}

pub fn simulate_route(origin: &str, destination: &str) -> Vec<FlightOption> {
    let origin = origin.trim();
    let destination = destination.trim();
    if origin.is_empty() || destination.is_empty() {
        return Vec::new();
    }

    let mut rng = route_rng(origin, destination);
    let base_price = 300 + 20 * (origin.chars().count() + destination.chars().count()) as i64;

    let airlines = AIRLINES
        .choose_multiple(&mut rng, OPTIONS_PER_ROUTE)
        .copied()
        .collect::<Vec<_>>();
    let mut options = airlines
        .into_iter()
        .map(|airline| {
            let price = base_price + rng.random_range(-50..=150);
            FlightOption {
                airline: airline.to_string(),
                price: price as f64,
                currency: "USD".to_string(),
                trip_type: "Round Trip".to_string(),
                outbound: random_leg(&mut rng),
                return_leg: random_leg(&mut rng),
            }
        })
        .collect::<Vec<_>>();

    options.sort_by(|a, b| a.price.total_cmp(&b.price));
    for idx in 1..options.len() {
        if options[idx].price <= options[idx - 1].price {
            options[idx].price = options[idx - 1].price + 1.0;
        }
    }
    options
}

/// ChaCha8 keyed by a SHA-256 of the route, so quotes do not depend on the
/// platform or the std hasher.
fn route_rng(origin: &str, destination: &str) -> ChaCha8Rng {
    let digest = Sha256::digest(format!("{origin}-{destination}").as_bytes());
    let mut seed = [0u8; 32];
    seed.copy_from_slice(&digest);
    ChaCha8Rng::from_seed(seed)
}

fn random_leg(rng: &mut ChaCha8Rng) -> FlightLeg {
    let hours = rng.random_range(3..=15);
    let minutes = rng.random_range(0..=59);
    let stops = STOPS.choose(rng).copied().unwrap_or(0);
    FlightLeg {
        duration: format!("{hours}h {minutes}m"),
        stops,
        departure_time: clock_time(rng),
        arrival_time: clock_time(rng),
    }
}

fn clock_time(rng: &mut ChaCha8Rng) -> String {
    format!(
        "{:02}:{:02}",
        rng.random_range(6..=20),
        rng.random_range(0..=59)
    )
}
