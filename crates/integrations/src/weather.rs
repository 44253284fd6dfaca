use std::collections::BTreeMap;

use async_trait::async_trait;
use dreamtrip_core::{DailyTemperature, WeatherForecast, WeatherReport, WeatherStatus};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::{network_error, read_json};

const SERVICE: &str = "openweathermap";
const ENDPOINT: &str = "https://api.openweathermap.org/data/2.5/forecast";
const MAX_DAYS: usize = 7;

pub struct OpenWeatherClient {
    http: Client,
    api_key: Option<String>,
}

impl OpenWeatherClient {
    pub fn new(http: Client, api_key: Option<String>) -> Self {
        Self { http, api_key }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ForecastResponse {
    #[serde(default)]
    list: Vec<ForecastSample>,
}

#[derive(Debug, Deserialize)]
struct ForecastSample {
    #[serde(default)]
    dt_txt: String,
    #[serde(default)]
    main: Option<SampleMain>,
}

#[derive(Debug, Deserialize)]
struct SampleMain {
    temp: Option<f64>,
}

#[async_trait]
impl WeatherForecast for OpenWeatherClient {
    #[instrument(skip(self))]
    async fn forecast(&self, city: &str) -> WeatherReport {
        let Some(api_key) = self.api_key.as_deref() else {
            debug!("weather credentials missing");
            return WeatherReport::unavailable();
        };

        let request = self
            .http
            .get(ENDPOINT)
            .query(&[("q", city), ("appid", api_key), ("units", "metric")])
            .send();

        let body = match request.await.map_err(network_error) {
            Ok(response) => read_json::<ForecastResponse>(SERVICE, response).await,
            Err(err) => Err(err),
        };

        match body {
            Ok(body) => aggregate_daily(body),
            Err(err) => {
                warn!(error = %err, "weather forecast failed");
                WeatherReport::error()
            }
        }
    }
}

/// Averages 3-hourly samples per date, in date order, rounded to 0.1 C and
/// capped at the first seven days. A date without temperatures averages 0.0.
pub(crate) fn aggregate_daily(body: ForecastResponse) -> WeatherReport {
    // ISO dates order lexicographically
    let mut days: BTreeMap<String, (f64, u32)> = BTreeMap::new();

    for sample in body.list {
        let Some(date) = sample.dt_txt.split(' ').next().filter(|date| !date.is_empty()) else {
            continue;
        };
        let day = days.entry(date.to_string()).or_insert((0.0, 0));
        if let Some(temp) = sample.main.and_then(|main| main.temp) {
            day.0 += temp;
            day.1 += 1;
        }
    }

    let daily = days
        .into_iter()
        .take(MAX_DAYS)
        .map(|(date, (sum, count))| DailyTemperature {
            date,
            avg_temp_c: (sum / f64::from(count.max(1)) * 10.0).round() / 10.0,
        })
        .collect();

    WeatherReport {
        status: WeatherStatus::Ok,
        daily,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(dt_txt: &str, temp: Option<f64>) -> serde_json::Value {
        match temp {
            Some(temp) => serde_json::json!({ "dt_txt": dt_txt, "main": { "temp": temp } }),
            None => serde_json::json!({ "dt_txt": dt_txt, "main": {} }),
        }
    }

    #[test]
    fn averages_per_date_in_order() {
        let body: ForecastResponse = serde_json::from_value(serde_json::json!({
            "list": [
                sample("2026-03-01 09:00:00", Some(20.0)),
                sample("2026-03-01 12:00:00", Some(23.15)),
                sample("2026-03-02 09:00:00", None),
                sample("", Some(99.0)),
                sample("2026-03-03 00:00:00", Some(-1.26)),
            ]
        }))
        .unwrap();

        let report = aggregate_daily(body);
        assert_eq!(report.status, WeatherStatus::Ok);
        let dates = report.daily.iter().map(|day| day.date.as_str()).collect::<Vec<_>>();
        assert_eq!(dates, vec!["2026-03-01", "2026-03-02", "2026-03-03"]);
        assert_eq!(report.daily[0].avg_temp_c, 21.6);
        assert_eq!(report.daily[1].avg_temp_c, 0.0);
        assert_eq!(report.daily[2].avg_temp_c, -1.3);
    }

    #[test]
    fn out_of_order_samples_come_back_sorted() {
        let body: ForecastResponse = serde_json::from_value(serde_json::json!({
            "list": [
                sample("2026-05-03 09:00:00", Some(18.0)),
                sample("2026-05-01 09:00:00", Some(10.0)),
                sample("2026-05-02 09:00:00", Some(14.0)),
                sample("2026-05-01 15:00:00", Some(12.0)),
            ]
        }))
        .unwrap();

        let report = aggregate_daily(body);
        let dates = report.daily.iter().map(|day| day.date.as_str()).collect::<Vec<_>>();
        assert_eq!(dates, vec!["2026-05-01", "2026-05-02", "2026-05-03"]);
        assert_eq!(report.daily[0].avg_temp_c, 11.0);
    }

    #[test]
    fn caps_at_seven_days() {
        let list = (1..=9)
            .rev()
            .map(|day| sample(&format!("2026-04-{day:02} 12:00:00"), Some(15.0)))
            .collect::<Vec<_>>();
        let body: ForecastResponse =
            serde_json::from_value(serde_json::json!({ "list": list })).unwrap();
        let report = aggregate_daily(body);
        assert_eq!(report.daily.len(), 7);
        assert_eq!(report.daily[6].date, "2026-04-07");
    }

    #[tokio::test]
    async fn missing_key_is_unavailable() {
        let client = OpenWeatherClient::new(Client::new(), None);
        assert_eq!(client.forecast("Tokyo").await.status, WeatherStatus::Unavailable);
    }
}
