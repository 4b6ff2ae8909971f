//! Race results from the external results endpoint.
//!
//! The endpoint is a black box that answers `GET <endpoint>?date=YYYY-MM-DD`
//! with `{status, races, message?}`. Failures never propagate: they come back
//! as a day with `status = "error"`.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::config::RacesConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceDay {
    pub status: String,
    #[serde(default)]
    pub races: Vec<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RaceDay {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            races: Vec::new(),
            message: Some(message.into()),
        }
    }
}

#[async_trait]
pub trait RaceResultsSource: Send + Sync {
    async fn races_for(&self, date: NaiveDate) -> RaceDay;
}

pub type DynRaceResults = Arc<dyn RaceResultsSource>;

pub struct HttpRaceResults {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpRaceResults {
    pub fn new(config: &RacesConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        let endpoint = Url::parse(&config.endpoint)?;
        Ok(Self { client, endpoint })
    }

    async fn fetch(&self, date: NaiveDate) -> Result<RaceDay, String> {
        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[("date", date.format("%Y-%m-%d").to_string())])
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("Network error: {}", status.as_u16()));
        }

        response.json::<RaceDay>().await.map_err(|e| e.to_string())
    }
}

#[async_trait]
impl RaceResultsSource for HttpRaceResults {
    async fn races_for(&self, date: NaiveDate) -> RaceDay {
        tracing::debug!("Fetching races for {} from {}", date, self.endpoint);
        match self.fetch(date).await {
            Ok(day) => day,
            Err(message) => {
                tracing::warn!("Race results fetch for {} failed: {}", date, message);
                RaceDay::error(message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use std::collections::HashMap;

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/races", addr)
    }

    fn source(endpoint: String) -> HttpRaceResults {
        HttpRaceResults::new(&RacesConfig {
            endpoint,
            timeout_secs: 2,
        })
        .unwrap()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    #[test]
    fn parses_endpoint_payload() {
        let day: RaceDay =
            serde_json::from_str(r#"{"status":"empty","races":[]}"#).unwrap();
        assert_eq!(day.status, "empty");
        assert_eq!(day.message, None);
    }

    #[test]
    fn rejects_malformed_endpoint() {
        let config = RacesConfig {
            endpoint: "not a url".into(),
            timeout_secs: 1,
        };
        assert!(HttpRaceResults::new(&config).is_err());
    }

    #[tokio::test]
    async fn passes_date_and_returns_payload() {
        let app = Router::new().route(
            "/races",
            get(|Query(q): Query<HashMap<String, String>>| async move {
                Json(serde_json::json!({
                    "status": "success",
                    "races": [{ "track": "Thompson", "date": q.get("date") }]
                }))
            }),
        );
        let day = source(serve(app).await).races_for(date()).await;
        assert_eq!(day.status, "success");
        assert_eq!(day.races[0]["date"], "2025-06-01");
    }

    #[tokio::test]
    async fn http_errors_fold_into_status() {
        let app = Router::new().route("/races", get(|| async { StatusCode::BAD_GATEWAY }));
        let day = source(serve(app).await).races_for(date()).await;
        assert_eq!(day.status, "error");
        assert_eq!(day.message.as_deref(), Some("Network error: 502"));
        assert!(day.races.is_empty());
    }

    #[tokio::test]
    async fn unreachable_endpoint_folds_into_status() {
        let day = source("http://127.0.0.1:9/races".into()).races_for(date()).await;
        assert_eq!(day.status, "error");
        assert!(day.message.is_some());
    }
}
