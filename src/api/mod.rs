//! HTTP API exposing the daily summary.
//!
//! | Route              | Source |
//! |--------------------|--------|
//! | `GET /status`      | mock document |
//! | `GET /api/v1/summary?device_id=&date=&columns=` | live SEMS fetch |
//! | `GET /api/v1/table?device_id=&date=&columns=`   | live SEMS fetch, aligned rows |
//!
//! An empty summary is returned as `{}`, meaning "no data", not as an error.

mod error;
mod handlers;
mod routes;

pub use error::ApiError;
pub use routes::create_router;

use std::path::PathBuf;
use std::sync::Arc;

use crate::services::{Credentials, SemsApi};

#[derive(Clone)]
pub struct AppState {
    pub sems: Arc<dyn SemsApi>,
    /// `None` disables the live routes (503).
    pub credentials: Option<Credentials>,
    pub mock_path: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{Region, SemsError, SessionToken};
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use serde_json::{Value, json};
    use std::env;
    use tower::ServiceExt;

    struct FakeSems {
        reject_login: bool,
    }

    #[async_trait::async_trait]
    impl SemsApi for FakeSems {
        async fn login(&self, _credentials: &Credentials) -> Result<SessionToken, SemsError> {
            if self.reject_login {
                Err(SemsError::Auth("bad password".into()))
            } else {
                Ok(SessionToken::new("t"))
            }
        }

        async fn fetch_column(
            &self,
            _token: &SessionToken,
            _device_id: &str,
            column: &str,
            _date: &str,
            _region: Region,
        ) -> Result<Value, SemsError> {
            Ok(match column {
                "Pac" => json!({"data": {"column1": [
                    {"date": "2025-08-12 10:00:00", "column": 800},
                    {"date": "2025-08-12 12:00:00", "column": 2500},
                    {"date": "2025-08-12 17:00:00", "column": 40}
                ]}}),
                "Eday" => json!({"data": {"column1": [
                    {"date": "2025-08-12 17:00:00", "column": "9,5"}
                ]}}),
                _ => json!({"code": 0, "data": {}}),
            })
        }
    }

    fn state(reject_login: bool, with_credentials: bool, mock_path: PathBuf) -> AppState {
        AppState {
            sems: Arc::new(FakeSems { reject_login }),
            credentials: with_credentials.then(|| Credentials {
                account: "a".into(),
                password: "b".into(),
                login_region: Region::Us,
                data_region: Region::Eu,
            }),
            mock_path,
        }
    }

    fn missing_mock() -> PathBuf {
        env::temp_dir().join("sems_daily_api_missing_mock.json")
    }

    async fn get(state: AppState, uri: &str) -> (StatusCode, Value) {
        let response = create_router(state)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_root_and_health() {
        let (status, body) = get(state(false, true, missing_mock()), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["message"].is_string());

        let (status, body) = get(state(false, true, missing_mock()), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_status_without_mock_is_empty_object() {
        let (status, body) = get(state(false, true, missing_mock()), "/status").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({}));
    }

    #[tokio::test]
    async fn test_status_reads_mock() {
        let path = env::temp_dir().join("sems_daily_api_status_mock.json");
        std::fs::write(
            &path,
            r#"{"data": [
                {"time": "2025-08-12T09:00:00", "Pac": 100, "Eday": 1.0},
                {"time": "2025-08-12T13:00:00", "Pac": 2000, "Eday": 5.5}
            ]}"#,
        )
        .unwrap();

        let (status, body) = get(state(false, true, path.clone()), "/status").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["energia_dia"], 5.5);
        assert_eq!(body["pico_potencia"], 2000.0);
        assert_eq!(body["hora_pico"], "2025-08-12T13:00:00");
        assert_eq!(body["status"], "ligado");

        std::fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_live_summary() {
        let (status, body) = get(
            state(false, true, missing_mock()),
            "/api/v1/summary?device_id=SN-1&date=2025-08-12&columns=Pac,Eday,Cbattery1",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["energia_dia"], 9.5);
        assert_eq!(body["pico_potencia"], 2500.0);
        assert_eq!(body["hora_pico"], "2025-08-12T12:00:00");
        assert_eq!(body["status"], "ligado");
        assert!(body["soc_ini"].is_null());
    }

    #[tokio::test]
    async fn test_live_summary_without_data_is_empty_object() {
        let (status, body) = get(
            state(false, true, missing_mock()),
            "/api/v1/summary?device_id=SN-1&date=2025-08-12&columns=Temp",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({}));
    }

    #[tokio::test]
    async fn test_live_table_reports_empty_columns() {
        let (status, body) = get(
            state(false, true, missing_mock()),
            "/api/v1/table?device_id=SN-1&date=2025-08-12&columns=Pac,Temp",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["table"]["columns"], json!(["Pac"]));
        assert_eq!(body["table"]["rows"].as_array().unwrap().len(), 3);
        assert_eq!(body["empty_columns"][0]["column"], "Temp");
    }

    #[tokio::test]
    async fn test_error_statuses() {
        let (status, _) = get(
            state(false, true, missing_mock()),
            "/api/v1/summary?device_id=SN-1&date=12/08/2025",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = get(state(true, true, missing_mock()), "/api/v1/summary?device_id=SN-1").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["error"].as_str().unwrap().contains("bad password"));

        let (status, _) = get(state(false, false, missing_mock()), "/api/v1/summary?device_id=SN-1").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }
}
