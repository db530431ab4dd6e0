use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::fetch::auth::{TokenHeader, pre_login_token, session_token};
use crate::fetch::{BasicClient, HttpClient, post_json};
use crate::services::{Credentials, Region, SemsApi, SemsError, SessionToken};

const LOGIN_PATH: &str = "/api/v2/common/crosslogin";
const COLUMN_PATH: &str = "/api/PowerStationMonitor/GetInverterDataByColumn";

/// Login response codes meaning success; they differ per region.
const LOGIN_OK_CODES: &[i64] = &[0, 1, 200];

/// Portal host per region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseUrls {
    pub us: String,
    pub eu: String,
}

impl BaseUrls {
    /// Uses `url` for every region.
    pub fn single(url: impl Into<String>) -> Self {
        let url = url.into().trim_end_matches('/').to_string();
        Self {
            us: url.clone(),
            eu: url,
        }
    }

    pub fn get(&self, region: Region) -> &str {
        match region {
            Region::Us => &self.us,
            Region::Eu => &self.eu,
        }
    }
}

impl Default for BaseUrls {
    fn default() -> Self {
        Self {
            us: "https://us.semsportal.com".to_string(),
            eu: "https://eu.semsportal.com".to_string(),
        }
    }
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    account: &'a str,
    pwd: &'a str,
    agreement_agreement: u8,
    is_local: bool,
}

#[derive(Serialize)]
struct ColumnRequest<'a> {
    date: &'a str,
    column: &'a str,
    id: &'a str,
}

/// HTTP implementation of [`SemsApi`].
pub struct SemsClient<C = BasicClient> {
    http: C,
    base_urls: BaseUrls,
}

impl<C: HttpClient> SemsClient<C> {
    pub fn new(http: C, base_urls: BaseUrls) -> Self {
        Self { http, base_urls }
    }

    fn url(&self, region: Region, path: &str) -> String {
        format!("{}{}", self.base_urls.get(region), path)
    }
}

#[async_trait]
impl<C: HttpClient> SemsApi for SemsClient<C> {
    #[tracing::instrument(skip_all, fields(account = %credentials.account, region = %credentials.login_region))]
    async fn login(&self, credentials: &Credentials) -> Result<SessionToken, SemsError> {
        let url = self.url(credentials.login_region, LOGIN_PATH);
        let pre_login = pre_login_token();
        let client = TokenHeader::new(&self.http, &pre_login)?;

        let body = LoginRequest {
            account: &credentials.account,
            pwd: &credentials.password,
            agreement_agreement: 0,
            is_local: false,
        };

        let response = post_json(&client, &url, &body).await?;
        let token = parse_login_response(&response)?;
        info!("SEMS login succeeded");
        Ok(token)
    }

    #[tracing::instrument(skip(self, token, region), fields(region = %region))]
    async fn fetch_column(
        &self,
        token: &SessionToken,
        device_id: &str,
        column: &str,
        date: &str,
        region: Region,
    ) -> Result<Value, SemsError> {
        let url = self.url(region, COLUMN_PATH);
        let client = TokenHeader::new(&self.http, token.as_str())?;

        let body = ColumnRequest {
            date,
            column,
            id: device_id,
        };

        let response = post_json(&client, &url, &body).await?;
        debug!("Column payload received");
        Ok(response)
    }
}

/// Turns a login reply into a session token.
///
/// The reply must carry a non-null `data` object and a known success code.
fn parse_login_response(response: &Value) -> Result<SessionToken, SemsError> {
    let code = response.get("code").and_then(Value::as_i64);
    let data = response.get("data").filter(|d| !d.is_null());

    match (code, data) {
        (Some(code), Some(data)) if LOGIN_OK_CODES.contains(&code) => {
            Ok(SessionToken::new(session_token(data)))
        }
        _ => {
            let reason = response
                .get("msg")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| clip(&response.to_string(), 300));
            Err(SemsError::Auth(format!("code {code:?}: {reason}")))
        }
    }
}

fn clip(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_login_response_success_codes() {
        for code in [0, 1, 200] {
            let reply = json!({"code": code, "data": {"uid": "u", "token": "t"}});
            assert!(parse_login_response(&reply).is_ok(), "code {code}");
        }
    }

    #[test]
    fn test_parse_login_response_rejections() {
        for reply in [
            json!({"code": 100005, "msg": "Email or password error.", "data": {"x": 1}}),
            json!({"code": 0}),
            json!({"code": 0, "data": null}),
            json!({"code": "0", "data": {"uid": "u"}}),
            json!({"data": {"uid": "u"}}),
        ] {
            let err = parse_login_response(&reply).unwrap_err();
            assert!(matches!(err, SemsError::Auth(_)), "{reply}");
        }
    }

    #[test]
    fn test_rejection_reason_uses_msg() {
        let reply = json!({"code": 100005, "msg": "Email or password error."});
        let err = parse_login_response(&reply).unwrap_err();
        assert!(err.to_string().contains("Email or password error."));
    }

    #[test]
    fn test_base_urls_single_trims_slash() {
        let urls = BaseUrls::single("http://127.0.0.1:9999/");
        assert_eq!(urls.get(Region::Us), "http://127.0.0.1:9999");
        assert_eq!(urls.get(Region::Eu), "http://127.0.0.1:9999");
    }

    #[tokio::test]
    async fn test_login_and_fetch_against_mock_server() {
        let mut server = mockito::Server::new_async().await;

        let login = server
            .mock("POST", LOGIN_PATH)
            .match_header("token", pre_login_token().as_str())
            .match_body(mockito::Matcher::PartialJson(json!({
                "account": "demo@goodwe.com",
                "pwd": "secret",
                "agreement_agreement": 0,
                "is_local": false
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"code":0,"msg":"success","data":{"uid":"u-1","timestamp":1,"token":"abc"}}"#)
            .create_async()
            .await;

        let expected_token = session_token(&json!({"uid": "u-1", "timestamp": 1, "token": "abc"}));

        let column = server
            .mock("POST", COLUMN_PATH)
            .match_header("token", expected_token.as_str())
            .match_body(mockito::Matcher::Json(json!({
                "date": "2025-08-12 00:00:00",
                "column": "Pac",
                "id": "5010KETU229W6177"
            })))
            .with_status(200)
            .with_body(r#"{"code":0,"data":{"column1":[{"date":"2025-08-12 08:00:00","column":12}]}}"#)
            .create_async()
            .await;

        let client = SemsClient::new(BasicClient::new(), BaseUrls::single(server.url()));
        let credentials = Credentials {
            account: "demo@goodwe.com".into(),
            password: "secret".into(),
            login_region: Region::Us,
            data_region: Region::Eu,
        };

        let token = client.login(&credentials).await.unwrap();
        assert_eq!(token.as_str(), expected_token);

        let payload = client
            .fetch_column(&token, "5010KETU229W6177", "Pac", "2025-08-12 00:00:00", Region::Eu)
            .await
            .unwrap();
        assert_eq!(payload["data"]["column1"][0]["column"], 12);

        login.assert_async().await;
        column.assert_async().await;
    }

    #[tokio::test]
    async fn test_http_error_status_is_reported() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", COLUMN_PATH)
            .with_status(503)
            .with_body("maintenance")
            .create_async()
            .await;

        let client = SemsClient::new(BasicClient::new(), BaseUrls::single(server.url()));
        let err = client
            .fetch_column(&SessionToken::new("t"), "sn", "Pac", "2025-08-12 00:00:00", Region::Eu)
            .await
            .unwrap_err();

        match err {
            SemsError::Status { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "maintenance");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_non_json_body_is_decode_error() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", LOGIN_PATH)
            .with_status(200)
            .with_body("<html>login</html>")
            .create_async()
            .await;

        let client = SemsClient::new(BasicClient::new(), BaseUrls::single(server.url()));
        let credentials = Credentials {
            account: "a".into(),
            password: "b".into(),
            login_region: Region::Us,
            data_region: Region::Us,
        };

        let err = client.login(&credentials).await.unwrap_err();
        assert!(matches!(err, SemsError::Decode(_)));
    }
}
