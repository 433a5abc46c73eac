//! NIU cloud API client implementation

use std::time::Duration;

use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use crate::error::{ClientError, Result};
use crate::types::{Session, VehicleList};

/// Default account (login) host
pub const ACCOUNT_BASE_URL: &str = "https://account.niu.com";
/// Default telemetry API host
pub const API_BASE_URL: &str = "https://app-api.niu.com";

pub(crate) const LOGIN_PATH: &str = "/v3/api/oauth2/token";
pub(crate) const VEHICLE_LIST_PATH: &str = "/v5/scooter/list";
pub(crate) const BATTERY_INFO_PATH: &str = "/v3/motor_data/battery_info";
pub(crate) const MOTOR_INDEX_PATH: &str = "/v3/motor_data/index_info";
pub(crate) const OVERALL_TALLY_PATH: &str = "/motoinfo/overallTally";
pub(crate) const TRACK_LIST_PATH: &str = "/v5/track/list/v2";

/// Fixed client identifier the vendor expects on login
const APP_ID: &str = "niu_ktdrr960";
/// Trip list page size; only the first page is ever requested
const TRACK_PAGE_SIZE: u32 = 10;

/// Per-request timeout. The next scheduled cycle is the retry mechanism,
/// so a hung call must not outlive its tick.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

// The vendor gates some endpoints on app-like user agents.
const TELEMETRY_USER_AGENT: &str = "manager/4.10.4 (android; IN2020 11);lang=zh-CN;clientIdentifier=Domestic;timezone=Asia/Shanghai;model=IN2020;deviceName=IN2020;ostype=android";
const TRACK_USER_AGENT: &str = "manager/1.0.0 (identifier);clientIdentifier=identifier";

/// Lowercase hex MD5 of the account password.
///
/// The vendor's login endpoint expects this legacy digest on the wire. It
/// is a wire-format requirement, not a security control: the digest is
/// fast, unsalted and reversible by lookup.
pub fn password_digest(password: &str) -> String {
    format!("{:x}", md5::compute(password.as_bytes()))
}

#[derive(Deserialize)]
struct LoginResponse {
    data: Option<LoginData>,
}

#[derive(Deserialize)]
struct LoginData {
    token: Option<TokenInfo>,
}

#[derive(Deserialize)]
struct TokenInfo {
    #[serde(default)]
    access_token: String,
}

/// NIU vendor REST API client
///
/// One instance serves login, vehicle listing and all four telemetry
/// fetches; calls are independent apart from the shared token.
#[derive(Debug, Clone)]
pub struct NiuClient {
    http: Client,
    account_base: Url,
    api_base: Url,
}

impl NiuClient {
    /// Client against the production vendor hosts.
    pub fn new() -> Result<Self> {
        Self::with_bases(ACCOUNT_BASE_URL, API_BASE_URL)
    }

    /// Client against explicit account and API hosts (used by tests).
    pub fn with_bases(account_base: &str, api_base: &str) -> Result<Self> {
        Self::with_config(account_base, api_base, DEFAULT_TIMEOUT)
    }

    /// Client with a custom per-request timeout.
    pub fn with_config(account_base: &str, api_base: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            account_base: Url::parse(account_base)?,
            api_base: Url::parse(api_base)?,
        })
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Exchange credentials for a bearer token.
    ///
    /// Every failure mode (rejected credentials, transport error, malformed
    /// body, missing token) collapses to [`ClientError::AuthFailed`];
    /// the caller decides whether to abort setup. No retry.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<Session> {
        let url = self.account_base.join(LOGIN_PATH)?;
        let digest = password_digest(password);
        let form = [
            ("account", username),
            ("password", digest.as_str()),
            ("grant_type", "password"),
            ("scope", "base"),
            ("app_id", APP_ID),
        ];

        let response = self
            .http
            .post(url)
            .form(&form)
            .send()
            .await
            .map_err(|err| ClientError::AuthFailed(err.to_string()))?;

        if response.status() != StatusCode::OK {
            return Err(ClientError::AuthFailed(format!(
                "login rejected with HTTP {}",
                response.status()
            )));
        }

        let body: LoginResponse = response
            .json()
            .await
            .map_err(|err| ClientError::AuthFailed(format!("malformed login response: {err}")))?;

        let token = body
            .data
            .and_then(|data| data.token)
            .map(|token| token.access_token)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                ClientError::AuthFailed("login response missing access token".to_string())
            })?;

        Ok(Session::new(token))
    }

    // =========================================================================
    // Vehicle listing
    // =========================================================================

    /// List the vehicles on the account.
    ///
    /// Single GET, no pagination; the vendor returns the full list in one
    /// page. Unlike the telemetry endpoints, the listing carries no
    /// vendor-internal status field.
    #[instrument(skip(self, session))]
    pub async fn list_vehicles(&self, session: &Session) -> Result<VehicleList> {
        let url = self.api_base.join(VEHICLE_LIST_PATH)?;
        debug!("listing vehicles from {url}");

        let response = self
            .http
            .get(url)
            .header("token", session.token())
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            return Err(ClientError::ServerError {
                status: response.status().as_u16(),
            });
        }

        let raw: Value = response
            .json()
            .await
            .map_err(|err| ClientError::Parse(err.to_string()))?;

        Ok(VehicleList::from_raw(raw))
    }

    // =========================================================================
    // Telemetry fetches
    // =========================================================================

    /// Battery state for one vehicle (charge, temperature, BMS identity).
    #[instrument(skip(self, session))]
    pub async fn battery_info(&self, session: &Session, sn: &str) -> Result<Value> {
        self.telemetry_get(BATTERY_INFO_PATH, session, sn).await
    }

    /// Motor/position index for one vehicle, including the embedded
    /// last-trip summary.
    #[instrument(skip(self, session))]
    pub async fn motor_index(&self, session: &Session, sn: &str) -> Result<Value> {
        self.telemetry_get(MOTOR_INDEX_PATH, session, sn).await
    }

    /// Lifetime totals (overall mileage, bound days).
    #[instrument(skip(self, session))]
    pub async fn overall_tally(&self, session: &Session, sn: &str) -> Result<Value> {
        let url = self.api_base.join(OVERALL_TALLY_PATH)?;
        let response = self
            .http
            .post(url)
            .header("token", session.token())
            .header(header::ACCEPT_LANGUAGE, "en-US")
            .form(&[("sn", sn)])
            .send()
            .await?;
        self.vendor_body(response).await
    }

    /// Most recent trips: first page only, fixed page size.
    #[instrument(skip(self, session))]
    pub async fn track_list(&self, session: &Session, sn: &str) -> Result<Value> {
        let url = self.api_base.join(TRACK_LIST_PATH)?;
        let body = serde_json::json!({
            "index": "0",
            "pagesize": TRACK_PAGE_SIZE,
            "sn": sn,
        });
        let response = self
            .http
            .post(url)
            .header("token", session.token())
            .header(header::ACCEPT_LANGUAGE, "en-US")
            .header(header::USER_AGENT, TRACK_USER_AGENT)
            .json(&body)
            .send()
            .await?;
        self.vendor_body(response).await
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    async fn telemetry_get(&self, path: &str, session: &Session, sn: &str) -> Result<Value> {
        let url = self.api_base.join(path)?;
        let response = self
            .http
            .get(url)
            .query(&[("sn", sn)])
            .header("token", session.token())
            .header(header::USER_AGENT, TELEMETRY_USER_AGENT)
            .send()
            .await?;
        self.vendor_body(response).await
    }

    /// Apply the vendor success convention for telemetry endpoints:
    /// HTTP 200 and an internal `status` of zero, else the payload is
    /// unusable for this cycle.
    async fn vendor_body(&self, response: reqwest::Response) -> Result<Value> {
        let status = response.status();
        if status != StatusCode::OK {
            return Err(ClientError::ServerError {
                status: status.as_u16(),
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|err| ClientError::Parse(err.to_string()))?;

        match body.get("status").and_then(Value::as_i64) {
            Some(0) => Ok(body),
            Some(code) => Err(ClientError::VendorStatus(code)),
            None => Err(ClientError::Parse("missing vendor status field".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_creation() {
        assert!(NiuClient::new().is_ok());
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(NiuClient::with_bases("not a url", API_BASE_URL).is_err());
    }

    #[test]
    fn password_digest_is_lowercase_hex_md5() {
        // Known MD5 vector; lowercase hex is what the vendor accepts.
        assert_eq!(
            password_digest("password"),
            "5f4dcc3b5aa765d61d8327deb882cf99"
        );
        assert_eq!(password_digest(""), "d41d8cd98f00b204e9800998ecf8427e");
    }
}
