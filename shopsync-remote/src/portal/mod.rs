//! Seller-cabinet portal access. Everything here rides on a browser session
//! exported as a cookie bundle; there is no official API underneath, so a
//! logged-out session answers with an HTML login page instead of an error
//! status.

mod meest;
mod nova_poshta;
mod rozetka;
mod ukr_poshta;

pub use meest::MeestScraper;
pub use nova_poshta::NovaPoshtaScraper;
pub use rozetka::RozetkaScraper;
pub use ukr_poshta::UkrPoshtaScraper;

use std::sync::Mutex;

use base64::Engine as _;
use serde_json::Value;

use shopsync_core::api::order_console_url;
use shopsync_core::scrape::ScrapeError;
use shopsync_shared::Order;

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

#[derive(Debug, Clone)]
struct CookieState {
    header: String,
    csrf_token: String,
}

/// One authenticated portal session shared by every scraper. The cookie
/// state is dropped the first time the portal answers with a login page;
/// all later calls fail fast with [`ScrapeError::OutdatedCookies`].
pub struct PortalSession {
    http: reqwest::Client,
    base_url: String,
    origin: String,
    state: Mutex<Option<CookieState>>,
}

impl PortalSession {
    /// `cookies` is the base64-encoded bundle exported from the browser:
    /// `;`-separated JSON objects with at least `name` and `value` keys.
    pub fn new(base_url: &str, cookies: &str) -> Result<Self, ScrapeError> {
        let state = parse_cookie_bundle(cookies)?;
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|err| ScrapeError::Transport(format!("failed to build HTTP client: {err}")))?;
        let base_url = base_url.trim_end_matches('/').to_string();
        Ok(Self {
            http,
            origin: base_url.clone(),
            base_url,
            state: Mutex::new(Some(state)),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn cookie_state(&self) -> Result<CookieState, ScrapeError> {
        self.state
            .lock()
            .expect("portal session poisoned")
            .clone()
            .ok_or(ScrapeError::OutdatedCookies)
    }

    fn expire(&self) {
        tracing::error!("portal answered with a login page, discarding session cookies");
        *self.state.lock().expect("portal session poisoned") = None;
    }

    async fn read_json(&self, response: reqwest::Response) -> Result<Value, ScrapeError> {
        let html = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.contains("text/html"))
            .unwrap_or(false);
        if html {
            self.expire();
            return Err(ScrapeError::OutdatedCookies);
        }
        if !response.status().is_success() {
            return Err(ScrapeError::Transport(format!(
                "portal returned {}",
                response.status()
            )));
        }
        response
            .json()
            .await
            .map_err(|err| ScrapeError::Transport(err.to_string()))
    }

    pub async fn get_json(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<Value, ScrapeError> {
        let cookies = self.cookie_state()?;
        let response = self
            .http
            .get(self.url(path))
            .header(reqwest::header::COOKIE, &cookies.header)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .query(params)
            .send()
            .await
            .map_err(|err| ScrapeError::Transport(err.to_string()))?;
        self.read_json(response).await
    }

    /// POST with the header set the portal's own frontend sends. `order_id`
    /// feeds the referer, `owner_id` the shop-owner header; both are checked
    /// server-side.
    pub async fn post_json(
        &self,
        path: &str,
        body: &Value,
        order_id: i64,
        owner_id: i64,
    ) -> Result<Value, ScrapeError> {
        let cookies = self.cookie_state()?;
        let response = self
            .http
            .post(self.url(path))
            .header(reqwest::header::COOKIE, &cookies.header)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .header(reqwest::header::ORIGIN, &self.origin)
            .header(reqwest::header::REFERER, order_console_url(order_id))
            .header("x-csrftoken", &cookies.csrf_token)
            .header("x-promuserid", owner_id.to_string())
            .header("x-requested-with", "XMLHttpRequest")
            .json(body)
            .send()
            .await
            .map_err(|err| ScrapeError::Transport(err.to_string()))?;
        self.read_json(response).await
    }

    /// Full cabinet-side order record, richer than the public API listing.
    pub async fn get_order(&self, order: &Order) -> Result<Value, ScrapeError> {
        let payload = self
            .get_json(
                "remote/order_api/get_order",
                &[
                    ("id", order.id.to_string()),
                    ("sorted_products", "0".to_string()),
                ],
            )
            .await?;
        required(&payload, "order").cloned()
    }

    pub async fn auth_info(&self) -> Result<Value, ScrapeError> {
        self.get_json("remote/auth/info", &[]).await
    }

    /// Shop-owner id, needed for the `x-promuserid` header on every POST.
    pub async fn owner_id(&self) -> Result<i64, ScrapeError> {
        let auth = self.auth_info().await?;
        required(&auth, "id")?
            .as_i64()
            .ok_or_else(|| ScrapeError::MissingField("id".to_string()))
    }
}

fn parse_cookie_bundle(encoded: &str) -> Result<CookieState, ScrapeError> {
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|err| ScrapeError::Transport(format!("cookie bundle is not base64: {err}")))?;
    let decoded = String::from_utf8(decoded)
        .map_err(|err| ScrapeError::Transport(format!("cookie bundle is not UTF-8: {err}")))?;

    let mut pairs = Vec::new();
    let mut csrf_token = None;
    for chunk in decoded.split(';') {
        let chunk = chunk.trim();
        if chunk.is_empty() {
            continue;
        }
        let cookie: Value = serde_json::from_str(chunk)
            .map_err(|err| ScrapeError::Transport(format!("malformed cookie entry: {err}")))?;
        let name = required_str(&cookie, "name")?;
        let value = required_str(&cookie, "value")?;
        if name == "csrf_token" {
            csrf_token = Some(value.clone());
        }
        pairs.push(format!("{name}={value}"));
    }

    let csrf_token = csrf_token.ok_or_else(|| ScrapeError::MissingField("csrf_token".to_string()))?;
    Ok(CookieState {
        header: pairs.join("; "),
        csrf_token,
    })
}

pub(crate) fn required<'a>(payload: &'a Value, key: &str) -> Result<&'a Value, ScrapeError> {
    payload
        .get(key)
        .filter(|v| !v.is_null())
        .ok_or_else(|| ScrapeError::MissingField(key.to_string()))
}

pub(crate) fn required_str(payload: &Value, key: &str) -> Result<String, ScrapeError> {
    match required(payload, key)? {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(ScrapeError::MissingField(key.to_string())),
    }
}

/// Declaration endpoints report refusals inside a 200 body. A warehouse
/// refusal is a carrier decision and escalates; anything else is a plain
/// request failure.
pub(crate) fn check_declaration_errors(payload: &Value) -> Result<(), ScrapeError> {
    let code = payload.get("error_code").and_then(Value::as_str);
    let message = payload.get("error").and_then(Value::as_str);
    match (code, message) {
        (Some(code), message) if code.starts_with("not_allowed") => Err(
            ScrapeError::WarehouseRejected(message.unwrap_or(code).to_string()),
        ),
        (Some(code), message) => Err(ScrapeError::Transport(
            message.unwrap_or(code).to_string(),
        )),
        (None, Some(message)) => Err(ScrapeError::Transport(message.to_string())),
        (None, None) => Ok(()),
    }
}
