use crate::config::EnvConfig;
use crate::models::{NewWish, NewWishlist, Session, User, Wish, Wishlist};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

pub(crate) const WISHLISTS_TABLE: &str = "wishlists";
pub(crate) const WISHES_TABLE: &str = "wishes";

#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub(crate) enum ApiError {
    #[error("unauthorized")]
    Unauthorized,

    #[error("network error: {0}")]
    Network(String),

    #[error("request failed ({status}): {body}")]
    Http { status: u16, body: String },

    #[error("unexpected response: {0}")]
    Parse(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ApiError {
    fn network(e: reqwest::Error) -> Self {
        Self::Network(e.to_string())
    }

    fn parse(e: impl std::fmt::Display) -> Self {
        Self::Parse(e.to_string())
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}

pub(crate) type ApiResult<T> = Result<T, ApiError>;

/// Row filter understood by the REST data API.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Filter {
    /// `column=eq.value`
    Eq(String, String),
    /// `column=in.("a","b")`
    In(String, Vec<String>),
}

impl Filter {
    pub fn eq(column: &str, value: &str) -> Self {
        Self::Eq(column.to_string(), value.to_string())
    }

    pub fn is_in(column: &str, values: Vec<String>) -> Self {
        Self::In(column.to_string(), values)
    }

    pub fn to_query(&self) -> String {
        match self {
            Filter::Eq(col, value) => format!("{}=eq.{}", col, urlencoding::encode(value)),
            Filter::In(col, values) => {
                // Values are double-quoted so ids containing `,` or `)` stay intact.
                let list = values
                    .iter()
                    .map(|v| format!("\"{}\"", v.replace('\\', "\\\\").replace('"', "\\\"")))
                    .collect::<Vec<_>>()
                    .join(",");
                format!("{}=in.{}", col, urlencoding::encode(&format!("({list})")))
            }
        }
    }
}

#[derive(Serialize, Clone, Debug)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

/// Thin client over the managed backend: GoTrue-style auth under `/auth/v1`
/// and PostgREST-style tables under `/rest/v1`.
#[derive(Clone, Debug)]
pub(crate) struct ApiClient {
    pub(crate) config: EnvConfig,
    pub(crate) access_token: Option<String>,
}

impl ApiClient {
    pub fn new(config: EnvConfig) -> Self {
        Self {
            config,
            access_token: None,
        }
    }

    pub fn with_session(config: EnvConfig, session: Option<&Session>) -> Self {
        Self {
            config,
            access_token: session.map(|s| s.access_token.clone()),
        }
    }

    pub fn set_token(&mut self, token: String) {
        self.access_token = Some(token);
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    /// Bearer credential: the user's access token, or the anon key before sign-in.
    pub(crate) fn bearer(&self) -> String {
        let token = self
            .access_token
            .as_deref()
            .unwrap_or(self.config.anon_key.as_str());
        format!("Bearer {}", token)
    }

    fn with_headers(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("apikey", self.config.anon_key.as_str())
            .header("Authorization", self.bearer())
    }

    fn check_configured(&self) -> ApiResult<()> {
        if self.config.supabase_url.trim().is_empty() {
            return Err(ApiError::Config("backend url is empty".to_string()));
        }
        Ok(())
    }

    async fn error_from(res: reqwest::Response) -> ApiError {
        let status = res.status();
        if status.as_u16() == 401 {
            return ApiError::Unauthorized;
        }
        let body = res.text().await.unwrap_or_default();
        ApiError::Http {
            status: status.as_u16(),
            body,
        }
    }

    async fn send_json<T: DeserializeOwned>(&self, req: reqwest::RequestBuilder) -> ApiResult<T> {
        self.check_configured()?;
        let res = self.with_headers(req).send().await.map_err(ApiError::network)?;
        if res.status().is_success() {
            res.json().await.map_err(ApiError::parse)
        } else {
            Err(Self::error_from(res).await)
        }
    }

    async fn send_empty(&self, req: reqwest::RequestBuilder) -> ApiResult<()> {
        self.check_configured()?;
        let res = self.with_headers(req).send().await.map_err(ApiError::network)?;
        if res.status().is_success() {
            Ok(())
        } else {
            Err(Self::error_from(res).await)
        }
    }

    // ---- auth ----

    pub fn authorize_url(&self, provider: &str, redirect_to: &str) -> String {
        format!(
            "{}?provider={}&redirect_to={}",
            self.config.auth_url("/authorize"),
            urlencoding::encode(provider),
            urlencoding::encode(redirect_to)
        )
    }

    pub async fn get_user(&self) -> ApiResult<User> {
        if !self.is_authenticated() {
            return Err(ApiError::Unauthorized);
        }
        let client = reqwest::Client::new();
        self.send_json(client.get(self.config.auth_url("/user"))).await
    }

    pub async fn refresh_session(&self, refresh_token: &str) -> ApiResult<Session> {
        let client = reqwest::Client::new();
        let req = client
            .post(self.config.auth_url("/token?grant_type=refresh_token"))
            .json(&RefreshRequest { refresh_token });
        let mut session: Session = self.send_json(req).await?;
        if session.expires_at.is_none() {
            session.expires_at = Some(crate::util::now_secs() + 3600);
        }
        Ok(session)
    }

    pub async fn sign_out(&self) -> ApiResult<()> {
        if !self.is_authenticated() {
            return Ok(());
        }
        let client = reqwest::Client::new();
        self.send_empty(client.post(self.config.auth_url("/logout"))).await
    }

    // ---- data ----

    pub(crate) fn select_url(&self, table: &str, filter: &Filter) -> String {
        format!(
            "{}?select=*&{}",
            self.config.rest_url(&format!("/{table}")),
            filter.to_query()
        )
    }

    pub async fn select<T: DeserializeOwned>(&self, table: &str, filter: &Filter) -> ApiResult<Vec<T>> {
        let client = reqwest::Client::new();
        self.send_json(client.get(self.select_url(table, filter))).await
    }

    pub async fn insert<T: Serialize>(&self, table: &str, row: &T) -> ApiResult<()> {
        let client = reqwest::Client::new();
        let req = client
            .post(self.config.rest_url(&format!("/{table}")))
            .header("Prefer", "return=minimal")
            .json(row);
        self.send_empty(req).await
    }

    pub async fn delete(&self, table: &str, filter: &Filter) -> ApiResult<()> {
        let client = reqwest::Client::new();
        let url = format!(
            "{}?{}",
            self.config.rest_url(&format!("/{table}")),
            filter.to_query()
        );
        self.send_empty(client.delete(url)).await
    }

    pub async fn list_wishlists(&self, user_id: &str) -> ApiResult<Vec<Wishlist>> {
        self.select(WISHLISTS_TABLE, &Filter::eq("user_id", user_id)).await
    }

    /// All wishes belonging to any of `wishlist_ids`, in one request.
    pub async fn list_wishes_for(&self, wishlist_ids: &[String]) -> ApiResult<Vec<Wish>> {
        if wishlist_ids.is_empty() {
            return Ok(vec![]);
        }
        self.select(WISHES_TABLE, &Filter::is_in("wishlist_id", wishlist_ids.to_vec()))
            .await
    }

    pub async fn create_wishlist(&self, row: &NewWishlist) -> ApiResult<()> {
        self.insert(WISHLISTS_TABLE, row).await
    }

    pub async fn create_wish(&self, row: &NewWish) -> ApiResult<()> {
        self.insert(WISHES_TABLE, row).await
    }

    pub async fn delete_wishlist(&self, wishlist_id: &str) -> ApiResult<()> {
        self.delete(WISHLISTS_TABLE, &Filter::eq("id", wishlist_id)).await
    }

    pub async fn delete_wish(&self, wish_id: &str) -> ApiResult<()> {
        self.delete(WISHES_TABLE, &Filter::eq("id", wish_id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> ApiClient {
        ApiClient::new(EnvConfig::new("https://abc.supabase.co", "anon-key"))
    }

    #[test]
    fn test_eq_filter_query() {
        let f = Filter::eq("user_id", "7c0e-11");
        assert_eq!(f.to_query(), "user_id=eq.7c0e-11");
    }

    #[test]
    fn test_eq_filter_encodes_value() {
        let f = Filter::eq("name", "a&b c");
        assert_eq!(f.to_query(), "name=eq.a%26b%20c");
    }

    #[test]
    fn test_in_filter_quotes_and_encodes() {
        let f = Filter::is_in("wishlist_id", vec!["a".to_string(), "b".to_string()]);
        assert_eq!(f.to_query(), "wishlist_id=in.%28%22a%22%2C%22b%22%29");
    }

    #[test]
    fn test_in_filter_escapes_quotes() {
        let f = Filter::is_in("id", vec!["x\"y".to_string()]);
        let decoded = urlencoding::decode(&f.to_query()).expect("valid encoding").into_owned();
        assert_eq!(decoded, "id=in.(\"x\\\"y\")");
    }

    #[test]
    fn test_select_url() {
        let url = client().select_url(WISHLISTS_TABLE, &Filter::eq("user_id", "u1"));
        assert_eq!(
            url,
            "https://abc.supabase.co/rest/v1/wishlists?select=*&user_id=eq.u1"
        );
    }

    #[test]
    fn test_authorize_url_encodes_redirect() {
        let url = client().authorize_url("google", "http://localhost:8080");
        assert_eq!(
            url,
            "https://abc.supabase.co/auth/v1/authorize?provider=google&redirect_to=http%3A%2F%2Flocalhost%3A8080"
        );
    }

    #[test]
    fn test_bearer_falls_back_to_anon_key() {
        let mut c = client();
        assert!(!c.is_authenticated());
        assert_eq!(c.bearer(), "Bearer anon-key");

        c.set_token("jwt".to_string());
        assert!(c.is_authenticated());
        assert_eq!(c.bearer(), "Bearer jwt");

        let signed_out = ApiClient::with_session(c.config.clone(), None);
        assert_eq!(signed_out.bearer(), "Bearer anon-key");
    }

    #[test]
    fn test_api_error_display() {
        let e = ApiError::Http {
            status: 409,
            body: "duplicate".to_string(),
        };
        assert_eq!(e.to_string(), "request failed (409): duplicate");
        assert!(ApiError::Unauthorized.is_unauthorized());
        assert!(!e.is_unauthorized());
    }
}
