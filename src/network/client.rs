//! HTTP client wrapper - builds and executes calls against the Kerem API

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Method, RequestBuilder};

use crate::models::{
    Credentials, LoginResponse, NewWinery, RatingResponse, RegisterResponse, Registration,
    SearchQuery, Winery, WineryId,
};
use crate::storage::Settings;

/// Thin typed client over `reqwest`. Holds no session: the bearer token is
/// passed in on every call.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(settings: &Settings) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        ApiClient {
            http,
            base_url: settings.api_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str, token: Option<&str>) -> RequestBuilder {
        let mut builder = self
            .http
            .request(method, format!("{}{}", self.base_url, path))
            .header("Accept", "application/json");
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    // ========================
    // Request builders
    // ========================

    pub(crate) fn login_request(&self, credentials: &Credentials) -> RequestBuilder {
        self.request(Method::POST, "/login", None).json(credentials)
    }

    pub(crate) fn register_request(&self, registration: &Registration) -> RequestBuilder {
        self.request(Method::POST, "/register", None).json(registration)
    }

    pub(crate) fn list_request(&self, token: Option<&str>) -> RequestBuilder {
        self.request(Method::GET, "/wineries", token)
    }

    pub(crate) fn search_request(&self, token: Option<&str>, query: &SearchQuery) -> RequestBuilder {
        self.request(Method::GET, "/wineries/search", token)
            .query(&query.to_params())
    }

    pub(crate) fn create_request(&self, token: Option<&str>, winery: &NewWinery) -> RequestBuilder {
        self.request(Method::POST, "/wineries", token).json(winery)
    }

    pub(crate) fn rate_request(
        &self,
        token: Option<&str>,
        winery_id: WineryId,
        rating: u8,
    ) -> RequestBuilder {
        self.request(Method::POST, &format!("/wineries/{}/rate", winery_id), token)
            .json(&serde_json::json!({ "rating": rating }))
    }

    // ========================
    // Calls
    // ========================

    /// Returns the raw access token
    pub async fn login(&self, credentials: &Credentials) -> Result<String> {
        let body: LoginResponse = send_json(self.login_request(credentials), "POST /login").await?;
        Ok(body.access_token)
    }

    /// Returns the admin flag echoed by the API
    pub async fn register(&self, registration: &Registration) -> Result<bool> {
        let body: RegisterResponse =
            send_json(self.register_request(registration), "POST /register").await?;
        Ok(body.is_admin)
    }

    pub async fn list_wineries(&self, token: Option<&str>) -> Result<Vec<Winery>> {
        send_json(self.list_request(token), "GET /wineries").await
    }

    pub async fn search_wineries(
        &self,
        token: Option<&str>,
        query: &SearchQuery,
    ) -> Result<Vec<Winery>> {
        send_json(self.search_request(token, query), "GET /wineries/search").await
    }

    /// The created record, when the API echoes one back in a readable shape
    pub async fn create_winery(
        &self,
        token: Option<&str>,
        winery: &NewWinery,
    ) -> Result<Option<Winery>> {
        let what = "POST /wineries";
        let response = send_checked(self.create_request(token, winery), what).await?;
        // An empty or non-JSON body still means the record was created
        let body = response
            .bytes()
            .await
            .with_context(|| format!("{} body could not be read", what))?;
        Ok(serde_json::from_slice(&body).ok())
    }

    /// Returns the new aggregate rating computed by the API
    pub async fn rate_winery(
        &self,
        token: Option<&str>,
        winery_id: WineryId,
        rating: u8,
    ) -> Result<f64> {
        let body: RatingResponse = send_json(
            self.rate_request(token, winery_id, rating),
            "POST /wineries/{id}/rate",
        )
        .await?;
        Ok(body.average_rating)
    }
}

/// Send and reject non-2xx statuses, keeping the body in the error
async fn send_checked(builder: RequestBuilder, what: &str) -> Result<reqwest::Response> {
    let response = builder
        .send()
        .await
        .map_err(describe_transport_error)
        .with_context(|| format!("{} failed", what))?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        anyhow::bail!("{} returned {}: {}", what, status, body.trim());
    }
    Ok(response)
}

async fn send_json<T: serde::de::DeserializeOwned>(
    builder: RequestBuilder,
    what: &str,
) -> Result<T> {
    send_checked(builder, what)
        .await?
        .json::<T>()
        .await
        .with_context(|| format!("{} returned an unexpected body", what))
}

fn describe_transport_error(e: reqwest::Error) -> anyhow::Error {
    if e.is_timeout() {
        anyhow::anyhow!("request timed out")
    } else if e.is_connect() {
        anyhow::anyhow!("connection failed: {}", e)
    } else {
        anyhow::Error::new(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Region;

    fn client() -> ApiClient {
        ApiClient::new(&Settings {
            api_base_url: "http://wine.test/".into(),
            request_timeout_secs: 1,
        })
    }

    fn auth_header(req: &reqwest::Request) -> Option<String> {
        req.headers()
            .get("authorization")
            .map(|v| v.to_str().unwrap().to_string())
    }

    #[test]
    fn test_bearer_attached_only_with_token() {
        let api = client();
        let with = api.list_request(Some("tok")).build().unwrap();
        assert_eq!(auth_header(&with).as_deref(), Some("Bearer tok"));
        assert_eq!(with.url().as_str(), "http://wine.test/wineries");

        let without = api.list_request(None).build().unwrap();
        assert_eq!(auth_header(&without), None);
    }

    #[test]
    fn test_login_never_sends_authorization() {
        let req = client()
            .login_request(&Credentials {
                username: "u".into(),
                password: "p".into(),
            })
            .build()
            .unwrap();
        assert_eq!(*req.method(), Method::POST);
        assert_eq!(req.url().path(), "/login");
        assert_eq!(auth_header(&req), None);
        let body: serde_json::Value =
            serde_json::from_slice(req.body().unwrap().as_bytes().unwrap()).unwrap();
        assert_eq!(body, serde_json::json!({"username": "u", "password": "p"}));
    }

    #[test]
    fn test_search_query_string() {
        let query = SearchQuery {
            name: "Castel".into(),
            min_rating: 4.0,
            regions: vec![Region::JudeanHills, Region::Carmel],
        };
        let req = client().search_request(Some("t"), &query).build().unwrap();
        let pairs: Vec<(String, String)> = req
            .url()
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(req.url().path(), "/wineries/search");
        assert_eq!(
            pairs,
            vec![
                ("name".to_string(), "Castel".to_string()),
                ("min_rating".to_string(), "4".to_string()),
                ("regions".to_string(), "Judean Hills,Carmel".to_string()),
            ]
        );
    }

    #[test]
    fn test_rate_and_create_requests() {
        let api = client();
        let rate = api.rate_request(Some("t"), 42, 5).build().unwrap();
        assert_eq!(rate.url().path(), "/wineries/42/rate");
        let body: serde_json::Value =
            serde_json::from_slice(rate.body().unwrap().as_bytes().unwrap()).unwrap();
        assert_eq!(body, serde_json::json!({"rating": 5}));

        let create = api
            .create_request(
                Some("t"),
                &NewWinery {
                    name: "Flam".into(),
                    description: "Family estate".into(),
                    latitude: 31.7,
                    longitude: 35.0,
                },
            )
            .build()
            .unwrap();
        assert_eq!(*create.method(), Method::POST);
        assert_eq!(create.url().path(), "/wineries");
        assert_eq!(auth_header(&create).as_deref(), Some("Bearer t"));
    }

    /// Answers one HTTP request with `response` and returns the server URL
    async fn serve_once(response: String) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            // Read headers, then as much body as Content-Length announces
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request).to_lowercase();
                if let Some(end) = text.find("\r\n\r\n") {
                    let length = text
                        .lines()
                        .find_map(|l| l.strip_prefix("content-length:"))
                        .and_then(|v| v.trim().parse::<usize>().ok())
                        .unwrap_or(0);
                    if request.len() >= end + 4 + length {
                        break;
                    }
                }
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });
        format!("http://{}", addr)
    }

    fn new_winery() -> NewWinery {
        NewWinery {
            name: "Flam".into(),
            description: "Family estate".into(),
            latitude: 31.7,
            longitude: 35.0,
        }
    }

    #[tokio::test]
    async fn test_create_accepts_empty_created_body() {
        let url = serve_once("HTTP/1.1 201 Created\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".into()).await;
        let api = ApiClient::new(&Settings {
            api_base_url: url,
            request_timeout_secs: 5,
        });
        let created = api.create_winery(Some("t"), &new_winery()).await.unwrap();
        assert_eq!(created, None);
    }

    #[tokio::test]
    async fn test_create_reads_echoed_winery_and_rejects_errors() {
        let body = r#"{"id":9,"name":"Flam","latitude":31.7,"longitude":35.0}"#;
        let ok = format!(
            "HTTP/1.1 201 Created\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        );
        let api = ApiClient::new(&Settings {
            api_base_url: serve_once(ok).await,
            request_timeout_secs: 5,
        });
        let created = api.create_winery(Some("t"), &new_winery()).await.unwrap();
        assert_eq!(created.map(|w| w.id), Some(9));

        let api = ApiClient::new(&Settings {
            api_base_url: serve_once("HTTP/1.1 403 Forbidden\r\nContent-Length: 6\r\nConnection: close\r\n\r\nadmins".into()).await,
            request_timeout_secs: 5,
        });
        let err = api.create_winery(Some("t"), &new_winery()).await.unwrap_err();
        assert!(format!("{:#}", err).contains("403"));
    }
}
