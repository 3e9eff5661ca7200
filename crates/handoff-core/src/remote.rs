//! Remote update server client
//!
//! Layout on the server:
//! - `{server}/VersionLast.json`: latest application version, bare integer
//! - `{server}/{version}/{dist}/UpdaterVersion.json`: required updater version
//! - `{server}/{version}/{dist}/Changelogs/{version}.txt`: release notes
//! - `{server}/{version}/{dist}/{updater}`: updater binary
//!
//! Requests are single attempts with the transport's default timeouts.

use reqwest::Client;
use thiserror::Error;
use tracing::debug;

/// Errors from the update server
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Expected an integer from {url}, got {body:?}")]
    InvalidBody { url: String, body: String },
}

pub type RemoteResult<T> = Result<T, RemoteError>;

pub fn version_last_url(server: &str) -> String {
    format!("{server}/VersionLast.json")
}

pub fn updater_version_url(server: &str, version: u32, dist: &str) -> String {
    format!("{server}/{version}/{dist}/UpdaterVersion.json")
}

pub fn changelog_url(server: &str, version: u32, platform: &str) -> String {
    format!("{server}/{version}/{platform}/Changelogs/{version}.txt")
}

pub fn updater_download_url(server: &str, version: u32, dist: &str, updater: &str) -> String {
    format!("{server}/{version}/{dist}/{updater}")
}

/// Parse a body holding a bare integer, tolerating surrounding whitespace
pub fn parse_integer_body(body: &str) -> Option<i64> {
    body.trim().parse().ok()
}

/// Plain GET client for the update server
#[derive(Debug, Clone, Default)]
pub struct RemoteClient {
    client: Client,
}

impl RemoteClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// GET a text body; non-success statuses are errors
    pub async fn get_text(&self, url: &str) -> RemoteResult<String> {
        debug!(url = url, "GET");
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }

    /// GET a body holding a bare integer
    pub async fn get_integer(&self, url: &str) -> RemoteResult<i64> {
        let body = self.get_text(url).await?;
        parse_integer_body(&body).ok_or_else(|| RemoteError::InvalidBody {
            url: url.to_string(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn url_layout() {
        let server = "https://u.example";
        assert_eq!(version_last_url(server), "https://u.example/VersionLast.json");
        assert_eq!(
            updater_version_url(server, 42, "linux-x64"),
            "https://u.example/42/linux-x64/UpdaterVersion.json"
        );
        assert_eq!(
            changelog_url(server, 42, "linux-x64"),
            "https://u.example/42/linux-x64/Changelogs/42.txt"
        );
        assert_eq!(
            updater_download_url(server, 42, "win-x64", "FUTO.Updater.Client.exe"),
            "https://u.example/42/win-x64/FUTO.Updater.Client.exe"
        );
    }

    #[test]
    fn integer_bodies() {
        assert_eq!(parse_integer_body("42"), Some(42));
        assert_eq!(parse_integer_body(" 42\r\n"), Some(42));
        assert_eq!(parse_integer_body("-3"), Some(-3));
        assert_eq!(parse_integer_body("forty-two"), None);
        assert_eq!(parse_integer_body(""), None);
    }

    #[tokio::test]
    async fn get_integer_from_server() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/VersionLast.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("17\n"))
            .expect(1)
            .mount(&server)
            .await;

        let client = RemoteClient::new();
        let value = client.get_integer(&version_last_url(&server.uri())).await.unwrap();
        assert_eq!(value, 17);
    }

    #[tokio::test]
    async fn non_integer_body_is_invalid() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let client = RemoteClient::new();
        let result = client.get_integer(&version_last_url(&server.uri())).await;
        assert!(matches!(result, Err(RemoteError::InvalidBody { .. })));
    }

    #[tokio::test]
    async fn error_status_is_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = RemoteClient::new();
        let result = client.get_text(&format!("{}/missing", server.uri())).await;
        assert!(matches!(result, Err(RemoteError::Http(_))));
    }
}
