//! Pluggable HTTP transport.

use http::{Method, StatusCode, Uri};
use serde::Deserialize;
use tracing::debug;

use crate::config::TransportConfig;
use crate::error::{Error, Result};
use crate::param::Parameter;

/// Payload attached to a POST or PUT request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Raw body string, sent as-is.
    Raw(String),
    /// Parameters serialized into a JSON object.
    Json(Vec<Parameter>),
    /// Parameters sent URL-encoded as form data.
    Form(Vec<Parameter>),
}

/// Capability performing the actual network I/O.
///
/// One instance is shared by every request built against it, possibly from
/// several threads at once; connection management is entirely the
/// implementation's concern.
pub trait Transport: Send + Sync {
    /// Perform a GET request and return the raw response body.
    fn get(&self, uri: &Uri, headers: &[Parameter]) -> Result<String>;

    /// Perform a POST request and return the raw response body.
    fn post(&self, uri: &Uri, headers: &[Parameter], payload: Option<&Payload>) -> Result<String>;

    /// Perform a PUT request and return the raw response body.
    fn put(&self, uri: &Uri, headers: &[Parameter], payload: Option<&Payload>) -> Result<String>;

    /// Perform a DELETE request and return the raw response body.
    fn delete(&self, uri: &Uri, headers: &[Parameter]) -> Result<String>;
}

/// Default transport backed by a blocking reqwest client.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    /// Create a transport with default configuration.
    pub fn new() -> Self {
        Self::with_config(TransportConfig::default())
    }

    /// Create a transport with the given configuration.
    pub fn with_config(config: TransportConfig) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .build()
            .expect("failed to build HTTP client");

        Self { client }
    }

    fn prepare(
        &self,
        method: Method,
        uri: &Uri,
        headers: &[Parameter],
    ) -> reqwest::blocking::RequestBuilder {
        let mut request = self.client.request(method, uri.to_string());
        for header in headers {
            request = request.header(header.name(), header.value());
        }
        request
    }

    fn dispatch(&self, request: reqwest::blocking::RequestBuilder) -> Result<String> {
        let response = request.send()?;
        let status = response.status();
        let body = response.text()?;

        if status.is_success() {
            Ok(body)
        } else {
            debug!(status = status.as_u16(), "request rejected by remote");
            Err(api_error(status, body))
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for HttpTransport {
    fn get(&self, uri: &Uri, headers: &[Parameter]) -> Result<String> {
        debug!(%uri, "sending GET request");
        self.dispatch(self.prepare(Method::GET, uri, headers))
    }

    fn post(&self, uri: &Uri, headers: &[Parameter], payload: Option<&Payload>) -> Result<String> {
        debug!(%uri, "sending POST request");
        let request = self.prepare(Method::POST, uri, headers);
        self.dispatch(attach_payload(request, payload))
    }

    fn put(&self, uri: &Uri, headers: &[Parameter], payload: Option<&Payload>) -> Result<String> {
        debug!(%uri, "sending PUT request");
        let request = self.prepare(Method::PUT, uri, headers);
        self.dispatch(attach_payload(request, payload))
    }

    fn delete(&self, uri: &Uri, headers: &[Parameter]) -> Result<String> {
        debug!(%uri, "sending DELETE request");
        self.dispatch(self.prepare(Method::DELETE, uri, headers))
    }
}

fn attach_payload(
    request: reqwest::blocking::RequestBuilder,
    payload: Option<&Payload>,
) -> reqwest::blocking::RequestBuilder {
    match payload {
        None => request,
        Some(Payload::Raw(body)) => request.body(body.clone()),
        Some(Payload::Json(parameters)) => {
            let object: serde_json::Map<String, serde_json::Value> = parameters
                .iter()
                .map(|p| (p.name().to_owned(), serde_json::Value::String(p.value().to_owned())))
                .collect();
            request.json(&object)
        }
        Some(Payload::Form(parameters)) => {
            let pairs: Vec<(&str, &str)> =
                parameters.iter().map(|p| (p.name(), p.value())).collect();
            request.form(&pairs)
        }
    }
}

/// Error payload shapes returned by the Web API.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorEnvelope {
    /// Regular endpoints: `{"error": {"status": 401, "message": "..."}}`
    Api { error: ErrorDetails },
    /// Token endpoints: `{"error": "invalid_client", "error_description": "..."}`
    Auth {
        error: String,
        #[serde(default)]
        error_description: Option<String>,
    },
}

#[derive(Debug, Deserialize)]
struct ErrorDetails {
    #[serde(default)]
    message: Option<String>,
}

fn api_error(status: StatusCode, body: String) -> Error {
    let message = error_message(&body)
        .or_else(|| status.canonical_reason().map(str::to_owned))
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));

    Error::Api {
        status: status.as_u16(),
        message,
        body,
    }
}

fn error_message(body: &str) -> Option<String> {
    match serde_json::from_str::<ErrorEnvelope>(body).ok()? {
        ErrorEnvelope::Api { error } => error.message,
        ErrorEnvelope::Auth {
            error,
            error_description,
        } => Some(error_description.unwrap_or(error)),
    }
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;

    use tokio::runtime::Runtime;
    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn server_uri(server: &MockServer, path_and_query: &str) -> Uri {
        format!("{}{}", server.uri(), path_and_query)
            .parse()
            .expect("mock server uri")
    }

    #[test]
    fn returns_response_body_verbatim() {
        let rt = Runtime::new().expect("runtime");
        let server = rt.block_on(MockServer::start());
        rt.block_on(
            Mock::given(method("GET"))
                .and(path("/v1/me"))
                .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"id":"wizzler"}"#))
                .mount(&server),
        );

        let body = HttpTransport::new()
            .get(&server_uri(&server, "/v1/me"), &[])
            .expect("response body");
        assert_eq!(body, r#"{"id":"wizzler"}"#);
    }

    #[test]
    fn attaches_headers_and_form_payload() {
        let rt = Runtime::new().expect("runtime");
        let server = rt.block_on(MockServer::start());
        rt.block_on(
            Mock::given(method("POST"))
                .and(path("/api/token"))
                .and(header("Authorization", "Basic Zm9v"))
                .and(body_string("grant_type=client_credentials"))
                .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
                .expect(1)
                .mount(&server),
        );

        let headers = vec![Parameter::new("Authorization", "Basic Zm9v")];
        let payload = Payload::Form(vec![Parameter::new("grant_type", "client_credentials")]);
        let body = HttpTransport::new()
            .post(&server_uri(&server, "/api/token"), &headers, Some(&payload))
            .expect("response body");
        assert_eq!(body, "{}");
    }

    #[test]
    fn sends_raw_bodies_as_is() {
        let rt = Runtime::new().expect("runtime");
        let server = rt.block_on(MockServer::start());
        rt.block_on(
            Mock::given(method("PUT"))
                .and(path("/v1/me/following"))
                .and(body_string(r#"{"ids":["0LcJLqbBmaGUft1e9Mm8HV"]}"#))
                .respond_with(ResponseTemplate::new(204))
                .expect(1)
                .mount(&server),
        );

        let payload = Payload::Raw(r#"{"ids":["0LcJLqbBmaGUft1e9Mm8HV"]}"#.to_owned());
        let body = HttpTransport::new()
            .put(&server_uri(&server, "/v1/me/following"), &[], Some(&payload))
            .expect("response body");
        assert_eq!(body, "");
    }

    #[test]
    fn maps_structured_error_payloads() {
        let rt = Runtime::new().expect("runtime");
        let server = rt.block_on(MockServer::start());
        rt.block_on(
            Mock::given(method("GET"))
                .respond_with(ResponseTemplate::new(401).set_body_string(
                    r#"{"error":{"status":401,"message":"Invalid access token"}}"#,
                ))
                .mount(&server),
        );

        let err = HttpTransport::new()
            .get(&server_uri(&server, "/v1/me"), &[])
            .expect_err("api error");
        match err {
            Error::Api { status, message, body } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Invalid access token");
                assert!(body.contains("Invalid access token"));
            }
            other => panic!("expected API error, got {other:?}"),
        }
    }

    #[test]
    fn maps_token_endpoint_error_payloads() {
        let rt = Runtime::new().expect("runtime");
        let server = rt.block_on(MockServer::start());
        rt.block_on(
            Mock::given(method("POST"))
                .respond_with(ResponseTemplate::new(400).set_body_string(
                    r#"{"error":"invalid_client","error_description":"Invalid client secret"}"#,
                ))
                .mount(&server),
        );

        let err = HttpTransport::new()
            .post(&server_uri(&server, "/api/token"), &[], None)
            .expect_err("api error");
        match err {
            Error::Api { status, message, .. } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Invalid client secret");
            }
            other => panic!("expected API error, got {other:?}"),
        }
    }

    #[test]
    fn falls_back_to_canonical_reason_for_opaque_bodies() {
        let rt = Runtime::new().expect("runtime");
        let server = rt.block_on(MockServer::start());
        rt.block_on(
            Mock::given(method("GET"))
                .respond_with(ResponseTemplate::new(502).set_body_string("upstream exploded"))
                .mount(&server),
        );

        let err = HttpTransport::new()
            .get(&server_uri(&server, "/v1/me"), &[])
            .expect_err("api error");
        match err {
            Error::Api { status, message, body } => {
                assert_eq!(status, 502);
                assert_eq!(message, "Bad Gateway");
                assert_eq!(body, "upstream exploded");
            }
            other => panic!("expected API error, got {other:?}"),
        }
    }

    #[test]
    fn connection_failures_are_transport_errors() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener); // release the port so the request fails with ECONNREFUSED

        let uri: Uri = format!("http://{addr}/v1/me").parse().unwrap();
        let err = HttpTransport::new().get(&uri, &[]).expect_err("transport error");
        assert!(err.is_transport(), "expected transport error, got {err:?}");
    }

    #[test]
    fn error_message_handles_both_envelope_shapes() {
        assert_eq!(
            error_message(r#"{"error":{"status":404,"message":"Not found."}}"#),
            Some("Not found.".to_owned())
        );
        assert_eq!(
            error_message(r#"{"error":"invalid_grant","error_description":"Refresh token revoked"}"#),
            Some("Refresh token revoked".to_owned())
        );
        assert_eq!(
            error_message(r#"{"error":"invalid_request"}"#),
            Some("invalid_request".to_owned())
        );
        assert_eq!(error_message("<html>teapot</html>"), None);
        assert_eq!(error_message(r#"{"error":{}}"#), None);
    }
}
