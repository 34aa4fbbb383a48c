//! Request builder and executable request.

use std::fmt;
use std::sync::Arc;

use http::{Method, Uri};
use tracing::debug;

use crate::config;
use crate::error::{Error, Result};
use crate::executor::{self, ResponseHandle};
use crate::param::{self, Parameter};
use crate::transport::{Payload, Transport};

/// Accumulates request configuration and produces an executable [`Request`].
///
/// Every setter validates its own argument and returns the builder for
/// chaining; `build` consumes the builder, so a finalized request can never
/// be rebuilt or mutated.
pub struct RequestBuilder {
    transport: Arc<dyn Transport>,
    method: Method,
    scheme: String,
    host: String,
    port: u16,
    path: Option<String>,
    path_parameters: Vec<Parameter>,
    query_parameters: Vec<Parameter>,
    headers: Vec<Parameter>,
    form_parameters: Vec<Parameter>,
    body_parameters: Vec<Parameter>,
    body: Option<String>,
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self {
            transport: config::default_transport(),
            method: Method::GET,
            scheme: config::DEFAULT_SCHEME.to_owned(),
            host: config::DEFAULT_HOST.to_owned(),
            port: config::DEFAULT_PORT,
            path: None,
            path_parameters: Vec::new(),
            query_parameters: Vec::new(),
            headers: Vec::new(),
            form_parameters: Vec::new(),
            body_parameters: Vec::new(),
            body: None,
        }
    }
}

impl RequestBuilder {
    /// Create a builder populated with the process-wide defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inject the transport the built request will execute against.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    /// Select the HTTP method. Only GET, POST, PUT and DELETE are accepted.
    pub fn method(mut self, method: Method) -> Result<Self> {
        if method == Method::GET
            || method == Method::POST
            || method == Method::PUT
            || method == Method::DELETE
        {
            self.method = method;
            Ok(self)
        } else {
            Err(Error::Configuration(format!("unsupported method: {method}")))
        }
    }

    /// Set the URI scheme.
    pub fn scheme(mut self, scheme: impl Into<String>) -> Result<Self> {
        let scheme = scheme.into();
        if scheme.is_empty() {
            return Err(Error::Configuration("scheme must not be empty".into()));
        }
        self.scheme = scheme;
        Ok(self)
    }

    /// Set the host.
    pub fn host(mut self, host: impl Into<String>) -> Result<Self> {
        let host = host.into();
        if host.is_empty() {
            return Err(Error::Configuration("host must not be empty".into()));
        }
        self.host = host;
        Ok(self)
    }

    /// Set the port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the path, substituting every previously registered path
    /// parameter `{name}` with its percent-encoded value.
    ///
    /// Placeholders with no registered parameter are left literal, so
    /// parameters must be registered before the `path` call that consumes
    /// them.
    pub fn path(mut self, template: impl Into<String>) -> Result<Self> {
        let template = template.into();
        if template.is_empty() {
            return Err(Error::Configuration("path must not be empty".into()));
        }

        let mut resolved = template;
        for parameter in &self.path_parameters {
            resolved = resolved.replace(&format!("{{{}}}", parameter.name()), parameter.value());
        }

        self.path = Some(resolved);
        Ok(self)
    }

    /// Register a path parameter for template substitution. The value is
    /// percent-encoded immediately.
    pub fn path_parameter(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<Self> {
        let name = name.into();
        let value = value.into();
        if name.is_empty() {
            return Err(Error::Configuration("path parameter name must not be empty".into()));
        }
        if value.is_empty() {
            return Err(Error::Configuration("path parameter value must not be empty".into()));
        }

        self.path_parameters
            .push(Parameter::new(name, param::percent_encode(&value)));
        Ok(self)
    }

    /// Append a query parameter. Repeated names are preserved in insertion
    /// order.
    pub fn query_parameter(mut self, name: impl Into<String>, value: impl ToString) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::Configuration("query parameter name must not be empty".into()));
        }
        self.query_parameters.push(Parameter::new(name, value.to_string()));
        Ok(self)
    }

    /// Append a header. Repeated names are preserved in insertion order.
    pub fn header(mut self, name: impl Into<String>, value: impl ToString) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::Configuration("header name must not be empty".into()));
        }
        self.headers.push(Parameter::new(name, value.to_string()));
        Ok(self)
    }

    /// Append a form parameter. Repeated names are preserved in insertion
    /// order.
    pub fn form_parameter(mut self, name: impl Into<String>, value: impl ToString) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::Configuration("form parameter name must not be empty".into()));
        }
        self.form_parameters.push(Parameter::new(name, value.to_string()));
        Ok(self)
    }

    /// Append a body parameter. Repeated names are preserved in insertion
    /// order.
    pub fn body_parameter(mut self, name: impl Into<String>, value: impl ToString) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::Configuration("body parameter name must not be empty".into()));
        }
        self.body_parameters.push(Parameter::new(name, value.to_string()));
        Ok(self)
    }

    /// Set the raw body string.
    pub fn body(mut self, value: impl Into<String>) -> Self {
        self.body = Some(value.into());
        self
    }

    /// Bulk setter for transport, scheme, host and port.
    pub fn defaults(
        self,
        transport: Arc<dyn Transport>,
        scheme: impl Into<String>,
        host: impl Into<String>,
        port: u16,
    ) -> Result<Self> {
        Ok(self.transport(transport).scheme(scheme)?.host(host)?.port(port))
    }

    /// The resolved path template, if one has been set.
    pub fn resolved_path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Consume the builder and produce an immutable [`Request`].
    ///
    /// Fails with [`Error::Configuration`] when no path was set and with
    /// [`Error::UriConstruction`] when scheme, host and path do not form a
    /// syntactically valid URI.
    pub fn build(self) -> Result<Request> {
        let path = self
            .path
            .ok_or_else(|| Error::Configuration("request path is not set".into()))?;

        let path_and_query = if self.query_parameters.is_empty() {
            path
        } else {
            format!("{}?{}", path, param::encode_query(&self.query_parameters))
        };

        let authority = format!("{}:{}", self.host, self.port);
        let uri = Uri::builder()
            .scheme(self.scheme.as_str())
            .authority(authority.as_str())
            .path_and_query(path_and_query.as_str())
            .build()
            .map_err(|e| Error::UriConstruction(e.to_string()))?;

        Ok(Request {
            transport: self.transport,
            method: self.method,
            uri,
            headers: self.headers,
            form_parameters: self.form_parameters,
            body_parameters: self.body_parameters,
            body: self.body,
        })
    }
}

/// A finalized, immutable request.
///
/// A request may be executed any number of times; every execution performs
/// exactly one network call against the shared transport.
#[derive(Clone)]
pub struct Request {
    transport: Arc<dyn Transport>,
    method: Method,
    uri: Uri,
    headers: Vec<Parameter>,
    form_parameters: Vec<Parameter>,
    body_parameters: Vec<Parameter>,
    body: Option<String>,
}

impl Request {
    /// The request URI.
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// The HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The headers, in insertion order.
    pub fn headers(&self) -> &[Parameter] {
        &self.headers
    }

    /// The form parameters, in insertion order.
    pub fn form_parameters(&self) -> &[Parameter] {
        &self.form_parameters
    }

    /// The body parameters, in insertion order.
    pub fn body_parameters(&self) -> &[Parameter] {
        &self.body_parameters
    }

    /// The raw body string, if set.
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// Execute on the calling thread, blocking until the transport returns,
    /// and yield the raw response body.
    pub fn execute(&self) -> Result<String> {
        debug!(method = %self.method, uri = %self.uri, "executing request");

        match self.method.as_str() {
            "GET" => self.transport.get(&self.uri, &self.headers),
            "POST" => self.transport.post(&self.uri, &self.headers, self.payload().as_ref()),
            "PUT" => self.transport.put(&self.uri, &self.headers, self.payload().as_ref()),
            "DELETE" => self.transport.delete(&self.uri, &self.headers),
            other => Err(Error::Configuration(format!("unsupported method: {other}"))),
        }
    }

    /// Submit the execution to the shared worker pool and return a handle.
    ///
    /// The handle completes with the same outcomes as [`execute`]
    /// (see [`ResponseHandle::wait`]); completion order between
    /// independently submitted executions is unspecified.
    ///
    /// [`execute`]: Request::execute
    pub fn execute_async(&self) -> ResponseHandle {
        let request = self.clone();
        executor::submit(move || request.execute())
    }

    /// The payload for this execution. The raw body wins over body
    /// parameters; body parameters win over form parameters.
    fn payload(&self) -> Option<Payload> {
        if let Some(body) = &self.body {
            Some(Payload::Raw(body.clone()))
        } else if !self.body_parameters.is_empty() {
            Some(Payload::Json(self.body_parameters.clone()))
        } else if !self.form_parameters.is_empty() {
            Some(Payload::Form(self.form_parameters.clone()))
        } else {
            None
        }
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("uri", &self.uri)
            .field("headers", &self.headers)
            .field("body", &self.body)
            .finish_non_exhaustive()
    }
}
