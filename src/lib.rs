//! # Spotify Web Client
//!
//! Request construction and execution core for the Spotify Web API:
//! assembles requests from declarative builder state and executes them
//! synchronously or asynchronously against a pluggable transport,
//! returning raw response bodies for downstream parsing.
//!
//! ## Features
//!
//! - **Fluent builder**: path templates with `{placeholder}` substitution,
//!   percent-encoded parameters, ordered multi-value query keys
//! - **Pluggable transport**: network I/O behind a [`Transport`] trait,
//!   with a blocking reqwest implementation as the default
//! - **Dual execution**: blocking [`Request::execute`] and pool-backed
//!   [`Request::execute_async`] share one request semantics
//! - **Structured failures**: configuration, URI, transport and API errors
//!   are distinct variants carrying status and payload details
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use spotify_web_client::RequestBuilder;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let request = RequestBuilder::new()
//!         .header("Authorization", "Bearer <token>")?
//!         .path_parameter("user_id", "wizzler")?
//!         .path("/v1/users/{user_id}/playlists")?
//!         .build()?;
//!
//!     let body = request.execute()?;
//!     println!("{body}");
//!     Ok(())
//! }
//! ```
//!
//! ## Asynchronous execution
//!
//! ```rust,no_run
//! use spotify_web_client::{Method, RequestBuilder};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let request = RequestBuilder::new()
//!         .method(Method::PUT)?
//!         .header("Authorization", "Bearer <token>")?
//!         .path("/v1/me/following")?
//!         .query_parameter("type", "artist")?
//!         .query_parameter("ids", "0LcJLqbBmaGUft1e9Mm8HV")?
//!         .build()?;
//!
//!     let handle = request.execute_async();
//!     let body = handle.wait()?;
//!     println!("{body}");
//!
//!     // Reclaim the worker pool at process exit.
//!     spotify_web_client::shutdown();
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod executor;
mod param;
mod request;
mod transport;

pub use config::{DEFAULT_HOST, DEFAULT_PORT, DEFAULT_SCHEME, TransportConfig, default_transport};
pub use error::{Error, Result};
pub use executor::{ResponseHandle, shutdown};
pub use param::Parameter;
pub use request::{Request, RequestBuilder};
pub use transport::{HttpTransport, Payload, Transport};

// Re-export common types
pub use http::{Method, StatusCode, Uri};

/// Prelude for common imports.
///
/// ```
/// use spotify_web_client::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{TransportConfig, default_transport};
    pub use crate::error::{Error, Result};
    pub use crate::executor::ResponseHandle;
    pub use crate::param::Parameter;
    pub use crate::request::{Request, RequestBuilder};
    pub use crate::transport::{HttpTransport, Payload, Transport};
    pub use http::{Method, StatusCode, Uri};
}
