//! Toolkit connection negotiation.
//!
//! Given a toolkit slug and a requested auth type, this module fetches the
//! toolkit's metadata, decides between platform-managed and custom auth,
//! reuses or creates an auth config, initiates the connection and, for
//! redirect-based schemes, polls until the connection settles.
//!
//! # Public API
//!
//! - [`platform::ToolkitPlatform`]: the platform seam (HTTP impl:
//!   [`platform::PlatformClient`])
//! - [`fetch_toolkit`]: toolkit metadata lookup
//! - [`resolver::classify`] / [`resolver::resolve_auth_config`]
//! - [`connection::initiate_connection`]
//! - [`waiter::wait_for_connection`]
//! - [`naming::extract_toolkit_slug`]
//! - [`flow::connect_toolkit`]: the whole sequence

pub mod connection;
pub mod flow;
pub mod models;
pub mod naming;
pub mod platform;
pub mod resolver;
pub mod waiter;

#[cfg(test)]
pub(crate) mod testing;

use std::time::Duration;

use thiserror::Error;

use crate::credential::ApiCredential;
use models::Toolkit;
use platform::ToolkitPlatform;

/// Errors raised while negotiating a toolkit connection.
#[derive(Debug, Error)]
pub enum ToolkitError {
    #[error("Toolkit not found: {0}")]
    NotFound(String),

    #[error("Connection not found: {0}")]
    ConnectionNotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Missing credentials: {}", .fields.join(", "))]
    MissingCredentials { fields: Vec<&'static str> },

    #[error(
        "{toolkit_name} does not support {auth_type} auth here; set it up manually at {dashboard_url}"
    )]
    UnsupportedAuthType {
        toolkit_name: String,
        auth_type: String,
        dashboard_url: String,
    },

    #[error("Platform returned HTTP {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Connection {connection_id} did not complete within {}s", .waited.as_secs())]
    Timeout {
        connection_id: String,
        waited: Duration,
    },

    #[error("Wait cancelled")]
    Cancelled,

    #[error("Platform request failed: {0}")]
    Transport(String),

    #[error("Unexpected platform response: {0}")]
    InvalidResponse(String),
}

/// Fetch a toolkit's metadata.
///
/// One network call, no retries. Fails with [`ToolkitError::NotFound`],
/// [`ToolkitError::Unauthorized`] or [`ToolkitError::Upstream`].
pub async fn fetch_toolkit(
    platform: &dyn ToolkitPlatform,
    credential: &ApiCredential,
    slug: &str,
) -> Result<Toolkit, ToolkitError> {
    let slug = slug.trim();
    if slug.is_empty() {
        return Err(ToolkitError::NotFound("empty toolkit slug".into()));
    }
    platform.fetch_toolkit(credential, slug).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use testing::FakePlatform;

    #[tokio::test]
    async fn fetch_toolkit_returns_metadata() {
        let platform = FakePlatform::new().with_toolkit("gmail", "Gmail", &["OAUTH2"], &["oauth2"]);
        let cred = ApiCredential::new("key");

        let toolkit = fetch_toolkit(&platform, &cred, "gmail").await.unwrap();
        assert_eq!(toolkit.name, "Gmail");
        assert_eq!(toolkit.managed_auth_schemes, vec!["OAUTH2".to_string()]);
    }

    #[tokio::test]
    async fn fetch_unknown_toolkit_is_not_found() {
        let platform = FakePlatform::new();
        let cred = ApiCredential::new("key");

        let err = fetch_toolkit(&platform, &cred, "nope").await.unwrap_err();
        assert!(matches!(err, ToolkitError::NotFound(_)));
    }

    #[tokio::test]
    async fn blank_slug_skips_the_network() {
        let platform = FakePlatform::new();
        let cred = ApiCredential::new("key");

        let err = fetch_toolkit(&platform, &cred, "  ").await.unwrap_err();
        assert!(matches!(err, ToolkitError::NotFound(_)));
        assert_eq!(platform.calls().total(), 0);
    }

    #[test]
    fn missing_credentials_message_names_fields() {
        let err = ToolkitError::MissingCredentials {
            fields: vec!["clientId", "clientSecret"],
        };
        assert_eq!(err.to_string(), "Missing credentials: clientId, clientSecret");
    }
}
