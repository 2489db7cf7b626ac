//! Integration platform seam.
//!
//! [`ToolkitPlatform`] is the narrow contract the connection flow and agent
//! runs consume. [`PlatformClient`] implements it over the platform's v3 REST
//! API; every call is credentialed by the caller's key in `x-api-key`.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use tracing::debug;
use url::Url;

use super::ToolkitError;
use super::models::{
    AuthConfig, AuthConfigKind, AuthSchemeDetail, ConnectionInitiation, ConnectionStatus,
    InitiatedConnection, NewAuthConfig, ToolExecution, ToolQuery, ToolSchema, Toolkit,
};
use crate::credential::ApiCredential;

/// Operations consumed from the toolkit-integration platform.
#[async_trait]
pub trait ToolkitPlatform: Send + Sync {
    /// `GET toolkit(slug)`.
    async fn fetch_toolkit(
        &self,
        credential: &ApiCredential,
        slug: &str,
    ) -> Result<Toolkit, ToolkitError>;

    /// `LIST auth_configs()` narrowed to one toolkit.
    async fn list_auth_configs(
        &self,
        credential: &ApiCredential,
        toolkit_slug: &str,
    ) -> Result<Vec<AuthConfig>, ToolkitError>;

    /// `CREATE auth_config(toolkit, ...)`.
    async fn create_auth_config(
        &self,
        credential: &ApiCredential,
        toolkit_slug: &str,
        config: &NewAuthConfig,
    ) -> Result<AuthConfig, ToolkitError>;

    /// `INITIATE connection(userId, authConfigId, config?)`. Not idempotent.
    async fn initiate_connection(
        &self,
        credential: &ApiCredential,
        initiation: &ConnectionInitiation,
    ) -> Result<InitiatedConnection, ToolkitError>;

    /// `GET connection(id)`.
    async fn connection_status(
        &self,
        credential: &ApiCredential,
        connection_id: &str,
    ) -> Result<ConnectionStatus, ToolkitError>;

    async fn list_tools(
        &self,
        credential: &ApiCredential,
        query: &ToolQuery,
    ) -> Result<Vec<ToolSchema>, ToolkitError>;

    async fn execute_tool(
        &self,
        credential: &ApiCredential,
        tool_slug: &str,
        user_id: &str,
        arguments: &Value,
    ) -> Result<ToolExecution, ToolkitError>;

    /// Where a user can set a toolkit up by hand.
    fn dashboard_url(&self, toolkit_slug: &str) -> String;
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Deserialize)]
struct ToolkitWire {
    #[serde(default)]
    slug: Option<String>,
    name: String,
    #[serde(default)]
    composio_managed_auth_schemes: Vec<String>,
    #[serde(default)]
    auth_config_details: Vec<AuthDetailWire>,
}

#[derive(Deserialize)]
struct AuthDetailWire {
    mode: String,
}

/// One page of a cursor-paginated listing.
#[derive(Deserialize)]
struct ItemsWire<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
    #[serde(default)]
    next_cursor: Option<String>,
}

#[derive(Deserialize)]
struct ToolkitRefWire {
    slug: String,
}

#[derive(Deserialize)]
struct AuthConfigWire {
    id: String,
    toolkit: ToolkitRefWire,
    #[serde(default)]
    auth_scheme: Option<String>,
    #[serde(default)]
    is_composio_managed: Option<bool>,
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

#[derive(Deserialize)]
struct CreatedAuthConfigWire {
    auth_config: CreatedIdWire,
}

#[derive(Deserialize)]
struct CreatedIdWire {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ConnectionWire {
    id: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default, alias = "redirect_uri")]
    redirect_url: Option<String>,
}

#[derive(Deserialize)]
struct ToolWire {
    slug: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    input_parameters: Value,
}

#[derive(Deserialize)]
struct ExecutionWire {
    #[serde(default)]
    data: Value,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    successful: bool,
}

/// Upper bound on pages followed for one listing.
const MAX_PAGES: usize = 20;

const MANAGED_WIRE_TYPE: &str = "use_composio_managed_auth";
const CUSTOM_WIRE_TYPE: &str = "use_custom_auth";

fn wire_type(kind: AuthConfigKind) -> &'static str {
    match kind {
        AuthConfigKind::PlatformManaged => MANAGED_WIRE_TYPE,
        AuthConfigKind::Custom => CUSTOM_WIRE_TYPE,
    }
}

impl From<AuthConfigWire> for AuthConfig {
    fn from(w: AuthConfigWire) -> Self {
        let managed = w
            .is_composio_managed
            .unwrap_or_else(|| w.kind.as_deref() == Some(MANAGED_WIRE_TYPE));
        AuthConfig {
            id: w.id,
            toolkit_slug: w.toolkit.slug,
            kind: if managed {
                AuthConfigKind::PlatformManaged
            } else {
                AuthConfigKind::Custom
            },
            auth_scheme: w.auth_scheme,
        }
    }
}

// =============================================================================
// HTTP client
// =============================================================================

/// REST client for the integration platform.
#[derive(Clone, Debug)]
pub struct PlatformClient {
    http: Client,
    base_url: Url,
    dashboard_url: String,
    callback_url: Option<String>,
}

impl PlatformClient {
    /// `base_url` is the API root (e.g. `https://backend.composio.dev/api/v3`),
    /// `dashboard_url` the user-facing dashboard origin.
    pub fn new(http: Client, base_url: &str, dashboard_url: &str) -> Result<Self, ToolkitError> {
        let base_url: Url = base_url
            .parse()
            .map_err(|e| ToolkitError::Transport(format!("invalid platform URL {base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ToolkitError::Transport(format!(
                "platform URL cannot be a base: {base_url}"
            )));
        }
        Ok(Self {
            http,
            base_url,
            dashboard_url: dashboard_url.trim_end_matches('/').to_string(),
            callback_url: None,
        })
    }

    /// Send OAuth users back to `callback_url` after consent.
    pub fn with_callback_url(mut self, callback_url: Option<String>) -> Self {
        self.callback_url = callback_url;
        self
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ToolkitError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ToolkitError::Transport(format!("bad platform URL {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(
        &self,
        req: reqwest::RequestBuilder,
        credential: &ApiCredential,
        what: &str,
    ) -> Result<Response, ToolkitError> {
        req.header("x-api-key", credential.expose())
            .send()
            .await
            .map_err(|e| ToolkitError::Transport(format!("{what}: {e}")))
    }
}

/// Decode a successful reply; map failures onto the error taxonomy.
///
/// 404 becomes `not_found` when one is given, 401/403 become `Unauthorized`,
/// anything else non-2xx is `Upstream` with the body kept.
async fn decode<T: DeserializeOwned>(
    resp: Response,
    what: &str,
    not_found: Option<ToolkitError>,
) -> Result<T, ToolkitError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(match (status.as_u16(), not_found) {
            (404, Some(err)) => err,
            (401 | 403, _) => ToolkitError::Unauthorized(format!("{what}: {body}")),
            (code, _) => ToolkitError::Upstream { status: code, body },
        });
    }
    resp.json::<T>()
        .await
        .map_err(|e| ToolkitError::InvalidResponse(format!("{what}: {e}")))
}

/// Follow `next_cursor` until a page comes back without one.
async fn collect_pages<T, F, Fut>(mut fetch_page: F) -> Result<Vec<T>, ToolkitError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<ItemsWire<T>, ToolkitError>>,
{
    let mut items = Vec::new();
    let mut cursor = None;
    for _ in 0..MAX_PAGES {
        let page = fetch_page(cursor.take()).await?;
        items.extend(page.items);
        match page.next_cursor.filter(|c| !c.is_empty()) {
            Some(next) => cursor = Some(next),
            None => return Ok(items),
        }
    }
    debug!(pages = MAX_PAGES, items = items.len(), "listing truncated");
    Ok(items)
}

#[async_trait]
impl ToolkitPlatform for PlatformClient {
    async fn fetch_toolkit(
        &self,
        credential: &ApiCredential,
        slug: &str,
    ) -> Result<Toolkit, ToolkitError> {
        let url = self.endpoint(&["toolkits", slug])?;
        debug!(toolkit = slug, "fetching toolkit");
        let resp = self
            .send(self.http.get(url), credential, "toolkit lookup")
            .await?;
        let wire: ToolkitWire = decode(
            resp,
            "toolkit lookup",
            Some(ToolkitError::NotFound(slug.to_string())),
        )
        .await?;

        Ok(Toolkit {
            slug: wire.slug.unwrap_or_else(|| slug.to_string()).to_lowercase(),
            name: wire.name,
            managed_auth_schemes: wire.composio_managed_auth_schemes,
            auth_scheme_details: wire
                .auth_config_details
                .into_iter()
                .map(|d| AuthSchemeDetail { mode: d.mode })
                .collect(),
        })
    }

    async fn list_auth_configs(
        &self,
        credential: &ApiCredential,
        toolkit_slug: &str,
    ) -> Result<Vec<AuthConfig>, ToolkitError> {
        let url = self.endpoint(&["auth_configs"])?;
        let listed = collect_pages(|cursor| {
            let mut req = self
                .http
                .get(url.clone())
                .query(&[("toolkit_slug", toolkit_slug)]);
            if let Some(cursor) = cursor {
                req = req.query(&[("cursor", cursor)]);
            }
            async move {
                let resp = self.send(req, credential, "auth config listing").await?;
                decode::<ItemsWire<AuthConfigWire>>(resp, "auth config listing", None).await
            }
        })
        .await?;
        Ok(listed.into_iter().map(AuthConfig::from).collect())
    }

    async fn create_auth_config(
        &self,
        credential: &ApiCredential,
        toolkit_slug: &str,
        config: &NewAuthConfig,
    ) -> Result<AuthConfig, ToolkitError> {
        let mut auth_config = Map::new();
        auth_config.insert("type".into(), json!(wire_type(config.kind)));
        auth_config.insert("name".into(), json!(config.name));
        if let Some(scheme) = config.auth_scheme {
            auth_config.insert("authScheme".into(), json!(scheme));
        }
        if let Some(creds) = &config.credentials {
            auth_config.insert("credentials".into(), Value::Object(creds.clone()));
        }
        let body = json!({
            "toolkit": { "slug": toolkit_slug },
            "auth_config": auth_config,
        });

        let url = self.endpoint(&["auth_configs"])?;
        let resp = self
            .send(self.http.post(url).json(&body), credential, "auth config creation")
            .await?;
        let wire: CreatedAuthConfigWire = decode(resp, "auth config creation", None).await?;

        Ok(AuthConfig {
            id: wire.auth_config.id,
            toolkit_slug: toolkit_slug.to_string(),
            kind: config.kind,
            auth_scheme: config.auth_scheme.map(str::to_string),
        })
    }

    async fn initiate_connection(
        &self,
        credential: &ApiCredential,
        initiation: &ConnectionInitiation,
    ) -> Result<InitiatedConnection, ToolkitError> {
        let mut connection = Map::new();
        connection.insert("user_id".into(), json!(initiation.user_id));
        if let Some(callback_url) = &self.callback_url {
            connection.insert("callback_url".into(), json!(callback_url));
        }
        if let Some(data) = &initiation.data {
            connection.insert(
                "state".into(),
                json!({ "authScheme": data.auth_scheme, "val": data.values }),
            );
        }
        let body = json!({
            "auth_config": { "id": initiation.auth_config_id },
            "connection": connection,
        });

        let url = self.endpoint(&["connected_accounts"])?;
        let resp = self
            .send(self.http.post(url).json(&body), credential, "connection initiation")
            .await?;
        let wire: ConnectionWire = decode(resp, "connection initiation", None).await?;

        let redirect_url = wire.redirect_url.filter(|u| !u.trim().is_empty());
        let mut status = wire
            .status
            .as_deref()
            .map(ConnectionStatus::from_platform)
            .unwrap_or(ConnectionStatus::Connecting);
        if redirect_url.is_some() && !status.is_terminal() {
            status = ConnectionStatus::PendingRedirect;
        }
        Ok(InitiatedConnection {
            id: wire.id,
            status,
            redirect_url,
        })
    }

    async fn connection_status(
        &self,
        credential: &ApiCredential,
        connection_id: &str,
    ) -> Result<ConnectionStatus, ToolkitError> {
        let url = self.endpoint(&["connected_accounts", connection_id])?;
        let resp = self
            .send(self.http.get(url), credential, "connection lookup")
            .await?;
        let wire: ConnectionWire = decode(
            resp,
            "connection lookup",
            Some(ToolkitError::ConnectionNotFound(connection_id.to_string())),
        )
        .await?;
        Ok(wire
            .status
            .as_deref()
            .map(ConnectionStatus::from_platform)
            .unwrap_or(ConnectionStatus::Connecting))
    }

    async fn list_tools(
        &self,
        credential: &ApiCredential,
        query: &ToolQuery,
    ) -> Result<Vec<ToolSchema>, ToolkitError> {
        let url = self.endpoint(&["tools"])?;
        let req = match query {
            ToolQuery::Slugs(slugs) => {
                let joined = slugs
                    .iter()
                    .map(|s| s.to_uppercase())
                    .collect::<Vec<_>>()
                    .join(",");
                self.http.get(url).query(&[("tool_slugs", joined)])
            }
            ToolQuery::Search { query, limit } => self
                .http
                .get(url)
                .query(&[("search", query.clone()), ("limit", limit.to_string())]),
        };
        let resp = self.send(req, credential, "tool listing").await?;
        let wire: ItemsWire<ToolWire> = decode(resp, "tool listing", None).await?;

        Ok(wire
            .items
            .into_iter()
            .map(|t| ToolSchema {
                name: if t.name.is_empty() { t.slug.clone() } else { t.name },
                slug: t.slug,
                description: t.description,
                input_parameters: t.input_parameters,
            })
            .collect())
    }

    async fn execute_tool(
        &self,
        credential: &ApiCredential,
        tool_slug: &str,
        user_id: &str,
        arguments: &Value,
    ) -> Result<ToolExecution, ToolkitError> {
        let url = self.endpoint(&["tools", "execute", tool_slug])?;
        let body = json!({ "user_id": user_id, "arguments": arguments });
        debug!(tool = tool_slug, user_id, "executing tool");
        let resp = self
            .send(self.http.post(url).json(&body), credential, "tool execution")
            .await?;
        let wire: ExecutionWire = decode(resp, "tool execution", None).await?;
        Ok(ToolExecution {
            successful: wire.successful,
            data: wire.data,
            error: wire.error.filter(|e| !e.is_empty()),
        })
    }

    fn dashboard_url(&self, toolkit_slug: &str) -> String {
        format!("{}/apps/{}", self.dashboard_url, toolkit_slug)
    }
}
