//! Bearer token acquisition.
//!
//! Deployments fronted by an identity provider require a token from a
//! client-credentials exchange. The token endpoint is taken from the
//! provider's discovery document; the token is acquired once, when the
//! client connects, and reused for the life of the handle.

use oauth2::basic::BasicClient;
use oauth2::reqwest::async_http_client;
use oauth2::{AuthUrl, ClientId, ClientSecret, TokenResponse, TokenUrl};
use serde::Deserialize;
use tracing::{debug, info};

use tb_core::config::OidcConfig;

use crate::error::{BlobApiError, BlobApiResult};

/// Subset of the OIDC discovery document the exchange needs
#[derive(Debug, Deserialize)]
struct ProviderMetadata {
    token_endpoint: String,
    #[serde(default)]
    authorization_endpoint: String,
}

/// Run the discovery plus client-credentials exchange and return the
/// bearer token
pub async fn acquire_token(http: &reqwest::Client, oidc: &OidcConfig) -> BlobApiResult<String> {
    let discovery_url = format!(
        "{}/.well-known/openid-configuration",
        oidc.provider_url.trim_end_matches('/')
    );

    debug!(url = %discovery_url, "Fetching OIDC provider metadata");

    let metadata: ProviderMetadata = http
        .get(&discovery_url)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await
        .map_err(|e| BlobApiError::auth(format!("invalid discovery document: {e}")))?;

    // Client-credentials never hits the authorization endpoint, but the
    // client type still wants one; fall back to the provider URL when the
    // document omits it.
    let auth_endpoint = if metadata.authorization_endpoint.is_empty() {
        oidc.provider_url.clone()
    } else {
        metadata.authorization_endpoint.clone()
    };

    let client = BasicClient::new(
        ClientId::new(oidc.client_id.clone()),
        Some(ClientSecret::new(oidc.client_secret.clone())),
        AuthUrl::new(auth_endpoint)
            .map_err(|e| BlobApiError::auth(format!("invalid authorization endpoint: {e}")))?,
        Some(
            TokenUrl::new(metadata.token_endpoint.clone())
                .map_err(|e| BlobApiError::auth(format!("invalid token endpoint: {e}")))?,
        ),
    );

    let token = client
        .exchange_client_credentials()
        .request_async(async_http_client)
        .await
        .map_err(|e| BlobApiError::auth(format!("client credentials exchange failed: {e}")))?;

    info!(endpoint = %metadata.token_endpoint, "Acquired blob service bearer token");

    Ok(token.access_token().secret().clone())
}
