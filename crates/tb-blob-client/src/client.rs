//! Blob service client.

use async_trait::async_trait;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::{debug, info, instrument};
use url::Url;

use tb_core::config::{BlobStorageConfig, BucketConfig, OidcConfig};

use crate::auth;
use crate::error::{BlobApiError, BlobApiResult};
use crate::model::{BlobObject, DeleteOptions, ListOptions, NewObject, ObjectList};
use crate::sign;

const SIGNATURE_HEADER: &str = "x-blob-signature";

/// Consumed surface of the remote service
#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait BlobApi: Send + Sync {
    /// List stored objects filtered by prefix, optionally with content
    /// inlined
    async fn list_objects(&self, options: ListOptions) -> BlobApiResult<Vec<BlobObject>>;

    /// Submit a new object
    async fn create_object(&self, object: NewObject) -> BlobApiResult<BlobObject>;

    /// Delete every object matching the prefix
    async fn delete_objects(&self, options: DeleteOptions) -> BlobApiResult<()>;
}

/// Error body the service attaches to non-2xx responses
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiErrorBody {
    #[serde(default)]
    error_id: String,
    #[serde(default)]
    message: String,
}

/// reqwest-backed [`BlobApi`] implementation
pub struct BlobClient {
    http: reqwest::Client,
    base_url: Url,
    bucket: BucketConfig,
    bearer: Option<String>,
}

impl BlobClient {
    /// Connect to the service. When an identity provider is configured, a
    /// bearer token is acquired up front and reused for the life of the
    /// handle.
    pub async fn connect(bucket: BucketConfig, oidc: Option<&OidcConfig>) -> BlobApiResult<Self> {
        let base_url = Url::parse(&bucket.base_url)?;
        let http = reqwest::Client::new();

        let bearer = match oidc {
            Some(oidc) => Some(auth::acquire_token(&http, oidc).await?),
            None => None,
        };

        info!(
            bucket = %bucket.id,
            base_url = %base_url,
            authenticated = bearer.is_some(),
            "Blob client connected"
        );

        Ok(Self {
            http,
            base_url,
            bucket,
            bearer,
        })
    }

    /// Connect using the plugin configuration
    pub async fn from_config(config: &BlobStorageConfig) -> BlobApiResult<Self> {
        Self::connect(config.bucket.clone(), config.oidc.as_ref()).await
    }

    fn files_url(&self) -> String {
        format!("{}/v1/files", self.base_url.as_str().trim_end_matches('/'))
    }

    /// Sign and execute a prepared request
    async fn send(&self, builder: reqwest::RequestBuilder) -> BlobApiResult<reqwest::Response> {
        let mut request = builder.build()?;

        let path_and_query = match request.url().query() {
            Some(query) => format!("{}?{}", request.url().path(), query),
            None => request.url().path().to_string(),
        };
        let signature =
            sign::sign_request(&self.bucket.key, request.method().as_str(), &path_and_query);

        let headers = request.headers_mut();
        headers.insert(
            SIGNATURE_HEADER,
            HeaderValue::from_str(&signature)
                .map_err(|e| BlobApiError::auth(format!("unusable signature: {e}")))?,
        );
        if let Some(token) = &self.bearer {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {token}"))
                    .map_err(|e| BlobApiError::auth(format!("unusable bearer token: {e}")))?,
            );
        }

        Ok(self.http.execute(request).await?)
    }
}

/// Turn a non-2xx response body into a typed error
fn parse_error_body(status: u16, reason: &str, body: &str) -> BlobApiError {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(err) if !err.error_id.is_empty() || !err.message.is_empty() => {
            let error_id = if err.error_id.is_empty() {
                status.to_string()
            } else {
                err.error_id
            };
            BlobApiError::api(error_id, err.message, status)
        }
        _ => {
            let message = if body.trim().is_empty() {
                reason.to_string()
            } else {
                body.trim().to_string()
            };
            BlobApiError::api(status.to_string(), message, status)
        }
    }
}

async fn error_from(response: reqwest::Response) -> BlobApiError {
    let status = response.status();
    let reason = status.canonical_reason().unwrap_or("request failed");
    let body = response.text().await.unwrap_or_default();
    parse_error_body(status.as_u16(), reason, &body)
}

#[async_trait]
impl BlobApi for BlobClient {
    #[instrument(skip(self), fields(bucket = %self.bucket.id))]
    async fn list_objects(&self, options: ListOptions) -> BlobApiResult<Vec<BlobObject>> {
        let mut query = vec![
            ("bucket", self.bucket.id.clone()),
            ("prefix", options.prefix.clone()),
        ];
        if options.include_data {
            query.push(("include_data", "1".to_string()));
        }

        let response = self.send(self.http.get(self.files_url()).query(&query)).await?;
        if !response.status().is_success() {
            return Err(error_from(response).await);
        }

        let list: ObjectList = response
            .json()
            .await
            .map_err(|e| BlobApiError::invalid_response(format!("malformed file listing: {e}")))?;

        debug!(prefix = %options.prefix, count = list.files.len(), "Listed blob objects");
        Ok(list.files)
    }

    #[instrument(skip(self, object), fields(bucket = %self.bucket.id, file_name = %object.file_name))]
    async fn create_object(&self, object: NewObject) -> BlobApiResult<BlobObject> {
        let part = Part::bytes(object.content).file_name(object.file_name.clone());
        let form = Form::new()
            .text("bucket", self.bucket.id.clone())
            .text("prefix", object.prefix.clone())
            .text("fileName", object.file_name.clone())
            .part("file", part);

        let response = self.send(self.http.post(self.files_url()).multipart(form)).await?;
        if !response.status().is_success() {
            return Err(error_from(response).await);
        }

        let created: BlobObject = response.json().await.map_err(|e| {
            BlobApiError::invalid_response(format!("malformed create response: {e}"))
        })?;

        debug!(identifier = %created.identifier, prefix = %created.prefix, "Created blob object");
        Ok(created)
    }

    #[instrument(skip(self), fields(bucket = %self.bucket.id))]
    async fn delete_objects(&self, options: DeleteOptions) -> BlobApiResult<()> {
        let query = [
            ("bucket", self.bucket.id.clone()),
            ("prefix", options.prefix.clone()),
        ];

        let response = self.send(self.http.delete(self.files_url()).query(&query)).await?;
        if !response.status().is_success() {
            return Err(error_from(response).await);
        }

        debug!(prefix = %options.prefix, "Deleted blob objects");
        Ok(())
    }
}
