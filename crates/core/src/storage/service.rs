//! Qiniu storage adapter implementation.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, info};
use url::Url;

use super::adapter::{Serve, StorageAdapter, UploadRequest};
use super::client::{QiniuClient, RemoteClient};
use super::config::QiniuConfig;
use super::context::{Clock, PathContext, SystemClock};
use super::error::StorageError;
use super::template::{Template, split_format};
use super::token::{Credentials, PutPolicy};
use super::unique::{normalize_separators, unique_file_name};

/// Storage adapter that uploads to a Qiniu bucket and serves from its
/// public domain.
pub struct QiniuStorage<C = QiniuClient> {
    credentials: Credentials,
    bucket: String,
    domain: Url,
    dir_template: Template,
    name_template: Template,
    token_ttl_secs: u64,
    client: C,
    clock: Arc<dyn Clock>,
}

impl QiniuStorage<QiniuClient> {
    /// Create a new adapter from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the domain or upload URL is not an absolute URL,
    /// or the path format does not compile.
    pub fn from_config(config: QiniuConfig) -> Result<Self, StorageError> {
        let client = QiniuClient::new(&config.upload_url)?;
        Self::with_client(config, client)
    }
}

impl<C: RemoteClient> QiniuStorage<C> {
    /// Create a new adapter that talks to the object store through `client`.
    ///
    /// # Errors
    ///
    /// Returns an error if the domain is not an absolute URL or the path
    /// format does not compile.
    pub fn with_client(config: QiniuConfig, client: C) -> Result<Self, StorageError> {
        let domain = Url::parse(&config.domain).map_err(|e| {
            StorageError::configuration(format!("invalid domain '{}': {e}", config.domain))
        })?;
        if domain.cannot_be_a_base() {
            return Err(StorageError::configuration(format!(
                "invalid domain '{}': not a base URL",
                config.domain
            )));
        }

        let (dir_format, name_format) = split_format(&config.format);
        let dir_template = Template::compile(dir_format)?;
        let name_template = Template::compile(name_format)?;
        debug!(
            dir = dir_template.source(),
            name = name_template.source(),
            "compiled path templates"
        );

        Ok(Self {
            credentials: Credentials::new(config.access_key, config.secret_key),
            bucket: config.bucket,
            domain,
            dir_template,
            name_template,
            token_ttl_secs: config.token_ttl_secs,
            client,
            clock: Arc::new(SystemClock),
        })
    }

    /// Replace the clock used for path contexts and token deadlines.
    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Directory an upload lands in: an explicit non-empty target directory
    /// wins, then the request's own, then the directory template.
    #[must_use]
    pub fn resolve_dir(
        &self,
        context: &PathContext,
        request: &UploadRequest,
        target_dir: Option<&str>,
    ) -> String {
        target_dir
            .filter(|dir| !dir.is_empty())
            .or_else(|| request.target_dir.as_deref().filter(|dir| !dir.is_empty()))
            .map_or_else(|| self.dir_template.render(context), str::to_string)
    }

    /// File name an upload is stored as, before uniqueness suffixing.
    #[must_use]
    pub fn resolve_name(&self, context: &PathContext) -> String {
        self.name_template.render(context)
    }

    /// Absolute URL of `key` on the public domain.
    ///
    /// # Errors
    ///
    /// Returns an error if `key` cannot be resolved against the domain.
    pub fn public_url(&self, key: &str) -> Result<String, StorageError> {
        self.domain.join(key).map(String::from).map_err(|e| {
            StorageError::configuration(format!("cannot resolve '{key}' against domain: {e}"))
        })
    }

    /// Get the bucket name.
    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Get the public domain.
    #[must_use]
    pub fn domain(&self) -> &Url {
        &self.domain
    }
}

impl<C: RemoteClient> StorageAdapter for QiniuStorage<C> {
    /// Always `false`: the bucket is never probed, so uniqueness falls to
    /// the name template.
    async fn exists(&self, _filename: &str, _target_dir: Option<&str>) -> Result<bool, StorageError> {
        Ok(false)
    }

    async fn save(
        &self,
        request: &UploadRequest,
        target_dir: Option<&str>,
    ) -> Result<String, StorageError> {
        let now = self.clock.now();
        let context = PathContext::build(&request.name, &now);

        let dir = self.resolve_dir(&context, request, target_dir);
        let resolved = request.with_name(self.resolve_name(&context));
        let file_name = unique_file_name(self, &resolved.name, &dir).await?;
        let key = normalize_separators(&file_name);

        let policy = PutPolicy::new(self.bucket.as_str(), &now, self.token_ttl_secs);
        let token = self.credentials.upload_token(&policy)?;
        debug!(
            key = %key,
            bucket = %self.bucket,
            access_key = %self.credentials.access_key(),
            deadline = policy.deadline,
            "minted upload token"
        );

        let response = self
            .client
            .put_file(
                &token,
                &key,
                &resolved.path,
                resolved.content_type.as_deref(),
            )
            .await?;

        let url = self.public_url(&response.key)?;
        info!(
            original = %request.name,
            key = %response.key,
            url = %url,
            "upload stored"
        );

        Ok(url)
    }

    fn serve(&self) -> Serve {
        Serve::PassThrough
    }

    async fn delete(&self, _filename: &str, _target_dir: Option<&str>) -> Result<(), StorageError> {
        Err(StorageError::NotImplemented)
    }

    async fn read(&self, locator: &str) -> Result<Bytes, StorageError> {
        let path = locator_path(locator)?;
        let url = self
            .domain
            .join(&path)
            .map_err(|_| StorageError::malformed_locator(locator))?;

        self.client.get(&url).await
    }
}

/// Path component of a read locator, which may be an absolute URL or a
/// bare path. Query and fragment are dropped.
fn locator_path(locator: &str) -> Result<String, StorageError> {
    let trimmed = locator.trim();
    let path = match Url::parse(trimmed) {
        Ok(url) if url.cannot_be_a_base() => {
            return Err(StorageError::malformed_locator(locator));
        }
        Ok(url) => url.path().to_string(),
        Err(_) => trimmed
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    };

    if path.is_empty() || path == "/" {
        return Err(StorageError::malformed_locator(locator));
    }
    Ok(path)
}
