//! Storage configuration types.

use ghost_qiniu_shared::StorageSettings;

/// Qiniu adapter configuration.
#[derive(Clone)]
pub struct QiniuConfig {
    /// Qiniu access key.
    pub access_key: String,
    /// Qiniu secret key.
    pub secret_key: String,
    /// Bucket the upload policy is scoped to.
    pub bucket: String,
    /// Public base URL the bucket is served from.
    pub domain: String,
    /// Path template, split into a directory and a filename part.
    pub format: String,
    /// Form upload endpoint.
    pub upload_url: String,
    /// Upload token lifetime in seconds (default: 3600 = 1 hour).
    pub token_ttl_secs: u64,
}

impl QiniuConfig {
    /// Default path template: `${year}/${month}/${name}${ext}`.
    pub const DEFAULT_FORMAT: &'static str = "${year}/${month}/${name}${ext}";
    /// Default form upload endpoint.
    pub const DEFAULT_UPLOAD_URL: &'static str = "https://upload.qiniup.com";
    /// Default upload token TTL: 1 hour.
    pub const DEFAULT_TOKEN_TTL: u64 = 3600;

    /// Create a new config with default template, endpoint and token TTL.
    #[must_use]
    pub fn new(
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
        bucket: impl Into<String>,
        domain: impl Into<String>,
    ) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            bucket: bucket.into(),
            domain: domain.into(),
            format: Self::DEFAULT_FORMAT.to_string(),
            upload_url: Self::DEFAULT_UPLOAD_URL.to_string(),
            token_ttl_secs: Self::DEFAULT_TOKEN_TTL,
        }
    }

    /// Set the path template.
    #[must_use]
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    /// Set the form upload endpoint.
    #[must_use]
    pub fn with_upload_url(mut self, upload_url: impl Into<String>) -> Self {
        self.upload_url = upload_url.into();
        self
    }

    /// Set the upload token TTL.
    #[must_use]
    pub fn with_token_ttl(mut self, secs: u64) -> Self {
        self.token_ttl_secs = secs;
        self
    }
}

impl From<StorageSettings> for QiniuConfig {
    fn from(settings: StorageSettings) -> Self {
        let mut config = Self::new(
            settings.access_key,
            settings.secret_key,
            settings.bucket,
            settings.domain,
        );
        if let Some(format) = settings.format {
            config = config.with_format(format);
        }
        if let Some(upload_url) = settings.upload_url {
            config = config.with_upload_url(upload_url);
        }
        if let Some(ttl) = settings.token_ttl_secs {
            config = config.with_token_ttl(ttl);
        }
        config
    }
}

impl std::fmt::Debug for QiniuConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QiniuConfig")
            .field("access_key", &self.access_key)
            .field("secret_key", &"[hidden]")
            .field("bucket", &self.bucket)
            .field("domain", &self.domain)
            .field("format", &self.format)
            .field("upload_url", &self.upload_url)
            .field("token_ttl_secs", &self.token_ttl_secs)
            .finish()
    }
}
