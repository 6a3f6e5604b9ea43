use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Index document served for directory requests when the CLI is not told otherwise.
pub const DEFAULT_INDEX_DOCUMENT: &str = "index.html";
/// Error document served on 4xx when the CLI is not told otherwise.
pub const DEFAULT_ERROR_DOCUMENT: &str = "error.html";

/// Connection settings for the storage backend, built once per invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Named credentials profile; `None` uses the default provider chain.
    #[serde(default)]
    pub profile: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    /// Custom S3-compatible endpoint (LocalStack, MinIO).
    #[serde(default)]
    pub endpoint_url: Option<String>,
}

impl ClientConfig {
    pub fn trace_loaded(&self) {
        info!(
            profile = self.profile.as_deref().unwrap_or("<default>"),
            region = self.region.as_deref().unwrap_or("<default>"),
            custom_endpoint = self.endpoint_url.is_some(),
            "Loaded ClientConfig"
        );
        debug!(?self, "ClientConfig loaded (full debug)");
    }
}

/// Static website hosting settings applied to a bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebsiteConfig {
    #[serde(default = "default_index_document")]
    pub index_document: String,
    #[serde(default = "default_error_document")]
    pub error_document: String,
}

fn default_index_document() -> String {
    DEFAULT_INDEX_DOCUMENT.to_string()
}

fn default_error_document() -> String {
    DEFAULT_ERROR_DOCUMENT.to_string()
}

impl Default for WebsiteConfig {
    fn default() -> Self {
        Self {
            index_document: default_index_document(),
            error_document: default_error_document(),
        }
    }
}

impl WebsiteConfig {
    pub fn trace_loaded(&self) {
        info!(
            index_document = %self.index_document,
            error_document = %self.error_document,
            "Loaded WebsiteConfig"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn website_config_defaults_to_index_and_error_html() {
        let website = WebsiteConfig::default();
        assert_eq!(website.index_document, "index.html");
        assert_eq!(website.error_document, "error.html");
    }

    #[test]
    fn website_config_fills_missing_keys_from_defaults() {
        let website: WebsiteConfig =
            serde_json::from_str(r#"{"error_document": "404.html"}"#).unwrap();
        assert_eq!(website.index_document, "index.html");
        assert_eq!(website.error_document, "404.html");
    }
}
