//! Engine configuration.
//!
//! All fields have defaults matching the conventional project layout, so
//! `Config::default()` is enough for most trees:
//!
//! ```
//! use routegen::config::Config;
//!
//! let config = Config::new("api");
//! assert_eq!(config.middleware_file, "middleware.go");
//! assert_eq!(config.removal_suffix, '-');
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::binding::{Location, MarkerType};

const DEFAULT_MIDDLEWARE_FILE: &str = "middleware.go";
const DEFAULT_REMOVAL_SUFFIX: char = '-';
const DEFAULT_PROJECT_MANIFEST: &str = "go.mod";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory URL patterns are derived relative to.
    pub api_root: PathBuf,
    /// File name whose directives declare directory-wide middleware.
    pub middleware_file: String,
    /// Suffix marking a middleware token as a removal (default: `-`).
    pub removal_suffix: char,
    /// Parameter types that are passed through instead of decoded.
    pub markers: Vec<MarkerType>,
    /// File marking the project root when computing generated packages.
    pub project_manifest: String,
    /// Import-path prefix of generated code, if the caller wants it recorded.
    pub generated_package_prefix: Option<String>,
}

impl Config {
    pub fn new(api_root: impl Into<PathBuf>) -> Self {
        Self {
            api_root: api_root.into(),
            ..Self::default()
        }
    }

    pub fn generated_package_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.generated_package_prefix = Some(prefix.into());
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_root: PathBuf::new(),
            middleware_file: DEFAULT_MIDDLEWARE_FILE.to_string(),
            removal_suffix: DEFAULT_REMOVAL_SUFFIX,
            markers: default_markers(),
            project_manifest: DEFAULT_PROJECT_MANIFEST.to_string(),
            generated_package_prefix: None,
        }
    }
}

/// Host context, request and response writer.
pub fn default_markers() -> Vec<MarkerType> {
    vec![
        MarkerType::new("context", "Context", Location::Context),
        MarkerType::new("net/http", "Request", Location::None),
        MarkerType::new("net/http", "ResponseWriter", Location::None),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.markers.len(), 3);
        assert_eq!(config.project_manifest, "go.mod");
        assert!(config.generated_package_prefix.is_none());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"api_root": "src/api", "removal_suffix": "!"}"#).unwrap();
        assert_eq!(config.api_root, PathBuf::from("src/api"));
        assert_eq!(config.removal_suffix, '!');
        assert_eq!(config.middleware_file, "middleware.go");
    }
}
