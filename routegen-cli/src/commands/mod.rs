//! CLI command implementations.

pub mod check;
pub mod routes;

use std::path::{Path, PathBuf};

use routegen::project::ProjectRoot;
use routegen::registry::{StaticRegistry, SymbolEntry};
use routegen::source::SourceFile;
use routegen::{Config, Engine};
use serde::Deserialize;

/// Flags shared by every command.
pub struct Options {
    pub config: PathBuf,
    pub api_root: Option<PathBuf>,
    pub package_prefix: Option<String>,
    /// Directory generated code goes to; the project root is searched from here.
    pub output: PathBuf,
}

/// What a scanner writes out: the scanned files and the symbols they use.
#[derive(Debug, Deserialize)]
pub struct Manifest {
    pub files: Vec<SourceFile>,
    #[serde(default)]
    pub registry: Vec<SymbolEntry>,
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse {}: {}", path.display(), e))
    }
}

/// Load `routegen.toml` if present, then apply command-line overrides.
pub fn load_config(options: &Options) -> Result<Config, String> {
    let mut config = if options.config.exists() {
        let content = std::fs::read_to_string(&options.config)
            .map_err(|e| format!("Failed to read {}: {}", options.config.display(), e))?;
        toml::from_str(&content)
            .map_err(|e| format!("Failed to parse {}: {}", options.config.display(), e))?
    } else {
        tracing::debug!(path = %options.config.display(), "no configuration file, using defaults");
        Config::default()
    };

    if let Some(api_root) = &options.api_root {
        config.api_root = api_root.clone();
    }
    if let Some(prefix) = &options.package_prefix {
        config.generated_package_prefix = Some(prefix.clone());
    }
    if config.generated_package_prefix.is_none() {
        config.generated_package_prefix = Some(project_package_prefix(&config, &options.output)?);
    }
    Ok(config)
}

/// Derive the generated-code import path from the project enclosing `output`.
fn project_package_prefix(config: &Config, output: &Path) -> Result<String, String> {
    let project =
        ProjectRoot::discover(output, &config.project_manifest).map_err(|e| e.to_string())?;
    let prefix = project
        .generated_package(output, &config.api_root)
        .map_err(|e| e.to_string())?;
    tracing::debug!(root = %project.dir.display(), %prefix, "derived package prefix from project");
    Ok(prefix)
}

/// Load the manifest and build an engine around its registry.
pub fn prepare(options: &Options, manifest: &Path) -> Result<(Engine<StaticRegistry>, Vec<SourceFile>), String> {
    let config = load_config(options)?;
    let manifest = Manifest::load(manifest)?;
    tracing::debug!(
        files = manifest.files.len(),
        symbols = manifest.registry.len(),
        api_root = %config.api_root.display(),
        "manifest loaded"
    );
    let registry = StaticRegistry::from_entries(manifest.registry);
    Ok((Engine::new(config, registry), manifest.files))
}

#[cfg(test)]
mod tests {
    use super::*;
    use routegen::prelude::Method;

    #[test]
    fn test_manifest_parses_files_and_registry() {
        let json = r#"{
            "files": [{
                "path": "api/v1/todos.go",
                "package": {"name": "v1", "path": "example.com/api/v1"},
                "handlers": [{
                    "package": {"name": "v1", "path": "example.com/api/v1"},
                    "name": "List",
                    "position": {"file": "api/v1/todos.go", "line": 4}
                }]
            }],
            "registry": [
                {"qualifier": "http", "name": "MethodPost", "kind": "constant", "value": "POST"}
            ]
        }"#;
        let manifest: Manifest = serde_json::from_str(json).unwrap();
        assert_eq!(manifest.files.len(), 1);
        assert_eq!(manifest.registry.len(), 1);
    }

    #[test]
    fn test_config_overrides() {
        let options = Options {
            config: PathBuf::from("does-not-exist.toml"),
            api_root: Some(PathBuf::from("src/api")),
            package_prefix: Some("example.com/gen".into()),
            output: PathBuf::from("."),
        };
        let config = load_config(&options).unwrap();
        assert_eq!(config.api_root, PathBuf::from("src/api"));
        assert_eq!(config.generated_package_prefix.as_deref(), Some("example.com/gen"));
        assert_eq!(config.middleware_file, "middleware.go");
    }

    #[test]
    fn test_package_prefix_from_enclosing_project() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::write(temp.path().join("go.mod"), "module example.com/todo\n").unwrap();
        let output = temp.path().join("internal/gen");
        std::fs::create_dir_all(&output).unwrap();

        let options = Options {
            config: temp.path().join("routegen.toml"),
            api_root: Some(PathBuf::from("app/api")),
            package_prefix: None,
            output,
        };
        let config = load_config(&options).unwrap();
        assert_eq!(
            config.generated_package_prefix.as_deref(),
            Some("example.com/todo/internal/gen/api")
        );
    }

    #[test]
    fn test_missing_project_root_aborts() {
        let temp = tempfile::tempdir().unwrap();
        let config = temp.path().join("routegen.toml");
        std::fs::write(&config, "project_manifest = \"routegen-no-such.mod\"\n").unwrap();

        let options = Options {
            config,
            api_root: None,
            package_prefix: None,
            output: temp.path().to_path_buf(),
        };
        let err = load_config(&options).unwrap_err();
        assert!(err.contains("routegen-no-such.mod not found"), "{err}");
    }

    #[test]
    fn test_config_from_toml() {
        let config: Config = toml::from_str(
            r#"
api_root = "app/api"
removal_suffix = "!"
"#,
        )
        .unwrap();
        assert_eq!(config.api_root, PathBuf::from("app/api"));
        assert_eq!(config.removal_suffix, '!');
    }

    #[test]
    fn test_demo_manifest_resolves() {
        let demo = Path::new(env!("CARGO_MANIFEST_DIR")).join("../demos/todo-api");
        let options = Options {
            config: demo.join("routegen.toml"),
            api_root: None,
            package_prefix: None,
            output: PathBuf::from("."),
        };
        let (engine, files) = prepare(&options, &demo.join("manifest.json")).unwrap();
        let table = engine.build(&files).unwrap();

        assert_eq!(table.len(), 3);
        let get = |pattern: &str, method: Method| table.get(pattern, &method).unwrap();
        assert_eq!(get("/v1/todos", Method::GET).middleware, vec!["recover"]);
        assert_eq!(get("/v1/todos", Method::POST).status.as_u16(), 201);
        let by_id = get("/v1/todos/{id}", Method::GET);
        assert_eq!(by_id.middleware, vec!["recover", "log", "auth"]);
        assert_eq!(
            by_id.generated_package.as_deref(),
            Some("example.com/todo/gen/api/v1/todos")
        );
    }
}
