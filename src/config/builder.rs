use std::collections::BTreeMap;
use std::path::Path;

use super::env::remap;
use super::file::FileSource;
use super::key::Key;
use super::store::Config;
use super::value::{Attribute, Attributes, Value};
use super::ConfigError;

/// Builder for a [`Config`] from documents and an environment snapshot.
///
/// Documents are merged in registration order, with later files overriding
/// earlier ones. Nested tables are merged recursively; leaf values are
/// replaced.
///
/// Environment variables are never read implicitly. Pass a snapshot with
/// [`with_env`](Self::with_env); recognized `SK_*` variables become priority
/// overrides that win over every document.
///
/// ## Example
///
/// ```no_run
/// use skylight_config::Config;
///
/// let config = Config::builder()
///     .with_file("config/skylight.yml", true)
///     .with_file("config/skylight.local.yml", false)
///     .with_environment("production")
///     .with_env(std::env::vars())
///     .build()?;
///
/// let interval = config.get("agent.interval");
/// # Ok::<(), skylight_config::ConfigError>(())
/// ```
#[derive(Debug, Default)]
#[must_use = "builders do nothing until .build() is called"]
pub struct ConfigBuilder {
    files: Vec<FileSource>,
    environment: Option<String>,
    overrides: BTreeMap<Key, Value>,
}

impl ConfigBuilder {
    /// Adds a TOML or YAML document to be loaded.
    ///
    /// If `required` is `true`, the build will fail if the file doesn't exist.
    /// Optional files that are missing are skipped.
    pub fn with_file(mut self, path: impl AsRef<Path>, required: bool) -> Self {
        self.files.push(FileSource::new(path, required));
        self
    }

    /// Activates scope promotion for the named deployment environment.
    pub fn with_environment(mut self, name: impl Into<String>) -> Self {
        self.environment = Some(name.into());
        self
    }

    /// Remaps an environment snapshot into priority overrides.
    ///
    /// Unrecognized names are ignored. Repeated calls merge, later values win.
    pub fn with_env<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.overrides.extend(remap(vars));
        self
    }

    /// Loads and merges all documents, then builds the store.
    ///
    /// Any document failure aborts the build; nothing is partially loaded.
    pub fn build(self) -> Result<Config, ConfigError> {
        let mut merged = Attributes::new();

        for file in &self.files {
            if let Some(attributes) = file.load()? {
                deep_merge(&mut merged, attributes);
            }
        }

        Config::new(self.environment.as_deref(), merged, self.overrides)
    }
}

/// Loads a store from an optional required document and an optional
/// environment snapshot.
pub fn load<I, K, V>(
    path: Option<&Path>,
    environment: Option<&str>,
    vars: Option<I>,
) -> Result<Config, ConfigError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut builder = Config::builder();
    if let Some(path) = path {
        builder = builder.with_file(path, true);
    }
    if let Some(environment) = environment {
        builder = builder.with_environment(environment);
    }
    if let Some(vars) = vars {
        builder = builder.with_env(vars);
    }
    builder.build()
}

/// Builds a store from an environment snapshot alone.
pub fn load_from_env<I, K, V>(vars: I) -> Config
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    Config::from_env_overrides(remap(vars))
}

fn deep_merge(base: &mut Attributes, overlay: Attributes) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(Attribute::Table(base_table)), Attribute::Table(overlay_table)) => {
                deep_merge(base_table, overlay_table);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{Builder, NamedTempFile};

    fn temp_file(suffix: &str, contents: &str) -> NamedTempFile {
        let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
        write!(file, "{contents}").unwrap();
        file
    }

    const NO_ENV: Option<[(&str, &str); 0]> = None;

    #[test]
    fn test_build_empty() {
        let config = Config::builder().build().unwrap();
        assert_eq!(config.get("agent.keepalive"), Value::Integer(60));
        assert!(config.to_env().is_empty());
    }

    #[test]
    fn test_later_files_override_earlier() {
        let base = temp_file(
            ".toml",
            "[report]\nhost = \"base.example\"\nport = 80\n",
        );
        let local = temp_file(".yml", "report:\n  port: 8080\n");

        let config = Config::builder()
            .with_file(base.path(), true)
            .with_file(local.path(), true)
            .build()
            .unwrap();

        assert_eq!(config.get("report.host"), Value::from("base.example"));
        assert_eq!(config.get("report.port"), Value::Integer(8080));
    }

    #[test]
    fn test_optional_missing_file_is_skipped() {
        let config = Config::builder()
            .with_file("/nonexistent/skylight.yml", false)
            .build()
            .unwrap();
        assert_eq!(config.get("report.port"), Value::Integer(443));
    }

    #[test]
    fn test_env_overrides_documents() {
        let doc = temp_file(".yml", "agent:\n  interval: 20\n");
        let config = Config::builder()
            .with_env([("SK_AGENT_INTERVAL", "30")])
            .with_file(doc.path(), true)
            .build()
            .unwrap();
        assert_eq!(config.get("agent.interval"), Value::Integer(30));
    }

    #[test]
    fn test_repeated_env_calls_merge() {
        let config = Config::builder()
            .with_env([("SK_REPORT_PORT", "1"), ("SK_REPORT_HOST", "h")])
            .with_env([("SK_REPORT_PORT", "2")])
            .build()
            .unwrap();
        assert_eq!(config.get("report.port"), Value::Integer(2));
        assert_eq!(config.get("report.host"), Value::from("h"));
    }

    #[test]
    fn test_load_with_environment() {
        let doc = temp_file(
            ".yml",
            "application: app\nproduction:\n  agent:\n    interval: 15\nstaging:\n  agent:\n    interval: 25\n",
        );

        let config = load(Some(doc.path()), Some("production"), NO_ENV).unwrap();

        assert_eq!(config.environment(), Some("production"));
        assert_eq!(config.get("application"), Value::from("app"));
        assert_eq!(config.get("agent.interval"), Value::Integer(15));
        assert_eq!(config.get("staging.agent.interval"), Value::Integer(25));
    }

    #[test]
    fn test_load_missing_document_fails() {
        let result = load(Some(Path::new("/nonexistent/skylight.yml")), None, NO_ENV);
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_malformed_document_fails() {
        let doc = temp_file(".yml", "agent: [unclosed\n");
        let result = load(Some(doc.path()), None, Some([("SK_REPORT_PORT", "1")]));
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn test_load_from_env() {
        let config = load_from_env([
            ("SK_APPLICATION", "app"),
            ("SK_REPORT_SSL", "false"),
            ("HOME", "/root"),
        ]);
        assert_eq!(config.get("application"), Value::from("app"));
        assert_eq!(config.get("report.ssl"), Value::Boolean(false));
        assert_eq!(config.environment(), None);
    }

    #[test]
    fn test_deep_merge_replaces_scalars_with_tables() {
        let mut base: Attributes = toml::from_str("agent = 1\n[report]\nhost = \"a\"").unwrap();
        let overlay: Attributes =
            toml::from_str("[agent]\ninterval = 2\n[report]\nport = 3").unwrap();

        deep_merge(&mut base, overlay);

        let expected: Attributes =
            toml::from_str("[agent]\ninterval = 2\n[report]\nhost = \"a\"\nport = 3").unwrap();
        assert_eq!(base, expected);
    }
}
