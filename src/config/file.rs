//! File-based configuration documents.

use std::path::{Path, PathBuf};

use tracing::debug;

use super::error::DocumentError;
use super::value::{Attribute, Attributes};
use super::ConfigError;

/// Supported document formats, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Toml,
    Yaml,
}

impl DocumentFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "toml" => Some(Self::Toml),
            "yml" | "yaml" => Some(Self::Yaml),
            _ => None,
        }
    }

    /// Parses `contents` into nested attributes.
    ///
    /// Only tables and the scalar shapes of [`Value`](super::value::Value) are
    /// accepted; arrays, datetimes, non-string keys and integers outside `i64`
    /// fail.
    pub fn parse(self, contents: &str) -> Result<Attributes, DocumentError> {
        let root: Attribute = match self {
            Self::Toml => toml::from_str(contents)?,
            // An empty YAML document is an empty mapping, not an error.
            Self::Yaml if contents.trim().is_empty() => return Ok(Attributes::new()),
            Self::Yaml => serde_yaml::from_str(contents)?,
        };
        match root {
            Attribute::Table(table) => Ok(table),
            Attribute::Scalar(_) => Err(DocumentError::NotATable),
        }
    }
}

/// A configuration document on disk.
///
/// Files can be marked as required or optional. Required files that don't exist
/// cause an error; optional files that don't exist are skipped.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    required: bool,
}

impl FileSource {
    /// Creates a new file source.
    ///
    /// If `required` is true, loading fails if the file doesn't exist.
    pub fn new(path: impl AsRef<Path>, required: bool) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            required,
        }
    }

    /// Loads and parses the document.
    ///
    /// Returns `Ok(None)` if the file doesn't exist and is optional.
    pub fn load(&self) -> Result<Option<Attributes>, ConfigError> {
        let format = DocumentFormat::from_path(&self.path)
            .ok_or_else(|| ConfigError::UnsupportedFormat(self.path.clone()))?;

        match std::fs::read_to_string(&self.path) {
            Ok(contents) => {
                let attributes = format.parse(&contents).map_err(|source| {
                    ConfigError::ParseError {
                        path: self.path.clone(),
                        source,
                    }
                })?;
                debug!(path = %self.path.display(), ?format, "loaded config document");
                Ok(Some(attributes))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                if self.required {
                    Err(ConfigError::FileNotFound(self.path.clone()))
                } else {
                    debug!(path = %self.path.display(), "optional config document not found, skipping");
                    Ok(None)
                }
            }
            Err(e) => Err(ConfigError::ReadError {
                path: self.path.clone(),
                source: e,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::value::Value;
    use std::io::Write;
    use tempfile::Builder;

    fn temp_file(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
        write!(file, "{contents}").unwrap();
        file
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(DocumentFormat::from_path(Path::new("a.toml")), Some(DocumentFormat::Toml));
        assert_eq!(DocumentFormat::from_path(Path::new("a.yml")), Some(DocumentFormat::Yaml));
        assert_eq!(DocumentFormat::from_path(Path::new("a.yaml")), Some(DocumentFormat::Yaml));
        assert_eq!(DocumentFormat::from_path(Path::new("a.json")), None);
        assert_eq!(DocumentFormat::from_path(Path::new("config")), None);
    }

    #[test]
    fn test_loads_toml_file() {
        let file = temp_file(".toml", "application = \"app\"\n[agent]\ninterval = 10\n");
        let attributes = FileSource::new(file.path(), true).load().unwrap().unwrap();

        assert_eq!(attributes["application"], Attribute::Scalar("app".into()));
        let agent = attributes["agent"].as_table().unwrap();
        assert_eq!(agent["interval"], Attribute::Scalar(Value::Integer(10)));
    }

    #[test]
    fn test_loads_yaml_file() {
        let file = temp_file(
            ".yml",
            "authentication: abc123\nproduction:\n  report:\n    ssl: false\n",
        );
        let attributes = FileSource::new(file.path(), true).load().unwrap().unwrap();

        assert_eq!(attributes["authentication"], Attribute::Scalar("abc123".into()));
        let report = attributes["production"].as_table().unwrap()["report"]
            .as_table()
            .unwrap();
        assert_eq!(report["ssl"], Attribute::Scalar(Value::Boolean(false)));
    }

    #[test]
    fn test_empty_yaml_file() {
        let file = temp_file(".yaml", "");
        let attributes = FileSource::new(file.path(), true).load().unwrap().unwrap();
        assert!(attributes.is_empty());
    }

    #[test]
    fn test_required_missing() {
        let result = FileSource::new("/nonexistent/path/config.yml", true).load();
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_optional_missing() {
        let result = FileSource::new("/nonexistent/path/config.yml", false).load();
        assert!(matches!(result, Ok(None)));
    }

    #[test]
    fn test_malformed_document() {
        let file = temp_file(".toml", "agent = [unclosed");
        let result = FileSource::new(file.path(), true).load();
        assert!(matches!(
            result,
            Err(ConfigError::ParseError { source: DocumentError::Toml(_), .. })
        ));
    }

    #[test]
    fn test_arrays_are_rejected() {
        let file = temp_file(".yml", "hosts:\n  - a\n  - b\n");
        let result = FileSource::new(file.path(), true).load();
        assert!(matches!(
            result,
            Err(ConfigError::ParseError { source: DocumentError::Yaml(_), .. })
        ));
    }

    #[test]
    fn test_datetimes_are_rejected() {
        for contents in [
            "started = 1979-05-27T07:32:00Z\n",
            "[agent]\nstarted = 1979-05-27T07:32:00Z\n",
        ] {
            let file = temp_file(".toml", contents);
            let result = FileSource::new(file.path(), true).load();
            assert!(matches!(
                result,
                Err(ConfigError::ParseError { source: DocumentError::Toml(_), .. })
            ));
        }
    }

    #[test]
    fn test_integer_beyond_i64_is_rejected() {
        let file = temp_file(".yml", "report:\n  port: 18446744073709551615\n");
        let result = FileSource::new(file.path(), true).load();
        assert!(matches!(
            result,
            Err(ConfigError::ParseError { source: DocumentError::Yaml(_), .. })
        ));
    }

    #[test]
    fn test_non_string_keys_are_rejected() {
        let file = temp_file(".yml", "agent:\n  1: one\n");
        let result = FileSource::new(file.path(), true).load();
        assert!(matches!(
            result,
            Err(ConfigError::ParseError { source: DocumentError::Yaml(_), .. })
        ));
    }

    #[test]
    fn test_scalar_root_is_rejected() {
        let file = temp_file(".yml", "just a string\n");
        let result = FileSource::new(file.path(), true).load();
        assert!(matches!(
            result,
            Err(ConfigError::ParseError { source: DocumentError::NotATable, .. })
        ));
    }

    #[test]
    fn test_unreadable_path() {
        let dir = Builder::new().suffix(".toml").tempdir().unwrap();
        let result = FileSource::new(dir.path(), true).load();
        assert!(matches!(result, Err(ConfigError::ReadError { .. })));
    }

    #[test]
    fn test_unsupported_format() {
        let result = FileSource::new("/tmp/config.json", false).load();
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }
}
