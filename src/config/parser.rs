//! Definition loader.
//!
//! Definition files are concatenated, `${NAME}` placeholders are substituted
//! from explicit bindings first and the process environment second, and the
//! result is parsed as a single YAML document.

use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{ConfigError, Result, SyncError};

use super::spec::Definition;

const PLACEHOLDER_PATTERN: &str = r"\$\{([^}]+)\}";

/// Loads definition documents.
#[derive(Debug, Default)]
pub struct DefinitionParser {
    /// Base path for resolving `.env`.
    base_path: Option<PathBuf>,
    /// Explicit placeholder bindings.
    bindings: BTreeMap<String, String>,
}

impl DefinitionParser {
    /// Creates a new parser without bindings.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            base_path: None,
            bindings: BTreeMap::new(),
        }
    }

    /// Sets the base path for resolving `.env`.
    #[must_use]
    pub fn with_base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    /// Adds placeholder bindings. Later bindings win.
    #[must_use]
    pub fn with_bindings(mut self, bindings: impl IntoIterator<Item = (String, String)>) -> Self {
        self.bindings.extend(bindings);
        self
    }

    /// Loads and merges one or more definition files.
    ///
    /// # Errors
    ///
    /// Returns an error if a file is missing or unreadable, a placeholder is
    /// unbound, or the merged YAML is invalid.
    pub fn load_files<P: AsRef<Path>>(&self, paths: &[P]) -> Result<Definition> {
        let mut sources = Vec::with_capacity(paths.len());
        for path in paths {
            let path = path.as_ref();
            info!("Loading definition from: {}", path.display());

            if !path.exists() {
                return Err(ConfigError::FileNotFound {
                    path: path.to_path_buf(),
                }
                .into());
            }

            let content = std::fs::read_to_string(path).map_err(|e| {
                SyncError::Config(ConfigError::ParseError {
                    message: format!("Failed to read file: {e}"),
                    location: Some(path.display().to_string()),
                })
            })?;
            sources.push(content);
        }

        let rendered = self.render(&sources.join("\n"))?;
        self.parse_yaml(&rendered, paths.first().map(AsRef::as_ref))
    }

    /// Substitutes placeholders using the bindings and the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first placeholder with no value.
    pub fn render(&self, content: &str) -> Result<String> {
        self.render_with(content, |name| std::env::var(name).ok())
    }

    /// Substitutes placeholders using the bindings and a custom lookup.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first placeholder with no value.
    pub fn render_with(
        &self,
        content: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<String> {
        let placeholder = Regex::new(PLACEHOLDER_PATTERN)
            .map_err(|e| SyncError::internal(format!("Failed to compile regex: {e}")))?;
        let mut rendered = String::with_capacity(content.len());
        let mut last = 0;

        for caps in placeholder.captures_iter(content) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            let value = self.resolve(&caps, &lookup)?;
            rendered.push_str(&content[last..whole.start()]);
            rendered.push_str(&value);
            last = whole.end();
        }
        rendered.push_str(&content[last..]);

        Ok(rendered)
    }

    fn resolve(
        &self,
        caps: &Captures<'_>,
        lookup: &impl Fn(&str) -> Option<String>,
    ) -> Result<String> {
        let name = &caps[1];
        if let Some(value) = self.bindings.get(name) {
            debug!("Binding {name} from explicit bindings");
            return Ok(value.clone());
        }
        lookup(name).ok_or_else(|| {
            ConfigError::UnboundVariable {
                name: name.to_string(),
            }
            .into()
        })
    }

    /// Parses a definition from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid.
    pub fn parse_yaml(&self, content: &str, source: Option<&Path>) -> Result<Definition> {
        debug!("Parsing YAML definition");

        let definition: Definition = serde_yaml::from_str(content).map_err(|e| {
            let location = source.map(|p| p.display().to_string());
            SyncError::Config(ConfigError::ParseError {
                message: format!("YAML parse error: {e}"),
                location,
            })
        })?;

        debug!(
            "Parsed definition with {} resources, {} authorizers, {} alarms",
            definition.resources.len(),
            definition.authorizers.len(),
            definition.alarms.len()
        );
        Ok(definition)
    }

    /// Loads the .env file if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the .env file exists but cannot be loaded.
    pub fn load_dotenv(&self) -> Result<()> {
        let env_path = self
            .base_path
            .as_ref()
            .map_or_else(|| PathBuf::from(".env"), |p| p.join(".env"));

        if env_path.exists() {
            info!("Loading environment from: {}", env_path.display());
            dotenvy::from_path(&env_path).map_err(|e| {
                SyncError::Config(ConfigError::ParseError {
                    message: format!("Failed to load .env file: {e}"),
                    location: Some(env_path.display().to_string()),
                })
            })?;
        } else {
            debug!(".env file not found at: {}", env_path.display());
        }

        Ok(())
    }
}

/// Splits a `KEY=VALUE` argument.
///
/// # Errors
///
/// Returns an error if there is no `=` or the key is empty.
pub fn parse_key_value(input: &str) -> std::result::Result<(String, String), ConfigError> {
    match input.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(ConfigError::InvalidKeyValue {
            input: input.to_string(),
        }),
    }
}

/// Default definition file names to search for.
pub const DEFAULT_DEFINITION_FILES: &[&str] = &["apigw.yaml", "apigw.yml", "api.yaml", "api.yml"];

/// Finds a definition file in the given directory or its parents.
///
/// # Errors
///
/// Returns an error if no definition file is found.
pub fn find_definition_file(start_dir: impl AsRef<Path>) -> Result<PathBuf> {
    let start = start_dir.as_ref();
    let mut current = start.to_path_buf();

    loop {
        for filename in DEFAULT_DEFINITION_FILES {
            let candidate = current.join(filename);
            if candidate.exists() {
                info!("Found definition file: {}", candidate.display());
                return Ok(candidate);
            }
        }

        if !current.pop() {
            break;
        }
    }

    Err(ConfigError::FileNotFound {
        path: start.join(DEFAULT_DEFINITION_FILES[0]),
    }
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_minimal_definition() {
        let yaml = r"
resources:
  - path: /users
    description: users
    methods:
      GET:
        integrationType: http
        url: http://backend/users
";
        let definition = DefinitionParser::new()
            .parse_yaml(yaml, None)
            .expect("valid definition");
        assert_eq!(definition.resources.len(), 1);
        let get = &definition.resources[0].methods["GET"];
        assert_eq!(get.integration_type.as_deref(), Some("http"));
        assert_eq!(get.url.as_deref(), Some("http://backend/users"));
    }

    #[test]
    fn test_bindings_win_over_environment() {
        let parser = DefinitionParser::new()
            .with_bindings([(String::from("HOST"), String::from("bound.example.com"))]);
        let rendered = parser
            .render_with("url: http://${HOST}/${PORT_NAME}", |name| {
                (name == "HOST" || name == "PORT_NAME").then(|| format!("env-{name}"))
            })
            .expect("all bound");
        assert_eq!(rendered, "url: http://bound.example.com/env-PORT_NAME");
    }

    #[test]
    fn test_unbound_placeholder() {
        let err = DefinitionParser::new()
            .render_with("function: ${MISSING}", |_| None)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Configuration error: Binding name MISSING is not defined"
        );
    }

    #[test]
    fn test_load_multiple_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let first = dir.path().join("resources.yaml");
        let second = dir.path().join("alarms.yaml");
        let mut file = std::fs::File::create(&first).expect("create");
        writeln!(
            file,
            "resources:\n  - path: /${{NAME}}\n    description: d\n    methods: {{}}"
        )
        .expect("write");
        std::fs::write(&second, "alarms:\n  5XXError:\n    threshold: 1\n    alarm: [topic]\n")
            .expect("write");

        let definition = DefinitionParser::new()
            .with_bindings([(String::from("NAME"), String::from("orders"))])
            .load_files(&[first, second])
            .expect("loads");
        assert_eq!(definition.resources[0].path, "/orders");
        assert!(definition.alarms.contains_key("5XXError"));
    }

    #[test]
    fn test_missing_file() {
        let err = DefinitionParser::new()
            .load_files(&["/nonexistent/apigw.yaml"])
            .unwrap_err();
        assert!(matches!(err, SyncError::Config(ConfigError::FileNotFound { .. })));
    }

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("environment=prod").expect("valid"),
            (String::from("environment"), String::from("prod"))
        );
        assert_eq!(
            parse_key_value("url=http://a?b=c").expect("valid").1,
            "http://a?b=c"
        );
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=x").is_err());
    }
}
