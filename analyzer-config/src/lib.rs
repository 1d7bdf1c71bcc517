//! Loader for page analyzer configuration with file + environment overlays.
//!
//! Sources are merged in the order they are added, with `PAGE_ANALYZER_`
//! environment variables applied last (`PAGE_ANALYZER_HTTP__TIMEOUT_SECS=30`
//! sets `http.timeout_secs`). `${VAR}` placeholders inside string values are
//! expanded after merging. Every section is optional.
//!
//! Environment values arrive as strings and stay strings, so a user agent of
//! `12345` or a version of `1.0` survives intact. Numeric and boolean fields
//! accept either a native value or its string form.
use analyzer_common::observability::LogFormat;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Deserializer, de};
use serde_json::Value;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;
const ENV_PREFIX: &str = "PAGE_ANALYZER";
const CONFIG_FILE_NAME: &str = "page-analyzer.yaml";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub version: Option<String>,
    pub http: HttpConfig,
    pub logging: LoggingConfig,
}

/// Transport settings for the page fetcher.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    #[serde(deserialize_with = "scalar_or_string")]
    pub timeout_secs: u64,
    #[serde(deserialize_with = "scalar_or_string")]
    pub connect_timeout_secs: u64,
    /// `None` keeps the client's built-in user agent.
    pub user_agent: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            connect_timeout_secs: 5,
            user_agent: None,
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub dir: Option<PathBuf>,
    pub format: LogFormat,
    #[serde(deserialize_with = "scalar_or_string")]
    pub emit_stderr: bool,
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: None,
            format: LogFormat::Text,
            emit_stderr: false,
            filter: "info".into(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ScalarOrString<T> {
    Scalar(T),
    Text(String),
}

fn scalar_or_string<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
    T::Err: Display,
{
    match ScalarOrString::<T>::deserialize(deserializer)? {
        ScalarOrString::Scalar(v) => Ok(v),
        ScalarOrString::Text(s) => s
            .trim()
            .parse()
            .map_err(|e| de::Error::custom(format!("invalid value {s:?}: {e}"))),
    }
}

/// `<config dir>/page-analyzer/page-analyzer.yaml`, e.g.
/// `~/.config/page-analyzer/page-analyzer.yaml` on Linux.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("page-analyzer").join(CONFIG_FILE_NAME))
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder over the `config` crate wiring.
pub struct AnalyzerConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
    env: Environment,
}

impl Default for AnalyzerConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalyzerConfigLoader {
    /// Start with no files; `PAGE_ANALYZER_` env overrides are always applied last.
    ///
    /// ```
    /// use analyzer_config::AnalyzerConfigLoader;
    ///
    /// let config = AnalyzerConfigLoader::new()
    ///     .with_yaml_str("version: '1'\nhttp:\n  timeout_secs: 3")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.version.as_deref(), Some("1"));
    /// assert_eq!(config.http.timeout_secs, 3);
    /// assert_eq!(config.http.connect_timeout_secs, 5);
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
            env: Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__"),
        }
    }

    /// Attach a YAML/TOML/JSON file that must exist; format is inferred by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that is skipped when missing.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Merge an inline YAML snippet (tests, CLI overrides).
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Merge all sources, expand `${VAR}` placeholders, and deserialize.
    ///
    /// ```
    /// use analyzer_config::AnalyzerConfigLoader;
    ///
    /// unsafe { std::env::set_var("ANALYZER_DOC_UA", "doc-agent/2"); }
    ///
    /// let config = AnalyzerConfigLoader::new()
    ///     .with_yaml_str(r#"
    /// http:
    ///   user_agent: "${ANALYZER_DOC_UA}"
    /// logging:
    ///   format: json
    /// "#)
    ///     .load()
    ///     .expect("valid configuration");
    ///
    /// assert_eq!(config.http.user_agent.as_deref(), Some("doc-agent/2"));
    /// assert!(!config.logging.emit_stderr);
    ///
    /// unsafe { std::env::remove_var("ANALYZER_DOC_UA"); }
    /// ```
    pub fn load(self) -> Result<AnalyzerConfig, ConfigError> {
        let cfg = self.builder.add_source(self.env).build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))
    }
}
