use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

const APP_DIR_NAME: &str = ".llm-shell";
const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmType {
    Llama,
    Gpt,
}

impl LlmType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Llama => "llama",
            Self::Gpt => "GPT",
        }
    }
}

impl fmt::Display for LlmType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LlmType {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "llama" => Ok(Self::Llama),
            "gpt" => Ok(Self::Gpt),
            _ => Err(anyhow!(
                "Unsupported llm_type '{}'. Supported types: llama, GPT.",
                raw
            )),
        }
    }
}

/// Settings read from the process environment rather than the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeOptions {
    pub log_execution_time: bool,
    pub app_dir: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
}

impl RuntimeOptions {
    pub fn from_env() -> Self {
        Self::from_env_with(|key| env::var(key).ok())
    }

    fn from_env_with(mut get_var: impl FnMut(&str) -> Option<String>) -> Self {
        Self {
            log_execution_time: is_truthy(get_var("LOG_EXECUTION_TIME").as_deref()),
            app_dir: parse_app_dir(get_var("LLM_SHELL_HOME").as_deref()),
            timeout_secs: parse_timeout_secs(get_var("LLM_SHELL_TIMEOUT_SECS").as_deref()),
        }
    }
}

fn is_truthy(raw: Option<&str>) -> bool {
    raw.map(str::trim)
        .is_some_and(|value| value.eq_ignore_ascii_case("true"))
}

fn parse_app_dir(raw: Option<&str>) -> Option<PathBuf> {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

fn parse_timeout_secs(raw: Option<&str>) -> Option<u64> {
    raw.and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|value| *value > 0)
}

/// Resolves the application directory, preferring an explicit override.
pub fn app_dir(options: &RuntimeOptions) -> Result<PathBuf> {
    if let Some(dir) = &options.app_dir {
        return Ok(dir.clone());
    }
    dirs_next::home_dir()
        .map(|home| home.join(APP_DIR_NAME))
        .ok_or_else(|| anyhow!("Could not determine the home directory. Set LLM_SHELL_HOME."))
}

/// The record persisted in `config.json`. Every field is optional on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insecure_skip_verify: Option<bool>,
}

/// Values supplied on the command line that replace persisted ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub api_key: Option<String>,
    pub endpoint_url: Option<String>,
    pub llm_type: Option<LlmType>,
    pub insecure_skip_verify: Option<bool>,
}

impl ConfigOverrides {
    pub fn is_empty(&self) -> bool {
        self.api_key.is_none()
            && self.endpoint_url.is_none()
            && self.llm_type.is_none()
            && self.insecure_skip_verify.is_none()
    }
}

impl StoredConfig {
    fn merge(&mut self, overrides: &ConfigOverrides) {
        if let Some(api_key) = &overrides.api_key {
            self.api_key = Some(api_key.clone());
        }
        if let Some(endpoint_url) = &overrides.endpoint_url {
            self.endpoint_url = Some(endpoint_url.clone());
        }
        if let Some(llm_type) = overrides.llm_type {
            self.llm_type = Some(llm_type.as_str().to_string());
        }
        if let Some(insecure) = overrides.insecure_skip_verify {
            self.insecure_skip_verify = Some(insecure);
        }
    }

    /// Checks that every field needed for a request is present.
    pub fn resolve(&self) -> Result<Settings> {
        let api_key = required_field(self.api_key.as_deref(), "api_key", "An API key")?;
        let endpoint_url =
            required_field(self.endpoint_url.as_deref(), "endpoint_url", "An endpoint url")?;
        let llm_type = required_field(self.llm_type.as_deref(), "llm_type", "An LLM type")?
            .parse::<LlmType>()?;

        Ok(Settings {
            api_key,
            endpoint_url,
            llm_type,
            insecure_skip_verify: self.insecure_skip_verify.unwrap_or(false),
        })
    }
}

fn required_field(value: Option<&str>, field: &str, description: &str) -> Result<String> {
    match value.map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => Ok(value.to_string()),
        None => bail!(
            "Missing required setting '{field}'. {description} should be provided to invoke the \
             endpoint. Pass it once with --{field} and it will be saved in config.json."
        ),
    }
}

/// Fully validated connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_key: String,
    pub endpoint_url: String,
    pub llm_type: LlmType,
    pub insecure_skip_verify: bool,
}

#[derive(Debug, Clone)]
pub struct ConfigStore {
    dir: PathBuf,
}

impl ConfigStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(CONFIG_FILE_NAME)
    }

    fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir).with_context(|| {
            format!(
                "Failed to create config directory '{}'",
                self.dir.display()
            )
        })
    }

    pub fn load(&self) -> Result<Option<StoredConfig>> {
        self.ensure_dir()?;
        let path = self.path();
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("Failed to read config file '{}'", path.display()));
            }
        };
        let parsed = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config file '{}'", path.display()))?;
        debug!(path = %path.display(), "read config file");
        Ok(Some(parsed))
    }

    /// Merges `overrides` into the persisted record, writing it back once.
    pub fn apply(&self, overrides: &ConfigOverrides) -> Result<StoredConfig> {
        let mut stored = self.load()?.unwrap_or_default();
        if overrides.is_empty() {
            return Ok(stored);
        }

        stored.merge(overrides);
        self.save(&stored)?;
        info!(
            path = %self.path().display(),
            api_key = overrides.api_key.is_some(),
            endpoint_url = overrides.endpoint_url.is_some(),
            llm_type = overrides.llm_type.is_some(),
            insecure_skip_verify = overrides.insecure_skip_verify.is_some(),
            "persisted config overrides"
        );
        Ok(stored)
    }

    fn save(&self, stored: &StoredConfig) -> Result<()> {
        self.ensure_dir()?;
        let path = self.path();
        let tmp_path = path.with_extension("json.tmp");
        let contents =
            serde_json::to_string_pretty(stored).context("Failed to serialize config")?;

        write_private(&tmp_path, contents.as_bytes())
            .with_context(|| format!("Failed to write config file '{}'", tmp_path.display()))?;
        fs::rename(&tmp_path, &path)
            .with_context(|| format!("Failed to replace config file '{}'", path.display()))?;
        Ok(())
    }
}

/// Writes `contents` readable only by the owner, since the record holds the API key.
#[cfg(unix)]
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    file.write_all(contents)
}

#[cfg(not(unix))]
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    fs::write(path, contents)
}
