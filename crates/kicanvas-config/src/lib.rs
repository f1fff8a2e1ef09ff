//! Configuration management for the KiCanvas site builder.
//!
//! Parses `kicanvas.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `content.source_dir`
//! - `content.output_dir`
//! - `content.schematics_path`
//! - `kicanvas.local_url`
//! - `kicanvas.cdn_url`
//! - `kicanvas.static_schematics_url`

mod expand;

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override content source directory.
    pub source_dir: Option<PathBuf>,
    /// Override output directory.
    pub output_dir: Option<PathBuf>,
    /// Override the CDN loader flag.
    pub use_cdn: Option<bool>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "kicanvas.toml";

/// Default viewer loader served from the site itself.
pub const DEFAULT_LOCAL_URL: &str = "/static/js/kicanvas.js";
/// Default viewer loader served by kicanvas.org.
pub const DEFAULT_CDN_URL: &str = "https://kicanvas.org/kicanvas/kicanvas.js";

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Content configuration (paths are relative strings from TOML).
    content: ContentConfigRaw,
    /// Viewer loader configuration.
    pub kicanvas: KicanvasConfig,
    /// Template function defaults.
    pub template: TemplateConfig,

    /// Resolved content configuration (set after loading).
    #[serde(skip)]
    pub content_resolved: ContentConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Raw content configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ContentConfigRaw {
    source_dir: Option<String>,
    output_dir: Option<String>,
    schematics_path: Option<String>,
    template_content: Option<bool>,
}

/// Resolved content configuration with absolute paths.
#[derive(Debug, Default)]
pub struct ContentConfig {
    /// Directory scanned for documents.
    pub source_dir: PathBuf,
    /// Directory the site is written to.
    pub output_dir: PathBuf,
    /// Fallback schematics directory, relative to `source_dir`.
    pub schematics_path: Option<String>,
    /// Pre-render document sources through the template engine.
    pub template_content: bool,
}

/// Viewer loader configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct KicanvasConfig {
    /// Load the viewer from the CDN instead of the local copy.
    pub use_cdn: bool,
    /// Local loader URL.
    pub local_url: String,
    /// CDN loader URL.
    pub cdn_url: String,
    /// URL prefix for schematics that could not be located. Empty disables it.
    pub static_schematics_url: Option<String>,
}

impl Default for KicanvasConfig {
    fn default() -> Self {
        Self {
            use_cdn: false,
            local_url: DEFAULT_LOCAL_URL.to_owned(),
            cdn_url: DEFAULT_CDN_URL.to_owned(),
            static_schematics_url: Some("/static/schematics".to_owned()),
        }
    }
}

impl KicanvasConfig {
    /// Loader URL selected by `use_cdn`.
    #[must_use]
    pub fn loader_url(&self) -> &str {
        if self.use_cdn {
            &self.cdn_url
        } else {
            &self.local_url
        }
    }

    /// Static fallback prefix, `None` when unset or empty.
    #[must_use]
    pub fn static_schematics_url(&self) -> Option<&str> {
        self.static_schematics_url
            .as_deref()
            .filter(|url| !url.is_empty())
    }
}

/// Defaults used by the `kicad_schematic` template function.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TemplateConfig {
    /// Style applied when the call passes none.
    pub default_style: String,
    /// Controls applied when the call passes none.
    pub default_controls: String,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            default_style: "width: 100%; height: 600px;".to_owned(),
            default_controls: "all".to_owned(),
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`kicanvas.cdn_url`").
        field: String,
        /// Error message (e.g., "${`KICANVAS_CDN`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Require a URL field to use http:// or https:// scheme.
fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !is_http_url(url) {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

/// Require a URL field to be site-absolute or http(s).
fn require_site_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with('/') && !is_http_url(url) {
        return Err(ConfigError::Validation(format!(
            "{field} must start with /, http:// or https://"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `kicanvas.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values. The merged
    /// configuration is validated last.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist or parsing fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            let cwd = std::env::current_dir()?;
            config.apply_cli_settings(settings, &cwd);
        }

        config.validate()?;

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    ///
    /// Relative directories are taken relative to `cwd`, where the user typed them.
    fn apply_cli_settings(&mut self, settings: &CliSettings, cwd: &Path) {
        if let Some(source_dir) = &settings.source_dir {
            self.content_resolved.source_dir = cwd.join(source_dir);
        }
        if let Some(output_dir) = &settings.output_dir {
            self.content_resolved.output_dir = cwd.join(output_dir);
        }
        if let Some(use_cdn) = settings.use_cdn {
            self.kicanvas.use_cdn = use_cdn;
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            content: ContentConfigRaw::default(),
            kicanvas: KicanvasConfig::default(),
            template: TemplateConfig::default(),
            content_resolved: ContentConfig {
                source_dir: base.join("content"),
                output_dir: base.join("output"),
                schematics_path: None,
                template_content: false,
            },
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called by [`Config::load`] once CLI settings are applied.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_content()?;
        self.validate_kicanvas()?;
        self.validate_template()?;
        Ok(())
    }

    fn validate_content(&self) -> Result<(), ConfigError> {
        if let Some(path) = &self.content_resolved.schematics_path
            && (path.starts_with('/') || Path::new(path).is_absolute())
        {
            return Err(ConfigError::Validation(
                "content.schematics_path must be relative to content.source_dir".to_owned(),
            ));
        }
        if self.content_resolved.source_dir == self.content_resolved.output_dir {
            return Err(ConfigError::Validation(
                "content.output_dir must differ from content.source_dir".to_owned(),
            ));
        }
        Ok(())
    }

    fn validate_kicanvas(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.kicanvas.cdn_url, "kicanvas.cdn_url")?;
        require_http_url(&self.kicanvas.cdn_url, "kicanvas.cdn_url")?;
        require_non_empty(&self.kicanvas.local_url, "kicanvas.local_url")?;
        require_site_url(&self.kicanvas.local_url, "kicanvas.local_url")?;
        if let Some(url) = self.kicanvas.static_schematics_url() {
            require_site_url(url, "kicanvas.static_schematics_url")?;
        }
        Ok(())
    }

    fn validate_template(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.template.default_style, "template.default_style")?;
        require_non_empty(&self.template.default_controls, "template.default_controls")?;
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        expand::expand_opt(&mut self.content.source_dir, "content.source_dir")?;
        expand::expand_opt(&mut self.content.output_dir, "content.output_dir")?;
        expand::expand_opt(&mut self.content.schematics_path, "content.schematics_path")?;

        self.kicanvas.local_url = expand::expand_env(&self.kicanvas.local_url, "kicanvas.local_url")?;
        self.kicanvas.cdn_url = expand::expand_env(&self.kicanvas.cdn_url, "kicanvas.cdn_url")?;
        expand::expand_opt(
            &mut self.kicanvas.static_schematics_url,
            "kicanvas.static_schematics_url",
        )?;

        Ok(())
    }

    /// Resolve relative paths to absolute paths based on config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let resolve = |path: Option<&str>, default: &str| config_dir.join(path.unwrap_or(default));

        self.content_resolved = ContentConfig {
            source_dir: resolve(self.content.source_dir.as_deref(), "content"),
            output_dir: resolve(self.content.output_dir.as_deref(), "output"),
            schematics_path: self
                .content
                .schematics_path
                .clone()
                .filter(|p| !p.is_empty()),
            template_content: self.content.template_content.unwrap_or(false),
        };
    }
}
