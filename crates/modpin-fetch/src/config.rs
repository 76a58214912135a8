use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use modpin_auth::CredentialStore;
use modpin_source::DEFAULT_VCS_HOST;
use serde::{Deserialize, Serialize};

use crate::batch::DEFAULT_WORKERS;

pub const DEFAULT_PROXY: &str = "https://proxy.golang.org";

/// Engine settings.
///
/// Layered lowest to highest: built-in defaults, `modpin.toml` (or an explicit
/// file), `MODPIN_*` environment variables, then the standard module
/// environment (`GOPROXY`, `GOPRIVATE`, `GONOPROXY`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Shared proxy base URL; `None` disables the proxy.
    pub proxy:                Option<String>,
    /// Comma-separated private module patterns.
    pub private:              String,
    pub cache_dir:            PathBuf,
    /// Credential file; defaults to `$NETRC` or `~/.netrc`.
    pub netrc:                Option<PathBuf>,
    pub attempt_timeout_secs: Option<u64>,
    pub workers:              usize,
    /// Program answering `list -m -json`; `None` disables the lookup.
    pub lookup_program:       Option<String>,
    pub vcs_host:             String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            proxy:                Some(DEFAULT_PROXY.to_string()),
            private:              String::new(),
            cache_dir:            default_cache_dir(),
            netrc:                None,
            attempt_timeout_secs: None,
            workers:              DEFAULT_WORKERS,
            lookup_program:       Some("go".to_string()),
            vcs_host:             DEFAULT_VCS_HOST.to_string(),
        }
    }
}

impl EngineConfig {
    pub const FILE_NAME: &'static str = "modpin.toml";
    pub const ENV_PREFIX: &'static str = "MODPIN_";

    pub fn figment(file: Option<&Path>) -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(file.unwrap_or(Path::new(Self::FILE_NAME))))
            .merge(Env::prefixed(Self::ENV_PREFIX))
    }

    pub fn load(file: Option<&Path>) -> Result<Self, figment::Error> {
        let mut config: Self = Self::figment(file).extract()?;
        config.apply_module_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply `GOPROXY` / `GOPRIVATE` / `GONOPROXY` as read through `var`.
    pub fn apply_module_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(list) = var("GOPROXY").filter(|v| !v.trim().is_empty()) {
            self.proxy = parse_proxy_list(&list);
        }
        let nonempty = |v: &String| !v.trim().is_empty();
        if let Some(private) = var("GOPRIVATE").filter(nonempty).or_else(|| var("GONOPROXY").filter(nonempty)) {
            self.private = private;
        }
    }

    pub fn attempt_timeout(&self) -> Option<Duration> {
        self.attempt_timeout_secs.filter(|s| *s > 0).map(Duration::from_secs)
    }

    pub fn netrc_path(&self) -> Option<PathBuf> { self.netrc.clone().or_else(CredentialStore::default_path) }
}

/// First entry of a `GOPROXY`-style list; `direct` and `off` mean no proxy.
pub fn parse_proxy_list(list: &str) -> Option<String> {
    let first = list.split([',', '|']).next().unwrap_or_default().trim();
    match first {
        "" | "direct" | "off" => None,
        url => Some(url.trim_end_matches('/').to_string()),
    }
}

fn default_cache_dir() -> PathBuf { dirs::cache_dir().unwrap_or_else(std::env::temp_dir).join("modpin") }
