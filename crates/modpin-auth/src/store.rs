use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{AuthError, Result};
use crate::parse::parse_entries;

/// One credential entry. `host` is `None` for the `default` entry.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub host:   Option<String>,
    pub login:  String,
    pub secret: String,
}

impl Credential {
    pub(crate) fn new(host: Option<String>) -> Self {
        Self {
            host,
            login: String::new(),
            secret: String::new(),
        }
    }

    pub fn is_default(&self) -> bool { self.host.is_none() }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("host", &self.host)
            .field("login", &self.login)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Parsed, read-only credential set.
#[derive(Clone, Debug, Default)]
pub struct CredentialStore {
    entries: Vec<Credential>,
}

impl CredentialStore {
    pub fn empty() -> Self { Self::default() }

    pub fn parse(text: &str) -> Self {
        Self {
            entries: parse_entries(text),
        }
    }

    /// Load a credential file. A missing file yields an empty store.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("no credential file at {}", path.display());
                return Ok(Self::empty());
            }
            Err(source) => {
                return Err(AuthError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        let text = String::from_utf8(bytes).map_err(|_| AuthError::Encoding {
            path: path.to_path_buf(),
        })?;

        let store = Self::parse(&text);
        debug!(
            "loaded {} credential entries from {}",
            store.entries.len(),
            path.display()
        );
        Ok(store)
    }

    /// `$NETRC` if set, otherwise `~/.netrc`.
    pub fn default_path() -> Option<PathBuf> {
        if let Some(path) = std::env::var_os("NETRC").filter(|p| !p.is_empty()) {
            return Some(PathBuf::from(path));
        }
        home::home_dir().map(|home| home.join(".netrc"))
    }

    /// Exact host match, then the default entry.
    pub fn lookup(&self, host: &str) -> Option<&Credential> {
        self.entries
            .iter()
            .find(|e| e.host.as_deref() == Some(host))
            .or_else(|| self.entries.iter().find(|e| e.is_default()))
    }

    pub fn entries(&self) -> &[Credential] { &self.entries }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}
