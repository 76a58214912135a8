//! Content-addressed module fetching.
//!
//! [`Fetcher`] ties the pieces together: it resolves download candidates for a
//! module, tries them in order over an [`HttpClient`], hashes the archive while
//! streaming it to disk, extracts it into a private staging directory and commits
//! the result into a [`ModuleCache`] by rename.
//!
//! ```no_run
//! use modpin_fetch::{EngineConfig, Fetcher, PackageRef, ReqwestClient};
//!
//! # async fn run() -> Result<(), modpin_fetch::FetchError> {
//! let config = EngineConfig::load(None)?;
//! let fetcher = Fetcher::from_config(ReqwestClient::new()?, &config)?;
//! let package: PackageRef = "golang.org/x/text@v0.14.0".parse()?;
//! let result = fetcher.fetch(&package).await?;
//! println!("{} {}", result.dir.display(), result.hash);
//! # Ok(())
//! # }
//! ```

pub use self::batch::DEFAULT_WORKERS;
pub use self::cache::{CacheEntry, CacheRecord, DEFAULT_STALE_LOCK, ModuleCache};
pub use self::config::{DEFAULT_PROXY, EngineConfig, parse_proxy_list};
pub use self::error::{FetchError, Result, TransferError};
pub use self::fetcher::{FetchResult, Fetcher};
pub use self::http::{BoxStream, HttpClient};
pub use self::info::ProxyInfoProvider;
pub use modpin_source::PackageRef;

#[cfg(feature = "reqwest")]
pub use self::http::ReqwestClient;

mod batch;
mod cache;
mod config;
mod error;
mod fetcher;
mod http;
mod info;
