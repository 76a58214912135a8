use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use modpin_archive::{ArchiveError, ExtractOptions, ExtractReport, extract_zip};
use modpin_auth::{Credential, CredentialStore};
use modpin_source::{
    OriginChain, PackageRef, PrivacyMatcher, Resolution, ResolveError, SourceCandidate, SourceResolver, ToolLookup,
    VersionInference,
};
use modpin_verify::{ArchiveHasher, Sha256Hasher, Sri, VerifiedReader, VerifyError};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::batch::DEFAULT_WORKERS;
use crate::{
    CacheEntry, CacheRecord, EngineConfig, FetchError, HttpClient, ModuleCache, ProxyInfoProvider, Result, TransferError,
};

const ARCHIVE_FILE: &str = "module.zip";

/// A module present in the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    pub package: PackageRef,
    /// Extracted module tree.
    pub dir:     PathBuf,
    /// Archive hash in SRI form.
    pub hash:    String,
    pub url:     Option<String>,
    /// Full commit hash, when the download was pinned to one.
    pub rev:     Option<String>,
}

impl FetchResult {
    fn from_entry(package: &PackageRef, entry: CacheEntry) -> Self {
        Self { package: package.clone(), dir: entry.dir, hash: entry.hash, url: entry.url, rev: entry.rev }
    }
}

/// Resolves, downloads, hashes, extracts and caches modules.
pub struct Fetcher<C: HttpClient> {
    client:             Arc<C>,
    resolver:           SourceResolver,
    privacy:            PrivacyMatcher,
    credentials:        CredentialStore,
    cache:              Arc<ModuleCache>,
    attempt_timeout:    Option<Duration>,
    pub(crate) workers: usize,
}

impl<C: HttpClient + 'static> Fetcher<C> {
    /// Build the full origin chain, credentials and cache from configuration.
    pub fn from_config(client: C, config: &EngineConfig) -> Result<Self> {
        let client = Arc::new(client);

        let mut origins = OriginChain::new();
        if let Some(proxy) = &config.proxy {
            origins.push(Box::new(ProxyInfoProvider::new(client.clone(), proxy.clone())));
        }
        if let Some(program) = &config.lookup_program {
            origins.push(Box::new(ToolLookup::new(program.clone())));
        }
        origins.push(Box::new(VersionInference::new(config.vcs_host.clone())));

        let mut resolver = SourceResolver::new(config.proxy.clone(), origins).with_vcs_host(config.vcs_host.clone());
        resolver.set_lookup_timeout(config.attempt_timeout());

        let credentials = match config.netrc_path() {
            Some(path) => CredentialStore::load(path)?,
            None => CredentialStore::empty(),
        };

        Ok(Self {
            client,
            resolver,
            privacy: PrivacyMatcher::parse(&config.private),
            credentials,
            cache: Arc::new(ModuleCache::new(&config.cache_dir)),
            attempt_timeout: config.attempt_timeout(),
            workers: config.workers.max(1),
        })
    }
}

impl<C: HttpClient> Fetcher<C> {
    pub fn new(client: impl Into<Arc<C>>, resolver: SourceResolver, cache: impl Into<Arc<ModuleCache>>) -> Self {
        Self {
            client: client.into(),
            resolver,
            privacy: PrivacyMatcher::default(),
            credentials: CredentialStore::empty(),
            cache: cache.into(),
            attempt_timeout: None,
            workers: DEFAULT_WORKERS,
        }
    }

    pub fn privacy(mut self, privacy: PrivacyMatcher) -> Self {
        self.privacy = privacy;
        self
    }

    pub fn credentials(mut self, credentials: CredentialStore) -> Self {
        self.credentials = credentials;
        self
    }

    /// Bound each download attempt and each origin lookup.
    pub fn attempt_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.resolver.set_lookup_timeout(timeout);
        self.attempt_timeout = timeout;
        self
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn cache(&self) -> &ModuleCache { &self.cache }

    pub fn is_private(&self, package: &PackageRef) -> bool { self.privacy.is_private(package.path()) }

    /// Return the cached module, downloading it first on a miss.
    pub async fn fetch(&self, package: &PackageRef) -> Result<FetchResult> {
        package.validate()?;
        if let Some(entry) = self.cache.lookup(package) {
            debug!(%package, "cache hit");
            return Ok(FetchResult::from_entry(package, entry));
        }

        let _guard = self.cache.lock(package).await;
        if let Some(entry) = self.cache.lookup(package) {
            debug!(%package, "cache populated while waiting");
            return Ok(FetchResult::from_entry(package, entry));
        }

        let private = self.is_private(package);
        let resolution = self.resolver.resolve(package, private).await?;

        let download = self.cache.staging()?;
        let archive = download.path().join(ARCHIVE_FILE);

        let mut last_failure = None;
        for candidate in &resolution.candidates {
            debug!(%package, strategy = %candidate.kind, url = %candidate.url, "trying source");
            match self.attempt(candidate, private, &archive).await {
                Ok(hash) => return self.install(package, &resolution, candidate, archive, hash).await,
                Err(e) => {
                    debug!(%package, strategy = %candidate.kind, error = %e, "source failed");
                    last_failure = Some((candidate.kind, e));
                }
            }
        }

        let Some((strategy, source)) = last_failure else {
            return Err(ResolveError::NoViableSource { package: package.to_string(), reason: "no download candidates" }
                .into());
        };
        Err(FetchError::AllSourcesFailed { package: package.to_string(), strategy, private, source })
    }

    /// Tree hash of an extracted module.
    pub async fn tree_hash(&self, result: &FetchResult) -> Result<Sri> {
        let dir = result.dir.clone();
        Ok(tokio::task::spawn_blocking(move || modpin_verify::tree_hash(dir)).await??)
    }

    async fn attempt(
        &self,
        candidate: &SourceCandidate,
        private: bool,
        archive: &Path,
    ) -> std::result::Result<Sri, TransferError> {
        let auth = if private { self.credentials.lookup(&candidate.auth_host) } else { None };
        if private && auth.is_none() {
            debug!(host = %candidate.auth_host, "no credentials for private module, trying unauthenticated");
        }

        let download = self.download(&candidate.url, auth, archive);
        match self.attempt_timeout {
            Some(after) => tokio::time::timeout(after, download)
                .await
                .map_err(|_| TransferError::Timeout { url: candidate.url.clone(), after })?,
            None => download.await,
        }
    }

    /// Stream the body to `archive` while hashing it.
    async fn download(
        &self,
        url: &str,
        auth: Option<&Credential>,
        archive: &Path,
    ) -> std::result::Result<Sri, TransferError> {
        let io_err = |source| TransferError::Io { path: archive.to_path_buf(), source };

        let mut body = self.client.get(url, auth).await?;
        let mut file = tokio::fs::File::create(archive).await.map_err(io_err)?;
        let mut hasher = ArchiveHasher::new();

        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            hasher.update(&chunk);
            file.write_all(&chunk).await.map_err(io_err)?;
        }
        file.flush().await.map_err(io_err)?;

        debug!(url, bytes = hasher.len(), "download complete");
        Ok(hasher.finish())
    }

    async fn install(
        &self,
        package: &PackageRef,
        resolution: &Resolution,
        candidate: &SourceCandidate,
        archive: PathBuf,
        hash: Sri,
    ) -> Result<FetchResult> {
        let staged = self.cache.staging()?;
        let dest = staged.path().to_path_buf();
        let options = ExtractOptions::for_module(package.path(), package.version());

        let expected = hash.clone();
        let name = package.to_string();
        let report = tokio::task::spawn_blocking(move || -> Result<ExtractReport> {
            check_staged(&archive, &expected)?;
            extract_file(&archive, &dest, &options).map_err(|source| FetchError::Archive { package: name, source })
        })
        .await??;

        let record = CacheRecord {
            hash: hash.to_string(),
            url:  candidate.url.clone(),
            rev:  candidate.pinned_commit.clone().or_else(|| resolution.pinned_revision().map(str::to_string)),
        };
        let entry = self.cache.commit(package, staged, &record).await?;

        info!(
            %package,
            strategy = %candidate.kind,
            files = report.entry_count,
            hash = %entry.hash,
            "fetched"
        );
        Ok(FetchResult::from_entry(package, entry))
    }
}

/// Re-read the staged archive and check it still hashes to what was streamed.
fn check_staged(archive: &Path, expected: &Sri) -> modpin_verify::Result<()> {
    let read_err = |source| VerifyError::Read { path: archive.to_path_buf(), source };
    let file = std::fs::File::open(archive).map_err(read_err)?;
    let mut reader = VerifiedReader::new(std::io::BufReader::new(file), Sha256Hasher::new());
    std::io::copy(&mut reader, &mut std::io::sink()).map_err(read_err)?;
    reader.finish(expected)
}

fn extract_file(archive: &Path, dest: &Path, options: &ExtractOptions) -> modpin_archive::Result<ExtractReport> {
    let file = std::fs::File::open(archive)
        .map_err(|source| ArchiveError::ExtractionFailed { path: archive.to_path_buf(), source })?;
    extract_zip(std::io::BufReader::new(file), dest, options)
}
