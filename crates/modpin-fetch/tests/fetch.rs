mod common;

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use common::{Call, MockClient, Route, module_zip};
use modpin_auth::CredentialStore;
use modpin_fetch::{FetchError, Fetcher, ModuleCache, PackageRef, ProxyInfoProvider};
use modpin_source::{
    Origin, OriginChain, OriginProvider, PrivacyMatcher, ProviderError, ResolveError, SourceResolver, StrategyKind,
    VersionInference,
};
use modpin_verify::archive_hash;

const PROXY: &str = "https://proxy.test";
const FULL: &str = "0123456789abcdef0123456789abcdef01234567";

fn package() -> PackageRef { PackageRef::new("example.com/lib", "v1.0.0") }

fn proxy_url() -> String { format!("{PROXY}/example.com/lib/@v/v1.0.0.zip") }

fn registry_url() -> String { "https://example.com/example.com/lib/@v/v1.0.0.zip".to_string() }

fn lib_zip() -> Vec<u8> {
    module_zip("example.com/lib@v1.0.0/", &[("go.mod", "module example.com/lib\n"), ("lib.go", "package lib\n")])
}

fn fetcher(client: &Arc<MockClient>, root: &Path) -> Fetcher<MockClient> {
    let resolver = SourceResolver::new(Some(PROXY.into()), OriginChain::new());
    Fetcher::new(client.clone(), resolver, ModuleCache::new(root))
}

#[tokio::test]
async fn proxy_download_is_cached() {
    let root = tempfile::tempdir().unwrap();
    let zip = lib_zip();
    let client = Arc::new(MockClient::new().route(&proxy_url(), Route::Body(zip.clone())));
    let fetcher = fetcher(&client, root.path());

    let first = fetcher.fetch(&package()).await.unwrap();
    let second = fetcher.fetch(&package()).await.unwrap();

    assert_eq!(client.count(), 1);
    assert_eq!(first, second);
    assert_eq!(first.hash, archive_hash(&zip).to_string());
    assert_eq!(first.url.as_deref(), Some(proxy_url().as_str()));
    assert_eq!(first.rev, None);
    assert_eq!(fs::read_to_string(first.dir.join("go.mod")).unwrap(), "module example.com/lib\n");
    assert_eq!(first.dir, root.path().join("example.com/lib@v1.0.0"));
    assert_eq!(fs::read_to_string(root.path().join("example.com/lib@v1.0.0.hash")).unwrap(), first.hash);
}

#[tokio::test]
async fn staging_is_cleaned_up() {
    let root = tempfile::tempdir().unwrap();
    let client = Arc::new(MockClient::new().route(&proxy_url(), Route::Body(lib_zip())));
    fetcher(&client, root.path()).fetch(&package()).await.unwrap();

    let leftovers: Vec<_> = fs::read_dir(root.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().starts_with(".staging"))
        .collect();
    assert!(leftovers.is_empty());
}

#[tokio::test]
async fn proxy_not_found_falls_back_to_registry() {
    let root = tempfile::tempdir().unwrap();
    let client = Arc::new(MockClient::new().route(&registry_url(), Route::Body(lib_zip())));

    let result = fetcher(&client, root.path()).fetch(&package()).await.unwrap();

    assert_eq!(result.url.as_deref(), Some(registry_url().as_str()));
    let urls: Vec<_> = client.calls().into_iter().map(|c| c.url).collect();
    assert_eq!(urls, vec![proxy_url(), registry_url()]);
}

#[tokio::test]
async fn slow_source_times_out_and_falls_through() {
    let root = tempfile::tempdir().unwrap();
    let client = Arc::new(
        MockClient::new()
            .route(&proxy_url(), Route::Delayed(Duration::from_secs(5), lib_zip()))
            .route(&registry_url(), Route::Body(lib_zip())),
    );
    let fetcher = fetcher(&client, root.path()).attempt_timeout(Some(Duration::from_millis(100)));

    let result = fetcher.fetch(&package()).await.unwrap();

    assert_eq!(result.url.as_deref(), Some(registry_url().as_str()));
}

#[tokio::test]
async fn private_failure_carries_hint_and_skips_proxy() {
    let root = tempfile::tempdir().unwrap();
    let client = Arc::new(MockClient::new());
    let fetcher = fetcher(&client, root.path()).privacy(PrivacyMatcher::parse("example.com/*"));

    let err = fetcher.fetch(&package()).await.unwrap_err();

    match &err {
        FetchError::AllSourcesFailed { private, strategy, .. } => {
            assert!(private);
            assert_eq!(*strategy, StrategyKind::RegistryPath);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.hint().unwrap().contains("machine example.com"));
    assert_eq!(client.calls(), vec![Call { url: registry_url(), login: None }]);
}

#[tokio::test]
async fn private_module_without_matching_credentials_is_fetched_anonymously() {
    let root = tempfile::tempdir().unwrap();
    let client = Arc::new(MockClient::new().route(&registry_url(), Route::Body(lib_zip())));
    let fetcher = fetcher(&client, root.path())
        .privacy(PrivacyMatcher::parse("example.com"))
        .credentials(CredentialStore::parse("machine git.elsewhere.org login ci password tok"));

    let result = fetcher.fetch(&package()).await.unwrap();

    assert_eq!(result.url.as_deref(), Some(registry_url().as_str()));
    assert_eq!(client.calls(), vec![Call { url: registry_url(), login: None }]);
}

#[tokio::test]
async fn hung_metadata_lookup_is_bounded_by_attempt_timeout() {
    let root = tempfile::tempdir().unwrap();
    let info_url = format!("{PROXY}/github.com/acme/widget/@v/v1.4.0.info");
    let tag_url = "https://github.com/acme/widget/archive/refs/tags/v1.4.0.zip";
    let zip = module_zip("widget-1.4.0/", &[("go.mod", "module github.com/acme/widget\n")]);
    let client = Arc::new(
        MockClient::new()
            .route(&info_url, Route::Delayed(Duration::from_secs(3), b"{}".to_vec()))
            .route(tag_url, Route::Body(zip)),
    );
    let origins = OriginChain::new()
        .with(ProxyInfoProvider::new(client.clone(), PROXY))
        .with(VersionInference::default());
    let resolver = SourceResolver::new(Some(PROXY.into()), origins);
    let fetcher = Fetcher::<MockClient>::new(client.clone(), resolver, ModuleCache::new(root.path()))
        .attempt_timeout(Some(Duration::from_millis(100)));

    let started = Instant::now();
    let result = fetcher.fetch(&PackageRef::new("github.com/acme/widget", "v1.4.0")).await.unwrap();

    assert!(started.elapsed() < Duration::from_secs(2), "took {:?}", started.elapsed());
    assert_eq!(result.url.as_deref(), Some(tag_url));
    assert!(result.dir.join("go.mod").exists());
}

#[tokio::test]
async fn path_traversal_never_leaves_the_cache_root() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("cache");
    let victim = tmp.path().join("victim@v1.0.0");
    fs::create_dir_all(&victim).unwrap();
    fs::write(victim.join("precious.txt"), "keep").unwrap();

    let client = Arc::new(MockClient::new());
    let package = PackageRef::new("example.com/../../victim", "v1.0.0");
    let err = fetcher(&client, &root).fetch(&package).await.unwrap_err();

    assert!(matches!(err, FetchError::Resolve(ResolveError::InvalidPath { .. })), "{err}");
    assert_eq!(client.count(), 0);
    assert_eq!(fs::read_to_string(victim.join("precious.txt")).unwrap(), "keep");
    assert!(!victim.join("go.mod").exists());
}

#[tokio::test]
async fn sidecar_write_failure_does_not_fail_the_fetch() {
    let root = tempfile::tempdir().unwrap();
    let client = Arc::new(MockClient::new().route(&proxy_url(), Route::Body(lib_zip())));
    let fetcher = fetcher(&client, root.path());

    // A directory where the `.url` file belongs makes that write fail.
    fs::create_dir_all(root.path().join("example.com/lib@v1.0.0.url/blocker")).unwrap();

    let result = fetcher.fetch(&package()).await.unwrap();

    assert_eq!(result.hash, archive_hash(&lib_zip()).to_string());
    assert!(result.dir.join("go.mod").exists());
    let cached = fetcher.cache().lookup(&package()).unwrap();
    assert_eq!(cached.hash, result.hash);
    assert_eq!(cached.url, None);
}

#[tokio::test]
async fn credentials_sent_only_for_private_modules() {
    let root = tempfile::tempdir().unwrap();
    let public = PackageRef::new("other.org/tool", "v2.0.0");
    let public_url = format!("{PROXY}/other.org/tool/@v/v2.0.0.zip");
    let public_zip = module_zip("other.org/tool@v2.0.0/", &[("go.mod", "module other.org/tool\n")]);
    let client = Arc::new(
        MockClient::new()
            .route(&registry_url(), Route::Body(lib_zip()))
            .route(&public_url, Route::Body(public_zip)),
    );
    let fetcher = fetcher(&client, root.path())
        .privacy(PrivacyMatcher::parse("example.com"))
        .credentials(CredentialStore::parse("machine example.com login ci password tok\ndefault login anon password x"));

    fetcher.fetch(&package()).await.unwrap();
    fetcher.fetch(&public).await.unwrap();

    assert_eq!(
        client.calls(),
        vec![
            Call { url: registry_url(), login: Some("ci".into()) },
            Call { url: public_url, login: None },
        ]
    );
}

#[tokio::test]
async fn directory_without_hash_is_refetched() {
    let root = tempfile::tempdir().unwrap();
    let stale = root.path().join("example.com/lib@v1.0.0");
    fs::create_dir_all(&stale).unwrap();
    fs::write(stale.join("half-written"), "x").unwrap();

    let client = Arc::new(MockClient::new().route(&proxy_url(), Route::Body(lib_zip())));
    let result = fetcher(&client, root.path()).fetch(&package()).await.unwrap();

    assert_eq!(client.count(), 1);
    assert!(result.dir.join("go.mod").exists());
    assert!(!result.dir.join("half-written").exists());
}

#[tokio::test]
async fn concurrent_fetches_of_one_key_download_once() {
    let root = tempfile::tempdir().unwrap();
    let client = Arc::new(MockClient::new().route(&proxy_url(), Route::Delayed(Duration::from_millis(50), lib_zip())));
    let fetcher = fetcher(&client, root.path());
    let package = package();

    let (a, b) = tokio::join!(fetcher.fetch(&package), fetcher.fetch(&package));

    assert_eq!(client.count(), 1);
    assert_eq!(a.unwrap().hash, b.unwrap().hash);
}

#[tokio::test]
async fn independent_fetchers_share_one_entry() {
    let root = tempfile::tempdir().unwrap();
    let zip = lib_zip();
    let route = || Route::Delayed(Duration::from_millis(50), zip.clone());
    let first_client = Arc::new(MockClient::new().route(&proxy_url(), route()));
    let second_client = Arc::new(MockClient::new().route(&proxy_url(), route()));
    let first = fetcher(&first_client, root.path());
    let second = fetcher(&second_client, root.path());
    let package = package();

    let (a, b) = tokio::join!(first.fetch(&package), second.fetch(&package));
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_eq!(a.hash, b.hash);
    assert_eq!(a.dir, b.dir);
    assert!(a.dir.join("lib.go").exists());
    assert_eq!(first.cache().lookup(&package).unwrap().hash, a.hash);
}

#[tokio::test]
async fn corrupt_archive_is_reported() {
    let root = tempfile::tempdir().unwrap();
    let client = Arc::new(MockClient::new().route(&proxy_url(), Route::Body(b"not a zip".to_vec())));

    let err = fetcher(&client, root.path()).fetch(&package()).await.unwrap_err();

    assert!(matches!(err, FetchError::Archive { .. }));
    assert!(!root.path().join("example.com/lib@v1.0.0").exists());
}

#[tokio::test]
async fn fetch_all_keeps_input_order() {
    let root = tempfile::tempdir().unwrap();
    let other = PackageRef::new("example.com/lib", "v1.1.0");
    let missing = PackageRef::new("example.com/gone", "v0.1.0");
    let client = Arc::new(
        MockClient::new()
            .route(&proxy_url(), Route::Delayed(Duration::from_millis(30), lib_zip()))
            .route(
                &format!("{PROXY}/example.com/lib/@v/v1.1.0.zip"),
                Route::Body(module_zip("example.com/lib@v1.1.0/", &[("go.mod", "module example.com/lib\n")])),
            ),
    );
    let fetcher = fetcher(&client, root.path()).workers(2);

    let results = fetcher.fetch_all(&[package(), missing, other.clone()]).await;

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].as_ref().unwrap().package, package());
    assert!(results[1].is_err());
    assert_eq!(results[2].as_ref().unwrap().package, other);
}

#[tokio::test]
async fn tree_hash_of_fetched_module() {
    let root = tempfile::tempdir().unwrap();
    let client = Arc::new(MockClient::new().route(&proxy_url(), Route::Body(lib_zip())));
    let fetcher = fetcher(&client, root.path());

    let result = fetcher.fetch(&package()).await.unwrap();
    let sri = fetcher.tree_hash(&result).await.unwrap();

    assert_eq!(sri, modpin_verify::tree_hash(&result.dir).unwrap());
    assert_ne!(sri.to_string(), result.hash);
}

struct PinnedLookup;

#[async_trait]
impl OriginProvider for PinnedLookup {
    fn name(&self) -> &'static str { "pinned" }

    async fn origin(&self, _package: &PackageRef) -> Result<Option<Origin>, ProviderError> {
        Ok(Some(Origin::git("https://github.com/acme/widget").with_hash(FULL)))
    }
}

#[tokio::test]
async fn pinned_commit_is_recorded() {
    let root = tempfile::tempdir().unwrap();
    let package = PackageRef::new("github.com/acme/widget", "v0.0.0-20240101000000-0123456789ab");
    let url = format!("https://github.com/acme/widget/archive/{FULL}.zip");
    let zip = module_zip(&format!("widget-{FULL}/"), &[("go.mod", "module github.com/acme/widget\n")]);
    let client = Arc::new(MockClient::new().route(&url, Route::Body(zip)));
    let resolver = SourceResolver::new(Some(PROXY.into()), OriginChain::new().with(PinnedLookup));
    let fetcher: Fetcher<MockClient> = Fetcher::new(client.clone(), resolver, ModuleCache::new(root.path()))
        .privacy(PrivacyMatcher::parse("github.com/acme"));

    let result = fetcher.fetch(&package).await.unwrap();

    assert_eq!(result.rev.as_deref(), Some(FULL));
    assert_eq!(result.url.as_deref(), Some(url.as_str()));
    assert!(result.dir.join("go.mod").exists());
    let rev_sidecar = root.path().join(format!("github.com/acme/widget@{}.rev", package.version()));
    assert_eq!(fs::read_to_string(rev_sidecar).unwrap(), FULL);
}
