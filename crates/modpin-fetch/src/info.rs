use std::sync::Arc;

use async_trait::async_trait;
use futures_util::TryStreamExt;
use modpin_source::{ModuleInfo, Origin, OriginProvider, PackageRef, ProviderError};
use tracing::debug;

use crate::HttpClient;

/// Reads `{proxy}/{path}/@v/{version}.info`. Never asked about private
/// modules: the proxy must not learn their names.
pub struct ProxyInfoProvider<C> {
    client: Arc<C>,
    proxy:  String,
}

impl<C: HttpClient> ProxyInfoProvider<C> {
    pub fn new(client: Arc<C>, proxy: impl Into<String>) -> Self {
        Self { client, proxy: proxy.into().trim_end_matches('/').to_string() }
    }
}

#[async_trait]
impl<C: HttpClient + 'static> OriginProvider for ProxyInfoProvider<C> {
    fn name(&self) -> &'static str { "proxy-info" }

    fn serves_private(&self) -> bool { false }

    async fn origin(&self, package: &PackageRef) -> Result<Option<Origin>, ProviderError> {
        let url = package.info_url(&self.proxy);
        debug!("GET {url}");

        let body = self.client.get(&url, None).await.map_err(|e| ProviderError::Request(Box::new(e)))?;
        let chunks: Vec<_> = body.try_collect().await.map_err(|e| ProviderError::Request(Box::new(e)))?;
        let bytes = chunks.concat();

        let info: ModuleInfo = serde_json::from_slice(&bytes)?;
        Ok(info.origin)
    }
}
