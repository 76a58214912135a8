//! Bounded concurrent fetching of many modules.

use std::sync::Arc;

use futures_util::StreamExt;
use futures_util::stream::FuturesUnordered;
use modpin_source::PackageRef;
use tokio::sync::Semaphore;

use crate::{FetchResult, Fetcher, HttpClient, Result};

pub const DEFAULT_WORKERS: usize = 8;

impl<C: HttpClient> Fetcher<C> {
    /// Fetch every package with at most `workers` in flight.
    ///
    /// Results come back in input order; one failure does not stop the rest.
    pub async fn fetch_all(&self, packages: &[PackageRef]) -> Vec<Result<FetchResult>> {
        let semaphore = Arc::new(Semaphore::new(self.workers));

        let mut in_flight: FuturesUnordered<_> = packages
            .iter()
            .enumerate()
            .map(|(index, package)| {
                let semaphore = semaphore.clone();
                async move {
                    let _permit = semaphore.acquire_owned().await;
                    (index, self.fetch(package).await)
                }
            })
            .collect();

        let mut results: Vec<Option<Result<FetchResult>>> = packages.iter().map(|_| None).collect();
        while let Some((index, result)) = in_flight.next().await {
            results[index] = Some(result);
        }
        results.into_iter().flatten().collect()
    }
}

