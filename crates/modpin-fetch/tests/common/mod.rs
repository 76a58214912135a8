#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use bytes::Bytes;
use modpin_auth::Credential;
use modpin_fetch::{BoxStream, HttpClient, TransferError};
use zip::write::SimpleFileOptions;

#[derive(Clone)]
pub enum Route {
    Body(Vec<u8>),
    Status(u16),
    Delayed(Duration, Vec<u8>),
}

/// One recorded request: URL and the login sent with it, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub url:   String,
    pub login: Option<String>,
}

/// In-memory client. Unknown URLs answer 404.
#[derive(Default)]
pub struct MockClient {
    routes: HashMap<String, Route>,
    count:  AtomicUsize,
    calls:  Mutex<Vec<Call>>,
}

impl MockClient {
    pub fn new() -> Self { Self::default() }

    pub fn route(mut self, url: &str, route: Route) -> Self {
        self.routes.insert(url.to_string(), route);
        self
    }

    pub fn count(&self) -> usize { self.count.load(Ordering::SeqCst) }

    pub fn calls(&self) -> Vec<Call> { self.calls.lock().unwrap().clone() }
}

fn body(bytes: Vec<u8>) -> BoxStream<'static, Result<Bytes, TransferError>> {
    // Two chunks, so hashing across chunk boundaries is exercised.
    let split = bytes.len() / 2;
    let mut first = bytes;
    let second = first.split_off(split);
    Box::pin(futures_util::stream::iter([Ok(Bytes::from(first)), Ok(Bytes::from(second))]))
}

impl HttpClient for MockClient {
    async fn get(
        &self,
        url: &str,
        auth: Option<&Credential>,
    ) -> Result<BoxStream<'static, Result<Bytes, TransferError>>, TransferError> {
        self.count.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().unwrap().push(Call { url: url.to_string(), login: auth.map(|c| c.login.clone()) });

        match self.routes.get(url).cloned() {
            None => Err(TransferError::Status { url: url.to_string(), status: 404 }),
            Some(Route::Status(status)) => Err(TransferError::Status { url: url.to_string(), status }),
            Some(Route::Body(bytes)) => Ok(body(bytes)),
            Some(Route::Delayed(delay, bytes)) => {
                tokio::time::sleep(delay).await;
                Ok(body(bytes))
            }
        }
    }
}

/// A module zip with every file nested under `root`.
pub fn module_zip(root: &str, files: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, contents) in files {
        writer.start_file(format!("{root}{name}"), SimpleFileOptions::default()).unwrap();
        writer.write_all(contents.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}
