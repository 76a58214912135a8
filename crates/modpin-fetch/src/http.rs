use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::Stream;
use modpin_auth::Credential;

use crate::TransferError;

pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = T> + Send + 'a>>;

/// Minimal HTTP surface needed to download modules.
///
/// Implementations follow redirects and map any final status other than
/// `200 OK` to [`TransferError::Status`].
pub trait HttpClient: Send + Sync {
    /// GET `url`, optionally with Basic authentication, and stream the body.
    fn get(
        &self,
        url: &str,
        auth: Option<&Credential>,
    ) -> impl Future<Output = Result<BoxStream<'static, Result<Bytes, TransferError>>, TransferError>> + Send;
}

#[cfg(feature = "reqwest")]
mod reqwest_impl {
    use futures_util::StreamExt;

    use super::*;

    /// Production client on top of `reqwest`.
    #[derive(Clone)]
    pub struct ReqwestClient {
        client: reqwest::Client,
    }

    impl ReqwestClient {
        pub fn new() -> Result<Self, TransferError> {
            let client = reqwest::Client::builder()
                .user_agent(concat!("modpin/", env!("CARGO_PKG_VERSION")))
                .build()
                .map_err(|e| TransferError::network("client", e))?;
            Ok(Self { client })
        }
    }

    impl HttpClient for ReqwestClient {
        async fn get(
            &self,
            url: &str,
            auth: Option<&Credential>,
        ) -> Result<BoxStream<'static, Result<Bytes, TransferError>>, TransferError> {
            let mut request = self.client.get(url);
            if let Some(credential) = auth {
                request = request.basic_auth(&credential.login, Some(&credential.secret));
            }

            let response = request.send().await.map_err(|e| TransferError::network(url, e))?;

            let status = response.status();
            if status != reqwest::StatusCode::OK {
                return Err(TransferError::Status { url: url.to_string(), status: status.as_u16() });
            }

            let owned_url = url.to_string();
            let stream = response
                .bytes_stream()
                .map(move |chunk| chunk.map_err(|e| TransferError::network(&owned_url, e)));
            Ok(Box::pin(stream))
        }
    }
}

#[cfg(feature = "reqwest")]
pub use reqwest_impl::ReqwestClient;
