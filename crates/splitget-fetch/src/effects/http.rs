use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::Stream;

/// A boxed stream type for HTTP response bodies.
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = T> + Send + 'a>>;

/// Status line, the headers the fetcher cares about, and the body stream of
/// one response.
pub struct HttpResponse<E> {
    pub status: u16,
    /// Raw `Content-Range` header, if present.
    pub content_range: Option<String>,
    /// `Content-Length` header, if present.
    pub content_length: Option<u64>,
    pub body: BoxStream<'static, std::result::Result<Bytes, E>>,
}

/// Asynchronous HTTP client abstraction.
///
/// This trait provides the minimal interface needed for ranged fetching.
/// Implementations handle their own redirect following and connection
/// pooling. Non-success statuses are returned as responses, not errors;
/// judging them is the fetcher's job.
///
/// # Implementations
///
/// - [`ReqwestClient`]: Production implementation using `reqwest`
/// - In-memory fakes for testing
pub trait HttpClient: Send + Sync {
    /// Error type for transport failures.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Send a GET request and return the response with a streaming body.
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to fetch
    /// * `headers` - Headers to include with the request, `Range` among them
    fn get(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> impl Future<Output = std::result::Result<HttpResponse<Self::Error>, Self::Error>> + Send;

    /// Query the Content-Length header without downloading the body.
    ///
    /// `Ok(None)` if the server does not report a length or refuses the
    /// request with a non-success status.
    fn head(
        &self,
        url: &str,
    ) -> impl Future<Output = std::result::Result<Option<u64>, Self::Error>> + Send;
}

#[cfg(feature = "reqwest")]
mod reqwest_impl {
    use std::time::Duration;

    use futures_util::StreamExt;
    use reqwest::header::{CONTENT_LENGTH, CONTENT_RANGE};

    use super::*;

    /// Production HTTP client implementation using reqwest.
    ///
    /// Cloning is cheap and shares the connection pool.
    #[derive(Clone)]
    pub struct ReqwestClient {
        client: reqwest::Client,
    }

    impl ReqwestClient {
        /// Create a new ReqwestClient with default configuration.
        pub fn new() -> Result<Self, reqwest::Error> {
            Self::builder().build()
        }

        pub fn builder() -> ReqwestClientBuilder {
            ReqwestClientBuilder::default()
        }
    }

    /// Connection-level settings for [`ReqwestClient`].
    #[derive(Debug, Clone, Default)]
    pub struct ReqwestClientBuilder {
        connect_timeout: Option<Duration>,
        user_agent: Option<String>,
    }

    impl ReqwestClientBuilder {
        #[must_use]
        pub fn connect_timeout(mut self, timeout: Option<Duration>) -> Self {
            self.connect_timeout = timeout;
            self
        }

        #[must_use]
        pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
            self.user_agent = Some(user_agent.into());
            self
        }

        pub fn build(self) -> Result<ReqwestClient, reqwest::Error> {
            let mut builder = reqwest::Client::builder();
            if let Some(timeout) = self.connect_timeout {
                builder = builder.connect_timeout(timeout);
            }
            if let Some(user_agent) = self.user_agent {
                builder = builder.user_agent(user_agent);
            }
            Ok(ReqwestClient {
                client: builder.build()?,
            })
        }
    }

    impl HttpClient for ReqwestClient {
        type Error = reqwest::Error;

        async fn get(
            &self,
            url: &str,
            headers: &[(String, String)],
        ) -> Result<HttpResponse<Self::Error>, Self::Error> {
            let mut request = self.client.get(url);

            for (key, value) in headers {
                request = request.header(key, value);
            }

            let response = request.send().await?;
            let content_range = response
                .headers()
                .get(CONTENT_RANGE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);

            Ok(HttpResponse {
                status: response.status().as_u16(),
                content_range,
                content_length: response.content_length(),
                body: Box::pin(response.bytes_stream().map(|r| r.map(Bytes::from))),
            })
        }

        async fn head(&self, url: &str) -> Result<Option<u64>, Self::Error> {
            let response = self.client.head(url).send().await?;
            if !response.status().is_success() {
                return Ok(None);
            }
            let content_length = response
                .headers()
                .get(CONTENT_LENGTH)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok());

            Ok(content_length)
        }
    }
}

#[cfg(feature = "reqwest")]
pub use reqwest_impl::{ReqwestClient, ReqwestClientBuilder};
