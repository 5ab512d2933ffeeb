//! I/O operations for ranged fetching.
//!
//! Network access sits behind the [`HttpClient`] trait so the fan-out and
//! assembly logic in [`RangeFetcher`] can run against in-memory fakes.

mod fetcher;
mod http;
pub mod output;

pub use fetcher::RangeFetcher;
pub use http::{BoxStream, HttpClient, HttpResponse};
#[cfg(feature = "reqwest")]
pub use http::{ReqwestClient, ReqwestClientBuilder};
