#![forbid(unsafe_code)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Network transport for chunkfeed.
//!
//! The transport never retries and never interprets status codes beyond
//! surfacing them: a non-2xx answer becomes [`NetError::HttpError`] carrying
//! the status so callers can tell "not found" from "server broke".

mod client;
mod error;
mod timeout;
mod traits;
mod types;

pub use crate::{
    client::HttpClient,
    error::{NetError, NetResult},
    timeout::TimeoutNet,
    traits::{Net, NetExt},
    types::{Headers, NetOptions},
};
