use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use bytes::Bytes;
use url::Url;

use crate::{error::NetError, timeout::TimeoutNet, types::Headers};

#[async_trait]
pub trait Net: Send + Sync {
    /// Get all bytes from a URL.
    ///
    /// Any non-2xx status is returned as [`NetError::HttpError`].
    async fn get_bytes(&self, url: Url, headers: Option<Headers>) -> Result<Bytes, NetError>;
}

#[async_trait]
impl<N: Net + ?Sized> Net for Arc<N> {
    async fn get_bytes(&self, url: Url, headers: Option<Headers>) -> Result<Bytes, NetError> {
        (**self).get_bytes(url, headers).await
    }
}

pub trait NetExt: Net + Sized {
    /// Add timeout layer
    fn with_timeout(self, timeout: Duration) -> TimeoutNet<Self> {
        TimeoutNet::new(self, timeout)
    }
}

impl<T: Net> NetExt for T {}
