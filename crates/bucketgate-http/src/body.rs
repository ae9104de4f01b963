//! Response body type shared by the gateway and operation handlers.
//!
//! [`GatewayBody`] is either a buffered payload (XML error documents, small
//! handler responses) or empty (HEAD responses, 204s). It implements
//! [`http_body::Body`] so hyper can send it directly.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use http_body_util::Full;

/// Buffered or empty response body.
#[derive(Debug, Default)]
pub enum GatewayBody {
    /// A fully buffered payload.
    Buffered(Full<Bytes>),
    /// No payload.
    #[default]
    Empty,
}

impl GatewayBody {
    /// A buffered body from bytes.
    #[must_use]
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        Self::Buffered(Full::new(data.into()))
    }

    /// A buffered body from a string.
    #[must_use]
    pub fn from_string(s: impl Into<String>) -> Self {
        Self::from_bytes(s.into())
    }

    /// An empty body.
    #[must_use]
    pub fn empty() -> Self {
        Self::Empty
    }
}

impl http_body::Body for GatewayBody {
    type Data = Bytes;
    type Error = std::io::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<http_body::Frame<Self::Data>, Self::Error>>> {
        match self.get_mut() {
            Self::Buffered(full) => Pin::new(full)
                .poll_frame(cx)
                .map_err(|never| match never {}),
            Self::Empty => Poll::Ready(None),
        }
    }

    fn is_end_stream(&self) -> bool {
        match self {
            Self::Buffered(full) => full.is_end_stream(),
            Self::Empty => true,
        }
    }

    fn size_hint(&self) -> http_body::SizeHint {
        match self {
            Self::Buffered(full) => full.size_hint(),
            Self::Empty => http_body::SizeHint::with_exact(0),
        }
    }
}
