// Copyright (c) The Wholefile Project Authors.
// Licensed under the MIT License.

use core::fmt;
use std::io::{Error, ErrorKind, Result};

use tokio_util::sync::CancellationToken;

/// The error carried by an operation that observed a triggered
/// cancellation token before completing.
///
/// A cancelled operation settles into an [`std::io::Error`] of kind
/// [`ErrorKind::Interrupted`] whose payload is this type, so callers can
/// tell cancellation apart from ordinary I/O failures:
///
/// ```no_run
/// # async fn example() -> std::io::Result<()> {
/// use tokio_util::sync::CancellationToken;
/// use wholefile::{Cancelled, Root, WriteOptions};
///
/// let dir = Root::bind("/var/data").await?;
/// let token = CancellationToken::new();
/// token.cancel();
///
/// let err = dir
///     .write_from_with("out.txt", bytesbuf::BytesView::default(), WriteOptions::new().cancel_token(token))
///     .await
///     .unwrap_err();
/// assert!(Cancelled::caused(&err));
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cancelled;

impl Cancelled {
    /// Returns whether `err` was produced by a triggered cancellation token.
    #[must_use]
    pub fn caused(err: &Error) -> bool {
        err.get_ref().is_some_and(|inner| inner.is::<Self>())
    }

    pub(crate) fn into_io_error(self) -> Error {
        Error::new(ErrorKind::Interrupted, self)
    }
}

impl fmt::Display for Cancelled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("the operation was cancelled")
    }
}

impl std::error::Error for Cancelled {}

/// Fails with a [`Cancelled`] error if the token has been triggered.
///
/// Called at operation start and between chunk writes; a blocking write of
/// a single chunk that is already on a worker thread is not interrupted.
pub(crate) fn checkpoint(token: Option<&CancellationToken>) -> Result<()> {
    if token.is_some_and(CancellationToken::is_cancelled) {
        return Err(Cancelled.into_io_error());
    }
    Ok(())
}
