// Copyright (c) The Wholefile Project Authors.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Asynchronous whole-file write, append, and read.
//!
//! This crate covers the common "replace or extend a whole file" pattern
//! with three properties:
//!
//! 1. **Capability-based access control.** All operations are scoped to a
//!    [`Directory`] capability obtained via [`Root::bind`]. Paths are always
//!    relative to the bound directory, and traversals that would escape it
//!    (such as a leading `/` or `..` above the root) are rejected.
//!
//! 2. **Fully asynchronous.** Every operation is `async`. Blocking
//!    filesystem calls run on a pool of dedicated background threads,
//!    keeping the async executor free.
//!
//! 3. **Pluggable write sources with cancellation.** Streaming writes drain
//!    a [`Source`] of byte chunks: a fixed [`BytesView`](bytesbuf::BytesView)
//!    buffer, a [`bytesbuf_io::Read`] byte stream ([`ReaderSource`]), a
//!    synchronous iterable ([`IterSource`]), or an asynchronous stream
//!    ([`StreamSource`]). A
//!    [`CancellationToken`](tokio_util::sync::CancellationToken) attached
//!    through [`WriteOptions`] stops an in-flight write between chunks,
//!    failing it with a distinct [`Cancelled`] error.
//!
//! # Quick start
//!
//! ```no_run
//! # async fn example() -> std::io::Result<()> {
//! use wholefile::{IterSource, Root};
//!
//! // Bind to a directory — the only place an absolute path is accepted.
//! let dir = Root::bind("/var/data").await?;
//!
//! // Whole-file writes, appends, and reads through the capability.
//! dir.write_slice("greeting.txt", b"Hello").await?;
//! dir.append_slice("greeting.txt", b", world!").await?;
//! let text = dir.read_to_string("greeting.txt").await?;
//! assert_eq!(text, "Hello, world!");
//!
//! // Streaming write from an iterable of chunks.
//! dir.write_from("abc.txt", IterSource::new(["a", "b", "c"])).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Cancellation
//!
//! ```no_run
//! # async fn example() -> std::io::Result<()> {
//! use tokio_util::sync::CancellationToken;
//! use wholefile::{Cancelled, IterSource, Root, WriteOptions};
//!
//! let dir = Root::bind("/var/data").await?;
//! let token = CancellationToken::new();
//!
//! let mut options = WriteOptions::new();
//! let _ = options.cancel_token(token.clone());
//!
//! token.cancel();
//! let err = dir
//!     .write_from_with("big.bin", IterSource::new([b"chunk"]), &options)
//!     .await
//!     .unwrap_err();
//! assert!(Cancelled::caused(&err));
//! # Ok(())
//! # }
//! ```

pub use std::fs::Metadata;

pub use crate::cancel::Cancelled;
pub use crate::directory::Directory;
pub use crate::options::{WriteMode, WriteOptions};
pub use crate::root::Root;
pub use crate::source::{IterSource, ReaderSource, Source, StreamSource};

mod cancel;
mod directory;
mod dispatcher;
mod options;
mod path_utils;
mod root;
mod source;
