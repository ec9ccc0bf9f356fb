// Copyright (c) The Wholefile Project Authors.
// Licensed under the MIT License.

use tokio_util::sync::CancellationToken;

/// How the destination file is opened for a write operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteMode {
    /// Create the file if missing, truncate it if present. The default for
    /// write operations.
    Truncate,
    /// Create the file if missing, keep existing content and write past its
    /// end. The default for append operations.
    Append,
    /// Atomically create the file, failing with
    /// [`AlreadyExists`](std::io::ErrorKind::AlreadyExists) if it is
    /// already present. Atomic creation avoids TOCTOU races between an
    /// existence check and the create.
    CreateNew,
}

/// Options configuring a streaming write or append.
///
/// The builder mirrors [`std::fs::OpenOptions`]: construct with
/// [`WriteOptions::new`], chain setters, then pass the result to
/// [`Directory::write_from_with`](crate::Directory::write_from_with) or
/// [`Directory::append_from_with`](crate::Directory::append_from_with).
///
/// ```no_run
/// # async fn example(dir: &wholefile::Directory) -> std::io::Result<()> {
/// use tokio_util::sync::CancellationToken;
/// use wholefile::{IterSource, WriteMode, WriteOptions};
///
/// let token = CancellationToken::new();
/// dir.write_from_with(
///     "log.txt",
///     IterSource::new(["one\n", "two\n"]),
///     WriteOptions::new().mode(WriteMode::Append).cancel_token(token.clone()),
/// )
/// .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct WriteOptions {
    mode: Option<WriteMode>,
    cancel: Option<CancellationToken>,
}

impl WriteOptions {
    /// Creates options with the operation's default open mode and no
    /// cancellation token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides how the destination file is opened.
    ///
    /// Without an override, write operations open with
    /// [`WriteMode::Truncate`] and append operations with
    /// [`WriteMode::Append`]. Setting a mode explicitly turns an append
    /// call into an overwrite and vice versa.
    pub fn mode(&mut self, mode: WriteMode) -> &mut Self {
        self.mode = Some(mode);
        self
    }

    /// Attaches a one-shot cancellation token.
    ///
    /// Once [`cancel()`](CancellationToken::cancel) is called on the token
    /// (or any clone of it), the operation fails with a
    /// [`Cancelled`](crate::Cancelled) error at its next checkpoint:
    /// before the destination is opened, or between chunk writes. Content
    /// already written stays on disk.
    pub fn cancel_token(&mut self, token: CancellationToken) -> &mut Self {
        self.cancel = Some(token);
        self
    }

    /// Returns whether the attached cancellation token has been triggered.
    ///
    /// Always `false` when no token is attached.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled)
    }

    pub(crate) fn token(&self) -> Option<&CancellationToken> {
        self.cancel.as_ref()
    }

    pub(crate) fn mode_or(&self, default: WriteMode) -> WriteMode {
        self.mode.unwrap_or(default)
    }

    /// Maps the effective write mode onto the standard open flags.
    pub(crate) fn open_options(&self, default: WriteMode) -> std::fs::OpenOptions {
        let mut opts = std::fs::OpenOptions::new();
        let _ = opts.write(true);
        let _ = match self.mode_or(default) {
            WriteMode::Truncate => opts.create(true).truncate(true),
            WriteMode::Append => opts.create(true).append(true),
            WriteMode::CreateNew => opts.create_new(true),
        };
        opts
    }
}
