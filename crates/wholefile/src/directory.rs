// Copyright (c) The Wholefile Project Authors.
// Licensed under the MIT License.

use std::fs::{File, Metadata};
use std::io::{Result, Write as _};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytesbuf::BytesView;
use bytesbuf::mem::GlobalPool;

use crate::cancel::checkpoint;
use crate::dispatcher::Dispatcher;
use crate::options::{WriteMode, WriteOptions};
use crate::path_utils::safe_join;
use crate::source::Source;

/// A capability representing access to a directory on the filesystem.
///
/// All paths used with a `Directory` are relative to the directory it
/// represents. Path components that would escape the directory (such as
/// `..` at the root) are rejected, enforcing capability-based access
/// control.
///
/// Whole-file writes come in three flavors per direction: a buffer write
/// ([`write`](Self::write) / [`append`](Self::append)), a slice convenience
/// ([`write_slice`](Self::write_slice) / [`append_slice`](Self::append_slice)),
/// and a streaming write that drains any [`Source`]
/// ([`write_from`](Self::write_from) / [`append_from`](Self::append_from),
/// with `_with` variants taking [`WriteOptions`]).
#[derive(Debug)]
pub struct Directory {
    base_path: PathBuf,
    dispatcher: Dispatcher,
}

impl Directory {
    pub(crate) const fn new(base_path: PathBuf, dispatcher: Dispatcher) -> Self {
        Self { base_path, dispatcher }
    }

    /// Writes the entire contents of a [`BytesView`] as a file.
    ///
    /// The file is created if missing and truncated if present. The given
    /// `path` is relative to this directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory of the path does not exist,
    /// if the user lacks permissions to write the file, or if any other I/O
    /// error occurs.
    pub async fn write(&self, path: impl AsRef<Path>, mut contents: BytesView) -> Result<()> {
        let full_path = safe_join(&self.base_path, path)?;
        self.dispatcher
            .dispatch(move || {
                let mut file = File::create(&full_path)?;
                while !contents.is_empty() {
                    let slice = contents.first_slice();
                    let len = slice.len();
                    file.write_all(slice)?;
                    contents.advance(len);
                }
                Ok(())
            })
            .await
    }

    /// Writes a byte slice as the entire contents of a file.
    ///
    /// A convenience wrapper around [`write`](Self::write) for callers
    /// working with `&[u8]` data. The given `path` is relative to this
    /// directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory of the path does not exist,
    /// if the user lacks permissions to write the file, or if any other I/O
    /// error occurs.
    pub async fn write_slice(&self, path: impl AsRef<Path>, contents: impl AsRef<[u8]>) -> Result<()> {
        let full_path = safe_join(&self.base_path, path)?;
        let data = contents.as_ref().to_vec();
        self.dispatcher.dispatch(move || std::fs::write(&full_path, &data)).await
    }

    /// Writes a file by draining a [`Source`] chunk by chunk.
    ///
    /// The destination is created if missing and truncated if present; its
    /// final content is the concatenation of every chunk the source yields.
    /// Equivalent to [`write_from_with`](Self::write_from_with) with default
    /// options. The given `path` is relative to this directory.
    ///
    /// # Errors
    ///
    /// Returns an error if opening or writing the destination fails, or if
    /// the source fails while producing a chunk. A source failure leaves
    /// the chunks drained so far on disk.
    pub async fn write_from(&self, path: impl AsRef<Path>, source: impl Source) -> Result<()> {
        self.write_from_with(path, source, &WriteOptions::new()).await
    }

    /// Writes a file by draining a [`Source`], with explicit options.
    ///
    /// The default open mode is [`WriteMode::Truncate`]; `options` can
    /// override it and attach a cancellation token. The token is checked
    /// before the destination is opened and again between chunk writes;
    /// a cancelled write fails with a [`Cancelled`](crate::Cancelled)
    /// error and may leave partial content on disk. The given `path` is
    /// relative to this directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the operation is cancelled, if opening or
    /// writing the destination fails, or if the source fails while
    /// producing a chunk.
    pub async fn write_from_with(
        &self,
        path: impl AsRef<Path>,
        source: impl Source,
        options: &WriteOptions,
    ) -> Result<()> {
        self.drain_to(path.as_ref(), source, options, WriteMode::Truncate).await
    }

    /// Appends the entire contents of a [`BytesView`] to a file.
    ///
    /// The file is created if missing; existing content is kept and the
    /// buffer is written past its end. The given `path` is relative to this
    /// directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory of the path does not exist,
    /// if the user lacks permissions to write the file, or if any other I/O
    /// error occurs.
    pub async fn append(&self, path: impl AsRef<Path>, mut contents: BytesView) -> Result<()> {
        let full_path = safe_join(&self.base_path, path)?;
        self.dispatcher
            .dispatch(move || {
                let mut file = File::options().append(true).create(true).open(&full_path)?;
                while !contents.is_empty() {
                    let slice = contents.first_slice();
                    let len = slice.len();
                    file.write_all(slice)?;
                    contents.advance(len);
                }
                Ok(())
            })
            .await
    }

    /// Appends a byte slice to a file.
    ///
    /// A convenience wrapper around [`append`](Self::append) for callers
    /// working with `&[u8]` data. The given `path` is relative to this
    /// directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory of the path does not exist,
    /// if the user lacks permissions to write the file, or if any other I/O
    /// error occurs.
    pub async fn append_slice(&self, path: impl AsRef<Path>, contents: impl AsRef<[u8]>) -> Result<()> {
        let full_path = safe_join(&self.base_path, path)?;
        let data = contents.as_ref().to_vec();
        self.dispatcher
            .dispatch(move || {
                let mut file = File::options().append(true).create(true).open(&full_path)?;
                file.write_all(&data)
            })
            .await
    }

    /// Appends to a file by draining a [`Source`] chunk by chunk.
    ///
    /// The destination is created if missing; the drained chunks land past
    /// the existing content. Equivalent to
    /// [`append_from_with`](Self::append_from_with) with default options.
    /// The given `path` is relative to this directory.
    ///
    /// # Errors
    ///
    /// Returns an error if opening or writing the destination fails, or if
    /// the source fails while producing a chunk.
    pub async fn append_from(&self, path: impl AsRef<Path>, source: impl Source) -> Result<()> {
        self.append_from_with(path, source, &WriteOptions::new()).await
    }

    /// Appends to a file by draining a [`Source`], with explicit options.
    ///
    /// The default open mode is [`WriteMode::Append`]; setting
    /// [`mode`](WriteOptions::mode) explicitly turns the append into an
    /// overwrite or an atomic create. Cancellation behaves as in
    /// [`write_from_with`](Self::write_from_with). The given `path` is
    /// relative to this directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the operation is cancelled, if opening or
    /// writing the destination fails, or if the source fails while
    /// producing a chunk.
    pub async fn append_from_with(
        &self,
        path: impl AsRef<Path>,
        source: impl Source,
        options: &WriteOptions,
    ) -> Result<()> {
        self.drain_to(path.as_ref(), source, options, WriteMode::Append).await
    }

    async fn drain_to(
        &self,
        path: &Path,
        mut source: impl Source,
        options: &WriteOptions,
        default_mode: WriteMode,
    ) -> Result<()> {
        let full_path = safe_join(&self.base_path, path)?;
        checkpoint(options.token())?;

        let open = options.open_options(default_mode);
        let file = self.dispatcher.dispatch(move || open.open(&full_path)).await?;
        let file = Arc::new(file);

        loop {
            checkpoint(options.token())?;
            let Some(chunk) = source.next_chunk().await? else {
                break;
            };
            if chunk.is_empty() {
                continue;
            }
            let file = Arc::clone(&file);
            self.dispatcher.dispatch(move || write_chunk(&file, chunk)).await?;
        }
        Ok(())
    }

    /// Reads the entire contents of a file into a [`BytesView`].
    ///
    /// The returned view is backed by pooled memory. The given `path` is
    /// relative to this directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist, if the user lacks
    /// permissions to read it, or if any other I/O error occurs.
    pub async fn read(&self, path: impl AsRef<Path>) -> Result<BytesView> {
        let full_path = safe_join(&self.base_path, path)?;
        self.dispatcher
            .dispatch(move || {
                let data = std::fs::read(&full_path)?;
                Ok(BytesView::copied_from_slice(&data, &GlobalPool::new()))
            })
            .await
    }

    /// Reads the entire contents of a file into a string.
    ///
    /// The given `path` is relative to this directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist, if the user lacks
    /// permissions to read it, if the file's contents are not valid UTF-8,
    /// or if any other I/O error occurs.
    pub async fn read_to_string(&self, path: impl AsRef<Path>) -> Result<String> {
        let full_path = safe_join(&self.base_path, path)?;
        self.dispatcher.dispatch(move || std::fs::read_to_string(&full_path)).await
    }

    /// Returns `Ok(true)` if the path points at an existing entity.
    ///
    /// Traverses symbolic links to query the destination. The given `path`
    /// is relative to this directory.
    ///
    /// # Errors
    ///
    /// Returns an error only on I/O failures unrelated to whether the path
    /// exists.
    pub async fn exists(&self, path: impl AsRef<Path>) -> Result<bool> {
        let full_path = safe_join(&self.base_path, path)?;
        self.dispatcher.dispatch(move || full_path.try_exists()).await
    }

    /// Queries the filesystem for metadata about a file or directory.
    ///
    /// Traverses symbolic links. The given `path` is relative to this
    /// directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the path does not exist, if the user lacks
    /// permissions to query metadata, or if any other I/O error occurs.
    pub async fn metadata(&self, path: impl AsRef<Path>) -> Result<Metadata> {
        let full_path = safe_join(&self.base_path, path)?;
        self.dispatcher.dispatch(move || std::fs::metadata(&full_path)).await
    }

    /// Removes a file from the filesystem.
    ///
    /// There is no guarantee that the file is immediately deleted. The
    /// given `path` is relative to this directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the path does not exist, if the user lacks
    /// permissions to remove the file, or if any other I/O error occurs.
    pub async fn remove_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let full_path = safe_join(&self.base_path, path)?;
        self.dispatcher.dispatch(move || std::fs::remove_file(&full_path)).await
    }

    /// Recursively creates a directory and all missing parent components.
    ///
    /// Succeeds if the full directory path already exists. The given `path`
    /// is relative to this directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the user lacks permissions to create any of the
    /// directories, or if any other I/O error occurs.
    pub async fn create_dir_all(&self, path: impl AsRef<Path>) -> Result<()> {
        let full_path = safe_join(&self.base_path, path)?;
        self.dispatcher.dispatch(move || std::fs::create_dir_all(&full_path)).await
    }
}

/// Writes one drained chunk through a shared handle.
///
/// `&File` implements [`Write`](std::io::Write), so concurrent-capable
/// handles need no lock; the streaming loop dispatches chunks one at a
/// time anyway.
fn write_chunk(file: &File, mut chunk: BytesView) -> Result<()> {
    let mut file = file;
    while !chunk.is_empty() {
        let slice = chunk.first_slice();
        let len = slice.len();
        file.write_all(slice)?;
        chunk.advance(len);
    }
    Ok(())
}
