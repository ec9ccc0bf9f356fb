// Copyright (c) The Wholefile Project Authors.
// Licensed under the MIT License.

use core::fmt;
use std::io::{Error, Result};

use bytesbuf::BytesView;
use bytesbuf::mem::GlobalPool;
use futures_core::Stream;
use futures_util::StreamExt as _;

/// A pull-based supplier of byte chunks for streaming writes.
///
/// [`Directory::write_from`](crate::Directory::write_from) and its append
/// counterpart drain a `Source` chunk by chunk until it yields `None`,
/// writing each chunk to the destination before pulling the next. The
/// destination file's final content is the concatenation of every yielded
/// chunk.
///
/// Four shapes ship with the crate:
///
/// | Shape | Type |
/// |-------|------|
/// | Fixed buffer | [`BytesView`] itself |
/// | Byte stream | [`ReaderSource`] over any [`bytesbuf_io::Read`] |
/// | Synchronous iterable | [`IterSource`] over any `Iterator` of byte chunks |
/// | Asynchronous iterable | [`StreamSource`] over any [`Stream`] of byte chunks |
///
/// # Thread safety
///
/// This trait requires `Send` from both the implementation and any returned
/// futures, so sources can be driven from multi-threaded executors.
#[trait_variant::make(Send)]
pub trait Source {
    /// Pulls the next chunk, or `None` once the source is drained.
    ///
    /// An empty chunk is valid and distinct from `None`; it contributes no
    /// bytes and draining continues.
    ///
    /// # Errors
    ///
    /// Returns an error if producing the next chunk fails; the surrounding
    /// write settles into that error.
    async fn next_chunk(&mut self) -> Result<Option<BytesView>>;
}

/// A fixed buffer is a source that yields itself once.
impl Source for BytesView {
    async fn next_chunk(&mut self) -> Result<Option<BytesView>> {
        if self.is_empty() {
            return Ok(None);
        }
        Ok(Some(core::mem::take(self)))
    }
}

/// Adapts a [`bytesbuf_io::Read`] byte stream into a [`Source`].
///
/// Chunks are pulled with [`read_any`](bytesbuf_io::Read::read_any), letting
/// the underlying stream pick its preferred transfer size. A read that
/// appends zero bytes marks the end of the stream.
pub struct ReaderSource<R> {
    reader: R,
}

impl<R: bytesbuf_io::Read> ReaderSource<R> {
    /// Wraps a byte stream so it can feed a streaming write.
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Releases the wrapped byte stream.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: bytesbuf_io::Read> Source for ReaderSource<R> {
    async fn next_chunk(&mut self) -> Result<Option<BytesView>> {
        let mut buf = self.reader.read_any().await.map_err(Error::other)?;
        if buf.is_empty() {
            return Ok(None);
        }
        Ok(Some(buf.consume_all()))
    }
}

impl<R: fmt::Debug> fmt::Debug for ReaderSource<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReaderSource").field("reader", &self.reader).finish()
    }
}

/// Adapts a synchronous iterator of byte chunks into a [`Source`].
///
/// Each yielded item is copied into a pooled buffer; items can be string
/// slices, byte slices, vectors, or anything else that exposes bytes.
///
/// ```no_run
/// # async fn example(dir: &wholefile::Directory) -> std::io::Result<()> {
/// use wholefile::IterSource;
///
/// dir.write_from("abc.txt", IterSource::new(["a", "b", "c"])).await?;
/// # Ok(())
/// # }
/// ```
pub struct IterSource<I> {
    iter: I,
    memory: GlobalPool,
}

impl<I: Iterator> IterSource<I>
where
    I::Item: AsRef<[u8]>,
{
    /// Wraps an iterable of byte chunks.
    pub fn new(iter: impl IntoIterator<IntoIter = I>) -> Self {
        Self {
            iter: iter.into_iter(),
            memory: GlobalPool::new(),
        }
    }
}

impl<I> Source for IterSource<I>
where
    I: Iterator + Send,
    I::Item: AsRef<[u8]>,
{
    async fn next_chunk(&mut self) -> Result<Option<BytesView>> {
        Ok(self
            .iter
            .next()
            .map(|chunk| BytesView::copied_from_slice(chunk.as_ref(), &self.memory)))
    }
}

impl<I> fmt::Debug for IterSource<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IterSource").finish_non_exhaustive()
    }
}

/// Adapts an asynchronous stream of byte chunks into a [`Source`].
///
/// The stream yields `Result` items so producers can fail mid-stream; the
/// first error aborts the surrounding write.
pub struct StreamSource<S> {
    stream: S,
}

impl<S> StreamSource<S>
where
    S: Stream<Item = Result<BytesView>> + Unpin,
{
    /// Wraps an asynchronous chunk stream.
    pub fn new(stream: S) -> Self {
        Self { stream }
    }
}

impl<S> Source for StreamSource<S>
where
    S: Stream<Item = Result<BytesView>> + Unpin + Send,
{
    async fn next_chunk(&mut self) -> Result<Option<BytesView>> {
        self.stream.next().await.transpose()
    }
}

impl<S> fmt::Debug for StreamSource<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamSource").finish_non_exhaustive()
    }
}
