// Copyright (c) The Wholefile Project Authors.
// Licensed under the MIT License.

//! Writes the same file from each of the four source shapes, then cancels
//! an in-flight write.

use bytesbuf::BytesView;
use bytesbuf::mem::GlobalPool;
use tokio_util::sync::CancellationToken;
use wholefile::{Cancelled, IterSource, ReaderSource, Root, StreamSource, WriteOptions};

fn view(data: &[u8]) -> BytesView {
    BytesView::copied_from_slice(data, &GlobalPool::new())
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let tmp = tempfile::TempDir::new()?;
    let dir = Root::bind(tmp.path()).await?;

    // Fixed buffer.
    dir.write("buffer.txt", view(b"from a buffer")).await?;
    println!("buffer.txt     = {:?}", dir.read_to_string("buffer.txt").await?);

    // Synchronous iterable.
    dir.write_from("iter.txt", IterSource::new(["a", "b", "c"])).await?;
    println!("iter.txt       = {:?}", dir.read_to_string("iter.txt").await?);

    // Byte stream.
    let reader = bytesbuf_io::testing::FakeRead::new(view(b"from a reader"));
    dir.write_from("reader.txt", ReaderSource::new(reader)).await?;
    println!("reader.txt     = {:?}", dir.read_to_string("reader.txt").await?);

    // Asynchronous stream.
    let chunks = futures::stream::iter(vec![Ok(view(b"async ")), Ok(view(b"stream"))]);
    dir.write_from("stream.txt", StreamSource::new(chunks)).await?;
    println!("stream.txt     = {:?}", dir.read_to_string("stream.txt").await?);

    // Append extends rather than replaces.
    dir.append_slice("iter.txt", b"-and-more").await?;
    println!("iter.txt (app) = {:?}", dir.read_to_string("iter.txt").await?);

    // A triggered token rejects the write with a distinct error.
    let token = CancellationToken::new();
    token.cancel();
    let mut options = WriteOptions::new();
    let _ = options.cancel_token(token);
    let err = dir
        .write_from_with("never.txt", view(b"unwritten"), &options)
        .await
        .unwrap_err();
    println!("cancelled      = {} ({err})", Cancelled::caused(&err));

    Ok(())
}
