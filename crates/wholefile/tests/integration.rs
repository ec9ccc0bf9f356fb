// Copyright (c) The Wholefile Project Authors.
// Licensed under the MIT License.

#![allow(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
#![allow(clippy::missing_panics_doc, reason = "Tests")]
#![allow(clippy::missing_errors_doc, reason = "Tests")]
#![allow(unused_results, reason = "Tests")]
#![allow(clippy::must_use_candidate, reason = "Tests")]
#![allow(missing_docs, reason = "Tests")]
#![allow(clippy::assertions_on_result_states, reason = "Tests use assert!(x.is_err()) for clarity")]
#![allow(clippy::std_instead_of_core, reason = "Tests prefer std imports")]

use std::io::ErrorKind;
use std::num::NonZero;
use std::sync::atomic::{AtomicUsize, Ordering};

use bytesbuf::BytesView;
use bytesbuf::mem::GlobalPool;
use bytesbuf_io::testing::FakeRead;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wholefile::{Cancelled, IterSource, ReaderSource, Root, StreamSource, WriteMode, WriteOptions};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn setup() -> (TempDir, wholefile::Directory) {
    let tmp = TempDir::new().unwrap();
    let dir = Root::bind(tmp.path()).await.unwrap();
    (tmp, dir)
}

fn make_view(data: &[u8]) -> BytesView {
    let mem = GlobalPool::new();
    let mut buf = mem.reserve(data.len());
    buf.put_slice(data);
    buf.consume_all()
}

fn collect(mut view: BytesView) -> Vec<u8> {
    let mut out = Vec::new();
    while !view.is_empty() {
        let s = view.first_slice();
        out.extend_from_slice(s);
        let len = s.len();
        view.advance(len);
    }
    out
}

// ===========================================================================
// Root tests
// ===========================================================================

mod root {
    use super::*;

    #[tokio::test]
    async fn bind_to_valid_directory_succeeds() {
        let tmp = TempDir::new().unwrap();
        let _dir = Root::bind(tmp.path()).await.unwrap();
    }

    #[tokio::test]
    async fn bind_to_non_existent_path_fails() {
        let result = Root::bind("/tmp/__nonexistent_path_12345__").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn bind_to_file_fails() {
        let tmp = TempDir::new().unwrap();
        let file_path = tmp.path().join("a_file.txt");
        std::fs::write(&file_path, b"hello").unwrap();
        let result = Root::bind(&file_path).await;
        assert!(result.is_err());
    }
}

// ===========================================================================
// Buffer write tests
// ===========================================================================

mod buffer_writes {
    use super::*;

    #[tokio::test]
    async fn written_buffer_reads_back_exactly() {
        let (tmp, dir) = setup().await;
        let expected = "abc".repeat(1000);
        dir.write("dest.txt", make_view(expected.as_bytes())).await.unwrap();

        let on_disk = std::fs::read(tmp.path().join("dest.txt")).unwrap();
        assert_eq!(on_disk, expected.as_bytes());
    }

    #[tokio::test]
    async fn write_truncates_existing_content() {
        let (_tmp, dir) = setup().await;
        dir.write_slice("dest.txt", b"a long initial payload").await.unwrap();
        dir.write("dest.txt", make_view(b"short")).await.unwrap();
        assert_eq!(dir.read_to_string("dest.txt").await.unwrap(), "short");
    }

    #[tokio::test]
    async fn write_slice_and_read_round_trip() {
        let (_tmp, dir) = setup().await;
        dir.write_slice("data.txt", b"slice data").await.unwrap();
        assert_eq!(dir.read_to_string("data.txt").await.unwrap(), "slice data");
    }

    #[tokio::test]
    async fn empty_buffer_writes_empty_file() {
        let (_tmp, dir) = setup().await;
        dir.write("empty.bin", BytesView::default()).await.unwrap();
        assert_eq!(dir.metadata("empty.bin").await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn large_buffer_round_trips() {
        let (tmp, dir) = setup().await;
        let payload: Vec<u8> = (0..1_048_576u32).map(|i| (i % 251) as u8).collect();
        dir.write("big.bin", make_view(&payload)).await.unwrap();
        assert_eq!(std::fs::read(tmp.path().join("big.bin")).unwrap(), payload);
    }
}

// ===========================================================================
// Append tests
// ===========================================================================

mod appends {
    use super::*;

    #[tokio::test]
    async fn append_after_write_concatenates() {
        let (tmp, dir) = setup().await;
        let first = "abc".repeat(1000);
        let second = "xyz".repeat(1000);
        dir.write("dest.txt", make_view(first.as_bytes())).await.unwrap();
        dir.append("dest.txt", make_view(second.as_bytes())).await.unwrap();

        let on_disk = std::fs::read_to_string(tmp.path().join("dest.txt")).unwrap();
        assert_eq!(on_disk, format!("{first}{second}"));
    }

    #[tokio::test]
    async fn append_creates_missing_file() {
        let (_tmp, dir) = setup().await;
        dir.append("fresh.txt", make_view(b"created by append")).await.unwrap();
        assert_eq!(dir.read_to_string("fresh.txt").await.unwrap(), "created by append");
    }

    #[tokio::test]
    async fn append_slice_concatenates() {
        let (_tmp, dir) = setup().await;
        dir.write_slice("log.txt", b"one\n").await.unwrap();
        dir.append_slice("log.txt", b"two\n").await.unwrap();
        assert_eq!(dir.read_to_string("log.txt").await.unwrap(), "one\ntwo\n");
    }

    #[tokio::test]
    async fn append_from_drains_source_past_existing_content() {
        let (_tmp, dir) = setup().await;
        dir.write_slice("dest.txt", b"head-").await.unwrap();
        dir.append_from("dest.txt", IterSource::new(["tail1", "tail2"])).await.unwrap();
        assert_eq!(dir.read_to_string("dest.txt").await.unwrap(), "head-tail1tail2");
    }

    #[tokio::test]
    async fn truncate_override_turns_append_into_overwrite() {
        let (_tmp, dir) = setup().await;
        dir.write_slice("dest.txt", b"old content").await.unwrap();

        let mut options = WriteOptions::new();
        options.mode(WriteMode::Truncate);
        dir.append_from_with("dest.txt", IterSource::new(["new"]), &options)
            .await
            .unwrap();
        assert_eq!(dir.read_to_string("dest.txt").await.unwrap(), "new");
    }
}

// ===========================================================================
// Readback tests
// ===========================================================================

mod readback {
    use super::*;

    #[tokio::test]
    async fn read_matches_std_fs_read() {
        let (tmp, dir) = setup().await;
        let expected = "abc".repeat(1000);
        dir.write_slice("dest.txt", expected.as_bytes()).await.unwrap();

        let view = dir.read("dest.txt").await.unwrap();
        assert_eq!(collect(view), std::fs::read(tmp.path().join("dest.txt")).unwrap());
    }

    #[tokio::test]
    async fn read_to_string_matches_std_fs_read_to_string() {
        let (tmp, dir) = setup().await;
        dir.write_slice("dest.txt", "déjà vu".as_bytes()).await.unwrap();

        let text = dir.read_to_string("dest.txt").await.unwrap();
        assert_eq!(text, std::fs::read_to_string(tmp.path().join("dest.txt")).unwrap());
    }

    #[tokio::test]
    async fn read_to_string_rejects_invalid_utf8() {
        let (_tmp, dir) = setup().await;
        dir.write_slice("bad.bin", &[0xFF, 0xFE, 0x80]).await.unwrap();
        let err = dir.read_to_string("bad.bin").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
    }

    #[tokio::test]
    async fn read_missing_file_fails() {
        let (_tmp, dir) = setup().await;
        let err = dir.read("nope.txt").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}

// ===========================================================================
// Source shape tests
// ===========================================================================

mod sources {
    use super::*;

    #[tokio::test]
    async fn write_from_buffer_source() {
        let (_tmp, dir) = setup().await;
        dir.write_from("dest.txt", make_view(b"buffered")).await.unwrap();
        assert_eq!(dir.read_to_string("dest.txt").await.unwrap(), "buffered");
    }

    #[tokio::test]
    async fn write_from_byte_stream() {
        let (_tmp, dir) = setup().await;
        let reader = FakeRead::builder()
            .contents(make_view(b"streamed through a reader"))
            .max_read_size(NonZero::new(4).unwrap())
            .build();
        dir.write_from("dest.txt", ReaderSource::new(reader)).await.unwrap();
        assert_eq!(dir.read_to_string("dest.txt").await.unwrap(), "streamed through a reader");
    }

    #[tokio::test]
    async fn write_from_sync_iterable() {
        let (_tmp, dir) = setup().await;
        dir.write_from("dest.txt", IterSource::new(["a", "b", "c"])).await.unwrap();
        assert_eq!(dir.read_to_string("dest.txt").await.unwrap(), "abc");
    }

    #[tokio::test]
    async fn write_from_async_iterable() {
        let (_tmp, dir) = setup().await;
        let stream = futures::stream::iter(vec![Ok(make_view(b"a")), Ok(make_view(b"b")), Ok(make_view(b"c"))]);
        dir.write_from("dest.txt", StreamSource::new(stream)).await.unwrap();
        assert_eq!(dir.read_to_string("dest.txt").await.unwrap(), "abc");
    }

    #[tokio::test]
    async fn empty_iterable_writes_empty_file() {
        let (_tmp, dir) = setup().await;
        dir.write_from("empty.txt", IterSource::new(std::iter::empty::<&[u8]>()))
            .await
            .unwrap();
        assert_eq!(dir.metadata("empty.txt").await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn source_error_aborts_the_write() {
        let (_tmp, dir) = setup().await;
        let stream = futures::stream::iter(vec![
            Ok(make_view(b"partial")),
            Err(std::io::Error::other("producer failed")),
        ]);
        let err = dir.write_from("dest.txt", StreamSource::new(stream)).await.unwrap_err();
        assert!(!Cancelled::caused(&err));

        // Chunks drained before the failure stay on disk.
        assert_eq!(dir.read_to_string("dest.txt").await.unwrap(), "partial");
    }
}

// ===========================================================================
// Cancellation tests
// ===========================================================================

mod cancellation {
    use super::*;

    #[tokio::test]
    async fn pre_cancelled_write_rejects_without_touching_disk() {
        let (_tmp, dir) = setup().await;
        let token = CancellationToken::new();
        token.cancel();

        let mut options = WriteOptions::new();
        options.cancel_token(token);
        let err = dir
            .write_from_with("dest.txt", make_view(b"never written"), &options)
            .await
            .unwrap_err();

        assert!(Cancelled::caused(&err));
        assert_eq!(err.kind(), ErrorKind::Interrupted);
        assert!(!dir.exists("dest.txt").await.unwrap());
    }

    #[tokio::test]
    async fn mid_stream_cancel_stops_between_chunks() {
        let (_tmp, dir) = setup().await;
        let token = CancellationToken::new();

        // The source trips the token while producing its first chunk; the
        // chunk is still written, and the checkpoint before the next pull
        // observes the cancellation.
        let produced = AtomicUsize::new(0);
        let trip = token.clone();
        let source = IterSource::new(std::iter::from_fn(move || {
            let n = produced.fetch_add(1, Ordering::Relaxed);
            if n == 0 {
                trip.cancel();
                Some("first")
            } else {
                Some("rest")
            }
        }));

        let mut options = WriteOptions::new();
        options.cancel_token(token);
        let err = dir.write_from_with("dest.txt", source, &options).await.unwrap_err();

        assert!(Cancelled::caused(&err));
        assert_eq!(dir.read_to_string("dest.txt").await.unwrap(), "first");
    }

    #[tokio::test]
    async fn pre_cancelled_append_rejects() {
        let (_tmp, dir) = setup().await;
        dir.write_slice("dest.txt", b"kept").await.unwrap();

        let token = CancellationToken::new();
        token.cancel();
        let mut options = WriteOptions::new();
        options.cancel_token(token);

        let err = dir
            .append_from_with("dest.txt", make_view(b"dropped"), &options)
            .await
            .unwrap_err();
        assert!(Cancelled::caused(&err));
        assert_eq!(dir.read_to_string("dest.txt").await.unwrap(), "kept");
    }

    #[tokio::test]
    async fn untriggered_token_does_not_interfere() {
        let (_tmp, dir) = setup().await;
        let token = CancellationToken::new();
        let mut options = WriteOptions::new();
        options.cancel_token(token);

        dir.write_from_with("dest.txt", make_view(b"payload"), &options)
            .await
            .unwrap();
        assert_eq!(dir.read_to_string("dest.txt").await.unwrap(), "payload");
    }

    #[tokio::test]
    async fn concurrent_write_is_unaffected_by_a_cancelled_sibling() {
        let (_tmp, dir) = setup().await;
        let token = CancellationToken::new();
        token.cancel();
        let mut options = WriteOptions::new();
        options.cancel_token(token);

        let expected = "abc".repeat(1000);
        let (kept, cancelled) = tokio::join!(
            dir.write("kept.txt", make_view(expected.as_bytes())),
            dir.write_from_with("other.txt", make_view(b"doomed"), &options),
        );

        kept.unwrap();
        assert!(Cancelled::caused(&cancelled.unwrap_err()));
        assert_eq!(dir.read_to_string("kept.txt").await.unwrap(), expected);
    }
}

// ===========================================================================
// Path safety tests
// ===========================================================================

mod path_safety {
    use super::*;

    #[tokio::test]
    async fn dotdot_escape_is_rejected() {
        let (_tmp, dir) = setup().await;
        let err = dir.write_slice("../escape.txt", b"nope").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn absolute_path_is_rejected() {
        let (_tmp, dir) = setup().await;
        let err = dir.read("/etc/passwd").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn balanced_dotdot_is_allowed() {
        let (_tmp, dir) = setup().await;
        dir.create_dir_all("sub").await.unwrap();
        dir.write_slice("sub/../rooted.txt", b"ok").await.unwrap();
        assert!(dir.exists("rooted.txt").await.unwrap());
    }
}

// ===========================================================================
// Working area tests
// ===========================================================================

mod working_area {
    use super::*;

    #[tokio::test]
    async fn exists_false_for_nonexistent() {
        let (_tmp, dir) = setup().await;
        assert!(!dir.exists("nope.txt").await.unwrap());
    }

    #[tokio::test]
    async fn metadata_returns_info() {
        let (_tmp, dir) = setup().await;
        dir.write_slice("m.txt", b"12345").await.unwrap();
        let md = dir.metadata("m.txt").await.unwrap();
        assert!(md.is_file());
        assert_eq!(md.len(), 5);
    }

    #[tokio::test]
    async fn remove_file_works() {
        let (_tmp, dir) = setup().await;
        dir.write_slice("delete_me.txt", b"bye").await.unwrap();
        assert!(dir.exists("delete_me.txt").await.unwrap());
        dir.remove_file("delete_me.txt").await.unwrap();
        assert!(!dir.exists("delete_me.txt").await.unwrap());
    }

    #[tokio::test]
    async fn create_dir_all_nested() {
        let (_tmp, dir) = setup().await;
        dir.create_dir_all("a/b/c").await.unwrap();
        assert!(dir.exists("a/b/c").await.unwrap());
        dir.write_slice("a/b/c/leaf.txt", b"nested").await.unwrap();
        assert_eq!(dir.read_to_string("a/b/c/leaf.txt").await.unwrap(), "nested");
    }
}

// ===========================================================================
// Write option tests
// ===========================================================================

mod options {
    use super::*;

    #[tokio::test]
    async fn create_new_fails_on_existing_file() {
        let (_tmp, dir) = setup().await;
        dir.write_slice("dest.txt", b"already here").await.unwrap();

        let mut opts = WriteOptions::new();
        opts.mode(WriteMode::CreateNew);
        let err = dir
            .write_from_with("dest.txt", make_view(b"clobber"), &opts)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        assert_eq!(dir.read_to_string("dest.txt").await.unwrap(), "already here");
    }

    #[tokio::test]
    async fn create_new_succeeds_on_fresh_path() {
        let (_tmp, dir) = setup().await;
        let mut opts = WriteOptions::new();
        opts.mode(WriteMode::CreateNew);
        dir.write_from_with("fresh.txt", make_view(b"first"), &opts).await.unwrap();
        assert_eq!(dir.read_to_string("fresh.txt").await.unwrap(), "first");
    }

    #[tokio::test]
    async fn append_mode_on_write_from_with_extends() {
        let (_tmp, dir) = setup().await;
        dir.write_slice("dest.txt", b"head-").await.unwrap();

        let mut opts = WriteOptions::new();
        opts.mode(WriteMode::Append);
        dir.write_from_with("dest.txt", make_view(b"tail"), &opts).await.unwrap();
        assert_eq!(dir.read_to_string("dest.txt").await.unwrap(), "head-tail");
    }
}
