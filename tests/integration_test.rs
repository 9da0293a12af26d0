//! Integration tests for purefunc.

#![allow(clippy::expect_used)]

use parking_lot::Mutex;
use purefunc::context::Context;
#[cfg(feature = "sqlite")]
use purefunc::driver::{Conn, Driver, Rows, Stmt, Tx, Value, sqlite_driver};
use purefunc::fs::{FileSystem, FsFunc, read_file};
use purefunc::http::{
    ChainConfig, HandlerFunc, Request, ResponseRecorder, ResponseWriter, RoundTripper,
    RoundTripperFunc,
};
use purefunc::io::{
    BoxWriter, ReadFunc, ReadOutcome, ReadStatus, WriteFunc, WriteMetrics, tee_writer,
};
use purefunc::value::{ErrorFunc, StringerFunc};
use std::io::{Cursor, Read, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

/// Source that serves `data` in one chunk and reports end of stream with it.
fn bytes_source(data: &'static [u8]) -> ReadFunc {
    let mut served = false;
    ReadFunc::new(move |buf: &mut [u8]| {
        if served {
            return ReadOutcome::eof(0);
        }
        served = true;
        let n = data.len().min(buf.len());
        buf[..n].copy_from_slice(&data[..n]);
        ReadOutcome::eof(n)
    })
}

fn shared_sink() -> (WriteFunc, Arc<Mutex<Vec<u8>>>) {
    let store = Arc::new(Mutex::new(Vec::new()));
    (WriteFunc::from_shared(Arc::clone(&store)), store)
}

#[test]
fn test_uppercase_source_single_read() {
    let mut reader = bytes_source(b"hello world").map(<[u8]>::to_ascii_uppercase);
    let mut buf = [0u8; 100];
    let outcome = reader.read_chunk(&mut buf);
    assert_eq!(outcome.n, 11);
    assert_eq!(outcome.status, ReadStatus::Eof);
    assert_eq!(&buf[..outcome.n], b"HELLO WORLD");
}

#[test]
fn test_auth_chain_rejects_and_accepts() {
    let handler = HandlerFunc::new(|w: &mut dyn ResponseWriter, _: &Request| {
        let _ = w.write(b"Hello!");
    })
    .with_auth(|req| req.header("authorization") == Some("Bearer secret"));

    let mut denied = ResponseRecorder::new();
    handler.serve(&mut denied, &Request::get("/").expect("request"));
    assert_eq!(denied.status().as_u16(), 401);
    assert_eq!(denied.body_string(), "Unauthorized\n");

    let req = Request::get("/")
        .expect("request")
        .with_header("authorization", "Bearer secret")
        .expect("header");
    let mut allowed = ResponseRecorder::new();
    handler.serve(&mut allowed, &req);
    assert_eq!(allowed.status().as_u16(), 200);
    assert_eq!(allowed.body_string(), "Hello!");
}

#[test]
fn test_slow_handler_times_out() {
    let handler = HandlerFunc::new(|w: &mut dyn ResponseWriter, _: &Request| {
        thread::sleep(Duration::from_millis(100));
        let _ = w.write(b"finally");
    })
    .with_timeout(Duration::from_millis(50));

    let mut rec = ResponseRecorder::new();
    handler.serve(&mut rec, &Request::get("/slow").expect("request"));
    assert_eq!(rec.status().as_u16(), 408);
    assert_eq!(rec.body_string(), "Request timeout\n");
}

#[test]
fn test_stringer_composition() {
    let full = StringerFunc::constant("John")
        .with_suffix(" ")
        .compose(StringerFunc::constant("Doe"));
    assert_eq!(full.to_string(), "John Doe");
}

#[test]
fn test_empty_source_is_compose_identity() {
    let mut left = ReadFunc::empty().compose(bytes_source(b"payload"));
    let mut right = bytes_source(b"payload").compose(ReadFunc::empty());
    let mut a = Vec::new();
    let mut b = Vec::new();
    left.read_to_end(&mut a).expect("left read");
    right.read_to_end(&mut b).expect("right read");
    assert_eq!(a, b"payload");
    assert_eq!(b, b"payload");
}

#[test]
fn test_compose_keeps_bytes_returned_with_eof() {
    let mut joined = bytes_source(b"foo").compose(bytes_source(b"bar"));
    let mut out = String::new();
    joined.read_to_string(&mut out).expect("read");
    assert_eq!(out, "foobar");
}

#[test]
fn test_retry_recovers_after_transient_failures() {
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&calls);
    let mut reader = ReadFunc::new(move |buf: &mut [u8]| {
        if seen.fetch_add(1, Ordering::SeqCst) < 2 {
            return ReadOutcome::failed(purefunc::error::StreamError::failed("transient"));
        }
        buf[0] = b'!';
        ReadOutcome::eof(1)
    })
    .retry(3);
    let mut buf = [0u8; 4];
    assert_eq!(reader.read_chunk(&mut buf), ReadOutcome::eof(1));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[test]
fn test_source_timeout_reports_timeout() {
    let mut reader = ReadFunc::new(|buf: &mut [u8]| {
        thread::sleep(Duration::from_millis(200));
        buf[0] = 1;
        ReadOutcome::more(1)
    })
    .with_timeout(Duration::from_millis(20));
    let start = Instant::now();
    let mut buf = [0u8; 8];
    let outcome = reader.read_chunk(&mut buf);
    assert!(start.elapsed() < Duration::from_millis(150));
    assert_eq!(outcome.n, 0);
    assert!(outcome.status.is_failed());
    assert_eq!(buf, [0u8; 8]);
}

#[test]
fn test_tee_fans_out_with_metrics() {
    let (first, a) = shared_sink();
    let (second, b) = shared_sink();
    let metrics = Arc::new(WriteMetrics::new());
    let mut writer = first
        .tee(vec![second])
        .with_metrics(Arc::clone(&metrics));
    writer.write_all(b"abc").expect("write");
    writer.write_all(b"defg").expect("write");

    assert_eq!(a.lock().as_slice(), b"abcdefg");
    assert_eq!(b.lock().as_slice(), b"abcdefg");
    let snap = metrics.snapshot();
    assert_eq!(snap.total_bytes, 7);
    assert_eq!(snap.total_writes, 2);
    assert_eq!(snap.errors, 0);
}

#[test]
fn test_tee_writer_over_std_writers() {
    let sinks: Vec<BoxWriter> = vec![Box::new(Vec::new()), Box::new(std::io::sink())];
    let mut writer = tee_writer(sinks);
    assert!(writer.write_chunk(b"xyz").is_complete(3));
}

#[test]
fn test_config_driven_chain() {
    let config = ChainConfig::from_json(
        r#"{"timeout_ms": 2000, "cors": {"allow_origin": "https://app.test"}, "recover": true, "log": true}"#,
    )
    .expect("config");
    let handler = config.apply(HandlerFunc::new(
        |w: &mut dyn ResponseWriter, req: &Request| {
            if req.path() == "/panic" {
                panic!("handler exploded");
            }
            let _ = w.write(b"fine");
        },
    ));
    let client = RoundTripperFunc::from_handler(handler);

    let ok = client
        .round_trip(&Request::get("/ok").expect("request"))
        .expect("round trip");
    assert_eq!(ok.status().as_u16(), 200);
    assert_eq!(ok.body(), b"fine");
    assert_eq!(ok.headers()["access-control-allow-origin"], "https://app.test");

    let boom = client
        .round_trip(&Request::get("/panic").expect("request"))
        .expect("round trip");
    assert_eq!(boom.status().as_u16(), 500);
    assert_eq!(boom.body(), b"Internal Server Error: handler exploded\n");
}

#[test]
fn test_context_reaches_handler_values() {
    let handler = HandlerFunc::new(|w: &mut dyn ResponseWriter, req: &Request| {
        let user = req.context().value("user").unwrap_or_default();
        let _ = w.write(user.as_bytes());
    });
    let ctx = Context::background().with_value("user", "ada");
    let req = Request::get("/").expect("request").with_context(ctx);
    let mut rec = ResponseRecorder::new();
    handler.serve(&mut rec, &req);
    assert_eq!(rec.body_string(), "ada");
}

#[test]
fn test_coded_error_chain() {
    let err = ErrorFunc::msg("connection failed")
        .wrap("database")
        .compose(ErrorFunc::msg("retry later"))
        .with_code(503);
    assert_eq!(err.to_string(), "[503] database: connection failed; retry later");
    assert_eq!(err.code(), 503);
}

#[test]
fn test_filesystem_feeds_source() {
    let dir = TempDir::new().expect("temp dir");
    std::fs::write(dir.path().join("greeting.txt"), b"hello fs").expect("write file");
    let fs = FsFunc::from_dir(dir.path());

    let file = fs.open("greeting.txt").expect("open");
    let mut upper = ReadFunc::from_reader(file).map(<[u8]>::to_ascii_uppercase);
    let mut out = String::new();
    upper.read_to_string(&mut out).expect("read");
    assert_eq!(out, "HELLO FS");

    assert_eq!(read_file(&fs, "greeting.txt").expect("read_file"), b"hello fs");
    assert!(fs.open("../escape").is_err());
}

#[cfg(feature = "sqlite")]
#[test]
fn test_sqlite_round_trip() {
    let mut conn = sqlite_driver().open(":memory:").expect("open");
    conn.prepare("CREATE TABLE notes (id INTEGER PRIMARY KEY, body TEXT)")
        .expect("prepare")
        .exec(&[])
        .expect("create");

    let mut insert = conn
        .prepare("INSERT INTO notes (body) VALUES (?1)")
        .expect("prepare");
    for body in ["first", "second"] {
        insert.exec(&[Value::from(body)]).expect("insert");
    }

    let mut tx = conn.begin().expect("begin");
    insert.exec(&[Value::from("discarded")]).expect("insert");
    tx.rollback().expect("rollback");

    let mut rows = conn
        .prepare("SELECT body FROM notes ORDER BY id")
        .expect("prepare")
        .query(&[])
        .expect("query");
    let mut bodies = Vec::new();
    while let Some(row) = rows.next().expect("next") {
        bodies.push(row[0].as_str().map(String::from).unwrap_or_default());
    }
    assert_eq!(bodies, vec!["first", "second"]);
    conn.close().expect("close");
}

#[test]
fn test_std_reader_composition() {
    let mut reader = ReadFunc::from_reader(Cursor::new(b"a1b2c3d4".to_vec()))
        .filter(|b| b.is_ascii_digit())
        .take(3);
    let mut out = String::new();
    reader.read_to_string(&mut out).expect("read");
    assert!(out.len() <= 3);
    assert!(out.chars().all(|c| c.is_ascii_digit()));
}

/// Property-based tests for combinator laws.
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn cursor_source(data: Vec<u8>) -> ReadFunc {
        ReadFunc::from_reader(Cursor::new(data))
    }

    fn chunked_source(data: Vec<u8>, chunk: usize) -> ReadFunc {
        let mut pos = 0;
        ReadFunc::new(move |buf: &mut [u8]| {
            let n = chunk.min(buf.len()).min(data.len() - pos);
            buf[..n].copy_from_slice(&data[pos..pos + n]);
            pos += n;
            if pos == data.len() {
                ReadOutcome::eof(n)
            } else {
                ReadOutcome::more(n)
            }
        })
    }

    fn drain(mut reader: ReadFunc) -> Vec<u8> {
        let mut out = Vec::new();
        reader.read_to_end(&mut out).expect("drain");
        out
    }

    proptest! {
        #[test]
        fn map_equals_transform_of_source(data in proptest::collection::vec(any::<u8>(), 0..512)) {
            let mapped = drain(cursor_source(data.clone()).map(<[u8]>::to_ascii_uppercase));
            prop_assert_eq!(mapped, data.to_ascii_uppercase());
        }

        #[test]
        fn filter_keeps_order_and_shrinks(
            data in proptest::collection::vec(any::<u8>(), 0..512),
            chunk in 1usize..8,
        ) {
            let filtered = drain(chunked_source(data.clone(), chunk).filter(|b| b % 3 == 0));
            let expected: Vec<u8> = data.iter().copied().filter(|b| b % 3 == 0).collect();
            prop_assert!(filtered.len() <= data.len());
            prop_assert_eq!(filtered, expected);
        }

        #[test]
        fn take_never_exceeds_limit(
            data in proptest::collection::vec(any::<u8>(), 0..512),
            limit in 0i64..600,
        ) {
            let taken = drain(cursor_source(data.clone()).take(limit));
            let cap = usize::try_from(limit).unwrap_or(0).min(data.len());
            prop_assert_eq!(taken.as_slice(), &data[..cap]);
        }

        #[test]
        fn retry_attempts_are_bounded(failures in 0usize..8, max_retries in 0usize..8) {
            let calls = Arc::new(AtomicUsize::new(0));
            let seen = Arc::clone(&calls);
            let mut reader = ReadFunc::new(move |_: &mut [u8]| {
                if seen.fetch_add(1, Ordering::SeqCst) < failures {
                    ReadOutcome::failed(purefunc::error::StreamError::failed("flaky"))
                } else {
                    ReadOutcome::eof(0)
                }
            })
            .retry(max_retries);
            let mut buf = [0u8; 1];
            let outcome = reader.read_chunk(&mut buf);
            let attempts = calls.load(Ordering::SeqCst);
            prop_assert_eq!(attempts, failures.min(max_retries) + 1);
            prop_assert_eq!(outcome.status.is_failed(), failures > max_retries);
        }

        #[test]
        fn tee_delivers_identical_bytes(
            chunks in proptest::collection::vec(proptest::collection::vec(any::<u8>(), 0..64), 0..16),
            fanout in 1usize..5,
        ) {
            let stores: Vec<_> = (0..fanout).map(|_| Arc::new(Mutex::new(Vec::new()))).collect();
            let sinks = stores[1..]
                .iter()
                .map(|s| WriteFunc::from_shared(Arc::clone(s)))
                .collect();
            let mut writer = WriteFunc::from_shared(Arc::clone(&stores[0])).tee(sinks);
            for chunk in &chunks {
                prop_assert!(writer.write_chunk(chunk).is_complete(chunk.len()));
            }
            let expected: Vec<u8> = chunks.concat();
            for store in &stores {
                let guard = store.lock();
                prop_assert_eq!(guard.as_slice(), expected.as_slice());
            }
        }

        #[test]
        fn empty_sink_is_compose_identity(data in proptest::collection::vec(any::<u8>(), 0..128)) {
            let (sink, store) = shared_sink();
            let mut writer = WriteFunc::empty().compose(sink);
            prop_assert!(writer.write_chunk(&data).is_complete(data.len()));
            let guard = store.lock();
            prop_assert_eq!(guard.as_slice(), data.as_slice());
        }
    }
}
