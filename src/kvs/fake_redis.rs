//! In-process RESP server for exercising the Redis backend without Redis.
//!
//! Understands `GET`, `SET` and `SCAN` over RESP2 arrays of bulk strings and
//! answers `+OK` to everything else (the client's connection setup
//! included). Every command is recorded so tests can assert what went on
//! the wire.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// Keys returned per `SCAN` reply, small so cursors get exercised.
const SCAN_BATCH: usize = 2;

#[derive(Default)]
struct FakeState {
    data: BTreeMap<Vec<u8>, Vec<u8>>,
    commands: Vec<Vec<Vec<u8>>>,
}

pub(crate) struct FakeRedis {
    url: String,
    state: Arc<Mutex<FakeState>>,
    accept: JoinHandle<()>,
}

impl FakeRedis {
    pub(crate) async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(Mutex::new(FakeState::default()));

        let shared = Arc::clone(&state);
        let accept = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(serve(stream, Arc::clone(&shared)));
            }
        });

        Self {
            url: format!("redis://{addr}/"),
            state,
            accept,
        }
    }

    pub(crate) fn url(&self) -> &str {
        &self.url
    }

    /// Stores raw bytes, bypassing the client.
    pub(crate) fn insert_raw(&self, key: &[u8], value: &[u8]) {
        self.state
            .lock()
            .unwrap()
            .data
            .insert(key.to_vec(), value.to_vec());
    }

    /// Raw stored bytes for `key`.
    pub(crate) fn raw(&self, key: &str) -> Option<Vec<u8>> {
        self.state.lock().unwrap().data.get(key.as_bytes()).cloned()
    }

    /// Recorded commands named `name`, arguments decoded lossily.
    pub(crate) fn commands(&self, name: &str) -> Vec<Vec<String>> {
        self.state
            .lock()
            .unwrap()
            .commands
            .iter()
            .filter(|args| args.first().is_some_and(|n| n.eq_ignore_ascii_case(name.as_bytes())))
            .map(|args| {
                args.iter()
                    .map(|arg| String::from_utf8_lossy(arg).into_owned())
                    .collect()
            })
            .collect()
    }
}

impl Drop for FakeRedis {
    fn drop(&mut self) {
        self.accept.abort();
    }
}

async fn serve(mut stream: TcpStream, state: Arc<Mutex<FakeState>>) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    loop {
        while let Some((args, used)) = parse_command(&buf) {
            buf.drain(..used);
            let reply = respond(&state, args);
            if stream.write_all(&reply).await.is_err() {
                return;
            }
        }

        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
}

/// Parses one complete `*N` array of bulk strings from the front of `buf`.
fn parse_command(buf: &[u8]) -> Option<(Vec<Vec<u8>>, usize)> {
    let (count, mut pos) = parse_header(buf, 0, b'*')?;
    let mut args = Vec::with_capacity(count);

    for _ in 0..count {
        let (len, start) = parse_header(buf, pos, b'$')?;
        let end = start + len;
        if buf.len() < end + 2 {
            return None;
        }
        args.push(buf[start..end].to_vec());
        pos = end + 2;
    }

    Some((args, pos))
}

fn parse_header(buf: &[u8], pos: usize, marker: u8) -> Option<(usize, usize)> {
    if *buf.get(pos)? != marker {
        return None;
    }
    let line_end = pos + buf[pos..].windows(2).position(|w| w == b"\r\n")?;
    let n = std::str::from_utf8(&buf[pos + 1..line_end]).ok()?.parse().ok()?;
    Some((n, line_end + 2))
}

fn bulk(bytes: &[u8]) -> Vec<u8> {
    let mut out = format!("${}\r\n", bytes.len()).into_bytes();
    out.extend_from_slice(bytes);
    out.extend_from_slice(b"\r\n");
    out
}

fn respond(state: &Mutex<FakeState>, args: Vec<Vec<u8>>) -> Vec<u8> {
    let mut state = state.lock().unwrap();
    state.commands.push(args.clone());
    let name = args.first().map(|n| n.to_ascii_uppercase()).unwrap_or_default();

    match name.as_slice() {
        b"GET" => match args.get(1).and_then(|key| state.data.get(key)) {
            Some(value) => bulk(value),
            None => b"$-1\r\n".to_vec(),
        },
        b"SET" => {
            if let (Some(key), Some(value)) = (args.get(1), args.get(2)) {
                state.data.insert(key.clone(), value.clone());
            }
            b"+OK\r\n".to_vec()
        },
        b"SCAN" => {
            let cursor: usize = args
                .get(1)
                .and_then(|c| std::str::from_utf8(c).ok())
                .and_then(|c| c.parse().ok())
                .unwrap_or(0);
            // Reverse order, so callers have to sort
            let keys: Vec<&Vec<u8>> = state.data.keys().rev().collect();
            let start = cursor.min(keys.len());
            let end = (start + SCAN_BATCH).min(keys.len());
            let next = if end == keys.len() { 0 } else { end };

            let mut out = b"*2\r\n".to_vec();
            out.extend(bulk(next.to_string().as_bytes()));
            out.extend(format!("*{}\r\n", end - start).into_bytes());
            for key in &keys[start..end] {
                out.extend(bulk(key));
            }
            out
        },
        _ => b"+OK\r\n".to_vec(),
    }
}
