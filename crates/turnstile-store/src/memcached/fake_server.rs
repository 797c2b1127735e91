//! Minimal in-process memcached server for tests

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufStream};
use tokio::net::{TcpListener, TcpStream};

type Data = Arc<Mutex<HashMap<String, String>>>;

pub(crate) struct FakeMemcached {
    pub address: String,
    accepted: Arc<AtomicUsize>,
}

impl FakeMemcached {
    /// Number of client connections accepted so far
    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }
}

pub(crate) async fn spawn() -> FakeMemcached {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap().to_string();
    let accepted = Arc::new(AtomicUsize::new(0));
    let data: Data = Arc::new(Mutex::new(HashMap::new()));

    let counter = accepted.clone();
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(serve(socket, data.clone()));
        }
    });

    FakeMemcached { address, accepted }
}

async fn serve(socket: TcpStream, data: Data) {
    let mut stream = BufStream::new(socket);
    loop {
        let mut line = String::new();
        match stream.read_line(&mut line).await {
            Ok(0) | Err(_) => return,
            Ok(_) => {}
        }

        let parts: Vec<String> = line.split_whitespace().map(str::to_string).collect();
        let reply = match parts.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
            ["get", key] => get(&data, key),
            ["set", key, _flags, _exptime, len] => {
                let len: usize = len.parse().unwrap();
                let mut buf = vec![0u8; len + 2];
                if stream.read_exact(&mut buf).await.is_err() {
                    return;
                }
                buf.truncate(len);
                set(&data, key, String::from_utf8(buf).unwrap())
            }
            ["incr", key, _delta] => update(&data, key, |n| n.wrapping_add(1)),
            ["decr", key, _delta] => update(&data, key, |n| n.saturating_sub(1)),
            ["delete", key] => delete(&data, key),
            _ => "ERROR\r\n".to_string(),
        };

        if stream.write_all(reply.as_bytes()).await.is_err() || stream.flush().await.is_err() {
            return;
        }
    }
}

fn get(data: &Data, key: &str) -> String {
    match data.lock().get(key) {
        Some(value) => format!("VALUE {} 0 {}\r\n{}\r\nEND\r\n", key, value.len(), value),
        None => "END\r\n".to_string(),
    }
}

fn set(data: &Data, key: &str, value: String) -> String {
    data.lock().insert(key.to_string(), value);
    "STORED\r\n".to_string()
}

fn update(data: &Data, key: &str, op: impl FnOnce(u64) -> u64) -> String {
    let mut data = data.lock();
    let Some(value) = data.get_mut(key) else {
        return "NOT_FOUND\r\n".to_string();
    };
    match value.parse::<u64>() {
        Ok(n) => {
            *value = op(n).to_string();
            format!("{}\r\n", value)
        }
        Err(_) => "CLIENT_ERROR cannot increment or decrement non-numeric value\r\n".to_string(),
    }
}

fn delete(data: &Data, key: &str) -> String {
    match data.lock().remove(key) {
        Some(_) => "DELETED\r\n".to_string(),
        None => "NOT_FOUND\r\n".to_string(),
    }
}
