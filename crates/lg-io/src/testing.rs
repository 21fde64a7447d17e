//! In-memory stand-in for the query service, used by engine tests.
//!
//! Each `connect` pops the next canned response and spawns a peer that
//! records the request line, writes the response and hangs up.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};

use tokio::io::{duplex, AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream};
use url::form_urlencoded;

use crate::connection::Connector;

/// A 200 response whose body is `rows`, one per line.
pub(crate) fn body(rows: &[&str]) -> String {
    let mut out =
        String::from("HTTP/1.0 200 OK\r\nContent-Type: text/tab-separated-values; charset=UTF-8\r\n\r\n");
    for row in rows {
        out.push_str(row);
        out.push('\n');
    }
    out
}

pub(crate) struct ScriptedConnector {
    responses: Mutex<VecDeque<String>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl ScriptedConnector {
    pub(crate) fn new(responses: Vec<String>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Decoded `query` parameter of every request, in connection order.
    pub(crate) fn queries(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter_map(|line| {
                let qs = line.strip_prefix("GET /?")?.split(' ').next()?;
                form_urlencoded::parse(qs.as_bytes())
                    .find(|(k, _)| k == "query")
                    .map(|(_, v)| v.into_owned())
            })
            .collect()
    }

    /// Raw request lines, in connection order.
    pub(crate) fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn remaining(&self) -> usize {
        self.responses.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl Connector for ScriptedConnector {
    type Stream = DuplexStream;

    async fn connect(&self) -> io::Result<DuplexStream> {
        let response = self.responses.lock().unwrap().pop_front().ok_or_else(|| {
            io::Error::new(io::ErrorKind::ConnectionRefused, "no scripted response left")
        })?;

        let (client, mut server) = duplex(64 * 1024);
        let requests = self.requests.clone();
        tokio::spawn(async move {
            let mut line = String::new();
            {
                let mut reader = BufReader::new(&mut server);
                reader.read_line(&mut line).await?;
                let mut blank = String::new();
                reader.read_line(&mut blank).await?;
            }
            requests.lock().unwrap().push(line);
            server.write_all(response.as_bytes()).await?;
            Ok::<_, io::Error>(())
        });
        Ok(client)
    }
}
