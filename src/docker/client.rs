use std::path::Path;

use http_body_util::{BodyExt, Empty};
use hyper::body::{Bytes, Incoming};
use hyper::header::{HOST, HeaderValue};
use hyper::{Request, Response, Uri};
use tower::Service;

use super::connector::UnixConnector;
use super::models::{ContainerListing, RawStats};
use super::{DaemonClient, Error, Result, StatsSubscription};
use crate::container::ContainerID;
use crate::stats::StatsSnapshot;

/// Docker Engine API client talking HTTP/1.1 over the daemon's unix socket.
///
/// Every request opens its own connection, so a long-running stats stream never
/// blocks the container listing or other streams.
#[derive(Debug, Clone)]
pub struct DockerClient {
    connector: UnixConnector,
}

impl DockerClient {
    pub fn new(socket_path: impl AsRef<Path>) -> Self {
        Self {
            connector: UnixConnector::new(socket_path),
        }
    }

    pub fn socket_path(&self) -> &Path {
        self.connector.path()
    }

    /// Sends a `GET` request and returns the response if its status is successful.
    async fn get(&self, path: &str) -> Result<Response<Incoming>> {
        let uri: Uri = path
            .parse()
            .map_err(|_| Error::InvalidPath(path.to_owned()))?;

        let mut connector = self.connector.clone();
        let connect_err = |source| Error::Connect {
            path: self.socket_path().to_path_buf(),
            source,
        };
        std::future::poll_fn(|cx| connector.poll_ready(cx))
            .await
            .map_err(connect_err)?;
        let io = connector.call(uri.clone()).await.map_err(connect_err)?;

        let (mut sender, connection) = hyper::client::conn::http1::handshake(io)
            .await
            .map_err(Error::Handshake)?;
        tokio::spawn(async move {
            if let Err(err) = connection.await {
                log::debug!("daemon connection closed with error: {err}");
            }
        });

        let mut request = Request::new(Empty::<Bytes>::new());
        *request.uri_mut() = uri;
        request
            .headers_mut()
            .insert(HOST, HeaderValue::from_static("docker"));

        log::trace!("GET {path}");
        let response = sender.send_request(request).await.map_err(Error::Request)?;
        let status = response.status();
        if !status.is_success() {
            let body = match response.into_body().collect().await {
                Ok(body) => String::from_utf8_lossy(&body.to_bytes()).trim().to_owned(),
                Err(err) => err.to_string(),
            };
            return Err(Error::Status { status, body });
        }

        Ok(response)
    }
}

impl DaemonClient for DockerClient {
    type Subscription = DockerStatsStream;

    async fn list_containers(&self) -> Result<Vec<ContainerListing>> {
        let response = self.get("/containers/json").await?;
        let body = response
            .into_body()
            .collect()
            .await
            .map_err(Error::Body)?
            .to_bytes();

        Ok(serde_json::from_slice(&body)?)
    }

    async fn open_stats(&self, container_id: &ContainerID) -> Result<DockerStatsStream> {
        let response = self
            .get(&format!("/containers/{container_id}/stats?stream=true"))
            .await?;

        Ok(DockerStatsStream::new(response.into_body()))
    }
}

/// Upper bound for a single stats object; a daemon sends a few KiB per line.
const MAX_LINE_LEN: usize = 1 << 20;

/// Newline-delimited JSON stream of stats objects for one container.
#[derive(Debug)]
pub struct DockerStatsStream {
    body: Incoming,
    buffer: Vec<u8>,
    /// Number of leading buffer bytes known to contain no `\n`.
    scanned: usize,
}

impl DockerStatsStream {
    fn new(body: Incoming) -> Self {
        Self {
            body,
            buffer: Vec::with_capacity(4096),
            scanned: 0,
        }
    }

    /// Removes the next complete line (including its `\n`) from the buffer.
    fn next_line(&mut self) -> Option<Vec<u8>> {
        match split_line(&mut self.buffer, self.scanned) {
            Some(line) => {
                self.scanned = 0;
                Some(line)
            }
            None => {
                self.scanned = self.buffer.len();
                None
            }
        }
    }
}

/// Drains the first line from `buffer`, skipping the first `scanned` bytes when
/// searching for its end.
fn split_line(buffer: &mut Vec<u8>, scanned: usize) -> Option<Vec<u8>> {
    let offset = buffer.get(scanned..)?.iter().position(|b| *b == b'\n')?;
    Some(buffer.drain(..=scanned + offset).collect())
}

fn decode(line: &[u8]) -> Result<StatsSnapshot> {
    let raw: RawStats = serde_json::from_slice(line)?;
    StatsSnapshot::try_from(raw)
}

fn is_blank(line: &[u8]) -> bool {
    line.iter().all(u8::is_ascii_whitespace)
}

impl StatsSubscription for DockerStatsStream {
    async fn next_sample(&mut self) -> Result<Option<StatsSnapshot>> {
        loop {
            if let Some(line) = self.next_line() {
                if is_blank(&line) {
                    continue;
                }
                return decode(&line).map(Some);
            }
            if self.buffer.len() > MAX_LINE_LEN {
                self.buffer.clear();
                self.scanned = 0;
                return Err(Error::LineTooLong {
                    limit: MAX_LINE_LEN,
                });
            }

            match self.body.frame().await {
                Some(Ok(frame)) => {
                    if let Ok(data) = frame.into_data() {
                        self.buffer.extend_from_slice(&data);
                    }
                }
                Some(Err(err)) => return Err(Error::Body(err)),
                None => {
                    // the last object may not be terminated by a newline
                    let rest = std::mem::take(&mut self.buffer);
                    self.scanned = 0;
                    if is_blank(&rest) {
                        return Ok(None);
                    }
                    return decode(&rest).map(Some);
                }
            }
        }
    }
}
