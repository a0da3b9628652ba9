use crate::upload::api::{ApiError, FileApi, ProgressFn, RemoteFile, UploadReply, UploadRequest};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// Scripted `FileApi` that records what it was asked to do.
pub struct FakeApi {
    pub progress_steps: Vec<(u64, u64)>,
    pub upload_result: Result<UploadReply, ApiError>,
    pub listing: Result<Vec<RemoteFile>, ApiError>,
    pub delete_result: Result<(), ApiError>,
    pub calls: AtomicUsize,
    pub uploads: Mutex<Vec<UploadRequest>>,
    pub deletes: Mutex<Vec<(String, String)>>,
    pub listed_for: Mutex<Vec<String>>,
}

impl Default for FakeApi {
    fn default() -> Self {
        Self {
            progress_steps: vec![(50, 100), (100, 100)],
            upload_result: Ok(UploadReply::default()),
            listing: Ok(Vec::new()),
            delete_result: Ok(()),
            calls: AtomicUsize::new(0),
            uploads: Mutex::new(Vec::new()),
            deletes: Mutex::new(Vec::new()),
            listed_for: Mutex::new(Vec::new()),
        }
    }
}

impl FakeApi {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

pub fn remote(id: &str, name: &str, url: &str) -> RemoteFile {
    RemoteFile {
        id: Some(id.to_string()),
        name: name.to_string(),
        location: Some(url.to_string()),
        size: None,
    }
}

#[async_trait]
impl FileApi for FakeApi {
    async fn upload(
        &self,
        request: UploadRequest,
        progress: ProgressFn,
    ) -> Result<UploadReply, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.uploads.lock().unwrap().push(request);
        for (sent, total) in &self.progress_steps {
            progress(*sent, *total);
            tokio::task::yield_now().await;
        }
        self.upload_result.clone()
    }

    async fn list(&self, user_id: &str) -> Result<Vec<RemoteFile>, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.listed_for.lock().unwrap().push(user_id.to_string());
        self.listing.clone()
    }

    async fn delete(&self, file_id: &str, user_id: &str) -> Result<(), ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.deletes
            .lock()
            .unwrap()
            .push((file_id.to_string(), user_id.to_string()));
        self.delete_result.clone()
    }
}

/// Canned answer for `serve_once`.
pub enum Reply {
    Json { status: &'static str, body: &'static str },
    /// Read the request, then hold the socket open without answering.
    Stall,
}

impl Reply {
    pub fn json(status: &'static str, body: &'static str) -> Self {
        Self::Json { status, body }
    }
}

/// Accepts one connection on a loopback port and answers it with `reply`.
/// Returns the base URL and a handle yielding the raw request text.
pub async fn serve_once(reply: Reply) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let raw = read_request(&mut stream).await;
        match reply {
            Reply::Json { status, body } => {
                let mut response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nConnection: close\r\n",
                    status
                );
                if !body.is_empty() {
                    response.push_str(&format!("Content-Length: {}\r\n", body.len()));
                }
                response.push_str("\r\n");
                response.push_str(body);
                stream.write_all(response.as_bytes()).await.unwrap();
                let _ = stream.shutdown().await;
            }
            Reply::Stall => {
                tokio::time::sleep(Duration::from_secs(30)).await;
            }
        }
        raw
    });

    (base, handle)
}

async fn read_request(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 16 * 1024];
    loop {
        let n = stream.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);

        let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
        let body_len = buf.len() - end - 4;
        let content_length = head
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok());

        let complete = match content_length {
            Some(len) => body_len >= len,
            None if head.contains("transfer-encoding: chunked") => buf.ends_with(b"0\r\n\r\n"),
            None => true,
        };
        if complete {
            break;
        }
    }
    String::from_utf8_lossy(&buf).to_string()
}
