use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use uuid::Uuid;

use crate::core::error::ClientError;
use crate::modules::storage::{
    DeleteOutput, ObjectAcl, ObjectStorageClient, UploadOutput, UploadRequest,
};

/// Largest single read the recording client performs on an upload body
pub const READ_BUFFER_SIZE: usize = 64 * 1024;

const FAKE_ENDPOINT: &str = "http://minio:9000";

/// A call observed by [`RecordingClient`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    Upload {
        bucket: String,
        key: String,
        content_type: String,
        part_size: usize,
        queue_size: usize,
        acl: Option<ObjectAcl>,
        content_length: Option<u64>,
        /// Total bytes drained from the body
        bytes: usize,
    },
    Delete {
        bucket: String,
        key: String,
    },
    Presign {
        bucket: String,
        key: String,
        expiry_secs: u32,
    },
}

/// Storage client double that records every call
///
/// Upload bodies are drained through a fixed buffer and discarded, so the
/// double never holds more than [`READ_BUFFER_SIZE`] bytes of a file.
pub struct RecordingClient {
    calls: Mutex<Vec<RecordedCall>>,
    signatures: AtomicUsize,
    failure: Option<String>,
    /// Bytes appended to this file after the request arrives, before its
    /// body is read
    grow_before_read: Option<(PathBuf, usize)>,
}

impl RecordingClient {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            signatures: AtomicUsize::new(0),
            failure: None,
            grow_before_read: None,
        }
    }

    /// Append `extra` bytes to `path` once an upload request is received,
    /// then drain the body; only a body still reading from disk sees them
    pub fn growing_file_before_read(path: &Path, extra: usize) -> Self {
        Self {
            grow_before_read: Some((path.to_path_buf(), extra)),
            ..Self::new()
        }
    }

    /// Every operation fails with `message`
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::new()
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// URL returned for the `n`th presign request (1-based)
    pub fn signed_url(bucket: &str, key: &str, expiry_secs: u32, n: usize) -> String {
        format!(
            "{}/{}/{}?X-Amz-Expires={}&X-Amz-Signature=sig{}",
            FAKE_ENDPOINT, bucket, key, expiry_secs, n
        )
    }

    pub fn delete_output() -> DeleteOutput {
        DeleteOutput {
            status_code: 204,
            version_id: Some("v1".to_string()),
        }
    }

    fn record(&self, call: RecordedCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn check_failure(&self) -> Result<(), ClientError> {
        match &self.failure {
            Some(message) => Err(ClientError::Other(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ObjectStorageClient for RecordingClient {
    async fn upload(&self, mut request: UploadRequest) -> Result<UploadOutput, ClientError> {
        self.check_failure()?;

        if let Some((path, extra)) = &self.grow_before_read {
            let mut file = std::fs::OpenOptions::new().append(true).open(path)?;
            std::io::Write::write_all(&mut file, &vec![b'x'; *extra])?;
        }

        let mut buf = vec![0u8; READ_BUFFER_SIZE];
        let mut bytes = 0;
        loop {
            let n = request.body.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            bytes += n;
        }

        self.record(RecordedCall::Upload {
            bucket: request.bucket.clone(),
            key: request.key.clone(),
            content_type: request.content_type.clone(),
            part_size: request.part_size,
            queue_size: request.queue_size,
            acl: request.acl,
            content_length: request.content_length,
            bytes,
        });

        Ok(UploadOutput {
            location: format!("{}/{}/{}", FAKE_ENDPOINT, request.bucket, request.key),
            bucket: request.bucket,
            key: request.key,
            etag: Some("\"d41d8cd98f00b204e9800998ecf8427e\"".to_string()),
        })
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<DeleteOutput, ClientError> {
        self.check_failure()?;
        self.record(RecordedCall::Delete {
            bucket: bucket.to_string(),
            key: key.to_string(),
        });
        Ok(Self::delete_output())
    }

    async fn presign_get(
        &self,
        bucket: &str,
        key: &str,
        expiry_secs: u32,
    ) -> Result<String, ClientError> {
        self.check_failure()?;
        self.record(RecordedCall::Presign {
            bucket: bucket.to_string(),
            key: key.to_string(),
            expiry_secs,
        });
        let n = self.signatures.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Self::signed_url(bucket, key, expiry_secs, n))
    }
}

/// Write `len` bytes to a fresh file in the system temp dir
pub async fn write_temp_file(len: usize) -> PathBuf {
    let path = std::env::temp_dir().join(format!("upload-test-{}.bin", Uuid::new_v4()));
    let data: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
    tokio::fs::write(&path, data).await.unwrap();
    path
}

pub async fn remove_temp_file(path: &Path) {
    let _ = tokio::fs::remove_file(path).await;
}

/// Route tracing output through the test harness, honouring RUST_LOG
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "debug".into()),
        )
        .with_test_writer()
        .try_init();
}

/// A request received by [`S3Stub`]
#[derive(Debug, Clone)]
pub struct StubRequest {
    pub method: String,
    /// Path and query, e.g. `/files/a.png?partNumber=1&uploadId=upload-1`
    pub target: String,
    /// Header names lowercased
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl StubRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// `partNumber` query value of an UploadPart request
    pub fn part_number(&self) -> Option<u32> {
        query_value(&self.target, "partNumber").and_then(|v| v.parse().ok())
    }

    pub fn has_query(&self, name: &str) -> bool {
        query_value(&self.target, name).is_some()
    }
}

#[derive(Default)]
struct StubState {
    requests: Mutex<Vec<StubRequest>>,
    parts_in_flight: AtomicUsize,
    max_parts_in_flight: AtomicUsize,
}

/// Minimal S3 endpoint on a local port
///
/// Understands the single PUT and multipart requests issued by
/// [`crate::modules::storage::MinIOClient`]. UploadPart requests are held
/// briefly so overlapping parts can be counted.
pub struct S3Stub {
    endpoint: String,
    state: Arc<StubState>,
}

pub const STUB_UPLOAD_ID: &str = "upload-1";

const STUB_PART_DELAY: Duration = Duration::from_millis(25);

impl S3Stub {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("http://{}", listener.local_addr().unwrap());
        let state = Arc::new(StubState::default());

        let accept_state = Arc::clone(&state);
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(serve_connection(stream, Arc::clone(&accept_state)));
            }
        });

        Self { endpoint, state }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn requests(&self) -> Vec<StubRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn max_parts_in_flight(&self) -> usize {
        self.state.max_parts_in_flight.load(Ordering::SeqCst)
    }
}

async fn serve_connection(stream: TcpStream, state: Arc<StubState>) {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    loop {
        let mut line = String::new();
        match reader.read_line(&mut line).await {
            Ok(0) | Err(_) => return,
            Ok(_) => {}
        }
        let mut request_line = line.split_whitespace();
        let method = request_line.next().unwrap_or_default().to_string();
        let target = request_line.next().unwrap_or_default().to_string();

        let mut headers = HashMap::new();
        loop {
            let mut header = String::new();
            if reader.read_line(&mut header).await.unwrap_or(0) == 0 {
                return;
            }
            let header = header.trim_end();
            if header.is_empty() {
                break;
            }
            if let Some((name, value)) = header.split_once(':') {
                headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
            }
        }

        let length = headers
            .get("content-length")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(0);
        let mut body = vec![0u8; length];
        if reader.read_exact(&mut body).await.is_err() {
            return;
        }

        let request = StubRequest {
            method,
            target,
            headers,
            body,
        };
        let part_number = request.part_number();

        if part_number.is_some() {
            let now = state.parts_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            state.max_parts_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(STUB_PART_DELAY).await;
        }

        let (etag, response_body) = stub_response(&request);
        state.requests.lock().unwrap().push(request);

        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nContent-Type: application/xml\r\nETag: {}\r\n\r\n{}",
            response_body.len(),
            etag,
            response_body
        );
        // A part stops counting before its response goes out
        if part_number.is_some() {
            state.parts_in_flight.fetch_sub(1, Ordering::SeqCst);
        }
        if write_half.write_all(response.as_bytes()).await.is_err() {
            return;
        }
    }
}

fn stub_response(request: &StubRequest) -> (String, String) {
    if let Some(part_number) = request.part_number() {
        return (format!("\"etag-{}\"", part_number), String::new());
    }
    if request.method == "POST" && request.has_query("uploads") {
        return (
            "\"\"".to_string(),
            format!(
                "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
                 <InitiateMultipartUploadResult>\
                 <Bucket>files</Bucket><Key>object</Key><UploadId>{}</UploadId>\
                 </InitiateMultipartUploadResult>",
                STUB_UPLOAD_ID
            ),
        );
    }
    if request.method == "POST" && request.has_query("uploadId") {
        return (
            "\"etag-complete\"".to_string(),
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
             <CompleteMultipartUploadResult>\
             <Bucket>files</Bucket><Key>object</Key><ETag>\"etag-complete\"</ETag>\
             </CompleteMultipartUploadResult>"
                .to_string(),
        );
    }
    ("\"etag-single\"".to_string(), String::new())
}

fn query_value<'a>(target: &'a str, name: &str) -> Option<&'a str> {
    let (_, query) = target.split_once('?')?;
    query.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        (key == name).then_some(value)
    })
}
