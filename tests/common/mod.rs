//! Shared test doubles for the transport and predictor boundaries.

#![allow(dead_code)]

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use geolocator_bot::app::AppContext;
use geolocator_bot::config::DEFAULT_MAX_CONCURRENT_PREDICTIONS;
use geolocator_bot::errors::TransportError;
use geolocator_bot::geolocation::{PredictError, Prediction, PredictionResult, Predictor};
use geolocator_bot::transport::{PhotoEvent, PhotoVariant, Transport};
use tracing_subscriber::fmt::MakeWriter;

/// Minimal JPEG header, enough for format sniffing
pub const JPEG_BYTES: &[u8] = &[
    0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00, 0x01, 0x01, 0x00, 0x00,
    0x01, 0x00, 0x01, 0x00, 0x00, 0xFF, 0xD9,
];

/// Records every call and writes `payload` on download
pub struct MockTransport {
    pub payload: Vec<u8>,
    pub fail_download: bool,
    pub fail_send: bool,
    pub downloads: Mutex<Vec<(String, PathBuf)>>,
    pub sent: Mutex<Vec<(i64, String)>>,
    pub closed: Mutex<bool>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            payload: JPEG_BYTES.to_vec(),
            fail_download: false,
            fail_send: false,
            downloads: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
            closed: Mutex::new(false),
        }
    }

    pub fn sent(&self) -> Vec<(i64, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn downloads(&self) -> Vec<(String, PathBuf)> {
        self.downloads.lock().unwrap().clone()
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.lock().unwrap()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn download(&self, file_id: &str, dest: &Path) -> Result<(), TransportError> {
        self.downloads
            .lock()
            .unwrap()
            .push((file_id.to_string(), dest.to_path_buf()));
        if self.fail_download {
            return Err(TransportError::Download("file is too big".to_string()));
        }
        tokio::fs::write(dest, &self.payload).await?;
        Ok(())
    }

    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), TransportError> {
        self.sent.lock().unwrap().push((chat_id, text.to_string()));
        if self.fail_send {
            return Err(TransportError::Send("chat not found".to_string()));
        }
        Ok(())
    }

    async fn close(&self) -> Result<(), TransportError> {
        *self.closed.lock().unwrap() = true;
        Ok(())
    }
}

pub enum Script {
    Return(PredictionResult),
    Fail(fn() -> PredictError),
    Panic,
}

/// Predictor that follows a script and remembers the path it was given
pub struct ScriptedPredictor {
    pub script: Script,
    pub seen: Mutex<Vec<(PathBuf, bool)>>,
}

impl ScriptedPredictor {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Paths the predictor was called with, and whether each existed at call time
    pub fn seen(&self) -> Vec<(PathBuf, bool)> {
        self.seen.lock().unwrap().clone()
    }
}

impl Predictor for ScriptedPredictor {
    fn localize(&self, image_path: &Path) -> Result<PredictionResult, PredictError> {
        self.seen
            .lock()
            .unwrap()
            .push((image_path.to_path_buf(), image_path.exists()));
        match &self.script {
            Script::Return(result) => Ok(result.clone()),
            Script::Fail(make) => Err(make()),
            Script::Panic => panic!("predictor crashed"),
        }
    }
}

pub fn new_york() -> PredictionResult {
    PredictionResult {
        predictions: vec![Prediction {
            latitude: 40.7128,
            longitude: -74.0060,
            score: 0.87,
        }],
    }
}

pub fn variant(file_id: &str, width: u32) -> PhotoVariant {
    PhotoVariant {
        file_id: file_id.to_string(),
        width,
        height: width,
        file_size: width * 100,
    }
}

pub fn photo_event(variants: Vec<PhotoVariant>) -> PhotoEvent {
    PhotoEvent {
        chat_id: 42,
        sender: "@tester".to_string(),
        language_code: Some("ru".to_string()),
        variants,
    }
}

pub fn context(
    transport: Arc<MockTransport>,
    predictor: Arc<ScriptedPredictor>,
    admin_chat_id: Option<i64>,
) -> AppContext {
    AppContext::new(
        transport,
        predictor,
        admin_chat_id,
        DEFAULT_MAX_CONCURRENT_PREDICTIONS,
    )
    .expect("context")
}

pub fn context_with_limit(
    transport: Arc<MockTransport>,
    predictor: Arc<dyn Predictor>,
    max_concurrent_predictions: usize,
) -> AppContext {
    AppContext::new(transport, predictor, None, max_concurrent_predictions).expect("context")
}

/// Predictor whose calls block until a release signal arrives
pub struct GatedPredictor {
    release: Mutex<Receiver<()>>,
    calls: AtomicUsize,
}

impl GatedPredictor {
    pub fn new(release: Receiver<()>) -> Self {
        Self {
            release: Mutex::new(release),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Predictor for GatedPredictor {
    fn localize(&self, _image_path: &Path) -> Result<PredictionResult, PredictError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        // Bounded so a broken test cannot hang forever
        self.release
            .lock()
            .unwrap()
            .recv_timeout(Duration::from_secs(10))
            .map_err(|e| PredictError::Transport(e.to_string()))?;
        Ok(new_york())
    }
}

/// Poll `condition` until it holds, panicking after five seconds
pub async fn wait_until<F: Fn() -> bool>(what: &str, condition: F) {
    for _ in 0..500 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for {what}");
}

/// In-memory log sink for a scoped tracing subscriber
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
