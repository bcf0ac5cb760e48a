//! Fakes shared by the engine and loader tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::io::{self, Cursor, Read};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use bytes::Bytes;
use il_core::ports::{
    ContentResolverPort, HttpResponse, HttpTransportPort, ImageDecoderPort, KeyValueStorePort,
};
use il_core::{Bitmap, ContentHandle, Dimensions, FetchEvent};
use il_infra::{DiskCacheRegistry, InMemoryKeyValueStore, MemoryCache};
use tempfile::TempDir;
use tokio::sync::Semaphore;
use tokio_util::io::StreamReader;
use tokio_util::sync::CancellationToken;
use url::Url;

use super::{EventEmitter, FetchEngine};

const MAGIC: &[u8; 3] = b"IMG";
const HEADER_LEN: usize = 11;

/// Encoded fake image: `IMG`, width and height as little-endian u32, then
/// `padding` filler bytes.
pub(crate) fn fake_image(width: u32, height: u32, padding: usize) -> Vec<u8> {
    let mut bytes = MAGIC.to_vec();
    bytes.extend_from_slice(&width.to_le_bytes());
    bytes.extend_from_slice(&height.to_le_bytes());
    bytes.resize(HEADER_LEN + padding, 0xAB);
    bytes
}

fn parse_header(bytes: &[u8]) -> Option<Dimensions> {
    if bytes.len() < HEADER_LEN || &bytes[..3] != MAGIC {
        return None;
    }
    let width = u32::from_le_bytes(bytes[3..7].try_into().ok()?);
    let height = u32::from_le_bytes(bytes[7..11].try_into().ok()?);
    Some(Dimensions::new(width, height))
}

/// Decoder for [`fake_image`] bytes that counts its calls.
#[derive(Default)]
pub(crate) struct FakeDecoder {
    probes: AtomicUsize,
    decodes: AtomicUsize,
    orientations: AtomicUsize,
}

impl FakeDecoder {
    /// `(probe calls, decode calls)`.
    pub(crate) fn calls(&self) -> (usize, usize) {
        (
            self.probes.load(Ordering::SeqCst),
            self.decodes.load(Ordering::SeqCst),
        )
    }

    pub(crate) fn orientation_calls(&self) -> usize {
        self.orientations.load(Ordering::SeqCst)
    }
}

impl ImageDecoderPort for FakeDecoder {
    fn probe_bounds(&self, bytes: &[u8]) -> Result<Option<Dimensions>> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        Ok(parse_header(bytes))
    }

    fn decode(&self, bytes: &[u8], sample_size: u32) -> Result<Bitmap> {
        self.decodes.fetch_add(1, Ordering::SeqCst);
        let Some(bounds) = parse_header(bytes) else {
            bail!("not a fake image");
        };
        let sample_size = sample_size.max(1);
        Ok(Bitmap::blank(
            (bounds.width / sample_size).max(1),
            (bounds.height / sample_size).max(1),
        ))
    }

    fn correct_orientation(&self, bitmap: Bitmap, _metadata: &[u8]) -> Result<Bitmap> {
        self.orientations.fetch_add(1, Ordering::SeqCst);
        Ok(bitmap)
    }
}

/// Scripted response. `body: None` means the response carries no body.
pub(crate) struct FakeResponse {
    status: u16,
    headers: Vec<(String, String)>,
    body: Option<Vec<Vec<u8>>>,
}

impl FakeResponse {
    pub(crate) fn status(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: None,
        }
    }

    /// `200 OK` streaming `chunks` one per read.
    pub(crate) fn ok_chunked(chunks: Vec<Vec<u8>>, content_length: Option<u64>) -> Self {
        let mut response = Self::status(200);
        response.body = Some(chunks);
        match content_length {
            Some(len) => response.with_header("content-length", &len.to_string()),
            None => response,
        }
    }

    pub(crate) fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub(crate) fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(vec![body]);
        self
    }

    fn into_response(self) -> HttpResponse {
        let mut response = HttpResponse::new(self.status);
        for (name, value) in &self.headers {
            response = response.with_header(name, value.as_str());
        }
        if let Some(chunks) = self.body {
            let stream = futures::stream::iter(
                chunks
                    .into_iter()
                    .map(|chunk| Ok::<_, io::Error>(Bytes::from(chunk))),
            );
            response = response.with_body(Box::pin(StreamReader::new(stream)));
        }
        response
    }
}

/// Transport replaying queued responses in order.
///
/// With [`hold_gets`](Self::hold_gets) every GET waits for a permit first,
/// which lets tests observe requests in flight.
#[derive(Default)]
pub(crate) struct FakeTransport {
    gets: Mutex<VecDeque<FakeResponse>>,
    heads: Mutex<VecDeque<FakeResponse>>,
    get_calls: AtomicUsize,
    head_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    gate: Mutex<Option<Arc<Semaphore>>>,
}

impl FakeTransport {
    pub(crate) fn push_get(&self, response: FakeResponse) {
        self.gets.lock().unwrap().push_back(response);
    }

    pub(crate) fn push_head(&self, response: FakeResponse) {
        self.heads.lock().unwrap().push_back(response);
    }

    pub(crate) fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn head_calls(&self) -> usize {
        self.head_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Block GETs until permits are added to the returned semaphore.
    pub(crate) fn hold_gets(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.gate.lock().unwrap() = Some(gate.clone());
        gate
    }
}

#[async_trait]
impl HttpTransportPort for FakeTransport {
    async fn get(&self, url: &Url) -> Result<HttpResponse> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        let next = self.gets.lock().unwrap().pop_front();
        next.map(FakeResponse::into_response)
            .ok_or_else(|| anyhow!("no GET response queued for {url}"))
    }

    async fn head(&self, url: &Url) -> Result<HttpResponse> {
        self.head_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.heads.lock().unwrap().pop_front();
        next.map(FakeResponse::into_response)
            .ok_or_else(|| anyhow!("no HEAD response queued for {url}"))
    }
}

#[derive(Default)]
pub(crate) struct FakeContentResolver {
    entries: Mutex<HashMap<String, Vec<u8>>>,
    broken: Mutex<HashSet<String>>,
}

impl ContentResolverPort for FakeContentResolver {
    fn open(&self, handle: &ContentHandle) -> Result<Option<Box<dyn Read + Send>>> {
        let Some(bytes) = self.entries.lock().unwrap().get(handle.as_str()).cloned() else {
            return Ok(None);
        };
        let reader: Box<dyn Read + Send> =
            if self.broken.lock().unwrap().contains(handle.as_str()) {
                Box::new(Cursor::new(bytes).chain(BrokenReader))
            } else {
                Box::new(Cursor::new(bytes))
            };
        Ok(Some(reader))
    }
}

/// Fails every read, like a source that disappeared mid-copy.
struct BrokenReader;

impl Read for BrokenReader {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::other("source went away"))
    }
}

/// Empty store that fails on `put_string`.
struct ReadOnlyStore;

#[async_trait]
impl KeyValueStorePort for ReadOnlyStore {
    async fn get_string(&self, _key: &str) -> Result<Option<String>> {
        Ok(None)
    }

    async fn put_string(&self, _key: &str, _value: &str) -> Result<()> {
        bail!("store is read-only")
    }

    async fn entries(&self) -> Result<Vec<(String, String)>> {
        Ok(Vec::new())
    }

    async fn clear(&self) -> Result<()> {
        Ok(())
    }
}

/// An engine wired to fakes, a real memory cache and a real disk registry
/// in a temporary directory.
pub(crate) struct Fixture {
    pub temp: TempDir,
    pub transport: Arc<FakeTransport>,
    pub decoder: Arc<FakeDecoder>,
    pub content: Arc<FakeContentResolver>,
    pub memory: Arc<MemoryCache>,
    pub disk: Arc<DiskCacheRegistry>,
    pub engine: Arc<FetchEngine>,
}

impl Fixture {
    pub(crate) fn new() -> Self {
        Self::build(true, Arc::new(InMemoryKeyValueStore::new()))
    }

    pub(crate) fn without_content_resolver() -> Self {
        Self::build(false, Arc::new(InMemoryKeyValueStore::new()))
    }

    /// Registry whose store refuses every write.
    pub(crate) fn with_read_only_registry() -> Self {
        Self::build(true, Arc::new(ReadOnlyStore))
    }

    fn build(with_content: bool, store: Arc<dyn KeyValueStorePort>) -> Self {
        let temp = TempDir::new().unwrap();
        let transport = Arc::new(FakeTransport::default());
        let decoder = Arc::new(FakeDecoder::default());
        let content = Arc::new(FakeContentResolver::default());
        let memory = Arc::new(MemoryCache::new(64 * 1024));
        let disk = Arc::new(
            DiskCacheRegistry::new(temp.path().join("cache"), store).unwrap(),
        );

        let mut engine =
            FetchEngine::new(transport.clone(), decoder.clone(), memory.clone(), disk.clone());
        if with_content {
            engine = engine.with_content_resolver(content.clone());
        }

        Self {
            temp,
            transport,
            decoder,
            content,
            memory,
            disk,
            engine: Arc::new(engine),
        }
    }

    pub(crate) fn write_file(&self, name: &str, bytes: &[u8]) -> PathBuf {
        let path = self.temp.path().join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    pub(crate) fn add_content(&self, handle: &str, bytes: Vec<u8>) {
        self.content
            .entries
            .lock()
            .unwrap()
            .insert(handle.to_string(), bytes);
    }

    /// Content that yields `prefix` and then fails.
    pub(crate) fn add_broken_content(&self, handle: &str, prefix: Vec<u8>) {
        self.add_content(handle, prefix);
        self.content
            .broken
            .lock()
            .unwrap()
            .insert(handle.to_string());
    }

    /// Files currently in the disk cache directory.
    pub(crate) fn cache_files(&self) -> usize {
        std::fs::read_dir(self.disk.cache_dir()).unwrap().count()
    }
}

/// Emitter recording everything it forwards.
pub(crate) fn recording_emitter() -> (EventEmitter, Arc<Mutex<Vec<FetchEvent>>>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    let emitter = EventEmitter::new(CancellationToken::new(), move |event| {
        sink.lock().unwrap().push(event)
    });
    (emitter, events)
}
