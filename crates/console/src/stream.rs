//! Resilient live-log tailing.
//!
//! Each call to [`StreamSession::start`] opens a new generation. A tail task
//! owns the [`GenerationToken`] of the generation it was started for and
//! re-checks it after every suspension point, so at most one tail appends
//! to the console and stale output is never interleaved. Cancellation is
//! cooperative: a superseded tail notices on its next chunk or error.
//!
//! Advancing the generation and the check-then-append of a chunk share one
//! lock. Once `start` returns, no older tail can append, even when tails run
//! on different worker threads.

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use anyhow::Result;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use trainerdeck_api_client::{ApiClient, LogResponse};
use trainerdeck_core::console::{ChunkAppender, ConsoleSink};
use trainerdeck_runtime_config::StreamSettings;

/// One open byte stream.
pub trait LogStream: Send {
    /// Next chunk, `None` when the backend closed the stream.
    fn next_chunk(&mut self) -> impl Future<Output = Result<Option<Vec<u8>>>> + Send;
}

/// Something that can open the remote log tail.
pub trait LogSource: Send + Sync + 'static {
    type Stream: LogStream;

    fn open(&self) -> impl Future<Output = Result<Self::Stream>> + Send;
}

impl LogStream for LogResponse {
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        Ok(LogResponse::next_chunk(self).await?)
    }
}

impl LogSource for ApiClient {
    type Stream = LogResponse;

    async fn open(&self) -> Result<LogResponse> {
        Ok(self.stream_logs().await?)
    }
}

/// Generation counter shared by a session and its tokens.
#[derive(Debug, Default)]
struct Generations {
    current: AtomicU64,
    /// Held while advancing and while a tail appends.
    gate: Mutex<()>,
}

impl Generations {
    fn advance(&self) -> u64 {
        let _gate = self.gate.lock().expect("generation gate poisoned");
        self.current.fetch_add(1, Ordering::SeqCst) + 1
    }
}

/// Identifies one logical tail attempt.
#[derive(Debug, Clone)]
pub struct GenerationToken {
    generations: Arc<Generations>,
    id: u64,
}

impl GenerationToken {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Whether no newer generation has been started since this one.
    pub fn is_current(&self) -> bool {
        self.generations.current.load(Ordering::SeqCst) == self.id
    }

    /// Run `f` only while this generation is current, excluding any
    /// concurrent advance until it returns.
    fn while_current<R>(&self, f: impl FnOnce() -> R) -> Option<R> {
        let _gate = self.generations.gate.lock().expect("generation gate poisoned");
        self.is_current().then(f)
    }
}

/// Pauses of the reconnect loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamTiming {
    /// After a failed open or read.
    pub reconnect_delay: Duration,
    /// After the backend ended the stream cleanly.
    pub reopen_delay: Duration,
}

impl Default for StreamTiming {
    fn default() -> Self {
        Self::from(&StreamSettings::default())
    }
}

impl From<&StreamSettings> for StreamTiming {
    fn from(settings: &StreamSettings) -> Self {
        Self {
            reconnect_delay: settings.reconnect_delay(),
            reopen_delay: settings.reopen_delay(),
        }
    }
}

/// Owns the generation counter and spawns tail tasks.
pub struct StreamSession<S> {
    source: Arc<S>,
    sink: Arc<dyn ConsoleSink>,
    generations: Arc<Generations>,
    timing: StreamTiming,
}

impl<S: LogSource> StreamSession<S> {
    pub fn new(source: Arc<S>, sink: Arc<dyn ConsoleSink>, timing: StreamTiming) -> Self {
        Self {
            source,
            sink,
            generations: Arc::new(Generations::default()),
            timing,
        }
    }

    /// Invalidate every earlier generation and start tailing under a new one.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) -> (GenerationToken, JoinHandle<()>) {
        let token = self.advance();
        info!(generation = token.id(), "starting log tail");
        let handle = tokio::spawn(tail(
            token.clone(),
            Arc::clone(&self.source),
            Arc::clone(&self.sink),
            self.timing,
        ));
        (token, handle)
    }

    /// Invalidate the running generation without starting another.
    pub fn stop(&self) {
        let token = self.advance();
        debug!(generation = token.id(), "log tail stopped");
    }

    pub fn is_current(&self, token: &GenerationToken) -> bool {
        Arc::ptr_eq(&self.generations, &token.generations) && token.is_current()
    }

    pub fn current_generation(&self) -> u64 {
        self.generations.current.load(Ordering::SeqCst)
    }

    fn advance(&self) -> GenerationToken {
        GenerationToken {
            generations: Arc::clone(&self.generations),
            id: self.generations.advance(),
        }
    }
}

enum PumpEnd {
    /// The backend closed the stream.
    Closed,
    Superseded,
}

async fn tail<S: LogSource>(
    token: GenerationToken,
    source: Arc<S>,
    sink: Arc<dyn ConsoleSink>,
    timing: StreamTiming,
) {
    while token.is_current() {
        match pump(&token, source.as_ref(), &sink).await {
            Ok(PumpEnd::Superseded) => break,
            Ok(PumpEnd::Closed) => {
                debug!(generation = token.id(), "log stream closed; reopening");
                tokio::time::sleep(timing.reopen_delay).await;
            }
            Err(err) => {
                if !token.is_current() {
                    break;
                }
                debug!(generation = token.id(), "log stream lost ({err:#}); reconnecting");
                tokio::time::sleep(timing.reconnect_delay).await;
            }
        }
    }
    debug!(generation = token.id(), "log tail superseded");
}

async fn pump<S: LogSource>(
    token: &GenerationToken,
    source: &S,
    sink: &Arc<dyn ConsoleSink>,
) -> Result<PumpEnd> {
    let mut stream = source.open().await?;
    let mut appender = ChunkAppender::new(Arc::clone(sink));
    loop {
        let chunk = stream.next_chunk().await;
        if !token.is_current() {
            return Ok(PumpEnd::Superseded);
        }
        match chunk? {
            Some(bytes) => {
                if token.while_current(|| appender.push(&bytes)).is_none() {
                    return Ok(PumpEnd::Superseded);
                }
            }
            None => {
                let end = match token.while_current(|| appender.finish()) {
                    Some(()) => PumpEnd::Closed,
                    None => PumpEnd::Superseded,
                };
                return Ok(end);
            }
        }
    }
}
