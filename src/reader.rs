//! Async driver feeding a demuxer from a byte source
//!
//! The demuxer itself is synchronous. This module pulls chunks from any
//! `tokio::io::AsyncRead` and feeds them to `FlvDemuxer::parse()` until the
//! source ends, fails, times out or is stopped.
//!
//! ```no_run
//! use flv_demux::{DemuxData, DemuxEvent, EventKind, FlvDemuxer, FlvReader, ReaderConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let file = tokio::fs::File::open("input.flv").await?;
//!
//!     let mut demuxer = FlvDemuxer::new();
//!     demuxer.subscribe(EventKind::Data, |event| {
//!         if let DemuxEvent::Data(DemuxData::AvcNalu(nalu)) = event {
//!             println!("NALU {:?} at {}ms, {} bytes", nalu.nalu_type, nalu.pts, nalu.data.len());
//!         }
//!     });
//!
//!     let mut reader = FlvReader::new(file, demuxer, ReaderConfig::default());
//!     reader.run().await?;
//!     println!("{:?}", reader.demuxer().stats());
//!     Ok(())
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::watch;

use crate::demux::FlvDemuxer;
use crate::error::{Error, Result};

/// Reader configuration
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Maximum bytes requested from the source per read
    pub read_buffer_size: usize,

    /// Give up when a single read stalls this long (None = wait forever)
    pub read_timeout: Option<Duration>,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            read_buffer_size: 64 * 1024, // 64KB
            read_timeout: None,
        }
    }
}

impl ReaderConfig {
    /// Set the per-read buffer size
    pub fn read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size;
        self
    }

    /// Set the read timeout
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    fn validate(&self) -> Result<()> {
        if self.read_buffer_size == 0 {
            return Err(Error::Config("read buffer size must be non-zero".into()));
        }
        if self.read_timeout == Some(Duration::ZERO) {
            return Err(Error::Config("read timeout must be non-zero".into()));
        }
        Ok(())
    }
}

/// Cloneable handle that stops a running [`FlvReader`].
///
/// Stopping prevents the next read and the next `parse()`; a `parse()`
/// already running completes first.
#[derive(Debug, Clone)]
pub struct StopHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_stopped(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Drives a [`FlvDemuxer`] from an async byte source
pub struct FlvReader<R> {
    source: R,
    demuxer: FlvDemuxer,
    config: ReaderConfig,
    stop_tx: Arc<watch::Sender<bool>>,
    stop_rx: watch::Receiver<bool>,
}

impl<R: AsyncRead + Unpin> FlvReader<R> {
    pub fn new(source: R, demuxer: FlvDemuxer, config: ReaderConfig) -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            source,
            demuxer,
            config,
            stop_tx: Arc::new(tx),
            stop_rx: rx,
        }
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            tx: Arc::clone(&self.stop_tx),
        }
    }

    pub fn demuxer(&self) -> &FlvDemuxer {
        &self.demuxer
    }

    pub fn into_demuxer(self) -> FlvDemuxer {
        self.demuxer
    }

    /// Read until the source is exhausted.
    ///
    /// - end of source: `Done` is emitted and `Ok(())` returned
    /// - I/O failure: an `Error(Transport)` event, then `Err(Error::Io)`
    /// - read timeout: a `Reconnect` event, then `Err(Error::Timeout)`
    /// - stop handle: `Err(Error::Stopped)`, no event
    /// - stream rejected by the demuxer: `Err(Error::Demux)`
    pub async fn run(&mut self) -> Result<()> {
        self.config.validate()?;

        let mut buf = vec![0u8; self.config.read_buffer_size];
        let timeout = self.config.read_timeout;

        loop {
            if *self.stop_rx.borrow() {
                tracing::debug!(position = self.demuxer.position(), "Reader stopped");
                return Err(Error::Stopped);
            }

            let read = tokio::select! {
                biased;
                _ = self.stop_rx.changed() => continue,
                res = read_chunk(&mut self.source, &mut buf, timeout) => res,
            };

            match read {
                Ok(0) => {
                    tracing::debug!(position = self.demuxer.position(), "Source exhausted");
                    self.demuxer.finish();
                    return Ok(());
                }
                Ok(n) => {
                    if *self.stop_rx.borrow() {
                        tracing::debug!(dropped = n, "Reader stopped");
                        return Err(Error::Stopped);
                    }

                    self.demuxer.parse(&buf[..n]);

                    if let Some(e) = self.demuxer.fatal_error() {
                        return Err(Error::Demux(e.clone()));
                    }
                }
                Err(Error::Timeout) => {
                    tracing::warn!(timeout = ?timeout, "Read timed out");
                    self.demuxer.notify_reconnect();
                    return Err(Error::Timeout);
                }
                Err(e) => {
                    tracing::debug!(error = %e, "Read failed");
                    self.demuxer.notify_transport_error(e.to_string());
                    return Err(e);
                }
            }
        }
    }
}

async fn read_chunk<R: AsyncRead + Unpin>(
    source: &mut R,
    buf: &mut [u8],
    timeout: Option<Duration>,
) -> Result<usize> {
    match timeout {
        Some(limit) => match tokio::time::timeout(limit, source.read(buf)).await {
            Ok(res) => Ok(res?),
            Err(_) => Err(Error::Timeout),
        },
        None => Ok(source.read(buf).await?),
    }
}
