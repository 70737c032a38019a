//! flv-demux: Incremental FLV demuxer
//!
//! This library turns an FLV byte stream into codec-ready units:
//! - H.264 NAL units re-framed from AVCC length prefixes to Annex-B start codes
//! - Raw AAC access units wrapped in ADTS headers
//! - Per-tag video and audio metadata
//!
//! Input can arrive in chunks of any size. Results are delivered to
//! handlers subscribed per event kind.
//!
//! # Example: Feeding chunks by hand
//!
//! ```no_run
//! use flv_demux::{DemuxData, DemuxEvent, EventKind, FlvDemuxer};
//!
//! # fn main() -> std::io::Result<()> {
//! let mut demuxer = FlvDemuxer::new();
//!
//! demuxer.subscribe(EventKind::Data, |event| match event {
//!     DemuxEvent::Data(DemuxData::AvcNalu(nalu)) => println!("nalu pts={}", nalu.pts),
//!     DemuxEvent::Data(DemuxData::AdtsFrame(frame)) => println!("aac ts={}", frame.timestamp),
//!     _ => {}
//! });
//! demuxer.subscribe(EventKind::Error, |event| eprintln!("{:?}", event));
//!
//! let bytes = std::fs::read("input.flv")?;
//! for chunk in bytes.chunks(4096) {
//!     demuxer.parse(chunk);
//! }
//! demuxer.finish();
//! # Ok(())
//! # }
//! ```

pub mod demux;
pub mod error;
pub mod media;
pub mod reader;
pub mod stats;
pub mod util;

// Re-export main types for convenience
pub use demux::{DemuxData, DemuxEvent, DemuxerConfig, EventKind, FlvDemuxer};
pub use error::{DemuxError, Error, Result};
pub use reader::{FlvReader, ReaderConfig, StopHandle};
pub use stats::DemuxStats;
