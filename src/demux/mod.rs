//! Streaming demultiplexer
//!
//! This module provides:
//! - The chunk-boundary agnostic FLV demuxer
//! - Event types and the per-kind subscriber table
//! - Demuxer configuration

pub mod config;
pub mod demuxer;
pub mod event;

#[cfg(test)]
pub(crate) mod testing;

pub use config::DemuxerConfig;
pub use demuxer::FlvDemuxer;
pub use event::{DemuxData, DemuxEvent, EventKind};
