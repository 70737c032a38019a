//! Stream builders shared by the demuxer and reader tests

use std::sync::{Arc, Mutex};

use super::demuxer::FlvDemuxer;
use super::event::{DemuxEvent, EventKind};

pub const SPS: [u8; 4] = [0x67, 0x64, 0x00, 0x1F];
pub const PPS: [u8; 3] = [0x68, 0xEF, 0x38];

/// Writes an FLV byte stream tag by tag
pub struct FlvStreamBuilder {
    data: Vec<u8>,
    prev_tag_size: u32,
}

impl FlvStreamBuilder {
    /// Version 1 header with audio and video flags set
    pub fn new() -> Self {
        Self::with_header(1, 0x05)
    }

    pub fn with_header(version: u8, flags: u8) -> Self {
        let mut data = b"FLV".to_vec();
        data.push(version);
        data.push(flags);
        data.extend_from_slice(&9u32.to_be_bytes());
        Self {
            data,
            prev_tag_size: 0,
        }
    }

    /// PreviousTagSize, then an 11-byte tag header and the body
    pub fn tag(mut self, tag_type: u8, timestamp: u32, body: &[u8]) -> Self {
        let size = body.len() as u32;
        self.data.extend_from_slice(&self.prev_tag_size.to_be_bytes());
        self.data.push(tag_type);
        self.data.extend_from_slice(&size.to_be_bytes()[1..]);
        self.data.extend_from_slice(&[
            ((timestamp >> 16) & 0xFF) as u8,
            ((timestamp >> 8) & 0xFF) as u8,
            (timestamp & 0xFF) as u8,
            ((timestamp >> 24) & 0xFF) as u8,
        ]);
        self.data.extend_from_slice(&[0, 0, 0]);
        self.data.extend_from_slice(body);
        self.prev_tag_size = 11 + size;
        self
    }

    pub fn audio(self, timestamp: u32, body: &[u8]) -> Self {
        self.tag(8, timestamp, body)
    }

    pub fn video(self, timestamp: u32, body: &[u8]) -> Self {
        self.tag(9, timestamp, body)
    }

    pub fn script(self, timestamp: u32, body: &[u8]) -> Self {
        self.tag(18, timestamp, body)
    }

    pub fn build(self) -> Vec<u8> {
        self.data
    }

    /// Append the PreviousTagSize that closes a complete file
    pub fn build_with_trailer(mut self) -> Vec<u8> {
        self.data.extend_from_slice(&self.prev_tag_size.to_be_bytes());
        self.data
    }
}

/// AVC sequence header tag body
pub fn avc_sequence_header(sps: &[&[u8]], pps: &[&[u8]], length_size: u8) -> Vec<u8> {
    let mut body = vec![0x17, 0x00, 0x00, 0x00, 0x00];
    body.extend_from_slice(&[0x01, 0x64, 0x00, 0x1F]);
    body.push(0xFC | (length_size - 1));
    body.push(0xE0 | sps.len() as u8);
    for set in sps {
        body.extend_from_slice(&(set.len() as u16).to_be_bytes());
        body.extend_from_slice(set);
    }
    body.push(pps.len() as u8);
    for set in pps {
        body.extend_from_slice(&(set.len() as u16).to_be_bytes());
        body.extend_from_slice(set);
    }
    body
}

/// AVC NALU tag body with length prefixes of `length_size` bytes
pub fn avc_nalus(length_size: u8, nalus: &[&[u8]], composition_time: u32) -> Vec<u8> {
    let keyframe = nalus.first().map(|n| (n[0] & 0x1F) == 5).unwrap_or(false);
    let mut body = vec![if keyframe { 0x17 } else { 0x27 }, 0x01];
    body.extend_from_slice(&composition_time.to_be_bytes()[1..]);
    for nalu in nalus {
        let len = (nalu.len() as u32).to_be_bytes();
        body.extend_from_slice(&len[4 - length_size as usize..]);
        body.extend_from_slice(nalu);
    }
    body
}

/// AAC LC, 44100 Hz, stereo
pub fn aac_sequence_header() -> Vec<u8> {
    vec![0xAF, 0x00, 0x12, 0x10]
}

pub fn aac_raw(payload: &[u8]) -> Vec<u8> {
    let mut body = vec![0xAF, 0x01];
    body.extend_from_slice(payload);
    body
}

/// Record every event of every kind, in delivery order
pub fn collect_events(demuxer: &mut FlvDemuxer) -> Arc<Mutex<Vec<DemuxEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    for kind in [
        EventKind::Data,
        EventKind::Error,
        EventKind::Done,
        EventKind::Reconnect,
    ] {
        let sink = Arc::clone(&events);
        demuxer.subscribe(kind, move |event| sink.lock().unwrap().push(event.clone()));
    }
    events
}
