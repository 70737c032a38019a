//! Streaming FLV demuxer
//!
//! Bytes arrive in chunks of any size. The demuxer appends each chunk to an
//! accumulator, parses the file header once, then frames complete
//! `(PreviousTagSize, TagHeader, TagBody)` records and hands each body to the
//! decoder for its tag type.
//!
//! ```text
//! accumulator:  [ prev(4) | header(11) | body(N) ][ prev(4) | header(11) | bo..
//!               |<------- consumed record ------>||<---- kept for next call -->
//! ```
//!
//! A record is only consumed once its whole body is available, so a chunk
//! boundary may fall anywhere, including inside a bit field.

use bytes::{Buf, BytesMut};

use crate::error::DemuxError;
use crate::media::aac::AudioTag;
use crate::media::flv::{
    has_signature, FlvTagType, StreamFlags, TagHeader, FLV_HEADER_SIZE, FLV_SIGNATURE,
    PREV_TAG_SIZE_LEN, TAG_HEADER_SIZE, TAG_PREFIX_SIZE,
};
use crate::media::h264::VideoTag;
use crate::media::{script, AudioSpecificConfig, AudioTagDecoder, AvcDecoderConfigurationRecord, VideoTagDecoder};
use crate::stats::DemuxStats;
use crate::util::combine_bits;

use super::config::DemuxerConfig;
use super::event::{DemuxData, DemuxEvent, EventBus, EventKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DemuxState {
    /// Accepting input
    Active,
    /// Stream-level error; input is ignored
    Halted,
    /// `finish()` was called
    Finished,
}

/// Incremental FLV demuxer.
///
/// Single-threaded: `parse()` runs to completion and delivers every event it
/// produces before returning.
#[derive(Debug)]
pub struct FlvDemuxer {
    config: DemuxerConfig,
    /// Bytes received but not yet part of a complete record
    buffer: BytesMut,
    /// Bytes consumed since stream start
    position: u64,
    signature_checked: bool,
    flags: Option<StreamFlags>,
    state: DemuxState,
    /// Stream-level error that halted the demuxer
    fatal: Option<DemuxError>,
    /// Size of the last framed tag, expected in the next PreviousTagSize
    last_tag_size: u32,
    video: VideoTagDecoder,
    audio: AudioTagDecoder,
    events: EventBus,
    stats: DemuxStats,
}

impl Default for FlvDemuxer {
    fn default() -> Self {
        Self::new()
    }
}

impl FlvDemuxer {
    /// Create a demuxer with default configuration
    pub fn new() -> Self {
        Self::with_config(DemuxerConfig::default())
    }

    pub fn with_config(config: DemuxerConfig) -> Self {
        Self {
            config,
            buffer: BytesMut::new(),
            position: 0,
            signature_checked: false,
            flags: None,
            state: DemuxState::Active,
            fatal: None,
            last_tag_size: 0,
            video: VideoTagDecoder::new(),
            audio: AudioTagDecoder::new(),
            events: EventBus::new(),
            stats: DemuxStats::new(),
        }
    }

    /// Register a handler for one event kind.
    ///
    /// Handlers of the same kind run in registration order, synchronously,
    /// inside the call that produced the event.
    pub fn subscribe<F>(&mut self, kind: EventKind, handler: F)
    where
        F: FnMut(&DemuxEvent) + Send + 'static,
    {
        self.events.subscribe(kind, Box::new(handler));
    }

    /// Feed the next chunk of the stream
    pub fn parse(&mut self, chunk: &[u8]) {
        if self.state != DemuxState::Active {
            tracing::trace!(len = chunk.len(), state = ?self.state, "Ignoring chunk");
            return;
        }

        self.stats.bytes_received += chunk.len() as u64;
        self.buffer.extend_from_slice(chunk);

        if !self.signature_checked {
            if self.buffer.len() < FLV_SIGNATURE.len() {
                return;
            }
            if !has_signature(&self.buffer) {
                self.report(DemuxError::Format(
                    "stream does not start with the FLV signature".into(),
                ));
                return;
            }
            self.signature_checked = true;
        }

        if self.position < FLV_HEADER_SIZE as u64 && !self.parse_header() {
            return;
        }

        self.parse_body();
    }

    /// Signal end of input and emit `Done`.
    ///
    /// Anything left over beyond a final PreviousTagSize is a tag that never
    /// completed and is reported as `TruncatedRecord` first.
    pub fn finish(&mut self) {
        if self.state == DemuxState::Finished {
            return;
        }

        if self.state == DemuxState::Active {
            let leftover = self.buffer.len();
            let allowed = if self.flags.is_some() { PREV_TAG_SIZE_LEN } else { 0 };
            if leftover > allowed {
                tracing::debug!(leftover = leftover, "Stream ended inside a record");
                self.report(DemuxError::TruncatedRecord("stream ended inside a record"));
            }
        }

        self.state = DemuxState::Finished;
        self.buffer.clear();
        tracing::debug!(position = self.position, "Stream done");
        self.events.emit(&DemuxEvent::Done);
    }

    /// Pass a reconnect hint from the byte source through to subscribers
    pub fn notify_reconnect(&mut self) {
        self.events.emit(&DemuxEvent::Reconnect);
    }

    /// Report a failure of the byte source on the `Error` channel
    pub fn notify_transport_error(&mut self, message: impl Into<String>) {
        self.report(DemuxError::Transport(message.into()));
    }

    /// Flags from the file header, once parsed
    pub fn flags(&self) -> Option<StreamFlags> {
        self.flags
    }

    /// Bytes consumed since stream start
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Bytes held back waiting for the rest of a record
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Whether a stream-level error stopped the demuxer
    pub fn is_halted(&self) -> bool {
        self.state == DemuxState::Halted
    }

    /// The error that halted the demuxer, if any
    pub fn fatal_error(&self) -> Option<&DemuxError> {
        self.fatal.as_ref()
    }

    pub fn is_finished(&self) -> bool {
        self.state == DemuxState::Finished
    }

    pub fn stats(&self) -> &DemuxStats {
        &self.stats
    }

    pub fn config(&self) -> &DemuxerConfig {
        &self.config
    }

    /// Most recent AVC decoder configuration
    pub fn video_config(&self) -> Option<&AvcDecoderConfigurationRecord> {
        self.video.config()
    }

    /// Most recent AAC AudioSpecificConfig
    pub fn audio_config(&self) -> Option<&AudioSpecificConfig> {
        self.audio.config()
    }

    /// Parse the 9-byte file header. Returns true once it has been consumed.
    fn parse_header(&mut self) -> bool {
        if self.buffer.len() < FLV_HEADER_SIZE {
            return false;
        }

        let mut header = [0u8; FLV_HEADER_SIZE];
        header.copy_from_slice(&self.buffer[..FLV_HEADER_SIZE]);

        match StreamFlags::parse(&header) {
            Ok(flags) => {
                tracing::debug!(
                    version = flags.version,
                    has_audio = flags.has_audio,
                    has_video = flags.has_video,
                    "FLV header parsed"
                );
                self.flags = Some(flags);
                self.consume(FLV_HEADER_SIZE);
                true
            }
            Err(e) => {
                self.report(e);
                false
            }
        }
    }

    /// Frame and dispatch every complete record in the accumulator
    fn parse_body(&mut self) {
        let mut consumed = 0;

        while self.buffer.len() - consumed >= TAG_PREFIX_SIZE {
            let record = &self.buffer[consumed..];

            let prev_tag_size = combine_bits(&record[..PREV_TAG_SIZE_LEN]);
            let mut header_bytes = [0u8; TAG_HEADER_SIZE];
            header_bytes.copy_from_slice(&record[PREV_TAG_SIZE_LEN..TAG_PREFIX_SIZE]);
            let header = TagHeader::parse(&header_bytes);

            let data_size = header.data_size as usize;
            if record.len() - TAG_PREFIX_SIZE < data_size {
                tracing::trace!(
                    need = data_size,
                    have = record.len() - TAG_PREFIX_SIZE,
                    "Waiting for tag body"
                );
                break;
            }
            let body = &record[TAG_PREFIX_SIZE..TAG_PREFIX_SIZE + data_size];

            tracing::trace!(
                tag_type = ?header.tag_type,
                size = data_size,
                timestamp = header.timestamp,
                "Tag framed"
            );

            if self.config.verify_previous_tag_size && prev_tag_size != self.last_tag_size {
                tracing::warn!(
                    expected = self.last_tag_size,
                    actual = prev_tag_size,
                    "PreviousTagSize mismatch"
                );
                self.stats.previous_tag_size_mismatches += 1;
            }

            let decoded = match header.tag_type {
                FlvTagType::Video => {
                    self.stats.video_tags += 1;
                    self.video.decode(&header, body).map(video_data)
                }
                FlvTagType::Audio => {
                    self.stats.audio_tags += 1;
                    self.audio.decode(&header, body).map(audio_data)
                }
                FlvTagType::Script => {
                    self.stats.script_tags += 1;
                    if self.config.pass_through_script {
                        Ok(vec![DemuxData::Diagnostic(script::pass_through(&header, body))])
                    } else {
                        Ok(Vec::new())
                    }
                }
                FlvTagType::Unknown(b) => {
                    self.stats.unknown_tags += 1;
                    Err(DemuxError::UnknownTagType(b))
                }
            };

            match decoded {
                Ok(units) => {
                    for unit in units {
                        self.emit_data(unit);
                    }
                }
                Err(e) => self.report(e),
            }

            self.last_tag_size = header.tag_size();
            consumed += TAG_PREFIX_SIZE + data_size;
        }

        if consumed > 0 {
            self.consume(consumed);
        }
    }

    fn consume(&mut self, len: usize) {
        self.buffer.advance(len);
        self.position += len as u64;
        self.stats.bytes_consumed += len as u64;
    }

    fn emit_data(&mut self, data: DemuxData) {
        match &data {
            DemuxData::AvcNalu(_) => self.stats.nalus += 1,
            DemuxData::AdtsFrame(_) => self.stats.adts_frames += 1,
            _ => {}
        }
        self.events.emit(&DemuxEvent::Data(data));
    }

    fn report(&mut self, error: DemuxError) {
        self.stats.errors += 1;
        if error.is_fatal() {
            tracing::warn!(error = %error, position = self.position, "Stream rejected");
            self.state = DemuxState::Halted;
            self.fatal = Some(error.clone());
        } else {
            tracing::debug!(error = %error, position = self.position, "Tag skipped");
        }
        self.events.emit(&DemuxEvent::Error(error));
    }
}

/// NAL units first, then the tag summary
fn video_data(tag: VideoTag) -> Vec<DemuxData> {
    let mut units: Vec<DemuxData> = tag.nalus.into_iter().map(DemuxData::AvcNalu).collect();
    units.push(DemuxData::VideoMetadata(tag.info));
    units
}

fn audio_data(tag: AudioTag) -> Vec<DemuxData> {
    match tag {
        AudioTag::SequenceHeader(info) => vec![DemuxData::AudioMetadata(info)],
        AudioTag::Frame(frame) => vec![DemuxData::AdtsFrame(frame)],
    }
}
