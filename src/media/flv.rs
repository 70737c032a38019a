//! FLV wire structures
//!
//! FLV (Flash Video) interleaves audio, video and script "tags", each of which
//! declares its own type and payload size.
//!
//! ```text
//! +============+==================+==============+==================+=========
//! | FLV Header | PrevTagSize0 (0) | Tag 1        | PrevTagSize1     | Tag 2 ...
//! | (9 bytes)  | (4 bytes)        | (11+N bytes) | (4 bytes)        |
//! +============+==================+==============+==================+=========
//! ```
//!
//! File header:
//! ```text
//! +-----+-----+-----+---------+-------+----------------+
//! | 'F' | 'L' | 'V' | Version | Flags | HeaderSize(4)  |
//! +-----+-----+-----+---------+-------+----------------+
//! Flags: bit 2 = audio present, bit 0 = video present
//! ```
//!
//! Tag header:
//! ```text
//! +--------+-------------+-----------+--------+-------------+
//! | Type(1)| DataSize(3) | TS(3)     | TSExt(1)| StreamID(3) | Data(N)
//! +--------+-------------+-----------+--------+-------------+
//! ```
//!
//! Video data:
//! ```text
//! +----------+----------+
//! | FrameType| CodecID  | CodecData...
//! | (4 bits) | (4 bits) |
//! +----------+----------+
//! ```
//!
//! Audio data:
//! ```text
//! +-----------+---------+----------+----------+
//! |SoundFormat|SoundRate|SoundSize |SoundType | AudioData...
//! | (4 bits)  | (2 bits)| (1 bit)  | (1 bit)  |
//! +-----------+---------+----------+----------+
//! ```

use crate::error::DemuxError;
use crate::util::combine_bits;

/// "FLV" in ASCII
pub const FLV_SIGNATURE: [u8; 3] = [0x46, 0x4C, 0x56];

/// The only FLV version in existence
pub const FLV_VERSION: u8 = 1;

/// File header size; the header-size field on the wire is ignored
pub const FLV_HEADER_SIZE: usize = 9;

/// Size of the PreviousTagSize field preceding every tag header
pub const PREV_TAG_SIZE_LEN: usize = 4;

/// Size of a tag header
pub const TAG_HEADER_SIZE: usize = 11;

/// PreviousTagSize + tag header
pub const TAG_PREFIX_SIZE: usize = PREV_TAG_SIZE_LEN + TAG_HEADER_SIZE;

/// FLV tag type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlvTagType {
    Audio,
    Video,
    Script,
    /// Any other type byte; the tag is skipped by its declared size
    Unknown(u8),
}

impl FlvTagType {
    pub fn from_byte(b: u8) -> Self {
        match b {
            8 => FlvTagType::Audio,
            9 => FlvTagType::Video,
            18 => FlvTagType::Script,
            other => FlvTagType::Unknown(other),
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            FlvTagType::Audio => 8,
            FlvTagType::Video => 9,
            FlvTagType::Script => 18,
            FlvTagType::Unknown(b) => b,
        }
    }
}

/// Stream flags from the FLV file header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreamFlags {
    pub has_audio: bool,
    pub has_video: bool,
    pub version: u8,
}

impl StreamFlags {
    /// Parse the 9-byte file header.
    ///
    /// The signature is checked separately by the demuxer, as soon as three
    /// bytes are available.
    pub fn parse(header: &[u8; FLV_HEADER_SIZE]) -> Result<Self, DemuxError> {
        let version = header[3];
        if version != FLV_VERSION {
            return Err(DemuxError::Format(format!(
                "FLV version {} is not supported",
                version
            )));
        }

        let flags = header[4];
        Ok(StreamFlags {
            has_audio: (flags & 0b0000_0100) != 0,
            has_video: (flags & 0b0000_0001) != 0,
            version,
        })
    }
}

/// Check the first three stream bytes against the FLV signature
pub fn has_signature(data: &[u8]) -> bool {
    data.len() >= FLV_SIGNATURE.len() && data[..FLV_SIGNATURE.len()] == FLV_SIGNATURE
}

/// Parsed 11-byte tag header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagHeader {
    pub tag_type: FlvTagType,
    /// Payload size in bytes (24 bits)
    pub data_size: u32,
    /// Timestamp in milliseconds, extension byte as the high 8 bits
    pub timestamp: u32,
    /// Stream id (24 bits, always 0 in practice)
    pub stream_id: u32,
}

impl TagHeader {
    pub fn parse(bytes: &[u8; TAG_HEADER_SIZE]) -> Self {
        TagHeader {
            tag_type: FlvTagType::from_byte(bytes[0]),
            data_size: combine_bits(&bytes[1..4]),
            timestamp: combine_bits(&[bytes[7], bytes[4], bytes[5], bytes[6]]),
            stream_id: combine_bits(&bytes[8..11]),
        }
    }

    /// PreviousTagSize the next record should carry for this tag
    pub fn tag_size(&self) -> u32 {
        TAG_HEADER_SIZE as u32 + self.data_size
    }
}

/// Video frame type (upper 4 bits of first byte)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoFrameType {
    /// Keyframe (for AVC, a seekable frame)
    Keyframe = 1,
    /// Inter frame (for AVC, a non-seekable frame)
    InterFrame = 2,
    /// Disposable inter frame (H.263 only)
    DisposableInterFrame = 3,
    /// Generated keyframe (reserved for server use)
    GeneratedKeyframe = 4,
    /// Video info/command frame
    VideoInfoFrame = 5,
}

impl VideoFrameType {
    pub fn from_byte(b: u8) -> Option<Self> {
        match (b >> 4) & 0x0F {
            1 => Some(VideoFrameType::Keyframe),
            2 => Some(VideoFrameType::InterFrame),
            3 => Some(VideoFrameType::DisposableInterFrame),
            4 => Some(VideoFrameType::GeneratedKeyframe),
            5 => Some(VideoFrameType::VideoInfoFrame),
            _ => None,
        }
    }

    pub fn is_keyframe(&self) -> bool {
        matches!(self, VideoFrameType::Keyframe | VideoFrameType::GeneratedKeyframe)
    }
}

/// Video codec ID (lower 4 bits of first byte)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoCodec {
    SorensonH263 = 2,
    ScreenVideo = 3,
    Vp6 = 4,
    Vp6Alpha = 5,
    ScreenVideoV2 = 6,
    /// AVC (H.264), the only codec the demuxer reframes
    Avc = 7,
}

impl VideoCodec {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b & 0x0F {
            2 => Some(VideoCodec::SorensonH263),
            3 => Some(VideoCodec::ScreenVideo),
            4 => Some(VideoCodec::Vp6),
            5 => Some(VideoCodec::Vp6Alpha),
            6 => Some(VideoCodec::ScreenVideoV2),
            7 => Some(VideoCodec::Avc),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            VideoCodec::SorensonH263 => "Sorenson H.263",
            VideoCodec::ScreenVideo => "Screen video",
            VideoCodec::Vp6 => "VP6",
            VideoCodec::Vp6Alpha => "VP6 alpha",
            VideoCodec::ScreenVideoV2 => "Screen video v2",
            VideoCodec::Avc => "AVC",
        }
    }
}

/// Audio format (upper 4 bits of first byte)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    LinearPcmPlatform = 0,
    Adpcm = 1,
    Mp3 = 2,
    LinearPcmLe = 3,
    Nellymoser16kMono = 4,
    Nellymoser8kMono = 5,
    Nellymoser = 6,
    G711ALaw = 7,
    G711MuLaw = 8,
    /// AAC, the only format the demuxer reframes
    Aac = 10,
    Speex = 11,
    Mp38k = 14,
    DeviceSpecific = 15,
}

impl AudioFormat {
    pub fn from_byte(b: u8) -> Option<Self> {
        match (b >> 4) & 0x0F {
            0 => Some(AudioFormat::LinearPcmPlatform),
            1 => Some(AudioFormat::Adpcm),
            2 => Some(AudioFormat::Mp3),
            3 => Some(AudioFormat::LinearPcmLe),
            4 => Some(AudioFormat::Nellymoser16kMono),
            5 => Some(AudioFormat::Nellymoser8kMono),
            6 => Some(AudioFormat::Nellymoser),
            7 => Some(AudioFormat::G711ALaw),
            8 => Some(AudioFormat::G711MuLaw),
            10 => Some(AudioFormat::Aac),
            11 => Some(AudioFormat::Speex),
            14 => Some(AudioFormat::Mp38k),
            15 => Some(AudioFormat::DeviceSpecific),
            _ => None,
        }
    }
}

/// Audio sample rate (bits 2-3 of first byte)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioSampleRate {
    Rate5512 = 0,
    Rate11025 = 1,
    Rate22050 = 2,
    Rate44100 = 3,
}

impl AudioSampleRate {
    pub fn from_byte(b: u8) -> Self {
        match (b >> 2) & 0x03 {
            0 => AudioSampleRate::Rate5512,
            1 => AudioSampleRate::Rate11025,
            2 => AudioSampleRate::Rate22050,
            _ => AudioSampleRate::Rate44100,
        }
    }

    pub fn to_hz(&self) -> u32 {
        match self {
            AudioSampleRate::Rate5512 => 5512,
            AudioSampleRate::Rate11025 => 11025,
            AudioSampleRate::Rate22050 => 22050,
            AudioSampleRate::Rate44100 => 44100,
        }
    }
}
