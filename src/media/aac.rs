//! AAC audio tag decoding
//!
//! FLV carries AAC as raw access units. The decoder caches the
//! AudioSpecificConfig from the sequence header and wraps every raw frame in
//! a synthesized ADTS header so the output is self-framed.
//!
//! AAC Audio Packet Structure:
//! ```text
//! +-----------+---------+----------+----------+---------+
//! |SoundFormat|SoundRate|SoundSize |SoundType | AACType | AACData
//! | (4 bits)  | (2 bits)| (1 bit)  | (1 bit)  | (1 byte)|
//! +-----------+---------+----------+----------+---------+
//! ```
//!
//! AACPacketType:
//! - 0: AAC sequence header (AudioSpecificConfig)
//! - 1: AAC raw frame data
//!
//! ADTS header (7 bytes, no CRC):
//! ```text
//! AAAAAAAA AAAABCCD EEFFFFGH HHIJKLMM MMMMMMMM MMMOOOOO OOOOOOPP
//! A sync word   B ID (0 = MPEG-4)  C layer   D protection absent
//! E profile     F frequency index  G private H channel configuration
//! I original    J home   K,L copyright bits  M frame length (incl. header)
//! O buffer fullness (0x7FF = VBR)  P raw data blocks - 1
//! ```

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::DemuxError;
use crate::media::flv::{AudioFormat, AudioSampleRate, TagHeader};
use crate::util::{BitReader, BufferReader};

/// ADTS header length without CRC
pub const ADTS_HEADER_SIZE: usize = 7;

/// Largest value the 13-bit ADTS frame length field can hold
pub const ADTS_MAX_FRAME_SIZE: usize = 0x1FFF;

/// AAC packet type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AacPacketType {
    /// Sequence header (AudioSpecificConfig)
    SequenceHeader = 0,
    /// Raw AAC frame data
    Raw = 1,
}

impl AacPacketType {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(AacPacketType::SequenceHeader),
            1 => Some(AacPacketType::Raw),
            _ => None,
        }
    }
}

/// AAC profile (audio object type)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AacProfile {
    /// AAC Main
    Main = 1,
    /// AAC LC (Low Complexity) - most common
    Lc = 2,
    /// AAC SSR (Scalable Sample Rate)
    Ssr = 3,
    /// AAC LTP (Long Term Prediction)
    Ltp = 4,
    /// SBR (Spectral Band Replication) - HE-AAC
    Sbr = 5,
    /// AAC Scalable
    Scalable = 6,
}

impl AacProfile {
    pub fn from_object_type(ot: u8) -> Option<Self> {
        match ot {
            1 => Some(AacProfile::Main),
            2 => Some(AacProfile::Lc),
            3 => Some(AacProfile::Ssr),
            4 => Some(AacProfile::Ltp),
            5 => Some(AacProfile::Sbr),
            6 => Some(AacProfile::Scalable),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AacProfile::Main => "AAC Main",
            AacProfile::Lc => "AAC LC",
            AacProfile::Ssr => "AAC SSR",
            AacProfile::Ltp => "AAC LTP",
            AacProfile::Sbr => "HE-AAC",
            AacProfile::Scalable => "AAC Scalable",
        }
    }
}

/// AudioSpecificConfig (from sequence header)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioSpecificConfig {
    /// Audio object type (profile)
    pub audio_object_type: u8,
    /// Sampling frequency index
    pub sampling_frequency_index: u8,
    /// Sampling frequency in Hz, 0 for reserved indices
    pub sampling_frequency: u32,
    /// Channel configuration (1=mono, 2=stereo, etc.)
    pub channel_configuration: u8,
    /// Frame length flag (960 or 1024 samples)
    pub frame_length_flag: bool,
    pub depends_on_core_coder: bool,
    pub extension_flag: bool,
}

impl AudioSpecificConfig {
    /// Standard sampling frequencies by index
    const SAMPLING_FREQUENCIES: [u32; 16] = [
        96000, 88200, 64000, 48000, 44100, 32000, 24000, 22050,
        16000, 12000, 11025, 8000, 7350, 0, 0, 0,
    ];

    /// Escape index: the frequency is written out in full
    const EXPLICIT_FREQUENCY_INDEX: u8 = 0x0F;

    /// Parse from AAC sequence header data.
    ///
    /// Field layout (bit offsets from the start of `data`):
    /// - `audioObjectType`: bits 0..5, `byte0 >> 3`
    /// - `samplingFrequencyIndex`: bits 5..9, `(byte0 & 0x07) << 1 | byte1 >> 7`
    /// - `channelConfiguration`: bits 9..13, `(byte1 >> 3) & 0x0F`
    ///
    /// With index 15 a 24-bit explicit frequency sits between the index and
    /// the channel configuration. The three GASpecificConfig flags follow
    /// when present.
    pub fn parse(data: &[u8]) -> Result<Self, DemuxError> {
        if data.len() < 2 {
            return Err(DemuxError::TruncatedRecord("AudioSpecificConfig"));
        }

        let mut bits = BitReader::new(data);
        let audio_object_type = bits.read_u8(5)?;
        let sampling_frequency_index = bits.read_u8(4)?;
        let sampling_frequency = if sampling_frequency_index == Self::EXPLICIT_FREQUENCY_INDEX {
            // Explicit frequency in the next 24 bits
            bits.read_bits(24)?
        } else {
            Self::SAMPLING_FREQUENCIES[sampling_frequency_index as usize]
        };
        let channel_configuration = bits.read_u8(4)?;
        let frame_length_flag = bits.read_flag()?;
        let depends_on_core_coder = bits.read_flag()?;
        let extension_flag = bits.read_flag()?;

        Ok(AudioSpecificConfig {
            audio_object_type,
            sampling_frequency_index,
            sampling_frequency,
            channel_configuration,
            frame_length_flag,
            depends_on_core_coder,
            extension_flag,
        })
    }

    /// Get the profile
    pub fn profile(&self) -> Option<AacProfile> {
        AacProfile::from_object_type(self.audio_object_type)
    }

    /// Get channel count
    pub fn channels(&self) -> u8 {
        match self.channel_configuration {
            1..=6 => self.channel_configuration,
            7 => 8, // 7.1
            _ => 0, // defined in stream
        }
    }

    /// Get samples per frame
    pub fn samples_per_frame(&self) -> u32 {
        if self.frame_length_flag { 960 } else { 1024 }
    }
}

/// Highest sampling frequency index with a table entry (7350 Hz)
pub const ADTS_MAX_FREQUENCY_INDEX: u8 = 12;

/// Highest channel configuration the 3-bit ADTS field holds
pub const ADTS_MAX_CHANNEL_CONFIGURATION: u8 = 7;

/// Generate the 7-byte ADTS header for a raw AAC payload of `payload_len` bytes.
///
/// Configs the header cannot describe (object types outside 1..=4, reserved
/// or explicit frequency indices, channel configurations above 7) are
/// rejected with `UnsupportedCodec`.
pub fn generate_adts_header(
    config: &AudioSpecificConfig,
    payload_len: usize,
) -> Result<[u8; ADTS_HEADER_SIZE], DemuxError> {
    let frame_len = payload_len + ADTS_HEADER_SIZE;
    if frame_len > ADTS_MAX_FRAME_SIZE {
        return Err(DemuxError::AdtsFrameTooLarge(frame_len));
    }

    // The 2-bit profile field only reaches object types 1..=4
    let profile = match config.profile() {
        Some(p @ (AacProfile::Main | AacProfile::Lc | AacProfile::Ssr | AacProfile::Ltp)) => {
            p as u8 - 1
        }
        Some(p) => {
            return Err(DemuxError::UnsupportedCodec(format!(
                "{} cannot be framed as ADTS",
                p.name()
            )))
        }
        None => {
            return Err(DemuxError::UnsupportedCodec(format!(
                "audio object type {} cannot be framed as ADTS",
                config.audio_object_type
            )))
        }
    };

    let freq_idx = config.sampling_frequency_index;
    if freq_idx > ADTS_MAX_FREQUENCY_INDEX {
        return Err(DemuxError::UnsupportedCodec(format!(
            "sampling frequency index {} cannot be framed as ADTS",
            freq_idx
        )));
    }

    let channels = config.channel_configuration;
    if channels > ADTS_MAX_CHANNEL_CONFIGURATION {
        return Err(DemuxError::UnsupportedCodec(format!(
            "channel configuration {} cannot be framed as ADTS",
            channels
        )));
    }

    let mut header = [0u8; ADTS_HEADER_SIZE];

    // Syncword (12 bits) + ID (1 bit) + Layer (2 bits) + Protection absent (1 bit)
    header[0] = 0xFF;
    header[1] = 0xF1; // MPEG-4, layer 0, no CRC

    // Profile (2 bits) + Freq (4 bits) + Private (1 bit) + Channels (1 bit)
    header[2] = (profile << 6)
        | (freq_idx << 2)
        | ((channels >> 2) & 0x01);

    // Channels (2 bits) + Original (0) + Home (0) + Copyright (0, 0) + Length (2 bits)
    header[3] = ((channels & 0x03) << 6) | ((frame_len >> 11) & 0x03) as u8;

    // Length (8 bits)
    header[4] = ((frame_len >> 3) & 0xFF) as u8;

    // Length (3 bits) + Buffer fullness (5 bits)
    header[5] = (((frame_len & 0x07) << 5) | 0x1F) as u8;

    // Buffer fullness (6 bits) + Number of raw data blocks - 1 (2 bits)
    header[6] = 0xFC;

    Ok(header)
}

/// Read the 13-bit frame length back out of an ADTS header
pub fn adts_frame_length(header: &[u8]) -> Option<usize> {
    if header.len() < ADTS_HEADER_SIZE {
        return None;
    }
    Some(
        (((header[3] & 0x03) as usize) << 11)
            | ((header[4] as usize) << 3)
            | ((header[5] >> 5) as usize),
    )
}

/// Audio tag header fields plus the config carried by a sequence header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioTagInfo {
    pub sound_format: u8,
    pub sound_rate: AudioSampleRate,
    /// 0 = 8-bit samples, 1 = 16-bit samples
    pub sound_size: u8,
    /// 0 = mono, 1 = stereo
    pub sound_type: u8,
    pub packet_type: AacPacketType,
    pub timestamp: u32,
    pub config: AudioSpecificConfig,
}

/// One raw AAC access unit wrapped in an ADTS header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdtsFrame {
    pub timestamp: u32,
    /// ADTS header followed by the raw payload
    pub data: Bytes,
}

impl AdtsFrame {
    pub fn payload(&self) -> &[u8] {
        &self.data[ADTS_HEADER_SIZE..]
    }
}

/// Output of one decoded audio tag
#[derive(Debug, Clone)]
pub enum AudioTag {
    SequenceHeader(AudioTagInfo),
    Frame(AdtsFrame),
}

/// Stateful AAC tag decoder.
///
/// Owns the most recent AudioSpecificConfig; raw frames cannot be wrapped
/// until one has been seen.
#[derive(Debug, Default)]
pub struct AudioTagDecoder {
    config: Option<AudioSpecificConfig>,
}

impl AudioTagDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(&self) -> Option<&AudioSpecificConfig> {
        self.config.as_ref()
    }

    /// Decode one audio tag body
    pub fn decode(&mut self, header: &TagHeader, body: &[u8]) -> Result<AudioTag, DemuxError> {
        let mut reader = BufferReader::new(body);

        let first = reader.read_u8("audio tag header")?;
        let sound_format = (first >> 4) & 0x0F;
        if AudioFormat::from_byte(first) != Some(AudioFormat::Aac) {
            return Err(DemuxError::UnsupportedCodec(format!(
                "sound format {}",
                sound_format
            )));
        }

        let packet_type_byte = reader.read_u8("AACPacketType")?;
        let packet_type = AacPacketType::from_byte(packet_type_byte)
            .ok_or(DemuxError::UnknownPacketType(packet_type_byte))?;

        match packet_type {
            AacPacketType::SequenceHeader => {
                let config = AudioSpecificConfig::parse(reader.read_rest())?;
                self.config = Some(config.clone());

                Ok(AudioTag::SequenceHeader(AudioTagInfo {
                    sound_format,
                    sound_rate: AudioSampleRate::from_byte(first),
                    sound_size: (first >> 1) & 0x01,
                    sound_type: first & 0x01,
                    packet_type,
                    timestamp: header.timestamp,
                    config,
                }))
            }
            AacPacketType::Raw => {
                let config = self
                    .config
                    .as_ref()
                    .ok_or(DemuxError::MissingConfiguration("AAC sequence header"))?;

                let payload = reader.read_rest();
                let adts = generate_adts_header(config, payload.len())?;

                let mut data = BytesMut::with_capacity(ADTS_HEADER_SIZE + payload.len());
                data.put_slice(&adts);
                data.put_slice(payload);

                Ok(AudioTag::Frame(AdtsFrame {
                    timestamp: header.timestamp,
                    data: data.freeze(),
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::flv::FlvTagType;

    fn header(timestamp: u32) -> TagHeader {
        TagHeader {
            tag_type: FlvTagType::Audio,
            data_size: 0,
            timestamp,
            stream_id: 0,
        }
    }

    fn lc_stereo_44k() -> AudioSpecificConfig {
        AudioSpecificConfig::parse(&[0x12, 0x10]).unwrap()
    }

    #[test]
    fn test_audio_specific_config_parse() {
        // AAC-LC, 44100 Hz, Stereo
        let config = lc_stereo_44k();
        assert_eq!(config.audio_object_type, 2);
        assert_eq!(config.sampling_frequency_index, 4);
        assert_eq!(config.sampling_frequency, 44100);
        assert_eq!(config.channel_configuration, 2);
        assert_eq!(config.channels(), 2);
        assert_eq!(config.profile(), Some(AacProfile::Lc));
        assert_eq!(config.samples_per_frame(), 1024);
    }

    #[test]
    fn test_frequency_index_spans_bytes() {
        // object type 2, index 0b0111 (22050), mono
        let config = AudioSpecificConfig::parse(&[0x13, 0x88]).unwrap();
        assert_eq!(config.sampling_frequency_index, 7);
        assert_eq!(config.sampling_frequency, 22050);
        assert_eq!(config.channel_configuration, 1);
    }

    #[test]
    fn test_config_too_short() {
        assert_eq!(
            AudioSpecificConfig::parse(&[0x12]),
            Err(DemuxError::TruncatedRecord("AudioSpecificConfig"))
        );
    }

    #[test]
    fn test_adts_header() {
        let header = generate_adts_header(&lc_stereo_44k(), 100).unwrap();

        assert_eq!(header[0], 0xFF);
        assert_eq!(header[1], 0xF1);
        // profile 1 (LC), index 4, channel msb 0
        assert_eq!(header[2], 0x50);
        // channel low bits 2
        assert_eq!(header[3] >> 6, 0x02);
        assert_eq!(adts_frame_length(&header), Some(107));
        assert_eq!(header[6], 0xFC);
    }

    #[test]
    fn test_adts_frame_length_limit() {
        let config = lc_stereo_44k();
        assert!(generate_adts_header(&config, ADTS_MAX_FRAME_SIZE - ADTS_HEADER_SIZE).is_ok());
        assert_eq!(
            generate_adts_header(&config, ADTS_MAX_FRAME_SIZE).unwrap_err(),
            DemuxError::AdtsFrameTooLarge(ADTS_MAX_FRAME_SIZE + ADTS_HEADER_SIZE)
        );
    }

    #[test]
    fn test_explicit_sampling_frequency() {
        // object type 2, index 15, 44100 Hz written out, stereo
        // 00010 1111 000000001010110001000100 0010 000
        let config = AudioSpecificConfig::parse(&[0x17, 0x80, 0x56, 0x22, 0x10]).unwrap();
        assert_eq!(config.sampling_frequency_index, 15);
        assert_eq!(config.sampling_frequency, 44100);
        assert_eq!(config.channel_configuration, 2);

        assert!(AudioSpecificConfig::parse(&[0x17, 0x80, 0x56]).is_err());
    }

    #[test]
    fn test_adts_rejects_object_types_outside_profile_field() {
        // HE-AAC (object type 5), 44100 Hz, stereo
        let he_aac = AudioSpecificConfig::parse(&[0x2A, 0x10]).unwrap();
        assert_eq!(he_aac.audio_object_type, 5);
        assert_eq!(
            generate_adts_header(&he_aac, 10).unwrap_err(),
            DemuxError::UnsupportedCodec("HE-AAC cannot be framed as ADTS".into())
        );

        let null_object = AudioSpecificConfig { audio_object_type: 0, ..lc_stereo_44k() };
        assert!(matches!(
            generate_adts_header(&null_object, 10),
            Err(DemuxError::UnsupportedCodec(_))
        ));

        let ltp = AudioSpecificConfig { audio_object_type: 4, ..lc_stereo_44k() };
        let header = generate_adts_header(&ltp, 10).unwrap();
        assert_eq!(header[2] >> 6, 3);
    }

    #[test]
    fn test_adts_rejects_unrepresentable_frequency_index() {
        for index in [13, 14, 15] {
            let config = AudioSpecificConfig {
                sampling_frequency_index: index,
                ..lc_stereo_44k()
            };
            assert!(matches!(
                generate_adts_header(&config, 10),
                Err(DemuxError::UnsupportedCodec(_))
            ));
        }

        let explicit = AudioSpecificConfig::parse(&[0x17, 0x80, 0x56, 0x22, 0x10]).unwrap();
        assert!(generate_adts_header(&explicit, 10).is_err());

        let lowest = AudioSpecificConfig {
            sampling_frequency_index: ADTS_MAX_FREQUENCY_INDEX,
            ..lc_stereo_44k()
        };
        assert!(generate_adts_header(&lowest, 10).is_ok());
    }

    #[test]
    fn test_adts_channel_configuration_range() {
        let surround = AudioSpecificConfig {
            channel_configuration: 7,
            ..lc_stereo_44k()
        };
        let header = generate_adts_header(&surround, 10).unwrap();
        assert_eq!(((header[2] & 0x01) << 2) | (header[3] >> 6), 7);

        let wide = AudioSpecificConfig {
            channel_configuration: 8,
            ..lc_stereo_44k()
        };
        assert_eq!(
            generate_adts_header(&wide, 10).unwrap_err(),
            DemuxError::UnsupportedCodec("channel configuration 8 cannot be framed as ADTS".into())
        );
    }

    #[test]
    fn test_unframeable_config_fails_raw_tag() {
        let mut decoder = AudioTagDecoder::new();
        decoder.decode(&header(0), &[0xAF, 0x00, 0x2A, 0x10]).unwrap();
        assert!(matches!(
            decoder.decode(&header(23), &[0xAF, 0x01, 0x21, 0x10]),
            Err(DemuxError::UnsupportedCodec(_))
        ));
    }

    #[test]
    fn test_sequence_header_then_raw_frame() {
        let mut decoder = AudioTagDecoder::new();

        let tag = decoder.decode(&header(0), &[0xAF, 0x00, 0x12, 0x10]).unwrap();
        match tag {
            AudioTag::SequenceHeader(info) => {
                assert_eq!(info.sound_format, 10);
                assert_eq!(info.sound_rate, AudioSampleRate::Rate44100);
                assert_eq!(info.sound_size, 1);
                assert_eq!(info.sound_type, 1);
                assert_eq!(info.config.sampling_frequency, 44100);
            }
            other => panic!("expected sequence header, got {:?}", other),
        }

        let mut body = vec![0xAF, 0x01];
        body.extend_from_slice(&[0x21; 50]);
        let tag = decoder.decode(&header(23), &body).unwrap();
        match tag {
            AudioTag::Frame(frame) => {
                assert_eq!(frame.timestamp, 23);
                assert_eq!(frame.data.len(), 57);
                assert_eq!(frame.data[0], 0xFF);
                assert_eq!(frame.data[1] & 0xF0, 0xF0);
                assert_eq!(adts_frame_length(&frame.data), Some(57));
                assert_eq!(frame.payload(), &[0x21; 50]);
            }
            other => panic!("expected frame, got {:?}", other),
        }
    }

    #[test]
    fn test_raw_before_sequence_header() {
        let mut decoder = AudioTagDecoder::new();
        assert_eq!(
            decoder.decode(&header(0), &[0xAF, 0x01, 0x21]).unwrap_err(),
            DemuxError::MissingConfiguration("AAC sequence header")
        );
    }

    #[test]
    fn test_later_sequence_header_overrides() {
        let mut decoder = AudioTagDecoder::new();
        decoder.decode(&header(0), &[0xAF, 0x00, 0x12, 0x10]).unwrap();
        decoder.decode(&header(0), &[0xAF, 0x00, 0x13, 0x88]).unwrap();
        assert_eq!(decoder.config().map(|c| c.sampling_frequency_index), Some(7));
    }

    #[test]
    fn test_rejects_non_aac_and_bad_packet_type() {
        let mut decoder = AudioTagDecoder::new();
        assert_eq!(
            decoder.decode(&header(0), &[0x2F, 0x00]).unwrap_err(),
            DemuxError::UnsupportedCodec("sound format 2".into())
        );
        assert_eq!(
            decoder.decode(&header(0), &[0xAF, 0x07]).unwrap_err(),
            DemuxError::UnknownPacketType(7)
        );
        assert!(matches!(
            decoder.decode(&header(0), &[0xAF]),
            Err(DemuxError::TruncatedRecord(_))
        ));
    }
}
