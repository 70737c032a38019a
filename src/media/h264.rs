//! H.264/AVC video tag decoding
//!
//! FLV carries H.264 in AVCC form (length-prefixed NAL units). The decoder
//! re-frames every unit into Annex-B form (`00 00 00 01` start code).
//!
//! AVC Video Packet Structure:
//! ```text
//! +----------+----------+-----------------+-----------------+
//! |FrameType | CodecID  | AVCPacketType   | CompositionTime | Data
//! | (4 bits) | (4 bits) | (1 byte)        | (3 bytes, SI24) |
//! +----------+----------+-----------------+-----------------+
//! ```
//!
//! AVCPacketType:
//! - 0: AVC sequence header (AVCDecoderConfigurationRecord)
//! - 1: AVC NALU (one or more length-prefixed NALUs)
//! - 2: AVC end of sequence
//!
//! AVCDecoderConfigurationRecord (sequence header):
//! ```text
//! configurationVersion (1) | AVCProfileIndication (1) | profile_compatibility (1)
//! | AVCLevelIndication (1) | lengthSizeMinusOne (1, lower 2 bits)
//! | numOfSPS (1, lower 5 bits) | { spsLength (2) | spsNALUnit }*
//! | numOfPPS (1) | { ppsLength (2) | ppsNALUnit }*
//! ```

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::DemuxError;
use crate::media::flv::{TagHeader, VideoCodec, VideoFrameType};
use crate::util::bits::sign_extend_24;
use crate::util::BufferReader;

/// Annex-B start code prepended to every emitted NAL unit
pub const ANNEX_B_START_CODE: [u8; 4] = [0x00, 0x00, 0x00, 0x01];

/// NALU length prefix widths the decoder accepts.
///
/// The wire field allows 1..=4; a 2-byte prefix is deliberately rejected.
pub const SUPPORTED_LENGTH_SIZES: [u8; 3] = [1, 3, 4];

/// AVC packet type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvcPacketType {
    /// Sequence header (AVCDecoderConfigurationRecord)
    SequenceHeader = 0,
    /// NAL units
    Nalu = 1,
    /// End of sequence
    EndOfSequence = 2,
}

impl AvcPacketType {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(AvcPacketType::SequenceHeader),
            1 => Some(AvcPacketType::Nalu),
            2 => Some(AvcPacketType::EndOfSequence),
            _ => None,
        }
    }
}

/// NAL unit type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NaluType {
    Slice = 1,
    SlicePartA = 2,
    SlicePartB = 3,
    SlicePartC = 4,
    /// IDR slice (keyframe)
    Idr = 5,
    Sei = 6,
    Sps = 7,
    Pps = 8,
    Aud = 9,
    EndSeq = 10,
    EndStream = 11,
    Filler = 12,
}

impl NaluType {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b & 0x1F {
            1 => Some(NaluType::Slice),
            2 => Some(NaluType::SlicePartA),
            3 => Some(NaluType::SlicePartB),
            4 => Some(NaluType::SlicePartC),
            5 => Some(NaluType::Idr),
            6 => Some(NaluType::Sei),
            7 => Some(NaluType::Sps),
            8 => Some(NaluType::Pps),
            9 => Some(NaluType::Aud),
            10 => Some(NaluType::EndSeq),
            11 => Some(NaluType::EndStream),
            12 => Some(NaluType::Filler),
            _ => None,
        }
    }

    pub fn is_keyframe(&self) -> bool {
        matches!(self, NaluType::Idr)
    }

    pub fn is_parameter_set(&self) -> bool {
        matches!(self, NaluType::Sps | NaluType::Pps)
    }
}

/// AVCDecoderConfigurationRecord from a sequence header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvcDecoderConfigurationRecord {
    pub configuration_version: u8,
    /// AVC profile (66=Baseline, 77=Main, 100=High, etc.)
    pub profile_indication: u8,
    pub profile_compatibility: u8,
    /// AVC level (e.g., 31 = 3.1)
    pub level_indication: u8,
    /// Byte width of each NALU length prefix.
    ///
    /// This is the wire field `lengthSizeMinusOne` with the one already added
    /// back, so it ranges over 1..=4.
    pub nalu_length_size: u8,
    pub num_sps: u8,
    pub num_pps: u8,
    /// Sequence Parameter Sets, without start codes
    pub sps: Vec<Bytes>,
    /// Picture Parameter Sets, without start codes
    pub pps: Vec<Bytes>,
}

impl AvcDecoderConfigurationRecord {
    /// Parse a record that must fill `data` exactly
    pub fn parse(data: &[u8]) -> Result<Self, DemuxError> {
        let mut reader = BufferReader::new(data);

        let configuration_version = reader.read_u8("configurationVersion")?;
        let profile_indication = reader.read_u8("AVCProfileIndication")?;
        let profile_compatibility = reader.read_u8("profile_compatibility")?;
        let level_indication = reader.read_u8("AVCLevelIndication")?;
        let nalu_length_size = (reader.read_u8("lengthSizeMinusOne")? & 0x03) + 1;

        let num_sps = reader.read_u8("numOfSequenceParameterSets")? & 0x1F;
        let mut sps = Vec::with_capacity(num_sps as usize);
        for _ in 0..num_sps {
            let len = reader.read_u16("SPS length")? as usize;
            sps.push(Bytes::copy_from_slice(reader.read(len, "SPS")?));
        }

        let num_pps = reader.read_u8("numOfPictureParameterSets")?;
        let mut pps = Vec::with_capacity(num_pps as usize);
        for _ in 0..num_pps {
            let len = reader.read_u16("PPS length")? as usize;
            pps.push(Bytes::copy_from_slice(reader.read(len, "PPS")?));
        }

        if !reader.is_end() {
            return Err(DemuxError::TruncatedRecord(
                "trailing bytes after AVCDecoderConfigurationRecord",
            ));
        }

        Ok(AvcDecoderConfigurationRecord {
            configuration_version,
            profile_indication,
            profile_compatibility,
            level_indication,
            nalu_length_size,
            num_sps,
            num_pps,
            sps,
            pps,
        })
    }

    /// Get profile name
    pub fn profile_name(&self) -> &'static str {
        match self.profile_indication {
            66 => "Baseline",
            77 => "Main",
            88 => "Extended",
            100 => "High",
            110 => "High 10",
            122 => "High 4:2:2",
            244 => "High 4:4:4",
            _ => "Unknown",
        }
    }

    /// Get level as string (e.g., "3.1")
    pub fn level_string(&self) -> String {
        format!("{}.{}", self.level_indication / 10, self.level_indication % 10)
    }
}

/// Per-tag video summary, emitted for every decoded video tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoTagInfo {
    pub frame_type: Option<VideoFrameType>,
    pub codec_id: u8,
    pub packet_type: AvcPacketType,
    /// Composition time offset in milliseconds (signed)
    pub composition_time: i32,
    /// Tag timestamp in milliseconds
    pub timestamp: u32,
    /// `timestamp + composition_time`
    pub pts: i64,
    /// Set only for sequence headers
    pub config: Option<AvcDecoderConfigurationRecord>,
}

/// One Annex-B framed NAL unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvcNalu {
    pub pts: i64,
    pub nalu_type: Option<NaluType>,
    /// Start code followed by the NAL unit bytes
    pub data: Bytes,
}

impl AvcNalu {
    fn from_avcc(raw: &[u8], pts: i64) -> Self {
        AvcNalu {
            pts,
            nalu_type: raw.first().and_then(|b| NaluType::from_byte(*b)),
            data: to_annex_b(raw),
        }
    }

    /// NAL unit bytes without the start code
    pub fn payload(&self) -> &[u8] {
        &self.data[ANNEX_B_START_CODE.len()..]
    }
}

/// Prefix a NAL unit with the Annex-B start code
pub fn to_annex_b(nalu: &[u8]) -> Bytes {
    let mut out = BytesMut::with_capacity(ANNEX_B_START_CODE.len() + nalu.len());
    out.put_slice(&ANNEX_B_START_CODE);
    out.put_slice(nalu);
    out.freeze()
}

/// Iterator over length-prefixed NAL units in AVCC format.
///
/// Yields an error instead of stopping when a prefix or unit runs past the
/// end of the slice, then fuses.
pub struct NaluIterator<'a> {
    reader: BufferReader<'a>,
    nalu_length_size: usize,
    failed: bool,
}

impl<'a> NaluIterator<'a> {
    pub fn new(data: &'a [u8], nalu_length_size: u8) -> Self {
        Self {
            reader: BufferReader::new(data),
            nalu_length_size: nalu_length_size as usize,
            failed: false,
        }
    }
}

impl<'a> Iterator for NaluIterator<'a> {
    type Item = Result<&'a [u8], DemuxError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.reader.is_end() {
            return None;
        }

        let item = self
            .reader
            .read_uint(self.nalu_length_size, "NALU length prefix")
            .and_then(|len| self.reader.read(len as usize, "NALU"));

        self.failed = item.is_err();
        Some(item)
    }
}

/// Output of one decoded video tag
#[derive(Debug, Clone)]
pub struct VideoTag {
    pub info: VideoTagInfo,
    /// Annex-B units in stream order: SPS then PPS for sequence headers
    pub nalus: Vec<AvcNalu>,
}

/// Stateful AVC tag decoder.
///
/// Owns the most recent AVCDecoderConfigurationRecord; NALU tags cannot be
/// reframed until one has been seen.
#[derive(Debug, Default)]
pub struct VideoTagDecoder {
    config: Option<AvcDecoderConfigurationRecord>,
}

impl VideoTagDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent configuration record, if any
    pub fn config(&self) -> Option<&AvcDecoderConfigurationRecord> {
        self.config.as_ref()
    }

    /// Decode one video tag body.
    ///
    /// On error nothing is emitted for the tag and the cached record is left
    /// as it was.
    pub fn decode(&mut self, header: &TagHeader, body: &[u8]) -> Result<VideoTag, DemuxError> {
        let mut reader = BufferReader::new(body);

        let first = reader.read_u8("video tag header")?;
        let codec_id = first & 0x0F;
        if VideoCodec::from_byte(codec_id) != Some(VideoCodec::Avc) {
            let name = VideoCodec::from_byte(codec_id)
                .map(|c| c.name().to_string())
                .unwrap_or_else(|| format!("video codec id {}", codec_id));
            return Err(DemuxError::UnsupportedCodec(name));
        }

        let packet_type_byte = reader.read_u8("AVCPacketType")?;
        let packet_type = AvcPacketType::from_byte(packet_type_byte)
            .ok_or(DemuxError::UnknownPacketType(packet_type_byte))?;

        let composition_time = sign_extend_24(reader.read_uint(3, "CompositionTime")?);
        let pts = header.timestamp as i64 + composition_time as i64;

        let mut info = VideoTagInfo {
            frame_type: VideoFrameType::from_byte(first),
            codec_id,
            packet_type,
            composition_time,
            timestamp: header.timestamp,
            pts,
            config: None,
        };

        let nalus = match packet_type {
            AvcPacketType::SequenceHeader => {
                let record = AvcDecoderConfigurationRecord::parse(reader.read_rest())?;
                let nalus = record
                    .sps
                    .iter()
                    .chain(record.pps.iter())
                    .map(|ps| AvcNalu::from_avcc(ps, pts))
                    .collect();

                self.config = Some(record.clone());
                info.config = Some(record);
                nalus
            }
            AvcPacketType::Nalu => {
                let length_size = self
                    .config
                    .as_ref()
                    .map(|c| c.nalu_length_size)
                    .ok_or(DemuxError::MissingConfiguration("AVC sequence header"))?;
                if !SUPPORTED_LENGTH_SIZES.contains(&length_size) {
                    return Err(DemuxError::UnsupportedLengthSize(length_size));
                }

                NaluIterator::new(reader.read_rest(), length_size)
                    .map(|nalu| nalu.map(|raw| AvcNalu::from_avcc(raw, pts)))
                    .collect::<Result<Vec<_>, _>>()?
            }
            AvcPacketType::EndOfSequence => Vec::new(),
        };

        Ok(VideoTag { info, nalus })
    }
}
