//! FLV media handling
//!
//! This module provides:
//! - FLV file header and tag header parsing
//! - H.264/AVC tag decoding and AVCC to Annex-B reframing
//! - AAC tag decoding and raw AAC to ADTS reframing
//! - Script tag pass-through

pub mod aac;
pub mod flv;
pub mod h264;
pub mod script;

pub use aac::{AacPacketType, AdtsFrame, AudioSpecificConfig, AudioTagDecoder, AudioTagInfo};
pub use flv::{FlvTagType, StreamFlags, TagHeader};
pub use h264::{AvcDecoderConfigurationRecord, AvcNalu, AvcPacketType, NaluType, VideoTagDecoder, VideoTagInfo};
pub use script::Diagnostic;
