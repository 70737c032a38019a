//! Statistics for a demuxed stream

/// Per-stream counters maintained by the demuxer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DemuxStats {
    /// Total bytes passed to `parse()`
    pub bytes_received: u64,
    /// Bytes converted into complete records (file header included)
    pub bytes_consumed: u64,
    /// Video tags framed
    pub video_tags: u64,
    /// Audio tags framed
    pub audio_tags: u64,
    /// Script tags framed
    pub script_tags: u64,
    /// Tags with an unknown type byte
    pub unknown_tags: u64,
    /// Annex-B NAL units emitted
    pub nalus: u64,
    /// ADTS frames emitted
    pub adts_frames: u64,
    /// Errors reported on the `Error` channel
    pub errors: u64,
    /// PreviousTagSize values that did not match the preceding tag
    pub previous_tag_size_mismatches: u64,
}

impl DemuxStats {
    /// Create new stats tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Total tags framed, whatever their type
    pub fn total_tags(&self) -> u64 {
        self.video_tags + self.audio_tags + self.script_tags + self.unknown_tags
    }

    /// Bytes received but not yet consumed
    pub fn pending_bytes(&self) -> u64 {
        self.bytes_received.saturating_sub(self.bytes_consumed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_counters() {
        let stats = DemuxStats {
            bytes_received: 100,
            bytes_consumed: 85,
            video_tags: 2,
            audio_tags: 3,
            script_tags: 1,
            unknown_tags: 1,
            ..Default::default()
        };
        assert_eq!(stats.total_tags(), 7);
        assert_eq!(stats.pending_bytes(), 15);
        assert_eq!(DemuxStats::new().pending_bytes(), 0);
    }
}
