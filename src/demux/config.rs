//! Demuxer configuration

/// Demuxer configuration options
#[derive(Debug, Clone)]
pub struct DemuxerConfig {
    /// Emit script tags as `Diagnostic::UnhandledTag` data events
    pub pass_through_script: bool,

    /// Compare each PreviousTagSize against the tag before it.
    ///
    /// Mismatches are logged and counted; framing always follows the
    /// declared data size.
    pub verify_previous_tag_size: bool,
}

impl Default for DemuxerConfig {
    fn default() -> Self {
        Self {
            pass_through_script: true,
            verify_previous_tag_size: false,
        }
    }
}

impl DemuxerConfig {
    /// Report every deviation the demuxer can detect
    pub fn strict() -> Self {
        Self {
            verify_previous_tag_size: true,
            ..Default::default()
        }
    }

    /// Enable or disable script tag pass-through
    pub fn pass_through_script(mut self, enabled: bool) -> Self {
        self.pass_through_script = enabled;
        self
    }

    /// Enable or disable PreviousTagSize verification
    pub fn verify_previous_tag_size(mut self, enabled: bool) -> Self {
        self.verify_previous_tag_size = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DemuxerConfig::default();
        assert!(config.pass_through_script);
        assert!(!config.verify_previous_tag_size);

        let strict = DemuxerConfig::strict();
        assert!(strict.verify_previous_tag_size);
        assert!(strict.pass_through_script);
    }

    #[test]
    fn test_builder() {
        let config = DemuxerConfig::default()
            .pass_through_script(false)
            .verify_previous_tag_size(true);
        assert!(!config.pass_through_script);
        assert!(config.verify_previous_tag_size);
    }
}
