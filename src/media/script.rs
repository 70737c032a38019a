//! Script data tags
//!
//! Script tags (`onMetaData` and friends) are AMF-encoded. They are not
//! decoded here: the payload is passed through untouched so the consumer can
//! hand it to an AMF decoder of its choice.

use bytes::Bytes;

use crate::media::flv::TagHeader;

/// Non-error notices carried on the `Data` channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A tag the demuxer framed but does not decode
    UnhandledTag {
        header: TagHeader,
        /// Raw tag payload
        data: Bytes,
    },
}

/// Wrap a script tag body as an unhandled-tag diagnostic
pub fn pass_through(header: &TagHeader, body: &[u8]) -> Diagnostic {
    Diagnostic::UnhandledTag {
        header: *header,
        data: Bytes::copy_from_slice(body),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::flv::FlvTagType;

    #[test]
    fn test_pass_through_keeps_payload() {
        let header = TagHeader {
            tag_type: FlvTagType::Script,
            data_size: 3,
            timestamp: 0,
            stream_id: 0,
        };
        let Diagnostic::UnhandledTag { header: h, data } = pass_through(&header, &[0x02, 0x00, 0x0A]);
        assert_eq!(h.tag_type, FlvTagType::Script);
        assert_eq!(data.as_ref(), &[0x02, 0x00, 0x0A]);
    }
}
