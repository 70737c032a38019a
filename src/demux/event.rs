//! Demuxer events and subscriber dispatch
//!
//! Handlers are registered per [`EventKind`] and invoked inline, in
//! registration order, from inside the call that produced the event.

use crate::error::DemuxError;
use crate::media::{AdtsFrame, AudioTagInfo, AvcNalu, Diagnostic, VideoTagInfo};

/// One decoded unit delivered on the `Data` channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DemuxData {
    /// Per-tag video summary; carries the AVC record for sequence headers
    VideoMetadata(VideoTagInfo),
    /// AAC sequence header summary
    AudioMetadata(AudioTagInfo),
    /// Annex-B framed NAL unit
    AvcNalu(AvcNalu),
    /// ADTS framed AAC access unit
    AdtsFrame(AdtsFrame),
    /// Pass-through notice for tags that are framed but not decoded
    Diagnostic(Diagnostic),
}

/// Event kinds a handler can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Data,
    Error,
    Done,
    Reconnect,
}

impl EventKind {
    const COUNT: usize = 4;

    fn index(self) -> usize {
        match self {
            EventKind::Data => 0,
            EventKind::Error => 1,
            EventKind::Done => 2,
            EventKind::Reconnect => 3,
        }
    }
}

/// Event emitted by the demuxer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DemuxEvent {
    Data(DemuxData),
    Error(DemuxError),
    /// Input exhausted
    Done,
    /// Reconnect hint passed through from the byte source
    Reconnect,
}

impl DemuxEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            DemuxEvent::Data(_) => EventKind::Data,
            DemuxEvent::Error(_) => EventKind::Error,
            DemuxEvent::Done => EventKind::Done,
            DemuxEvent::Reconnect => EventKind::Reconnect,
        }
    }
}

/// Boxed event handler
pub type Handler = Box<dyn FnMut(&DemuxEvent) + Send>;

/// Enum-keyed dispatch table
#[derive(Default)]
pub struct EventBus {
    handlers: [Vec<Handler>; EventKind::COUNT],
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, kind: EventKind, handler: Handler) {
        self.handlers[kind.index()].push(handler);
    }

    /// Number of handlers registered for `kind`
    pub fn handler_count(&self, kind: EventKind) -> usize {
        self.handlers[kind.index()].len()
    }

    /// Deliver an event to every handler of its kind, in registration order
    pub fn emit(&mut self, event: &DemuxEvent) {
        for handler in self.handlers[event.kind().index()].iter_mut() {
            handler(event);
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("data", &self.handler_count(EventKind::Data))
            .field("error", &self.handler_count(EventKind::Error))
            .field("done", &self.handler_count(EventKind::Done))
            .field("reconnect", &self.handler_count(EventKind::Reconnect))
            .finish()
    }
}
