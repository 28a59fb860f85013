//! Merging of consecutive same-speaker segments into transcript lines.

use crate::clock::{Clock, SystemClock};
use crate::pipeline::types::TranscriptSegment;
use std::time::{Duration, Instant, SystemTime};

/// One finished transcript line: possibly several segments by the same
/// speaker, merged.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptLine {
    /// Wall-clock time of the first merged segment.
    pub timestamp: SystemTime,
    pub speaker_id: Option<u32>,
    pub text: String,
    pub original: String,
}

struct OpenLine {
    line: TranscriptLine,
    last_update: Instant,
}

/// Accumulates segments into lines, closing a line when the speaker changes
/// or the current speaker goes quiet.
///
/// At most one line is open at a time. A line keeps the timestamp of its
/// first segment; later merges extend the text only.
pub struct TranscriptMerger {
    open: Option<OpenLine>,
    merge_segments: bool,
    idle_timeout: Duration,
    clock: Box<dyn Clock>,
}

impl TranscriptMerger {
    pub fn new(merge_segments: bool, idle_timeout: Duration) -> Self {
        Self::with_clock(merge_segments, idle_timeout, Box::new(SystemClock))
    }

    pub fn with_clock(
        merge_segments: bool,
        idle_timeout: Duration,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self {
            open: None,
            merge_segments,
            idle_timeout,
            clock,
        }
    }

    /// Feeds one segment; returns any lines this closes.
    pub fn push(&mut self, segment: TranscriptSegment) -> Vec<TranscriptLine> {
        if !self.merge_segments {
            return vec![TranscriptLine {
                timestamp: segment.timestamp,
                speaker_id: segment.speaker_id,
                text: segment.text,
                original: segment.original,
            }];
        }

        let now = self.clock.now();
        let mut closed = Vec::new();

        if let Some(open) = &mut self.open {
            if open.line.speaker_id == segment.speaker_id {
                open.line.text.push(' ');
                open.line.text.push_str(&segment.text);
                open.line.original.push(' ');
                open.line.original.push_str(&segment.original);
                open.last_update = now;
                return closed;
            }
            if let Some(line) = self.flush() {
                closed.push(line);
            }
        }

        self.open = Some(OpenLine {
            line: TranscriptLine {
                timestamp: segment.timestamp,
                speaker_id: segment.speaker_id,
                text: segment.text,
                original: segment.original,
            },
            last_update: now,
        });
        closed
    }

    /// Closes the open line if its speaker has been quiet past the timeout.
    pub fn poll(&mut self) -> Option<TranscriptLine> {
        let now = self.clock.now();
        let expired = self
            .open
            .as_ref()
            .is_some_and(|open| now.duration_since(open.last_update) > self.idle_timeout);
        if expired { self.flush() } else { None }
    }

    /// Closes the open line unconditionally.
    pub fn flush(&mut self) -> Option<TranscriptLine> {
        self.open.take().map(|open| open.line)
    }

    pub fn has_open_line(&self) -> bool {
        self.open.is_some()
    }
}
