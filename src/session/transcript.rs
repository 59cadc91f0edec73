use uuid::Uuid;

/// Which speaker a transcript belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TranscriptChannel {
    /// The caller's speech.
    Input,
    /// The model's speech.
    Output,
}

impl TranscriptChannel {
    pub fn opposite(self) -> Self {
        match self {
            TranscriptChannel::Input => TranscriptChannel::Output,
            TranscriptChannel::Output => TranscriptChannel::Input,
        }
    }
}

/// A piece of one speaker's running transcript.
///
/// Every delta of a contiguous same-speaker run shares `segment_id`. The run
/// ends with a segment carrying empty `text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptSegment {
    pub segment_id: Uuid,
    pub text: String,
}

impl TranscriptSegment {
    pub fn is_close(&self) -> bool {
        self.text.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEvent {
    pub channel: TranscriptChannel,
    pub segment: TranscriptSegment,
}

/// Rebuilds two continuous transcripts from interleaved deltas.
///
/// At most one channel is open at a time.
#[derive(Debug, Default)]
pub struct TranscriptMultiplexer {
    input: Option<Uuid>,
    output: Option<Uuid>,
}

impl TranscriptMultiplexer {
    pub fn new() -> Self {
        Self::default()
    }

    /// The open channel, if any.
    pub fn open_channel(&self) -> Option<TranscriptChannel> {
        match (self.input, self.output) {
            (Some(_), _) => Some(TranscriptChannel::Input),
            (None, Some(_)) => Some(TranscriptChannel::Output),
            (None, None) => None,
        }
    }

    /// Handle one delta. Closes the opposite channel first if it was open.
    ///
    /// Empty deltas are dropped: empty text is reserved for close markers.
    pub fn push(&mut self, channel: TranscriptChannel, text: String) -> Vec<TranscriptEvent> {
        if text.is_empty() {
            tracing::debug!("ignoring empty {:?} transcript delta", channel);
            return Vec::new();
        }
        let mut events = Vec::with_capacity(2);

        if self.slot(channel.opposite()).is_some() {
            events.extend(self.close(channel.opposite()));
        }

        let segment_id = *self.slot_mut(channel).get_or_insert_with(Uuid::new_v4);
        events.push(TranscriptEvent {
            channel,
            segment: TranscriptSegment { segment_id, text },
        });
        events
    }

    /// The turn ended: close whatever is open.
    pub fn complete(&mut self) -> Vec<TranscriptEvent> {
        let mut events = Vec::new();
        for channel in [TranscriptChannel::Input, TranscriptChannel::Output] {
            if self.slot(channel).is_some() {
                events.extend(self.close(channel));
            }
        }
        events
    }

    /// Forget open segments without emitting close markers.
    pub fn reset(&mut self) {
        self.input = None;
        self.output = None;
    }

    fn close(&mut self, channel: TranscriptChannel) -> Option<TranscriptEvent> {
        let Some(segment_id) = self.slot_mut(channel).take() else {
            tracing::warn!("protocol invariant violated: closing {:?} transcript with no open segment", channel);
            debug_assert!(false, "closed {:?} transcript with no open segment", channel);
            return None;
        };
        Some(TranscriptEvent {
            channel,
            segment: TranscriptSegment {
                segment_id,
                text: String::new(),
            },
        })
    }

    fn slot(&self, channel: TranscriptChannel) -> &Option<Uuid> {
        match channel {
            TranscriptChannel::Input => &self.input,
            TranscriptChannel::Output => &self.output,
        }
    }

    fn slot_mut(&mut self, channel: TranscriptChannel) -> &mut Option<Uuid> {
        match channel {
            TranscriptChannel::Input => &mut self.input,
            TranscriptChannel::Output => &mut self.output,
        }
    }
}
