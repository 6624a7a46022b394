use roverlink_codec::{
    build_command, decode, CommandError, CommandFrame, CommandValues, FrameFormatError,
    TelemetrySnapshot,
};
use roverlink_frame::{Frame, Reassembler};
use roverlink_schema::{schema_for, Schema, Variant};
use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::config::{ReplyPolicy, SessionConfig};
use crate::error::SessionError;
use crate::rate::RateEstimator;

/// Something a session observed while consuming link bytes.
#[derive(Debug)]
pub enum SessionEvent {
    /// A frame decoded into a complete snapshot.
    Telemetry {
        snapshot: TelemetrySnapshot,
        /// Arrival rate in Hz, when one could be computed.
        rate_hz: Option<f64>,
    },
    /// A frame had the wrong number of fields and was dropped.
    Rejected {
        frame: Frame,
        error: FrameFormatError,
    },
    /// A command built by the reply policy, to be written to the link.
    Command(CommandFrame),
    /// The reply policy asked for a command but the current values are invalid.
    CommandFailed(CommandError),
    /// A reply command was built but could not be written to the link.
    ReplyFailed {
        command: CommandFrame,
        error: SessionError,
    },
}

/// Counters since construction or the last [`Session::reset`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub bytes_received: u64,
    pub frames_decoded: u64,
    pub frames_rejected: u64,
    pub checksum_mismatches: u64,
    pub parse_errors: u64,
    pub commands_built: u64,
}

/// Per-link protocol state.
///
/// Owns the byte buffer, the arrival clock state and the schema. Every
/// mutation takes `&mut self`; nothing here performs I/O.
#[derive(Debug)]
pub struct Session {
    schema: &'static Schema,
    reassembler: Reassembler,
    rate: RateEstimator,
    reply: ReplyPolicy,
    command: CommandValues,
    stats: SessionStats,
}

impl Session {
    /// A session for `variant` with manual replies and an all-zero command.
    pub fn new(variant: Variant) -> Self {
        let schema = schema_for(variant);
        Self {
            schema,
            reassembler: Reassembler::new(),
            rate: RateEstimator::new(),
            reply: ReplyPolicy::Manual,
            command: CommandValues::zeroed(&schema.command),
            stats: SessionStats::default(),
        }
    }

    /// A session configured from `config`; its command values are layered
    /// over an all-zero command.
    pub fn with_config(config: &SessionConfig) -> Self {
        let mut session = Self::new(config.variant);
        session.reply = config.reply;
        session.command.merge(&config.command);
        session
    }

    pub fn schema(&self) -> &'static Schema {
        self.schema
    }

    pub fn variant(&self) -> Variant {
        self.schema.variant
    }

    pub fn reply_policy(&self) -> ReplyPolicy {
        self.reply
    }

    pub fn set_reply_policy(&mut self, reply: ReplyPolicy) {
        self.reply = reply;
    }

    /// Values used for the next command.
    pub fn command_values(&self) -> &CommandValues {
        &self.command
    }

    pub fn command_values_mut(&mut self) -> &mut CommandValues {
        &mut self.command
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Bytes held back waiting for a terminator.
    pub fn buffered_len(&self) -> usize {
        self.reassembler.buffered_len()
    }

    /// Consume a chunk of link bytes, decoding every frame it completes in order.
    pub fn on_bytes(&mut self, bytes: &[u8], now_millis: u64) -> Vec<SessionEvent> {
        self.stats.bytes_received += bytes.len() as u64;
        self.reassembler.append(bytes);

        let mut events = Vec::new();
        while let Some(frame) = self.reassembler.next_frame() {
            self.handle_frame(frame, now_millis, &mut events);
        }
        events
    }

    /// Process one already-delimited frame.
    pub fn process_frame(&mut self, frame: Frame, now_millis: u64) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        self.handle_frame(frame, now_millis, &mut events);
        events
    }

    /// Treat buffered bytes without a terminator as a final frame.
    ///
    /// Used when a finite input ends without a trailing newline.
    pub fn finish(&mut self, now_millis: u64) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        if let Some(frame) = self.reassembler.take_partial() {
            self.handle_frame(frame, now_millis, &mut events);
        }
        events
    }

    /// Build a command from the current values.
    pub fn encode_command(&mut self) -> Result<CommandFrame, CommandError> {
        let frame = build_command(&self.command, self.schema)?;
        self.stats.commands_built += 1;
        Ok(frame)
    }

    /// Discard buffered bytes, the arrival timestamp and the counters.
    ///
    /// Call on every disconnect so stale bytes never join frames from a new link.
    pub fn reset(&mut self) {
        debug!(
            buffered = self.reassembler.buffered_len(),
            "resetting session state"
        );
        self.reassembler.clear();
        self.rate.reset();
        self.stats = SessionStats::default();
    }

    fn handle_frame(&mut self, frame: Frame, now_millis: u64, events: &mut Vec<SessionEvent>) {
        let snapshot = match decode(&frame, self.schema) {
            Ok(snapshot) => snapshot,
            Err(error) => {
                self.stats.frames_rejected += 1;
                warn!(
                    expected = error.expected,
                    actual = error.actual,
                    "dropping frame with unexpected number of values"
                );
                events.push(SessionEvent::Rejected { frame, error });
                return;
            }
        };

        // Only frames that pass the arity check move the arrival clock.
        let rate_hz = self.rate.on_frame_arrived(now_millis);

        self.stats.frames_decoded += 1;
        self.stats.parse_errors += snapshot.parse_errors().len() as u64;
        for err in snapshot.parse_errors() {
            debug!(index = err.index, field = err.name, token = %err.token, "field did not parse");
        }
        if let Some(mismatch) = snapshot.checksum_mismatch() {
            self.stats.checksum_mismatches += 1;
            warn!(
                received = mismatch.received,
                computed = mismatch.computed,
                "checksum mismatch"
            );
        }
        trace!(?rate_hz, "decoded telemetry frame");
        events.push(SessionEvent::Telemetry { snapshot, rate_hz });

        if self.reply == ReplyPolicy::AfterTelemetry {
            match self.encode_command() {
                Ok(command) => events.push(SessionEvent::Command(command)),
                Err(err) => {
                    warn!(error = %err, "reply command not built");
                    events.push(SessionEvent::CommandFailed(err));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use roverlink_codec::FieldValue;

    use super::*;

    const GOOD: &str = "10 -5 1000 2000 12.1000 0.5000 0 0 0 0 0 0 0 0 0 1 0.0 0.0 0.0 0.0 3006";
    const MISMATCHED: &str = "10 -5 1000 2000 12.1 0.5 0 1 0 0 0 0 0 0 0 0 0.0 0.0 0.0 0.0 6";

    fn telemetry(events: &[SessionEvent]) -> Vec<&TelemetrySnapshot> {
        events
            .iter()
            .filter_map(|event| match event {
                SessionEvent::Telemetry { snapshot, .. } => Some(snapshot),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn frames_split_across_chunks_decode_once_complete() {
        let mut session = Session::new(Variant::Legacy21);
        let (head, tail) = GOOD.split_at(17);

        assert!(session.on_bytes(head.as_bytes(), 0).is_empty());
        assert_eq!(session.buffered_len(), head.len());

        let events = session.on_bytes(format!("{tail}\r\n").as_bytes(), 10);
        let snapshots = telemetry(&events);
        assert_eq!(snapshots.len(), 1);
        assert!(snapshots[0].checksum_ok());
        assert_eq!(session.buffered_len(), 0);
    }

    #[test]
    fn mismatched_checksum_still_yields_snapshot() {
        let mut session = Session::new(Variant::Legacy21);
        let events = session.on_bytes(format!("{MISMATCHED}\n").as_bytes(), 0);

        let snapshots = telemetry(&events);
        assert_eq!(snapshots.len(), 1);
        let snapshot = snapshots[0];
        assert_eq!(snapshot.computed_checksum(), 3006);
        assert_eq!(snapshot.received_checksum(), 6);
        assert!(!snapshot.checksum_ok());
        assert_eq!(snapshot.values().len(), 21);
        assert_eq!(snapshot.get("gpio1"), Some(FieldValue::I16(1)));
        assert_eq!(session.stats().checksum_mismatches, 1);
    }

    #[test]
    fn short_frame_is_rejected_and_counted() {
        let mut session = Session::new(Variant::Legacy21);
        let short = GOOD.rsplit_once(' ').expect("frame has fields").0;
        let events = session.on_bytes(format!("{short}\n").as_bytes(), 0);

        assert_eq!(events.len(), 1);
        match &events[0] {
            SessionEvent::Rejected { error, .. } => {
                assert_eq!(error.expected, 21);
                assert_eq!(error.actual, 20);
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert_eq!(session.stats().frames_rejected, 1);
        assert_eq!(session.stats().frames_decoded, 0);
    }

    #[test]
    fn rate_is_reported_from_the_second_frame() {
        let mut session = Session::new(Variant::Legacy21);
        let line = format!("{GOOD}\n");

        let first = session.on_bytes(line.as_bytes(), 1_000);
        let second = session.on_bytes(line.as_bytes(), 1_250);

        assert!(matches!(first[0], SessionEvent::Telemetry { rate_hz: None, .. }));
        assert!(matches!(second[0], SessionEvent::Telemetry { rate_hz: Some(r), .. } if r == 4.0));
    }

    #[test]
    fn rejected_frames_leave_the_rate_clock_alone() {
        let mut session = Session::new(Variant::Legacy21);
        session.on_bytes(b"1 2 3\n", 100);
        let events = session.on_bytes(format!("{GOOD}\n").as_bytes(), 200);
        assert!(matches!(events[0], SessionEvent::Telemetry { rate_hz: None, .. }));

        session.on_bytes(b"\n", 300);
        let events = session.on_bytes(format!("{GOOD}\n").as_bytes(), 450);
        assert!(matches!(events[0], SessionEvent::Telemetry { rate_hz: Some(r), .. } if r == 4.0));
    }

    #[test]
    fn reset_clears_buffer_rate_and_stats() {
        let mut session = Session::new(Variant::Legacy21);
        session.on_bytes(format!("{GOOD}\n").as_bytes(), 1_000);
        session.on_bytes(b"10 -5 10", 1_100);
        session.reset();

        assert_eq!(session.buffered_len(), 0);
        assert_eq!(session.stats(), &SessionStats::default());

        let events = session.on_bytes(format!("{GOOD}\n").as_bytes(), 1_200);
        assert!(matches!(events[0], SessionEvent::Telemetry { rate_hz: None, .. }));
    }

    #[test]
    fn reply_policy_emits_command_after_each_snapshot() {
        let config = SessionConfig {
            reply: ReplyPolicy::AfterTelemetry,
            command: CommandValues::new().with("rightDesiredRpm", 50),
            ..SessionConfig::default()
        };
        let mut session = Session::with_config(&config);
        let events = session.on_bytes(format!("{GOOD}\n{GOOD}\n").as_bytes(), 0);

        assert_eq!(events.len(), 4);
        match &events[1] {
            SessionEvent::Command(command) => {
                assert_eq!(command.payload(), b"50 0 0 0 0 0 0 0 0 0 0 50");
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert_eq!(session.stats().commands_built, 2);
    }

    #[test]
    fn reply_policy_does_not_answer_rejected_frames() {
        let config = SessionConfig {
            reply: ReplyPolicy::AfterTelemetry,
            ..SessionConfig::default()
        };
        let mut session = Session::with_config(&config);
        let events = session.on_bytes(b"garbage\n", 0);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], SessionEvent::Rejected { .. }));
    }

    #[test]
    fn invalid_reply_values_surface_as_events() {
        let config = SessionConfig {
            reply: ReplyPolicy::AfterTelemetry,
            command: CommandValues::new().with("gpio9", 1),
            ..SessionConfig::default()
        };
        let mut session = Session::with_config(&config);
        let events = session.on_bytes(format!("{GOOD}\n").as_bytes(), 0);
        assert!(matches!(
            events[1],
            SessionEvent::CommandFailed(CommandError::UnknownField { .. })
        ));
    }

    #[test]
    fn finish_decodes_unterminated_tail() {
        let mut session = Session::new(Variant::Legacy21);
        assert!(session.on_bytes(GOOD.as_bytes(), 0).is_empty());
        let events = session.finish(0);
        assert_eq!(telemetry(&events).len(), 1);
        assert!(session.finish(0).is_empty());
    }

    #[test]
    fn stats_count_bytes_and_parse_errors() {
        let mut session = Session::new(Variant::Legacy21);
        let line = format!("{}\n", GOOD.replacen("10", "x", 1));
        session.on_bytes(line.as_bytes(), 0);

        let stats = session.stats();
        assert_eq!(stats.bytes_received, line.len() as u64);
        assert_eq!(stats.frames_decoded, 1);
        assert_eq!(stats.parse_errors, 1);
        assert_eq!(stats.checksum_mismatches, 1);
    }

    fn decoded_payloads(session: &mut Session, chunks: &[&[u8]]) -> Vec<Vec<String>> {
        chunks
            .iter()
            .flat_map(|chunk| session.on_bytes(chunk, 0))
            .filter_map(|event| match event {
                SessionEvent::Telemetry { snapshot, .. } => Some(
                    snapshot
                        .values()
                        .iter()
                        .map(ToString::to_string)
                        .collect(),
                ),
                _ => None,
            })
            .collect()
    }

    proptest! {
        #[test]
        fn decoding_is_independent_of_chunk_boundaries(
            cuts in proptest::collection::vec(any::<prop::sample::Index>(), 0..12),
        ) {
            let stream = format!("{GOOD}\r\n{MISMATCHED}\n  {GOOD}  \n");
            let bytes = stream.as_bytes();

            let mut positions: Vec<usize> = cuts.iter().map(|cut| cut.index(bytes.len())).collect();
            positions.sort_unstable();
            positions.dedup();

            let mut chunks = Vec::new();
            let mut start = 0;
            for pos in positions {
                chunks.push(&bytes[start..pos]);
                start = pos;
            }
            chunks.push(&bytes[start..]);

            let whole = decoded_payloads(&mut Session::new(Variant::Legacy21), &[bytes]);
            let split = decoded_payloads(&mut Session::new(Variant::Legacy21), &chunks);
            prop_assert_eq!(whole.len(), 3);
            prop_assert_eq!(whole, split);
        }
    }
}
