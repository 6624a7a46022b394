use std::io::{ErrorKind, Read, Write};

use roverlink_codec::{CommandFrame, CommandValues};
use roverlink_frame::{FrameConfig, FrameWriter};
use roverlink_transport::{LinkAddress, LinkStream, SerialConfig, TransportError};
use tracing::{debug, info, warn};

use crate::clock::{Clock, MonotonicClock};
use crate::config::SessionConfig;
use crate::error::{Result, SessionError};
use crate::session::{Session, SessionEvent};

/// A [`Session`] driven by a live link.
///
/// Reads feed the session; commands produced by its reply policy are written
/// back before [`poll`](Self::poll) returns.
pub struct LinkSession<R, W, C = MonotonicClock> {
    reader: R,
    writer: FrameWriter<W>,
    session: Session,
    clock: C,
    chunk: Vec<u8>,
}

impl LinkSession<LinkStream, LinkStream, MonotonicClock> {
    /// Open the link at `address` and start a session configured by `config`.
    pub fn open(
        address: &LinkAddress,
        config: &SessionConfig,
        frame_config: FrameConfig,
    ) -> Result<Self> {
        let serial = SerialConfig {
            baud_rate: config.baud_rate,
        };
        let mut stream = address.open(&serial)?;
        stream.set_read_timeout(frame_config.read_timeout)?;
        stream.set_write_timeout(frame_config.write_timeout)?;
        let write_half = stream.try_clone()?;

        info!(%address, variant = %config.variant, kind = stream.kind(), "link session opened");

        Ok(Self::from_parts(
            stream,
            write_half,
            Session::with_config(config),
            MonotonicClock::new(),
            frame_config,
        ))
    }
}

impl<R: Read, W: Write, C: Clock> LinkSession<R, W, C> {
    /// Assemble a link session from its halves.
    pub fn from_parts(
        reader: R,
        writer: W,
        session: Session,
        clock: C,
        frame_config: FrameConfig,
    ) -> Self {
        let chunk = vec![0u8; frame_config.read_chunk_size.max(1)];
        Self {
            reader,
            writer: FrameWriter::with_config(writer, frame_config),
            session,
            clock,
            chunk,
        }
    }

    /// Perform one read and process everything it completed.
    ///
    /// A read timeout yields no events. End of stream resets the session and
    /// returns [`SessionError::Disconnected`]. A reply that cannot be written
    /// becomes [`SessionEvent::ReplyFailed`]; the decoded telemetry is still
    /// returned.
    pub fn poll(&mut self) -> Result<Vec<SessionEvent>> {
        let n = loop {
            match self.reader.read(&mut self.chunk) {
                Ok(n) => break n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    return Ok(Vec::new());
                }
                Err(err) => return Err(TransportError::Io(err).into()),
            }
        };

        if n == 0 {
            info!("link closed by peer");
            self.session.reset();
            return Err(SessionError::Disconnected);
        }

        let decoded = self
            .session
            .on_bytes(&self.chunk[..n], self.clock.now_millis());
        let mut events = Vec::with_capacity(decoded.len());
        for event in decoded {
            match event {
                SessionEvent::Command(command) => events.push(self.write_reply(command)),
                other => events.push(other),
            }
        }
        Ok(events)
    }

    fn write_reply(&mut self, command: CommandFrame) -> SessionEvent {
        match self.writer.write_frame(&command.to_frame()) {
            Ok(_) => {
                debug!(checksum = command.checksum(), "reply command sent");
                SessionEvent::Command(command)
            }
            Err(err) => {
                let error = SessionError::from(err);
                warn!(error = %error, "reply command not sent");
                SessionEvent::ReplyFailed { command, error }
            }
        }
    }

    /// Build a command from the session's current values and send it.
    pub fn send_command(&mut self) -> Result<CommandFrame> {
        let command = self.session.encode_command()?;
        self.writer.write_frame(&command.to_frame())?;
        debug!(checksum = command.checksum(), "command sent");
        Ok(command)
    }

    /// Replace the session's command values with `values` and send them.
    pub fn send(&mut self, values: &CommandValues) -> Result<CommandFrame> {
        *self.session.command_values_mut() = values.clone();
        self.send_command()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Tear down into the session, keeping its configuration for a reconnect.
    pub fn into_session(self) -> Session {
        self.session
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::io;

    use roverlink_schema::Variant;

    use super::*;
    use crate::clock::ManualClock;
    use crate::config::ReplyPolicy;

    const GOOD: &str = "10 -5 1000 2000 12.1000 0.5000 0 0 0 0 0 0 0 0 0 1 0.0 0.0 0.0 0.0 3006";

    /// Hands out scripted read results one call at a time, then end of stream.
    struct ScriptedReader {
        script: VecDeque<io::Result<Vec<u8>>>,
    }

    impl ScriptedReader {
        fn new(script: Vec<io::Result<Vec<u8>>>) -> Self {
            Self {
                script: script.into(),
            }
        }
    }

    impl Read for ScriptedReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.script.pop_front() {
                Some(Ok(bytes)) => {
                    buf[..bytes.len()].copy_from_slice(&bytes);
                    Ok(bytes.len())
                }
                Some(Err(err)) => Err(err),
                None => Ok(0),
            }
        }
    }

    fn link(
        script: Vec<io::Result<Vec<u8>>>,
        config: &SessionConfig,
        clock: ManualClock,
    ) -> LinkSession<ScriptedReader, Vec<u8>, ManualClock> {
        LinkSession::from_parts(
            ScriptedReader::new(script),
            Vec::new(),
            Session::with_config(config),
            clock,
            FrameConfig::default(),
        )
    }

    fn line() -> Vec<u8> {
        format!("{GOOD}\n").into_bytes()
    }

    #[test]
    fn poll_uses_clock_for_rate() {
        let clock = ManualClock::new(1_000);
        let mut link = link(vec![Ok(line()), Ok(line())], &SessionConfig::default(), clock.clone());

        let first = link.poll().expect("first poll should succeed");
        assert!(matches!(first[0], SessionEvent::Telemetry { rate_hz: None, .. }));

        clock.advance(250);
        let second = link.poll().expect("second poll should succeed");
        assert!(matches!(second[0], SessionEvent::Telemetry { rate_hz: Some(r), .. } if r == 4.0));
    }

    #[test]
    fn timeout_yields_no_events() {
        let mut link = link(
            vec![Err(io::Error::from(ErrorKind::TimedOut)), Ok(line())],
            &SessionConfig::default(),
            ManualClock::default(),
        );
        assert!(link.poll().expect("timeout is not an error").is_empty());
        assert_eq!(link.poll().expect("data should decode").len(), 1);
    }

    #[test]
    fn end_of_stream_resets_and_reports_disconnect() {
        let mut link = link(
            vec![Ok(line()), Ok(b"10 -5".to_vec())],
            &SessionConfig::default(),
            ManualClock::default(),
        );
        link.poll().expect("frame should decode");
        link.poll().expect("partial frame should buffer");
        assert_eq!(link.session().buffered_len(), 5);

        let err = link.poll().unwrap_err();
        assert!(matches!(err, SessionError::Disconnected));
        assert_eq!(link.session().buffered_len(), 0);
        assert_eq!(link.session().stats().frames_decoded, 0);
    }

    #[test]
    fn read_failure_is_a_link_error() {
        let mut link = link(
            vec![Err(io::Error::from(ErrorKind::BrokenPipe))],
            &SessionConfig::default(),
            ManualClock::default(),
        );
        let err = link.poll().unwrap_err();
        assert!(matches!(err, SessionError::Link(TransportError::Io(_))));
    }

    #[test]
    fn reply_policy_writes_commands_to_the_link() {
        let config = SessionConfig {
            reply: ReplyPolicy::AfterTelemetry,
            command: CommandValues::new().with("leftDesiredRpm", -20),
            ..SessionConfig::default()
        };
        let mut link = link(vec![Ok(line())], &config, ManualClock::default());
        link.poll().expect("frame should decode");

        let written = link.writer.get_ref();
        assert_eq!(written.as_slice(), b"0 -20 0 0 0 0 0 0 0 0 0 -20\n");
    }

    struct BrokenWriter;

    impl Write for BrokenWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn failed_reply_write_keeps_decoded_telemetry() {
        let config = SessionConfig {
            reply: ReplyPolicy::AfterTelemetry,
            ..SessionConfig::default()
        };
        let mut link = LinkSession::from_parts(
            ScriptedReader::new(vec![Ok(format!("{GOOD}\n{GOOD}\n").into_bytes())]),
            BrokenWriter,
            Session::with_config(&config),
            ManualClock::default(),
            FrameConfig::default(),
        );

        let events = link.poll().expect("decoded frames should be returned");
        assert_eq!(events.len(), 4);
        assert!(matches!(events[0], SessionEvent::Telemetry { .. }));
        assert!(matches!(
            events[1],
            SessionEvent::ReplyFailed {
                error: SessionError::Link(TransportError::Io(_)),
                ..
            }
        ));
        assert!(matches!(events[2], SessionEvent::Telemetry { .. }));
        assert!(matches!(events[3], SessionEvent::ReplyFailed { .. }));
        assert_eq!(link.session().stats().frames_decoded, 2);
    }

    #[test]
    fn manual_send_uses_given_values() {
        let mut link = link(Vec::new(), &SessionConfig::default(), ManualClock::default());
        let values = CommandValues::zeroed(&link.session().schema().command).with("estop", 1);

        let command = link.send(&values).expect("command should send");
        assert_eq!(command.checksum(), 1);
        assert_eq!(link.writer.get_ref().as_slice(), b"0 0 1 0 0 0 0 0 0 0 0 1\n");
    }

    #[test]
    fn incomplete_manual_command_sends_nothing() {
        let mut link = link(Vec::new(), &SessionConfig::default(), ManualClock::default());
        let err = link.send(&CommandValues::new()).unwrap_err();
        assert!(matches!(err, SessionError::Command(_)));
        assert!(link.writer.get_ref().is_empty());
    }

    #[test]
    fn into_session_keeps_variant() {
        let config = SessionConfig {
            variant: Variant::Extended25,
            ..SessionConfig::default()
        };
        let link = link(Vec::new(), &config, ManualClock::default());
        assert_eq!(link.into_session().variant(), Variant::Extended25);
    }

    #[cfg(unix)]
    #[test]
    fn open_talks_to_a_socket_controller() {
        use std::io::{BufRead, BufReader};

        use roverlink_transport::UnixDomainSocket;

        let path = std::env::temp_dir().join(format!("roverlink-link-{}.sock", std::process::id()));
        let controller = UnixDomainSocket::bind(&path).expect("controller socket should bind");
        let address = LinkAddress::Unix(path.clone());

        let handle = std::thread::spawn(move || {
            let mut stream = controller.accept().expect("session should connect");
            stream.write_all(&line()).expect("telemetry should send");
            let mut reply = String::new();
            BufReader::new(stream)
                .read_line(&mut reply)
                .expect("reply should arrive");
            reply
        });

        let config = SessionConfig {
            reply: ReplyPolicy::AfterTelemetry,
            ..SessionConfig::default()
        };
        let mut link = LinkSession::open(&address, &config, FrameConfig::default())
            .expect("link should open");

        let events = link.poll().expect("telemetry should arrive");
        assert!(matches!(events[0], SessionEvent::Telemetry { .. }));
        assert!(matches!(events[1], SessionEvent::Command(_)));

        assert_eq!(handle.join().expect("controller should finish"), "0 0 0 0 0 0 0 0 0 0 0 0\n");
        assert!(matches!(link.poll(), Err(SessionError::Disconnected)));
    }
}
