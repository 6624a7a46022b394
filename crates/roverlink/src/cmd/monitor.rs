use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use roverlink_frame::FrameConfig;
use roverlink_session::{LinkSession, ReplyPolicy, SessionError, SessionEvent, SessionStats};
use roverlink_transport::LinkAddress;
use tracing::{info, warn};

use crate::cmd::{session_config, MonitorArgs};
use crate::exit::{session_error, transport_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_rejected, print_snapshot, print_summary, OutputFormat};

/// Read timeout so Ctrl-C is noticed on a quiet link.
const POLL_INTERVAL: Duration = Duration::from_millis(200);
const RECONNECT_DELAY: Duration = Duration::from_secs(1);

pub fn run(args: MonitorArgs, format: OutputFormat) -> CliResult<i32> {
    let mut config = session_config(args.config.as_deref(), args.variant, &args.set)?;
    if args.reply {
        config.reply = ReplyPolicy::AfterTelemetry;
    }
    if let Some(baud) = args.baud {
        config.baud_rate = baud;
    }

    let address = match args.link.as_deref().or(config.link.as_deref()) {
        Some(text) => text
            .parse::<LinkAddress>()
            .map_err(|err| transport_error("invalid link", err))?,
        None => LinkAddress::default(),
    };

    let frame_config = FrameConfig {
        read_timeout: Some(config.read_timeout().unwrap_or(POLL_INTERVAL)),
        ..FrameConfig::default()
    };

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut printed = 0usize;
    let mut first_attempt = true;
    // poll() resets the session on disconnect, so keep the last counters seen
    let mut stats = SessionStats::default();

    while running.load(Ordering::SeqCst) {
        let mut link = match LinkSession::open(&address, &config, frame_config.clone()) {
            Ok(link) => link,
            Err(err) if first_attempt || !args.reconnect => {
                return Err(session_error("open failed", err));
            }
            Err(err) => {
                warn!(%address, error = %err, "reopen failed; retrying");
                std::thread::sleep(RECONNECT_DELAY);
                continue;
            }
        };
        first_attempt = false;

        while running.load(Ordering::SeqCst) {
            let events = match link.poll() {
                Ok(events) => events,
                Err(SessionError::Disconnected) => break,
                Err(err) => {
                    print_summary(&stats, format);
                    return Err(session_error("receive failed", err));
                }
            };
            stats = *link.session().stats();

            for event in events {
                match event {
                    SessionEvent::Telemetry { snapshot, rate_hz } => {
                        print_snapshot(&snapshot, rate_hz, format);
                        printed = printed.saturating_add(1);
                    }
                    SessionEvent::Rejected { frame, error } => {
                        print_rejected(&frame, &error, format);
                    }
                    SessionEvent::ReplyFailed { error, .. } => {
                        warn!(%address, error = %error, "reply not sent");
                    }
                    SessionEvent::Command(_) | SessionEvent::CommandFailed(_) => {}
                }
                if args.count.is_some_and(|count| printed >= count) {
                    print_summary(&stats, format);
                    return Ok(SUCCESS);
                }
            }
        }

        if !running.load(Ordering::SeqCst) {
            break;
        }
        if !args.reconnect {
            info!(%address, "link closed");
            break;
        }
        info!(%address, "link closed; reconnecting");
        std::thread::sleep(RECONNECT_DELAY);
    }

    print_summary(&stats, format);
    Ok(SUCCESS)
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
