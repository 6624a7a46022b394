use std::fs::File;
use std::io::{self, Read};

use roverlink_codec::decode_command;
use roverlink_frame::{Frame, FrameError, FrameReader};
use roverlink_schema::schema_for;
use roverlink_session::{Session, SessionEvent};

use crate::cmd::DecodeArgs;
use crate::exit::{frame_error, CliError, CliResult, DATA_INVALID, SUCCESS, USAGE};
use crate::output::{print_rejected, print_snapshot, print_summary, OutputFormat};

/// Decode every line of the input.
///
/// Exits 0 when every frame decoded cleanly and 60 when any frame was
/// rejected, failed to parse or carried a wrong checksum.
pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let input: Box<dyn Read> = match &args.file {
        Some(path) => Box::new(File::open(path).map_err(|err| {
            CliError::new(USAGE, format!("cannot open {}: {err}", path.display()))
        })?),
        None => Box::new(io::stdin().lock()),
    };
    let mut reader = FrameReader::new(input);
    let mut frames = Vec::new();
    loop {
        match reader.read_frame() {
            Ok(frame) => frames.push(frame),
            Err(FrameError::ConnectionClosed) => {
                frames.extend(reader.take_partial());
                break;
            }
            Err(err) => return Err(frame_error("read failed", err)),
        }
    }
    // blank lines separate captures; they are not frames
    frames.retain(|frame| !frame.is_empty());

    let clean = if args.command {
        decode_commands(&frames, &args, format)
    } else {
        decode_telemetry(frames, &args, format)
    };
    Ok(if clean { SUCCESS } else { DATA_INVALID })
}

fn decode_telemetry(frames: Vec<Frame>, args: &DecodeArgs, format: OutputFormat) -> bool {
    let mut session = Session::new(args.variant);
    for frame in frames {
        // offline input carries no arrival times
        for event in session.process_frame(frame, 0) {
            match event {
                SessionEvent::Telemetry { snapshot, .. } => print_snapshot(&snapshot, None, format),
                SessionEvent::Rejected { frame, error } => print_rejected(&frame, &error, format),
                SessionEvent::Command(_)
                | SessionEvent::CommandFailed(_)
                | SessionEvent::ReplyFailed { .. } => {}
            }
        }
    }
    let stats = *session.stats();
    print_summary(&stats, format);
    stats.frames_rejected == 0 && stats.checksum_mismatches == 0 && stats.parse_errors == 0
}

fn decode_commands(frames: &[Frame], args: &DecodeArgs, format: OutputFormat) -> bool {
    let schema = schema_for(args.variant);
    let mut clean = true;
    for frame in frames {
        match decode_command(frame, schema) {
            Ok(snapshot) => {
                clean &= snapshot.is_clean();
                print_snapshot(&snapshot, None, format);
            }
            Err(error) => {
                clean = false;
                print_rejected(frame, &error, format);
            }
        }
    }
    clean
}
