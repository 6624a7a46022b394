use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use roverlink_codec::{CommandFrame, FieldValue, FrameFormatError, Snapshot};
use roverlink_frame::Frame;
use roverlink_schema::{FrameLayout, Schema};
use roverlink_session::SessionStats;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// Name/value pairs serialized as a JSON object, keeping their order.
struct FieldMap<'a, V>(Vec<(&'a str, V)>);

impl<V: Serialize> Serialize for FieldMap<'_, V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in &self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<'a> FieldMap<'a, FieldValue> {
    fn of(snapshot: &'a Snapshot) -> Self {
        Self(snapshot.fields().map(|(field, value)| (field.name, value)).collect())
    }
}

#[derive(Serialize)]
struct ChecksumOutput {
    received: i32,
    computed: i32,
    ok: bool,
}

#[derive(Serialize)]
struct ParseErrorOutput<'a> {
    index: usize,
    name: &'a str,
    token: &'a str,
}

#[derive(Serialize)]
struct SnapshotOutput<'a> {
    kind: &'a str,
    fields: FieldMap<'a, FieldValue>,
    checksum: ChecksumOutput,
    rate_hz: Option<f64>,
    parse_errors: Vec<ParseErrorOutput<'a>>,
}

#[derive(Serialize)]
struct RejectedOutput<'a> {
    kind: &'a str,
    expected: usize,
    actual: usize,
    frame: String,
}

#[derive(Serialize)]
struct CommandOutput<'a> {
    kind: &'a str,
    variant: &'a str,
    values: FieldMap<'a, i32>,
    checksum: i32,
    frame: String,
}

#[derive(Serialize)]
struct LayoutFieldOutput<'a> {
    index: usize,
    name: &'a str,
    kind: &'a str,
    summed: bool,
}

#[derive(Serialize)]
struct SchemaOutput<'a> {
    variant: &'a str,
    telemetry: Vec<LayoutFieldOutput<'a>>,
    command: Vec<LayoutFieldOutput<'a>>,
}

/// Rate rounded to the two decimals the console shows.
fn round_rate(rate_hz: Option<f64>) -> Option<f64> {
    rate_hz.map(|rate| (rate * 100.0).round() / 100.0)
}

fn rate_text(rate_hz: Option<f64>) -> String {
    rate_hz.map_or_else(|| "-".to_string(), |rate| format!("{rate:.2} Hz"))
}

fn checksum_text(snapshot: &Snapshot) -> String {
    match snapshot.checksum_mismatch() {
        Some(mismatch) => format!("checksum mismatch: calculated checksum = {}", mismatch.computed),
        None => "checksum ok".to_string(),
    }
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
}

pub fn print_snapshot(snapshot: &Snapshot, rate_hz: Option<f64>, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = SnapshotOutput {
                kind: "telemetry",
                fields: FieldMap::of(snapshot),
                checksum: ChecksumOutput {
                    received: snapshot.received_checksum(),
                    computed: snapshot.computed_checksum(),
                    ok: snapshot.checksum_ok(),
                },
                rate_hz: round_rate(rate_hz),
                parse_errors: snapshot
                    .parse_errors()
                    .iter()
                    .map(|err| ParseErrorOutput {
                        index: err.index,
                        name: err.name,
                        token: &err.token,
                    })
                    .collect(),
            };
            println!("{}", to_json(&out));
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FIELD", "VALUE"]);
            for (field, value) in snapshot.fields() {
                table.add_row(vec![field.name.to_string(), value.to_string()]);
            }
            table.add_row(vec!["rate".to_string(), rate_text(rate_hz)]);
            table.add_row(vec!["status".to_string(), checksum_text(snapshot)]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            let fields: Vec<String> = snapshot
                .fields()
                .map(|(field, value)| format!("{}={value}", field.name))
                .collect();
            println!(
                "{} | {} | {}",
                fields.join(" "),
                rate_text(rate_hz),
                checksum_text(snapshot)
            );
            for err in snapshot.parse_errors() {
                println!("  {err}");
            }
        }
    }
}

pub fn print_rejected(frame: &Frame, error: &FrameFormatError, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = RejectedOutput {
                kind: "rejected",
                expected: error.expected,
                actual: error.actual,
                frame: frame.to_text().into_owned(),
            };
            println!("{}", to_json(&out));
        }
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("rejected: {error}: {:?}", frame.to_text());
        }
    }
}

pub fn print_command(command: &CommandFrame, schema: &Schema, format: OutputFormat) {
    let text = String::from_utf8_lossy(command.payload()).into_owned();
    match format {
        OutputFormat::Json => {
            let out = CommandOutput {
                kind: "command",
                variant: schema.variant.name(),
                values: FieldMap(
                    schema
                        .command
                        .value_fields()
                        .iter()
                        .map(|field| field.name)
                        .zip(command.values().iter().copied())
                        .collect(),
                ),
                checksum: command.checksum(),
                frame: text,
            };
            println!("{}", to_json(&out));
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FIELD", "VALUE"]);
            for (field, value) in schema.command.value_fields().iter().zip(command.values()) {
                table.add_row(vec![field.name.to_string(), value.to_string()]);
            }
            table.add_row(vec![
                schema.command.checksum_field().name.to_string(),
                command.checksum().to_string(),
            ]);
            println!("{table}");
        }
        OutputFormat::Pretty => println!("{text}"),
    }
}

fn layout_rows(layout: &FrameLayout) -> Vec<LayoutFieldOutput<'static>> {
    layout
        .fields
        .iter()
        .map(|field| LayoutFieldOutput {
            index: field.index,
            name: field.name,
            kind: field.kind.name(),
            summed: layout.is_summed(field.index),
        })
        .collect()
}

pub fn print_schema(schema: &Schema, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = SchemaOutput {
                variant: schema.variant.name(),
                telemetry: layout_rows(&schema.telemetry),
                command: layout_rows(&schema.command),
            };
            println!("{}", to_json(&out));
        }
        OutputFormat::Table | OutputFormat::Pretty => {
            for (title, layout) in [("telemetry", &schema.telemetry), ("command", &schema.command)] {
                let mut table = Table::new();
                table
                    .load_preset(UTF8_FULL)
                    .set_content_arrangement(ContentArrangement::Dynamic)
                    .set_header(vec!["INDEX", "NAME", "KIND", "SUMMED"]);
                for row in layout_rows(layout) {
                    table.add_row(vec![
                        row.index.to_string(),
                        row.name.to_string(),
                        row.kind.to_string(),
                        (if row.summed { "yes" } else { "" }).to_string(),
                    ]);
                }
                println!("{} {title} ({} fields)", schema.variant, layout.field_count());
                println!("{table}");
            }
        }
    }
}

/// Session totals go to stderr so stdout stays one record per frame.
pub fn print_summary(stats: &SessionStats, format: OutputFormat) {
    match format {
        OutputFormat::Json => eprintln!("{}", to_json(stats)),
        OutputFormat::Table | OutputFormat::Pretty => eprintln!(
            "frames decoded={} rejected={} checksum_mismatches={} parse_errors={} bytes={}",
            stats.frames_decoded,
            stats.frames_rejected,
            stats.checksum_mismatches,
            stats.parse_errors,
            stats.bytes_received
        ),
    }
}
