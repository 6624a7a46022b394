use roverlink_codec::{build_command, CommandValues};
use roverlink_schema::schema_for;

use crate::cmd::{session_config, EncodeArgs};
use crate::exit::{command_error, CliResult, SUCCESS};
use crate::output::{print_command, OutputFormat};

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let config = session_config(args.config.as_deref(), args.variant, &args.set)?;
    let schema = schema_for(config.variant);

    let mut values = CommandValues::zeroed(&schema.command);
    values.merge(&config.command);

    let command = build_command(&values, schema).map_err(|err| command_error("encode", err))?;
    print_command(&command, schema, format);
    Ok(SUCCESS)
}
