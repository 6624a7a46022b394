use roverlink_schema::schema_for;

use crate::cmd::SchemaArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_schema, OutputFormat};

pub fn run(args: SchemaArgs, format: OutputFormat) -> CliResult<i32> {
    print_schema(schema_for(args.variant), format);
    Ok(SUCCESS)
}
