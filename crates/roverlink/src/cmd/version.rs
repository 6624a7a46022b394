use roverlink_schema::Variant;

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("roverlink {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    let variants: Vec<&str> = Variant::ALL.iter().map(|variant| variant.name()).collect();

    println!("name: roverlink");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "target: {}",
        option_env!("ROVERLINK_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!("git_hash: {}", option_env!("GIT_HASH").unwrap_or("unknown"));
    println!("variants: {}", variants.join(", "));
    println!(
        "features: session={}, async={}, cli=true",
        cfg!(feature = "session"),
        cfg!(feature = "async")
    );

    Ok(SUCCESS)
}
