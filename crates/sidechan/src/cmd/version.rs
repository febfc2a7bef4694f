use sidechan_dispatch::DispatchConfig;

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("sidechan {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    let defaults = DispatchConfig::default();
    println!("name: sidechan");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "target: {}",
        option_env!("SIDECHAN_BUILD_TARGET").unwrap_or("unknown")
    );
    println!(
        "profile: {}",
        option_env!("SIDECHAN_BUILD_PROFILE").unwrap_or("unknown")
    );
    println!("features: async={}, cli=true", cfg!(feature = "async"));
    println!("quiet_window_ms: {}", defaults.quiet_window.as_millis());
    println!("fatal_codes: {}", defaults.fatal_codes.join(","));

    Ok(SUCCESS)
}
