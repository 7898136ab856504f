use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("serialhttp {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: serialhttp");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "target: {}",
        option_env!("SERIALHTTP_BUILD_TARGET").unwrap_or("unknown")
    );
    println!(
        "profile: {}",
        option_env!("SERIALHTTP_BUILD_PROFILE").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!(
        "frame: attempts={} min_attempt_ms={}",
        serialhttp_frame::TIMEOUT_FRACTIONS,
        serialhttp_frame::MIN_ATTEMPT_TIMEOUT.as_millis()
    );
    println!("features: http={}, cli=true", cfg!(feature = "http"));

    Ok(SUCCESS)
}
