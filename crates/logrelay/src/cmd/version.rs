use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("logrelay {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: logrelay");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "target: {}",
        option_env!("LOGRELAY_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!(
        "profile: {}",
        option_env!("LOGRELAY_BUILD_PROFILE").unwrap_or("unknown")
    );
    println!(
        "git_hash: {}",
        option_env!("LOGRELAY_GIT_HASH").unwrap_or("unknown")
    );
    println!(
        "features: server={}, client={}, cli=true",
        cfg!(feature = "server"),
        cfg!(feature = "client")
    );

    Ok(SUCCESS)
}
