use serde::Serialize;
use wcfrpc_transport::DEFAULT_COMMAND_ADDRESS;

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_json, OutputFormat};

#[derive(Serialize)]
struct VersionInfo {
    name: &'static str,
    version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    build: Option<BuildInfo>,
}

#[derive(Serialize)]
struct BuildInfo {
    target: &'static str,
    git_hash: &'static str,
    client: bool,
    protocol: String,
    max_payload: usize,
    default_address: &'static str,
}

impl BuildInfo {
    fn current() -> Self {
        Self {
            target: option_env!("WCFRPC_BUILD_TARGET").unwrap_or("unknown"),
            git_hash: option_env!("GIT_HASH").unwrap_or("unknown"),
            client: cfg!(feature = "client"),
            protocol: format!(
                "nng pair1 (0x{:04x}) over tcp",
                wcfrpc_frame::PAIR1_PROTOCOL
            ),
            max_payload: wcfrpc_frame::DEFAULT_MAX_PAYLOAD,
            default_address: DEFAULT_COMMAND_ADDRESS,
        }
    }
}

pub fn run(args: VersionArgs, format: OutputFormat) -> CliResult<i32> {
    let info = VersionInfo {
        name: "wcfrpc",
        version: env!("CARGO_PKG_VERSION"),
        build: args.extended.then(BuildInfo::current),
    };

    match (format, &info.build) {
        (OutputFormat::Json, _) => print_json(&info),
        (_, None) => println!("{} {}", info.name, info.version),
        (_, Some(build)) => {
            println!("name: {}", info.name);
            println!("version: {}", info.version);
            println!("target: {}", build.target);
            println!("git_hash: {}", build.git_hash);
            println!("client: {}", build.client);
            println!("protocol: {}", build.protocol);
            println!("max_payload: {}", build.max_payload);
            println!("default_address: {}", build.default_address);
        }
    }

    Ok(SUCCESS)
}
