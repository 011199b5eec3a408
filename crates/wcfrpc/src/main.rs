mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;
use wcfrpc_client::{ClientConfig, DEFAULT_BUFFER_CAPACITY};
use wcfrpc_transport::{Address, DEFAULT_COMMAND_ADDRESS};

use crate::cmd::{parse_duration, Command, Context};
use crate::exit::{client_error, transport_error, CliResult};
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "wcfrpc", version, about = "Automation host RPC client")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "warn", global = true)]
    log_level: LogLevel,

    /// Command endpoint of the host.
    #[arg(long, env = "WCFRPC_ADDR", default_value = DEFAULT_COMMAND_ADDRESS, global = true)]
    addr: String,

    /// Event-stream endpoint. Defaults to the command port + 1.
    #[arg(long, env = "WCFRPC_EVENT_ADDR", global = true)]
    event_addr: Option<String>,

    /// Send/receive deadline per call (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s", global = true)]
    timeout: String,

    /// Inbound message buffer capacity.
    #[arg(long, default_value_t = DEFAULT_BUFFER_CAPACITY, global = true)]
    buffer: usize,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    fn client_config(&self) -> CliResult<ClientConfig> {
        let command_address =
            Address::parse(&self.addr).map_err(|err| transport_error("invalid --addr", err))?;
        let mut config = ClientConfig::new(command_address)
            .map_err(|err| client_error("invalid --addr", err))?;

        if let Some(event_addr) = &self.event_addr {
            let event_address = Address::parse(event_addr)
                .map_err(|err| transport_error("invalid --event-addr", err))?;
            config = config.with_event_address(event_address);
        }

        let deadline = parse_duration(&self.timeout)?;
        config
            .with_deadline(Some(deadline))
            .with_buffer_capacity(self.buffer)
            .map_err(|err| client_error("invalid --buffer", err))
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cli.client_config().and_then(|config| {
        let ctx = Context { format, config };
        cmd::run(cli.command, &ctx)
    });

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}
