use std::time::Duration;

use clap::{Args, Subcommand, ValueEnum};
use wcfrpc_client::{ClientConfig, IdentityKind, RpcClient};

use crate::exit::{client_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod contacts;
pub mod listen;
pub mod query;
pub mod room;
pub mod send;
pub mod status;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show login state and the logged-in account.
    Status(StatusArgs),
    /// List contacts, groups or channels.
    Contacts(ContactsArgs),
    /// Send a message.
    #[command(subcommand)]
    Send(SendCommand),
    /// Inspect the host's databases.
    #[command(subcommand)]
    Query(QueryCommand),
    /// Manage group membership.
    #[command(subcommand)]
    Room(RoomCommand),
    /// Receive inbound messages and print them.
    Listen(ListenArgs),
    /// Show version information.
    Version(VersionArgs),
}

/// Everything a command needs besides its own arguments.
pub struct Context {
    pub format: OutputFormat,
    pub config: ClientConfig,
}

impl Context {
    pub fn connect(&self) -> CliResult<RpcClient> {
        RpcClient::dial(self.config.clone()).map_err(|err| {
            client_error(
                &format!("connect to {} failed", self.config.command_address),
                err,
            )
        })
    }
}

pub fn run(command: Command, ctx: &Context) -> CliResult<i32> {
    match command {
        Command::Status(args) => status::run(args, ctx),
        Command::Contacts(args) => contacts::run(args, ctx),
        Command::Send(command) => send::run(command, ctx),
        Command::Query(command) => query::run(command, ctx),
        Command::Room(command) => room::run(command, ctx),
        Command::Listen(args) => listen::run(args, ctx),
        Command::Version(args) => version::run(args, ctx.format),
    }
}

#[derive(Args, Debug, Default)]
pub struct StatusArgs {}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum KindArg {
    Peer,
    Group,
    Channel,
}

impl From<KindArg> for IdentityKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Peer => IdentityKind::Peer,
            KindArg::Group => IdentityKind::Group,
            KindArg::Channel => IdentityKind::Channel,
        }
    }
}

#[derive(Args, Debug)]
pub struct ContactsArgs {
    /// Only list one kind of contact.
    #[arg(long, value_enum)]
    pub kind: Option<KindArg>,
    /// Check whether this id is a known contact of `--kind` instead of listing.
    #[arg(long, requires = "kind")]
    pub check: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum SendCommand {
    /// Send a text message.
    Text {
        /// Receiver wxid or room id.
        receiver: String,
        /// Message text.
        text: String,
        /// Members to mention (comma-separated, group chats only).
        #[arg(long, value_delimiter = ',')]
        at: Vec<String>,
    },
    /// Send an image stored on the host machine.
    Image { receiver: String, path: String },
    /// Send a file stored on the host machine.
    File { receiver: String, path: String },
    /// Send raw XML content.
    Xml {
        receiver: String,
        content: String,
        /// Thumbnail path on the host machine.
        #[arg(long, default_value = "")]
        path: String,
        /// XML message type.
        #[arg(long = "type", default_value = "33")]
        xml_type: i32,
    },
    /// Send a link card.
    Link {
        receiver: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        url: String,
        #[arg(long, default_value = "")]
        digest: String,
        #[arg(long, default_value = "")]
        thumb_url: String,
        /// Name shown on the card's footer.
        #[arg(long, default_value = "")]
        name: String,
        /// Channel id the card links to.
        #[arg(long, default_value = "")]
        account: String,
    },
    /// "Pat" a group member.
    Pat { room: String, wxid: String },
    /// Forward an earlier message by id.
    Forward { id: u64, receiver: String },
}

#[derive(Subcommand, Debug)]
pub enum QueryCommand {
    /// List database names.
    Dbs,
    /// List tables of a database.
    Tables { db: String },
    /// Run SQL against a database.
    Sql { db: String, sql: String },
}

#[derive(Subcommand, Debug)]
pub enum RoomCommand {
    /// Add members to a group.
    Add {
        room: String,
        #[arg(required = true, num_args = 1..)]
        wxids: Vec<String>,
    },
    /// Invite members to a group.
    Invite {
        room: String,
        #[arg(required = true, num_args = 1..)]
        wxids: Vec<String>,
    },
    /// Remove members from a group.
    Remove {
        room: String,
        #[arg(required = true, num_args = 1..)]
        wxids: Vec<String>,
    },
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Exit after receiving N messages.
    #[arg(long)]
    pub count: Option<usize>,
    /// Only print messages from groups.
    #[arg(long, conflicts_with = "direct_only")]
    pub groups_only: bool,
    /// Only print direct messages.
    #[arg(long)]
    pub direct_only: bool,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Parse `5s`, `500ms` or a bare number of seconds.
pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}
