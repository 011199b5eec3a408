use std::sync::Arc;

use serde::Serialize;
use wcfrpc_client::{ContactSource, Directory, Identity, IdentityKind};

use crate::cmd::{ContactsArgs, Context};
use crate::exit::{client_error, CliResult, FAILURE, SUCCESS};
use crate::output::{print_identities, print_json, OutputFormat};

#[derive(Serialize)]
struct CheckOutput<'a> {
    id: &'a str,
    kind: IdentityKind,
    known: bool,
}

pub fn run(args: ContactsArgs, ctx: &Context) -> CliResult<i32> {
    let client = Arc::new(ctx.connect()?);
    let source: Arc<dyn ContactSource> = client.clone();
    let directory = Directory::new(source);

    if let (Some(id), Some(kind)) = (&args.check, args.kind) {
        let kind = IdentityKind::from(kind);
        let known = directory
            .require(id, kind)
            .map_err(|err| client_error("lookup failed", err))?;
        match ctx.format {
            OutputFormat::Json => print_json(&CheckOutput { id, kind, known }),
            _ => println!("{id} {} a known {kind}", if known { "is" } else { "is not" }),
        }
        return Ok(if known { SUCCESS } else { FAILURE });
    }

    directory
        .refresh()
        .map_err(|err| client_error("contact list failed", err))?;

    let identities: Vec<Identity> = match args.kind {
        Some(kind) => directory.list(kind.into()),
        None => [IdentityKind::Peer, IdentityKind::Group, IdentityKind::Channel]
            .into_iter()
            .flat_map(|kind| directory.list(kind))
            .collect(),
    };
    print_identities(&identities, ctx.format);

    if let Err(err) = client.close() {
        tracing::debug!(error = %err, "close failed");
    }
    Ok(SUCCESS)
}
