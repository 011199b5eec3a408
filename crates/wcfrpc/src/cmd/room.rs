use crate::cmd::{Context, RoomCommand};
use crate::exit::{client_error, status_code, CliResult};
use crate::output::print_status;

pub fn run(command: RoomCommand, ctx: &Context) -> CliResult<i32> {
    let client = ctx.connect()?;

    let result = match &command {
        RoomCommand::Add { room, wxids } => client.add_room_members(room, wxids),
        RoomCommand::Invite { room, wxids } => client.invite_room_members(room, wxids),
        RoomCommand::Remove { room, wxids } => client.remove_room_members(room, wxids),
    };
    let status = result.map_err(|err| client_error("room update failed", err))?;
    print_status(&status, ctx.format);

    if let Err(err) = client.close() {
        tracing::debug!(error = %err, "close failed");
    }
    Ok(status_code(&status))
}
