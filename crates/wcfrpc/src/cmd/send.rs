use wcfrpc_client::{CallStatus, RpcClient};
use wcfrpc_proto::RichText;

use crate::cmd::{Context, SendCommand};
use crate::exit::{client_error, status_code, CliResult};
use crate::output::print_status;

pub fn run(command: SendCommand, ctx: &Context) -> CliResult<i32> {
    let client = ctx.connect()?;
    let status = send(&client, command).map_err(|err| client_error("send failed", err))?;
    print_status(&status, ctx.format);

    if let Err(err) = client.close() {
        tracing::debug!(error = %err, "close failed");
    }
    Ok(status_code(&status))
}

fn send(client: &RpcClient, command: SendCommand) -> wcfrpc_client::Result<CallStatus> {
    match command {
        SendCommand::Text { receiver, text, at } => client.send_text(&receiver, &text, &at),
        SendCommand::Image { receiver, path } => client.send_image(&path, &receiver),
        SendCommand::File { receiver, path } => client.send_file(&path, &receiver),
        SendCommand::Xml {
            receiver,
            content,
            path,
            xml_type,
        } => client.send_xml(&receiver, &content, &path, xml_type),
        SendCommand::Link {
            receiver,
            title,
            url,
            digest,
            thumb_url,
            name,
            account,
        } => client.send_rich_text(&RichText {
            name,
            account,
            title,
            digest,
            url,
            thumburl: thumb_url,
            receiver,
        }),
        SendCommand::Pat { room, wxid } => client.send_pat(&room, &wxid),
        SendCommand::Forward { id, receiver } => client.forward_message(id, &receiver),
    }
}
