use comfy_table::{presets::UTF8_FULL, Table};
use serde::Serialize;
use wcfrpc_client::SelfProfile;

use crate::cmd::{Context, StatusArgs};
use crate::exit::{client_error, CliResult, FAILURE, SUCCESS};
use crate::output::{print_json, OutputFormat};

#[derive(Serialize)]
struct StatusOutput {
    address: String,
    event_address: String,
    logged_in: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    account: Option<SelfProfile>,
}

pub fn run(_args: StatusArgs, ctx: &Context) -> CliResult<i32> {
    let client = ctx.connect()?;
    let logged_in = client
        .is_login()
        .map_err(|err| client_error("login check failed", err))?;

    let account = if logged_in {
        let info = client
            .user_info()
            .map_err(|err| client_error("account lookup failed", err))?;
        SelfProfile::from_user_info(info)
    } else {
        None
    };

    let output = StatusOutput {
        address: ctx.config.command_address.to_string(),
        event_address: ctx.config.event_address.to_string(),
        logged_in,
        account,
    };
    print_status(&output, ctx.format);

    if let Err(err) = client.close() {
        tracing::debug!(error = %err, "close failed");
    }
    Ok(if logged_in { SUCCESS } else { FAILURE })
}

fn print_status(output: &StatusOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(output),
        OutputFormat::Table => {
            let mut table = Table::new();
            table.load_preset(UTF8_FULL).set_header(vec!["FIELD", "VALUE"]);
            table.add_row(vec!["address".to_string(), output.address.clone()]);
            table.add_row(vec!["event_address".to_string(), output.event_address.clone()]);
            table.add_row(vec!["logged_in".to_string(), output.logged_in.to_string()]);
            if let Some(account) = &output.account {
                table.add_row(vec!["wxid".to_string(), account.wxid.clone()]);
                table.add_row(vec!["name".to_string(), account.name.clone()]);
                table.add_row(vec![
                    "file_storage".to_string(),
                    account.file_storage_path.display().to_string(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("address: {}", output.address);
            println!("event_address: {}", output.event_address);
            println!("logged_in: {}", output.logged_in);
            if let Some(account) = &output.account {
                println!("wxid: {}", account.wxid);
                println!("name: {}", account.name);
                println!("file_storage: {}", account.file_storage_path.display());
            }
        }
    }
}
