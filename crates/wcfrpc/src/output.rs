use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use wcfrpc_client::{CallStatus, Identity, Message};
use wcfrpc_proto::{DbField, DbRow};

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// Column type codes used by the host's database rows.
const FIELD_TEXT: i32 = 3;
const FIELD_BLOB: i32 = 4;
const FIELD_NULL: i32 = 5;

pub fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

pub fn print_status(status: &CallStatus, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&StatusOutput {
            function: status.function.name(),
            code: status.code,
            success: status.is_success(),
        }),
        OutputFormat::Table => {
            let mut table = new_table(vec!["FUNCTION", "STATUS", "RESULT"]);
            table.add_row(vec![
                status.function.name().to_string(),
                status
                    .code
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "-".to_string()),
                if status.is_success() { "ok" } else { "failed" }.to_string(),
            ]);
            println!("{table}");
        }
        OutputFormat::Pretty => println!("{status}"),
    }
}

#[derive(Serialize)]
struct StatusOutput {
    function: &'static str,
    code: Option<i32>,
    success: bool,
}

pub fn print_identities(identities: &[Identity], format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&identities),
        OutputFormat::Table => {
            let mut table = new_table(vec!["WXID", "KIND", "NAME", "REMARK", "CODE"]);
            for identity in identities {
                table.add_row(vec![
                    identity.wxid.clone(),
                    identity
                        .kind()
                        .map(|k| k.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                    identity.name.clone(),
                    identity.remark.clone(),
                    identity.code.clone(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for identity in identities {
                println!("{} {}", identity.wxid, identity.display_name());
            }
        }
    }
}

pub fn print_message(message: &Message, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(message),
        OutputFormat::Table => {
            let mut table = new_table(vec!["ID", "TYPE", "FROM", "ROOM", "CONTENT"]);
            table.add_row(vec![
                message.message_id.to_string(),
                message.kind.name().to_string(),
                message.sender.clone(),
                message.room_id.clone(),
                message.content.clone(),
            ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            let from = if message.is_group {
                format!("{}/{}", message.room_id, message.sender)
            } else {
                message.sender.clone()
            };
            println!(
                "[{}] {} {}: {}",
                message.message_id, message.kind, from, message.content
            );
        }
    }
}

pub fn print_lines(lines: &[String], header: &str, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&lines),
        OutputFormat::Table => {
            let mut table = new_table(vec![header]);
            for line in lines {
                table.add_row(vec![line.clone()]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for line in lines {
                println!("{line}");
            }
        }
    }
}

pub fn print_rows(rows: &[DbRow], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let rows: Vec<serde_json::Map<String, serde_json::Value>> = rows
                .iter()
                .map(|row| {
                    row.fields
                        .iter()
                        .map(|field| (field.column.clone(), field_json(field)))
                        .collect()
                })
                .collect();
            print_json(&rows);
        }
        OutputFormat::Table => {
            let header: Vec<&str> = rows
                .first()
                .map(|row| row.fields.iter().map(|f| f.column.as_str()).collect())
                .unwrap_or_default();
            let mut table = new_table(header);
            for row in rows {
                table.add_row(row.fields.iter().map(field_preview).collect::<Vec<_>>());
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for row in rows {
                let cells: Vec<String> = row
                    .fields
                    .iter()
                    .map(|f| format!("{}={}", f.column, field_preview(f)))
                    .collect();
                println!("{}", cells.join(" "));
            }
        }
    }
}

pub fn field_preview(field: &DbField) -> String {
    match field.r#type {
        FIELD_NULL => "NULL".to_string(),
        FIELD_BLOB => format!("<blob {} bytes>", field.content.len()),
        _ => match std::str::from_utf8(&field.content) {
            Ok(text) => text.to_string(),
            Err(_) => format!("<binary {} bytes>", field.content.len()),
        },
    }
}

fn field_json(field: &DbField) -> serde_json::Value {
    match field.r#type {
        FIELD_NULL => serde_json::Value::Null,
        FIELD_TEXT => String::from_utf8_lossy(&field.content).into_owned().into(),
        _ => field_preview(field).into(),
    }
}
