use crate::cmd::{Context, QueryCommand};
use crate::exit::{client_error, CliResult, SUCCESS};
use crate::output::{print_lines, print_rows};

pub fn run(command: QueryCommand, ctx: &Context) -> CliResult<i32> {
    let client = ctx.connect()?;

    match command {
        QueryCommand::Dbs => {
            let names = client
                .db_names()
                .map_err(|err| client_error("listing databases failed", err))?;
            print_lines(&names, "DATABASE", ctx.format);
        }
        QueryCommand::Tables { db } => {
            let tables = client
                .db_tables(&db)
                .map_err(|err| client_error(&format!("listing tables of {db} failed"), err))?;
            let names: Vec<String> = tables.into_iter().map(|table| table.name).collect();
            print_lines(&names, "TABLE", ctx.format);
        }
        QueryCommand::Sql { db, sql } => {
            let rows = client
                .exec_db_query(&db, &sql)
                .map_err(|err| client_error(&format!("query on {db} failed"), err))?;
            tracing::debug!(rows = rows.len(), "query returned");
            print_rows(&rows, ctx.format);
        }
    }

    if let Err(err) = client.close() {
        tracing::debug!(error = %err, "close failed");
    }
    Ok(SUCCESS)
}
