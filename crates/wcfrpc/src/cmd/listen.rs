use std::time::Duration;

use wcfrpc_client::{CancelToken, ClientError, Session};

use crate::cmd::{Context, ListenArgs};
use crate::exit::{client_error, CliError, CliResult, FAILURE, INTERNAL, SUCCESS};
use crate::output::print_message;

// How often to check that the listener is still alive.
const POLL_INTERVAL: Duration = Duration::from_secs(1);

pub fn run(args: ListenArgs, ctx: &Context) -> CliResult<i32> {
    let session = Session::connect(ctx.config.clone()).map_err(|err| {
        client_error(
            &format!("connect to {} failed", ctx.config.command_address),
            err,
        )
    })?;

    let token = CancelToken::new();
    install_ctrlc_handler(token.clone())?;

    let status = session
        .start_receiving()
        .map_err(|err| client_error("enable receiving failed", err))?;
    if !status.is_success() {
        eprintln!("error: host refused to publish messages ({status})");
        return Ok(FAILURE);
    }
    tracing::info!(address = %ctx.config.event_address, "listening");

    let failures = session.failures();
    let mut printed = 0usize;
    let outcome = loop {
        for failure in failures.try_iter() {
            tracing::warn!(message_id = ?failure.message_id, error = %failure.error, "message dropped");
        }

        let message = match session.next_message(&token.with_timeout(POLL_INTERVAL)) {
            Ok(message) => message,
            Err(ClientError::Cancelled) => break Ok(SUCCESS),
            Err(ClientError::DeadlineExceeded) if session.is_receiving() => continue,
            Err(ClientError::DeadlineExceeded) => {
                break match session.stop_receiving() {
                    Ok(()) => Err(CliError::new(FAILURE, "event stream ended")),
                    Err(err) => Err(client_error("event stream failed", err)),
                };
            }
            Err(err) => break Err(client_error("receive failed", err)),
        };

        if (args.groups_only && !message.is_group) || (args.direct_only && message.is_group) {
            continue;
        }

        print_message(&message, ctx.format);
        printed = printed.saturating_add(1);

        if args.count.is_some_and(|count| printed >= count) {
            break Ok(SUCCESS);
        }
    };

    if let Err(err) = session.close() {
        tracing::debug!(error = %err, "session close failed");
    }
    outcome
}

fn install_ctrlc_handler(token: CancelToken) -> CliResult<()> {
    ctrlc::set_handler(move || token.cancel())
        .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
