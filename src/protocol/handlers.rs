//! Command handlers module for the RAX file share.
//!
//! Routes a parsed command to the registry, turns the outcome into a
//! `Response`, and mirrors every outcome of a recognised command to the audit
//! sink. The write command runs its two network exchanges here, between
//! `begin_write` and `commit_write`, without holding any registry lock.

use log::{info, warn};
use tokio::io::{AsyncBufRead, AsyncWrite};

use crate::auth::User;
use crate::error::handlers::log_failure;
use crate::error::{CommandError, ErrorKind, ProtocolError, status_label};
use crate::protocol::codec::{read_payload, write_message};
use crate::protocol::commands::{Command, parse_write_mode};
use crate::protocol::messages::Response;
use crate::protocol::responses::{
    CREATED, LIST_OK, MODE_CHANGED, READ_OK, WRITE_OK, WRITE_READY, format_listing,
};
use crate::server::ServerContext;
use crate::storage::Permissions;

/// Represents the outcome status of executing a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    Success,
    Failure(ErrorKind),
    /// The connection is unusable; stop serving this client.
    CloseConnection,
}

/// Struct encapsulating the full result of a command execution.
#[derive(Debug)]
pub struct CommandResult {
    pub status: CommandStatus,
    pub response: Option<Response>,
}

/// Dispatches a parsed command to its handler.
///
/// `reader`/`writer` are the client's connection; only `write` uses them,
/// for its ready message and the raw payload that follows.
pub async fn handle_command<R, W>(
    ctx: &ServerContext,
    user: &User,
    command: &Command,
    reader: &mut R,
    writer: &mut W,
) -> CommandResult
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let result = match command {
        Command::List => Ok(handle_cmd_list(ctx, user)),
        Command::Create {
            filename,
            permissions,
        } => handle_cmd_create(ctx, user, filename, permissions),
        Command::Read(filename) => handle_cmd_read(ctx, user, filename),
        Command::Write { filename, mode } => {
            handle_cmd_write(ctx, user, filename, mode, reader, writer).await
        }
        Command::Chmod {
            filename,
            permissions,
        } => handle_cmd_mode(ctx, user, filename, permissions),
        Command::Unknown(raw) => return handle_cmd_unknown(user, raw),
    };

    finish(ctx, user, command, result)
}

/// Audits the outcome of a recognised command and builds its result.
fn finish(
    ctx: &ServerContext,
    user: &User,
    command: &Command,
    result: Result<Response, CommandError>,
) -> CommandResult {
    let action = command.action();
    let file = command.filename().unwrap_or("");

    match result {
        Ok(response) => {
            ctx.audit.record(&user.name, action, file, &response.status);
            CommandResult {
                status: CommandStatus::Success,
                response: Some(response),
            }
        }
        Err(e) => {
            let kind = e.kind();
            log_failure(&user.to_string(), &e, kind);
            ctx.audit.record(&user.name, action, file, status_label(kind));

            match e {
                CommandError::Protocol(ref p) if !p.is_recoverable() => CommandResult {
                    status: CommandStatus::CloseConnection,
                    response: None,
                },
                _ => CommandResult {
                    status: CommandStatus::Failure(kind),
                    response: Some(Response::failure(kind)),
                },
            }
        }
    }
}

/// Handles `ls`: lists files visible to the user. Always succeeds.
fn handle_cmd_list(ctx: &ServerContext, user: &User) -> Response {
    let entries = ctx.registry.list(user);
    info!("{} listed {} files", user, entries.len());
    let content = format_listing(
        entries
            .iter()
            .map(|e| (e.filename.as_str(), e.permissions.as_str())),
    );
    Response::new(LIST_OK, content)
}

/// Handles `create <name> <perm>`.
fn handle_cmd_create(
    ctx: &ServerContext,
    user: &User,
    filename: &str,
    permissions: &str,
) -> Result<Response, CommandError> {
    let permissions: Permissions = permissions.parse()?;
    ctx.registry.create(user, filename, permissions)?;
    Ok(Response::status(CREATED))
}

/// Handles `read <name>`: content is truncated to the configured maximum.
fn handle_cmd_read(
    ctx: &ServerContext,
    user: &User,
    filename: &str,
) -> Result<Response, CommandError> {
    let bytes = ctx
        .registry
        .read(user, filename, ctx.config.max_content_size)?;
    Ok(Response::new(READ_OK, String::from_utf8_lossy(&bytes)))
}

/// Handles `write <name> <o|a>`.
///
/// 1. checks and enters `Modifying`
/// 2. sends the current content with a ready status
/// 3. receives the raw payload
/// 4. commits it and leaves `Modifying`
///
/// Every early return drops the transaction, which releases the guard.
async fn handle_cmd_write<R, W>(
    ctx: &ServerContext,
    user: &User,
    filename: &str,
    mode: &str,
    reader: &mut R,
    writer: &mut W,
) -> Result<Response, CommandError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let max_len = ctx.config.max_content_size;

    let transaction = ctx.registry.begin_write(user, filename)?;
    let mode = parse_write_mode(mode)?;
    let current = ctx.registry.current_content(&transaction, max_len)?;

    let ready = Response::new(WRITE_READY, String::from_utf8_lossy(&current));
    write_message(writer, &ready).await?;

    let payload = read_payload(reader, max_len).await?;
    let outcome = ctx.registry.commit_write(transaction, mode, &payload)?;

    info!(
        "{} wrote {} bytes to {} ({:?})",
        user, outcome.written, outcome.filename, mode
    );
    Ok(Response::new(WRITE_OK, outcome.summary()))
}

/// Handles `mode <name> <perm>`: owner-only permission change.
fn handle_cmd_mode(
    ctx: &ServerContext,
    user: &User,
    filename: &str,
    permissions: &str,
) -> Result<Response, CommandError> {
    let permissions: Permissions = permissions.parse()?;
    ctx.registry
        .update_permissions(user, filename, permissions)?;
    Ok(Response::status(MODE_CHANGED))
}

/// Handles unrecognised input. Never touches the registry and is not audited.
fn handle_cmd_unknown(user: &User, raw: &str) -> CommandResult {
    let err = ProtocolError::InvalidCommand(raw.to_string());
    warn!("{user}: {err}");
    CommandResult {
        status: CommandStatus::Failure(ErrorKind::InvalidCommand),
        response: Some(Response::failure(ErrorKind::InvalidCommand)),
    }
}
