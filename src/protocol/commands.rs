//! Module `commands`
//!
//! Parses the command line carried by a request into a `Command`.

use crate::error::ProtocolError;
use crate::storage::WriteMode;

/// A command line parsed from a client request.
///
/// Arguments are kept as the client sent them; permission strings and write
/// modes are validated by the handlers so that failures report the right kind.
#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    /// `ls`
    List,
    /// `create <name> <perm>`
    Create { filename: String, permissions: String },
    /// `read <name>`
    Read(String),
    /// `write <name> <o|a>`
    Write { filename: String, mode: String },
    /// `mode <name> <perm>`
    Chmod { filename: String, permissions: String },
    /// Anything else
    Unknown(String),
}

impl Command {
    /// Action name used in audit lines.
    pub fn action(&self) -> &'static str {
        match self {
            Command::List => "ls",
            Command::Create { .. } => "create",
            Command::Read(_) => "read",
            Command::Write { .. } => "write",
            Command::Chmod { .. } => "mode",
            Command::Unknown(_) => "unknown",
        }
    }

    /// File the command targets, if any.
    pub fn filename(&self) -> Option<&str> {
        match self {
            Command::Create { filename, .. }
            | Command::Write { filename, .. }
            | Command::Chmod { filename, .. }
            | Command::Read(filename) => Some(filename.as_str()),
            Command::List | Command::Unknown(_) => None,
        }
    }
}

/// Splits `<name> <rest>` where `rest` may contain spaces.
fn split_name_and_argument(args: &str) -> Option<(String, String)> {
    let mut parts = args.splitn(2, char::is_whitespace);
    let name = parts.next().unwrap_or("");
    let argument = parts.next().unwrap_or("").trim();
    if name.is_empty() || argument.is_empty() {
        None
    } else {
        Some((name.to_string(), argument.to_string()))
    }
}

/// Parses a raw command string received from a client into a `Command`.
///
/// Misused known commands (missing or extra arguments) become `Unknown`.
pub fn parse_command(raw: &str) -> Command {
    let trimmed = raw.trim();
    let mut parts = trimmed.splitn(2, char::is_whitespace);
    let cmd = parts.next().unwrap_or("");
    let args = parts.next().unwrap_or("").trim();
    let unknown = || Command::Unknown(trimmed.to_string());

    match cmd {
        "ls" if args.is_empty() => Command::List,
        "read" if !args.is_empty() && !args.contains(char::is_whitespace) => {
            Command::Read(args.to_string())
        }
        "create" => split_name_and_argument(args)
            .map(|(filename, permissions)| Command::Create {
                filename,
                permissions,
            })
            .unwrap_or_else(unknown),
        "mode" => split_name_and_argument(args)
            .map(|(filename, permissions)| Command::Chmod {
                filename,
                permissions,
            })
            .unwrap_or_else(unknown),
        "write" => split_name_and_argument(args)
            .map(|(filename, mode)| Command::Write { filename, mode })
            .unwrap_or_else(unknown),
        _ => unknown(),
    }
}

/// Parses the write mode argument: `o` overwrites, `a` appends.
pub fn parse_write_mode(mode: &str) -> Result<WriteMode, ProtocolError> {
    match mode {
        "o" => Ok(WriteMode::Overwrite),
        "a" => Ok(WriteMode::Append),
        _ => Err(ProtocolError::InvalidMode(mode.to_string())),
    }
}
