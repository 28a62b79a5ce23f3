//! Response status labels
//!
//! Success labels sent back to clients. Failure labels come from
//! `error::status_label`.

pub const LIST_OK: &str = "list ok";
pub const CREATED: &str = "created";
pub const READ_OK: &str = "read ok";
pub const WRITE_READY: &str = "ready for writing";
pub const WRITE_OK: &str = "write ok";
pub const MODE_CHANGED: &str = "permissions changed";
pub const TOO_MANY_CONNECTIONS: &str = "Too many connections";

/// Separates entries of a listing
pub const LIST_ENTRY_SEPARATOR: char = '|';
/// Separates a filename from its permissions within a listing entry
pub const LIST_FIELD_SEPARATOR: char = ',';

/// Format listing pairs as `name,perm|name,perm|`
pub fn format_listing<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    entries
        .into_iter()
        .map(|(name, perms)| format!("{name}{LIST_FIELD_SEPARATOR}{perms}{LIST_ENTRY_SEPARATOR}"))
        .collect()
}

/// Parse a listing produced by `format_listing`
pub fn parse_listing(content: &str) -> Vec<(String, String)> {
    content
        .split(LIST_ENTRY_SEPARATOR)
        .filter_map(|entry| entry.split_once(LIST_FIELD_SEPARATOR))
        .map(|(name, perms)| (name.to_string(), perms.to_string()))
        .collect()
}
