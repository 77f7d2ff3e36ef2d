//! Timestamp parsing for the `DD/MM/YYYY HH:MM:SS` format the server emits
//! in audit columns.

use chrono::NaiveDateTime;

/// strftime pattern for server timestamps.
pub const DATETIME_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// Parses a server timestamp. The server reports wall-clock time in its own
/// locale with no zone marker, so the result is naive.
pub fn parse_datetime(text: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(text, DATETIME_FORMAT)
}
