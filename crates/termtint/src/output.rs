//! Plain stdout helper.

use std::io::{self, Write};

/// Write `msg` to stdout as-is (no newline) and flush.
///
/// # Errors
///
/// Returns any stdout write or flush error.
pub fn print(msg: &str) -> io::Result<()> {
    write_flushed(&mut io::stdout().lock(), msg)
}

fn write_flushed(out: &mut impl Write, msg: &str) -> io::Result<()> {
    out.write_all(msg.as_bytes())?;
    out.flush()
}
