//! At-risk count report.

use std::io::{self, Write};

/// Build the report line: the configured prefix immediately followed by
/// the decimal count, with no separator.
pub fn report_line(prefix: &str, count: usize) -> String {
    format!("{}{}", prefix, count)
}

/// Write the report line and a line terminator to `out`.
pub fn print_report<W: Write>(out: &mut W, prefix: &str, count: usize) -> io::Result<()> {
    writeln!(out, "{}", report_line(prefix, count))?;
    out.flush()
}
