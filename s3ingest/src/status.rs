//! Human-readable status lines, printed on stdout.

use std::fmt;

/// The kind of status line to print.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Status {
    Success,
    Failure,
    Info,
}

impl Status {
    /// The marker printed at the start of the line.
    pub(crate) fn marker(self) -> &'static str {
        match self {
            Status::Success => "✅",
            Status::Failure => "❌",
            Status::Info => "ℹ️",
        }
    }

    /// Print `message` on stdout, preceded by our marker.
    pub(crate) fn print(self, message: impl fmt::Display) {
        println!("{}", self.line(message));
    }

    fn line(self, message: impl fmt::Display) -> String {
        format!("{} {}", self.marker(), message)
    }
}

#[test]
fn status_lines_start_with_marker() {
    assert_eq!(Status::Success.line("done"), "✅ done");
    assert_eq!(Status::Failure.line(format_args!("{} failed", "x")), "❌ x failed");
    assert_eq!(Status::Info.line("exists"), "ℹ️ exists");
}
