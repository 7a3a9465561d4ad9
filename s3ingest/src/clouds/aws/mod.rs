//! Wrappers for `aws` CLI commands.
//!
//! Credentials, regions and endpoints all come from the `aws` tool's own
//! configuration.

use std::{error, fmt, process::Stdio};

use tokio::process::Command;

use crate::common::*;

pub(crate) mod glue;
pub(crate) mod s3;

/// The error code AWS uses when we try to create something which exists.
pub(crate) const ALREADY_EXISTS: &str = "AlreadyExistsException";

/// A handle for running the `aws` command-line tool.
#[derive(Clone, Debug)]
pub(crate) struct AwsCli {
    program: String,
}

impl AwsCli {
    /// Run `program` whenever we need `aws`.
    pub(crate) fn new<S: Into<String>>(program: S) -> Self {
        AwsCli {
            program: program.into(),
        }
    }

    /// Create a new `tokio::process::Command` that invokes `aws <service>`.
    fn command(&self, service: &str) -> Command {
        let mut command = Command::new(&self.program);
        command.arg(service).stdin(Stdio::null());
        command
    }

    /// Run `aws <service> <args...>` to completion and return its standard
    /// output. If the command exits with an error, the returned error will
    /// contain an [`AwsCliError`].
    #[instrument(level = "trace", skip(self, args), fields(program = %self.program))]
    pub(crate) async fn run(&self, service: &str, args: &[&str]) -> Result<Vec<u8>> {
        // Only name the operation, because arguments may contain large JSON
        // documents.
        let operation = match args.first() {
            Some(subcommand) => format!("{} {} {}", self.program, service, subcommand),
            None => format!("{} {}", self.program, service),
        };
        debug!("running `{}`", operation);
        let output = self
            .command(service)
            .args(args)
            .output()
            .await
            .with_context(|| format!("error running `{}`", operation))?;
        if output.status.success() {
            Ok(output.stdout)
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(AwsCliError::new(operation, output.status.to_string(), &stderr).into())
        }
    }
}

/// A failed `aws` command.
#[derive(Debug)]
pub(crate) struct AwsCliError {
    operation: String,
    status: String,
    code: Option<String>,
    stderr: String,
}

impl AwsCliError {
    fn new(operation: String, status: String, stderr: &str) -> Self {
        AwsCliError {
            operation,
            status,
            code: parse_error_code(stderr).map(|c| c.to_owned()),
            stderr: stderr.trim().to_owned(),
        }
    }

    /// The AWS error code reported by the command, if any.
    pub(crate) fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }
}

impl fmt::Display for AwsCliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}` failed with {}", self.operation, self.status)?;
        if !self.stderr.is_empty() {
            write!(f, ": {}", self.stderr)?;
        }
        Ok(())
    }
}

impl error::Error for AwsCliError {}

/// Does `err` come from an `aws` command that failed because its target
/// already exists?
pub(crate) fn is_already_exists(err: &Error) -> bool {
    err.chain()
        .filter_map(|cause| cause.downcast_ref::<AwsCliError>())
        .any(|cli_err| cli_err.code() == Some(ALREADY_EXISTS))
}

/// Extract `Code` from `aws` output of the form `An error occurred (Code) when
/// calling the Operation operation: message`.
fn parse_error_code(stderr: &str) -> Option<&str> {
    const PREFIX: &str = "An error occurred (";
    let start = stderr.find(PREFIX)? + PREFIX.len();
    let len = stderr[start..].find(')')?;
    let code = stderr[start..start + len].trim();
    if code.is_empty() {
        None
    } else {
        Some(code)
    }
}
