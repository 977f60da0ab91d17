use crate::env::Environment;
use anyhow::Result;
use std::io::Write;

/// Conventional exit code of a console command.
///
/// 0 means the command did what was asked; any non-zero value means it refused,
/// after printing the reason.
pub type ExitCode = i32;

/// Object-safe trait for any command the console can execute.
///
/// This is implemented by the built-ins via a blanket impl.
pub trait ExecutableCommand {
    /// Executes the command, writing user-facing output to `stdout`.
    fn execute(self: Box<Self>, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode>;
}

/// Factory that tries to create a command from a name and its arguments.
///
/// Returns `None` when the factory doesn't recognize the `name`.
pub trait CommandFactory {
    /// Name the command is invoked by.
    fn name(&self) -> &'static str;

    /// One-line description shown by `help <name>`.
    fn description(&self) -> &'static str;

    /// Attempt to create a command instance for the provided name and arguments.
    fn try_create(&self, name: &str, args: &[&str]) -> Option<Box<dyn ExecutableCommand>>;
}

/// Validation failures of console commands.
///
/// The `Display` output is exactly what the user sees.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("** class name missing **")]
    ClassNameMissing,
    #[error("** class doesn't exist **")]
    ClassDoesntExist,
    #[error("** instance id missing **")]
    InstanceIdMissing,
    #[error("** no instance found **")]
    NoInstanceFound,
    #[error("** attribute name missing **")]
    AttributeNameMissing,
    #[error("** value missing **")]
    ValueMissing,
    #[error("*** Unknown syntax: {0}")]
    UnknownSyntax(String),
    #[error("*** No help on {0}")]
    NoHelp(String),
}
