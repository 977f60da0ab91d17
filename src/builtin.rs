use crate::command::{CommandError, CommandFactory, ExecutableCommand, ExitCode};
use crate::env::Environment;
use crate::interpreter::Factory;
use crate::models::{ClassName, Entity, store_key};
use anyhow::Result;
use argh::{EarlyExit, FromArgs};
use serde_json::Value;
use std::io::Write;

/// Commands known to the console at compile time.
///
/// Arguments are parsed using the [`argh`] crate (`FromArgs`); every command takes
/// its words as one greedy positional list and validates them itself, so that
/// missing pieces produce the console's own messages instead of usage errors.
pub(crate) trait ConsoleCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "show" or "quit".
    fn name() -> &'static str;

    /// One-line description for `help`.
    fn description() -> &'static str;

    /// Executes the command against the session environment.
    ///
    /// A [`CommandError`] is a validation failure; its message is printed verbatim.
    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode>;
}

impl<T: ConsoleCommand> ExecutableCommand for T {
    fn execute(self: Box<Self>, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        match <T as ConsoleCommand>::execute(*self, stdout, env) {
            Ok(x) => Ok(x),
            Err(e) => {
                if e.downcast_ref::<CommandError>().is_none() {
                    tracing::error!(command = T::name(), "{:#}", e);
                }
                writeln!(stdout, "{}", e)?;
                Ok(1)
            }
        }
    }
}

struct InvalidArgs {
    output: String,
    is_error: bool,
}

impl ExecutableCommand for InvalidArgs {
    fn execute(self: Box<Self>, stdout: &mut dyn Write, _env: &mut Environment) -> Result<ExitCode> {
        writeln!(stdout, "{}", self.output.trim_end())?;
        Ok(if self.is_error { 1 } else { 0 })
    }
}

impl<T: ConsoleCommand + 'static> CommandFactory for Factory<T> {
    fn name(&self) -> &'static str {
        T::name()
    }

    fn description(&self) -> &'static str {
        T::description()
    }

    fn try_create(&self, name: &str, args: &[&str]) -> Option<Box<dyn ExecutableCommand>> {
        if name == T::name() {
            // Every word is positional; `help` or `-x` must reach the command's own checks.
            let mut argv = Vec::with_capacity(args.len() + 1);
            argv.push("--");
            argv.extend_from_slice(args);
            Some(match T::from_args(&[name], &argv) {
                Ok(cmd) => Box::new(cmd),
                Err(EarlyExit { output, status }) => Box::new(InvalidArgs {
                    output,
                    is_error: status.is_err(),
                }),
            })
        } else {
            None
        }
    }
}

/// First word as a known class name.
fn parse_class(args: &[String]) -> Result<ClassName, CommandError> {
    let name = args.first().ok_or(CommandError::ClassNameMissing)?;
    name.parse().map_err(|_| CommandError::ClassDoesntExist)
}

/// Optional class filter used by `all` and `count`.
fn class_filter(args: &[String]) -> Result<Option<ClassName>, CommandError> {
    if args.is_empty() {
        Ok(None)
    } else {
        parse_class(args).map(Some)
    }
}

/// Store key of an existing instance named by the first two words.
fn resolve_key(args: &[String], env: &Environment) -> Result<String, CommandError> {
    let class = parse_class(args)?;
    let id = args.get(1).ok_or(CommandError::InstanceIdMissing)?;
    let key = store_key(class, id);
    if env.storage.get(&key).is_none() {
        return Err(CommandError::NoInstanceFound);
    }
    Ok(key)
}

#[derive(FromArgs)]
/// Create a new instance of a class, save it and print its id.
pub struct Create {
    #[argh(positional, greedy)]
    /// class name of the new instance.
    pub args: Vec<String>,
}

impl ConsoleCommand for Create {
    fn name() -> &'static str {
        "create"
    }

    fn description() -> &'static str {
        "Creates a new instance: create <class>"
    }

    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        let class = parse_class(&self.args)?;
        // The whole argument must name a class.
        if self.args.len() > 1 {
            return Err(CommandError::ClassDoesntExist.into());
        }
        let entity = Entity::new(class);
        let id = entity.id().to_string();
        let key = entity.key();
        env.storage.insert(entity);
        if let Err(e) = env.storage.save() {
            env.storage.all_mut().remove(&key);
            return Err(e);
        }
        writeln!(stdout, "{}", id)?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Print the string representation of an instance.
pub struct Show {
    #[argh(positional, greedy)]
    /// class name and instance id.
    pub args: Vec<String>,
}

impl ConsoleCommand for Show {
    fn name() -> &'static str {
        "show"
    }

    fn description() -> &'static str {
        "Prints the string representation of an instance: show <class> <id>"
    }

    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        let key = resolve_key(&self.args, env)?;
        if let Some(entity) = env.storage.get(&key) {
            writeln!(stdout, "{}", entity)?;
        }
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Delete an instance and save the change.
pub struct Destroy {
    #[argh(positional, greedy)]
    /// class name and instance id.
    pub args: Vec<String>,
}

impl ConsoleCommand for Destroy {
    fn name() -> &'static str {
        "destroy"
    }

    fn description() -> &'static str {
        "Deletes an instance: destroy <class> <id>"
    }

    fn execute(self, _stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        let key = resolve_key(&self.args, env)?;
        env.storage.all_mut().remove(&key);
        env.storage.save()?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Print every instance, or every instance of one class.
pub struct All {
    #[argh(positional, greedy)]
    /// optional class name to filter on.
    pub args: Vec<String>,
}

impl ConsoleCommand for All {
    fn name() -> &'static str {
        "all"
    }

    fn description() -> &'static str {
        "Prints all instances, optionally of one class: all [<class>]"
    }

    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        let class = class_filter(&self.args)?;
        let items: Vec<String> = env
            .storage
            .values_of(class)
            .map(|entity| entity.to_string())
            .collect();
        writeln!(stdout, "[{}]", items.join(", "))?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Set one attribute of an instance to a string value and save it.
pub struct Update {
    #[argh(positional, greedy)]
    /// class name, instance id, attribute name and value.
    pub args: Vec<String>,
}

impl ConsoleCommand for Update {
    fn name() -> &'static str {
        "update"
    }

    fn description() -> &'static str {
        "Updates an attribute of an instance: update <class> <id> <attribute> <value>"
    }

    fn execute(self, _stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        let key = resolve_key(&self.args, env)?;
        let attribute = self.args.get(2).ok_or(CommandError::AttributeNameMissing)?;
        let value = self.args.get(3).ok_or(CommandError::ValueMissing)?;

        let entity = env
            .storage
            .get_mut(&key)
            .ok_or(CommandError::NoInstanceFound)?;
        if !entity.set_attribute(attribute.as_str(), Value::String(value.clone())) {
            tracing::debug!(%key, %attribute, "ignoring update of a reserved attribute");
        }
        entity.touch();
        env.storage.save()?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Print the number of instances, or of instances of one class.
pub struct Count {
    #[argh(positional, greedy)]
    /// optional class name to filter on.
    pub args: Vec<String>,
}

impl ConsoleCommand for Count {
    fn name() -> &'static str {
        "count"
    }

    fn description() -> &'static str {
        "Prints the number of instances, optionally of one class: count [<class>]"
    }

    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        let class = class_filter(&self.args)?;
        writeln!(stdout, "{}", env.storage.count(class))?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Quit the console session.
pub struct Quit {
    #[argh(positional, greedy)]
    /// ignored.
    pub _args: Vec<String>,
}

impl ConsoleCommand for Quit {
    fn name() -> &'static str {
        "quit"
    }

    fn description() -> &'static str {
        "Quits the console session"
    }

    fn execute(self, _stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        env.should_exit = true;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// End of input: print a newline and quit the console session.
pub struct Eof {
    #[argh(positional, greedy)]
    /// ignored.
    pub _args: Vec<String>,
}

impl ConsoleCommand for Eof {
    fn name() -> &'static str {
        "EOF"
    }

    fn description() -> &'static str {
        "Quits the console session on end of input"
    }

    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        writeln!(stdout)?;
        env.should_exit = true;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// List the available commands or describe one of them.
pub struct Help {
    #[argh(positional, greedy)]
    /// optional command name.
    pub args: Vec<String>,
}

impl ConsoleCommand for Help {
    fn name() -> &'static str {
        "help"
    }

    fn description() -> &'static str {
        "Lists the commands, or describes one: help [<command>]"
    }

    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        if let Some(topic) = self.args.first() {
            let description = env
                .help_for(topic)
                .ok_or_else(|| CommandError::NoHelp(topic.clone()))?;
            writeln!(stdout, "{}", description)?;
            return Ok(0);
        }

        let mut names: Vec<&str> = env.help_topics.iter().map(|(name, _)| *name).collect();
        names.sort_unstable();

        let header = "Documented commands (type help <topic>):";
        writeln!(stdout)?;
        writeln!(stdout, "{}", header)?;
        writeln!(stdout, "{}", "=".repeat(header.len()))?;
        writeln!(stdout, "{}", names.join("  "))?;
        writeln!(stdout)?;
        Ok(0)
    }
}
