use crate::command::{CommandError, CommandFactory, ExecutableCommand, ExitCode};
use crate::env::Environment;
use crate::lexer;
use crate::parser;
use crate::storage::FileStorage;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::{BufRead, Write};

/// Factory allows creating instances of ExecutableCommand.
///
/// Only supports commands defined in this crate.
pub(crate) struct Factory<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

/// Line-oriented console over an object store.
///
/// The interpreter owns an [`Environment`] (the store plus session flags) and a
/// list of [`CommandFactory`] objects that are queried to create commands by name.
/// See [`Interpreter::with_storage`] for the built-in command set.
///
/// Example
/// ```
/// use hbnb_console::{FileStorage, Interpreter};
/// let mut console = Interpreter::with_storage(FileStorage::new("/tmp/hbnb_doc.json"));
/// let mut out = Vec::new();
/// let code = console.execute_line("count User", &mut out).unwrap();
/// assert_eq!(code, 0);
/// ```
pub struct Interpreter {
    env: Environment,
    commands: Vec<Box<dyn CommandFactory>>,
}

impl Interpreter {
    /// Create a new interpreter with a custom set of command factories.
    pub fn new(commands: Vec<Box<dyn CommandFactory>>, storage: FileStorage) -> Self {
        let mut env = Environment::new(storage);
        env.help_topics = commands
            .iter()
            .map(|factory| (factory.name(), factory.description()))
            .collect();
        Self { env, commands }
    }

    /// Create an interpreter with the default set of commands:
    /// `create`, `show`, `destroy`, `all`, `update`, `count`, `quit`, `EOF`, `help`.
    pub fn with_storage(storage: FileStorage) -> Self {
        use crate::builtin::*;
        Self::new(
            vec![
                Box::new(Factory::<Create>::default()),
                Box::new(Factory::<Show>::default()),
                Box::new(Factory::<Destroy>::default()),
                Box::new(Factory::<All>::default()),
                Box::new(Factory::<Update>::default()),
                Box::new(Factory::<Count>::default()),
                Box::new(Factory::<Quit>::default()),
                Box::new(Factory::<Eof>::default()),
                Box::new(Factory::<Help>::default()),
            ],
            storage,
        )
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn storage(&self) -> &FileStorage {
        &self.env.storage
    }

    /// True once `quit` or `EOF` has run.
    pub fn is_finished(&self) -> bool {
        self.env.should_exit
    }

    fn create(&self, name: &str, args: &[&str]) -> Option<Box<dyn ExecutableCommand>> {
        self.commands
            .iter()
            .find_map(|factory| factory.try_create(name, args))
    }

    /// Run a single command invocation by name with arguments.
    ///
    /// Returns the command's exit code, or an error if no command has that name.
    pub fn run(&mut self, name: &str, args: &[&str], stdout: &mut dyn Write) -> anyhow::Result<ExitCode> {
        match self.create(name, args) {
            Some(cmd) => cmd.execute(stdout, &mut self.env),
            None => Err(anyhow::anyhow!("command not found: {}", name)),
        }
    }

    /// Interpret one console line.
    ///
    /// Method-call syntax is rewritten first, then the line is split into words and
    /// dispatched on the first one. Blank lines do nothing; lines that can't be
    /// split or that name no command print `*** Unknown syntax: <line>`, showing the
    /// line after rewriting.
    pub fn execute_line(&mut self, line: &str, stdout: &mut dyn Write) -> anyhow::Result<ExitCode> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(0);
        }

        let rewritten = parser::rewrite_dot_syntax(line);
        tracing::trace!(%line, %rewritten, "dispatching");

        let words = match lexer::split_words(&rewritten) {
            Ok(words) => words,
            Err(e) => {
                tracing::debug!(?e, %line, "can't split line");
                return self.unknown_syntax(rewritten.trim(), stdout);
            }
        };
        let Some((name, args)) = words.split_first() else {
            return Ok(0);
        };
        let args: Vec<&str> = args.iter().map(String::as_str).collect();

        match self.create(name, &args) {
            Some(cmd) => cmd.execute(stdout, &mut self.env),
            None => self.unknown_syntax(rewritten.trim(), stdout),
        }
    }

    fn unknown_syntax(&self, line: &str, stdout: &mut dyn Write) -> anyhow::Result<ExitCode> {
        writeln!(stdout, "{}", CommandError::UnknownSyntax(line.to_string()))?;
        Ok(1)
    }

    /// Interpret lines from a non-interactive source until `quit`.
    ///
    /// Running out of input behaves like the `EOF` command.
    pub fn run_script(&mut self, input: impl BufRead, stdout: &mut dyn Write) -> anyhow::Result<()> {
        for line in input.lines() {
            self.execute_line(&line?, stdout)?;
            if self.is_finished() {
                return Ok(());
            }
        }
        self.run("EOF", &[], stdout)?;
        Ok(())
    }

    /// Interactive Read-Eval-Print Loop with line editing and history.
    pub fn repl(&mut self, prompt: &str) -> anyhow::Result<()> {
        let mut rl = DefaultEditor::new()?;
        let mut stdout = std::io::stdout();

        while !self.is_finished() {
            match rl.readline(prompt) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        rl.add_history_entry(line.as_str())?;
                    }
                    self.execute_line(&line, &mut stdout)?;
                }
                Err(ReadlineError::Interrupted) => {
                    // ^C drops the current line only.
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    self.run("EOF", &[], &mut stdout)?;
                }
                Err(err) => return Err(err.into()),
            }
            stdout.flush()?;
        }

        Ok(())
    }
}
