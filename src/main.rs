use anyhow::Result;
use argh::FromArgs;
use hbnb_console::config::Config;
use hbnb_console::{FileStorage, Interpreter};
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(FromArgs)]
/// Command interpreter for users, places, reviews and other listing objects.
struct Args {
    #[argh(option, short = 'f')]
    /// json file holding the objects (default: $HBNB_FILE_PATH or file.json).
    file: Option<PathBuf>,

    #[argh(switch, short = 'q')]
    /// do not print a prompt, even on a terminal.
    quiet: bool,

    #[argh(positional, greedy)]
    /// run this single command and exit, e.g. `-- show User 1234`.
    command: Vec<String>,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args: Args = argh::from_env();
    let config = Config::from_env().with_file_path(args.file);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&config.log_filter).unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let storage = FileStorage::open(&config.file_path)?;
    tracing::info!(
        path = %config.file_path.display(),
        objects = storage.all().len(),
        "store opened"
    );
    let mut console = Interpreter::with_storage(storage);

    if !args.command.is_empty() {
        let code = console.execute_line(&args.command.join(" "), &mut io::stdout())?;
        if code != 0 {
            std::process::exit(code);
        }
        return Ok(());
    }

    if io::stdin().is_terminal() && !args.quiet {
        console.repl(&config.prompt)
    } else {
        console.run_script(io::stdin().lock(), &mut io::stdout())
    }
}
