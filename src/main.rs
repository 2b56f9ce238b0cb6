use anyhow::{Context, Result};
use std::env;
use std::io::{self, BufRead, Write};

use library_catalog::{
    telemetry, AppConfig, Command, CommandHandler, Database, Flow, VERSION,
};

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    telemetry::init_tracing(&config.logging.level);

    let db = Database::from_config(&config.database)
        .with_context(|| format!("Failed to open database {}", config.database.path))?;

    let args: Vec<String> = env::args().skip(1).collect();

    let result = if args.is_empty() {
        // Interactive mode (default)
        run_shell(&db)
    } else {
        // One-shot mode: `library-catalog importBooks books.tsv`
        run_once(&db, &args.join(" "))
    };

    db.shutdown();
    result
}

fn run_once(db: &Database, line: &str) -> Result<()> {
    let handler = CommandHandler::new(db);
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match Command::parse(line)? {
        Some(command) => {
            handler.execute(command, &mut out)?;
        }
        None => writeln!(out, "Nothing to do. Type 'help' for the command list.")?,
    }
    Ok(())
}

fn run_shell(db: &Database) -> Result<()> {
    let handler = CommandHandler::new(db);
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    writeln!(out, "📚 Library Catalog v{}", VERSION)?;
    writeln!(out, "Type 'help' to see all available commands.")?;

    let mut lines = stdin.lock().lines();
    loop {
        write!(out, "> ")?;
        out.flush()?;

        // EOF ends the session like `quit`
        let Some(line) = lines.next() else {
            writeln!(out)?;
            break;
        };
        let line = line.context("Failed to read from stdin")?;

        match Command::parse(&line) {
            Ok(Some(command)) => {
                if handler.execute(command, &mut out)? == Flow::Quit {
                    break;
                }
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!("{}", e);
                writeln!(out, "{}", e)?;
                writeln!(out, "Type 'help' to see all available commands.")?;
            }
        }
    }

    Ok(())
}
