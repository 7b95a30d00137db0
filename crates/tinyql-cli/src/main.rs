mod display;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::PathBuf;
use tinyql_core::Config;
use tinyql_query::{parse_command, Command, Engine};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tinyql")]
#[command(about = "SQL queries over a directory of CSV files")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one SELECT and print the result
    Query {
        #[arg(short, long, default_value = "./data")]
        data_dir: PathBuf,

        #[arg(short, long, default_value_t = 1024)]
        batch_size: usize,

        sql: String,
    },

    /// Print the logical and physical plan of a SELECT
    Explain {
        #[arg(short, long, default_value = "./data")]
        data_dir: PathBuf,

        sql: String,
    },

    /// List tables and their columns
    Tables {
        #[arg(short, long, default_value = "./data")]
        data_dir: PathBuf,
    },

    /// Interactive shell
    Repl {
        #[arg(short, long, default_value = "./data")]
        data_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Query {
            data_dir,
            batch_size,
            sql,
        } => {
            let engine = open_engine(Config::new(data_dir).with_batch_size(batch_size))?;
            run_statement(&engine, &sql)
        }
        Commands::Explain { data_dir, sql } => {
            let engine = open_engine(Config::new(data_dir))?;
            print!("{}", engine.explain(&sql)?);
            Ok(())
        }
        Commands::Tables { data_dir } => {
            let engine = open_engine(Config::new(data_dir))?;
            print_tables(&engine)
        }
        Commands::Repl { data_dir } => run_repl(data_dir),
    }
}

fn open_engine(config: Config) -> Result<Engine> {
    let data_dir = config.data_dir.clone();
    let engine = Engine::open_csv(config)
        .with_context(|| format!("Failed to open data directory {:?}", data_dir))?;
    debug!(tables = engine.catalog().table_count(), "engine ready");
    Ok(engine)
}

fn run_statement(engine: &Engine, sql: &str) -> Result<()> {
    match parse_command(sql)? {
        Command::Select(stmt) => {
            let bound = engine.bind(&stmt)?;
            let plan = engine.compile(bound)?;
            let schema = plan.schema();
            let batches = engine.execute(plan).collect_batches()?;
            print!("{}", display::format_batches(&schema, &batches)?);
        }
        Command::Explain(_) => {
            print!("{}", engine.explain(sql)?);
        }
    }
    Ok(())
}

fn print_tables(engine: &Engine) -> Result<()> {
    let catalog = engine.catalog();
    for name in catalog.list_tables() {
        let table = catalog.table_by_name(name)?;
        let columns: Vec<String> = table
            .columns()
            .map(|(_, c)| format!("{} {}", c.name, c.data_type))
            .collect();
        println!("{} ({})", name, columns.join(", "));
    }
    Ok(())
}

fn run_repl(data_dir: PathBuf) -> Result<()> {
    let engine = open_engine(Config::new(data_dir))?;
    println!("{} table(s) loaded", engine.catalog().table_count());

    let mut rl = DefaultEditor::new()?;

    println!("TinyQL REPL");
    println!("Enter a SELECT or EXPLAIN statement. \\d lists tables, \\q quits.");
    println!();

    loop {
        let readline = rl.readline("tinyql> ");

        match readline {
            Ok(line) => {
                let line = line.trim();

                if line.is_empty() {
                    continue;
                }

                rl.add_history_entry(line)?;

                match line {
                    "\\q" | "quit" | "exit" => break,
                    "\\d" => {
                        if let Err(e) = print_tables(&engine) {
                            eprintln!("Error: {}", e);
                        }
                        continue;
                    }
                    _ => {}
                }

                if let Err(e) = run_statement(&engine, line.trim_end_matches(';')) {
                    eprintln!("Error: {}", e);
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("Interrupted");
                break;
            }
            Err(ReadlineError::Eof) => {
                break;
            }
            Err(err) => {
                eprintln!("Error: {}", err);
                break;
            }
        }
    }

    println!("Goodbye");
    Ok(())
}
