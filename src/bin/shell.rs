//! packdb interactive shell
//!
//! Thin command loop over the container operations:
//! `open <db>`, `put <file>`, `get <file>`, `find <file> <id>`, `dir`,
//! `kill <db>`, `quit`.

use std::io::{self, BufRead, Write};
use std::path::Path;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use packdb::{db, records, Config, Db};

/// packdb shell
#[derive(Parser, Debug)]
#[command(name = "packdb")]
#[command(about = "Block-structured, file-backed key/value store")]
#[command(version)]
struct Args {
    /// Directory holding the shard files
    #[arg(short, long, default_value = "./packdb_data")]
    data_dir: String,
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,packdb=debug"));

    fmt().with_env_filter(filter).with_target(true).init();

    let args = Args::parse();
    let config = Config::builder().data_dir(&args.data_dir).build();

    tracing::info!("packdb v{}", packdb::VERSION);
    tracing::info!("Data directory: {}", args.data_dir);

    let stdin = io::stdin();
    let mut current_db: Option<String> = None;

    print_prompt();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                tracing::error!("stdin read failed: {e}");
                break;
            }
        };
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.is_empty() {
            print_prompt();
            continue;
        }

        match tokens[0] {
            "open" => {
                if tokens.len() != 2 {
                    println!("Usage: open <db_name>");
                } else {
                    match Db::open(&config, tokens[1]) {
                        Ok(_) => current_db = Some(tokens[1].to_string()),
                        Err(e) => println!("open failed: {e}"),
                    }
                }
            }
            "put" => match (&current_db, tokens.len()) {
                (Some(name), 2) => {
                    if let Err(e) = run_put(&config, name, tokens[1]) {
                        println!("put failed: {e}");
                    }
                }
                _ => println!("Usage: put <local_file> (after open)"),
            },
            "get" => match (&current_db, tokens.len()) {
                (Some(name), 2) => {
                    if let Err(e) = run_get(&config, name, tokens[1]) {
                        println!("get failed: {e}");
                    }
                }
                _ => println!("Usage: get <local_file> (after open)"),
            },
            "find" => match (&current_db, tokens.len()) {
                (Some(name), 3) => match tokens[2].parse::<u32>() {
                    Ok(id) => {
                        if let Err(e) = run_find(&config, name, tokens[1], id) {
                            println!("find failed: {e}");
                        }
                    }
                    Err(_) => println!("Usage: find <local_file> <key>"),
                },
                _ => println!("Usage: find <local_file> <key> (after open)"),
            },
            "dir" => match db::dir(&config) {
                Ok(files) => {
                    for file in files {
                        println!("{file}");
                    }
                }
                Err(e) => println!("dir failed: {e}"),
            },
            "kill" => {
                if tokens.len() != 2 {
                    println!("Usage: kill <db_name>");
                } else if let Err(e) = db::kill(&config, tokens[1]) {
                    println!("kill failed: {e}");
                }
            }
            "quit" => {
                println!("Bye!");
                return;
            }
            _ => println!("Unknown command"),
        }
        print_prompt();
    }
}

fn run_put(config: &Config, db_name: &str, file: &str) -> packdb::Result<()> {
    let mut db = db::select_shard(config, db_name, Path::new(file))?;
    db.put(Path::new(file))
}

fn run_get(config: &Config, db_name: &str, file: &str) -> packdb::Result<()> {
    match db::locate_shard(config, db_name, file)? {
        Some(db) => {
            if let Some(lines) = db.get(file)? {
                let out_path = config.data_dir.join(format!("{file}.output"));
                records::write_records(&lines, &out_path)?;
                println!("Wrote {} records to {}", lines.len(), out_path.display());
            } else {
                println!("Current file does not exist.");
            }
        }
        None => println!("Current file does not exist."),
    }
    Ok(())
}

fn run_find(config: &Config, db_name: &str, file: &str, id: u32) -> packdb::Result<()> {
    match db::locate_shard(config, db_name, file)? {
        Some(db) => match db.find(file, id)? {
            Some(val) => println!("Value: {val}"),
            None => println!("Key not found: {id}"),
        },
        None => println!("Current file does not exist."),
    }
    Ok(())
}

fn print_prompt() {
    print!("> ");
    let _ = io::stdout().flush();
}
