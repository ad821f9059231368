//! Interactive driver for the folioquery workbench.
//!
//! Reads commands and free-form SQL from stdin. Commands start with a
//! backslash; anything else is executed as SQL over the loaded tables.

use anyhow::Result;
use folioquery::errors::WorkbenchError;
use folioquery::executor::QueryOutput;
use folioquery::{catalog, Workbench, WorkbenchConfig};
use std::io::{self, BufRead, Write};

const HELP: &str = "\
Commands:
  \\login <email> <password>      authenticate against the portfolio API
  \\logout                        drop the session token
  \\fetch users [page size sort]  load a page of users (default 0 10 id)
  \\fetch portfolios <user_id>    load one user's portfolios
  \\fetch assets <portfolio_id>   load one portfolio's assets
  \\fetch transactions <asset_id> load one asset's transactions
  \\tables                        list loaded tables and their columns
  \\catalog                       list canned queries
  \\run <canned query name>       run a canned query
  \\count                         total user count
  \\health                        API health check
  \\help                          this text
  \\quit                          exit
Anything else is executed as SQL over the loaded tables.";

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = config_path_from_args();
    let config = WorkbenchConfig::load_or_default(&config_path)?;
    folioquery::logging::init_logging(&config.logging)?;

    let mut bench = Workbench::new(&config)?;

    println!("folioquery - SQL over the portfolio API ({})", config.api.base_url);
    println!("{HELP}");

    let stdin = io::stdin();
    loop {
        print!("sql> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(command) = line.strip_prefix('\\') {
            if matches!(command, "quit" | "q" | "exit") {
                break;
            }
            if let Err(e) = run_command(&mut bench, command).await {
                report(&e);
            }
        } else {
            match bench.query(line).await {
                Ok(output) => print_output(&output),
                Err(e) => report(&e),
            }
        }
    }

    Ok(())
}

fn config_path_from_args() -> String {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" || arg == "-c" {
            if let Some(path) = args.next() {
                return path;
            }
        }
    }
    "folioquery.toml".to_string()
}

async fn run_command(bench: &mut Workbench, command: &str) -> std::result::Result<(), WorkbenchError> {
    let parts: Vec<&str> = command.split_whitespace().collect();
    match parts.as_slice() {
        ["help"] => println!("{HELP}"),
        ["login", email, password] => {
            bench.login(email, password).await?;
            println!("Logged in successfully");
        }
        ["logout"] => {
            bench.logout();
            println!("Logged out");
        }
        ["fetch", "users", rest @ ..] => {
            let page = rest.first().and_then(|s| s.parse().ok()).unwrap_or(0);
            let size = rest.get(1).and_then(|s| s.parse().ok()).unwrap_or(10);
            let sort_by = rest.get(2).copied().unwrap_or("id");
            let count = bench.load_users(page, size, sort_by).await?;
            println!("Loaded {count} row(s) into 'users'");
        }
        ["fetch", "portfolios", id] => {
            let count = bench.load_portfolios(parse_id(id)?).await?;
            println!("Loaded {count} row(s) into 'portfolios'");
        }
        ["fetch", "assets", id] => {
            let count = bench.load_assets(parse_id(id)?).await?;
            println!("Loaded {count} row(s) into 'assets'");
        }
        ["fetch", "transactions", id] => {
            let count = bench.load_transactions(parse_id(id)?).await?;
            println!("Loaded {count} row(s) into 'transactions'");
        }
        ["tables"] => {
            if bench.registry().is_empty() {
                println!("No tables loaded yet");
            }
            for name in bench.registry().names() {
                if let Some(table) = bench.registry().get(name) {
                    println!("{} ({} rows): {}", name, table.len(), table.columns().join(", "));
                }
            }
        }
        ["catalog"] => {
            for entry in catalog::entries() {
                println!(
                    "{} [{}] - {}",
                    entry.name,
                    entry.required_tables.join(", "),
                    entry.description
                );
            }
        }
        ["run", rest @ ..] if !rest.is_empty() => {
            let output = bench.run_canned(&rest.join(" ")).await?;
            print_output(&output);
        }
        ["count"] => println!("User count: {}", bench.user_count().await?),
        ["health"] => println!("{}", bench.health().await?),
        _ => println!("Unknown command: \\{command} (try \\help)"),
    }
    Ok(())
}

fn parse_id(raw: &str) -> std::result::Result<u64, WorkbenchError> {
    raw.parse()
        .map_err(|_| WorkbenchError::config(format!("'{raw}' is not a numeric id")))
}

fn report(error: &WorkbenchError) {
    eprintln!("Error: {error}");
    if let WorkbenchError::UnknownColumn { available, .. } = error {
        for (table, columns) in available {
            eprintln!("  {} columns: {}", table, columns.join(", "));
        }
    }
}

fn print_output(output: &QueryOutput) {
    if output.columns.is_empty() {
        println!("(no columns)");
        return;
    }

    let cells: Vec<Vec<String>> = output
        .rows
        .iter()
        .map(|row| row.iter().map(render_value).collect())
        .collect();

    let mut widths: Vec<usize> = output.columns.iter().map(String::len).collect();
    for row in &cells {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.len());
        }
    }

    let header: Vec<String> = output
        .columns
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{:<width$}", c, width = widths[i]))
        .collect();
    println!("{}", header.join(" | "));
    println!("{}", widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("-+-"));
    for row in &cells {
        let line: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, cell)| format!("{:<width$}", cell, width = widths[i]))
            .collect();
        println!("{}", line.join(" | "));
    }
    println!("({} row(s))", output.rows.len());
}

fn render_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => "NULL".to_string(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
