use std::path::Path;

use ev_charger_sync::adapters::db::{
    count_chargers, get_latest_sync_run, open_connection, run_migrations, schema_version,
};
use ev_charger_sync::app::AppConfig;

fn main() {
    if let Err(error) = run() {
        eprintln!("failed to initialize charger db: {error}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let mut path = None;
    let mut force = false;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut index = 0;
    while index < args.len() {
        match args[index].as_str() {
            "--path" => {
                let Some(value) = args.get(index + 1) else {
                    return Err("--path requires a value".to_string());
                };
                path = Some(value.clone());
                index += 2;
            }
            "--force" => {
                force = true;
                index += 1;
            }
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            other => {
                return Err(format!("unknown argument: {other}"));
            }
        }
    }

    let path = match path {
        Some(path) => path,
        None => AppConfig::from_env().map_err(|error| error.to_string())?.db_path,
    };

    let path_ref = Path::new(&path);
    if let Some(parent) = path_ref.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .map_err(|error| format!("failed to create parent directory: {error}"))?;
    }

    if force && path_ref.exists() {
        std::fs::remove_file(path_ref)
            .map_err(|error| format!("failed to remove existing db file: {error}"))?;
    }

    let mut connection = open_connection(&path).map_err(|error| error.to_string())?;
    run_migrations(&mut connection).map_err(|error| error.to_string())?;
    let version = schema_version(&connection).map_err(|error| error.to_string())?;
    let chargers = count_chargers(&connection).map_err(|error| error.to_string())?;
    let latest_run = get_latest_sync_run(&connection).map_err(|error| error.to_string())?;

    println!("charger db ready at: {path}");
    println!("schema version: {version}");
    println!("stored chargers: {chargers}");
    match latest_run {
        Some(run) => println!(
            "latest sync: {} at {} (synced {}, deleted {})",
            run.status, run.finished_at, run.synced, run.deleted
        ),
        None => println!("latest sync: none recorded"),
    }
    Ok(())
}

fn print_help() {
    println!("init_db");
    println!();
    println!("Usage:");
    println!("  cargo run --bin init_db -- [--path <file>] [--force]");
    println!();
    println!("Options:");
    println!("  --path <file>   sqlite file to create or migrate (default: DB_PATH)");
    println!("  --force         delete existing file before creating");
}
