use cityconnect_backend::config::Config;
use cityconnect_backend::middleware;
use cityconnect_backend::models::db_operations::workers_db_operations;
use cityconnect_backend::models::Worker;
use cityconnect_backend::setup::db_setup;
use clap::{Parser, Subcommand};
use redb::Database;
use std::fs;
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "setup_cli", author, version, about = "A CLI for initial application setup.", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the .env configuration file.
    #[arg(long, required = true, value_name = "FILE")]
    env_file: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
    Worker {
        #[command(subcommand)]
        action: WorkerAction,
    },
}

#[derive(Subcommand, Debug)]
enum DbAction {
    Setup,
}

#[derive(Subcommand, Debug)]
enum WorkerAction {
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        department: String,
    },
    List,
    Token {
        #[arg(long)]
        id: Uuid,
        #[arg(long, default_value_t = 24)]
        hours: i64,
    },
}

fn main() {
    let cli = Cli::parse();

    let config = Config::from_env(&cli.env_file)
        .expect("FATAL: Failed to load or parse configuration.");

    match &cli.command {
        Commands::Db { action } => match action {
            DbAction::Setup => setup_documents_database(&config),
        },
        Commands::Worker { action } => match action {
            WorkerAction::Add {
                name,
                email,
                department,
            } => add_worker(&config, name, email, department),
            WorkerAction::List => list_workers(&config),
            WorkerAction::Token { id, hours } => mint_worker_token(&config, *id, *hours),
        },
    }
}

fn setup_documents_database(config: &Config) {
    let db_path = config.documents_db_path();
    if db_path.exists() {
        println!(
            "ℹ️ Documents database already exists at '{}'. Skipping creation.",
            db_path.display()
        );
        return;
    }
    println!("\nSetting up documents database at '{}'...", db_path.display());

    if let Some(parent_dir) = db_path.parent() {
        fs::create_dir_all(parent_dir).expect("Could not create database directory.");
    }

    let db = Database::create(&db_path).expect("Failed to create documents database file.");
    match db_setup::setup_documents_db(&db) {
        Ok(_) => println!("✅ Documents database setup completed successfully."),
        Err(e) => eprintln!("❌ Error setting up documents database: {}", e),
    }
}

fn open_documents_database(config: &Config) -> Option<Database> {
    let db_path = config.documents_db_path();
    if !db_path.exists() {
        eprintln!(
            "❌ Error: Documents database not found at '{}'. Please run `setup_cli db setup` first.",
            db_path.display()
        );
        return None;
    }
    match Database::open(&db_path) {
        Ok(db) => Some(db),
        Err(e) => {
            eprintln!("❌ Error opening documents database: {}", e);
            None
        }
    }
}

fn add_worker(config: &Config, name: &str, email: &str, department: &str) {
    let Some(db) = open_documents_database(config) else {
        return;
    };

    let worker = Worker {
        id: Uuid::new_v4(),
        name: name.to_string(),
        email: email.to_string(),
        department: department.to_string(),
    };

    match workers_db_operations::insert_worker(&db, &worker) {
        Ok(_) => println!("✅ Worker '{}' registered with id {}.", name, worker.id),
        Err(e) => eprintln!("❌ Error registering worker: {}", e),
    }
}

fn list_workers(config: &Config) {
    let Some(db) = open_documents_database(config) else {
        return;
    };

    match workers_db_operations::list_workers(&db) {
        Ok(workers) => {
            println!("Listing Workers:");
            for worker in workers {
                println!(
                    "- {} <{}> [{}] {}",
                    worker.name, worker.email, worker.department, worker.id
                );
            }
        }
        Err(e) => eprintln!("❌ Error fetching workers: {}", e),
    }
}

fn mint_worker_token(config: &Config, id: Uuid, hours: i64) {
    let Some(db) = open_documents_database(config) else {
        return;
    };

    let worker = match workers_db_operations::read_worker(&db, &id) {
        Ok(Some(worker)) => worker,
        Ok(None) => {
            eprintln!("❌ Error: No worker with id {} found.", id);
            return;
        }
        Err(e) => {
            eprintln!("❌ Error reading worker: {}", e);
            return;
        }
    };

    match middleware::issue_worker_token(worker.id, &worker.name, &config.jwt_secret, hours) {
        Ok(token) => {
            println!("✅ Token for '{}' (valid {} hours):", worker.name, hours);
            println!("{}", token);
        }
        Err(e) => eprintln!("❌ Error issuing token: {}", e),
    }
}
