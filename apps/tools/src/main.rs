use std::{path::PathBuf, str::FromStr};

use anyhow::Result;
use clap::{Parser, Subcommand};
use server_api::{
    find_match, is_registered, list_departments, list_registrants, register, unregister,
    ApiContext,
};
use shared::{domain::DepartmentFilter, error::ApiException, protocol::RegisterRequest};
use storage::{open_store, StoreBackend, StoreConfig};

#[derive(Parser, Debug)]
struct Cli {
    /// sqlite, csv or memory
    #[arg(long, default_value = "sqlite", value_parser = StoreBackend::from_str)]
    backend: StoreBackend,
    #[arg(long, default_value = "sqlite://./data/database.db")]
    database_url: String,
    #[arg(long, default_value = "./data/names.csv")]
    csv_path: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Register {
        name: String,
        surname: String,
        #[arg(long)]
        department: Option<String>,
    },
    Unregister {
        name: String,
        surname: String,
    },
    Exists {
        name: String,
        surname: String,
    },
    List {
        #[arg(long)]
        department: Option<String>,
    },
    Match {
        #[arg(long)]
        department: Option<String>,
    },
    Departments,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = StoreConfig {
        backend: cli.backend,
        database_url: cli.database_url,
        csv_path: cli.csv_path,
    };
    let ctx = ApiContext::new(open_store(&config).await?);

    match cli.command {
        Command::Register {
            name,
            surname,
            department,
        } => {
            let registered = register(
                &ctx,
                RegisterRequest {
                    name,
                    surname,
                    department,
                },
            )
            .await
            .map_err(ApiException::from)?;
            println!("registered: {}", registered.display_name);
        }
        Command::Unregister { name, surname } => {
            unregister(&ctx, &name, &surname)
                .await
                .map_err(ApiException::from)?;
            println!("deleted: {name} {surname}");
        }
        Command::Exists { name, surname } => {
            let exists = is_registered(&ctx, &name, &surname)
                .await
                .map_err(ApiException::from)?;
            println!("{exists}");
        }
        Command::List { department } => {
            let filter = DepartmentFilter::parse(department.as_deref());
            for registrant in list_registrants(&ctx, &filter)
                .await
                .map_err(ApiException::from)?
            {
                println!("{registrant}");
            }
        }
        Command::Match { department } => {
            let filter = DepartmentFilter::parse(department.as_deref());
            let response = find_match(&ctx, &filter)
                .await
                .map_err(ApiException::from)?;
            match response.matched {
                Some(matched) => println!("your coffee match is: {matched}"),
                None => println!(
                    "not enough people for a match ({} candidate(s) in {})",
                    response.candidates, response.department
                ),
            }
        }
        Command::Departments => {
            for department in list_departments(&ctx) {
                println!("{department}");
            }
        }
    }

    Ok(())
}
