use std::path::PathBuf;

use anyhow::{Context, Result};
use catalog_api::CatalogApi;
use catalog_core::{CategoryCreate, CategoryId, NewUser, Pagination, ProductCreate, UserId};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

const CLI_CONTRACT_VERSION: &str = "cli.v1";

#[derive(Debug, Parser)]
#[command(name = "catalog")]
#[command(about = "Catalog operator CLI")]
struct Cli {
    #[arg(long, env = "CATALOG_DB", default_value = "./catalog.sqlite3")]
    db: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    Db {
        #[command(subcommand)]
        command: DbCommand,
    },
    User {
        #[command(subcommand)]
        command: UserCommand,
    },
    Category {
        #[command(subcommand)]
        command: CategoryCommand,
    },
    Product {
        #[command(subcommand)]
        command: ProductCommand,
    },
    Recommend(RecommendArgs),
}

#[derive(Debug, Subcommand)]
enum DbCommand {
    SchemaVersion,
    Migrate {
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },
}

#[derive(Debug, Subcommand)]
enum UserCommand {
    Add {
        #[arg(long)]
        email: String,
        #[arg(long)]
        full_name: Option<String>,
        #[arg(long, default_value_t = false)]
        superuser: bool,
    },
}

#[derive(Debug, Subcommand)]
enum CategoryCommand {
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    List(PageArgs),
}

#[derive(Debug, Subcommand)]
enum ProductCommand {
    Add(ProductAddArgs),
    List {
        #[arg(long = "as")]
        acting_user: UserId,
        #[command(flatten)]
        page: PageArgs,
    },
}

#[derive(Debug, Args)]
struct ProductAddArgs {
    #[arg(long = "as")]
    acting_user: UserId,
    #[arg(long)]
    category: CategoryId,
    #[arg(long)]
    name: String,
    #[arg(long)]
    description: Option<String>,
    #[arg(long, default_value_t = 0.0)]
    price: f64,
    #[arg(long, default_value_t = 0.0)]
    rating: f64,
}

#[derive(Debug, Args)]
struct PageArgs {
    #[arg(long)]
    skip: Option<u32>,
    #[arg(long)]
    limit: Option<u32>,
}

#[derive(Debug, Args)]
struct RecommendArgs {
    #[arg(long)]
    user: UserId,
    #[command(flatten)]
    page: PageArgs,
}

fn with_contract_version(value: Value) -> Value {
    match value {
        Value::Object(mut object) => {
            object.insert(
                "contract_version".to_string(),
                Value::String(CLI_CONTRACT_VERSION.to_string()),
            );
            Value::Object(object)
        }
        other => serde_json::json!({
            "contract_version": CLI_CONTRACT_VERSION,
            "payload": other
        }),
    }
}

fn emit_json(value: &impl Serialize) -> Result<()> {
    let value = serde_json::to_value(value).context("failed to encode command output")?;
    println!("{}", serde_json::to_string_pretty(&with_contract_version(value))?);
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let api = CatalogApi::new(cli.db);
    match cli.command {
        Command::Db { command } => run_db(&api, command),
        Command::User { command } => run_user(&api, command),
        Command::Category { command } => run_category(&api, command),
        Command::Product { command } => run_product(&api, command),
        Command::Recommend(args) => {
            let page = Pagination::recommendations(args.page.skip, args.page.limit);
            emit_json(&api.recommendations(args.user, page)?)
        }
    }
}

fn run_db(api: &CatalogApi, command: DbCommand) -> Result<()> {
    match command {
        DbCommand::SchemaVersion => {
            let status = api.schema_status()?;
            emit_json(&serde_json::json!({
                "current_version": status.current_version,
                "target_version": status.target_version,
                "pending_versions": status.pending_versions,
                "up_to_date": status.pending_versions.is_empty()
            }))
        }
        DbCommand::Migrate { dry_run } => emit_json(&api.migrate(dry_run)?),
    }
}

fn run_user(api: &CatalogApi, command: UserCommand) -> Result<()> {
    match command {
        UserCommand::Add { email, full_name, superuser } => {
            let user = api.create_user(NewUser { email, full_name, is_superuser: superuser })?;
            emit_json(&user)
        }
    }
}

fn run_category(api: &CatalogApi, command: CategoryCommand) -> Result<()> {
    match command {
        CategoryCommand::Add { name, description } => {
            emit_json(&api.create_category(CategoryCreate { name, description })?)
        }
        CategoryCommand::List(page) => {
            emit_json(&api.list_categories(Pagination::listing(page.skip, page.limit))?)
        }
    }
}

fn run_product(api: &CatalogApi, command: ProductCommand) -> Result<()> {
    match command {
        ProductCommand::Add(args) => {
            let user = api.get_user(args.acting_user)?;
            let input = ProductCreate {
                name: args.name,
                description: args.description,
                price: args.price,
                rating: args.rating,
                category_id: args.category,
            };
            emit_json(&api.create_product(&user, input)?)
        }
        ProductCommand::List { acting_user, page } => {
            let user = api.get_user(acting_user)?;
            emit_json(&api.list_products(&user, Pagination::listing(page.skip, page.limit))?)
        }
    }
}
