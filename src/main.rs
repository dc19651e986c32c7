#![allow(clippy::print_stdout)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use tracing::info;
use uuid::Uuid;

use digital_declutter::analytics::Analytics;
use digital_declutter::config::AppConfig;
use digital_declutter::filter::{FilterOptions, ItemFilter};
use digital_declutter::health_check::CheckPhase;
use digital_declutter::logging::init_logging;
use digital_declutter::models::{
    HealthCheck, Importance, Item, ItemDraft, ItemPatch, ItemType, ScoreBand, UsageFrequency,
};
use digital_declutter::validation::InputValidator;
use digital_declutter::{DeclutterService, MemoryGateway, SupabaseGateway};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Account email
    #[arg(long, env = "DECLUTTER_EMAIL", global = true)]
    email: Option<String>,

    /// Account password
    #[arg(long, env = "DECLUTTER_PASSWORD", global = true, hide_env_values = true)]
    password: Option<String>,

    /// Use an in-process gateway instead of the hosted service; nothing is kept between runs
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account
    SignUp,
    /// List items, optionally filtered
    List {
        /// Case-insensitive search over name, category and notes
        #[arg(short, long)]
        search: Option<String>,

        /// Only these item types
        #[arg(long = "type")]
        types: Vec<ItemType>,

        /// Only these categories
        #[arg(long = "category")]
        categories: Vec<String>,

        /// Only these importance levels
        #[arg(long)]
        importance: Vec<Importance>,

        /// Only these usage frequencies
        #[arg(long)]
        usage: Vec<UsageFrequency>,
    },
    /// Show one item
    Show {
        /// Item id
        id: Uuid,
    },
    /// Add an item
    Add {
        /// Display name
        #[arg(short, long)]
        name: String,

        /// Category, e.g. Entertainment
        #[arg(short, long)]
        category: String,

        /// Item type
        #[arg(long = "type", default_value = "app")]
        item_type: ItemType,

        /// Usage frequency
        #[arg(long, default_value = "daily")]
        usage: UsageFrequency,

        /// Importance
        #[arg(long, default_value = "medium")]
        importance: Importance,

        /// Last day used (YYYY-MM-DD)
        #[arg(long)]
        last_used: Option<NaiveDate>,

        /// Platform or vendor
        #[arg(long, default_value = "")]
        platform: String,

        /// Free-form notes
        #[arg(long, default_value = "")]
        notes: String,
    },
    /// Change fields of an item
    Update {
        /// Item id
        id: Uuid,

        /// New name
        #[arg(short, long)]
        name: Option<String>,

        /// New category
        #[arg(short, long)]
        category: Option<String>,

        /// New type
        #[arg(long = "type")]
        item_type: Option<ItemType>,

        /// New usage frequency
        #[arg(long)]
        usage: Option<UsageFrequency>,

        /// New importance
        #[arg(long)]
        importance: Option<Importance>,

        /// New last-used day (YYYY-MM-DD)
        #[arg(long, conflicts_with = "clear_last_used")]
        last_used: Option<NaiveDate>,

        /// Forget the last-used day
        #[arg(long)]
        clear_last_used: bool,

        /// New platform
        #[arg(long)]
        platform: Option<String>,

        /// New notes
        #[arg(long)]
        notes: Option<String>,
    },
    /// Delete an item
    Delete {
        /// Item id
        id: Uuid,
    },
    /// Show usage analytics and the health score
    Analytics,
    /// Run a health check and store the result
    HealthCheck {
        /// Skip the staged progress delay
        #[arg(long)]
        no_pacing: bool,
    },
    /// List previous health checks
    History,
    /// Write items and account details to a JSON file
    Export {
        /// Output directory
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration; offline runs do not need a gateway connection
    let config = if cli.offline {
        let config = AppConfig::load_unvalidated()?;
        config.validate_local()?;
        config
    } else {
        AppConfig::load()?
    };

    // Initialize logging
    let _log_guard = init_logging(&config.logging)?;

    info!(level = %config.get_log_level(), offline = cli.offline, "Starting digital-declutter");

    let email = cli.email.context("an account email is required (--email or DECLUTTER_EMAIL)")?;
    let password = cli
        .password
        .context("a password is required (--password or DECLUTTER_PASSWORD)")?;
    InputValidator::validate_email(&email)?;

    let service = if cli.offline {
        let gateway = Arc::new(MemoryGateway::new());
        if !matches!(cli.command, Commands::SignUp) {
            gateway.register_user(&email, &password, true);
        }
        DeclutterService::with_gateway(gateway, &config)
    } else {
        DeclutterService::with_gateway(Arc::new(SupabaseGateway::new(&config.gateway)?), &config)
    };

    if matches!(cli.command, Commands::SignUp) {
        InputValidator::validate_password(&password)?;
        let identity = service.session().sign_up(&email, &password).await?;
        println!("Account created for {}", identity.email);
        println!("Check your inbox for a confirmation link if sign-in is refused.");
        return Ok(());
    }

    service.sign_in_and_sync(&email, &password).await?;
    run_command(&service, &config, cli.command).await
}

async fn run_command(service: &DeclutterService, config: &AppConfig, command: Commands) -> Result<()> {
    let inventory = service.inventory();

    match command {
        // Handled before sign-in
        Commands::SignUp => {}
        Commands::List {
            search,
            types,
            categories,
            importance,
            usage,
        } => {
            let filter = ItemFilter {
                search: search.map(|s| InputValidator::sanitize_text(&s)).unwrap_or_default(),
                types: types.into_iter().collect(),
                categories: categories.into_iter().collect(),
                importance: importance.into_iter().collect(),
                usage_frequency: usage.into_iter().collect(),
            };
            let items = inventory.items();
            let matching = filter.apply(&items);
            for item in &matching {
                print_item_line(item);
            }
            if items.is_empty() {
                println!("No items yet.");
            } else if filter.is_active() {
                println!("{} of {} items", matching.len(), items.len());
                if matching.is_empty() {
                    let options = FilterOptions::from_items(&items);
                    let categories: Vec<&str> = options.categories.iter().map(String::as_str).collect();
                    println!("Categories in use: {}", categories.join(", "));
                }
            }
        }
        Commands::Show { id } => match inventory.get_item_by_id(id) {
            Some(item) => print_item_details(&item),
            None => bail!("Item not found: {id}"),
        },
        Commands::Add {
            name,
            category,
            item_type,
            usage,
            importance,
            last_used,
            platform,
            notes,
        } => {
            let draft = ItemDraft {
                name: InputValidator::sanitize_text(&name),
                item_type,
                category: InputValidator::sanitize_text(&category),
                last_used_date: last_used,
                usage_frequency: usage,
                importance,
                platform: InputValidator::sanitize_text(&platform),
                notes: InputValidator::sanitize_text(&notes),
            };
            let item = inventory.add_item(draft).await?;
            println!("Added {} ({})", item.name, item.id);
        }
        Commands::Update {
            id,
            name,
            category,
            item_type,
            usage,
            importance,
            last_used,
            clear_last_used,
            platform,
            notes,
        } => {
            let patch = ItemPatch {
                name: name.map(|s| InputValidator::sanitize_text(&s)),
                item_type,
                category: category.map(|s| InputValidator::sanitize_text(&s)),
                last_used_date: if clear_last_used { Some(None) } else { last_used.map(Some) },
                usage_frequency: usage,
                importance,
                platform: platform.map(|s| InputValidator::sanitize_text(&s)),
                notes: notes.map(|s| InputValidator::sanitize_text(&s)),
            };
            let item = inventory.update_item(id, patch).await?;
            println!("Updated {} ({})", item.name, item.id);
        }
        Commands::Delete { id } => {
            inventory.delete_item(id).await?;
            println!("Deleted {id}");
        }
        Commands::Analytics => print_analytics(&inventory.analytics()),
        Commands::HealthCheck { no_pacing } => {
            let mut config = config.clone();
            if no_pacing {
                config.health_check.stage_delay_ms = 0;
            }
            let runner = service.health_check_runner(&config);
            let mut phases = runner.subscribe();
            let progress = tokio::spawn(async move {
                while phases.changed().await.is_ok() {
                    let phase = phases.borrow_and_update().clone();
                    if let CheckPhase::Running { label, .. } = &phase {
                        println!("[{:>3}%] {label}...", phase.progress_percent());
                    }
                }
            });
            let result = runner.run().await;
            drop(runner);
            let _ = progress.await;
            match result {
                Some(check) => print_health_check(&check),
                None => bail!("Health check could not be saved"),
            }
        }
        Commands::History => {
            let checks = inventory.health_checks();
            if checks.is_empty() {
                println!("No health checks yet.");
            }
            let now = Utc::now();
            for check in &checks {
                println!(
                    "{}  score {:>3}  {} items, {} unused  ({} days ago)",
                    check.check_date.format("%Y-%m-%d %H:%M"),
                    check.score(),
                    check.total_items,
                    check.unused_items,
                    check.days_since(now)
                );
            }
        }
        Commands::Export { output_dir } => {
            let output_dir =
                output_dir.unwrap_or_else(|| PathBuf::from(&config.export.output_directory));
            let path = service.export_to(&output_dir, &config.export.file_name)?;
            println!("Exported {} items to {}", inventory.items().len(), path.display());
        }
    }

    Ok(())
}

fn print_item_line(item: &Item) {
    println!(
        "{}  {:<24} {:<14} {:<12} {:<8} {}",
        item.id, item.name, item.category, item.item_type, item.usage_frequency, item.importance
    );
}

fn print_item_details(item: &Item) {
    println!("{}", item.name);
    println!("  id:         {}", item.id);
    println!("  type:       {}", item.item_type);
    println!("  category:   {}", item.category);
    println!("  usage:      {}", item.usage_frequency);
    println!("  importance: {}", item.importance);
    if let Some(date) = item.last_used_date {
        println!("  last used:  {date}");
    }
    if !item.platform.is_empty() {
        println!("  platform:   {}", item.platform);
    }
    if !item.notes.is_empty() {
        println!("  notes:      {}", item.notes);
    }
    println!("  added:      {}", item.created_at.format("%Y-%m-%d"));
}

fn band_label(score: u8) -> &'static str {
    match ScoreBand::for_score(score) {
        ScoreBand::Good => "good",
        ScoreBand::Fair => "fair",
        ScoreBand::Poor => "needs attention",
    }
}

fn print_analytics(analytics: &Analytics) {
    println!(
        "Health score: {} ({})",
        analytics.health_score,
        band_label(analytics.health_score)
    );
    println!("Items: {} total, {} unused", analytics.total_items, analytics.unused_items);
    println!("By category:");
    for (category, count) in &analytics.category_counts {
        println!("  {category:<16} {count}");
    }
    println!("By type:");
    for (item_type, count) in &analytics.type_counts {
        println!("  {:<16} {count}", item_type.as_str());
    }
    println!("By usage:");
    for (usage, count) in &analytics.usage_frequency {
        println!("  {:<16} {count}", usage.as_str());
    }
    if !analytics.recent_items.is_empty() {
        println!("Recently added:");
        for item in &analytics.recent_items {
            println!("  {}", item.name);
        }
    }
}

fn print_health_check(check: &HealthCheck) {
    let score = check.score();
    println!("Health score: {score} ({})", band_label(score));
    println!("{} items, {} unused", check.total_items, check.unused_items);
    println!("Recommendations:");
    for recommendation in &check.recommendations {
        println!("  - {recommendation}");
    }
}
