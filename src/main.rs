use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use nyam::config::Config;
use nyam::engine::{filtered_candidates, Roulette, SpinOutcome};
use nyam::recommend::{recommend, resolve_api_key, Caption};
use nyam::storage::{CatalogStore, Database, DatabaseError, Food, FoodDraft, FoodPatch, HistoryLog};
use nyam::util::{display_width, parse_positive_id, sanitize_name, MAX_HISTORY_LIMIT};

/// Get the config directory path (~/.config/nyam/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("nyam"))
}

#[derive(Parser, Debug)]
#[command(name = "nyam", about = "Food roulette: spin a wheel over your own menu")]
struct Args {
    /// Use a specific database file instead of ~/.config/nyam/nyam.db
    #[arg(long, value_name = "FILE")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Spin the wheel over the active categories and record the result
    Spin {
        /// Print the result as JSON
        #[arg(long)]
        json: bool,

        /// Skip the caption lookup
        #[arg(long)]
        no_caption: bool,
    },

    /// Manage menu items
    Menu {
        #[command(subcommand)]
        command: MenuCommand,
    },

    /// List categories or toggle them in and out of the pool
    Category {
        #[command(subcommand)]
        command: CategoryCommand,
    },

    /// Inspect or prune past spins
    History {
        #[command(subcommand)]
        command: HistoryCommand,
    },

    /// Get a caption for a food without spinning
    Recommend {
        /// Food name to caption
        food: String,

        /// Category name to mention in the prompt
        #[arg(long)]
        category: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum MenuCommand {
    /// List menu items, optionally for one category
    List {
        /// Category id to filter by
        #[arg(long)]
        category: Option<String>,
    },

    /// Add a menu item
    Add {
        #[arg(long)]
        name: String,

        #[arg(long)]
        emoji: String,

        /// Category id the item belongs to
        #[arg(long)]
        category: String,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        image_url: Option<String>,
    },

    /// Update fields of a menu item; omitted fields stay unchanged
    Update {
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        emoji: Option<String>,

        #[arg(long)]
        category: Option<String>,

        #[arg(long, conflicts_with = "clear_description")]
        description: Option<String>,

        /// Remove the stored description
        #[arg(long)]
        clear_description: bool,

        #[arg(long, conflicts_with = "clear_image_url")]
        image_url: Option<String>,

        /// Remove the stored image URL
        #[arg(long)]
        clear_image_url: bool,
    },

    /// Delete a menu item
    Rm { id: String },

    /// Discard all edits and reinstall the built-in menu
    Reset,
}

#[derive(Subcommand, Debug)]
enum CategoryCommand {
    /// List categories and whether they are in the pool
    List,

    /// Toggle a category in or out of the pool
    Toggle { id: String },
}

#[derive(Subcommand, Debug)]
enum HistoryCommand {
    /// Show past spins, newest first
    List {
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },

    /// Delete one history entry
    Rm { id: String },

    /// Delete all history entries
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_dir = get_config_dir()?;
    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir).context("Failed to create config directory")?;
    }

    // User-only access: the config file may hold the API key
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        match std::fs::metadata(&config_dir) {
            Ok(metadata) => {
                let mut perms = metadata.permissions();
                perms.set_mode(0o700);
                if let Err(e) = std::fs::set_permissions(&config_dir, perms) {
                    tracing::warn!(
                        path = %config_dir.display(),
                        error = %e,
                        "Failed to set config directory permissions to 0700"
                    );
                }
            }
            Err(e) => {
                tracing::warn!(
                    path = %config_dir.display(),
                    error = %e,
                    "Failed to read config directory metadata"
                );
            }
        }
    }

    let config = Config::load(&config_dir.join("config.toml"))?;

    let db_path = args.db.unwrap_or_else(|| config_dir.join("nyam.db"));
    let db_path_str = db_path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid UTF-8 in database path"))?;
    let db = match Database::open(db_path_str).await {
        Ok(db) => db,
        Err(DatabaseError::InstanceLocked) => {
            eprintln!(
                "Error: Another instance of nyam appears to be running. Please close it and try again."
            );
            std::process::exit(1);
        }
        Err(e) => return Err(anyhow::anyhow!("Failed to open database: {}", e)),
    };

    match args.command {
        Command::Spin { json, no_caption } => run_spin(db, &config, json, no_caption).await,
        Command::Menu { command } => run_menu(db, command).await,
        Command::Category { command } => run_category(db, command).await,
        Command::History { command } => run_history(db, command).await,
        Command::Recommend { food, category } => run_recommend(&config, &food, category.as_deref()).await,
    }
}

async fn run_spin(db: Database, config: &Config, json: bool, no_caption: bool) -> Result<()> {
    let catalog = CatalogStore::load(db.clone()).await?;
    let mut history = HistoryLog::load(db).await?;

    let candidates = filtered_candidates(catalog.menus(), catalog.categories());
    if candidates.is_empty() {
        bail!("No menu items in the active categories. Toggle a category on or add some menus.");
    }

    if !json {
        println!("Spinning over {} candidates...", candidates.len());
    }

    let roulette = Roulette::with_duration(Duration::from_millis(config.spin_duration_ms));
    let food = match roulette.spin(&candidates).await {
        SpinOutcome::Landed(food) => food,
        outcome => bail!("Spin did not complete: {:?}", outcome),
    };

    let entry = history.add(food.clone()).await?;

    let caption = if no_caption {
        None
    } else {
        let category_name = catalog
            .category_by_id(food.category_id)
            .map(|c| c.name.clone());
        let api_key = resolve_api_key(config.gemini_api_key.as_deref());
        let client = reqwest::Client::new();
        Some(recommend(&client, &food.name, category_name.as_deref(), api_key.as_ref(), None).await)
    };

    if json {
        let payload = serde_json::json!({
            "food": food,
            "caption": caption,
            "historyId": entry.id,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        let category = catalog
            .category_by_id(food.category_id)
            .map(|c| c.name.as_str())
            .unwrap_or("?");
        println!();
        println!("  {} {}  ({})", food.emoji, food.name, category);
        if let Some(caption) = caption {
            println!("  {}", caption.message);
        }
    }
    Ok(())
}

async fn run_menu(db: Database, command: MenuCommand) -> Result<()> {
    let mut catalog = CatalogStore::load(db).await?;

    match command {
        MenuCommand::List { category } => {
            let filter = category.as_deref().map(parse_positive_id).transpose()?;
            let menus: Vec<&Food> = match filter {
                Some(id) => catalog.menus_by_category(id),
                None => catalog.menus().iter().collect(),
            };

            let name_width = menus
                .iter()
                .map(|m| display_width(&m.name))
                .max()
                .unwrap_or(0);
            for menu in menus {
                let category_name = catalog
                    .category_by_id(menu.category_id)
                    .map(|c| c.name.as_str())
                    .unwrap_or("?");
                let pad = " ".repeat(name_width - display_width(&menu.name));
                print!("{:>3}  {} {}{}  {}", menu.id, menu.emoji, menu.name, pad, category_name);
                if let Some(description) = &menu.description {
                    print!("  — {}", description);
                }
                println!();
            }
        }
        MenuCommand::Add {
            name,
            emoji,
            category,
            description,
            image_url,
        } => {
            let draft = FoodDraft {
                name,
                emoji,
                category_id: parse_positive_id(&category)?,
                description,
                image_url,
            };
            let food = catalog.add(draft).await?;
            println!("Added {} {} (id {})", food.emoji, food.name, food.id);
        }
        MenuCommand::Update {
            id,
            name,
            emoji,
            category,
            description,
            clear_description,
            image_url,
            clear_image_url,
        } => {
            let id = parse_positive_id(&id)?;
            let patch = FoodPatch {
                name,
                emoji,
                category_id: category.as_deref().map(parse_positive_id).transpose()?,
                description: if clear_description {
                    Some(None)
                } else {
                    description.map(Some)
                },
                image_url: if clear_image_url {
                    Some(None)
                } else {
                    image_url.map(Some)
                },
            };
            match catalog.update(id, patch).await? {
                Some(food) => println!("Updated {} {} (id {})", food.emoji, food.name, food.id),
                None => bail!("No menu item with id {}", id),
            }
        }
        MenuCommand::Rm { id } => {
            let id = parse_positive_id(&id)?;
            if catalog.delete(id).await? {
                println!("Deleted menu item {}", id);
            } else {
                bail!("No menu item with id {}", id);
            }
        }
        MenuCommand::Reset => {
            catalog.reset_to_default().await?;
            println!("Menu reset to the built-in {} items", catalog.menus().len());
        }
    }
    Ok(())
}

async fn run_category(db: Database, command: CategoryCommand) -> Result<()> {
    let mut catalog = CatalogStore::load(db).await?;

    match command {
        CategoryCommand::List => {
            for category in catalog.categories() {
                let marker = if category.active { "on " } else { "off" };
                println!(
                    "{:>3}  [{}]  {} {}",
                    category.id, marker, category.emoji, category.name
                );
            }
        }
        CategoryCommand::Toggle { id } => {
            let id = parse_positive_id(&id)?;
            match catalog.toggle_category(id).await? {
                Some(true) => println!("Category {} is back in the pool", id),
                Some(false) => println!("Category {} is out of the pool", id),
                None => bail!("No category with id {}", id),
            }
        }
    }
    Ok(())
}

async fn run_history(db: Database, command: HistoryCommand) -> Result<()> {
    let mut history = HistoryLog::load(db).await?;

    match command {
        HistoryCommand::List { limit } => {
            if limit > MAX_HISTORY_LIMIT {
                bail!("--limit must be at most {}", MAX_HISTORY_LIMIT);
            }
            for entry in history.entries().iter().take(limit) {
                println!(
                    "{:>3}  {}  {} {}",
                    entry.id,
                    entry.created_at.format("%Y-%m-%d %H:%M"),
                    entry.food.emoji,
                    entry.food.name
                );
            }
        }
        HistoryCommand::Rm { id } => {
            let id = parse_positive_id(&id)?;
            if history.delete(id).await? {
                println!("Deleted history entry {}", id);
            } else {
                bail!("No history entry with id {}", id);
            }
        }
        HistoryCommand::Clear => {
            history.clear().await?;
            println!("History cleared");
        }
    }
    Ok(())
}

async fn run_recommend(config: &Config, food: &str, category: Option<&str>) -> Result<()> {
    let food = sanitize_name(food)?;
    let api_key = resolve_api_key(config.gemini_api_key.as_deref());
    let client = reqwest::Client::new();

    let Caption { message, is_ai } = recommend(&client, &food, category, api_key.as_ref(), None).await;
    println!("{}", message);
    if !is_ai {
        tracing::debug!("Caption came from the local fallback set");
    }
    Ok(())
}
