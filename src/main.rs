use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand};
use std::process;
use uuid::Uuid;

use k9track::activity::{
    ActivityCatalog, DefinitionPatch, NewActivity, NewCustomActivityType, TimerStatus,
};
use k9track::config::Config;
use k9track::workflow::{BoardFeed, BoardRow, DeleteOutcome, Workflow, BOARD_RELOAD_INTERVAL};
use k9track::{backend_from_config, interactive, logging, ticker, utils};

#[derive(Parser)]
#[command(name = "k9track")]
#[command(about = "Activity timers for dog-training facilities", long_about = None)]
#[command(version, long_version = concat!(env!("CARGO_PKG_VERSION"), " (built ", env!("BUILD_DATE"), ")"))]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the facility's effective activity types
    Catalog {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show running activities and their timers
    Status {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Start an activity for a dog
    Start {
        /// Dog identifier
        dog_id: String,
        /// Activity type code (e.g. potty, kennel, or a custom code)
        code: String,
        /// Optional notes
        #[arg(short, long)]
        notes: Option<String>,
    },
    /// Stop a running activity
    Stop {
        /// Activity id as shown by `status`
        activity_id: Uuid,
    },
    /// Live timer board
    Watch {
        /// Print one line per activity per tick instead of the interactive board
        #[arg(long)]
        plain: bool,
    },
    /// Customize built-in activity types
    #[command(subcommand)]
    Override(OverrideCommand),
    /// Manage facility-defined activity types
    #[command(subcommand)]
    Custom(CustomCommand),
    /// Show or create the configuration file
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand)]
enum OverrideCommand {
    /// Create or update an override; only the given fields change
    Set {
        /// Built-in activity code
        code: String,
        #[command(flatten)]
        fields: OverrideFields,
        /// Hide the type from the catalog
        #[arg(long)]
        hidden: Option<bool>,
    },
    /// Remove an override and restore the built-in defaults
    Clear { code: String },
}

#[derive(Args)]
struct OverrideFields {
    #[arg(long)]
    label: Option<String>,
    #[arg(long)]
    icon: Option<String>,
    #[arg(long)]
    color: Option<String>,
    /// Minutes until the timer turns to warning
    #[arg(long = "warn")]
    warning_minutes: Option<i64>,
    /// Minutes until the timer turns urgent
    #[arg(long = "max")]
    max_minutes: Option<i64>,
    #[arg(long = "sort")]
    sort_order: Option<i32>,
    #[arg(long = "quick-log")]
    show_in_quick_log: Option<bool>,
}

impl OverrideFields {
    fn into_patch(self) -> DefinitionPatch {
        DefinitionPatch {
            label: self.label,
            icon_name: self.icon,
            color: self.color,
            max_minutes: self.max_minutes,
            warning_minutes: self.warning_minutes,
            sort_order: self.sort_order,
            show_in_quick_log: self.show_in_quick_log,
            category: None,
        }
    }
}

#[derive(Subcommand)]
enum CustomCommand {
    /// Create a custom activity type
    Add {
        /// Lowercase code, e.g. fetch_time
        code: String,
        #[arg(long)]
        label: String,
        #[arg(long = "warn")]
        warning_minutes: i64,
        #[arg(long = "max")]
        max_minutes: i64,
        #[arg(long)]
        icon: Option<String>,
        #[arg(long)]
        color: Option<String>,
        #[arg(long = "sort")]
        sort_order: Option<i32>,
        #[arg(long)]
        category: Option<String>,
        /// Leave out of the quick-log picker
        #[arg(long)]
        no_quick_log: bool,
    },
    /// Delete a custom type (deactivates it if activities reference it)
    Delete { id: Uuid },
    /// Show a custom type by id, including deactivated ones
    Show { id: Uuid },
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the effective configuration
    Show,
    /// Write a configuration file
    Init {
        #[arg(long)]
        facility: String,
        #[arg(long)]
        supabase_url: Option<String>,
        #[arg(long)]
        api_key: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // The interactive board owns the terminal, so it logs to file only
    let interactive_board = matches!(cli.command, Some(Commands::Watch { plain: false }));
    if interactive_board {
        if let Err(e) = logging::init_with_file("k9track.log") {
            eprintln!("Warning: file logging unavailable: {}", e);
        }
    } else {
        logging::init();
    }

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let command = match cli.command {
        Some(command) => command,
        None => {
            println!("No command specified. Use --help for available commands.");
            return Ok(());
        }
    };

    if let Commands::Config(config_command) = command {
        return handle_config_command(config_command);
    }

    let config = Config::load()?;
    let backend = backend_from_config(&config)?;
    let workflow = Workflow::new(backend, config.facility_id.clone());
    tracing::debug!(
        facility_id = %config.facility_id,
        backend = workflow.backend_name(),
        "workflow ready"
    );

    match command {
        Commands::Catalog { json } => {
            let catalog = workflow.catalog().await;
            if json {
                println!("{}", serde_json::to_string_pretty(catalog.definitions())?);
            } else {
                print_catalog(&catalog);
            }
        }
        Commands::Status { json } => {
            let (_, rows) = workflow.board(chrono::Utc::now()).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                print_board(&rows);
            }
        }
        Commands::Start {
            dog_id,
            code,
            notes,
        } => {
            let log = workflow
                .start_activity(NewActivity {
                    dog_id,
                    activity_type_code: code,
                    notes,
                    custom_type_id: None,
                })
                .await?;
            println!(
                "Started {} for dog {} (activity id {})",
                log.activity_type_code, log.dog_id, log.id
            );
        }
        Commands::Stop { activity_id } => {
            let log = workflow.stop_activity(activity_id).await?;
            let minutes = log
                .ended_at
                .map(|end| k9track::activity::timer::elapsed_minutes(log.started_at, end))
                .unwrap_or(0);
            println!(
                "Stopped {} for dog {} after {}",
                log.activity_type_code,
                log.dog_id,
                utils::format_minutes(minutes)
            );
        }
        Commands::Watch { plain } => {
            if plain {
                watch_plain(&workflow, config.tick_interval()).await?;
            } else {
                interactive::run_interactive(workflow, config.tick_interval()).await?;
            }
        }
        Commands::Override(OverrideCommand::Set {
            code,
            fields,
            hidden,
        }) => {
            let ov = workflow
                .set_override(&code, &fields.into_patch(), hidden)
                .await?;
            println!("Override saved for {}", ov.activity_type_code);
            if let Some(def) = workflow.catalog().await.get(&code) {
                println!(
                    "  {} - warn {}, max {}",
                    def.label,
                    utils::format_minutes(def.warning_minutes),
                    utils::format_minutes(def.max_minutes)
                );
            } else if ov.is_hidden {
                println!("  {} is hidden", code);
            }
        }
        Commands::Override(OverrideCommand::Clear { code }) => {
            if workflow.clear_override(&code).await? {
                println!("Override removed; {} is back to its defaults", code);
            } else {
                println!("{} had no override", code);
            }
        }
        Commands::Custom(CustomCommand::Add {
            code,
            label,
            warning_minutes,
            max_minutes,
            icon,
            color,
            sort_order,
            category,
            no_quick_log,
        }) => {
            let custom = workflow
                .create_custom_type(NewCustomActivityType {
                    code,
                    label,
                    icon_name: icon,
                    color,
                    max_minutes,
                    warning_minutes,
                    sort_order,
                    show_in_quick_log: Some(!no_quick_log),
                    category,
                })
                .await?;
            println!("Created {} ({}) with id {}", custom.label, custom.code, custom.id);
        }
        Commands::Custom(CustomCommand::Delete { id }) => {
            match workflow.delete_custom_type(id).await? {
                DeleteOutcome::Deleted => println!("Deleted custom activity type {}", id),
                DeleteOutcome::Deactivated => println!(
                    "Custom activity type {} is used by logged activities; it was deactivated instead",
                    id
                ),
            }
        }
        Commands::Custom(CustomCommand::Show { id }) => {
            let custom = workflow
                .custom_type(id)
                .await?
                .ok_or_else(|| anyhow!("No custom activity type with id {}", id))?;
            println!("{}", serde_json::to_string_pretty(&custom)?);
        }
        Commands::Config(config_command) => handle_config_command(config_command)?,
    }

    Ok(())
}

fn handle_config_command(command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Show => {
            let config = Config::load()?;
            println!("Facility:      {}", config.facility_id);
            match config.remote() {
                Some(remote) => {
                    println!("Backend:       supabase ({})", remote.base_url);
                    println!("API key:       {}", utils::mask_api_key(&remote.api_key));
                }
                None => {
                    let dir = config
                        .store_dir()
                        .map(|d| d.display().to_string())
                        .unwrap_or_else(|| "unavailable".to_string());
                    println!("Backend:       local ({})", dir);
                }
            }
            println!("Tick interval: {}ms", config.tick_interval_ms);
        }
        ConfigCommand::Init {
            facility,
            supabase_url,
            api_key,
        } => {
            let mut config = Config::new(facility);
            config.supabase_url = supabase_url;
            config.api_key = api_key;
            config.validate()?;
            let path = config.save()?;
            println!("Configuration written to {}", path.display());
        }
    }
    Ok(())
}

fn print_catalog(catalog: &ActivityCatalog) {
    println!(
        "{} {} {:>6} {:>6} {:>5}  {}",
        utils::pad_to_width("CODE", 16),
        utils::pad_to_width("LABEL", 20),
        "WARN",
        "MAX",
        "SORT",
        "FLAGS"
    );
    for def in catalog.definitions() {
        let mut flags = Vec::new();
        if def.is_custom {
            flags.push("custom");
        }
        if def.show_in_quick_log {
            flags.push("quick-log");
        }
        println!(
            "{} {} {:>6} {:>6} {:>5}  {}",
            utils::pad_to_width(&utils::truncate_string(&def.code, 16), 16),
            utils::pad_to_width(&utils::truncate_string(&def.label, 20), 20),
            utils::format_minutes(def.warning_minutes),
            utils::format_minutes(def.max_minutes),
            def.sort_order,
            flags.join(",")
        );
    }
}

fn status_marker(status: TimerStatus) -> &'static str {
    match status {
        TimerStatus::Normal => "  ",
        TimerStatus::Warning => "! ",
        TimerStatus::Urgent => "!!",
    }
}

fn board_line(row: &BoardRow) -> String {
    format!(
        "{} {} {} {} {} {:<7} {}",
        status_marker(row.timer.status),
        utils::pad_to_width(&utils::truncate_string(&row.activity.dog_id, 14), 14),
        utils::pad_to_width(&utils::truncate_string(&row.definition.label, 16), 16),
        utils::format_elapsed(row.timer.elapsed_seconds),
        utils::progress_bar(row.timer.progress, 10),
        row.timer.status.as_str(),
        row.activity.id
    )
}

fn print_board(rows: &[BoardRow]) {
    if rows.is_empty() {
        println!("No activities in progress.");
        return;
    }
    for row in rows {
        println!("{}", board_line(row));
    }
}

/// Stream the board to stdout on every tick until Ctrl-C
async fn watch_plain(workflow: &Workflow, period: std::time::Duration) -> Result<()> {
    let mut feed = BoardFeed::new(workflow, BOARD_RELOAD_INTERVAL);
    let mut handle = ticker::spawn_with(period, |now| now);

    loop {
        tokio::select! {
            now = handle.next() => {
                let Some(now) = now else { break };
                match feed.rows(now).await {
                    Ok(rows) => {
                        println!("--- {} ---", chrono::Local::now().format("%H:%M:%S"));
                        print_board(&rows);
                    }
                    Err(e) => eprintln!("Warning: could not reload activities: {}", e),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                handle.cancel();
                break;
            }
        }
    }

    Ok(())
}
