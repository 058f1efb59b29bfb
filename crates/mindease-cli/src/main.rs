use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use clap::{Parser, Subcommand, ValueEnum};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

use mindease_core::tips::SUGGESTIONS;
use mindease_core::{
    ChatRole, ChatSession, Config, DailyTipScheduler, GeminiClient, GenerationClient, NotifyError,
    SchedulerOptions, TipCatalog, TipNotifier, TipsSession, TipsState, UserSession,
};

#[derive(Parser)]
#[command(name = "mindease")]
#[command(about = "AI chat and daily wellness tips in your terminal")]
struct Cli {
    /// Gemini model to use (overrides the config file)
    #[arg(long, global = true)]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the assistant (interactive when no message is given)
    Chat {
        /// Message to send
        message: Option<String>,
        /// Name used in the greeting
        #[arg(long)]
        name: Option<String>,
    },
    /// Generate one personalized tip
    Tip {
        /// How you are feeling right now
        #[arg(short, long)]
        mood: Option<String>,
        /// What is going on
        #[arg(short, long)]
        context: Option<String>,
        /// Morning or evening routine tip
        #[arg(long, value_enum, conflicts_with_all = ["mood", "context"])]
        preset: Option<TimePreset>,
    },
    /// Generate a batch of tips for a category
    Category {
        /// Category name, e.g. "Sleep"
        #[arg(required_unless_present = "preset")]
        name: Option<String>,
        #[arg(long, value_enum, conflicts_with = "name")]
        preset: Option<CategoryPreset>,
    },
    /// List the bundled daily tips
    Tips {
        /// Only show tips containing this text
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Show conversation starters
    Suggestions,
    /// Deliver a random tip on a schedule until Ctrl-C
    Daily {
        /// Period in seconds (defaults to the configured hours)
        #[arg(long)]
        every_secs: Option<u64>,
    },
    /// Save a Gemini API key to the config file
    SetKey { key: String },
}

#[derive(Clone, Copy, ValueEnum)]
enum TimePreset {
    Morning,
    Evening,
}

#[derive(Clone, Copy, ValueEnum)]
enum CategoryPreset {
    Stress,
    Anxiety,
    Depression,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let config = Config::load().unwrap_or_else(|err| {
        tracing::warn!("could not read config, using defaults: {err:#}");
        Config::new()
    });

    match cli.command {
        Commands::Chat { message, name } => {
            let session = ChatSession::new(
                build_client(&config, cli.model.as_deref()),
                name.map(|n| UserSession::new(Some(&n), None)),
            );
            match message {
                Some(message) => {
                    session.send_message(&message).await;
                    print_last_reply(&session, 0);
                }
                None => chat_loop(&session).await?,
            }
        }
        Commands::Tip { mood, context, preset } => {
            let session = TipsSession::new(
                build_client(&config, cli.model.as_deref()),
                &load_catalog(&config),
            );
            match preset {
                Some(TimePreset::Morning) => session.generate_morning_tip().await,
                Some(TimePreset::Evening) => session.generate_evening_tip().await,
                None => {
                    session
                        .generate_personalized_tip(mood.as_deref(), context.as_deref())
                        .await
                }
            }
            print_generated(&session.snapshot());
        }
        Commands::Category { name, preset } => {
            let session = TipsSession::new(
                build_client(&config, cli.model.as_deref()),
                &load_catalog(&config),
            );
            match (preset, name) {
                (Some(CategoryPreset::Stress), _) => session.generate_stress_relief_tip().await,
                (Some(CategoryPreset::Anxiety), _) => session.generate_anxiety_tip().await,
                (Some(CategoryPreset::Depression), _) => session.generate_depression_tip().await,
                (None, name) => {
                    session
                        .generate_tips_by_category(name.as_deref().unwrap_or_default())
                        .await
                }
            }
            print_generated(&session.snapshot());
        }
        Commands::Tips { search } => {
            let catalog = load_catalog(&config);
            let mut state = TipsState::default();
            state.set_static_tips(catalog.to_tips());
            let tips = state.search(search.as_deref().unwrap_or_default());
            if tips.is_empty() {
                println!("No tips found");
            }
            for tip in tips {
                println!("{:>3}. {}", tip.id, tip.text);
            }
        }
        Commands::Suggestions => {
            for (i, suggestion) in SUGGESTIONS.iter().enumerate() {
                println!("{:>2}. {}", i + 1, suggestion);
            }
            println!("\nTry: mindease tip --context \"{}\"", SUGGESTIONS[0]);
        }
        Commands::Daily { every_secs } => {
            let options = SchedulerOptions {
                period: every_secs
                    .filter(|secs| *secs > 0)
                    .map(Duration::from_secs)
                    .unwrap_or_else(|| config.daily_tip_period()),
                ..SchedulerOptions::default()
            };
            let mut scheduler = DailyTipScheduler::new(options);
            scheduler.enable(Arc::new(load_catalog(&config)), Arc::new(ConsoleNotifier));
            println!("Daily tips every {}s. Press Ctrl-C to stop.", options.period.as_secs());

            tokio::signal::ctrl_c().await?;
            scheduler.disable();
        }
        Commands::SetKey { key } => {
            Config::save_api_key(&key)?;
            println!("API key saved to {}", Config::get_config_path()?.display());
        }
    }

    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_client(config: &Config, model: Option<&str>) -> Arc<dyn GenerationClient> {
    let api_key = config.resolved_api_key().unwrap_or_default();
    let model = model.unwrap_or_else(|| config.model());
    info!(model, "using Gemini model");
    Arc::new(GeminiClient::with_endpoint(&api_key, config.base_url(), model))
}

fn load_catalog(config: &Config) -> TipCatalog {
    match &config.tips_path {
        Some(path) => TipCatalog::load(path).unwrap_or_else(|err| {
            tracing::warn!("falling back to bundled tips: {err:#}");
            TipCatalog::bundled()
        }),
        None => TipCatalog::bundled(),
    }
}

async fn chat_loop(session: &ChatSession) -> Result<()> {
    println!("{}", session.greeting());
    println!("Type a message, or 'exit' to quit.\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        if matches!(line.trim(), "exit" | "quit") {
            break;
        }

        let before = session.snapshot().history.len();
        session.send_message(&line).await;
        print_last_reply(session, before);
    }

    let replies = session
        .snapshot()
        .messages()
        .iter()
        .filter(|m| m.role == ChatRole::Assistant)
        .count();
    println!("\nTake care. ({replies} replies this session)");
    Ok(())
}

fn print_last_reply(session: &ChatSession, before: usize) {
    let state = session.snapshot();
    if let Some(error) = &state.error {
        eprintln!("Error: {error}");
        session.clear_error();
        return;
    }
    if state.history.len() > before {
        if let Some(entry) = state.history.last() {
            println!("\n{}\n", entry.reply);
        }
    }
}

fn print_generated(state: &TipsState) {
    if let Some(error) = &state.error {
        eprintln!("Error: {error}");
        return;
    }
    for tip in &state.generated {
        println!("[{}] {}\n", tip.category, tip.text);
    }
}

struct ConsoleNotifier;

#[async_trait]
impl TipNotifier for ConsoleNotifier {
    async fn notify(&self, tip: &str) -> Result<(), NotifyError> {
        let mut stdout = std::io::stdout();
        writeln!(
            stdout,
            "\n[{}] Daily tip: {}",
            chrono::Local::now().format("%H:%M"),
            tip
        )
        .map_err(|err| NotifyError(err.to_string()))
    }
}
