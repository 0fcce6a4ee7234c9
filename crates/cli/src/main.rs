use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use dishcovery_engine::{Engine, PhrasebookModel};
use dishcovery_protocol::{ChatMessage, ChatRequest, ChatResponse, ConversationState, RestaurantCard};
use dishcovery_store::MemoryStore;

mod seed;

#[derive(Parser)]
#[command(name = "dishcovery")]
#[command(about = "Conversational restaurant and dish discovery", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// JSON seed file with restaurants and tags (built-in demo data when omitted)
    #[arg(long, global = true)]
    seed: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive conversation (the default)
    Chat,
    /// One turn, JSON response on stdout
    Ask {
        /// The user's message
        text: String,
        /// Conversation state JSON from a previous response
        #[arg(long)]
        state: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let (restaurants, tags) = match &cli.seed {
        Some(path) => seed::load(path)?,
        None => seed::demo(),
    };
    let store = Arc::new(MemoryStore::new(restaurants, tags));
    let engine = Engine::new(store, Arc::new(PhrasebookModel));

    match cli.command {
        Some(Commands::Ask { text, state }) => ask_once(&engine, &text, state.as_deref()).await,
        Some(Commands::Chat) | None => chat_loop(&engine).await,
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

/// One turn in, full JSON response out; the caller keeps the state.
async fn ask_once(engine: &Engine, text: &str, state_json: Option<&str>) -> Result<()> {
    let state: ConversationState = match state_json {
        Some(raw) => serde_json::from_str(raw)?,
        None => ConversationState::default(),
    };
    let response = engine
        .handle(ChatRequest {
            messages: vec![ChatMessage::user(text)],
            state,
            ui_action: None,
        })
        .await;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

async fn chat_loop(engine: &Engine) -> Result<()> {
    println!("dishcovery — ask for a dish, a diet, or a restaurant. Ctrl-D or :q to quit.");
    let mut state = ConversationState::default();
    let mut history: Vec<ChatMessage> = Vec::new();

    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;
        let Some(line) = stdin.lock().lines().next() else {
            break;
        };
        let line = line?;
        let text = line.trim();
        if text == ":q" {
            break;
        }
        if text.is_empty() {
            continue;
        }

        history.push(ChatMessage::user(text));
        let response = engine
            .handle(ChatRequest {
                messages: history.clone(),
                state: state.clone(),
                ui_action: None,
            })
            .await;
        render(&response);
        history.push(ChatMessage::assistant(response.message.content.clone()));
        state = response.state;
    }
    Ok(())
}

fn render(response: &ChatResponse) {
    println!("{}", response.message.content);
    for card in &response.message.restaurants {
        render_card(card);
    }
    if !response.message.followup_chips.is_empty() {
        println!("  [{}]", response.message.followup_chips.join(" | "));
    }
}

fn render_card(card: &RestaurantCard) {
    let mut line = format!("• {} ({})", card.name, card.city);
    if let (Some(shown), Some(total)) = (card.shown, card.total) {
        if shown < total {
            line.push_str(&format!(" — showing {shown} of {total}"));
        }
    }
    println!("{line}");
    for dish in &card.dishes {
        let price = dish
            .price_minor
            .map(|p| format!(" — {} kr", p / 100))
            .unwrap_or_default();
        let desc = dish
            .description
            .as_deref()
            .map(|d| format!(" ({d})"))
            .unwrap_or_default();
        println!("    {}{price}{desc}", dish.name);
    }
}
