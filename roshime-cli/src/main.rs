use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use roshime::{
    FileTokenStore, GalleryTransport, HttpTransport, LoginView, MemoriesView, Navigator, Route,
    SessionContext, SessionGate,
};
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;

use crate::config::Settings;

#[derive(Parser)]
#[command(name = "roshime", about = "Browse the Roshime memory gallery from a terminal")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in and store the session token
    Login { username: String, password: String },
    /// List memories and the current background
    Memories,
    /// Open the detail view of the memory at INDEX
    Show { index: usize },
    /// React to the memory on slide N (default 0)
    React {
        emoji: String,
        #[arg(long, default_value_t = 0)]
        slide: isize,
    },
    /// Comment on the memory at INDEX
    Comment { index: usize, text: String },
    /// Forget the session token
    Logout,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let settings = Settings::new()?;
    init_tracing(settings.logging.json);

    let cli = Cli::parse();
    let options = settings.gallery_options();
    let token_file = settings.token_file();
    info!(
        "Using backend {} with session file {}",
        options.base_url,
        token_file.display()
    );

    let transport: Arc<dyn GalleryTransport> = Arc::new(HttpTransport::new(&options)?);
    let ctx = SessionContext::new(
        Arc::new(FileTokenStore::new(token_file)),
        Navigator::new(Route::Login),
        options.token_key.clone(),
    );

    match cli.command {
        Command::Login { username, password } => {
            let login = LoginView::new(
                transport,
                SessionGate::new(ctx.clone()),
                options.welcome_delay,
            );
            if let Err(e) = login.submit(&username, &password).await {
                print_json(&json!({ "login": login.state() }))?;
                return Err(e.into());
            }
            print_json(&json!({ "login": login.state() }))?;
            ctx.navigator().wait_for(Route::Memories).await;
            print_json(&json!({ "route": ctx.navigator().current() }))?;
        },
        Command::Memories => {
            let view = MemoriesView::new(transport, ctx, &options);
            view.enter().await?;
            print_json(&view.snapshot())?;
        },
        Command::Show { index } => {
            let view = MemoriesView::new(transport, ctx, &options);
            view.enter().await?;
            let memory = view
                .store()
                .get_index(index)
                .with_context(|| format!("no memory at index {index}"))?;
            view.open_detail(memory.sequence_id);
            print_json(&view.snapshot())?;
        },
        Command::React { emoji, slide } => {
            let view = MemoriesView::new(transport, ctx, &options);
            view.enter().await?;
            view.advance_to(slide);
            let outcome = view.react(&emoji).await;
            print_json(&json!({
                "view": view.snapshot(),
                "notifications": view.notifier().recent(),
            }))?;
            outcome?;
        },
        Command::Comment { index, text } => {
            let view = MemoriesView::new(transport, ctx, &options);
            view.enter().await?;
            let memory = view
                .store()
                .get_index(index)
                .with_context(|| format!("no memory at index {index}"))?;
            view.open_detail(memory.sequence_id);
            let outcome = view.add_comment(&text).await;
            print_json(&json!({
                "view": view.snapshot(),
                "notifications": view.notifier().recent(),
            }))?;
            outcome?;
        },
        Command::Logout => {
            SessionGate::new(ctx.clone()).logout();
            print_json(&json!({ "route": ctx.navigator().current() }))?;
        },
    }

    Ok(())
}

fn init_tracing(json: bool) {
    let filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    let layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(layer)
            .init();
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
