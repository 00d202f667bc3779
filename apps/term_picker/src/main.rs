use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{config::load_settings, render, SearchController, SearchView};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast::error::RecvError,
};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{dispatch, Outcome, PickerCommand};
use output::format_view;

#[derive(Parser, Debug)]
#[command(about = "Search the term catalog and pick one term")]
struct Args {
    /// Term collection base URL, e.g. http://127.0.0.1:8000/terms/
    #[arg(long)]
    base_url: Option<String>,
    /// Text currently selected in the editor; seeds the search box.
    #[arg(long, default_value = "")]
    selected_text: String,
    #[arg(long)]
    query: Option<String>,
    /// Tag to filter by; repeat for several.
    #[arg(long = "tag")]
    tags: Vec<String>,
    /// Pick this term id once results are loaded and print the annotation.
    #[arg(long)]
    select: Option<String>,
    /// Read commands from stdin instead of exiting after the first render.
    #[arg(long, short)]
    interactive: bool,
    #[arg(long, default_value_t = 15)]
    wait_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings();
    if let Some(base_url) = args.base_url.clone() {
        settings.base_url = base_url;
    }
    let controller = SearchController::from_settings(&settings)
        .with_context(|| format!("failed to set up catalog client for {}", settings.base_url))?;
    let wait = Duration::from_secs(args.wait_secs);

    let result = run(&controller, &args, wait).await;
    controller.teardown().await;
    result
}

async fn run(controller: &Arc<SearchController>, args: &Args, wait: Duration) -> Result<()> {
    let initial = (!args.selected_text.is_empty()).then_some(args.selected_text.as_str());
    controller.open(initial).await;
    if let Some(query) = &args.query {
        controller.set_query(query).await;
    }
    for tag in &args.tags {
        controller.toggle_tag(tag).await;
    }
    let view = wait_until_settled(controller, wait).await?;

    if !args.interactive {
        println!("{}", format_view(&view));
        if let Some(raw_id) = &args.select {
            let annotation = controller.select_term(raw_id, &args.selected_text).await?;
            println!("{}", serde_json::to_string_pretty(&annotation)?);
        }
        return Ok(());
    }

    println!("{}", format_view(&view));
    println!("{}", commands::HELP);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match PickerCommand::parse(&line) {
            Ok(command) => command,
            Err(message) => {
                eprintln!("{message}");
                continue;
            }
        };
        match dispatch(controller, command, &args.selected_text).await {
            Outcome::Continue => {
                let view = wait_until_settled(controller, wait).await?;
                println!("{}", format_view(&view));
            }
            Outcome::Message(message) => println!("{message}"),
            Outcome::Picked(annotation) => {
                println!("{}", serde_json::to_string_pretty(&annotation)?);
                return Ok(());
            }
            Outcome::Quit => return Ok(()),
        }
    }
    Ok(())
}

/// Waits until the typed query has been searched and both collections have
/// answered, then renders that state.
async fn wait_until_settled(controller: &SearchController, wait: Duration) -> Result<SearchView> {
    let mut views = controller.subscribe_views();
    tokio::time::timeout(wait, async {
        loop {
            let state = controller.snapshot().await;
            if state.is_settled() || state.closed {
                return render(&state);
            }
            match views.recv().await {
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "view stream lagged");
                }
                Err(RecvError::Closed) => return render(&state),
            }
        }
    })
    .await
    .context("timed out waiting for the catalog")
}
