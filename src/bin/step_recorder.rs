//! step-recorder CLI
//!
//! Inspect the locators and statements generated for an element of a saved
//! HTML page, or record a live browsing session into a Playwright test.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use step_recorder::browser::{BrowserSession, LaunchOptions, PageRecorder};
use step_recorder::capture::{
    CaptureConfig, CaptureNotice, CaptureSession, CaptureStore, JsonFileStore, MemoryStore, PlaywrightFileWriter,
};
use step_recorder::codegen::{Action, ActionKind, ActionValue, Assertion, AssertionKind};
use step_recorder::dom::Page;
use step_recorder::locator::generate_candidates;

#[derive(Parser)]
#[command(name = "step-recorder")]
#[command(version)]
#[command(about = "Record page interactions as Playwright test steps", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print ranked locators for an element of a saved page
    Locators {
        /// HTML file to load
        #[arg(long, value_name = "FILE")]
        html: PathBuf,

        /// CSS selector of the element; the first match is used
        #[arg(long, short = 's')]
        selector: String,

        /// Leave out the visible-text strategy
        #[arg(long)]
        exclude_text: bool,
    },

    /// Print action or assertion statements for an element of a saved page
    Commands {
        #[arg(long, value_name = "FILE")]
        html: PathBuf,

        #[arg(long, short = 's')]
        selector: String,

        /// Action kind, e.g. click, fill, selectOption
        #[arg(long, default_value = "click", conflicts_with = "assert")]
        action: String,

        /// Assertion kind, e.g. toBeVisible, toHaveText
        #[arg(long)]
        assert: Option<String>,

        /// Value for fill, type, press, selectOption and text assertions
        #[arg(long)]
        value: Option<String>,
    },

    /// Record interactions in a browser until Ctrl+C, then write a test
    Record {
        /// Page to start on
        #[arg(long)]
        url: String,

        /// Launch browser in headed mode (default: headless)
        #[arg(long, short = 'H')]
        headed: bool,

        /// JSON file holding capture state; kept in memory when omitted
        #[arg(long, value_name = "FILE")]
        store: Option<PathBuf>,

        /// Directory the test is written to
        #[arg(long, short = 'o', default_value = "tests")]
        output: PathBuf,

        /// Test name
        #[arg(long, short = 'n', default_value = "recorded flow")]
        name: String,

        /// JSON file with capture settings
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Interval between event polls in milliseconds
        #[arg(long, default_value = "200")]
        poll_ms: u64,
    },
}

fn parse_kind<T: serde::de::DeserializeOwned>(name: &str) -> Result<T> {
    serde_json::from_value(Value::String(name.to_string())).with_context(|| format!("Unknown kind '{}'", name))
}

fn load_page(path: &PathBuf) -> Result<Page> {
    let html = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(Page::parse(&html))
}

fn print_locators(html: PathBuf, selector: String, exclude_text: bool) -> Result<()> {
    let page = load_page(&html)?;
    let Some(element) = page.select_first(&selector) else {
        bail!("No element matches '{}'", selector);
    };

    for candidate in generate_candidates(&page, element, exclude_text, None) {
        println!("{:<16} {}", candidate.strategy.to_string(), candidate.expression);
    }
    Ok(())
}

fn print_commands(
    html: PathBuf,
    selector: String,
    action: String,
    assert: Option<String>,
    value: Option<String>,
) -> Result<()> {
    let page = load_page(&html)?;
    let Some(element) = page.select_first(&selector) else {
        bail!("No element matches '{}'", selector);
    };

    let statements = match assert {
        Some(kind) => {
            let assertion = Assertion::from_kind(parse_kind::<AssertionKind>(&kind)?, value.as_deref())?;
            step_recorder::codegen::assertions_for_element(&page, element, &assertion, None)
        }
        None => {
            let action = Action::from_kind(parse_kind::<ActionKind>(&action)?, value.map(ActionValue::Text), None)?;
            step_recorder::codegen::commands_for_element(&page, element, &action, None)
        }
    };

    if statements.is_empty() {
        eprintln!("No locator could be generated for '{}'", selector);
    }
    for statement in statements {
        println!("{}", statement);
    }
    Ok(())
}

async fn record(
    url: String,
    headed: bool,
    store: Option<PathBuf>,
    output: PathBuf,
    name: String,
    config: Option<PathBuf>,
    poll_ms: u64,
) -> Result<()> {
    let config = match config {
        Some(path) => CaptureConfig::from_json_file(&path).with_context(|| format!("Failed to load {}", path.display()))?,
        None => CaptureConfig::default(),
    };
    let store: Arc<dyn CaptureStore> = match store {
        Some(path) => Arc::new(JsonFileStore::new(path)),
        None => Arc::new(MemoryStore::new()),
    };

    let browser = BrowserSession::launch(LaunchOptions::new().headless(!headed))?;
    browser.navigate(&url)?;
    browser.wait_for_navigation()?;

    let recorder = Arc::new(PageRecorder::new(browser.tab()?));
    let mut session = CaptureSession::new(config, store, recorder.clone());
    let mut notices = session.subscribe();
    session.start(&browser.snapshot_page()?)?;

    eprintln!("Recording on {} (press Ctrl+C to finish)", url);

    let mut interval = tokio::time::interval(Duration::from_millis(poll_ms.max(10)));
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            _ = interval.tick() => {
                if let Err(e) = recorder.poll(&mut session) {
                    log::warn!("Poll failed: {}", e);
                }
            }
        }

        while let Ok(notice) = notices.try_recv() {
            match notice {
                CaptureNotice::StepCaptured { index, step } => {
                    eprintln!("#{:<3} {}", index, step.selected_command().unwrap_or_default());
                }
                CaptureNotice::Restored { steps } => eprintln!("Capture restored with {} steps", steps.len()),
                CaptureNotice::LimitReached { max_steps } => eprintln!("Step limit of {} reached", max_steps),
                CaptureNotice::Stopped { steps } => eprintln!("Stopped with {} steps", steps),
            }
        }
    }

    if !session.is_capturing() {
        bail!("Capture ended early: the browser left {}", url);
    }
    session.flush_pending();
    session.stop()?;
    let location = session.create_test(&name, &PlaywrightFileWriter::new(output))?;
    println!("{}", location);

    browser.close()?;
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Locators {
            html,
            selector,
            exclude_text,
        } => print_locators(html, selector, exclude_text),
        Command::Commands {
            html,
            selector,
            action,
            assert,
            value,
        } => print_commands(html, selector, action, assert, value),
        Command::Record {
            url,
            headed,
            store,
            output,
            name,
            config,
            poll_ms,
        } => record(url, headed, store, output, name, config, poll_ms).await,
    }
}
