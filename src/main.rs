use clap::Parser;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use log::info;
use std::io::Read;
use std::path::Path;

mod config;
mod feed;
mod logger;
mod models;
mod selector;
mod skill;
mod speech;
mod token;

use config::Config;
use feed::{FeedSource, FileFeed, GraphFeed};
use selector::SystemClock;
use skill::{RequestEnvelope, Skill};
use token::RegexTokenParser;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// YAML configuration file
    #[arg(short, long, default_value = "skill.yaml")]
    config: String,

    /// Voice request envelope to handle (`-` reads stdin)
    #[arg(short, long)]
    request: Option<String>,

    /// Look up this day (YYYY-MM-DD) instead of the next upcoming post
    #[arg(short, long)]
    date: Option<NaiveDate>,

    /// Read the feed from a JSON file instead of the Graph API
    #[arg(short, long)]
    feed_file: Option<String>,

    #[arg(long)]
    log_level: Option<String>,

    #[arg(long)]
    log_file: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut config = Config::load(&args.config)?;

    // CLI flags beat the config file
    if let Some(level) = &args.log_level {
        config.log.level = level.clone();
    }
    if let Some(file) = &args.log_file {
        config.log.file = Some(file.clone());
    }
    logger::init(logger::LogConfig::from(&config.log))?;

    if !Path::new(&args.config).exists() {
        info!("Config file does not exist, using defaults: {}", args.config);
    }

    let output = match args.feed_file.clone() {
        Some(path) => run(&args, config, FileFeed::new(path)).await?,
        None => {
            let feed = GraphFeed::new(config.feed.clone());
            run(&args, config, feed).await?
        }
    };
    println!("{}", output);

    Ok(())
}

/// Handle one request envelope, or answer a single lookup, and return what to print.
async fn run<F: FeedSource>(args: &Args, config: Config, feed: F) -> Result<String> {
    let parser = RegexTokenParser::new(&config.selection.token_pattern)?;
    let skill = Skill::new(config, feed, Box::new(parser), Box::new(SystemClock));

    match &args.request {
        Some(source) => {
            let body = read_request(source)?;
            let envelope: RequestEnvelope = serde_json::from_str(&body)
                .with_context(|| format!("Invalid request envelope: {}", source))?;
            let response = skill.handle(envelope).await?;
            info!("Speech: {}", response.speech_text().unwrap_or("<none>"));
            Ok(serde_json::to_string_pretty(&response)?)
        }
        None => Ok(skill.answer(args.date).await),
    }
}

fn read_request(source: &str) -> Result<String> {
    if source == "-" {
        let mut body = String::new();
        std::io::stdin().read_to_string(&mut body)?;
        Ok(body)
    } else {
        std::fs::read_to_string(source).with_context(|| format!("Failed to read request: {}", source))
    }
}
