//! Daemon CLI: personality context, content analysis, and feed processing over JSON files.
//!
//! Usage:
//!   daemon-cli context <traits.json> [--current <archetype_id>]
//!   daemon-cli analyze <request.json>
//!   daemon-cli feed <payload.json> --daemons <daemons.json> [--signature <hex>] [--headers <headers.json>]
//!   daemon-cli evolve <traits.json> [--stage <Egg|Baby|Teen|Adult>] [--current <archetype_id>]
//!   daemon-cli name <traits.json> [--current <archetype_id>]
//!
//! Results go to stdout as JSON; logs go to stderr (`RUST_LOG`, default `info`).
//! Configuration: `DAEMON_CONFIG` or `config/daemon.toml`, then `DAEMON_*` env vars.

use daemon_core::prompts::{build_evolution_prompt, build_name_prompt};
use daemon_core::{DaemonConfig, EvolutionStage, PersonalityBuilder, TraitVector};
use daemon_feed::{
    header_signature, mock_name, AnalysisService, AnalyzeRequest, DaemonRecord, FeedPipeline,
    SIGNATURE_HEADER,
};
use daemon_llm::ProviderRegistry;
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type CliResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

struct Args {
    command: String,
    input: Option<String>,
    flags: HashMap<String, String>,
}

impl Args {
    fn parse() -> Self {
        let mut args = std::env::args().skip(1);
        let command = args.next().unwrap_or_default();
        let mut input = None;
        let mut flags = HashMap::new();
        while let Some(a) = args.next() {
            match a.strip_prefix("--") {
                Some(flag) => {
                    if let Some(v) = args.next() {
                        flags.insert(flag.to_string(), v);
                    }
                }
                None if input.is_none() => input = Some(a),
                None => {}
            }
        }
        Self {
            command,
            input,
            flags,
        }
    }

    fn input(&self) -> CliResult<&str> {
        self.input
            .as_deref()
            .ok_or_else(|| format!("`{}` needs an input file", self.command).into())
    }

    fn flag(&self, name: &str) -> Option<&str> {
        self.flags.get(name).map(String::as_str)
    }
}

fn usage() {
    eprintln!("Daemon CLI");
    eprintln!("  context <traits.json> [--current ID]        Personality context + UI payload");
    eprintln!("  analyze <request.json>                      Analyze content (model or mock)");
    eprintln!("  feed <payload.json> --daemons <file>        Process an inbound email webhook body");
    eprintln!("       [--signature HEX] [--headers FILE]  (headers: captured request headers,");
    eprintln!("                                         signature read from {})", SIGNATURE_HEADER);
    eprintln!("  evolve <traits.json> [--stage S] [--current ID]  Next stage + sprite prompt");
    eprintln!("  name <traits.json> [--current ID]           Placeholder name + naming prompt");
    eprintln!();
    eprintln!("traits.json: {{\"Humor\": 9, ...}} or {{\"values\": {{...}}}}");
}

#[tokio::main]
async fn main() -> CliResult<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let config = DaemonConfig::load()?;
    tracing::debug!(command = %args.command, mock_mode = config.mock_mode, "daemon-cli starting");

    let output = match args.command.as_str() {
        "context" => context(&args, &config)?,
        "analyze" => analyze(&args, &config).await?,
        "feed" => feed(&args, &config).await?,
        "evolve" => evolve(&args, &config)?,
        "name" => name(&args, &config)?,
        _ => {
            usage();
            return Ok(());
        }
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn read_json(path: &str) -> CliResult<Value> {
    let text = std::fs::read_to_string(path).map_err(|e| format!("read {}: {}", path, e))?;
    Ok(serde_json::from_str(&text)?)
}

/// Accepts a bare `{Trait: n}` map or a `{"values": {...}}` wrapper.
fn read_traits(path: &str) -> CliResult<TraitVector> {
    let value = read_json(path)?;
    let map = value
        .get("values")
        .unwrap_or(&value)
        .as_object()
        .ok_or("traits file must be a JSON object")?;
    let mut raw = Vec::with_capacity(map.len());
    for (name, v) in map {
        let n = v
            .as_i64()
            .ok_or_else(|| format!("trait {} must be an integer", name))?;
        raw.push((name.as_str(), n));
    }
    Ok(TraitVector::try_from_raw(raw)?)
}

fn context(args: &Args, config: &DaemonConfig) -> CliResult<Value> {
    let traits = read_traits(args.input()?)?;
    let ctx = PersonalityBuilder::new(config.persona).build(&traits, args.flag("current"));
    Ok(json!({
        "archetypeId": ctx.archetype_id(),
        "similarity": ctx.similarity(),
        "description": ctx.description(),
        "promptSection": ctx.prompt_section(),
        "ui": ctx.ui_payload(),
        "uxMetadata": ctx.ux_metadata(),
    }))
}

async fn analyze(args: &Args, config: &DaemonConfig) -> CliResult<Value> {
    let request: AnalyzeRequest = serde_json::from_value(read_json(args.input()?)?)?;
    let service = AnalysisService::from_config(config, &ProviderRegistry::from_env());
    let response = service.analyze(&request).await?;
    Ok(serde_json::to_value(response)?)
}

async fn feed(args: &Args, config: &DaemonConfig) -> CliResult<Value> {
    let path = args.input()?;
    let body = std::fs::read(path).map_err(|e| format!("read {}: {}", path, e))?;
    let daemons_path = args.flag("daemons").ok_or("`feed` needs --daemons <file>")?;
    let daemons: Vec<DaemonRecord> = serde_json::from_value(read_json(daemons_path)?)?;
    let headers = match args.flag("headers") {
        Some(p) => read_json(p)?,
        None => Value::Null,
    };
    let signature = args
        .flag("signature")
        .or_else(|| headers.as_object().and_then(header_signature));

    let service = AnalysisService::from_config(config, &ProviderRegistry::from_env());
    let pipeline = FeedPipeline::from_config(config, service);
    let outcome = pipeline
        .process(&body, signature, &daemons)
        .await?;
    tracing::info!(ack = %outcome.ack(), "Feed processed");
    Ok(serde_json::to_value(outcome)?)
}

fn evolve(args: &Args, config: &DaemonConfig) -> CliResult<Value> {
    let traits = read_traits(args.input()?)?;
    let stage = match args.flag("stage") {
        Some(s) => s.parse::<EvolutionStage>()?,
        None => EvolutionStage::default(),
    };
    let next = stage.next();
    let builder = PersonalityBuilder::new(config.persona);
    Ok(json!({
        "currentStage": stage.as_str(),
        "nextStage": next.as_str(),
        "prompt": build_evolution_prompt(next, &traits, args.flag("current"), &builder),
    }))
}

fn name(args: &Args, config: &DaemonConfig) -> CliResult<Value> {
    let traits = read_traits(args.input()?)?;
    let builder = PersonalityBuilder::new(config.persona);
    let suggestion = mock_name(&traits);
    Ok(json!({
        "name": suggestion.name,
        "rationale": suggestion.rationale,
        "prompt": build_name_prompt(&traits, args.flag("current"), &builder),
    }))
}
