//! Bedside CLI entry point.
//!
//! Provides `chat`, `check`, and `personas` subcommands for running an
//! interactive consultation, verifying the local environment, or listing the
//! available patient personas.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use bedside::config::BedsideConfig;
use bedside::consult::ConsultEngine;
use bedside::personas::load_personas;
use bedside::pipeline::{clean_patient_response, format_prompt};
use bedside::providers::ollama::OllamaProvider;
use bedside::providers::CompletionProvider;
use bedside::session::ConsultSession;
use bedside::speech::{HttpSpeech, NullSpeech, SpeechSynthesizer};

/// Bedside — terminal virtual-patient consultation simulator.
#[derive(Parser)]
#[command(name = "bedside", version, about)]
struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

/// Available CLI subcommands.
#[derive(Subcommand)]
enum Command {
    /// Run an interactive consultation in the terminal.
    Chat,
    /// Verify Ollama, the patient model, and the speech service, then exit.
    Check,
    /// List the available patient personas.
    Personas,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Command::Chat => handle_chat().await,
        Command::Check => handle_check().await,
        Command::Personas => handle_personas(),
    }
}

/// Build the Ollama provider from config.
fn build_provider(config: &BedsideConfig) -> anyhow::Result<OllamaProvider> {
    OllamaProvider::new(
        &config.ollama.base_url,
        &config.ollama.model,
        config.generation.clone(),
        Duration::from_secs(config.ollama.timeout_seconds),
    )
    .context("failed to build Ollama client")
}

/// Build the speech synthesizer from config: HTTP-backed when enabled,
/// a no-op otherwise.
fn build_speech(config: &BedsideConfig) -> anyhow::Result<Arc<dyn SpeechSynthesizer>> {
    if !config.speech.enabled {
        info!("speech synthesis disabled");
        return Ok(Arc::new(NullSpeech));
    }
    let speech = HttpSpeech::new(
        &config.speech.base_url,
        Duration::from_secs(config.speech.timeout_seconds),
    )
    .context("failed to build speech client")?;
    Ok(Arc::new(speech))
}

/// Run the interactive consultation loop.
async fn handle_chat() -> anyhow::Result<()> {
    let config = BedsideConfig::load().context("failed to load configuration")?;
    let _logging_guard = bedside::logging::init_production(Path::new(&config.paths.logs_dir))?;

    let personas = load_personas(&config.personas);
    let provider = build_provider(&config)?;
    let speech = build_speech(&config)?;

    if !provider.is_available().await {
        warn!(url = %config.ollama.base_url, "Ollama is not reachable; turns will fail until it is started");
    }

    let engine = ConsultEngine::new(
        Arc::new(provider),
        speech,
        config.session.prompt_window,
    );

    // Personas list is never empty, but avoid indexing on faith.
    let first_persona = personas
        .first()
        .map(String::as_str)
        .unwrap_or("adult patient presenting for a routine check-up");
    let mut session = ConsultSession::new(first_persona, config.session.history_cap);

    println!("Bedside — virtual patient consultation");
    println!("Patient: {}", session.persona());
    println!("Commands: /personas, /persona <n>, /reset, /quit");
    println!();

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        print!("Doctor> ");
        std::io::stdout().flush().context("failed to flush stdout")?;

        let Some(line) = lines.next_line().await.context("failed to read stdin")? else {
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        match input {
            "/quit" | "/exit" => break,
            "/reset" => {
                session.reset();
                println!("Conversation cleared.");
                continue;
            }
            "/personas" => {
                print_personas(&personas);
                continue;
            }
            _ => {}
        }

        if let Some(rest) = input.strip_prefix("/persona ") {
            match rest.trim().parse::<usize>() {
                Ok(index) if index < personas.len() => {
                    session.set_persona(&personas[index]);
                    println!("Patient: {}", session.persona());
                }
                _ => println!("Unknown persona index; see /personas."),
            }
            continue;
        }

        match engine.take_turn(&mut session, input).await {
            Ok(reply) => println!("Patient: {reply}"),
            Err(e) => println!("{e}"),
        }
    }

    info!("consultation ended");
    Ok(())
}

/// Verify the local environment: Ollama reachability and version, patient
/// model presence, one live pipeline round-trip, and speech reachability.
async fn handle_check() -> anyhow::Result<()> {
    bedside::logging::init_cli();

    let config = BedsideConfig::load().context("failed to load configuration")?;
    let provider = build_provider(&config)?;

    // Step 1: Ollama reachability.
    let version = provider
        .version()
        .await
        .context("Ollama is not reachable; start it with `ollama serve`")?;
    info!(version = %version, url = %config.ollama.base_url, "Ollama connected");

    // Step 2: Patient model presence.
    let models = provider
        .installed_models()
        .await
        .context("failed to list installed models")?;
    let wanted = &config.ollama.model;
    let found = models
        .iter()
        .any(|name| name == wanted || name.strip_suffix(":latest") == Some(wanted));
    anyhow::ensure!(
        found,
        "model {wanted:?} not found; installed models: {models:?}. \
         Create it with `ollama create {wanted} -f Modelfile`",
    );
    info!(model = %wanted, "patient model found");

    // Step 3: One live round-trip through the pipeline.
    let personas = load_personas(&config.personas);
    let persona = personas
        .first()
        .map(String::as_str)
        .unwrap_or("75-year-old optimistic patient");
    let prompt = format_prompt(persona, &[], "Good morning! How are you feeling today?", 3);

    match provider.complete(&prompt).await {
        Ok(raw) => {
            let cleaned = clean_patient_response(&raw);
            if cleaned.is_empty() {
                warn!(raw_chars = raw.len(), "model replied but cleaning left nothing usable");
            } else {
                info!(reply = %cleaned, "model round-trip succeeded");
            }
        }
        Err(e) => warn!(error = %e, "model round-trip failed"),
    }

    // Step 4: Speech service (optional, never fatal).
    if config.speech.enabled {
        let speech = HttpSpeech::new(
            &config.speech.base_url,
            Duration::from_secs(config.speech.timeout_seconds),
        )?;
        if speech.is_available().await {
            info!(url = %config.speech.base_url, "speech service reachable");
        } else {
            warn!(url = %config.speech.base_url, "speech service not reachable (replies will be text-only)");
        }
    } else {
        info!("speech synthesis disabled in config");
    }

    info!("environment check complete");
    Ok(())
}

/// Print the resolved persona list.
fn handle_personas() -> anyhow::Result<()> {
    bedside::logging::init_cli();

    let config = BedsideConfig::load().context("failed to load configuration")?;
    let personas = load_personas(&config.personas);
    print_personas(&personas);
    Ok(())
}

/// Render the persona list with selection indices.
fn print_personas(personas: &[String]) {
    for (index, persona) in personas.iter().enumerate() {
        println!("{index:>3}  {persona}");
    }
}
