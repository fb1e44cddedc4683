use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use miette::{IntoDiagnostic, WrapErr};

use docweaver::config::{AppConfig, ProviderEntry};
use docweaver::core::generation::FieldMap;
use docweaver::core::llm::{chain_from_configs, GoogleProvider, ProviderChain};
use docweaver::core::logging::{self, GenerationDiagnostic, TemplateDiagnostic};
use docweaver::core::pipeline::{DocumentPipeline, FilledDocument, PipelineError};
use docweaver::document::DocxReader;

#[derive(Parser)]
#[command(name = "docweaver", version)]
#[command(about = "Generate structured content and inject it into DOCX templates")]
struct Cli {
    /// Config file (defaults to ~/.config/docweaver/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log to file only
    #[arg(long, global = true, default_value_t = false)]
    quiet: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate every field and fill the template
    Fill {
        #[command(flatten)]
        topic: TopicArgs,
        #[arg(long)]
        template: PathBuf,
        #[arg(long)]
        output: PathBuf,
        /// Write the accepted field map as JSON, for later regeneration
        #[arg(long)]
        map_out: Option<PathBuf>,
        #[command(flatten)]
        chain: ChainArgs,
    },
    /// Regenerate one field of an accepted field map and refill the template
    Regenerate {
        #[command(flatten)]
        topic: TopicArgs,
        #[arg(long)]
        template: PathBuf,
        /// Field map JSON written by `fill --map-out`
        #[arg(long)]
        map: PathBuf,
        #[arg(long)]
        field: String,
        #[arg(long)]
        critique: Option<String>,
        #[arg(long)]
        output: PathBuf,
        #[arg(long)]
        map_out: Option<PathBuf>,
        #[command(flatten)]
        chain: ChainArgs,
    },
    /// Fill a template from an existing field map without calling a provider
    Render {
        #[arg(long)]
        template: PathBuf,
        #[arg(long)]
        map: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },
    /// Solve the challenge against the template's text as a new document
    AnswerKey {
        #[command(flatten)]
        topic: TopicArgs,
        #[arg(long)]
        template: PathBuf,
        #[arg(long)]
        output: PathBuf,
        #[command(flatten)]
        chain: ChainArgs,
    },
    /// Print a template's plain text
    TemplateText {
        #[arg(long)]
        template: PathBuf,
    },
    /// List Gemini models that support content generation
    Models {
        #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
        api_key: Option<String>,
    },
    /// Print the effective configuration as TOML
    Config,
}

#[derive(Args)]
struct TopicArgs {
    /// Topic or case description
    #[arg(long, conflicts_with = "topic_file")]
    topic: Option<String>,
    /// Read the topic from a file
    #[arg(long)]
    topic_file: Option<PathBuf>,
}

#[derive(Args)]
struct ChainArgs {
    /// Provider as `id` or `id:model`, highest priority first; replaces the configured chain
    #[arg(long = "provider")]
    providers: Vec<String>,
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    let (config, source) = match &cli.config {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(),
    }
    .into_diagnostic()
    .wrap_err("Failed to load configuration")?;

    let log_dir = config.log_dir();
    let _log_guard = if cli.quiet {
        logging::init_quiet(&log_dir)
    } else {
        logging::init(&log_dir)
    };
    log::info!("docweaver v{} starting", docweaver::VERSION);
    source.log();

    match cli.command {
        Commands::Fill {
            topic,
            template,
            output,
            map_out,
            chain,
        } => {
            let pipeline = build_pipeline(&config)?;
            let chain = build_chain(&config, &chain)?;
            let topic = topic.resolve()?;
            let template_bytes = read_file(&template)?;

            let filled = pipeline
                .fill_template(&topic, &template_bytes, chain)
                .await
                .map_err(|e| report(e, &template))?;
            write_filled(&filled, &output, map_out.as_deref())?;
        }

        Commands::Regenerate {
            topic,
            template,
            map,
            field,
            critique,
            output,
            map_out,
            chain,
        } => {
            let pipeline = build_pipeline(&config)?;
            let chain = build_chain(&config, &chain)?;
            let topic = topic.resolve()?;
            let template_bytes = read_file(&template)?;
            let prior = read_map(&map)?;

            let filled = pipeline
                .regenerate_field(
                    &topic,
                    &template_bytes,
                    prior,
                    &field,
                    critique.as_deref(),
                    chain,
                )
                .await
                .map_err(|e| report(e, &template))?;
            write_filled(&filled, &output, map_out.as_deref())?;
        }

        Commands::Render {
            template,
            map,
            output,
        } => {
            let pipeline = build_pipeline(&config)?;
            let template_bytes = read_file(&template)?;
            let field_map = read_map(&map)?;
            let bytes = pipeline
                .inject(&template_bytes, &field_map)
                .map_err(|e| report(e, &template))?;
            write_file(&output, &bytes)?;
        }

        Commands::AnswerKey {
            topic,
            template,
            output,
            chain,
        } => {
            let pipeline = build_pipeline(&config)?;
            let chain = build_chain(&config, &chain)?;
            let topic = topic.resolve()?;
            let template_bytes = read_file(&template)?;

            let key = pipeline
                .answer_key(&topic, &template_bytes, &chain)
                .await
                .map_err(|e| report(e, &template))?;
            write_file(&output, &key.bytes)?;
            eprintln!("Answer key written to {} ({})", output.display(), key.provider);
        }

        Commands::TemplateText { template } => {
            let bytes = read_file(&template)?;
            let text = DocxReader::extract_text(&bytes)
                .map_err(|e| TemplateDiagnostic::new(template.display().to_string(), e.to_string()))?;
            println!("{}", text);
        }

        Commands::Models { api_key } => {
            let provider = GoogleProvider::flash(api_key.unwrap_or_default());
            for model in provider.list_models_or_fallback().await {
                println!("{}", model);
            }
        }

        Commands::Config => {
            let rendered = toml::to_string_pretty(&config).into_diagnostic()?;
            println!("{}", rendered);
        }
    }

    Ok(())
}

impl TopicArgs {
    fn resolve(&self) -> miette::Result<String> {
        let topic = match (&self.topic, &self.topic_file) {
            (Some(topic), _) => topic.clone(),
            (None, Some(path)) => fs::read_to_string(path)
                .into_diagnostic()
                .wrap_err_with(|| format!("Failed to read topic from {}", path.display()))?,
            (None, None) => miette::bail!("Provide the topic with --topic or --topic-file"),
        };
        if topic.trim().is_empty() {
            miette::bail!("The topic is empty");
        }
        Ok(topic)
    }
}

fn build_pipeline(config: &AppConfig) -> miette::Result<DocumentPipeline> {
    let contract = config.contract().into_diagnostic()?;
    let orchestrator = config.orchestrator().into_diagnostic()?;
    Ok(DocumentPipeline::new(orchestrator, Arc::new(contract)))
}

fn build_chain(config: &AppConfig, args: &ChainArgs) -> miette::Result<ProviderChain> {
    let mut config = config.clone();
    if !args.providers.is_empty() {
        config.providers = args
            .providers
            .iter()
            .map(|spec| {
                let (provider, model) = match spec.split_once(':') {
                    Some((id, model)) => (id, Some(model.to_string())),
                    None => (spec.as_str(), None),
                };
                ProviderEntry {
                    provider: provider.to_string(),
                    model,
                    api_key: None,
                }
            })
            .collect();
    }

    let providers = config.provider_configs().into_diagnostic()?;
    let chain = chain_from_configs(&providers, config.chain_config());
    log::info!("Provider chain: {:?}", chain.labels());
    Ok(chain)
}

fn report(error: PipelineError, template: &Path) -> miette::Report {
    match error {
        PipelineError::Document(e) => {
            TemplateDiagnostic::new(template.display().to_string(), e.to_string()).into()
        }
        PipelineError::Generation(e) => {
            GenerationDiagnostic::new(e.to_string(), e.provider()).into()
        }
    }
}

fn write_filled(filled: &FilledDocument, output: &Path, map_out: Option<&Path>) -> miette::Result<()> {
    write_file(output, &filled.bytes)?;
    if let Some(path) = map_out {
        let json = serde_json::to_string_pretty(&filled.field_map).into_diagnostic()?;
        write_file(path, json.as_bytes())?;
    }
    eprintln!(
        "Wrote {} ({} of {} fields, {} after {} attempt(s))",
        output.display(),
        filled.field_map.non_empty_count(),
        filled.field_map.len(),
        filled.provider,
        filled.attempts.len()
    );
    Ok(())
}

fn read_map(path: &Path) -> miette::Result<FieldMap> {
    let json = fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to read field map {}", path.display()))?;
    serde_json::from_str(&json)
        .into_diagnostic()
        .wrap_err_with(|| format!("Invalid field map {}", path.display()))
}

fn read_file(path: &Path) -> miette::Result<Vec<u8>> {
    fs::read(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to read {}", path.display()))
}

fn write_file(path: &Path, bytes: &[u8]) -> miette::Result<()> {
    fs::write(path, bytes)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to write {}", path.display()))
}
