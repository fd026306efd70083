use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use jawi_core::{Embedder, Generator, Query};
use jawi_qwen::QwenClient;
use jawi_rag::{
    KnowledgeBase, KnowledgeCompiler, RagConfig, RetrievalOrchestrator, Retriever, build_embedder,
    load_index,
};
use jawi_server::{DEFAULT_HOST, DEFAULT_PORT, ServerConfig};

#[derive(Parser)]
#[command(name = "jawiai")]
#[command(about = "Jawi script assistant with tiered retrieval", long_about = None)]
struct Cli {
    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile the knowledge source into documents and a similarity index
    Ingest {
        /// Knowledge source (JSON array of records)
        #[arg(long)]
        source: Option<PathBuf>,
        #[arg(long)]
        documents: Option<PathBuf>,
        #[arg(long)]
        index: Option<PathBuf>,
    },
    /// Serve the chat API over HTTP
    Serve {
        #[arg(long, default_value = DEFAULT_HOST)]
        host: String,
        #[arg(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,
    },
    /// Ask one question from the terminal
    Ask {
        query: String,
        /// Retrieval hint used instead of the question for lookup
        #[arg(short, long)]
        context: Option<String>,
        /// Print the retrieval tier and prompt instead of calling the model
        #[arg(long)]
        dry_run: bool,
    },
    /// Send one creative-writing request
    Create { request: String },
    /// Load the compiled artifacts and print what they contain
    Inspect,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let rag = RagConfig::from_env()?;
    tracing::debug!(
        documents = %rag.documents_path.display(),
        index = %rag.index_path.display(),
        threshold = rag.relevance_threshold,
        "configuration loaded"
    );

    match cli.command {
        Commands::Ingest {
            source,
            documents,
            index,
        } => {
            let source = source.unwrap_or_else(|| rag.knowledge_path.clone());
            let documents = documents.unwrap_or_else(|| rag.documents_path.clone());
            let index = index.unwrap_or_else(|| rag.index_path.clone());

            let embedder = build_embedder(&rag.embedder)?;
            let report = KnowledgeCompiler::new(embedder)
                .compile_file(&source, &documents, &index)
                .await
                .with_context(|| format!("failed to compile {}", source.display()))?;

            println!(
                "{} Compiled {} records into {} documents ({} dims)",
                "✅".green(),
                report.records,
                report.documents.to_string().bold(),
                report.dimensions
            );
            println!("  {} {}", "documents:".cyan(), documents.display());
            println!("  {} {}", "index:".cyan(), index.display());
            println!("  {} {}", "fingerprint:".cyan(), report.fingerprint);
        }
        Commands::Serve { host, port } => {
            let generator = Arc::new(QwenClient::from_env()?);
            let orchestrator = load_orchestrator(&rag, generator)?;
            jawi_server::serve(Arc::new(orchestrator), &ServerConfig { host, port }).await?;
        }
        Commands::Ask {
            query,
            context,
            dry_run,
        } => {
            let mut query = Query::new(query);
            query.context_hint = context;

            if dry_run {
                let (knowledge, embedder) = load_knowledge(&rag)?;
                let retriever = Retriever::new(Arc::new(knowledge), embedder)
                    .with_relevance_threshold(rag.relevance_threshold);
                query.validate()?;
                let outcome = retriever.retrieve(query.search_term()).await?;
                let request = jawi_rag::assemble(&outcome, &query);

                println!("{} {}", "tier:".cyan(), outcome.tier().to_string().bold());
                if let jawi_core::RetrievalOutcome::SemanticMatch { distance, .. } = outcome {
                    println!("{} {distance:.4}", "distance:".cyan());
                }
                println!("{}", serde_json::to_string_pretty(&request)?);
                return Ok(());
            }

            let generator = Arc::new(QwenClient::from_env()?);
            let orchestrator = load_orchestrator(&rag, generator)?;
            let answer = orchestrator.answer(&query).await?;

            eprintln!("{} {}", "tier:".cyan(), answer.tier);
            println!("{}", answer.response);
        }
        Commands::Create { request } => {
            let generator = Arc::new(QwenClient::from_env()?);
            let orchestrator = load_orchestrator(&rag, generator)?;
            println!("{}", orchestrator.create(&request).await?);
        }
        Commands::Inspect => {
            let (knowledge, embedder) = load_knowledge(&rag)?;
            let artifact = load_index(&rag.index_path)?;

            println!("{}", "Compiled knowledge".bold());
            println!("  {} {}", "documents:".cyan(), knowledge.len());
            println!("  {} {}", "exact keys:".cyan(), knowledge.exact_match_index().len());
            println!(
                "  {} {} ({} dims)",
                "embedder:".cyan(),
                embedder.name(),
                embedder.dimensions()
            );
            println!("  {} {}", "fingerprint:".cyan(), artifact.fingerprint);
            println!("  {} {}", "built at:".cyan(), artifact.built_at);
            println!("  {} {}", "threshold:".cyan(), rag.relevance_threshold);

            let mut keys: Vec<&str> = knowledge.exact_match_index().keys().collect();
            keys.sort_unstable();
            if !keys.is_empty() {
                println!("  {} {}", "letters:".cyan(), keys.join(", "));
            }
        }
    }

    Ok(())
}

/// Load both artifacts with the configured embedder; refuses mismatched pairs.
fn load_knowledge(rag: &RagConfig) -> Result<(KnowledgeBase, Arc<dyn Embedder>)> {
    let embedder = build_embedder(&rag.embedder)?;
    let knowledge = KnowledgeBase::load(&rag.documents_path, &rag.index_path, embedder.as_ref())
        .context("compiled knowledge is missing or inconsistent; run `jawiai ingest` first")?;
    Ok((knowledge, embedder))
}

fn load_orchestrator(
    rag: &RagConfig,
    generator: Arc<dyn Generator>,
) -> Result<RetrievalOrchestrator> {
    let (knowledge, embedder) = load_knowledge(rag)?;
    Ok(RetrievalOrchestrator::new(Arc::new(knowledge), embedder, generator)
        .with_relevance_threshold(rag.relevance_threshold))
}
