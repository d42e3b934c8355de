use crate::render;
use application::context::{AppContext, CoachService};
use clap::{Parser, Subcommand};
use colored::Colorize;
use domain::error::RagError;
use shared::confirmation::{ask_confirmation, ask_line};
use shared::types::Result;

const EXAMPLE_QUESTIONS: &[&str] = &[
    "What is protein?",
    "How much protein per day?",
    "Best exercises for chest?",
];

const EXIT_WORDS: &[&str] = &["quit", "exit", "q"];

#[derive(Parser)]
#[command(name = "rag_coach")]
#[command(about = "Ask your personal fitness coach, answered from the course PDFs")]
pub struct Cli {
    /// Show debug logs and full error details
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Load the PDFs, chunk them and build the vector index
    Ingest {
        /// Recreate an existing index without asking
        #[arg(long)]
        force: bool,
    },
    /// Ask a single question
    Ask {
        #[arg(trailing_var_arg = true, required = true)]
        question: Vec<String>,
    },
    /// Interactive question loop
    Chat,
    /// Show the passages retrieved for a query, without calling the model
    Search {
        /// Number of passages to return (defaults to RETRIEVAL_K)
        #[arg(short, long)]
        k: Option<usize>,

        #[arg(trailing_var_arg = true, required = true)]
        query: Vec<String>,
    },
    /// Print statistics about the persisted index
    Stats,
}

pub struct CliApp {
    context: AppContext,
    verbose: bool,
}

impl CliApp {
    pub fn new(context: AppContext, verbose: bool) -> Self {
        Self { context, verbose }
    }

    pub async fn run(&self, command: Command) -> Result<()> {
        match command {
            Command::Ingest { force } => self.handle_ingest(force).await,
            Command::Ask { question } => self.handle_ask(&question.join(" ")).await,
            Command::Chat => self.handle_chat().await,
            Command::Search { k, query } => self.handle_search(&query.join(" "), k).await,
            Command::Stats => self.handle_stats(),
        }
    }

    async fn handle_ingest(&self, force: bool) -> Result<()> {
        let service = self.context.ingest_service();
        let mut force_recreate = force;
        if service.index_exists() && !force {
            let prompt = format!(
                "Vector index exists at {}. Recreate it?",
                self.context.config.vector_db_path.display()
            );
            if !ask_confirmation(&prompt, false)? {
                println!("{}", "Keeping the existing index.".yellow());
                return Ok(());
            }
            force_recreate = true;
        }

        let report = service.build_index(force_recreate).await?;
        println!();
        render::print_document_stats(&report.documents);
        render::print_breakdown("CHUNKS BY CATEGORY:", "chunks", &report.chunks_by_category);
        render::print_index_stats(&report.index);
        println!(
            "{}",
            format!(
                "Indexed {} chunks in {:.1}s",
                report.chunks, report.elapsed_secs
            )
            .green()
        );
        Ok(())
    }

    async fn handle_ask(&self, question: &str) -> Result<()> {
        let service = self.context.coach_service()?;
        self.answer(&service, question).await
    }

    async fn handle_chat(&self) -> Result<()> {
        let service = self.context.coach_service()?;
        println!("{}", "Ready to answer questions! Type 'exit' to quit.".green());
        println!("{}", "Example questions:".dimmed());
        for example in EXAMPLE_QUESTIONS {
            println!("  {}", example.dimmed());
        }
        loop {
            let question = ask_line("Your question")?;
            if question.is_empty() || EXIT_WORDS.contains(&question.to_lowercase().as_str()) {
                println!("Goodbye!");
                break;
            }
            self.answer(&service, &question).await?;
        }
        Ok(())
    }

    async fn answer(&self, service: &CoachService, question: &str) -> Result<()> {
        let outcome = service.ask(question).await?;
        render::print_outcome(&outcome, self.verbose);
        Ok(())
    }

    async fn handle_search(&self, query: &str, k: Option<usize>) -> Result<()> {
        let retriever = self.context.retriever()?;
        let k = k.unwrap_or(retriever.k());
        let results = retriever.retrieve_k(query, k).await?;
        render::print_search_results(query, &results);
        Ok(())
    }

    fn handle_stats(&self) -> Result<()> {
        let store = self.context.load_store()?;
        render::print_index_stats(&store.stats());
        println!("  Created at: {}", store.meta().created_at);
        Ok(())
    }
}

/// One-line, user-facing explanation for an error that stopped a command.
pub fn describe_error(err: &anyhow::Error) -> String {
    match err.downcast_ref::<RagError>() {
        Some(RagError::Config(msg)) => format!("System unavailable, configuration problem: {msg}"),
        Some(RagError::IndexNotFound(_)) => {
            format!("System unavailable: {err}")
        }
        Some(rag) if rag.is_corpus_missing() => format!("Cannot build the index: {rag}"),
        Some(rag) => rag.to_string(),
        None => format!("System unavailable: {err}"),
    }
}
