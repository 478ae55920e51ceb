//! SQEG quick checker CLI
//!
//! Scores a web article (URL or pasted text) with an LLM judge and appends
//! the verdict to a CSV log.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sqeg_checker::{
    config::Config,
    evaluator::EvaluationResult,
    extract::Extractor,
    llm::LlmClient,
    log::ResultLog,
    pipeline::QualityChecker,
    search::SimilarityQuerier,
};
use std::io::Read;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// SQEG quick checker - LLM page-quality evaluation for web articles
#[derive(Parser)]
#[command(name = "sqeg-check")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate an article and append the result to the log
    Check {
        /// URL or article text; "-" reads the article from stdin
        source: Option<String>,

        /// Read the article text from a file
        #[arg(short, long, conflicts_with = "source")]
        file: Option<PathBuf>,

        /// Do not append the result to the log
        #[arg(long)]
        no_log: bool,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Only run extraction and preview the article
    Extract {
        /// URL or article text
        source: String,

        /// Number of body characters to show
        #[arg(long, default_value_t = 500)]
        preview: usize,
    },

    /// Only run the similar-page search
    Search {
        /// The search query
        query: String,

        /// Number of results to return
        #[arg(short = 'k', long, default_value_t = 5)]
        top_k: usize,
    },

    /// Show the most recent logged results
    History {
        /// Number of rows to show
        #[arg(short = 'n', long, default_value_t = 10)]
        limit: usize,

        /// Log file (defaults to the configured path)
        #[arg(long)]
        log: Option<PathBuf>,
    },

    /// Test LLM connection
    Test,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    match cli.command {
        Commands::Check {
            source,
            file,
            no_log,
            json,
        } => cmd_check(source, file, no_log, json).await,
        Commands::Extract { source, preview } => cmd_extract(source, preview).await,
        Commands::Search { query, top_k } => cmd_search(query, top_k).await,
        Commands::History { limit, log } => cmd_history(limit, log),
        Commands::Test => cmd_test().await,
    }
}

fn init_tracing(verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(format!("sqeg_checker={}", level).parse()?),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
    Ok(())
}

fn read_source(source: Option<String>, file: Option<PathBuf>) -> Result<String> {
    let text = match (source, file) {
        (_, Some(path)) => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read '{}'", path.display()))?,
        (Some(s), None) if s == "-" => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            buf
        }
        (Some(s), None) => s,
        (None, None) => anyhow::bail!("Give a URL or article text, --file PATH, or '-' for stdin"),
    };

    if text.trim().is_empty() {
        anyhow::bail!("The article source is empty");
    }
    Ok(text)
}

async fn cmd_check(
    source: Option<String>,
    file: Option<PathBuf>,
    no_log: bool,
    json: bool,
) -> Result<()> {
    let source = read_source(source, file)?;

    let config = Config::load().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    let mut checker = QualityChecker::from_config(&config).context("Failed to set up checker")?;
    if no_log {
        checker = checker.without_log();
    }

    println!("Evaluating with {}...", config.llm.model);
    let start = Instant::now();

    let assessment = match checker.check(&source).await {
        Ok(assessment) => assessment,
        Err(e) => {
            eprintln!("❌ Evaluation failed: {}", e);
            if let Some(raw) = e.raw_response() {
                eprintln!("\nRaw model response:\n{}", raw);
            }
            std::process::exit(1);
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&assessment.result)?);
    } else {
        if !assessment.document.title.is_empty() {
            println!("\nArticle: {}", assessment.document.title);
        }
        println!(
            "  {} words, {} similar pages considered",
            assessment.document.word_count(),
            assessment.candidates.len()
        );
        print_result(&assessment.result);
        println!("\nEvaluated in {:.2?}", start.elapsed());
    }

    if assessment.result.needs_rewrite() {
        println!(
            "\n⚠️  Page Quality is rated {}. Consider rewriting this article.",
            assessment.result.pq
        );
    }

    if let Some(path) = &assessment.logged_to {
        println!("\n✅ Result appended to {}", path.display());
    }

    Ok(())
}

fn print_result(result: &EvaluationResult) {
    println!("\nEvaluation Result");
    println!("{}", "─".repeat(60));
    println!("  Page Quality:      {}", result.pq);
    println!("  Needs Met:         {}", result.nm);
    println!("  Effort:            {}/5", result.effort);
    println!("  Originality:       {}/5", result.originality);
    println!("  Duplication rate:  {}%", result.duplication_rate);
    println!("  Skill:             {}/5", result.skill);
    println!("  Accuracy:          {}/5", result.accuracy);
    println!("  E-E-A-T:           {}", result.eeat_summary);
    println!("  Advice:            {}", result.improvement_advice);
    println!("{}", "─".repeat(60));
}

async fn cmd_extract(source: String, preview: usize) -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;
    let extractor = Extractor::from_config(&config.extract)?;

    println!("Strategies: {}", extractor.strategy_names().join(" → "));

    let start = Instant::now();
    let document = extractor.extract(&source).await;

    if document.is_empty() {
        anyhow::bail!("No article text could be extracted. Try pasting the text directly.");
    }

    println!("Title: {}", document.title);
    println!(
        "Body:  {} chars, {} words ({:.2?})",
        document.body.chars().count(),
        document.word_count(),
        start.elapsed()
    );
    println!("{}", "─".repeat(60));
    let shown: String = document.body.chars().take(preview).collect();
    println!("{}", shown);
    if document.body.chars().count() > preview {
        println!("...");
    }

    Ok(())
}

async fn cmd_search(query: String, top_k: usize) -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;
    let querier = SimilarityQuerier::from_config(&config.search, &config.extract.user_agent)?;

    println!("Searching {} for: \"{}\"", querier.provider_name(), query);
    println!();

    let results = querier.search(&query, top_k).await;

    if results.is_empty() {
        println!("No similar pages found.");
    } else {
        for (i, candidate) in results.iter().enumerate() {
            println!("{:>2}. {}", i + 1, candidate.title);
            if !candidate.snippet.is_empty() {
                println!("    {}", candidate.snippet);
            }
        }
    }

    Ok(())
}

fn cmd_history(limit: usize, log_path: Option<PathBuf>) -> Result<()> {
    let path = match log_path {
        Some(path) => path,
        None => {
            Config::load()
                .context("Failed to load configuration")?
                .log
                .path
        }
    };

    let log = ResultLog::new(&path);
    let records = log.read_all().context("Failed to read result log")?;

    if records.is_empty() {
        println!("No results logged at '{}'.", path.display());
        return Ok(());
    }

    println!("Last {} of {} results ({})", limit.min(records.len()), records.len(), path.display());
    println!("{}", "─".repeat(60));
    let skip = records.len().saturating_sub(limit);
    for record in &records[skip..] {
        let source: String = record.source.chars().take(50).collect();
        println!(
            "{}  {:<7} {:<10} dup {:>3}%  {}",
            record.timestamp,
            record.pq.as_str(),
            record.nm.as_str(),
            record.duplication_rate,
            source.replace('\n', " ")
        );
    }

    Ok(())
}

async fn cmd_test() -> Result<()> {
    println!("Testing LLM connection...\n");

    let config = Config::load().context("Failed to load configuration")?;

    println!("Configuration:");
    println!("  API Base:  {}", config.llm.api_base);
    println!("  Models:    {}", config.llm.model_chain().join(", "));
    println!(
        "  API Key:   {}...",
        config.llm.api_key.chars().take(8).collect::<String>()
    );
    println!();

    if let Err(e) = config.validate() {
        println!("Configuration error: {}", e);
        return Ok(());
    }

    let client = LlmClient::new(config.llm)?;

    println!("Sending test request...");
    match client.test_connection().await {
        Ok(()) => {
            println!("Connection successful!");
        }
        Err(e) => {
            println!("Connection failed: {}", e);
        }
    }

    Ok(())
}
