//! Briefly CLI - article extraction and summarisation
//!
//! The application logic is contained in lib.rs, and this file is responsible
//! for parsing arguments and handling top-level errors.

use anyhow::Context;
use briefly::{Config, ExtractedArticle, Extractor, Summarizer, SummaryRequest, SummaryResult};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "briefly")]
#[command(author, version, about = "Article extraction and structured summarisation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract the readable text of an article
    Extract {
        /// Article URL
        url: String,
    },
    /// Summarise one article by URL
    Summarise {
        /// Article URL
        url: String,
        /// Author to credit in the summary
        #[arg(long)]
        author: Option<String>,
        /// Show raw extracted text instead of summary
        #[arg(long)]
        raw: bool,
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Summarise several articles in one model call
    Batch {
        /// Article URLs
        #[arg(required = true)]
        urls: Vec<String>,
        /// Print the summaries as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("briefly=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    match cli.command {
        Commands::Extract { url } => {
            let extractor = Extractor::new(&Config::load_http()?)?;
            match extractor.extract_with_cancel(&url, &cancel).await? {
                Some(article) => print_article(&article),
                None => println!("{}", "No readable article found.".yellow()),
            }
        }
        Commands::Summarise {
            url,
            author,
            raw,
            json,
        } => {
            let extractor = Extractor::new(&Config::load_http()?)?;
            eprintln!("Fetching: {}", url);

            let Some(article) = extractor.extract_with_cancel(&url, &cancel).await? else {
                println!("{}", "No readable article found.".yellow());
                return Ok(());
            };

            if raw {
                print_article(&article);
                return Ok(());
            }

            eprintln!("Summarising {} characters...", article.text.chars().count());
            let summarizer = Summarizer::from_config(&Config::load()?)?;
            let mut request = SummaryRequest::new(article.title, url, article.text);
            request.author = author;
            let summary = summarizer
                .summarize_with_cancel(&request, &cancel)
                .await
                .context("summarisation failed")?;

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print_summary(&summary);
            }
        }
        Commands::Batch { urls, json } => {
            let config = Config::load()?;
            let extractor = Extractor::new(&config.http)?;

            let mut requests = Vec::new();
            for url in urls {
                match extractor.extract_with_cancel(&url, &cancel).await {
                    Ok(Some(article)) => {
                        requests.push(SummaryRequest::new(article.title, url, article.text))
                    }
                    Ok(None) => eprintln!("{} {}", "Skipping (no readable article):".yellow(), url),
                    Err(e) => eprintln!("{} {}", "Skipping:".red(), e),
                }
            }

            if requests.is_empty() {
                println!("{}", "Nothing to summarise.".yellow());
                return Ok(());
            }

            let summarizer = Summarizer::from_config(&config)?;
            let summaries = summarizer
                .summarize_batch_with_cancel(&requests, &cancel)
                .await
                .context("batch summarisation failed")?;

            if json {
                println!("{}", serde_json::to_string_pretty(&summaries)?);
            } else {
                for summary in &summaries {
                    print_summary(summary);
                    println!();
                }
            }
        }
    }

    Ok(())
}

fn print_article(article: &ExtractedArticle) {
    println!("\n=== {} ===\n", article.title.bold());
    if let Some(excerpt) = &article.excerpt {
        println!("{}\n", excerpt.italic());
    }
    if let Some(image) = &article.image_url {
        println!("🖼  {}\n", image);
    }
    println!("{}", article.text);
    println!("\n--- Extracted {} characters ---", article.text.chars().count());
}

fn print_summary(summary: &SummaryResult) {
    println!("=== {} ===", summary.title.bold());
    println!("{}", summary.url.dimmed());
    if let Some(author) = &summary.author {
        println!("by {}", author);
    }
    println!();

    for (idx, point) in summary.points.iter().enumerate() {
        println!("{} {}", format!("{:>2}.", idx + 1).cyan(), point.heading.bold());
        if let Some(bullets) = &point.bullets {
            for bullet in bullets {
                println!("    • {}", bullet);
            }
        }
        if let Some(paragraph) = &point.paragraph {
            println!("    {}", paragraph);
        }
    }

    println!("\n🏷️  {}", summary.categories.join(", ").green());
    println!("{}", format!("model: {}", summary.model_used).dimmed());
}
