//! # scrapekit CLI
//!
//! Command-line front end for the scraping toolkit.
//!
//! ## Subcommands
//!
//! - `scrape`: Scrape a single page and print what was found
//! - `batch`: Scrape a list of pages politely, one at a time, with a progress bar
//! - `summarize`: Scrape pages and summarize each with an LLM provider
//! - `analyze`: Like `summarize`, adding sentiment, category, entities,
//!   language and a readability score
//!
//! All subcommands share the session flags (delay, timeout, robots.txt,
//! user agent, headers), the extraction toggles and the report sections
//! (`--contacts`, `--sitemap`), and can write their results to a JSON file
//! with `--output`.

mod logging;

use std::num::NonZeroU32;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, anyhow};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use rig::completion::CompletionModel;
use rig::providers::{anthropic, gemini, openai};
use scrapekit::analysis::{
    AiEnhancedScraper, AiProvider, CompletionAnalyzer, CompletionSummarizer, ContentAnalyzer,
    DEFAULT_MAX_INPUT_CHARS, EnhancedResult, ThrottledModel,
};
use scrapekit::scrape::text::{Contacts, clean_text};
use scrapekit::scrape::urls::extract_domain;
use scrapekit::scrape::{
    ExtractOptions, ScrapeRequest, ScrapeResult, ScraperConfig, ScraperSession, Sitemap, export,
    format_summary,
};
use tracing::instrument;

#[derive(Parser)]
#[command(author, version, about = "A polite web page scraper with optional LLM analysis", long_about = None)]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scrape a single page
    Scrape(ScrapeArgs),

    /// Scrape several pages in order
    Batch(BatchArgs),

    /// Scrape pages and summarize them with an LLM
    Summarize(LlmArgs),

    /// Scrape pages and analyze them with an LLM
    Analyze(LlmArgs),
}

#[derive(Args, Debug)]
struct SessionArgs {
    /// Seconds to wait between consecutive requests
    #[arg(short, long, default_value = "1.0")]
    delay: f64,

    /// Request timeout in seconds
    #[arg(short, long, default_value = "10.0")]
    timeout: f64,

    /// Do not consult robots.txt
    #[arg(long)]
    ignore_robots: bool,

    /// User-Agent header to send
    #[arg(short, long)]
    user_agent: Option<String>,

    /// Extra header sent with every request (NAME:VALUE, repeatable)
    #[arg(short = 'H', long = "header", value_parser = parse_header)]
    headers: Vec<(String, String)>,

    /// CSS selector restricting text extraction
    #[arg(short, long)]
    selector: Option<String>,

    /// Skip text extraction
    #[arg(long)]
    no_text: bool,

    /// Skip link extraction
    #[arg(long)]
    no_links: bool,

    /// Skip image extraction
    #[arg(long)]
    no_images: bool,

    /// Skip title and meta tag extraction
    #[arg(long)]
    no_metadata: bool,

    /// List email addresses and phone numbers found in the text
    #[arg(long)]
    contacts: bool,

    /// Group each page's links into internal, external, images and documents
    #[arg(long)]
    sitemap: bool,

    /// Save results as JSON
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ScrapeArgs {
    /// URL to scrape
    #[arg(required = true)]
    url: String,

    #[command(flatten)]
    session: SessionArgs,
}

#[derive(Args, Debug)]
struct BatchArgs {
    /// URLs to scrape
    urls: Vec<String>,

    /// Read URLs from a file, one per line ('#' starts a comment)
    #[arg(short, long)]
    file: Option<PathBuf>,

    #[command(flatten)]
    session: SessionArgs,
}

#[derive(Args, Debug)]
struct LlmArgs {
    /// URLs to scrape and analyze
    #[arg(required = true)]
    urls: Vec<String>,

    /// LLM provider (openai|anthropic|gemini)
    #[arg(short, long, default_value = "openai", value_parser = parse_provider)]
    provider: AiProvider,

    /// Model name; defaults to the provider's default model
    #[arg(short, long)]
    model: Option<String>,

    /// Maximum summary length in words
    #[arg(long, default_value = "200")]
    max_words: u64,

    /// Maximum completions per minute
    #[arg(long, default_value = "30")]
    rpm: NonZeroU32,

    #[command(flatten)]
    session: SessionArgs,
}

impl SessionArgs {
    fn config(&self) -> anyhow::Result<ScraperConfig> {
        let mut builder = ScraperConfig::builder()
            .delay(seconds(self.delay, "delay")?)
            .timeout(seconds(self.timeout, "timeout")?)
            .respect_robots(!self.ignore_robots);
        if let Some(user_agent) = &self.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }
        for (name, value) in &self.headers {
            builder = builder.header(name.clone(), value.clone());
        }
        Ok(builder.build())
    }

    fn options(&self) -> ExtractOptions {
        ExtractOptions {
            text: !self.no_text,
            links: !self.no_links,
            images: !self.no_images,
            metadata: !self.no_metadata,
            selector: self.selector.clone(),
        }
    }

    fn session(&self) -> anyhow::Result<ScraperSession> {
        Ok(ScraperSession::new(self.config()?)?)
    }

    fn sections(&self) -> Sections {
        Sections {
            contacts: self.contacts,
            sitemap: self.sitemap,
        }
    }
}

/// Optional parts of a printed result
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Sections {
    contacts: bool,
    sitemap: bool,
}

/// How much an LLM command asks of the model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Analysis {
    Summary,
    Full,
}

fn seconds(value: f64, name: &str) -> anyhow::Result<Duration> {
    Duration::try_from_secs_f64(value).map_err(|e| anyhow!("invalid {}: {}", name, e))
}

fn parse_header(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once(':')
        .ok_or_else(|| format!("expected NAME:VALUE, got '{}'", s))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("empty header name in '{}'", s));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

fn parse_provider(s: &str) -> Result<AiProvider, String> {
    s.parse().map_err(|e: scrapekit::analysis::AnalysisError| e.to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    logging::setup_logging(cli.verbose, cli.log_file.as_deref())?;

    match cli.command {
        Some(Commands::Scrape(args)) => scrape_command(args).await?,
        Some(Commands::Batch(args)) => batch_command(args).await?,
        Some(Commands::Summarize(args)) => llm_command(args, Analysis::Summary).await?,
        Some(Commands::Analyze(args)) => llm_command(args, Analysis::Full).await?,
        None => {
            let _ = Cli::parse_from(["scrapekit", "--help"]);
        }
    }

    Ok(())
}

#[instrument(skip_all, fields(url = %args.url))]
async fn scrape_command(args: ScrapeArgs) -> anyhow::Result<()> {
    let mut session = args.session.session()?;
    let request = ScrapeRequest::new(&args.url).with_options(args.session.options());
    let result = session.scrape(&request).await;
    session.close();

    print_result(&result, args.session.sections());

    if let Some(output) = &args.session.output {
        export::write_json(output, std::slice::from_ref(&result)).await?;
        println!("Saved result to {}", output.display());
    }

    Ok(())
}

#[instrument(skip_all)]
async fn batch_command(args: BatchArgs) -> anyhow::Result<()> {
    let mut urls = args.urls.clone();
    if let Some(file) = &args.file {
        let content = tokio::fs::read_to_string(file)
            .await
            .with_context(|| format!("failed to read URL list {}", file.display()))?;
        urls.extend(read_url_list(&content));
    }
    if urls.is_empty() {
        return Err(anyhow!("no URLs given; pass them as arguments or with --file"));
    }

    let mut session = args.session.session()?;
    let options = args.session.options();

    let progress_bar = progress_bar(urls.len());
    let results = session
        .scrape_many_with(&urls, &options, |_, result| {
            progress_bar.set_message(result.url.clone());
            progress_bar.inc(1);
        })
        .await;
    progress_bar.finish_with_message("Scraping completed");
    session.close();

    let sections = args.session.sections();
    if sections != Sections::default() {
        for result in &results {
            print_result(result, sections);
        }
        println!();
    }
    println!("{}", format_summary(&results));

    if let Some(output) = &args.session.output {
        export::write_json(output, &results).await?;
        println!("Saved {} results to {}", results.len(), output.display());
    }

    Ok(())
}

#[instrument(skip_all, fields(provider = %args.provider, analysis = ?analysis))]
async fn llm_command(args: LlmArgs, analysis: Analysis) -> anyhow::Result<()> {
    let provider = args.provider;
    let api_key = provider.api_key_from_env()?;
    let model = args
        .model
        .clone()
        .unwrap_or_else(|| provider.default_model().to_string());

    match provider {
        AiProvider::OpenAi => {
            let client = openai::Client::new(&api_key);
            run_llm(client.completion_model(&model), &args, analysis).await
        }
        AiProvider::Anthropic => {
            let client = anthropic::ClientBuilder::new(&api_key).build();
            run_llm(client.completion_model(&model), &args, analysis).await
        }
        AiProvider::Gemini => {
            let client = gemini::Client::new(&api_key);
            run_llm(client.completion_model(&model), &args, analysis).await
        }
    }
}

async fn run_llm<M: CompletionModel>(
    model: M,
    args: &LlmArgs,
    analysis: Analysis,
) -> anyhow::Result<()> {
    let model = ThrottledModel::per_minute(model, args.rpm);
    match analysis {
        Analysis::Summary => {
            let summarizer =
                CompletionSummarizer::with_limits(model, args.max_words, DEFAULT_MAX_INPUT_CHARS);
            run_enhanced(summarizer, args).await
        }
        Analysis::Full => {
            let analyzer = CompletionAnalyzer::with_summary_words(model, args.max_words);
            run_enhanced(analyzer, args).await
        }
    }
}

async fn run_enhanced<A: ContentAnalyzer>(analyzer: A, args: &LlmArgs) -> anyhow::Result<()> {
    let mut scraper = AiEnhancedScraper::new(args.session.session()?, analyzer);

    let options = args.session.options();
    let requests: Vec<ScrapeRequest> = args
        .urls
        .iter()
        .map(|url| ScrapeRequest::new(url).with_options(options.clone()))
        .collect();

    let progress_bar = progress_bar(requests.len());
    let results = scraper
        .scrape_batch(&requests, |_, result| {
            progress_bar.set_message(result.url.clone());
            progress_bar.inc(1);
        })
        .await;
    progress_bar.finish_with_message("Scraping completed");

    let sections = args.session.sections();
    for result in &results {
        print_enhanced(result, sections);
    }

    if let Some(output) = &args.session.output {
        export::write_json(output, &results).await?;
        println!("Saved {} results to {}", results.len(), output.display());
    }

    Ok(())
}

fn read_url_list(content: &str) -> impl Iterator<Item = String> + '_ {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
}

fn progress_bar(len: usize) -> ProgressBar {
    let progress_bar = ProgressBar::new(len as u64);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} ({eta}) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-"),
    );
    progress_bar
}

fn print_result(result: &ScrapeResult, sections: Sections) {
    match (&result.error, result.status_code) {
        (Some(error), Some(status)) => println!("✗ {} [{}] {}", result.url, status, error),
        (Some(error), None) => println!("✗ {} {}", result.url, error),
        (None, status) => println!("✓ {} [{}]", result.url, status.unwrap_or_default()),
    }

    if let Some(title) = &result.title {
        println!("  Title: {}", title);
    }
    if let Some(description) = result.metadata.get("description") {
        println!("  Description: {}", description);
    }
    if let Some(text) = &result.text_content {
        println!("  Text ({} chars): {}", text.chars().count(), preview(text, 200));
    }
    println!("  Links: {}  Images: {}", result.links.len(), result.images.len());

    if sections.contacts {
        let contacts = Contacts::from_text(result.text_content.as_deref().unwrap_or_default());
        if contacts.is_empty() {
            println!("  Contacts: none");
        } else {
            println!("  Emails: {}", contacts.emails.join(", "));
            println!("  Phone numbers: {}", contacts.phone_numbers.join(", "));
        }
    }
    if sections.sitemap && result.is_success() {
        print_sitemap(&Sitemap::from_links(&result.links, &extract_domain(&result.url)));
    }
}

/// First `max_chars` characters of the cleaned text
fn preview(text: &str, max_chars: usize) -> String {
    let cleaned = clean_text(text);
    let mut preview: String = cleaned.chars().take(max_chars).collect();
    if cleaned.chars().count() > max_chars {
        preview.push_str("...");
    }
    preview
}

fn print_sitemap(sitemap: &Sitemap) {
    println!("  Sitemap for {} ({} links)", sitemap.domain, sitemap.total_links);
    for (name, links) in [
        ("Internal", &sitemap.internal_links),
        ("External", &sitemap.external_links),
        ("Images", &sitemap.image_links),
        ("Documents", &sitemap.document_links),
    ] {
        println!("    {}: {}", name, links.len());
        for link in links.iter().take(5) {
            println!("      {}", link.url);
        }
        if links.len() > 5 {
            println!("      ... {} more", links.len() - 5);
        }
    }
}

fn print_enhanced(result: &EnhancedResult, sections: Sections) {
    print_result(&result.scrape, sections);

    if let Some(error) = &result.analysis_error {
        println!("  Analysis failed: {}", error);
    }
    if let Some(report) = &result.analysis {
        if let Some(summary) = &report.summary {
            println!("  Summary: {}", summary.text);
        }
        if let Some(category) = &report.content_category {
            println!("  Category: {}", category);
        }
        if let (Some(score), Some(confidence)) =
            (report.sentiment_score, report.sentiment_confidence)
        {
            println!("  Sentiment: {:.2} (confidence {:.2})", score, confidence);
        }
        if let Some(language) = &report.language_detected {
            println!("  Language: {}", language);
        }
        if let Some(readability) = report.readability_score {
            println!("  Readability: {:.2}", readability);
        }
        if let Some(entities) = &report.extracted_entities {
            for (name, found) in [
                ("People", &entities.people),
                ("Places", &entities.places),
                ("Organizations", &entities.organizations),
                ("Other entities", &entities.other),
            ] {
                if !found.is_empty() {
                    println!("  {}: {}", name, found.join(", "));
                }
            }
        }
        for failure in &report.failures {
            println!("  Failed {}", failure);
        }
    }
    println!();
}
