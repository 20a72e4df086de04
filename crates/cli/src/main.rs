mod echo;

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, bail};
use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use legible_core::{FetchConfig, HeuristicScorer, ReadConfig, Reader, ScorerConfig, Target, normalize};
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Output format for extracted content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Markdown,
    Html,
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "markdown" | "md" => Ok(Self::Markdown),
            "html" => Ok(Self::Html),
            "text" | "txt" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid format: {s}. Valid options: markdown, html, text, json")),
        }
    }
}

/// Extract the readable article from a web page or HTML file
#[derive(Parser, Debug)]
#[command(name = "legible")]
#[command(version)]
#[command(about = "Extract the readable article from a web page or HTML file", long_about = None)]
struct Args {
    /// URL to fetch, local HTML file, or "-" for stdin
    #[arg(value_name = "INPUT", required_unless_present = "completions")]
    input: Option<String>,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Output format (markdown, html, text, json)
    #[arg(short, long, default_value = "markdown", value_name = "FORMAT")]
    format: OutputFormat,

    /// Charset to decode the input with, overriding any declaration
    #[arg(short, long, value_name = "CHARSET")]
    encoding: Option<String>,

    /// HTTP timeout in seconds
    #[arg(long, default_value = "30", value_name = "SECS")]
    timeout: u64,

    /// Custom User-Agent for HTTP requests
    #[arg(long, value_name = "UA")]
    user_agent: Option<String>,

    /// Extra request header, as "Name: value" (repeatable)
    #[arg(short = 'H', long = "header", value_name = "HEADER")]
    headers: Vec<String>,

    /// Proxy URL for HTTP requests
    #[arg(long, value_name = "URL")]
    proxy: Option<String>,

    /// Extract from non-2xx responses instead of failing
    #[arg(long)]
    accept_error_status: bool,

    /// CSS selector whose matches are stripped before extraction (repeatable)
    #[arg(short, long = "strip", value_name = "SELECTOR")]
    strip: Vec<String>,

    /// Minimum character threshold for content candidates
    #[arg(long, default_value = "500", value_name = "NUM")]
    char_threshold: usize,

    /// Minimum score of the winning content candidate
    #[arg(long, default_value = "20", value_name = "SCORE")]
    min_score: f64,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Print a shell completion script and exit
    #[arg(long, value_name = "SHELL")]
    completions: Option<Shell>,
}

fn init_logging(verbose: bool) {
    let default = if verbose { LevelFilter::DEBUG } else { LevelFilter::ERROR };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::builder().with_default_directive(default.into()).from_env_lossy())
        .with_writer(io::stderr)
        .init();
}

fn parse_headers(raw: &[String]) -> anyhow::Result<BTreeMap<String, String>> {
    raw.iter()
        .map(|header| {
            let (name, value) =
                header.split_once(':').with_context(|| format!("Invalid header (expected \"Name: value\"): {header}"))?;
            Ok((name.trim().to_string(), value.trim().to_string()))
        })
        .collect()
}

fn read_config(args: &Args) -> anyhow::Result<ReadConfig> {
    let mut fetch = FetchConfig {
        timeout: args.timeout,
        headers: parse_headers(&args.headers)?,
        proxy: args.proxy.clone(),
        accept_error_status: args.accept_error_status,
        ..FetchConfig::default()
    };
    if let Some(user_agent) = &args.user_agent {
        fetch.user_agent = user_agent.clone();
    }

    let mut builder = ReadConfig::builder().fetch(fetch).sanitize_rules(args.strip.iter().cloned());
    if let Some(encoding) = &args.encoding {
        builder = builder.encoding(encoding.as_str());
    }

    Ok(builder.build())
}

/// Where the article comes from once the input has been loaded
#[derive(Debug, PartialEq, Eq)]
enum Source {
    Url(String),
    /// Decoded file or stdin contents, read as markup whatever they look like
    Markup(String),
}

/// Resolves the input: URLs pass through, files and stdin are decoded to
/// markup.
fn load_source(input: &str, args: &Args) -> anyhow::Result<Source> {
    let bytes = if input == "-" {
        if args.verbose {
            echo::print_step(1, 4, "Reading from stdin");
        }
        let mut buffer = Vec::new();
        io::stdin().read_to_end(&mut buffer).context("Failed to read from stdin")?;
        buffer
    } else if Target::resolve(input).is_remote() {
        if args.verbose {
            echo::print_step(1, 4, &format!("Fetching {}", input.bright_white().underline()));
        }
        return Ok(Source::Url(input.to_string()));
    } else {
        if args.verbose {
            echo::print_step(1, 4, &format!("Reading from file {}", input.bright_white()));
        }
        fs::read(input).with_context(|| format!("Failed to read file: {input}"))?
    };

    if args.verbose {
        echo::print_detail("Size", &echo::format_size(bytes.len()));
    }

    let decoded = normalize(&bytes, Some("text/html"), args.encoding.as_deref()).context("Failed to decode input")?;
    Ok(Source::Markup(decoded.text))
}

async fn run(args: Args) -> anyhow::Result<()> {
    let Some(input) = args.input.as_deref() else {
        bail!("No input given");
    };

    if args.verbose {
        echo::print_banner();
    }

    let source = load_source(input, &args)?;

    let scorer = HeuristicScorer::new(ScorerConfig {
        min_score: args.min_score,
        char_threshold: args.char_threshold,
        ..Default::default()
    });
    let reader = Reader::with_config(read_config(&args)?).with_scorer(scorer);

    if args.verbose {
        echo::print_step(2, 4, "Parsing and sanitizing document");
    }

    let article = match &source {
        Source::Url(url) => reader.read(url).await,
        Source::Markup(markup) => reader.read_markup(markup),
    };
    let mut article = article.with_context(|| format!("Failed to read {input}"))?;

    if args.verbose {
        echo::print_step(3, 4, "Extracting main content");
        if let Some(response) = article.response()? {
            echo::print_detail("Status", &response.status.to_string());
            echo::print_detail("Charset", &response.content_type.charset);
        }
        echo::print_detail("Title", article.title()?);
    }

    let content = article.content()?.map(str::to_string);

    let output = match (args.format, content) {
        (OutputFormat::Json, content) => {
            if content.is_none() {
                echo::print_warning("No readable content found");
            }
            serde_json::to_string_pretty(&article.snapshot()?).context("Failed to serialize article")?
        }
        (_, None) => bail!("No readable content found in {input}"),
        (OutputFormat::Html, Some(content)) => content,
        (OutputFormat::Text, Some(_)) => article.text_body()?.to_string(),
        (OutputFormat::Markdown, Some(_)) => {
            let title = article.title()?.to_string();
            let body = article.to_markdown()?.unwrap_or_default();
            if title.is_empty() { body } else { format!("# {title}\n\n{body}") }
        }
    };

    article.close();

    if args.verbose {
        echo::print_step(4, 4, "Writing output");
        echo::print_detail("Format", &format!("{:?}", args.format));
    }

    match args.output {
        Some(path) => {
            fs::write(&path, output).with_context(|| format!("Failed to write to file: {}", path.display()))?;
            echo::print_success(&format!("Output written to {}", path.display().bright_white()));
        }
        None => {
            println!("{output}");
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if let Some(shell) = args.completions {
        clap_complete::generate(shell, &mut Args::command(), "legible", &mut io::stdout());
        return Ok(());
    }

    init_logging(args.verbose);
    run(args).await
}
