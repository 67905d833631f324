use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use reqparse::{detect_format, detect_format_from_path, Format, PayloadParser};

#[derive(Debug, Parser)]
#[command(
    name = "reqparse",
    version,
    about = "Normalize an XML, JSON or query-string payload and print it as JSON"
)]
struct Args {
    /// Input file (defaults to stdin)
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,
    /// Payload format; overrides --content-type and the file extension
    #[arg(short, long, value_enum)]
    format: Option<FormatArg>,
    /// Content-Type header value used to pick the format
    #[arg(short = 'c', long, value_name = "CONTENT_TYPE")]
    content_type: Option<String>,
    /// Output file (defaults to stdout)
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,
    /// Print compact JSON instead of pretty-printed
    #[arg(long)]
    compact: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatArg {
    Json,
    Xml,
    #[value(alias = "qs")]
    Query,
}

impl From<FormatArg> for Format {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Json => Format::Json,
            FormatArg::Xml => Format::Xml,
            FormatArg::Query => Format::QueryStr,
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();

    if let Err(err) = run() {
        error!("{err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = Args::parse();

    let body = read_input(&args.input)?;
    let format = select_format(&args);
    debug!(%format, bytes = body.len(), "normalizing payload");

    let value = PayloadParser::default()
        .parse_as(format, &body)
        .with_context(|| match &args.input {
            Some(path) => format!("failed to parse {}", path.display()),
            None => "failed to parse stdin".to_string(),
        })?;

    let mut rendered = if args.compact {
        serde_json::to_string(&value)
    } else {
        serde_json::to_string_pretty(&value)
    }
    .context("failed to render value as json")?;
    rendered.push('\n');

    write_output(&args.output, rendered.as_bytes())
}

/// `--format`, then `--content-type`, then the input extension, then JSON
fn select_format(args: &Args) -> Format {
    args.format
        .map(Format::from)
        .or_else(|| args.content_type.as_deref().and_then(detect_format))
        .or_else(|| args.input.as_ref().and_then(detect_format_from_path))
        .unwrap_or(Format::DEFAULT)
}

fn read_input(path: &Option<PathBuf>) -> Result<Vec<u8>> {
    match path {
        Some(path) => std::fs::read(path)
            .with_context(|| format!("failed to read input file {}", path.display())),
        None => {
            let mut buffer = Vec::new();
            io::stdin()
                .read_to_end(&mut buffer)
                .context("failed to read stdin")?;
            Ok(buffer)
        }
    }
}

fn write_output(path: &Option<PathBuf>, data: &[u8]) -> Result<()> {
    match path {
        Some(path) => std::fs::write(path, data)
            .with_context(|| format!("failed to write output file {}", path.display())),
        None => {
            let mut stdout = io::stdout();
            stdout.write_all(data).context("failed to write stdout")?;
            Ok(())
        }
    }
}
