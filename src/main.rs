//! `litepub`: serve a directory of (X)HTML documents as ad-free EPUBs.

mod error;

use crate::error::{ErrorKind, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use exn::ResultExt;
use litepub_config::{Config, Overrides};
use litepub_storage::{ContentRoot, write_atomic};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Crates whose events are shown by default.
const LOG_TARGETS: [&str; 7] = [
    "litepub",
    "litepub_config",
    "litepub_storage",
    "litepub_sanitize",
    "litepub_epub",
    "litepub_server",
    "tower_http",
];

#[derive(Debug, Parser)]
#[command(name = "litepub", version, about)]
struct Cli {
    /// Configuration file [default: litepub.toml in the user config directory]
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
    /// More logging (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the content root (the default command)
    Serve(ServeArgs),
    /// Convert a single document into an EPUB file
    Convert(ConvertArgs),
    /// Generate a self-signed certificate for localhost (development only)
    GenCert(GenCertArgs),
}

#[derive(Debug, Default, Args)]
struct ServeArgs {
    /// Address to listen on
    #[arg(long)]
    host: Option<String>,
    #[arg(short, long)]
    port: Option<u16>,
    /// Directory to serve
    #[arg(short, long, value_name = "DIR")]
    root: Option<PathBuf>,
    /// PEM certificate chain
    #[arg(long, value_name = "FILE")]
    cert: Option<PathBuf>,
    /// PEM private key
    #[arg(long, value_name = "FILE")]
    key: Option<PathBuf>,
    /// Serve plain HTTP
    #[arg(long)]
    no_tls: bool,
}
impl From<ServeArgs> for Overrides {
    fn from(args: ServeArgs) -> Self {
        Self { host: args.host, port: args.port, root: args.root, cert: args.cert, key: args.key, no_tls: args.no_tls }
    }
}

#[derive(Debug, Args)]
struct ConvertArgs {
    /// `.html`, `.htm` or `.xhtml` document
    file: PathBuf,
    /// Where to write the EPUB [default: <stem>.epub next to the document]
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
    /// Only embed assets inside this directory [default: the document's directory]
    #[arg(short, long, value_name = "DIR")]
    root: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct GenCertArgs {
    /// Where to write the certificate [default: the configured `server.tls.cert`]
    #[arg(long, value_name = "FILE")]
    cert: Option<PathBuf>,
    /// Where to write the private key [default: the configured `server.tls.key`]
    #[arg(long, value_name = "FILE")]
    key: Option<PathBuf>,
}
impl From<GenCertArgs> for Overrides {
    fn from(args: GenCertArgs) -> Self {
        Self { cert: args.cert, key: args.key, ..Self::default() }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err:?}");
            ExitCode::FAILURE
        },
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let default = LOG_TARGETS.map(|target| format!("{target}={level}")).join(",");
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command.unwrap_or(Command::Serve(ServeArgs::default())) {
        Command::Serve(args) => {
            let config = Config::load(cli.config.as_deref(), args.into()).or_raise(|| ErrorKind::Config)?;
            tracing::debug!(?config, "Loaded configuration");
            litepub_server::serve(&config).await.or_raise(|| ErrorKind::Server)
        },
        Command::Convert(args) => {
            let file = args.file.clone();
            tokio::task::spawn_blocking(move || convert(args)).await.or_raise(|| ErrorKind::Convert(file))?
        },
        Command::GenCert(args) => {
            let config = Config::load(cli.config.as_deref(), args.into()).or_raise(|| ErrorKind::Config)?;
            let tls = config.server.tls;
            tokio::task::spawn_blocking(move || litepub_server::tls::generate_self_signed(&tls.cert, &tls.key))
                .await
                .or_raise(|| ErrorKind::Certificate)?
                .or_raise(|| ErrorKind::Certificate)
        },
    }
}

fn convert(args: ConvertArgs) -> Result<()> {
    let file = args.file.canonicalize().or_raise(|| ErrorKind::Convert(args.file.clone()))?;
    let root = match args.root {
        Some(root) => root,
        None => file.parent().map(PathBuf::from).unwrap_or_default(),
    };
    let root = ContentRoot::open(&root).or_raise(|| ErrorKind::Convert(file.clone()))?;
    let epub = litepub_epub::convert(&file, &root).or_raise(|| ErrorKind::Convert(file.clone()))?;
    let output = args.output.unwrap_or_else(|| file.with_file_name(epub.file_name()));
    write_atomic(&output, &epub.bytes).or_raise(|| ErrorKind::Write(output.clone()))?;
    tracing::info!(output = %output.display(), bytes = epub.bytes.len(), "Wrote EPUB");
    Ok(())
}
