use std::io::{self, BufRead};
use std::net::SocketAddr;
use std::path::PathBuf;

use eyre::{Result, WrapErr, bail};
use log::{debug, info};

mod cli;

use cli::{Cli, Command};
use tldw::Summarizer;
use tldw::config::Config;
use tldw::server::{self, AppState};

const CREDENTIALS: [&str; 5] = [
    "RAPIDAPI_KEY",
    "GROQ_API_KEY",
    "OPENAI_API_KEY",
    "ANTHROPIC_API_KEY",
    "HUGGINGFACE_API_KEY",
];

fn setup_logging(verbose: bool) -> Result<()> {
    let log_dir = log_dir();
    std::fs::create_dir_all(&log_dir)?;
    let log_file = log_dir.join("tldw.log");

    let target = Box::new(std::fs::OpenOptions::new().create(true).append(true).open(&log_file)?);

    let default_filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized: {}", log_file.display());
    Ok(())
}

fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tldw")
        .join("logs")
}

fn build_after_help() -> String {
    let credential_lines = CREDENTIALS
        .iter()
        .map(|name| {
            if std::env::var(name).is_ok_and(|v| !v.trim().is_empty()) {
                format!("  \x1b[32m✅\x1b[0m {name}")
            } else {
                format!("  \x1b[31m❌\x1b[0m {name}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n");

    let log_path = log_dir().join("tldw.log");

    format!(
        "\nCREDENTIALS (only the selected providers need theirs):\n{credential_lines}\n\nLogs are written to: {}",
        log_path.display()
    )
}

/// Config file values, overridden by whatever was given on the command line
fn resolve_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load(cli.config.as_deref())?;

    if let Some(provider) = cli.transcript_provider {
        config.transcript.provider = provider;
    }
    if let Some(provider) = cli.summary_provider {
        config.summary.provider = provider;
    }
    if let Some(ref model) = cli.model {
        config.summary.model = Some(model.clone());
    }
    if let Some(ref lang) = cli.lang {
        config.transcript.lang = lang.clone();
    }
    if let Some(max_chars) = cli.max_chars {
        config.normalize.max_chars = max_chars;
    }
    if let Command::Serve { ref bind, port } = cli.command {
        if let Some(bind) = bind {
            config.server.bind = bind.clone();
        }
        if let Some(port) = port {
            config.server.port = port;
        }
    }

    debug!("Resolved config: {config:?}");
    Ok(config)
}

async fn serve(config: &Config) -> Result<()> {
    let summarizer = Summarizer::from_config(config)?;

    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port)
        .parse()
        .wrap_err_with(|| format!("invalid bind address {}:{}", config.server.bind, config.server.port))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    println!("tldw listening on http://{}", listener.local_addr()?);

    server::serve(listener, AppState::new(summarizer)).await
}

async fn summarize(config: &Config, url: Option<&str>) -> Result<()> {
    let summarizer = Summarizer::from_config(config)?;

    // Collect URLs: from arg or stdin
    let urls = if let Some(url) = url {
        vec![url.to_string()]
    } else {
        let stdin = io::stdin();
        stdin.lock().lines().collect::<Result<Vec<_>, _>>()?
    };

    if urls.iter().all(|u| u.trim().is_empty()) {
        bail!("no URL provided\n\nUsage: tldw summarize <URL>\n       echo <URL> | tldw summarize");
    }

    for url in urls.iter().map(|u| u.trim()).filter(|u| !u.is_empty()) {
        let summary = summarizer
            .summarize_url(url)
            .await
            .wrap_err_with(|| format!("could not summarize {url}"))?;
        println!("{summary}");
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let after_help = build_after_help();
    let cmd = <Cli as clap::CommandFactory>::command().after_help(after_help);
    let matches = cmd.get_matches();
    let cli = <Cli as clap::FromArgMatches>::from_arg_matches(&matches)?;

    setup_logging(cli.verbose)?;

    let config = resolve_config(&cli)?;

    match cli.command {
        Command::Serve { .. } => serve(&config).await,
        Command::Summarize { ref url } => summarize(&config, url.as_deref()).await,
    }
}
