use std::io::{self, BufRead};
use std::path::PathBuf;
use std::time::Duration;

use clap::ValueEnum;
use eyre::{Result, bail};
use log::{debug, info, warn};

mod cli;

use cli::{Cli, OutputFormat};
use ytscribe::captions::{CaptionSource, DelegatedSource, DirectSource, LanguagePreference, Strategy};
use ytscribe::config::Config;
use ytscribe::metadata::MetadataFetcher;
use ytscribe::pipeline::{JobStatus, Pipeline};
use ytscribe::{Transcript, output};

fn setup_logging() -> Result<()> {
    let log_dir = log_dir();
    std::fs::create_dir_all(&log_dir)?;
    let log_file = log_dir.join("ytscribe.log");

    let target = Box::new(std::fs::OpenOptions::new().create(true).append(true).open(&log_file)?);

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized: {}", log_file.display());
    Ok(())
}

fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ytscribe")
        .join("logs")
}

fn build_after_help() -> String {
    format!(
        "\nConfig is read from: {}\nLogs are written to: {}",
        ytscribe::config::config_path().display(),
        log_dir().join("ytscribe.log").display()
    )
}

fn caption_source(cli: &Cli, config: &Config, client: &reqwest::Client) -> Result<Box<dyn CaptionSource>> {
    let strategy = cli.strategy.or(config.strategy).unwrap_or_default();

    match strategy {
        Strategy::Direct => {
            let languages = if !cli.langs.is_empty() {
                LanguagePreference::new(cli.langs.iter().cloned())
            } else if let Some(ref langs) = config.languages {
                LanguagePreference::new(langs.iter().cloned())
            } else {
                LanguagePreference::default()
            };
            let proxies = if !cli.proxies.is_empty() {
                cli.proxies.clone()
            } else {
                config.proxies.clone().unwrap_or_default()
            };
            debug!("Direct caption source: languages={:?} proxies={proxies:?}", languages.languages());

            Ok(Box::new(
                DirectSource::new(client.clone())
                    .with_languages(languages)
                    .with_proxies(proxies),
            ))
        }
        Strategy::Delegated => {
            let command = match cli.extractor {
                Some(ref cmd) => cmd.split_whitespace().map(str::to_string).collect(),
                None => config.extractor.clone().unwrap_or_default(),
            };
            let Some(source) = DelegatedSource::from_command(&command) else {
                bail!(
                    "the delegated strategy needs an extractor command\n\n\
                     Pass --extractor \"python3 transcript.py\" or set `extractor` in {}",
                    ytscribe::config::config_path().display()
                );
            };
            let timeout = cli
                .timeout
                .or(config.extractor_timeout_secs)
                .map(Duration::from_secs)
                .unwrap_or(ytscribe::captions::delegated::DEFAULT_TIMEOUT);
            debug!("Delegated caption source: {command:?} timeout={timeout:?}");

            Ok(Box::new(source.with_timeout(timeout)))
        }
    }
}

fn output_format(cli: &Cli, config: &Config) -> OutputFormat {
    cli.format
        .or_else(|| {
            config
                .default_format
                .as_deref()
                .and_then(|f| OutputFormat::from_str(f, true).ok())
        })
        .unwrap_or(OutputFormat::Text)
}

fn render(transcript: &Transcript, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Text => output::render_text(transcript),
        OutputFormat::Json => output::render_json(transcript)?,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging()?;

    let after_help = build_after_help();
    let cmd = <Cli as clap::CommandFactory>::command().after_help(after_help);
    let matches = cmd.get_matches();
    let cli = <Cli as clap::FromArgMatches>::from_arg_matches(&matches)?;

    // Load config file (non-fatal if missing/invalid)
    let config = Config::load().unwrap_or_else(|e| {
        warn!("Ignoring config {}: {e}", ytscribe::config::config_path().display());
        eprintln!(
            "warning: ignoring invalid config {}: {e}",
            ytscribe::config::config_path().display()
        );
        Config::default()
    });

    if cli.verbose {
        let config_path = ytscribe::config::config_path();
        if config_path.exists() {
            eprintln!("Config: {}", config_path.display());
        }
    }

    // Collect URLs: from args or stdin
    let urls: Vec<String> = if !cli.urls.is_empty() {
        cli.urls.clone()
    } else {
        let stdin = io::stdin();
        stdin.lock().lines().collect::<Result<Vec<_>, _>>()?
    };
    let urls: Vec<String> = urls
        .into_iter()
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .collect();

    if urls.is_empty() {
        bail!("no URL or video ID provided\n\nUsage: ytscribe <URL>...\n       echo <URL> | ytscribe");
    }

    let client = reqwest::Client::new();
    let mut metadata = MetadataFetcher::new(client.clone());
    if let Some(ref endpoint) = config.oembed_url {
        metadata = metadata.with_endpoint(endpoint.clone());
    }
    if let Some(quality) = config.thumbnail {
        metadata = metadata.with_thumbnail_quality(quality);
    }

    let pipeline = Pipeline::new(metadata, caption_source(&cli, &config, &client)?);
    let format = output_format(&cli, &config);
    let total = urls.len();

    let jobs = pipeline
        .run_batch(&urls, |idx, job| {
            if cli.verbose && !matches!(job.status, JobStatus::Pending) {
                eprintln!("[{}/{total}] {}: {}", idx + 1, job.status.label(), job.url);
            }
        })
        .await;

    if let Some(ref dir) = cli.output_dir {
        std::fs::create_dir_all(dir)?;
    }

    let mut failed = 0;
    for job in &jobs {
        let transcript = match &job.status {
            JobStatus::Completed(t) => t,
            JobStatus::Failed(e) => {
                eprintln!("error: {}: {e}", job.url);
                failed += 1;
                continue;
            }
            JobStatus::Pending | JobStatus::Downloading => continue,
        };

        if cli.verbose {
            eprintln!(
                "Video: {} ({})\nAuthor: {}\nThumbnail: {}\nCues: {}",
                transcript.title,
                transcript.video_id,
                transcript.author,
                transcript.thumbnail_url,
                transcript.cues.len(),
            );
        }
        if transcript.cues.is_empty() {
            eprintln!("warning: {}: transcript is empty", job.url);
        }

        let rendered = render(transcript, format)?;

        if let Some(ref dir) = cli.output_dir {
            let ext = match format {
                OutputFormat::Text => "txt",
                OutputFormat::Json => "json",
            };
            let path = dir.join(format!("{}.{ext}", transcript.video_id));
            std::fs::write(&path, &rendered)?;
            if cli.verbose {
                eprintln!("Output written to: {}", path.display());
            }
        } else if total > 1 {
            println!("==> {} ({}) <==\n{rendered}\n", transcript.title, transcript.video_id);
        } else {
            println!("{rendered}");
        }
    }

    if failed > 0 {
        bail!("{failed} of {total} videos failed");
    }

    Ok(())
}
