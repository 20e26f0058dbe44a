//! lip - tooth package manager

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use url::Url;

use lip_pm::commands::{self, MigrateOutcome, ToothInit, MANIFEST_FILE};
use lip_pm::config::{self, Config};
use lip_pm::manifest::ManifestDocument;
use lip_pm::url::{
    cache_key, module_zip_url, rewrite_for_mirror, version_list_url, DownloadCache, UrlFetcher,
};
use lip_pm::{resolver, Platform, Specifier};

#[derive(Parser)]
#[command(name = "lip")]
#[command(author, version, about = "lip - a package manager for teeth")]
struct Cli {
    /// Show debug output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only show warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Work with the tooth in the current directory
    Tooth {
        #[command(subcommand)]
        command: ToothCommands,
    },
    /// Manage the download cache
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },
    /// Resolve a tooth specifier against the module proxy
    Resolve {
        /// Tooth repo, optionally with version: github.com/tooth-hub/llbds3@1.0.0
        specifier: String,
    },
}

#[derive(Subcommand)]
enum ToothCommands {
    /// Write a new tooth.json in the current directory
    Init {
        /// Tooth path (e.g. github.com/tooth-hub/llbds3)
        #[arg(long)]
        tooth: String,
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        /// GitHub username
        #[arg(long, default_value = "")]
        author: String,
    },
    /// Upgrade a legacy tooth.json for this platform
    Migrate {
        #[arg(default_value = MANIFEST_FILE)]
        path: PathBuf,
    },
    /// Validate a tooth.json
    Check {
        #[arg(default_value = MANIFEST_FILE)]
        path: PathBuf,
    },
}

#[derive(Subcommand)]
enum CacheCommands {
    /// Remove every cached download
    Purge,
    /// Print the cache file of a download URL
    Key {
        url: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Tooth { command } => run_tooth(command),
        Commands::Cache { command } => run_cache(command),
        Commands::Resolve { specifier } => resolve(&specifier),
    }
}

fn run_tooth(command: ToothCommands) -> Result<()> {
    match command {
        ToothCommands::Init {
            tooth,
            name,
            description,
            author,
        } => {
            let dir = std::env::current_dir().context("Failed to get working directory")?;
            let answers = ToothInit {
                tooth,
                name,
                description,
                author,
            };
            let path = commands::init_tooth(&dir, &answers)?;
            println!("Created {}", path.display());
        }
        ToothCommands::Migrate { path } => {
            let platform = Platform::current();
            let outcome = commands::migrate_file(&path, &platform)
                .with_context(|| format!("Failed to migrate {}", path.display()))?;
            match outcome {
                MigrateOutcome::Migrated => {
                    println!("Migrated {} for {}", path.display(), platform);
                    tracing::warn!("Rules for platforms other than {} were dropped", platform);
                }
                MigrateOutcome::AlreadyCurrent => {
                    println!("{} is already up to date", path.display())
                }
            }
        }
        ToothCommands::Check { path } => {
            let content =
                std::fs::read(&path).with_context(|| format!("Failed to read {}", path.display()))?;
            match ManifestDocument::from_bytes(&content)? {
                ManifestDocument::Current(manifest) => {
                    println!("{}@{} is valid", manifest.tooth, manifest.version);
                }
                ManifestDocument::Legacy(legacy) => {
                    println!(
                        "{}@{} uses format version 1; run `lip tooth migrate` to upgrade it",
                        legacy.tooth, legacy.version
                    );
                }
            }
        }
    }
    Ok(())
}

fn run_cache(command: CacheCommands) -> Result<()> {
    let cache_dir = config::cache_dir()?;

    match command {
        CacheCommands::Purge => {
            commands::purge_cache(&cache_dir)?;
            println!("Cache purged");
        }
        CacheCommands::Key { url } => {
            let url = Url::parse(&url).with_context(|| format!("Invalid URL: {}", url))?;
            let config = load_config()?;
            let url = rewrite_for_mirror(&url, &config.github_mirror_url()?);
            println!("{}", cache_key(&url));
            println!("{}", DownloadCache::new(cache_dir).path_for(&url).display());
        }
    }
    Ok(())
}

fn resolve(raw: &str) -> Result<()> {
    let specifier = Specifier::parse(raw)?;
    if specifier.archive_path().is_ok() {
        bail!("{} is a local archive and needs no resolution", specifier);
    }
    let repo = specifier.repo()?;

    let config = load_config()?;
    let proxy = config.go_module_proxy_url()?;
    let fetcher = UrlFetcher::with_proxy(config.proxy_url()?.as_ref())?;

    let list_url = version_list_url(repo, &proxy)?;
    let body = fetcher
        .fetch_text(&list_url)
        .with_context(|| format!("Failed to fetch version list of {}", repo))?;
    let candidates = resolver::parse_version_list(&body);

    let version = resolver::resolve_specifier(&specifier, &candidates)?;
    println!("{}@{}", repo, version);
    println!("{}", module_zip_url(repo, &version, &proxy)?);
    Ok(())
}

fn load_config() -> Result<Config> {
    let path = config::config_path()?;
    Config::load_or_create(&path)
        .with_context(|| format!("Failed to load config from {}", path.display()))
}
