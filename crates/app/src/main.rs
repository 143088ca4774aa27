use std::fmt;

use api::{AppState, Config};
use services::{AppServices, Clock};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt as log_fmt};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidPort { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidPort { raw } => write!(f, "invalid --port value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

/// Command-line overrides on top of the environment config.
#[derive(Debug, Default, PartialEq, Eq)]
struct Args {
    db_url: Option<String>,
    port: Option<u16>,
    sweep_orphans: bool,
}

impl Args {
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Self, ArgsError> {
        let mut parsed = Self::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    parsed.db_url = Some(value);
                }
                "--port" => {
                    let value = require_value(&mut args, "--port")?;
                    let port = value
                        .parse::<u16>()
                        .map_err(|_| ArgsError::InvalidPort { raw: value.clone() })?;
                    parsed.port = Some(port);
                }
                "--sweep-orphans" => parsed.sweep_orphans = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }
        Ok(parsed)
    }

    fn apply(self, config: &mut Config) {
        if let Some(db_url) = self.db_url {
            config.db_url = normalize_sqlite_url(db_url);
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        config.sweep_on_start |= self.sweep_orphans;
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- [--db <sqlite_url>] [--port <port>] [--sweep-orphans]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite://flashcards.sqlite3");
    eprintln!("  --port 3001");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  FLASHCARDS_DB_URL, FLASHCARDS_PORT, FLASHCARDS_ALLOWED_ORIGIN,");
    eprintln!("  FLASHCARDS_SWEEP_ON_START, RUST_LOG");
}

/// Accept bare paths and `sqlite:` paths, turning them into absolute `sqlite://` URLs.
fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

/// Create the parent directory of a file-backed database.
fn prepare_sqlite_dir(db_url: &str) -> std::io::Result<()> {
    let Some(path) = db_url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    let path = path.split('?').next().unwrap_or(path);
    if let Some(parent) = std::path::Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse(std::env::args().skip(1)).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    log_fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut config = Config::load()?;
    args.apply(&mut config);

    info!("Opening database {}", config.db_url);
    prepare_sqlite_dir(&config.db_url)?;
    let services = AppServices::new_sqlite(&config.db_url, Clock::default()).await?;

    if config.sweep_on_start {
        let report = services.sweep().run().await?;
        info!(
            orphans = report.orphans.len(),
            dangling = report.dangling.len(),
            "Startup sweep finished"
        );
    }

    api::serve(AppState::new(&services), &config).await?;
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Result<Args, ArgsError> {
        Args::parse(raw.iter().map(|s| (*s).to_string()))
    }

    #[test]
    fn parses_overrides() {
        let parsed = args(&["--db", "sqlite://x.db", "--port", "8080", "--sweep-orphans"]).unwrap();
        assert_eq!(
            parsed,
            Args {
                db_url: Some("sqlite://x.db".into()),
                port: Some(8080),
                sweep_orphans: true,
            }
        );

        let mut config = Config::default();
        parsed.apply(&mut config);
        assert_eq!(config.db_url, "sqlite://x.db");
        assert_eq!(config.port, 8080);
        assert!(config.sweep_on_start);
    }

    #[test]
    fn rejects_bad_arguments() {
        assert!(matches!(
            args(&["--port", "http"]),
            Err(ArgsError::InvalidPort { .. })
        ));
        assert!(matches!(
            args(&["--db"]),
            Err(ArgsError::MissingValue { flag: "--db" })
        ));
        assert!(matches!(args(&["--verbose"]), Err(ArgsError::UnknownArg(_))));
    }

    #[test]
    fn bare_paths_become_sqlite_urls() {
        assert_eq!(
            normalize_sqlite_url("sqlite://a.db".into()),
            "sqlite://a.db"
        );
        let url = normalize_sqlite_url("/tmp/cards.db".into());
        assert_eq!(url, "sqlite:///tmp/cards.db");
    }
}
