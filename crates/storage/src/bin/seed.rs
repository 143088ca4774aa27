use std::fmt;

use chrono::{DateTime, Utc};
use flashcards_core::model::{FlashcardDraft, QuizScore, ResponseType, validate_title};
use storage::{NewFlashcardRecord, NewStudySetRecord, Storage};

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    title: String,
    cards: u32,
    scores: u32,
    now: Option<DateTime<Utc>>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidCards { raw: String },
    InvalidScores { raw: String },
    InvalidNow { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidCards { raw } => write!(f, "invalid --cards value: {raw}"),
            ArgsError::InvalidScores { raw } => write!(f, "invalid --scores value: {raw}"),
            ArgsError::InvalidNow { raw } => {
                write!(f, "invalid --now value (expected RFC3339): {raw}")
            }
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

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("FLASHCARDS_DB_URL")
            .unwrap_or_else(|_| "sqlite://flashcards.sqlite3".into());
        let mut title = "European capitals".to_string();
        let mut cards = 5;
        let mut scores = 2;
        let mut now: Option<DateTime<Utc>> = None;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--title" => {
                    title = require_value(&mut args, "--title")?;
                }
                "--cards" => {
                    let value = require_value(&mut args, "--cards")?;
                    cards = value
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidCards { raw: value.clone() })?;
                }
                "--scores" => {
                    let value = require_value(&mut args, "--scores")?;
                    scores = value
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidScores { raw: value.clone() })?;
                }
                "--now" => {
                    let value = require_value(&mut args, "--now")?;
                    let parsed = DateTime::parse_from_rfc3339(&value)
                        .map_err(|_| ArgsError::InvalidNow { raw: value.clone() })?
                        .with_timezone(&Utc);
                    now = Some(parsed);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            title,
            cards,
            scores,
            now,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>   SQLite URL (default: sqlite://flashcards.sqlite3)");
    eprintln!("  --title <text>      Study set title (default: European capitals)");
    eprintln!("  --cards <n>         Number of sample cards (default: 5)");
    eprintln!("  --scores <n>        Number of sample quiz scores (default: 2)");
    eprintln!("  --now <rfc3339>     Fixed current time for deterministic seeding");
    eprintln!("  -h, --help          Show this help");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  FLASHCARDS_DB_URL");
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;
    let now = args.now.unwrap_or_else(Utc::now);

    let set_id = storage
        .sets
        .insert_new_set(NewStudySetRecord {
            title: validate_title(args.title.clone())?,
            created_at: now,
        })
        .await?;

    let samples = [
        ("Capital of France?", "Paris"),
        ("Capital of Italy?", "Rome"),
        ("Capital of Spain?", "Madrid"),
        ("Capital of Portugal?", "Lisbon"),
        ("Capital of Austria?", "Vienna"),
    ];
    for i in 0..args.cards {
        let (prompt, response) = samples[(i as usize) % samples.len()];
        let card = FlashcardDraft::new(prompt, response, ResponseType::Text).validate(now)?;
        // Card first, then the reference, same order the services layer uses.
        let card_id = storage
            .flashcards
            .insert_new_flashcard(NewFlashcardRecord::from_validated(card))
            .await?;
        storage.sets.link_card(set_id, card_id).await?;
    }

    for i in 0..args.scores {
        let fraction = f64::from(i + 1) / f64::from(args.scores + 1);
        storage
            .sets
            .append_quiz_score(set_id, QuizScore::new(fraction)?)
            .await?;
    }

    println!(
        "Seeded study set {} with {} cards and {} quiz scores into {}",
        set_id, args.cards, args.scores, args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
