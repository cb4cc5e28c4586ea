mod input;
mod render;

use std::fmt;
use std::io::Write as _;
use std::sync::Arc;

use quiz_core::config::{QuizConfig, QuizLength, QuizPreset, UnknownLength, UnknownPreset};
use quiz_core::model::{QuestionKind, Selection};
use quiz_core::scoring::score;
use services::{
    AppServices, Clock, CommandOutcome, DatasetSource, FileDatasetSource, HttpDatasetSource,
    QuizLoopService, ScoredResults, SessionCommand,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use crate::input::Input;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidCount { raw: String },
    UnknownPreset(UnknownPreset),
    UnknownLength(UnknownLength),
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidCount { raw } => write!(f, "invalid --count value: {raw}"),
            ArgsError::UnknownPreset(e) => write!(f, "invalid --quiz value: {e}"),
            ArgsError::UnknownLength(e) => write!(f, "invalid --length value: {e}"),
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

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- start   [--quiz <preset>] [--length <length>] [--count <n>]");
    eprintln!("                              [--data-file <file>]");
    eprintln!("  cargo run -p app -- resume");
    eprintln!("  cargo run -p app -- results");
    eprintln!();
    eprintln!("Options for every command:");
    eprintln!("  --db <sqlite_url>         default sqlite:quiz.sqlite3");
    eprintln!("  --data <dir-or-http-url>  where data/<file> is read from, default .");
    eprintln!();
    eprintln!("Presets: quiz1, quiz2, quiz3, full (default)");
    eprintln!("Lengths: quick (10), standard (20), extended (30), exam (65)");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_DB_URL, QUIZ_DATA, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Start,
    Resume,
    Results,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "start" => Some(Self::Start),
            "resume" => Some(Self::Resume),
            "results" => Some(Self::Results),
            _ => None,
        }
    }
}

/// Quiz selection given to `start`.
#[derive(Debug, Default, PartialEq, Eq)]
struct StartOptions {
    preset: Option<QuizPreset>,
    length: Option<QuizLength>,
    count: Option<i64>,
    data_file: Option<String>,
}

impl StartOptions {
    /// `--length` alone reads the default dataset; with `--quiz` it only sets
    /// the count. `--count` wins over both.
    fn into_config(self, clock: Clock) -> QuizConfig {
        let mut config = match (self.preset, self.length) {
            (None, Some(length)) => QuizConfig::from_length(length, clock.now()),
            (preset, _) => {
                QuizConfig::from_preset(preset.unwrap_or(QuizPreset::Full), clock.now())
            }
        };
        if let Some(length) = self.length {
            config.question_count = i64::from(length.question_count());
        }
        if let Some(count) = self.count {
            config.question_count = count;
        }
        if let Some(data_file) = self.data_file {
            config.data_file = data_file;
        }
        config
    }
}

#[derive(Debug, PartialEq, Eq)]
struct Args {
    db_url: String,
    data: String,
    start: StartOptions,
}

impl Args {
    fn defaults_from_env() -> Self {
        Self {
            db_url: std::env::var("QUIZ_DB_URL")
                .ok()
                .map_or_else(|| normalize_sqlite_url("quiz.sqlite3".into()), normalize_sqlite_url),
            data: std::env::var("QUIZ_DATA").unwrap_or_else(|_| ".".into()),
            start: StartOptions::default(),
        }
    }

    fn parse(
        command: Command,
        mut parsed: Self,
        args: &mut impl Iterator<Item = String>,
    ) -> Result<Self, ArgsError> {
        while let Some(arg) = args.next() {
            match (arg.as_str(), command) {
                ("--db", _) => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    parsed.db_url = normalize_sqlite_url(value);
                }
                ("--data", _) => parsed.data = require_value(args, "--data")?,
                ("--quiz", Command::Start) => {
                    let value = require_value(args, "--quiz")?;
                    parsed.start.preset = Some(value.parse().map_err(ArgsError::UnknownPreset)?);
                }
                ("--length", Command::Start) => {
                    let value = require_value(args, "--length")?;
                    parsed.start.length = Some(value.parse().map_err(ArgsError::UnknownLength)?);
                }
                ("--count", Command::Start) => {
                    let value = require_value(args, "--count")?;
                    let count: i64 = value
                        .trim()
                        .parse()
                        .map_err(|_| ArgsError::InvalidCount { raw: value.clone() })?;
                    parsed.start.count = Some(count);
                }
                ("--data-file", Command::Start) => {
                    parsed.start.data_file = Some(require_value(args, "--data-file")?);
                }
                ("--help" | "-h", _) => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }
        Ok(parsed)
    }
}

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

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

fn dataset_source(data: &str) -> Arc<dyn DatasetSource> {
    if data.starts_with("http://") || data.starts_with("https://") {
        Arc::new(HttpDatasetSource::new(data))
    } else {
        Arc::new(FileDatasetSource::new(data))
    }
}

fn selection_for(kind: QuestionKind, indices: Vec<usize>) -> Selection {
    if let (QuestionKind::Single, [index]) = (kind, indices.as_slice()) {
        return Selection::single(*index);
    }
    Selection::multiple(indices)
}

fn prompt() -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    write!(stdout, "> ")?;
    stdout.flush()
}

/// Interactive loop over one attempt. Returns when the user quits, finishes or
/// closes stdin.
async fn play(quiz_loop: &QuizLoopService) -> Result<(), Box<dyn std::error::Error>> {
    let start = quiz_loop.initialize().await?;
    let mut session = start.session;
    if start.resumed {
        println!("Resuming your saved quiz.");
    }
    let clock = quiz_loop.clock();
    print!("{}", render::question(&session, clock.now()));
    println!("Type h for help.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt()?;
        let Some(line) = lines.next_line().await? else {
            println!();
            return Ok(());
        };
        let input = match input::parse(&line) {
            Ok(input) => input,
            Err(e) => {
                println!("{e}");
                continue;
            }
        };

        let position = session.current_position();
        let command = match input {
            Input::Quit => {
                println!("Progress saved. Run `resume` to continue.");
                return Ok(());
            }
            Input::Help => {
                println!("{}", input::HELP);
                continue;
            }
            Input::Keywords => {
                print!("{}", render::keywords(&session));
                continue;
            }
            Input::Next => SessionCommand::Next,
            Input::Previous => SessionCommand::Previous,
            Input::GoTo(target) => SessionCommand::GoTo(target),
            Input::Answer(indices) => SessionCommand::Answer {
                position,
                selection: selection_for(session.current_question().kind(), indices),
            },
            Input::Clear => SessionCommand::ClearAnswer { position },
            Input::Reset => SessionCommand::Reset,
            Input::Show => SessionCommand::Reveal,
            Input::Finish => SessionCommand::Complete,
        };

        match quiz_loop.apply(&mut session, command).await? {
            CommandOutcome::Revealed(answer) => print!("{}", render::revealed(&session, &answer)),
            CommandOutcome::Completed(snapshot) => {
                let report = score(&snapshot);
                print!("{}", render::results(&ScoredResults { snapshot, report }));
                return Ok(());
            }
            CommandOutcome::Ignored(reason) => println!("{reason}"),
            _ => print!("{}", render::question(&session, clock.now())),
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut argv = std::env::args().skip(1);
    let cmd = match argv.next() {
        None => {
            print_usage();
            return Ok(());
        }
        Some(first) if first == "--help" || first == "-h" => {
            print_usage();
            return Ok(());
        }
        Some(first) => Command::from_arg(&first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    let parsed = Args::parse(cmd, Args::defaults_from_env(), &mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    // Open + migrate SQLite at startup; the services only see the storage trait.
    prepare_sqlite_file(&parsed.db_url)?;
    tracing::debug!(db = %parsed.db_url, data = %parsed.data, ?cmd, "opening storage");
    let clock = Clock::default_clock();
    let services =
        AppServices::new_sqlite(&parsed.db_url, dataset_source(&parsed.data), clock).await?;

    match cmd {
        Command::Start => {
            let config = parsed.start.into_config(clock);
            services.quiz_loop().configure(&config).await?;
            play(&services.quiz_loop()).await
        }
        Command::Resume => play(&services.quiz_loop()).await,
        Command::Results => {
            match services.results().latest().await? {
                Some(scored) => print!("{}", render::results(&scored)),
                None => println!("No completed quiz yet. Run `start` to take one."),
            }
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
