use std::fmt;

/// One line typed at the quiz prompt. Positions and options are zero-based
/// here; the prompt itself counts from one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Next,
    Previous,
    GoTo(usize),
    Answer(Vec<usize>),
    Clear,
    Reset,
    Show,
    Keywords,
    Finish,
    Quit,
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    Empty,
    Unknown(String),
    MissingNumber { command: &'static str },
    InvalidNumber { raw: String },
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputError::Empty => write!(f, "type a command, or h for help"),
            InputError::Unknown(raw) => write!(f, "unknown command: {raw}"),
            InputError::MissingNumber { command } => write!(f, "{command} needs a number"),
            InputError::InvalidNumber { raw } => write!(f, "not a number from 1 up: {raw}"),
        }
    }
}

impl std::error::Error for InputError {}

fn one_based(raw: &str) -> Result<usize, InputError> {
    raw.trim()
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .ok_or_else(|| InputError::InvalidNumber {
            raw: raw.trim().to_string(),
        })
}

/// Parse a prompt line.
///
/// # Errors
///
/// Returns `InputError` for blank lines, unknown commands and bad numbers.
pub fn parse(line: &str) -> Result<Input, InputError> {
    let line = line.trim();
    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (line, ""),
    };

    match head.to_ascii_lowercase().as_str() {
        "" => Err(InputError::Empty),
        "n" | "next" => Ok(Input::Next),
        "p" | "prev" => Ok(Input::Previous),
        "g" | "go" => {
            if rest.is_empty() {
                return Err(InputError::MissingNumber { command: "g" });
            }
            one_based(rest).map(Input::GoTo)
        }
        "a" | "answer" => {
            if rest.is_empty() {
                return Err(InputError::MissingNumber { command: "a" });
            }
            rest.split([',', ' '])
                .filter(|part| !part.trim().is_empty())
                .map(one_based)
                .collect::<Result<Vec<_>, _>>()
                .map(Input::Answer)
        }
        "c" | "clear" => Ok(Input::Clear),
        "r" | "reset" => Ok(Input::Reset),
        "s" | "show" => Ok(Input::Show),
        "k" | "keywords" => Ok(Input::Keywords),
        "f" | "finish" => Ok(Input::Finish),
        "q" | "quit" => Ok(Input::Quit),
        "h" | "help" | "?" => Ok(Input::Help),
        _ => Err(InputError::Unknown(head.to_string())),
    }
}

pub const HELP: &str = "\
  n            next question
  p            previous question
  g <k>        go to question k
  a <i>[,<j>]  answer with option(s) i, j, ...
  c            clear this answer
  r            reset this question
  s            show the correct answer
  k            highlight this question's keywords
  f            finish and see results
  q            quit (progress is kept)
  h            this help";
