//! Command types for shapescript
//!
//! One [`Command`] per matched script line. Variables have already been
//! substituted and shorthand lines expanded by the time a line becomes a
//! command, so every subject name is explicit.

/// Whether `move`/`size` coordinates are relative or absolute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    By,
    /// Also used when neither word is given
    #[default]
    To,
}

/// A single executable line
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `reset`
    Reset,
    /// `end`
    End,
    /// `wait 500`, `wait 2 seconds`
    Wait { count: u64, unit: Option<String> },
    /// `set greeting hello`, `string greeting = hello`
    SetString { name: String, value: String },
    /// `number n = 3 + 4`; the sum is taken when the line is parsed
    SetNumber { name: String, value: f64 },
    /// `goto line 4`
    GotoLine { line: usize },
    /// `goto mark top`
    GotoMark { mark: String },
    /// `mark top`
    Mark { mark: String },
    /// `new rectangle as box`, `object box = new rectangle`
    New { kind: String, name: Option<String> },
    /// `clone box as other`, `object other = clone box`
    Clone { from: String, to: Option<String> },
    /// `with box`
    With { name: String },
    /// `remove box`
    Remove { name: String },
    /// `move box by 10,`
    Move {
        name: String,
        mode: Mode,
        x: Option<f64>,
        y: Option<f64>,
    },
    /// `size box to 50,50`
    Size {
        name: String,
        mode: Mode,
        x: Option<f64>,
        y: Option<f64>,
    },
    /// `paint box red`
    Paint { name: String, color: String },
    /// `outline box blue 3`
    Outline {
        name: String,
        color: Option<String>,
        width: Option<f64>,
    },
    /// `write title Hello there`
    Write { name: String, text: String },
    /// `fontSize title 24`
    FontSize { name: String, size: f64 },
    /// `points roof 0,0 50,-40 100,0`
    Points { name: String, points: Vec<String> },
    /// `print %n`
    Print { text: String },
}

impl Command {
    /// The object a command acts on, if it names one
    pub fn subject(&self) -> Option<&str> {
        match self {
            Command::New { name, .. } => name.as_deref(),
            Command::Clone { from, .. } => Some(from),
            Command::With { name }
            | Command::Remove { name }
            | Command::Move { name, .. }
            | Command::Size { name, .. }
            | Command::Paint { name, .. }
            | Command::Outline { name, .. }
            | Command::Write { name, .. }
            | Command::FontSize { name, .. }
            | Command::Points { name, .. } => Some(name),
            _ => None,
        }
    }
}
