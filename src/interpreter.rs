//! Compile script text into a line program and run it against a scene.
//!
//! Compiling normalizes whitespace and expands shorthand lines (an indented
//! line borrows the subject of the last command that named one). Running
//! walks the program with a line counter: each line has its variables
//! substituted, is matched against the grammar, and is dispatched to the
//! scene. `goto` and `end` reassign the counter; `wait` is the only point
//! where a run suspends.

use std::collections::HashMap;

use crate::ast::{Command, Mode};
use crate::errors::{SceneError, ScriptError, SourceContext};
use crate::grammar::{self, Matched};
use crate::log::{debug, trace};
use crate::parse::BuildError;
use crate::scene::{DelayOutcome, Scene};
use crate::vars::{Clock, SystemClock, Variables};

/// Source name used in diagnostics when the host does not give one
pub const DEFAULT_SOURCE_NAME: &str = "<script>";

/// A compiled script: normalized, shorthand-expanded lines
#[derive(Debug, Clone)]
pub struct Program {
    source: SourceContext,
    lines: Vec<String>,
}

impl Program {
    fn empty(name: &str) -> Self {
        Program {
            source: SourceContext::new(name, ""),
            lines: Vec::new(),
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// 1-based line
    pub fn line(&self, number: usize) -> Option<&str> {
        number
            .checked_sub(1)
            .and_then(|idx| self.lines.get(idx))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The text the program was compiled from
    pub fn source(&self) -> &SourceContext {
        &self.source
    }
}

/// Run configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Stop after this many executed lines
    pub step_limit: Option<usize>,
    /// Publish each line on the info channel before running it
    pub echo: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            step_limit: None,
            echo: true,
        }
    }
}

/// How a run ended
#[derive(Debug)]
pub enum RunOutcome {
    /// Fell off the end of the program or hit `end`
    Finished,
    /// A line could not be run; nothing after it was executed
    Halted(ScriptError),
    /// The timers were cancelled while `line` was waiting
    Cancelled { line: usize },
    /// The step limit ran out before `line`
    StepLimitReached { line: usize },
}

impl RunOutcome {
    pub fn is_finished(&self) -> bool {
        matches!(self, RunOutcome::Finished)
    }

    /// The error that halted the run, if any
    pub fn error(&self) -> Option<&ScriptError> {
        match self {
            RunOutcome::Halted(err) => Some(err),
            _ => None,
        }
    }
}

/// What the counter does after a line
enum Flow {
    Next,
    /// Set the counter to this value, then advance as usual
    Jump(usize),
    Stop,
    Cancelled,
}

/// Collapse whitespace runs to one space and drop trailing whitespace
fn normalize(raw: &str) -> String {
    let mut line = String::with_capacity(raw.len());
    let mut in_space = false;
    for c in raw.chars() {
        if c.is_whitespace() {
            if !in_space {
                line.push(' ');
            }
            in_space = true;
        } else {
            line.push(c);
            in_space = false;
        }
    }
    let trimmed = line.trim_end().len();
    line.truncate(trimmed);
    line
}

/// Insert `subject` as the second word of an indented line
fn expand_shorthand(line: String, subject: Option<&str>) -> String {
    let Some(rest) = line.strip_prefix(' ') else {
        return line;
    };
    match subject {
        Some(subject) => {
            let mut words: Vec<&str> = rest.split(' ').collect();
            words.insert(1, subject);
            words.join(" ")
        }
        None => rest.to_string(),
    }
}

/// Owns a scene and runs scripts against it
pub struct Interpreter {
    scene: Scene,
    program: Program,
    variables: Variables,
    markers: HashMap<String, usize>,
    options: Options,
    clock: Box<dyn Clock>,
    source_name: String,
}

impl Interpreter {
    /// Take over `scene`, resetting it
    pub fn new(mut scene: Scene) -> Self {
        scene.reset();
        Interpreter {
            scene,
            program: Program::empty(DEFAULT_SOURCE_NAME),
            variables: Variables::new(),
            markers: HashMap::new(),
            options: Options::default(),
            clock: Box::new(SystemClock),
            source_name: DEFAULT_SOURCE_NAME.to_string(),
        }
    }

    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    /// Clock used for `%TIME` and `%DATE`
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Name shown in diagnostics, usually the script's file name
    pub fn with_source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = name.into();
        self
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn into_scene(self) -> Scene {
        self.scene
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn variables(&self) -> &Variables {
        &self.variables
    }

    pub fn markers(&self) -> &HashMap<String, usize> {
        &self.markers
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Replace the program. Markers and variables start over.
    pub fn compile(&mut self, text: &str) -> &Program {
        self.markers.clear();
        self.variables.clear();

        let mut context: Option<String> = None;
        let mut lines = Vec::new();
        if !text.is_empty() {
            for raw in text.split('\n') {
                let line = expand_shorthand(normalize(raw), context.as_deref());
                let matched = grammar::match_line(&line);
                if let Some(subject) = matched.as_ref().and_then(Matched::context) {
                    context = Some(subject.to_string());
                }
                lines.push(line);
            }
        }

        debug!(lines = lines.len(), "compiled");
        self.program = Program {
            source: SourceContext::new(self.source_name.clone(), text),
            lines,
        };
        &self.program
    }

    /// Compile `text` and run it from the first line
    pub async fn run(&mut self, text: &str) -> RunOutcome {
        self.compile(text);
        self.execute(1).await
    }

    /// Run the compiled program from `start_line` (1-based)
    pub async fn execute(&mut self, start_line: usize) -> RunOutcome {
        let mut counter = start_line.max(1);
        let mut steps = 0;

        let outcome = loop {
            let Some(raw) = self.program.line(counter) else {
                break RunOutcome::Finished;
            };
            let line = self.variables.substitute(raw, self.clock.as_ref());
            if line.is_empty() {
                counter += 1;
                continue;
            }
            if self.options.step_limit.is_some_and(|limit| steps >= limit) {
                break RunOutcome::StepLimitReached { line: counter };
            }
            steps += 1;

            let notifier = self.scene.notifier().clone();
            notifier.set_line(Some(counter));
            if self.options.echo {
                notifier.info(line.clone());
            }

            let command = match grammar::match_line(&line).map(|m| m.command) {
                Some(Ok(command)) => command,
                Some(Err(BuildError::Number(text))) => {
                    break self.halt(ScriptError::InvalidNumber {
                        text,
                        line_number: counter,
                        src: self.program.source.named_source(),
                        span: self.program.source.line_span(counter),
                    });
                }
                Some(Err(BuildError::Missing(_))) | None => {
                    break self.halt(ScriptError::InvalidCommand {
                        line,
                        line_number: counter,
                        src: self.program.source.named_source(),
                        span: self.program.source.line_span(counter),
                    });
                }
            };

            trace!(line = counter, ?command, "dispatch");
            match self.dispatch(command, counter).await {
                Flow::Next => counter += 1,
                Flow::Jump(value) => counter = value + 1,
                Flow::Stop => break RunOutcome::Finished,
                Flow::Cancelled => break RunOutcome::Cancelled { line: counter },
            }
        };

        self.scene.notifier().set_line(None);
        debug!(steps, ?outcome, "run ended");
        outcome
    }

    fn halt(&self, err: ScriptError) -> RunOutcome {
        self.scene.notifier().error(err.to_string());
        RunOutcome::Halted(err)
    }

    async fn dispatch(&mut self, command: Command, counter: usize) -> Flow {
        let scene = &mut self.scene;
        let result: Result<(), SceneError> = match command {
            Command::Reset => {
                scene.reset();
                Ok(())
            }
            Command::End => return Flow::Stop,
            Command::Wait { count, unit } => {
                let delay = scene.wait(count, unit.as_deref());
                return match delay.await {
                    DelayOutcome::Elapsed => Flow::Next,
                    DelayOutcome::Cancelled => Flow::Cancelled,
                };
            }
            Command::SetString { name, value } => {
                self.variables.set_string(name, value);
                Ok(())
            }
            Command::SetNumber { name, value } => {
                self.variables.set_number(name, value);
                Ok(())
            }
            Command::GotoLine { line } => return Flow::Jump(line.saturating_sub(1)),
            Command::GotoMark { mark } => {
                return match self.markers.get(&mark) {
                    Some(&target) => Flow::Jump(target),
                    None => {
                        scene
                            .notifier()
                            .error(format!("There is no mark called {}.", mark));
                        Flow::Jump(1)
                    }
                };
            }
            Command::Mark { mark } => {
                self.markers.insert(mark, counter);
                Ok(())
            }
            Command::New { kind, name } => scene
                .create_item(name.as_deref(), Some(kind.as_str()))
                .map(drop),
            Command::Clone { from, to } => {
                scene.clone(Some(from.as_str()), to.as_deref()).map(drop)
            }
            Command::With { name } => scene.set_with(&name).map(drop),
            Command::Remove { name } => scene.remove(Some(name.as_str())).map(drop),
            Command::Move { name, mode, x, y } => match mode {
                Mode::By => scene.move_by(Some(name.as_str()), x, y).map(drop),
                Mode::To => scene.move_to(Some(name.as_str()), x, y).map(drop),
            },
            Command::Size { name, mode, x, y } => match mode {
                Mode::By => scene.size_by(Some(name.as_str()), x, y).map(drop),
                Mode::To => scene.size_to(Some(name.as_str()), x, y).map(drop),
            },
            Command::Paint { name, color } => scene.paint(Some(name.as_str()), &color).map(drop),
            Command::Outline { name, color, width } => {
                scene.set_stroke(Some(name.as_str()), color.as_deref(), width).map(drop)
            }
            Command::Write { name, text } => scene.write(Some(name.as_str()), &text).map(drop),
            Command::FontSize { name, size } => {
                scene.set_font_size(Some(name.as_str()), size).map(drop)
            }
            Command::Points { name, points } => scene
                .set_points(Some(name.as_str()), points.as_slice())
                .map(drop),
            Command::Print { text } => {
                scene.notifier().info(text);
                Ok(())
            }
        };
        // Scene errors are already on the error channel; the run goes on.
        if let Err(_err) = result {
            trace!(line = counter, err = %_err, "scene operation failed");
        }
        Flow::Next
    }
}
