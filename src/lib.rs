//! shapescript: a line-oriented language for drawing named 2D shapes.
//!
//! A script creates shapes, styles and moves them, keeps a few variables and
//! jumps around with `mark`/`goto`. [`Interpreter`] compiles and runs
//! scripts; [`Scene`] holds the shapes and reports every change on its
//! info/error channels.

use pest_derive::Parser;

pub mod ast;
pub mod errors;
pub mod grammar;
pub mod interpreter;
pub mod log;
pub mod parse;
pub mod scene;
pub mod types;
pub mod vars;

pub use errors::{SceneError, ScriptError};
pub use interpreter::{Interpreter, Options, Program, RunOutcome};
pub use scene::{Notice, Notifier, Scene, Shape, ShapeKind, Transcript};
pub use vars::{Clock, FixedClock, SystemClock};

#[derive(Parser)]
#[grammar = "shapescript.pest"]
pub struct ScriptParser;

/// Run `source` on a fresh scene and hand the scene back.
pub async fn run(source: &str) -> (RunOutcome, Scene) {
    let mut interpreter = Interpreter::new(Scene::new());
    let outcome = interpreter.run(source).await;
    (outcome, interpreter.into_scene())
}
