//! Build commands from pest pairs
//!
//! Each `build_*` function receives the pair of one anchored command rule and
//! reads its fields by rule. A line only reaches these functions after the
//! grammar has matched it, so the only failure a user can trigger is a
//! numeric literal that does not fit.

use std::str::FromStr;

use pest::iterators::Pair;
use thiserror::Error;

use crate::Rule;
use crate::ast::{Command, Mode};
use crate::types::finite;

/// Why a matched line could not become a command
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("`{0}` is not a usable number")]
    Number(String),
    #[error("matched line has no {0:?}")]
    Missing(Rule),
}

type Fields<'i> = Vec<Pair<'i, Rule>>;

fn fields(pair: Pair<'_, Rule>) -> Fields<'_> {
    pair.into_inner().filter(|p| p.as_rule() != Rule::EOI).collect()
}

fn find<'i>(fields: &[Pair<'i, Rule>], rule: Rule) -> Option<&'i str> {
    fields.iter().find(|p| p.as_rule() == rule).map(|p| p.as_str())
}

fn require<'i>(fields: &[Pair<'i, Rule>], rule: Rule) -> Result<&'i str, BuildError> {
    find(fields, rule).ok_or(BuildError::Missing(rule))
}

fn owned(fields: &[Pair<'_, Rule>], rule: Rule) -> Result<String, BuildError> {
    require(fields, rule).map(str::to_string)
}

fn float(text: &str) -> Result<f64, BuildError> {
    text.parse::<f64>()
        .ok()
        .and_then(|v| finite(v).ok())
        .ok_or_else(|| BuildError::Number(text.to_string()))
}

fn count<T: FromStr>(text: &str) -> Result<T, BuildError> {
    text.parse::<T>()
        .map_err(|_| BuildError::Number(text.to_string()))
}

fn optional_float(fields: &[Pair<'_, Rule>], rule: Rule) -> Result<Option<f64>, BuildError> {
    find(fields, rule).map(float).transpose()
}

// ============================================================================
// Builders, one per command rule
// ============================================================================

pub fn build_reset(_: Pair<'_, Rule>) -> Result<Command, BuildError> {
    Ok(Command::Reset)
}

pub fn build_end(_: Pair<'_, Rule>) -> Result<Command, BuildError> {
    Ok(Command::End)
}

pub fn build_wait(pair: Pair<'_, Rule>) -> Result<Command, BuildError> {
    let f = fields(pair);
    Ok(Command::Wait {
        count: count(require(&f, Rule::integer)?)?,
        unit: find(&f, Rule::unit).map(str::to_string),
    })
}

/// `set` and `string` both store a string variable
pub fn build_string(pair: Pair<'_, Rule>) -> Result<Command, BuildError> {
    let f = fields(pair);
    Ok(Command::SetString {
        name: owned(&f, Rule::name)?,
        value: owned(&f, Rule::text)?,
    })
}

pub fn build_number(pair: Pair<'_, Rule>) -> Result<Command, BuildError> {
    let f = fields(pair);
    let value = float(require(&f, Rule::number)?)?;
    let addend = optional_float(&f, Rule::addend)?.unwrap_or(0.0);
    let sum = finite(value + addend).map_err(|_| BuildError::Number(sum_text(&f)))?;
    Ok(Command::SetNumber {
        name: owned(&f, Rule::name)?,
        value: sum,
    })
}

// Text of the whole assignment, for an overflowing sum
fn sum_text(fields: &[Pair<'_, Rule>]) -> String {
    let numbers: Vec<&str> = fields
        .iter()
        .filter(|p| matches!(p.as_rule(), Rule::number | Rule::addend))
        .map(|p| p.as_str())
        .collect();
    numbers.join(" + ")
}

pub fn build_goto_line(pair: Pair<'_, Rule>) -> Result<Command, BuildError> {
    let f = fields(pair);
    Ok(Command::GotoLine {
        line: count(require(&f, Rule::integer)?)?,
    })
}

pub fn build_goto_mark(pair: Pair<'_, Rule>) -> Result<Command, BuildError> {
    let f = fields(pair);
    Ok(Command::GotoMark {
        mark: owned(&f, Rule::name)?,
    })
}

pub fn build_mark(pair: Pair<'_, Rule>) -> Result<Command, BuildError> {
    let f = fields(pair);
    Ok(Command::Mark {
        mark: owned(&f, Rule::name)?,
    })
}

pub fn build_new(pair: Pair<'_, Rule>) -> Result<Command, BuildError> {
    let f = fields(pair);
    Ok(Command::New {
        kind: owned(&f, Rule::kind)?,
        name: find(&f, Rule::name).map(str::to_string),
    })
}

pub fn build_clone(pair: Pair<'_, Rule>) -> Result<Command, BuildError> {
    let f = fields(pair);
    Ok(Command::Clone {
        from: owned(&f, Rule::name)?,
        to: find(&f, Rule::target).map(str::to_string),
    })
}

pub fn build_with(pair: Pair<'_, Rule>) -> Result<Command, BuildError> {
    let f = fields(pair);
    Ok(Command::With {
        name: owned(&f, Rule::name)?,
    })
}

pub fn build_remove(pair: Pair<'_, Rule>) -> Result<Command, BuildError> {
    let f = fields(pair);
    Ok(Command::Remove {
        name: owned(&f, Rule::name)?,
    })
}

fn mode(fields: &[Pair<'_, Rule>]) -> Mode {
    match find(fields, Rule::mode) {
        Some(word) if word.eq_ignore_ascii_case("by") => Mode::By,
        _ => Mode::To,
    }
}

pub fn build_move(pair: Pair<'_, Rule>) -> Result<Command, BuildError> {
    let f = fields(pair);
    Ok(Command::Move {
        name: owned(&f, Rule::name)?,
        mode: mode(&f),
        x: optional_float(&f, Rule::coord_x)?,
        y: optional_float(&f, Rule::coord_y)?,
    })
}

pub fn build_size(pair: Pair<'_, Rule>) -> Result<Command, BuildError> {
    let f = fields(pair);
    Ok(Command::Size {
        name: owned(&f, Rule::name)?,
        mode: mode(&f),
        x: optional_float(&f, Rule::coord_x)?,
        y: optional_float(&f, Rule::coord_y)?,
    })
}

pub fn build_paint(pair: Pair<'_, Rule>) -> Result<Command, BuildError> {
    let f = fields(pair);
    Ok(Command::Paint {
        name: owned(&f, Rule::name)?,
        color: owned(&f, Rule::color)?,
    })
}

pub fn build_outline(pair: Pair<'_, Rule>) -> Result<Command, BuildError> {
    let f = fields(pair);
    Ok(Command::Outline {
        name: owned(&f, Rule::name)?,
        color: find(&f, Rule::color).map(str::to_string),
        width: optional_float(&f, Rule::stroke_width)?,
    })
}

pub fn build_write(pair: Pair<'_, Rule>) -> Result<Command, BuildError> {
    let f = fields(pair);
    Ok(Command::Write {
        name: owned(&f, Rule::name)?,
        text: owned(&f, Rule::text)?,
    })
}

pub fn build_font_size(pair: Pair<'_, Rule>) -> Result<Command, BuildError> {
    let f = fields(pair);
    Ok(Command::FontSize {
        name: owned(&f, Rule::name)?,
        size: float(require(&f, Rule::number)?)?,
    })
}

pub fn build_points(pair: Pair<'_, Rule>) -> Result<Command, BuildError> {
    let f = fields(pair);
    let points = f
        .iter()
        .filter(|p| p.as_rule() == Rule::point_token)
        .map(|p| p.as_str().to_string())
        .collect();
    Ok(Command::Points {
        name: owned(&f, Rule::name)?,
        points,
    })
}

pub fn build_print(pair: Pair<'_, Rule>) -> Result<Command, BuildError> {
    let f = fields(pair);
    Ok(Command::Print {
        text: owned(&f, Rule::text)?,
    })
}
