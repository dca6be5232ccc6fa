//! The ordered command table
//!
//! A line is tried against each entry in turn and the first rule that parses
//! it wins. Several forms share prefixes (`goto mark` / `mark`,
//! `object = new` / `object = clone`), so the order here is part of the
//! language. Entries that name a subject also carry a with-context
//! extractor, used at compile time to expand shorthand lines.

use pest::Parser;
use pest::iterators::Pair;

use crate::ast::Command;
use crate::parse::{self, BuildError};
use crate::{Rule, ScriptParser};

type Build = fn(Pair<'_, Rule>) -> Result<Command, BuildError>;
type Context = fn(&Command) -> Option<&str>;

/// One command form
#[derive(Debug)]
pub struct GrammarEntry {
    pub rule: Rule,
    build: Build,
    context: Option<Context>,
}

impl GrammarEntry {
    /// Whether a match on this entry can set the with-context
    pub fn sets_context(&self) -> bool {
        self.context.is_some()
    }
}

fn subject(command: &Command) -> Option<&str> {
    command.subject()
}

fn clone_target(command: &Command) -> Option<&str> {
    match command {
        Command::Clone { to, .. } => to.as_deref(),
        _ => None,
    }
}

macro_rules! entry {
    ($rule:ident, $build:path) => {
        GrammarEntry {
            rule: Rule::$rule,
            build: $build,
            context: None,
        }
    };
    ($rule:ident, $build:path, $context:path) => {
        GrammarEntry {
            rule: Rule::$rule,
            build: $build,
            context: Some($context),
        }
    };
}

/// Every command form, in matching order
pub static GRAMMAR: &[GrammarEntry] = &[
    entry!(reset_cmd, parse::build_reset),
    entry!(end_cmd, parse::build_end),
    entry!(wait_cmd, parse::build_wait),
    entry!(set_cmd, parse::build_string),
    entry!(string_cmd, parse::build_string),
    entry!(number_cmd, parse::build_number),
    entry!(goto_line_cmd, parse::build_goto_line),
    entry!(goto_mark_cmd, parse::build_goto_mark),
    entry!(mark_cmd, parse::build_mark),
    entry!(new_cmd, parse::build_new, subject),
    entry!(new_object_cmd, parse::build_new, subject),
    entry!(clone_cmd, parse::build_clone, clone_target),
    entry!(clone_object_cmd, parse::build_clone, clone_target),
    entry!(with_cmd, parse::build_with, subject),
    entry!(remove_cmd, parse::build_remove),
    entry!(move_cmd, parse::build_move, subject),
    entry!(size_cmd, parse::build_size, subject),
    entry!(paint_cmd, parse::build_paint, subject),
    entry!(outline_cmd, parse::build_outline, subject),
    entry!(write_cmd, parse::build_write, subject),
    entry!(font_size_cmd, parse::build_font_size, subject),
    entry!(points_cmd, parse::build_points),
    entry!(print_cmd, parse::build_print),
];

/// A line that matched some entry
#[derive(Debug)]
pub struct Matched {
    pub entry: &'static GrammarEntry,
    pub command: Result<Command, BuildError>,
}

impl Matched {
    /// Name this line establishes as the with-context, if any
    pub fn context(&self) -> Option<&str> {
        let command = self.command.as_ref().ok()?;
        self.entry.context.and_then(|extract| extract(command))
    }
}

/// Match a normalized line against the table; `None` if no form fits
pub fn match_line(line: &str) -> Option<Matched> {
    GRAMMAR.iter().find_map(|entry| {
        let pair = ScriptParser::parse(entry.rule, line).ok()?.next()?;
        Some(Matched {
            entry,
            command: (entry.build)(pair),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Mode;

    fn command(line: &str) -> Command {
        match_line(line)
            .unwrap_or_else(|| panic!("no match for {line:?}"))
            .command
            .unwrap()
    }

    fn context(line: &str) -> Option<String> {
        match_line(line).unwrap().context().map(str::to_string)
    }

    #[test]
    fn keywords_are_case_insensitive() {
        assert_eq!(command("reset"), Command::Reset);
        assert_eq!(command("RESET"), Command::Reset);
        assert_eq!(command("End"), Command::End);
        assert!(matches!(command("fontsize t 12"), Command::FontSize { .. }));
        assert!(matches!(command("fontSize t 12"), Command::FontSize { .. }));
    }

    #[test]
    fn wait_forms() {
        assert_eq!(
            command("wait 500"),
            Command::Wait {
                count: 500,
                unit: None,
            }
        );
        assert_eq!(
            command("wait 2 seconds"),
            Command::Wait {
                count: 2,
                unit: Some("seconds".into()),
            }
        );
        assert_eq!(
            command("wait 2s"),
            Command::Wait {
                count: 2,
                unit: Some("s".into()),
            }
        );
    }

    #[test]
    fn variable_forms() {
        assert_eq!(
            command("set greeting hello world"),
            Command::SetString {
                name: "greeting".into(),
                value: "hello world".into(),
            }
        );
        assert_eq!(
            command("set greeting = hi"),
            Command::SetString {
                name: "greeting".into(),
                value: "hi".into(),
            }
        );
        assert_eq!(
            command("string who = World"),
            Command::SetString {
                name: "who".into(),
                value: "World".into(),
            }
        );
        assert_eq!(
            command("number n = 3 + 4"),
            Command::SetNumber {
                name: "n".into(),
                value: 7.0,
            }
        );
        assert_eq!(
            command("number n = -2.5"),
            Command::SetNumber {
                name: "n".into(),
                value: -2.5,
            }
        );
    }

    #[test]
    fn goto_mark_is_not_a_mark() {
        assert_eq!(
            command("goto mark top"),
            Command::GotoMark {
                mark: "top".into(),
            }
        );
        assert_eq!(
            command("mark top"),
            Command::Mark {
                mark: "top".into(),
            }
        );
        assert_eq!(
            command("goto line 4"),
            Command::GotoLine {
                line: 4,
            }
        );
    }

    #[test]
    fn creation_forms() {
        assert_eq!(
            command("new rectangle as box"),
            Command::New {
                kind: "rectangle".into(),
                name: Some("box".into()),
            }
        );
        assert_eq!(
            command("new text title"),
            Command::New {
                kind: "text".into(),
                name: Some("title".into()),
            }
        );
        assert_eq!(
            command("new text"),
            Command::New {
                kind: "text".into(),
                name: None,
            }
        );
        assert_eq!(
            command("new text astro"),
            Command::New {
                kind: "text".into(),
                name: Some("astro".into()),
            }
        );
        assert_eq!(
            command("object a = new rectangle"),
            Command::New {
                kind: "rectangle".into(),
                name: Some("a".into()),
            }
        );
        assert_eq!(
            command("object b = clone a"),
            Command::Clone {
                from: "a".into(),
                to: Some("b".into()),
            }
        );
        assert_eq!(
            command("clone a as b"),
            Command::Clone {
                from: "a".into(),
                to: Some("b".into()),
            }
        );
    }

    #[test]
    fn move_and_size_coordinates() {
        insta::assert_debug_snapshot!(command("move box by 10,"), @r#"
        Move {
            name: "box",
            mode: By,
            x: Some(
                10.0,
            ),
            y: None,
        }
        "#);
        assert_eq!(
            command("move box ,-5"),
            Command::Move {
                name: "box".into(),
                mode: Mode::To,
                x: None,
                y: Some(-5.0),
            }
        );
        assert_eq!(
            command("size box TO 50,50"),
            Command::Size {
                name: "box".into(),
                mode: Mode::To,
                x: Some(50.0),
                y: Some(50.0),
            }
        );
        assert!(match_line("move box").is_none());
    }

    #[test]
    fn style_forms() {
        assert_eq!(
            command("paint box #ff8800"),
            Command::Paint {
                name: "box".into(),
                color: "#ff8800".into(),
            }
        );
        assert_eq!(
            command("outline box 3"),
            Command::Outline {
                name: "box".into(),
                color: None,
                width: Some(3.0),
            }
        );
        assert_eq!(
            command("outline box blue 2"),
            Command::Outline {
                name: "box".into(),
                color: Some("blue".into()),
                width: Some(2.0),
            }
        );
        assert_eq!(
            command("write t Hello, there!"),
            Command::Write {
                name: "t".into(),
                text: "Hello,
                there!".into(),
            }
        );
    }

    #[test]
    fn points_tokens_are_kept_verbatim() {
        insta::assert_debug_snapshot!(command("points roof 0,0 50,-40 100"), @r#"
        Points {
            name: "roof",
            points: [
                "0,0",
                "50,-40",
                "100",
            ],
        }
        "#);
    }

    #[test]
    fn unknown_lines_do_not_match() {
        assert!(match_line("glorp foo").is_none());
        assert!(match_line("paint box").is_none());
        assert!(match_line("new 9box").is_none());
        assert!(match_line("").is_none());
    }

    #[test]
    fn oversized_numbers_fail_to_build() {
        let matched = match_line("goto line 99999999999999999999999").unwrap();
        assert_eq!(matched.entry.rule, Rule::goto_line_cmd);
        assert_eq!(
            matched.command,
            Err(BuildError::Number("99999999999999999999999".into()))
        );
    }

    #[test]
    fn with_context_extractors() {
        assert_eq!(context("new rectangle as box").as_deref(), Some("box"));
        assert_eq!(context("new rectangle").as_deref(), None);
        assert_eq!(context("object b = clone a").as_deref(), Some("b"));
        assert_eq!(context("clone a").as_deref(), None);
        assert_eq!(context("paint box red").as_deref(), Some("box"));
        assert_eq!(context("remove box").as_deref(), None);
        assert_eq!(context("points l 0,0 1,1").as_deref(), None);
        assert!(!match_line("print hi").unwrap().entry.sets_context());
    }
}
