//! Script variables and `%name` substitution.
//!
//! Substitution is literal text replacement, applied to every line right
//! before it runs, in three passes: system variables (`%TIME`, `%DATE`),
//! then string variables, then number variables. Within a table longer
//! names are replaced before shorter names that prefix them, so `%nn` is not
//! eaten by `%n`.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Local, NaiveDate, NaiveDateTime};

use crate::types::format_number;

/// Format of `%TIME`, e.g. `3:07 pm`
pub const TIME_FORMAT: &str = "%-I:%M %P";
/// Format of `%DATE`, e.g. `2024-05-01`
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Source of local wall-clock time
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// The machine's local time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock stuck at one instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl FixedClock {
    /// `None` if the date or time is out of range
    pub fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day)?
            .and_hms_opt(hour, minute, 0)
            .map(FixedClock)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// String and number variables of one interpreter
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Variables {
    strings: BTreeMap<String, String>,
    numbers: BTreeMap<String, f64>,
}

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_string(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.strings.insert(name.into(), value.into());
    }

    pub fn set_number(&mut self, name: impl Into<String>, value: f64) {
        self.numbers.insert(name.into(), value);
    }

    pub fn string(&self, name: &str) -> Option<&str> {
        self.strings.get(name).map(String::as_str)
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        self.numbers.get(name).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty() && self.numbers.is_empty()
    }

    pub fn clear(&mut self) {
        self.strings.clear();
        self.numbers.clear();
    }

    /// Replace every `%name` in `line`
    pub fn substitute(&self, line: &str, clock: &dyn Clock) -> String {
        if !line.contains('%') {
            return line.to_string();
        }
        let now = clock.now();
        let mut line = line
            .replace("%TIME", &now.format(TIME_FORMAT).to_string())
            .replace("%DATE", &now.format(DATE_FORMAT).to_string());
        // BTreeMap iterates in lexicographic order; reversed, a name always
        // comes before its prefixes.
        for (name, value) in self.strings.iter().rev() {
            line = line.replace(&format!("%{name}"), value);
        }
        for (name, value) in self.numbers.iter().rev() {
            line = line.replace(&format!("%{name}"), &format_number(*value));
        }
        line
    }
}

impl fmt::Display for Variables {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.strings {
            writeln!(f, "string {name} = {value}")?;
        }
        for (name, value) in &self.numbers {
            writeln!(f, "number {name} = {}", format_number(*value))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clock() -> FixedClock {
        FixedClock::at(2024, 5, 1, 15, 7).unwrap()
    }

    #[test]
    fn system_variables() {
        let vars = Variables::new();
        assert_eq!(
            vars.substitute("print %DATE at %TIME", &clock()),
            "print 2024-05-01 at 3:07 pm"
        );
    }

    #[test]
    fn lines_without_percent_are_untouched() {
        let vars = Variables::new();
        assert_eq!(vars.substitute("paint box red", &clock()), "paint box red");
    }

    #[test]
    fn longer_names_win_over_prefixes() {
        let mut vars = Variables::new();
        vars.set_number("n", 1.0);
        vars.set_number("nn", 22.0);
        assert_eq!(vars.substitute("print %nn %n", &clock()), "print 22 1");
    }

    #[test]
    fn strings_are_replaced_before_numbers() {
        let mut vars = Variables::new();
        // The string pass produces `%x`, which the number pass then fills.
        vars.set_string("ref", "%x");
        vars.set_number("x", 5.0);
        assert_eq!(vars.substitute("print %ref", &clock()), "print 5");
    }

    #[test]
    fn system_variables_shadow_user_ones() {
        let mut vars = Variables::new();
        vars.set_string("TIME", "never");
        assert_eq!(vars.substitute("print %TIME", &clock()), "print 3:07 pm");
    }

    #[test]
    fn unknown_names_are_left_alone() {
        let mut vars = Variables::new();
        vars.set_number("n", 3.0);
        assert_eq!(vars.substitute("print 50% of %m", &clock()), "print 50% of %m");
    }

    #[test]
    fn clear_empties_both_tables() {
        let mut vars = Variables::new();
        vars.set_string("a", "b");
        vars.set_number("n", 1.0);
        assert_eq!(vars.to_string(), "string a = b\nnumber n = 1\n");
        vars.clear();
        assert!(vars.is_empty());
    }
}
