//! Value primitives shared by the scene and the interpreter.
//!
//! Coordinates are plain `f64`s in canvas units. An absent coordinate in a
//! `move`/`size` command is `None` everywhere, never a sentinel number.

use std::fmt;
use std::str::FromStr;

use glam::{DVec2, dvec2};

/// Error type for numeric values that cannot be placed on the canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericError {
    /// Value is NaN
    NaN,
    /// Value is infinite
    Infinite,
}

impl fmt::Display for NumericError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericError::NaN => write!(f, "value is NaN"),
            NumericError::Infinite => write!(f, "value is infinite"),
        }
    }
}

impl std::error::Error for NumericError {}

/// Reject NaN and infinities coming from user input
#[inline]
pub fn finite(val: f64) -> Result<f64, NumericError> {
    if val.is_nan() {
        Err(NumericError::NaN)
    } else if val.is_infinite() {
        Err(NumericError::Infinite)
    } else {
        Ok(val)
    }
}

/// A mutable 2D point.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    /// Shift by a delta; an absent axis does not move.
    pub fn move_by(&mut self, dx: Option<f64>, dy: Option<f64>) {
        self.x += dx.unwrap_or(0.0);
        self.y += dy.unwrap_or(0.0);
    }

    /// Jump to an absolute position; an absent axis keeps its value.
    pub fn move_to(&mut self, x: Option<f64>, y: Option<f64>) {
        self.x = x.unwrap_or(self.x);
        self.y = y.unwrap_or(self.y);
    }

    #[inline]
    pub fn to_vec(self) -> DVec2 {
        dvec2(self.x, self.y)
    }

    #[inline]
    pub fn from_vec(v: DVec2) -> Self {
        Point { x: v.x, y: v.y }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

/// Why an `x,y` token could not be read as a point
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsePointError {
    MissingComma,
    BadNumber(String),
}

impl fmt::Display for ParsePointError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParsePointError::MissingComma => write!(f, "expected `x,y`"),
            ParsePointError::BadNumber(s) => write!(f, "`{}` is not a number", s),
        }
    }
}

impl std::error::Error for ParsePointError {}

impl FromStr for Point {
    type Err = ParsePointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (x, y) = s.split_once(',').ok_or(ParsePointError::MissingComma)?;
        let num = |part: &str| {
            part.trim()
                .parse::<f64>()
                .ok()
                .and_then(|v| finite(v).ok())
                .ok_or_else(|| ParsePointError::BadNumber(part.to_string()))
        };
        Ok(Point::new(num(x)?, num(y)?))
    }
}

/// Outline of a shape
#[derive(Clone, Debug, PartialEq)]
pub struct Stroke {
    pub color: String,
    pub width: f64,
}

impl Stroke {
    pub const DEFAULT_COLOR: &'static str = "transparent";
    pub const DEFAULT_WIDTH: f64 = 1.0;

    /// Replace the present parts, keep the rest.
    pub fn updated(&self, color: Option<&str>, width: Option<f64>) -> Stroke {
        Stroke {
            color: color.map(str::to_string).unwrap_or_else(|| self.color.clone()),
            width: width.unwrap_or(self.width),
        }
    }
}

impl Default for Stroke {
    fn default() -> Self {
        Stroke {
            color: Self::DEFAULT_COLOR.to_string(),
            width: Self::DEFAULT_WIDTH,
        }
    }
}

/// Format a number the way scripts see it: `7` rather than `7.0`.
pub fn format_number(val: f64) -> String {
    format!("{}", val)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finite_rejects_nan_and_infinity() {
        assert_eq!(finite(1.5), Ok(1.5));
        assert_eq!(finite(f64::NAN), Err(NumericError::NaN));
        assert_eq!(finite(f64::NEG_INFINITY), Err(NumericError::Infinite));
    }

    #[test]
    fn move_by_treats_absent_axis_as_zero() {
        let mut p = Point::new(10.0, 20.0);
        p.move_by(Some(5.0), None);
        assert_eq!(p, Point::new(15.0, 20.0));
        p.move_by(None, Some(-30.0));
        assert_eq!(p, Point::new(15.0, -10.0));
    }

    #[test]
    fn move_to_keeps_absent_axis() {
        let mut p = Point::new(10.0, 20.0);
        p.move_to(None, Some(0.0));
        assert_eq!(p, Point::new(10.0, 0.0));
        p.move_to(Some(3.0), None);
        assert_eq!(p, Point::new(3.0, 0.0));
    }

    #[test]
    fn point_parses_and_displays() {
        let p: Point = "12,-4.5".parse().unwrap();
        assert_eq!(p, Point::new(12.0, -4.5));
        assert_eq!(p.to_string(), "12,-4.5");
    }

    #[test]
    fn point_parse_errors() {
        assert_eq!("12".parse::<Point>(), Err(ParsePointError::MissingComma));
        assert_eq!(
            "a,4".parse::<Point>(),
            Err(ParsePointError::BadNumber("a".to_string()))
        );
    }

    #[test]
    fn stroke_update_keeps_missing_parts() {
        let stroke = Stroke::default();
        let red = stroke.updated(Some("red"), None);
        assert_eq!(red.color, "red");
        assert_eq!(red.width, 1.0);
        let wide = red.updated(None, Some(4.0));
        assert_eq!(wide.color, "red");
        assert_eq!(wide.width, 4.0);
    }

    #[test]
    fn numbers_format_without_trailing_zero() {
        assert_eq!(format_number(7.0), "7");
        assert_eq!(format_number(-2.5), "-2.5");
    }
}
