//! Shape model
//!
//! Every shape owns a point list whose meaning depends on its family:
//! - box-like shapes (text, rectangle, ellipse) keep exactly two points, the
//!   origin and the size;
//! - path-like shapes (polyline, polygon) keep two or more vertices.
//!
//! Moving and sizing go through a [`PointMath`] table picked by family, and
//! the render geometry is recomputed after every mutation.

use std::fmt;

use glam::{DVec2, dvec2};

use crate::types::{Point, Stroke, format_number};

/// The closed set of shape variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Text,
    Rectangle,
    Ellipse,
    Polyline,
    Polygon,
}

/// Structural family of a variant; selects the point math
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    Boxed,
    Path,
}

/// Words accepted after `new`, in the order they are listed to the user
pub const TYPE_WORDS: &[(&str, ShapeKind)] = &[
    ("text", ShapeKind::Text),
    ("circle", ShapeKind::Ellipse),
    ("ellipse", ShapeKind::Ellipse),
    ("rectangle", ShapeKind::Rectangle),
    ("rect", ShapeKind::Rectangle),
    ("line", ShapeKind::Polyline),
    ("polyline", ShapeKind::Polyline),
    ("polygon", ShapeKind::Polygon),
];

impl ShapeKind {
    /// Look up a type word (case-insensitive)
    pub fn from_word(word: &str) -> Option<ShapeKind> {
        TYPE_WORDS
            .iter()
            .find(|(w, _)| w.eq_ignore_ascii_case(word))
            .map(|(_, kind)| *kind)
    }

    /// Comma-separated list of every accepted type word
    pub fn expected_words() -> String {
        TYPE_WORDS
            .iter()
            .map(|(w, _)| *w)
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn name(self) -> &'static str {
        match self {
            ShapeKind::Text => "text",
            ShapeKind::Rectangle => "rectangle",
            ShapeKind::Ellipse => "ellipse",
            ShapeKind::Polyline => "polyline",
            ShapeKind::Polygon => "polygon",
        }
    }

    pub fn family(self) -> Family {
        match self {
            ShapeKind::Text | ShapeKind::Rectangle | ShapeKind::Ellipse => Family::Boxed,
            ShapeKind::Polyline | ShapeKind::Polygon => Family::Path,
        }
    }

    fn default_points(self) -> Vec<Point> {
        match self {
            ShapeKind::Text | ShapeKind::Rectangle | ShapeKind::Ellipse => {
                vec![Point::new(0.0, 0.0), Point::new(100.0, 100.0)]
            }
            ShapeKind::Polyline => vec![Point::new(10.0, 10.0), Point::new(100.0, 10.0)],
            ShapeKind::Polygon => vec![
                Point::new(0.0, 0.0),
                Point::new(100.0, 0.0),
                Point::new(150.0, 100.0),
                Point::new(50.0, 100.0),
            ],
        }
    }

    fn default_fill(self) -> &'static str {
        match self {
            ShapeKind::Polyline => "none",
            _ => "black",
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Family {
    /// Whether a point list of this length is valid for the family
    pub fn accepts_len(self, len: usize) -> bool {
        match self {
            Family::Boxed => len == 2,
            Family::Path => len >= 2,
        }
    }

    /// Human description of the accepted point count
    pub fn expected_len(self) -> &'static str {
        match self {
            Family::Boxed => "exactly 2",
            Family::Path => "at least 2",
        }
    }

    fn math(self) -> &'static PointMath {
        match self {
            Family::Boxed => &BOX_MATH,
            Family::Path => &PATH_MATH,
        }
    }
}

// ============================================================================
// Point math strategies
// ============================================================================

type Mutation = fn(&mut [Point], Option<f64>, Option<f64>);

/// Move/size operations for one family
struct PointMath {
    move_by: Mutation,
    move_to: Mutation,
    size_by: Mutation,
    size_to: Mutation,
}

static BOX_MATH: PointMath = PointMath {
    move_by: box_move_by,
    move_to: box_move_to,
    size_by: box_size_by,
    size_to: box_size_to,
};

static PATH_MATH: PointMath = PointMath {
    move_by: path_move_by,
    move_to: path_move_to,
    size_by: path_size_by,
    size_to: path_size_to,
};

fn box_move_by(points: &mut [Point], dx: Option<f64>, dy: Option<f64>) {
    points[0].move_by(dx, dy);
}

fn box_move_to(points: &mut [Point], x: Option<f64>, y: Option<f64>) {
    points[0].move_to(x, y);
}

fn box_size_by(points: &mut [Point], dw: Option<f64>, dh: Option<f64>) {
    points[1].move_by(dw, dh);
}

fn box_size_to(points: &mut [Point], w: Option<f64>, h: Option<f64>) {
    points[1].move_to(w, h);
}

fn path_move_by(points: &mut [Point], dx: Option<f64>, dy: Option<f64>) {
    for point in points.iter_mut() {
        point.move_by(dx, dy);
    }
}

fn path_move_to(points: &mut [Point], x: Option<f64>, y: Option<f64>) {
    let before = points[0].to_vec();
    points[0].move_to(x, y);
    let delta = points[0].to_vec() - before;
    for point in points.iter_mut().skip(1) {
        point.move_by(Some(delta.x), Some(delta.y));
    }
}

fn path_size_by(points: &mut [Point], dw: Option<f64>, dh: Option<f64>) {
    let extent = path_extent(points);
    path_size_to(
        points,
        dw.map(|dw| extent.x + dw),
        dh.map(|dh| extent.y + dh),
    );
}

// Scale about the bounding-box minimum. A flat axis has nothing to scale.
fn path_size_to(points: &mut [Point], w: Option<f64>, h: Option<f64>) {
    let (min, max) = bounds(points);
    let extent = max - min;
    let factor = |target: Option<f64>, current: f64| match target {
        Some(target) if current != 0.0 => target / current,
        _ => 1.0,
    };
    let scale = dvec2(factor(w, extent.x), factor(h, extent.y));
    for point in points.iter_mut() {
        *point = Point::from_vec(min + (point.to_vec() - min) * scale);
    }
}

fn path_extent(points: &[Point]) -> DVec2 {
    let (min, max) = bounds(points);
    max - min
}

/// Axis-aligned bounds of a non-empty point list
pub fn bounds(points: &[Point]) -> (DVec2, DVec2) {
    let first = points.first().map(|p| p.to_vec()).unwrap_or(DVec2::ZERO);
    points.iter().fold((first, first), |(min, max), p| {
        let v = p.to_vec();
        (min.min(v), max.max(v))
    })
}

// ============================================================================
// Render geometry
// ============================================================================

/// Attributes a rendering surface needs to draw a shape
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    Ellipse {
        cx: f64,
        cy: f64,
        rx: f64,
        ry: f64,
    },
    Path {
        points: Vec<DVec2>,
        closed: bool,
    },
}

impl Geometry {
    fn compute(kind: ShapeKind, points: &[Point]) -> Geometry {
        match kind {
            ShapeKind::Text | ShapeKind::Rectangle => Geometry::Rect {
                x: points[0].x,
                y: points[0].y,
                width: points[1].x,
                height: points[1].y,
            },
            ShapeKind::Ellipse => {
                let radii = points[1].to_vec() / 2.0;
                let center = points[0].to_vec() + radii;
                Geometry::Ellipse {
                    cx: center.x,
                    cy: center.y,
                    rx: radii.x,
                    ry: radii.y,
                }
            }
            ShapeKind::Polyline | ShapeKind::Polygon => Geometry::Path {
                points: points.iter().map(|p| p.to_vec()).collect(),
                closed: kind == ShapeKind::Polygon,
            },
        }
    }
}

// ============================================================================
// Shape
// ============================================================================

/// A named shape on the scene
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    name: String,
    kind: ShapeKind,
    points: Vec<Point>,
    pub stroke: Stroke,
    pub fill: String,
    pub text: Option<String>,
    /// Font size in points
    pub font_size: Option<f64>,
    geometry: Geometry,
}

impl Shape {
    pub fn new(name: impl Into<String>, kind: ShapeKind) -> Self {
        let points = kind.default_points();
        let geometry = Geometry::compute(kind, &points);
        Shape {
            name: name.into(),
            kind,
            points,
            stroke: Stroke::default(),
            fill: kind.default_fill().to_string(),
            text: None,
            font_size: None,
            geometry,
        }
    }

    /// Copy everything but the name. Points are fresh values, never shared.
    pub fn duplicate(&self, name: impl Into<String>) -> Self {
        Shape {
            name: name.into(),
            points: self.points.iter().map(|p| Point::new(p.x, p.y)).collect(),
            ..self.clone()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ShapeKind {
        self.kind
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// x of the origin (first point)
    pub fn x(&self) -> f64 {
        self.points[0].x
    }

    /// y of the origin (first point)
    pub fn y(&self) -> f64 {
        self.points[0].y
    }

    pub fn width(&self) -> f64 {
        match self.kind.family() {
            Family::Boxed => self.points[1].x,
            Family::Path => path_extent(&self.points).x,
        }
    }

    pub fn height(&self) -> f64 {
        match self.kind.family() {
            Family::Boxed => self.points[1].y,
            Family::Path => path_extent(&self.points).y,
        }
    }

    pub fn move_by(&mut self, x: Option<f64>, y: Option<f64>) {
        (self.kind.family().math().move_by)(&mut self.points, x, y);
        self.redraw();
    }

    pub fn move_to(&mut self, x: Option<f64>, y: Option<f64>) {
        (self.kind.family().math().move_to)(&mut self.points, x, y);
        self.redraw();
    }

    /// Whether `size_to(w, h)` would squash a path axis that has length down
    /// to zero. Scaling can't stretch it out again afterwards.
    pub fn flattens(&self, w: Option<f64>, h: Option<f64>) -> bool {
        if self.kind.family() != Family::Path {
            return false;
        }
        let extent = path_extent(&self.points);
        let squashed = |target: Option<f64>, current: f64| target == Some(0.0) && current != 0.0;
        squashed(w, extent.x) || squashed(h, extent.y)
    }

    pub fn size_by(&mut self, x: Option<f64>, y: Option<f64>) {
        (self.kind.family().math().size_by)(&mut self.points, x, y);
        self.redraw();
    }

    pub fn size_to(&mut self, x: Option<f64>, y: Option<f64>) {
        (self.kind.family().math().size_to)(&mut self.points, x, y);
        self.redraw();
    }

    /// Replace the point list. The caller checks the length against
    /// [`Family::accepts_len`]; an unacceptable list is ignored.
    pub fn set_points(&mut self, points: Vec<Point>) {
        if !self.kind.family().accepts_len(points.len()) {
            return;
        }
        self.points = points;
        self.redraw();
    }

    fn redraw(&mut self) {
        self.geometry = Geometry::compute(self.kind, &self.points);
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let points: Vec<String> = self.points.iter().map(|p| p.to_string()).collect();
        write!(
            f,
            "{} {} [{}] fill={} stroke={}/{}",
            self.kind,
            self.name,
            points.join(" "),
            self.fill,
            self.stroke.color,
            format_number(self.stroke.width)
        )?;
        if let Some(text) = &self.text {
            write!(f, " text={:?}", text)?;
        }
        if let Some(size) = self.font_size {
            write!(f, " font={}pt", format_number(size))?;
        }
        Ok(())
    }
}
