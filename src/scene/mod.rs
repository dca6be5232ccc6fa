//! Scene state: the shapes a script draws, and everything that talks about
//! them.
//!
//! This module is organized into submodules:
//! - `shapes`: the shape model and its variant point math
//! - `notify`: info/error notification channels
//! - `timers`: delays handed out by `wait` and their cancellation
//!
//! Every operation takes an optional object name. When it is omitted the
//! operation targets the current selection. Failures are returned as
//! [`SceneError`] and also published on the error channel; the scene never
//! stops a run by itself.

pub mod notify;
pub mod shapes;
pub mod timers;

use std::collections::HashMap;

pub use notify::{Level, Notice, Notifier, Transcript};
pub use shapes::{Family, Geometry, Shape, ShapeKind};
pub use timers::{Delay, DelayOutcome, Timers, WaitUnit};

use crate::errors::SceneError;
use crate::log::debug;
use crate::types::{Point, format_number};

/// Prefix of names generated for unnamed objects
const GENERATED_PREFIX: &str = "shape";

/// Whether `name` is a letter followed by letters or digits
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => chars.all(|c| c.is_ascii_alphanumeric()),
        _ => false,
    }
}

/// Named shapes, the current selection and pending timers
#[derive(Debug, Default)]
pub struct Scene {
    shapes: HashMap<String, Shape>,
    selection: Option<String>,
    timers: Timers,
    notifier: Notifier,
    generated: usize,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notification channels; register listeners here
    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Handle on the pending timers, cloneable so a host can cancel a run
    pub fn timers(&self) -> &Timers {
        &self.timers
    }

    pub fn get(&self, name: &str) -> Option<&Shape> {
        self.shapes.get(name)
    }

    /// All shapes, sorted by name
    pub fn shapes(&self) -> Vec<&Shape> {
        let mut shapes: Vec<&Shape> = self.shapes.values().collect();
        shapes.sort_by(|a, b| a.name().cmp(b.name()));
        shapes
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    /// Current selection
    pub fn with(&self) -> Option<&str> {
        self.selection.as_deref()
    }

    /// Select an existing object
    pub fn set_with(&mut self, name: &str) -> Result<&Shape, SceneError> {
        self.update(Some(name), true, |shape| {
            Ok(format!("Set currently selected object as {}", shape.name()))
        })
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Create a shape of the type named by `kind`. An omitted name is
    /// generated.
    pub fn create_item(
        &mut self,
        name: Option<&str>,
        kind: Option<&str>,
    ) -> Result<&Shape, SceneError> {
        let name = match name {
            Some(name) => name.to_string(),
            None => self.generate_name(),
        };
        if let Err(err) = self.check_new_name(&name) {
            return Err(self.fail(err));
        }
        let Some(word) = kind else {
            return Err(self.fail(SceneError::MissingType));
        };
        let Some(kind) = ShapeKind::from_word(word) else {
            return Err(self.fail(SceneError::UnknownType {
                kind: word.to_string(),
                expected: ShapeKind::expected_words(),
            }));
        };

        debug!(%name, %kind, "create");
        self.shapes.insert(name.clone(), Shape::new(name.clone(), kind));
        self.selection = Some(name.clone());
        self.notifier
            .info(format!("Created {} object called {}", word, name));
        self.found(name)
    }

    /// Copy an object (the selection when `from` is omitted) under a new
    /// name. The copy gets its own points.
    pub fn clone(&mut self, from: Option<&str>, to: Option<&str>) -> Result<&Shape, SceneError> {
        let from = match self.resolve(from) {
            Ok(from) => from,
            Err(err) => return Err(self.fail(err)),
        };
        if !self.shapes.contains_key(&from) {
            return Err(self.fail(SceneError::NoSuchObject { name: from }));
        }
        let to = match to {
            Some(to) => to.to_string(),
            None => self.generate_name(),
        };
        if let Err(err) = self.check_new_name(&to) {
            return Err(self.fail(err));
        }
        let Some(copy) = self.shapes.get(&from).map(|source| source.duplicate(to.clone())) else {
            return Err(self.fail(SceneError::NoSuchObject { name: from }));
        };

        debug!(%from, %to, "clone");
        self.shapes.insert(to.clone(), copy);
        self.selection = Some(to.clone());
        self.notifier.info(format!("Cloned {} as {}", from, to));
        self.found(to)
    }

    /// Delete an object, clearing the selection if it pointed there
    pub fn remove(&mut self, name: Option<&str>) -> Result<Shape, SceneError> {
        let name = match self.resolve(name) {
            Ok(name) => name,
            Err(err) => return Err(self.fail(err)),
        };
        let Some(shape) = self.shapes.remove(&name) else {
            return Err(self.fail(SceneError::NoSuchObject { name }));
        };
        if self.selection.as_deref() == Some(name.as_str()) {
            self.selection = None;
        }
        self.notifier.info(format!("Removing object called {}", name));
        Ok(shape)
    }

    /// Remove every shape, cancel every timer, clear the selection
    pub fn reset(&mut self) {
        let _cancelled = self.timers.cancel_all();
        debug!(shapes = self.shapes.len(), cancelled = _cancelled, "reset");
        self.shapes.clear();
        self.selection = None;
        self.generated = 0;
    }

    // ------------------------------------------------------------------
    // Style and content
    // ------------------------------------------------------------------

    pub fn paint(&mut self, name: Option<&str>, color: &str) -> Result<&Shape, SceneError> {
        self.update(name, true, |shape| {
            shape.fill = color.to_string();
            Ok(format!("Painting {} {}", shape.name(), color))
        })
    }

    /// Change the outline; an omitted part keeps its current value
    pub fn set_stroke(
        &mut self,
        name: Option<&str>,
        color: Option<&str>,
        width: Option<f64>,
    ) -> Result<&Shape, SceneError> {
        self.update(name, true, |shape| {
            shape.stroke = shape.stroke.updated(color, width);
            Ok(format!(
                "Set {} stroke color to {} and width to {}",
                shape.name(),
                shape.stroke.color,
                format_number(shape.stroke.width)
            ))
        })
    }

    pub fn set_font_size(&mut self, name: Option<&str>, size: f64) -> Result<&Shape, SceneError> {
        self.update(name, true, |shape| {
            shape.font_size = Some(size);
            Ok(format!("Sizing {} to {}pt", shape.name(), format_number(size)))
        })
    }

    pub fn write(&mut self, name: Option<&str>, text: &str) -> Result<&Shape, SceneError> {
        self.update(name, true, |shape| {
            shape.text = Some(text.to_string());
            Ok(format!("Wrote \"{}\" in {}", text, shape.name()))
        })
    }

    // ------------------------------------------------------------------
    // Geometry
    // ------------------------------------------------------------------

    pub fn move_to(
        &mut self,
        name: Option<&str>,
        x: Option<f64>,
        y: Option<f64>,
    ) -> Result<&Shape, SceneError> {
        self.update(name, false, |shape| {
            shape.move_to(x, y);
            Ok(moved(shape))
        })
    }

    pub fn move_by(
        &mut self,
        name: Option<&str>,
        x: Option<f64>,
        y: Option<f64>,
    ) -> Result<&Shape, SceneError> {
        self.update(name, false, |shape| {
            shape.move_by(x, y);
            Ok(moved(shape))
        })
    }

    pub fn size_to(
        &mut self,
        name: Option<&str>,
        x: Option<f64>,
        y: Option<f64>,
    ) -> Result<&Shape, SceneError> {
        self.update(name, false, |shape| {
            if shape.flattens(x, y) {
                return Err(flat_path(shape));
            }
            shape.size_to(x, y);
            Ok(sized(shape))
        })
    }

    pub fn size_by(
        &mut self,
        name: Option<&str>,
        x: Option<f64>,
        y: Option<f64>,
    ) -> Result<&Shape, SceneError> {
        self.update(name, false, |shape| {
            let w = x.map(|dw| shape.width() + dw);
            let h = y.map(|dh| shape.height() + dh);
            if shape.flattens(w, h) {
                return Err(flat_path(shape));
            }
            shape.size_by(x, y);
            Ok(sized(shape))
        })
    }

    /// Replace the point list from `x,y` tokens
    pub fn set_points<S: AsRef<str>>(
        &mut self,
        name: Option<&str>,
        tokens: &[S],
    ) -> Result<&Shape, SceneError> {
        self.update(name, false, |shape| {
            let points = tokens
                .iter()
                .map(|token| {
                    let token = token.as_ref();
                    token.parse::<Point>().map_err(|reason| SceneError::InvalidPoint {
                        token: token.to_string(),
                        reason,
                    })
                })
                .collect::<Result<Vec<Point>, SceneError>>()?;
            let family = shape.kind().family();
            if !family.accepts_len(points.len()) {
                return Err(SceneError::PointCount {
                    name: shape.name().to_string(),
                    kind: shape.kind().name(),
                    expected: family.expected_len(),
                    found: points.len(),
                });
            }
            shape.set_points(points);
            let listed: Vec<String> = shape.points().iter().map(|p| p.to_string()).collect();
            Ok(format!("Set points {} to {}", shape.name(), listed.join(" ")))
        })
    }

    // ------------------------------------------------------------------
    // Time
    // ------------------------------------------------------------------

    /// Schedule a delay of `n` milliseconds, or seconds when `unit` is a
    /// second-like word.
    pub fn wait(&mut self, n: u64, unit: Option<&str>) -> Delay {
        let unit = WaitUnit::from_word(unit);
        let label = unit.describe(n);
        self.notifier.info(format!("Waiting for {}", label));
        self.timers.schedule(
            unit.duration(n),
            self.notifier.clone(),
            format!("{} timer finished", label),
        )
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn resolve(&self, name: Option<&str>) -> Result<String, SceneError> {
        match name {
            Some(name) => Ok(name.to_string()),
            None => self.selection.clone().ok_or(SceneError::NoSelection),
        }
    }

    fn check_new_name(&self, name: &str) -> Result<(), SceneError> {
        if self.shapes.contains_key(name) {
            return Err(SceneError::DuplicateName {
                name: name.to_string(),
            });
        }
        if !is_valid_name(name) {
            return Err(SceneError::InvalidName {
                name: name.to_string(),
            });
        }
        Ok(())
    }

    fn generate_name(&mut self) -> String {
        loop {
            self.generated += 1;
            let name = format!("{}{}", GENERATED_PREFIX, self.generated);
            if !self.shapes.contains_key(&name) {
                return name;
            }
        }
    }

    /// Publish `err` on the error channel and hand it back
    fn fail(&self, err: SceneError) -> SceneError {
        self.notifier.error(err.to_string());
        err
    }

    fn found(&self, name: String) -> Result<&Shape, SceneError> {
        self.shapes
            .get(&name)
            .ok_or(SceneError::NoSuchObject { name })
    }

    /// Resolve a target, apply `f`, optionally select it, publish the
    /// message `f` returns.
    fn update<F>(&mut self, name: Option<&str>, select: bool, f: F) -> Result<&Shape, SceneError>
    where
        F: FnOnce(&mut Shape) -> Result<String, SceneError>,
    {
        let name = match self.resolve(name) {
            Ok(name) => name,
            Err(err) => return Err(self.fail(err)),
        };
        let outcome = match self.shapes.get_mut(&name) {
            Some(shape) => f(shape),
            None => Err(SceneError::NoSuchObject { name: name.clone() }),
        };
        match outcome {
            Ok(message) => {
                if select {
                    self.selection = Some(name.clone());
                }
                self.notifier.info(message);
                self.found(name)
            }
            Err(err) => Err(self.fail(err)),
        }
    }
}

fn moved(shape: &Shape) -> String {
    format!(
        "Moved {} to {},{}",
        shape.name(),
        format_number(shape.x()),
        format_number(shape.y())
    )
}

fn flat_path(shape: &Shape) -> SceneError {
    SceneError::FlatPath {
        name: shape.name().to_string(),
        kind: shape.kind().name(),
    }
}

fn sized(shape: &Shape) -> String {
    format!(
        "Sized {} to {},{}",
        shape.name(),
        format_number(shape.width()),
        format_number(shape.height())
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene() -> (Scene, Transcript) {
        let scene = Scene::new();
        let transcript = Transcript::attach(scene.notifier());
        (scene, transcript)
    }

    #[test]
    fn names_must_start_with_a_letter() {
        assert!(is_valid_name("a"));
        assert!(is_valid_name("box2"));
        assert!(!is_valid_name("2box"));
        assert!(!is_valid_name("my_box"));
        assert!(!is_valid_name(""));
    }

    #[test]
    fn create_selects_and_reports() {
        let (mut scene, transcript) = scene();
        let shape = scene.create_item(Some("box"), Some("rect")).unwrap();
        assert_eq!(shape.kind(), ShapeKind::Rectangle);
        assert_eq!(scene.with(), Some("box"));
        assert_eq!(transcript.messages(), vec!["Created rect object called box"]);
    }

    #[test]
    fn create_errors_in_order() {
        let (mut scene, transcript) = scene();
        scene.create_item(Some("box"), Some("rectangle")).unwrap();
        assert!(matches!(
            scene.create_item(Some("box"), Some("blob")),
            Err(SceneError::DuplicateName { .. })
        ));
        assert!(matches!(
            scene.create_item(Some("9lives"), None),
            Err(SceneError::InvalidName { .. })
        ));
        assert_eq!(scene.create_item(Some("t"), None).unwrap_err(), SceneError::MissingType);
        assert!(matches!(
            scene.create_item(Some("t"), Some("blob")),
            Err(SceneError::UnknownType { .. })
        ));
        assert_eq!(scene.len(), 1);
        assert_eq!(transcript.notices().len(), 5);
        assert!(transcript.notices()[1..].iter().all(|n| n.level == Level::Error));
    }

    #[test]
    fn unnamed_objects_get_generated_names() {
        let (mut scene, _) = scene();
        scene.create_item(Some("shape1"), Some("text")).unwrap();
        let name = scene.create_item(None, Some("text")).unwrap().name().to_string();
        assert_eq!(name, "shape2");
    }

    #[test]
    fn omitted_name_uses_selection() {
        let (mut scene, transcript) = scene();
        assert_eq!(scene.paint(None, "red").unwrap_err(), SceneError::NoSelection);
        scene.create_item(Some("box"), Some("rectangle")).unwrap();
        scene.paint(None, "red").unwrap();
        assert_eq!(scene.get("box").unwrap().fill, "red");
        assert_eq!(transcript.messages().last().unwrap(), "Painting box red");
    }

    #[test]
    fn clone_copies_style_and_points() {
        let (mut scene, _) = scene();
        scene.create_item(Some("a"), Some("polygon")).unwrap();
        scene.paint(Some("a"), "green").unwrap();
        scene.set_stroke(Some("a"), Some("blue"), Some(3.0)).unwrap();
        scene.clone(Some("a"), Some("b")).unwrap();
        scene.move_by(Some("b"), Some(10.0), Some(10.0)).unwrap();

        let a = scene.get("a").unwrap();
        let b = scene.get("b").unwrap();
        assert_eq!(b.fill, "green");
        assert_eq!(b.stroke, a.stroke);
        assert_eq!(a.points()[0], Point::new(0.0, 0.0));
        assert_eq!(b.points()[0], Point::new(10.0, 10.0));
        assert_eq!(scene.with(), Some("b"));
    }

    #[test]
    fn clone_of_missing_object_fails() {
        let (mut scene, _) = scene();
        assert_eq!(
            scene.clone(Some("ghost"), Some("b")).unwrap_err(),
            SceneError::NoSuchObject { name: "ghost".into() }
        );
        assert!(scene.is_empty());
    }

    #[test]
    fn remove_clears_selection() {
        let (mut scene, _) = scene();
        scene.create_item(Some("box"), Some("rectangle")).unwrap();
        scene.remove(Some("box")).unwrap();
        assert_eq!(scene.with(), None);
        assert!(matches!(scene.remove(Some("box")), Err(SceneError::NoSuchObject { .. })));
    }

    #[test]
    fn set_with_requires_existing_object() {
        let (mut scene, _) = scene();
        scene.create_item(Some("a"), Some("text")).unwrap();
        scene.create_item(Some("b"), Some("text")).unwrap();
        scene.set_with("a").unwrap();
        assert_eq!(scene.with(), Some("a"));
        assert!(scene.set_with("zzz").is_err());
        assert_eq!(scene.with(), Some("a"));
    }

    #[test]
    fn set_points_validates_tokens_and_count() {
        let (mut scene, _) = scene();
        scene.create_item(Some("l"), Some("line")).unwrap();
        scene.create_item(Some("box"), Some("rectangle")).unwrap();

        scene.set_points(Some("l"), &["0,0", "10,10", "20,0"]).unwrap();
        assert_eq!(scene.get("l").unwrap().points().len(), 3);

        assert!(matches!(
            scene.set_points(Some("l"), &["0,0", "nope"]),
            Err(SceneError::InvalidPoint { .. })
        ));
        assert!(matches!(
            scene.set_points(Some("box"), &["0,0", "1,1", "2,2"]),
            Err(SceneError::PointCount { found: 3, .. })
        ));
        assert_eq!(scene.get("box").unwrap().points().len(), 2);
    }

    #[test]
    fn sizing_a_path_to_nothing_is_refused() {
        let (mut scene, transcript) = scene();
        scene.create_item(Some("l"), Some("line")).unwrap();
        assert!(matches!(
            scene.size_to(Some("l"), Some(0.0), Some(0.0)),
            Err(SceneError::FlatPath { kind: "polyline", .. })
        ));
        assert!(matches!(
            scene.size_by(Some("l"), Some(-90.0), None),
            Err(SceneError::FlatPath { .. })
        ));
        let line = scene.get("l").unwrap();
        assert_eq!(line.width(), 90.0);
        assert_eq!(
            transcript.messages().last().unwrap(),
            "l is a polyline and can't be sized to 0, it could never grow back."
        );
        scene.size_to(Some("l"), Some(30.0), None).unwrap();
        assert_eq!(scene.get("l").unwrap().width(), 30.0);
    }

    #[test]
    fn geometry_messages() {
        let (mut scene, transcript) = scene();
        scene.create_item(Some("box"), Some("rectangle")).unwrap();
        scene.move_to(Some("box"), Some(10.0), None).unwrap();
        scene.size_by(Some("box"), Some(-50.0), Some(20.5)).unwrap();
        scene.set_font_size(Some("box"), 12.0).unwrap();
        scene.write(Some("box"), "hi there").unwrap();
        assert_eq!(
            transcript.messages()[1..].to_vec(),
            vec![
                "Moved box to 10,0",
                "Sized box to 50,120.5",
                "Sizing box to 12pt",
                "Wrote \"hi there\" in box",
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn reset_cancels_pending_waits() {
        let (mut scene, transcript) = scene();
        scene.create_item(Some("box"), Some("rectangle")).unwrap();
        let delay = scene.wait(5, Some("seconds"));
        assert_eq!(scene.timers().pending(), 1);
        scene.reset();
        assert!(scene.is_empty());
        assert_eq!(scene.with(), None);
        assert_eq!(delay.await, DelayOutcome::Cancelled);
        assert_eq!(transcript.messages().last().unwrap(), "Waiting for 5 seconds");
    }

    #[tokio::test(start_paused = true)]
    async fn wait_reports_start_and_finish() {
        let (mut scene, transcript) = scene();
        let delay = scene.wait(250, None);
        assert_eq!(delay.duration(), std::time::Duration::from_millis(250));
        assert_eq!(delay.await, DelayOutcome::Elapsed);
        assert_eq!(
            transcript.messages(),
            vec!["Waiting for 250 milliseconds", "250 milliseconds timer finished"]
        );
    }
}
