//! Input events delivered by the external event dispatcher
//!
//! Provides the event model the interaction controller consumes:
//! - Key press/release with a key identifier and modifier state
//! - Pointer press/release/move, already resolved to the axes under the
//!   pointer and its data coordinates
//! - Widget activations (slider value changes and button clicks)

use std::fmt;
use std::str::FromStr;

use phaseview_geom::Point2;
use serde::{Deserialize, Serialize};

use crate::render::{AxesId, WidgetId};

/// Keyboard key identifiers
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    /// Printable character key (letters, digits, punctuation)
    Char(char),

    // Special
    Space,
    Enter,
    Escape,
    Tab,
    Backspace,

    // Modifiers
    Shift,
    Control,
    Alt,
}

impl Key {
    /// Whether this key is a modifier
    pub fn is_modifier(&self) -> bool {
        matches!(self, Key::Shift | Key::Control | Key::Alt)
    }
}

impl FromStr for Key {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "space" | " " => Ok(Key::Space),
            "enter" | "return" => Ok(Key::Enter),
            "escape" | "esc" => Ok(Key::Escape),
            "tab" => Ok(Key::Tab),
            "backspace" => Ok(Key::Backspace),
            "shift" => Ok(Key::Shift),
            "control" | "ctrl" => Ok(Key::Control),
            "alt" => Ok(Key::Alt),
            _ => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(Key::Char(c)),
                    _ => Err(format!("unrecognized key: {:?}", s)),
                }
            }
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Char(c) => write!(f, "{}", c),
            Key::Space => write!(f, "space"),
            Key::Enter => write!(f, "enter"),
            Key::Escape => write!(f, "escape"),
            Key::Tab => write!(f, "tab"),
            Key::Backspace => write!(f, "backspace"),
            Key::Shift => write!(f, "shift"),
            Key::Control => write!(f, "control"),
            Key::Alt => write!(f, "alt"),
        }
    }
}

/// Modifier key state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

impl Modifiers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn with_alt(mut self) -> Self {
        self.alt = true;
        self
    }

    /// Check if any modifier is pressed
    pub fn any(&self) -> bool {
        self.shift || self.ctrl || self.alt
    }

    /// Track a modifier key press or release
    pub fn apply(&mut self, key: Key, pressed: bool) {
        match key {
            Key::Shift => self.shift = pressed,
            Key::Control => self.ctrl = pressed,
            Key::Alt => self.alt = pressed,
            _ => {}
        }
    }
}

/// Keyboard event
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KeyEvent {
    /// The key that was pressed/released
    pub key: Key,
    /// Whether the key was pressed (true) or released (false)
    pub pressed: bool,
}

impl KeyEvent {
    pub fn pressed(key: Key) -> Self {
        Self { key, pressed: true }
    }

    pub fn released(key: Key) -> Self {
        Self {
            key,
            pressed: false,
        }
    }
}

/// Pointer button
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PointerButton {
    #[default]
    Primary,
    Secondary,
    Middle,
}

/// Pointer event phase
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointerPhase {
    Press,
    Release,
    Move,
}

/// Pointer event
///
/// `axes` and `data` are `None` when the pointer is outside every axes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub phase: PointerPhase,
    pub button: PointerButton,
    /// Axes under the pointer, if any
    pub axes: Option<AxesId>,
    /// Pointer position in the data coordinates of `axes`
    pub data: Option<Point2>,
}

impl PointerEvent {
    pub fn press(axes: AxesId, x: f64, y: f64) -> Self {
        Self::inside(PointerPhase::Press, axes, x, y)
    }

    pub fn release(axes: AxesId, x: f64, y: f64) -> Self {
        Self::inside(PointerPhase::Release, axes, x, y)
    }

    pub fn moved(axes: AxesId, x: f64, y: f64) -> Self {
        Self::inside(PointerPhase::Move, axes, x, y)
    }

    /// Event outside any axes
    pub fn outside(phase: PointerPhase) -> Self {
        Self {
            phase,
            button: PointerButton::Primary,
            axes: None,
            data: None,
        }
    }

    pub fn with_button(mut self, button: PointerButton) -> Self {
        self.button = button;
        self
    }

    fn inside(phase: PointerPhase, axes: AxesId, x: f64, y: f64) -> Self {
        Self {
            phase,
            button: PointerButton::Primary,
            axes: Some(axes),
            data: Some(Point2::new(x, y)),
        }
    }
}

/// Widget activation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum WidgetEvent {
    /// Slider moved to a new value
    ValueChanged { widget: WidgetId, value: f64 },
    /// Button clicked
    Clicked { widget: WidgetId },
}

/// Any event delivered by the dispatcher
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum UiEvent {
    Key(KeyEvent),
    Pointer(PointerEvent),
    Widget(WidgetEvent),
}

impl From<KeyEvent> for UiEvent {
    fn from(e: KeyEvent) -> Self {
        UiEvent::Key(e)
    }
}

impl From<PointerEvent> for UiEvent {
    fn from(e: PointerEvent) -> Self {
        UiEvent::Pointer(e)
    }
}

impl From<WidgetEvent> for UiEvent {
    fn from(e: WidgetEvent) -> Self {
        UiEvent::Widget(e)
    }
}

/// Distinguishes a true click from a drag (pan/zoom) across
/// press/move/release sequences
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DragTracker {
    pointer_up: bool,
    dragging: bool,
}

impl Default for DragTracker {
    fn default() -> Self {
        Self {
            pointer_up: true,
            dragging: false,
        }
    }
}

impl DragTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self) {
        self.pointer_up = false;
    }

    pub fn moved(&mut self) {
        self.dragging = !self.pointer_up;
    }

    /// Records the release; returns true if the gesture was a click
    pub fn release(&mut self) -> bool {
        self.pointer_up = true;
        let was_click = !self.dragging;
        self.dragging = false;
        was_click
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }
}
