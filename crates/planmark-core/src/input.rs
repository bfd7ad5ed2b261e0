//! Pointer and keyboard input delivered by the host.
//!
//! Positions are in screen pixels relative to the drawing surface.

use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    #[default]
    Left,
    Right,
    Middle,
}

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub const SHIFT: Self = Self {
        shift: true,
        ..Self::NONE
    };

    /// Ctrl on most platforms, Cmd on macOS.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// Pointer event in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    Down {
        position: Point,
        button: MouseButton,
        modifiers: Modifiers,
    },
    Move {
        position: Point,
        modifiers: Modifiers,
    },
    Up {
        position: Point,
        button: MouseButton,
    },
    /// Wheel notch; negative `delta_y` scrolls up (zoom in).
    Wheel { position: Point, delta_y: f64 },
}

impl PointerEvent {
    /// Left-button press without modifiers.
    pub fn down(position: Point) -> Self {
        Self::Down {
            position,
            button: MouseButton::Left,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn moved(position: Point) -> Self {
        Self::Move {
            position,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn up(position: Point) -> Self {
        Self::Up {
            position,
            button: MouseButton::Left,
        }
    }

    pub fn position(&self) -> Point {
        match self {
            Self::Down { position, .. }
            | Self::Move { position, .. }
            | Self::Up { position, .. }
            | Self::Wheel { position, .. } => *position,
        }
    }
}

/// Editor-level keyboard commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyAction {
    Undo,
    Redo,
    Delete,
    /// Cancel the current gesture (discards an in-progress multi-point draw).
    Escape,
    /// Finish a multi-point draw.
    Finish,
    SelectAll,
    BringToFront,
    SendToBack,
    Copy,
    Paste,
    Duplicate,
}

impl KeyAction {
    /// Map a key name plus modifiers to a command.
    pub fn from_key(key: &str, modifiers: Modifiers) -> Option<Self> {
        let command = modifiers.command();
        match key.to_lowercase().as_str() {
            "z" if command && modifiers.shift => Some(Self::Redo),
            "z" if command => Some(Self::Undo),
            "y" if command => Some(Self::Redo),
            "a" if command => Some(Self::SelectAll),
            "c" if command => Some(Self::Copy),
            "v" if command => Some(Self::Paste),
            "d" if command => Some(Self::Duplicate),
            "]" if command => Some(Self::BringToFront),
            "[" if command => Some(Self::SendToBack),
            "delete" | "backspace" => Some(Self::Delete),
            "escape" => Some(Self::Escape),
            "enter" | "return" => Some(Self::Finish),
            _ => None,
        }
    }
}
