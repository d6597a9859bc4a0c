//! Interaction mode state machine
//!
//! ```text
//!        l          space          s            .
//! Idle ────→ LineSelect  Idle ──→ UserFuncWait  Idle ─→ SnapWait  Idle ─→ DomainGrow
//!   ↑              │                    │                  │                  │
//!   └──── GestureDone / Cancel ─────────┴──────────────────┴──────────────────┘
//! ```
//!
//! Mode keys are only accepted in `Idle`; a mode key pressed in any other
//! mode must first cancel back to `Idle`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::ModeKeys;
use crate::input::Key;

/// Controller interaction mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Mode {
    #[default]
    Idle,
    /// Waiting for a line-of-interest drag
    LineSelect,
    /// Next click is fed to the user function
    UserFuncWait,
    /// Next click snaps to the nearest trajectory sample
    SnapWait,
    /// Clicks give a seed point, then an initial radius
    DomainGrow,
}

/// What drives a mode change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    LineKey,
    UserFuncKey,
    SnapKey,
    DomainKey,
    /// The mode's pointer gesture finished or was aborted
    GestureDone,
    /// A mode key was pressed while not idle
    Cancel,
}

impl Trigger {
    /// Mode-key trigger for a pressed key
    pub fn from_key(key: Key, keys: &ModeKeys) -> Option<Trigger> {
        if key == keys.line {
            Some(Trigger::LineKey)
        } else if key == keys.user_func {
            Some(Trigger::UserFuncKey)
        } else if key == keys.snap {
            Some(Trigger::SnapKey)
        } else if key == keys.domain {
            Some(Trigger::DomainKey)
        } else {
            None
        }
    }
}

impl Mode {
    /// The single transition table; `None` means the trigger is not
    /// accepted in this mode
    pub fn next(self, trigger: Trigger) -> Option<Mode> {
        match (self, trigger) {
            (Mode::Idle, Trigger::LineKey) => Some(Mode::LineSelect),
            (Mode::Idle, Trigger::UserFuncKey) => Some(Mode::UserFuncWait),
            (Mode::Idle, Trigger::SnapKey) => Some(Mode::SnapWait),
            (Mode::Idle, Trigger::DomainKey) => Some(Mode::DomainGrow),

            (Mode::Idle, Trigger::GestureDone | Trigger::Cancel) => None,
            (_, Trigger::GestureDone | Trigger::Cancel) => Some(Mode::Idle),

            // other modes must cancel first
            _ => None,
        }
    }

    pub fn can_transition_to(self, target: Mode) -> bool {
        self.valid_transitions().contains(&target)
    }

    pub fn valid_transitions(self) -> Vec<Mode> {
        match self {
            Mode::Idle => vec![
                Mode::LineSelect,
                Mode::UserFuncWait,
                Mode::SnapWait,
                Mode::DomainGrow,
            ],
            _ => vec![Mode::Idle],
        }
    }

    pub fn is_idle(self) -> bool {
        self == Mode::Idle
    }

    /// Message shown on entering the mode
    pub fn prompt(self) -> Option<&'static str> {
        match self {
            Mode::Idle => None,
            Mode::LineSelect => Some("Make a line of interest"),
            Mode::UserFuncWait => Some("Output of user function at clicked mouse point"),
            Mode::SnapWait => Some("Snap clicked mouse point to closest point on trajectory"),
            Mode::DomainGrow => Some("Click on domain seed point then initial radius point"),
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Mode::Idle => "idle",
            Mode::LineSelect => "line",
            Mode::UserFuncWait => "user function",
            Mode::SnapWait => "snap",
            Mode::DomainGrow => "domain",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
