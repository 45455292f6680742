//! Tagged control actions and the status-display buttons
//!
//! Buttons carry a stable custom id instead of a bound callback; a press is
//! mapped back to an [`Action`] by [`Action::from_custom_id`].

use crate::chat::{Button, ButtonStyle};
use crate::control::search::{self, SearchSetId};

/// Maximum buttons per row on the chat platform
pub const BUTTONS_PER_ROW: usize = 5;

/// Every operation the control surface can perform on a room
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Join,
    Leave,
    Play { query: String },
    Skip,
    ShowQueue,
    ToggleLoop,
    /// Raw percentage; clamped to 0-200 when applied
    SetVolume { percent: i64 },
    Search { query: String },
    Previous,
    TogglePause,
    Shuffle,
    VolumeUp,
    VolumeDown,
    Stop,
    SearchSelect { set: SearchSetId, index: usize },
}

impl Action {
    /// Map a pressed button's custom id to its action
    pub fn from_custom_id(custom_id: &str) -> Option<Action> {
        if let Some(button) = ControlButton::from_custom_id(custom_id) {
            return Some(button.action());
        }
        search::parse_button_id(custom_id).map(|(set, index)| Action::SearchSelect { set, index })
    }

    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Action::Join => "join",
            Action::Leave => "leave",
            Action::Play { .. } => "play",
            Action::Skip => "skip",
            Action::ShowQueue => "queue",
            Action::ToggleLoop => "loop",
            Action::SetVolume { .. } => "volume",
            Action::Search { .. } => "search",
            Action::Previous => "previous",
            Action::TogglePause => "pause",
            Action::Shuffle => "shuffle",
            Action::VolumeUp => "volume_up",
            Action::VolumeDown => "volume_down",
            Action::Stop => "stop",
            Action::SearchSelect { .. } => "search_select",
        }
    }
}

/// Buttons attached to the status display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlButton {
    Previous,
    TogglePause,
    Skip,
    Loop,
    Shuffle,
    VolumeDown,
    VolumeUp,
    Stop,
}

impl ControlButton {
    /// Display order
    pub const ALL: [ControlButton; 8] = [
        ControlButton::Previous,
        ControlButton::TogglePause,
        ControlButton::Skip,
        ControlButton::Loop,
        ControlButton::Shuffle,
        ControlButton::VolumeDown,
        ControlButton::VolumeUp,
        ControlButton::Stop,
    ];

    pub fn custom_id(self) -> &'static str {
        match self {
            ControlButton::Previous => "btn_prev",
            ControlButton::TogglePause => "btn_toggle",
            ControlButton::Skip => "btn_skip",
            ControlButton::Loop => "btn_loop",
            ControlButton::Shuffle => "btn_shuffle",
            ControlButton::VolumeDown => "btn_voldown",
            ControlButton::VolumeUp => "btn_volup",
            ControlButton::Stop => "btn_stop",
        }
    }

    pub fn from_custom_id(custom_id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.custom_id() == custom_id)
    }

    pub fn label(self) -> &'static str {
        match self {
            ControlButton::Previous => "⏮️",
            ControlButton::TogglePause => "⏯️",
            ControlButton::Skip => "⏭️",
            ControlButton::Loop => "🔁",
            ControlButton::Shuffle => "🔀",
            ControlButton::VolumeDown => "🔉",
            ControlButton::VolumeUp => "🔊",
            ControlButton::Stop => "⏹️",
        }
    }

    fn style(self) -> ButtonStyle {
        match self {
            ControlButton::Stop => ButtonStyle::Danger,
            ControlButton::TogglePause => ButtonStyle::Primary,
            _ => ButtonStyle::Secondary,
        }
    }

    pub fn action(self) -> Action {
        match self {
            ControlButton::Previous => Action::Previous,
            ControlButton::TogglePause => Action::TogglePause,
            ControlButton::Skip => Action::Skip,
            ControlButton::Loop => Action::ToggleLoop,
            ControlButton::Shuffle => Action::Shuffle,
            ControlButton::VolumeDown => Action::VolumeDown,
            ControlButton::VolumeUp => Action::VolumeUp,
            ControlButton::Stop => Action::Stop,
        }
    }

    pub fn to_button(self) -> Button {
        Button {
            custom_id: self.custom_id().to_string(),
            label: self.label().to_string(),
            style: self.style(),
        }
    }
}

/// Status-display button rows (5 + 3)
pub fn control_rows() -> Vec<Vec<Button>> {
    ControlButton::ALL
        .chunks(BUTTONS_PER_ROW)
        .map(|row| row.iter().map(|b| b.to_button()).collect())
        .collect()
}
