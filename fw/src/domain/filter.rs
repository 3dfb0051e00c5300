//! Row filter predicates
//!
//! Decide whether a player row is hidden under the operator's filter
//! toggles. Revive and attack modes are mutually exclusive; hide-offline
//! combines with either.

use super::player::{PlayerView, StatusColor};

/// Red states that still rule out a revive
const UNREVIVABLE_SUFFIXES: [&str; 3] = ["Traveling", "Fallen", "Federal"];

/// Target-selection mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FilterMode {
    #[default]
    All,
    /// Only players that can be revived stay visible
    Revive,
    /// Only players that can be attacked stay visible
    Attack,
}

/// Why a row is hidden
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HideReason {
    Revive,
    Attack,
    Offline,
}

impl std::fmt::Display for HideReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Revive => write!(f, "revive"),
            Self::Attack => write!(f, "attack"),
            Self::Offline => write!(f, "offline"),
        }
    }
}

/// Active filter toggles
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowFilter {
    pub mode: FilterMode,
    pub hide_offline: bool,
}

impl RowFilter {
    pub fn new(mode: FilterMode, hide_offline: bool) -> Self {
        Self { mode, hide_offline }
    }

    /// First reason the row would be hidden, if any
    pub fn hides(&self, view: &PlayerView<'_>) -> Option<HideReason> {
        let color = view.color();
        match self.mode {
            // Travelling and okay players are not revive targets
            FilterMode::Revive if matches!(color, StatusColor::Blue | StatusColor::Green) => {
                return Some(HideReason::Revive);
            }
            FilterMode::Revive if color == StatusColor::Red && unrevivable_state(view.state()) => {
                return Some(HideReason::Revive);
            }
            // Travelling and hospitalised/jailed players are not attack targets
            FilterMode::Attack if matches!(color, StatusColor::Blue | StatusColor::Red) => {
                return Some(HideReason::Attack);
            }
            _ => {}
        }

        if self.hide_offline && view.activity().is_some_and(|a| a.is_away()) {
            return Some(HideReason::Offline);
        }

        None
    }
}

fn unrevivable_state(state: Option<&str>) -> bool {
    state.is_some_and(|s| UNREVIVABLE_SUFFIXES.iter().any(|suffix| s.ends_with(suffix)))
}
