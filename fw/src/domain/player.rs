//! Player identifiers and record views

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Numeric player identifier (the `XID` in profile links)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl PlayerId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for PlayerId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

impl std::str::FromStr for PlayerId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(Self)
            .map_err(|_| format!("Invalid player id: {}", s))
    }
}

/// Status colour reported by the API (`status.color`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusColor {
    /// Okay
    Green,
    /// Hospital, jail, federal
    Red,
    /// Travelling or abroad
    Blue,
    Other,
}

impl StatusColor {
    fn from_api(s: &str) -> Self {
        match s {
            "green" => Self::Green,
            "red" => Self::Red,
            "blue" => Self::Blue,
            _ => Self::Other,
        }
    }
}

impl std::fmt::Display for StatusColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Green => write!(f, "green"),
            Self::Red => write!(f, "red"),
            Self::Blue => write!(f, "blue"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Last-action activity (`last_action.status`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityStatus {
    Online,
    Idle,
    Offline,
}

impl ActivityStatus {
    fn from_api(s: &str) -> Option<Self> {
        match s {
            "Online" => Some(Self::Online),
            "Idle" => Some(Self::Idle),
            "Offline" => Some(Self::Offline),
            _ => None,
        }
    }

    /// Idle and offline players count as away
    pub fn is_away(self) -> bool {
        matches!(self, Self::Idle | Self::Offline)
    }
}

impl std::fmt::Display for ActivityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Online => write!(f, "Online"),
            Self::Idle => write!(f, "Idle"),
            Self::Offline => write!(f, "Offline"),
        }
    }
}

/// Borrowed view over an opaque player record
///
/// Records are kept as raw JSON in the cache. This view reads the handful of
/// fields the reconciler and row filters care about, tolerating absent ones.
/// User records and faction roster members share these fields.
#[derive(Debug, Clone, Copy)]
pub struct PlayerView<'a> {
    record: &'a Value,
}

impl<'a> PlayerView<'a> {
    pub fn new(record: &'a Value) -> Self {
        Self { record }
    }

    pub fn name(&self) -> Option<&'a str> {
        self.record.get("name").and_then(Value::as_str)
    }

    /// Free-text state such as "Okay", "Hospital" or "Traveling"
    pub fn state(&self) -> Option<&'a str> {
        self.record.get("status").and_then(|s| s.get("state")).and_then(Value::as_str)
    }

    pub fn color(&self) -> StatusColor {
        let color = self
            .record
            .get("status")
            .and_then(|s| s.get("color"))
            .and_then(Value::as_str)
            .map(StatusColor::from_api)
            .unwrap_or(StatusColor::Other);
        debug!(%color, "PlayerView::color: resolved");
        color
    }

    pub fn activity(&self) -> Option<ActivityStatus> {
        self.record
            .get("last_action")
            .and_then(|a| a.get("status"))
            .and_then(Value::as_str)
            .and_then(ActivityStatus::from_api)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_player_id_parse() {
        assert_eq!("2127679".parse::<PlayerId>(), Ok(PlayerId(2127679)));
        assert_eq!(" 42 ".parse::<PlayerId>(), Ok(PlayerId(42)));
        assert!("abc".parse::<PlayerId>().is_err());
        assert!("-1".parse::<PlayerId>().is_err());
    }

    #[test]
    fn test_player_id_display_honours_width() {
        assert_eq!(format!("{:>5}", PlayerId(42)), "   42");
    }

    #[test]
    fn test_player_id_serde_transparent() {
        let id: PlayerId = serde_json::from_str("101").unwrap();
        assert_eq!(id, PlayerId(101));
        assert_eq!(serde_json::to_string(&id).unwrap(), "101");
    }

    #[test]
    fn test_view_reads_fields() {
        let record = json!({
            "name": "Wingman",
            "status": { "state": "Hospital", "color": "red" },
            "last_action": { "status": "Idle" }
        });
        let view = PlayerView::new(&record);
        assert_eq!(view.name(), Some("Wingman"));
        assert_eq!(view.state(), Some("Hospital"));
        assert_eq!(view.color(), StatusColor::Red);
        assert_eq!(view.activity(), Some(ActivityStatus::Idle));
    }

    #[test]
    fn test_view_tolerates_missing_fields() {
        let record = json!({ "player_id": 5 });
        let view = PlayerView::new(&record);
        assert_eq!(view.name(), None);
        assert_eq!(view.state(), None);
        assert_eq!(view.color(), StatusColor::Other);
        assert_eq!(view.activity(), None);
    }

    #[test]
    fn test_activity_is_away() {
        assert!(ActivityStatus::Idle.is_away());
        assert!(ActivityStatus::Offline.is_away());
        assert!(!ActivityStatus::Online.is_away());
    }
}
