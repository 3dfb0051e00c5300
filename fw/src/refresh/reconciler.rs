//! Hand-off from the refresh loop to whatever displays player rows

use std::io::IsTerminal;

use colored::Colorize;
use serde_json::Value;
use tracing::debug;

use crate::api::ApiError;
use crate::domain::{HideReason, PlayerId, PlayerView, RowFilter, StatusColor};

/// Receives freshly resolved records and fatal session errors
pub trait UiReconciler: Send + Sync {
    /// Update the row for `player_id` with `record`
    fn reconcile(&self, player_id: PlayerId, record: &Value);

    /// Tell the operator why auto-refresh stopped
    fn report_failure(&self, error: &ApiError);
}

/// One rendered player row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowLine {
    pub player_id: PlayerId,
    pub name: String,
    pub state: String,
    pub color: StatusColor,
    pub activity: String,
    pub hidden: Option<HideReason>,
}

impl RowLine {
    pub fn from_record(player_id: PlayerId, record: &Value, filter: &RowFilter) -> Self {
        let view = PlayerView::new(record);
        Self {
            player_id,
            name: view.name().unwrap_or("?").to_string(),
            state: view.state().unwrap_or("Unknown").to_string(),
            color: view.color(),
            activity: view.activity().map(|a| a.to_string()).unwrap_or_else(|| "-".to_string()),
            hidden: filter.hides(&view),
        }
    }

    pub fn render(&self, colorize: bool) -> String {
        let state = if colorize {
            match self.color {
                StatusColor::Green => self.state.green().to_string(),
                StatusColor::Red => self.state.red().to_string(),
                StatusColor::Blue => self.state.blue().to_string(),
                StatusColor::Other => self.state.clone(),
            }
        } else {
            self.state.clone()
        };

        let mut line = format!(
            "{:>10}  {:<20} {:<24} {:<8}",
            self.player_id, self.name, state, self.activity
        );
        if let Some(reason) = self.hidden {
            let marker = format!("[hidden: {}]", reason);
            if colorize {
                line.push_str(&marker.dimmed().to_string());
            } else {
                line.push_str(&marker);
            }
        }
        line.trim_end().to_string()
    }
}

/// Prints one line per refreshed player to stdout
pub struct ConsoleReconciler {
    filter: RowFilter,
    /// Leave hidden rows out instead of marking them
    omit_hidden: bool,
    colorize: bool,
}

impl ConsoleReconciler {
    pub fn new(filter: RowFilter) -> Self {
        Self {
            filter,
            omit_hidden: false,
            colorize: std::io::stdout().is_terminal(),
        }
    }

    pub fn omit_hidden(mut self, omit: bool) -> Self {
        self.omit_hidden = omit;
        self
    }
}

impl UiReconciler for ConsoleReconciler {
    fn reconcile(&self, player_id: PlayerId, record: &Value) {
        let row = RowLine::from_record(player_id, record, &self.filter);
        debug!(%player_id, hidden = ?row.hidden, "ConsoleReconciler::reconcile: called");
        if row.hidden.is_some() && self.omit_hidden {
            return;
        }
        println!("{}", row.render(self.colorize));
    }

    fn report_failure(&self, error: &ApiError) {
        debug!(kind = error.kind(), "ConsoleReconciler::report_failure: called");
        eprintln!("Auto refresh stopped: {}", error);
        if error.is_config() {
            eprintln!("Set an API key with `fw key set <KEY>` (or the configured key environment variable).");
        }
    }
}
