//! Wire types describing the live game session.
//!
//! The server exposes a [`SessionSnapshot`] over REST and pushes
//! [`SessionEvent`]s over the `WebSocket` stream.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::CrisisEvent;
use crate::ids::SessionId;
use crate::structs::{GameState, SimulationResult, SimulationStep};

/// Which screen the session is on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "bindings/")]
pub enum SessionPhase {
    /// Mode and crisis selection.
    #[default]
    Intro,
    /// A step is on screen and waiting for a decision.
    Playing,
    /// The next step could not be produced; the player may retry.
    AwaitingStep,
    /// The run ended and the report is being produced.
    Reporting,
    /// The report is available.
    Finished,
}

/// Decision timer lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "bindings/")]
pub enum TimerPhase {
    /// No step is on screen.
    #[default]
    Idle,
    /// Counting down.
    Running,
    /// Paused while a request is in flight.
    Suspended,
    /// Reached zero. Fires the timeout once.
    Expired,
}

/// Observable state of the decision timer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TimerStatus {
    /// Lifecycle phase.
    pub phase: TimerPhase,
    /// Whole seconds left.
    pub remaining_secs: u32,
    /// Full limit the countdown started from.
    pub limit_secs: u32,
    /// True while running with little time left.
    pub urgent: bool,
}

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "bindings/")]
pub enum EndReason {
    /// The survival window elapsed with staff still standing.
    SurvivalWindowElapsed,
    /// Personnel reached zero.
    PersonnelLost,
    /// The decision timer ran out.
    DecisionTimeout,
}

impl EndReason {
    /// Whether the run counts as survived.
    pub const fn survived(self) -> bool {
        matches!(self, Self::SurvivalWindowElapsed)
    }
}

/// Where the final report came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "bindings/")]
pub enum ReportSource {
    /// Produced by the content provider.
    Generated,
    /// Built locally after the provider kept failing.
    Fallback,
}

/// Everything the browser needs to render the current screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SessionSnapshot {
    /// Current run.
    pub session_id: SessionId,
    /// Bumped on every start and restart.
    #[ts(type = "number")]
    pub generation: u64,
    /// Screen.
    pub phase: SessionPhase,
    /// A provider request is in flight. Decision input is disabled.
    pub loading: bool,
    /// Crisis chosen at start.
    pub crisis: Option<CrisisEvent>,
    /// Game state.
    pub state: GameState,
    /// Step on screen, if any.
    pub current_step: Option<SimulationStep>,
    /// Decision timer.
    pub timer: TimerStatus,
    /// Set once the run is over.
    pub end_reason: Option<EndReason>,
    /// Final report, once available.
    pub report: Option<SimulationResult>,
    /// Origin of [`SessionSnapshot::report`].
    pub report_source: Option<ReportSource>,
    /// Last user-facing error message.
    pub last_error: Option<String>,
    /// When the current run started.
    pub started_at: Option<DateTime<Utc>>,
}

/// Messages pushed to connected clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum SessionEvent {
    /// The session changed in a way that needs a full re-render.
    Updated {
        /// Full snapshot after the change.
        snapshot: Box<SessionSnapshot>,
    },
    /// One second of the decision timer elapsed.
    TimerTick {
        /// Run the tick belongs to.
        session_id: SessionId,
        /// Timer after the tick.
        timer: TimerStatus,
    },
    /// The decision timer expired and the run was ended.
    TimedOut {
        /// Run that timed out.
        session_id: SessionId,
    },
}
