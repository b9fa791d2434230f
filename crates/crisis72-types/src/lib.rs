//! Shared type definitions for the Crisis72 simulation.
//!
//! This crate is the single source of truth for all types used across the
//! Crisis72 workspace. Types defined here flow downstream to `TypeScript`
//! via `ts-rs` for the browser client.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers
//! - [`enums`] -- Enumeration types (resources, modes, crises, cues, zones)
//! - [`structs`] -- Resources, effects, steps, game state and the report
//! - [`session`] -- Session snapshot and push events

pub mod enums;
pub mod ids;
pub mod session;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{AudioCue, CrisisEvent, GameMode, LocationZone, ResourceKind, VisualCue};
pub use ids::SessionId;
pub use session::{
    EndReason, ReportSource, SessionEvent, SessionPhase, SessionSnapshot, TimerPhase, TimerStatus,
};
pub use structs::{
    AdvisorAdvice, Effect, GameState, HistoryEntry, IsoEvaluation, RESOURCE_MAX, RESOURCE_MIN,
    Resources, SimulationResult, SimulationStep, StepOption,
};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation.

    #[test]
    fn export_bindings() {
        // Files are written to `bindings/` relative to the crate root.
        use ts_rs::TS;

        // IDs
        let _ = crate::ids::SessionId::export_all();

        // Enums
        let _ = crate::enums::ResourceKind::export_all();
        let _ = crate::enums::GameMode::export_all();
        let _ = crate::enums::CrisisEvent::export_all();
        let _ = crate::enums::VisualCue::export_all();
        let _ = crate::enums::AudioCue::export_all();
        let _ = crate::enums::LocationZone::export_all();

        // Structs
        let _ = crate::structs::Resources::export_all();
        let _ = crate::structs::Effect::export_all();
        let _ = crate::structs::StepOption::export_all();
        let _ = crate::structs::SimulationStep::export_all();
        let _ = crate::structs::HistoryEntry::export_all();
        let _ = crate::structs::GameState::export_all();
        let _ = crate::structs::IsoEvaluation::export_all();
        let _ = crate::structs::SimulationResult::export_all();
        let _ = crate::structs::AdvisorAdvice::export_all();

        // Session
        let _ = crate::session::SessionPhase::export_all();
        let _ = crate::session::TimerPhase::export_all();
        let _ = crate::session::TimerStatus::export_all();
        let _ = crate::session::EndReason::export_all();
        let _ = crate::session::ReportSource::export_all();
        let _ = crate::session::SessionSnapshot::export_all();
        let _ = crate::session::SessionEvent::export_all();
    }
}
