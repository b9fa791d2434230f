//! Enumeration types for the Crisis72 simulation.
//!
//! Wire spellings follow the content-provider schema exactly: game modes
//! and crisis events are `SCREAMING_SNAKE_CASE`, visual and audio cues are
//! lowercase. Changing a spelling breaks compatibility with generated
//! content.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

/// One of the six bounded operational resources of the site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum ResourceKind {
    /// Drinking water reserves.
    Water,
    /// Food reserves.
    Food,
    /// Electrical power and fuel.
    Energy,
    /// Communications (internal and external).
    Comms,
    /// Health and safety of the staff.
    Personnel,
    /// Corporate reputation and legal standing.
    Reputation,
}

impl ResourceKind {
    /// Every resource, in display order.
    pub const ALL: [Self; 6] = [
        Self::Water,
        Self::Food,
        Self::Energy,
        Self::Comms,
        Self::Personnel,
        Self::Reputation,
    ];

    /// Spanish display label.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Water => "Agua",
            Self::Food => "Comida",
            Self::Energy => "Energía",
            Self::Comms => "Comunicaciones",
            Self::Personnel => "Personal",
            Self::Reputation => "Reputación",
        }
    }
}

// ---------------------------------------------------------------------------
// Game setup
// ---------------------------------------------------------------------------

/// Difficulty / framing mode selected on the intro screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "bindings/")]
pub enum GameMode {
    /// Standard 72-hour experience.
    #[default]
    Classic,
    /// Faster, higher-pressure situations.
    TimeAttack,
    /// Strategic, reputation-focused decisions.
    Executive,
}

impl GameMode {
    /// Every mode, in intro-screen order.
    pub const ALL: [Self; 3] = [Self::Classic, Self::TimeAttack, Self::Executive];

    /// Wire spelling, as sent to the content provider.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Classic => "CLASSIC",
            Self::TimeAttack => "TIME_ATTACK",
            Self::Executive => "EXECUTIVE",
        }
    }

    /// Spanish display label.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Classic => "Clásico",
            Self::TimeAttack => "Time Attack",
            Self::Executive => "Directivo",
        }
    }

    /// Short Spanish description shown under the label.
    pub const fn description(self) -> &'static str {
        match self {
            Self::Classic => "Experiencia estándar de 72 horas.",
            Self::TimeAttack => "Decisiones rápidas, alta presión.",
            Self::Executive => "Foco en estrategia y reputación.",
        }
    }
}

impl core::fmt::Display for GameMode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The disaster that opens the scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "bindings/")]
pub enum CrisisEvent {
    /// Major earthquake.
    Earthquake,
    /// Massive flooding.
    Flood,
    /// Ransomware cyberattack.
    Cyberattack,
    /// Structural fire.
    Fire,
    /// National power grid failure.
    Blackout,
}

impl CrisisEvent {
    /// Every crisis event, in intro-screen order.
    pub const ALL: [Self; 5] = [
        Self::Earthquake,
        Self::Flood,
        Self::Cyberattack,
        Self::Fire,
        Self::Blackout,
    ];

    /// Spanish display label, also used verbatim in prompts.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Earthquake => "Terremoto Mayor",
            Self::Flood => "Inundación Masiva",
            Self::Cyberattack => "Ciberataque Ransomware",
            Self::Fire => "Incendio Estructural",
            Self::Blackout => "Falla Energética Nacional",
        }
    }
}

impl core::fmt::Display for CrisisEvent {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Presentation cues carried by generated steps
// ---------------------------------------------------------------------------

/// Visual treatment hint for the current step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum VisualCue {
    /// Site operating normally.
    #[default]
    Normal,
    /// Fire visible.
    Fire,
    /// Water ingress.
    Flood,
    /// Loss of lighting.
    Dark,
    /// Crowd panic.
    Panic,
}

impl VisualCue {
    /// Whether the site status indicator should show an alert.
    pub const fn is_alert(self) -> bool {
        !matches!(self, Self::Normal)
    }
}

/// Audio hint for the current step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum AudioCue {
    /// Silence.
    #[default]
    None,
    /// Building alarm.
    Alarm,
    /// Low structural rumble.
    Rumble,
    /// Emergency siren.
    Siren,
}

/// Map zones of the office schematic.
///
/// Generated steps carry the zone as free text; [`LocationZone::parse`]
/// normalizes it. Anything unrecognized maps to [`LocationZone::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "bindings/")]
pub enum LocationZone {
    /// Data center.
    ServerRoom,
    /// Open-plan offices.
    Offices,
    /// Entrance lobby.
    Lobby,
    /// Storage warehouse.
    Warehouse,
    /// Outside the building.
    Outside,
    /// Roof.
    Roof,
    /// Location uncertain.
    Unknown,
}

impl LocationZone {
    /// Every zone with a place on the map (excludes `Unknown`).
    pub const MAPPED: [Self; 6] = [
        Self::ServerRoom,
        Self::Offices,
        Self::Lobby,
        Self::Warehouse,
        Self::Outside,
        Self::Roof,
    ];

    /// Wire spelling.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ServerRoom => "SERVER_ROOM",
            Self::Offices => "OFFICES",
            Self::Lobby => "LOBBY",
            Self::Warehouse => "WAREHOUSE",
            Self::Outside => "OUTSIDE",
            Self::Roof => "ROOF",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Normalize a generated zone string.
    ///
    /// Matching is case-insensitive and accepts decorated values such as
    /// `"server_room (east wing)"`.
    pub fn parse(raw: &str) -> Self {
        let upper = raw.trim().to_uppercase();
        Self::MAPPED
            .into_iter()
            .find(|zone| upper.contains(zone.as_str()))
            .unwrap_or(Self::Unknown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn game_mode_wire_spelling() {
        let json = serde_json::to_string(&GameMode::TimeAttack).unwrap_or_default();
        assert_eq!(json, "\"TIME_ATTACK\"");
        let parsed: Result<GameMode, _> = serde_json::from_str("\"EXECUTIVE\"");
        assert_eq!(parsed.ok(), Some(GameMode::Executive));
    }

    #[test]
    fn cue_wire_spelling() {
        let visual: Result<VisualCue, _> = serde_json::from_str("\"flood\"");
        assert_eq!(visual.ok(), Some(VisualCue::Flood));
        let audio: Result<AudioCue, _> = serde_json::from_str("\"siren\"");
        assert_eq!(audio.ok(), Some(AudioCue::Siren));
        assert!(serde_json::from_str::<VisualCue>("\"smoke\"").is_err());
    }

    #[test]
    fn zone_parsing_is_lenient() {
        assert_eq!(LocationZone::parse("SERVER_ROOM"), LocationZone::ServerRoom);
        assert_eq!(LocationZone::parse(" lobby "), LocationZone::Lobby);
        assert_eq!(LocationZone::parse("roof access"), LocationZone::Roof);
        assert_eq!(LocationZone::parse("parking"), LocationZone::Unknown);
        assert_eq!(LocationZone::parse(""), LocationZone::Unknown);
    }

    #[test]
    fn crisis_labels() {
        assert_eq!(CrisisEvent::Cyberattack.label(), "Ciberataque Ransomware");
        assert_eq!(CrisisEvent::ALL.len(), 5);
    }

    #[test]
    fn only_normal_cue_is_calm() {
        assert!(!VisualCue::Normal.is_alert());
        assert!(VisualCue::Panic.is_alert());
    }
}
