//! Serializable view of the game for clients
//!
//! Eligibility flags and marker strings are computed here, on the way out,
//! so the state itself never stores anything derived.

use chrono::Timelike;
use serde::{Deserialize, Serialize};

use crate::{
    auth::{Character, LoginPhase},
    capture::{CapturePhase, DiscoveryRecord},
    game::{GameState, Overlay, Profile},
    registry::{Plant, Rarity},
    spatial::{self, Position},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeOfDay {
    Sunny,
    Cloudy,
    Night,
}

impl TimeOfDay {
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            6..=16 => TimeOfDay::Sunny,
            17..=18 => TimeOfDay::Cloudy,
            _ => TimeOfDay::Night,
        }
    }

    pub fn now() -> Self {
        Self::from_hour(chrono::Local::now().hour())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum SessionView {
    LoggedOut,
    Verifying,
    Welcoming,
    Failed { message: String },
    Authenticated,
}

impl From<&LoginPhase> for SessionView {
    fn from(phase: &LoginPhase) -> Self {
        match phase {
            LoginPhase::Idle => SessionView::LoggedOut,
            LoginPhase::Verifying { .. } => SessionView::Verifying,
            LoginPhase::Welcoming { .. } => SessionView::Welcoming,
            LoginPhase::Failed { message } => SessionView::Failed {
                message: message.clone(),
            },
            LoginPhase::Authenticated => SessionView::Authenticated,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub position: Position,
    pub marker: String,
    pub notable_flora: Vec<String>,
    pub in_range: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlantView {
    pub id: String,
    pub name: String,
    pub position: Position,
    pub marker: String,
    pub rarity: Rarity,
    pub in_range: bool,
    pub distance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodexEntry {
    pub id: String,
    pub name: String,
    pub marker: String,
    pub rarity: Rarity,
}

impl From<&Plant> for CodexEntry {
    fn from(plant: &Plant) -> Self {
        Self {
            id: plant.id.clone(),
            name: plant.name.clone(),
            marker: plant.marker.resolve(),
            rarity: plant.rarity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OverlayView {
    None,
    CharacterPicker,
    Building {
        building_id: String,
    },
    Capture {
        plant_id: String,
        plant_name: String,
        stage: CaptureStage,
        can_close: bool,
    },
    Discovery {
        record: DiscoveryRecord,
        headline: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureStage {
    AwaitingPhoto,
    Identifying,
    Celebrating,
}

impl From<&CapturePhase> for CaptureStage {
    fn from(phase: &CapturePhase) -> Self {
        match phase {
            CapturePhase::AwaitingPhoto => CaptureStage::AwaitingPhoto,
            CapturePhase::Identifying { .. } => CaptureStage::Identifying,
            CapturePhase::Celebrating { .. } => CaptureStage::Celebrating,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub session: SessionView,
    pub character: Character,
    pub player: Position,
    pub map_size: f64,
    pub interaction_radius: f64,
    pub movement_blocked: bool,
    pub buildings: Vec<BuildingView>,
    /// Undiscovered plants only; cataloged ones leave the map
    pub plants: Vec<PlantView>,
    pub overlay: OverlayView,
    pub menu_open: bool,
    pub profile: Profile,
    pub codex: Vec<CodexEntry>,
    pub time_of_day: TimeOfDay,
}

impl GameSnapshot {
    pub fn capture(state: &GameState, time_of_day: TimeOfDay) -> Self {
        let player = state.player.position;
        let buildings = state
            .registry
            .buildings()
            .iter()
            .map(|building| BuildingView {
                id: building.id.clone(),
                name: building.name.clone(),
                description: building.description.clone(),
                position: building.position,
                marker: building.marker.resolve(),
                notable_flora: building.notable_flora.clone(),
                in_range: state.in_range(building.position),
            })
            .collect();
        let plants = state
            .registry
            .undiscovered()
            .map(|plant| PlantView {
                id: plant.id.clone(),
                name: plant.name.clone(),
                position: plant.position,
                marker: plant.marker.resolve(),
                rarity: plant.rarity,
                in_range: state.in_range(plant.position),
                distance: spatial::distance(player, plant.position),
            })
            .collect();

        Self {
            session: SessionView::from(&state.login),
            character: state.character.clone(),
            player,
            map_size: state.rules.bounds.size(),
            interaction_radius: state.rules.interaction_radius,
            movement_blocked: state.movement_blocked(),
            buildings,
            plants,
            overlay: overlay_view(state),
            menu_open: state.menu_open,
            profile: state.profile.clone(),
            codex: state.registry.discovered().map(CodexEntry::from).collect(),
            time_of_day,
        }
    }
}

fn overlay_view(state: &GameState) -> OverlayView {
    match &state.overlay {
        Overlay::None => OverlayView::None,
        Overlay::CharacterPicker => OverlayView::CharacterPicker,
        Overlay::Building { building_id } => OverlayView::Building {
            building_id: building_id.clone(),
        },
        Overlay::Capture(session) => OverlayView::Capture {
            plant_id: session.plant_id.clone(),
            plant_name: state
                .registry
                .plant(&session.plant_id)
                .map(|plant| plant.name.clone())
                .unwrap_or_default(),
            stage: CaptureStage::from(&session.phase),
            can_close: session.can_close(),
        },
        Overlay::Discovery(record) => OverlayView::Discovery {
            record: record.clone(),
            headline: record.headline().to_string(),
        },
    }
}
