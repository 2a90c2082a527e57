//! Simulated camera capture of a plant
//!
//! A session walks `AwaitingPhoto -> Identifying -> Celebrating` and then
//! hands a [`DiscoveryRecord`] back to the game. The identification step is
//! a fixed delay, not a call to [`crate::identify`]; the record is built from
//! what the map already knows about the targeted plant.

use serde::{Deserialize, Serialize};

use crate::game::TimerTicket;
use crate::registry::{Plant, Rarity};

pub const PLACEHOLDER_SCIENTIFIC_NAME: &str = "Discovery in Progress";
pub const PLACEHOLDER_DESCRIPTION: &str =
    "You captured a touch of campus green! This plant is now kept in your digital field guide.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum CapturePhase {
    AwaitingPhoto,
    Identifying { ticket: TimerTicket },
    Celebrating { ticket: TimerTicket },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureSession {
    pub plant_id: String,
    pub phase: CapturePhase,
    /// Photo payload as submitted (usually a `data:` URL)
    pub photo: Option<String>,
}

impl CaptureSession {
    pub fn new(plant_id: impl Into<String>) -> Self {
        Self {
            plant_id: plant_id.into(),
            phase: CapturePhase::AwaitingPhoto,
            photo: None,
        }
    }

    /// The close button disappears once the celebration starts
    pub fn can_close(&self) -> bool {
        !matches!(self.phase, CapturePhase::Celebrating { .. })
    }

    pub fn accepts_photo(&self) -> bool {
        matches!(self.phase, CapturePhase::AwaitingPhoto)
    }

    pub fn pending_ticket(&self) -> Option<TimerTicket> {
        match self.phase {
            CapturePhase::AwaitingPhoto => None,
            CapturePhase::Identifying { ticket } | CapturePhase::Celebrating { ticket } => {
                Some(ticket)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryRecord {
    pub plant_id: String,
    pub name: String,
    pub scientific_name: String,
    pub description: String,
    pub rarity: Rarity,
    /// First time this plant was cataloged
    pub is_new: bool,
}

impl DiscoveryRecord {
    pub fn synthesize(plant: &Plant, is_new: bool) -> Self {
        Self {
            plant_id: plant.id.clone(),
            name: plant.name.clone(),
            scientific_name: plant
                .scientific_name
                .clone()
                .unwrap_or_else(|| PLACEHOLDER_SCIENTIFIC_NAME.to_string()),
            description: plant
                .description
                .clone()
                .unwrap_or_else(|| PLACEHOLDER_DESCRIPTION.to_string()),
            rarity: plant.rarity,
            is_new,
        }
    }

    pub fn headline(&self) -> &'static str {
        if self.is_new {
            "First Explorer!"
        } else {
            "Plant Cataloged!"
        }
    }
}
