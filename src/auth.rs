//! Demo login and character selection

use serde::{Deserialize, Serialize};

use crate::game::TimerTicket;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub identifier: String,
    pub secret: String,
}

impl Credentials {
    pub fn new(identifier: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            secret: secret.into(),
        }
    }
}

/// Accepts exactly one configured credential pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authenticator {
    accepted: Credentials,
}

impl Authenticator {
    pub fn new(accepted: Credentials) -> Self {
        Self { accepted }
    }

    pub fn verify(&self, attempt: &Credentials) -> Result<(), LoginRejected> {
        if *attempt == self.accepted {
            Ok(())
        } else {
            Err(LoginRejected {
                message: format!(
                    "Please check your account and password (demo password: {})",
                    self.accepted.secret
                ),
            })
        }
    }
}

/// Displayable rejection; the user may simply try again
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{message}")]
pub struct LoginRejected {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum LoginPhase {
    Idle,
    /// Credentials submitted, waiting out the verification delay
    Verifying {
        ticket: TimerTicket,
        attempt: Credentials,
    },
    /// Accepted, showing the welcome state before entering the game
    Welcoming { ticket: TimerTicket },
    Failed { message: String },
    Authenticated,
}

impl LoginPhase {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, LoginPhase::Authenticated)
    }

    /// Submitting is allowed unless a verification is already underway or done
    pub fn accepts_submission(&self) -> bool {
        matches!(self, LoginPhase::Idle | LoginPhase::Failed { .. })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    #[default]
    Boy,
    Girl,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub gender: Gender,
    pub accessories: Vec<String>,
}

impl Character {
    /// Add the accessory, or remove it when already worn
    pub fn toggle_accessory(&mut self, accessory: &str) {
        if let Some(index) = self.accessories.iter().position(|a| a == accessory) {
            self.accessories.remove(index);
        } else {
            self.accessories.push(accessory.to_string());
        }
    }
}
