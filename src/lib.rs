pub mod auth;
pub mod capture;
pub mod config;
pub mod game;
pub mod identify;
pub mod movement;
pub mod registry;
pub mod rng;
pub mod snapshot;
pub mod spatial;
pub mod web;

pub use config::GameConfig;
pub use game::{reduce, Event, GameState, Transition};
