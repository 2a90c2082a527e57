//! Game state and the event reducer
//!
//! All state lives in one [`GameState`] value. Every user action or timer
//! completion is an [`Event`], and [`reduce`] maps `(state, event)` to the
//! next state plus the timers the caller must start. Nothing in here sleeps
//! or spawns; the runtime owns the clock and feeds back
//! [`Event::TimerFired`] when a delay elapses.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    auth::{Authenticator, Character, Credentials, Gender, LoginPhase},
    capture::{CapturePhase, CaptureSession, DiscoveryRecord},
    config::{ConfigError, GameConfig},
    movement::{self, Direction, DirectionSet},
    registry::{Building, EntityRegistry, Plant},
    rng::RngManager,
    spatial::{self, MapBounds, Position},
};

/// Identifies one scheduled delay. Tickets are never reused, so a timer
/// that outlived its flow can't match whatever replaced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimerTicket(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    pub login_verify: Duration,
    pub login_welcome: Duration,
    pub capture_identify: Duration,
    pub capture_celebrate: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rules {
    pub bounds: MapBounds,
    pub interaction_radius: f64,
    pub move_speed: f64,
    pub timings: Timings,
    pub authenticator: Authenticator,
}

impl Default for Rules {
    fn default() -> Self {
        GameConfig::default().rules()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Friend {
    pub id: String,
    pub name: String,
    pub avatar: String,
    pub level: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub level: u32,
    pub exp: u32,
    pub steps: u32,
    pub friends: Vec<Friend>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            level: 3,
            exp: 240,
            steps: 1240,
            friends: vec![Friend {
                id: "f1".into(),
                name: "Fern".into(),
                avatar: "🐱".into(),
                level: 15,
            }],
        }
    }
}

/// Whatever currently sits on top of the map
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Overlay {
    #[default]
    None,
    CharacterPicker,
    Building { building_id: String },
    Capture(CaptureSession),
    Discovery(DiscoveryRecord),
}

impl Overlay {
    pub fn is_none(&self) -> bool {
        matches!(self, Overlay::None)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    pub rules: Rules,
    pub login: LoginPhase,
    pub character: Character,
    pub player: PlayerState,
    pub registry: EntityRegistry,
    pub profile: Profile,
    pub overlay: Overlay,
    pub menu_open: bool,
    next_ticket: u64,
}

impl GameState {
    pub fn new(rules: Rules, registry: EntityRegistry, spawn: Position) -> Self {
        let position = rules.bounds.clamp(spawn);
        Self {
            rules,
            login: LoginPhase::Idle,
            character: Character::default(),
            player: PlayerState { position },
            registry,
            profile: Profile::default(),
            overlay: Overlay::None,
            menu_open: false,
            next_ticket: 0,
        }
    }

    /// Campus map with plants drawn from the `plants` stream of `rng`.
    /// Rejects configs that fail [`GameConfig::validate`].
    pub fn with_rng(config: &GameConfig, rng: &mut RngManager) -> Result<Self, ConfigError> {
        config.validate()?;
        let rules = config.rules();
        let registry = EntityRegistry::campus(
            &mut rng.stream("plants"),
            &rules.bounds,
            &config.plant_generation(),
        );
        Ok(Self::new(rules, registry, config.map.spawn))
    }

    pub fn from_config(config: &GameConfig) -> Result<Self, ConfigError> {
        let mut rng = RngManager::from_seed(config.seed);
        Self::with_rng(config, &mut rng)
    }

    pub fn is_authenticated(&self) -> bool {
        self.login.is_authenticated()
    }

    /// Movement only runs on the bare map of a signed-in player
    pub fn movement_blocked(&self) -> bool {
        !self.is_authenticated() || !self.overlay.is_none()
    }

    pub fn in_range(&self, target: Position) -> bool {
        spatial::is_in_range(
            self.player.position,
            target,
            self.rules.interaction_radius,
        )
    }

    pub fn interactable_plants(&self) -> impl Iterator<Item = &Plant> {
        self.registry
            .undiscovered()
            .filter(|plant| self.in_range(plant.position))
    }

    pub fn interactable_buildings(&self) -> impl Iterator<Item = &Building> {
        self.registry
            .buildings()
            .iter()
            .filter(|building| self.in_range(building.position))
    }

    fn issue_ticket(&mut self) -> TimerTicket {
        self.next_ticket += 1;
        TimerTicket(self.next_ticket)
    }

    /// Whether pointer selection on the map is possible right now
    fn map_accepts_selection(&self) -> bool {
        self.is_authenticated() && self.overlay.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    SubmitLogin { identifier: String, secret: String },
    SelectGender { gender: Gender },
    ToggleAccessory { accessory: String },
    ConfirmCharacter,
    /// Raw `KeyboardEvent.key`; anything but WASD/arrows is ignored
    KeyDown { key: String },
    Move { directions: DirectionSet },
    ToggleMenu,
    SelectBuilding { building_id: String },
    DismissBuilding,
    SelectPlant { plant_id: String },
    SubmitPhoto { image: String },
    CloseCapture,
    DismissDiscovery,
    /// Fed back by the runtime only; clients can't post it
    #[serde(skip_deserializing)]
    TimerFired { ticket: TimerTicket },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Schedule { ticket: TimerTicket, delay: Duration },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: GameState,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn unchanged(state: GameState) -> Self {
        Self {
            state,
            effects: Vec::new(),
        }
    }
}

pub fn reduce(state: GameState, event: Event) -> Transition {
    let mut state = state;
    let mut effects = Vec::new();

    match event {
        Event::SubmitLogin { identifier, secret } => {
            if state.login.accepts_submission() {
                let ticket = state.issue_ticket();
                state.login = LoginPhase::Verifying {
                    ticket,
                    attempt: Credentials::new(identifier, secret),
                };
                effects.push(Effect::Schedule {
                    ticket,
                    delay: state.rules.timings.login_verify,
                });
            }
        }
        Event::SelectGender { gender } => {
            if state.overlay == Overlay::CharacterPicker {
                state.character.gender = gender;
            }
        }
        Event::ToggleAccessory { accessory } => {
            if state.overlay == Overlay::CharacterPicker {
                state.character.toggle_accessory(&accessory);
            }
        }
        Event::ConfirmCharacter => {
            if state.overlay == Overlay::CharacterPicker {
                state.overlay = Overlay::None;
                info!(gender = ?state.character.gender, "entering campus");
            }
        }
        Event::KeyDown { key } => {
            if let Some(direction) = Direction::from_key(&key) {
                return reduce(
                    state,
                    Event::Move {
                        directions: DirectionSet::single(direction),
                    },
                );
            }
        }
        Event::Move { directions } => {
            if !state.movement_blocked() && !directions.is_empty() {
                state.player.position = movement::step(
                    state.player.position,
                    &directions,
                    state.rules.move_speed,
                    &state.rules.bounds,
                );
            }
        }
        Event::ToggleMenu => {
            if state.is_authenticated() && state.overlay != Overlay::CharacterPicker {
                state.menu_open = !state.menu_open;
            }
        }
        Event::SelectBuilding { building_id } => {
            let selectable = state.map_accepts_selection()
                && state
                    .registry
                    .building(&building_id)
                    .is_some_and(|building| state.in_range(building.position));
            if selectable {
                state.overlay = Overlay::Building { building_id };
            }
        }
        Event::DismissBuilding => {
            if matches!(state.overlay, Overlay::Building { .. }) {
                state.overlay = Overlay::None;
            }
        }
        Event::SelectPlant { plant_id } => {
            let selectable = state.map_accepts_selection()
                && state.registry.plant(&plant_id).is_some_and(|plant| {
                    !plant.is_discovered() && state.in_range(plant.position)
                });
            if selectable {
                state.overlay = Overlay::Capture(CaptureSession::new(plant_id));
            }
        }
        Event::SubmitPhoto { image } => {
            let accepts = matches!(&state.overlay, Overlay::Capture(session) if session.accepts_photo());
            if accepts {
                let ticket = state.issue_ticket();
                if let Overlay::Capture(session) = &mut state.overlay {
                    session.photo = Some(image);
                    session.phase = CapturePhase::Identifying { ticket };
                }
                effects.push(Effect::Schedule {
                    ticket,
                    delay: state.rules.timings.capture_identify,
                });
            }
        }
        Event::CloseCapture => {
            if matches!(&state.overlay, Overlay::Capture(session) if session.can_close()) {
                state.overlay = Overlay::None;
            }
        }
        Event::DismissDiscovery => {
            if matches!(state.overlay, Overlay::Discovery(_)) {
                state.overlay = Overlay::None;
            }
        }
        Event::TimerFired { ticket } => return timer_fired(state, ticket),
    }

    Transition { state, effects }
}

fn timer_fired(mut state: GameState, ticket: TimerTicket) -> Transition {
    let mut effects = Vec::new();

    match &state.login {
        LoginPhase::Verifying {
            ticket: expected,
            attempt,
        } if *expected == ticket => {
            match state.rules.authenticator.verify(attempt) {
                Ok(()) => {
                    info!(identifier = %attempt.identifier, "login accepted");
                    let next = state.issue_ticket();
                    state.login = LoginPhase::Welcoming { ticket: next };
                    effects.push(Effect::Schedule {
                        ticket: next,
                        delay: state.rules.timings.login_welcome,
                    });
                }
                Err(rejected) => {
                    info!(identifier = %attempt.identifier, "login rejected");
                    state.login = LoginPhase::Failed {
                        message: rejected.message,
                    };
                }
            }
            return Transition { state, effects };
        }
        LoginPhase::Welcoming { ticket: expected } if *expected == ticket => {
            state.login = LoginPhase::Authenticated;
            state.overlay = Overlay::CharacterPicker;
            return Transition { state, effects };
        }
        _ => {}
    }

    let phase = match &state.overlay {
        Overlay::Capture(session) if session.pending_ticket() == Some(ticket) => {
            session.phase.clone()
        }
        _ => {
            debug!(ticket = ticket.0, "ignoring stale timer");
            return Transition::unchanged(state);
        }
    };

    match phase {
        CapturePhase::Identifying { .. } => {
            let next = state.issue_ticket();
            if let Overlay::Capture(session) = &mut state.overlay {
                session.phase = CapturePhase::Celebrating { ticket: next };
            }
            effects.push(Effect::Schedule {
                ticket: next,
                delay: state.rules.timings.capture_celebrate,
            });
        }
        CapturePhase::Celebrating { .. } => complete_capture(&mut state),
        CapturePhase::AwaitingPhoto => {}
    }

    Transition { state, effects }
}

fn complete_capture(state: &mut GameState) {
    let plant_id = match &state.overlay {
        Overlay::Capture(session) => session.plant_id.clone(),
        _ => return,
    };
    state.overlay = Overlay::None;

    let in_range = state
        .registry
        .plant(&plant_id)
        .is_some_and(|plant| state.in_range(plant.position));
    if !in_range {
        warn!(plant = %plant_id, "capture finished out of range, discarding");
        return;
    }

    let is_new = state.registry.discover(&plant_id).unwrap_or(false);
    if let Some(plant) = state.registry.plant(&plant_id) {
        info!(plant = %plant.id, name = %plant.name, is_new, "plant captured");
        state.overlay = Overlay::Discovery(DiscoveryRecord::synthesize(plant, is_new));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{seed_buildings, Marker, Rarity};

    fn demo_state() -> GameState {
        let plants = vec![
            Plant::new(
                "near",
                "Banyan",
                Position::new(1580.0, 2780.0),
                Marker::glyph("🌳"),
                Rarity::Common,
            ),
            Plant::new(
                "far",
                "Lily",
                Position::new(100.0, 100.0),
                Marker::glyph("🌸"),
                Rarity::Rare,
            ),
        ];
        let registry = EntityRegistry::new(seed_buildings(), plants);
        GameState::new(Rules::default(), registry, Position::new(1500.0, 2780.0))
    }

    fn signed_in(mut state: GameState) -> GameState {
        state.login = LoginPhase::Authenticated;
        state
    }

    fn only_schedule(effects: &[Effect]) -> (TimerTicket, Duration) {
        match effects {
            [Effect::Schedule { ticket, delay }] => (*ticket, *delay),
            other => panic!("expected one scheduled timer, got {other:?}"),
        }
    }

    #[test]
    fn login_flow_reaches_character_picker() {
        let state = demo_state();
        let t = reduce(
            state,
            Event::SubmitLogin {
                identifier: "explorer@plantgo.demo".into(),
                secret: "sprout-2024".into(),
            },
        );
        let (ticket, delay) = only_schedule(&t.effects);
        assert_eq!(delay, Duration::from_millis(1200));
        assert!(!t.state.is_authenticated());

        let t = reduce(t.state, Event::TimerFired { ticket });
        let (ticket, delay) = only_schedule(&t.effects);
        assert_eq!(delay, Duration::from_millis(800));
        assert!(matches!(t.state.login, LoginPhase::Welcoming { .. }));

        let t = reduce(t.state, Event::TimerFired { ticket });
        assert!(t.effects.is_empty());
        assert!(t.state.is_authenticated());
        assert_eq!(t.state.overlay, Overlay::CharacterPicker);
    }

    #[test]
    fn wrong_password_fails_and_can_retry() {
        let t = reduce(
            demo_state(),
            Event::SubmitLogin {
                identifier: "explorer@plantgo.demo".into(),
                secret: "nope".into(),
            },
        );
        let (ticket, _) = only_schedule(&t.effects);
        let t = reduce(t.state, Event::TimerFired { ticket });

        assert!(t.effects.is_empty());
        assert!(!t.state.is_authenticated());
        assert!(matches!(t.state.login, LoginPhase::Failed { .. }));
        assert!(t.state.login.accepts_submission());
    }

    #[test]
    fn double_submit_is_ignored() {
        let event = Event::SubmitLogin {
            identifier: "a".into(),
            secret: "b".into(),
        };
        let t = reduce(demo_state(), event.clone());
        let again = reduce(t.state.clone(), event);

        assert!(again.effects.is_empty());
        assert_eq!(again.state, t.state);
    }

    #[test]
    fn character_picker_edits_character() {
        let mut state = signed_in(demo_state());
        state.overlay = Overlay::CharacterPicker;

        let state = reduce(state, Event::SelectGender { gender: Gender::Girl }).state;
        let state = reduce(
            state,
            Event::ToggleAccessory {
                accessory: "hat".into(),
            },
        )
        .state;
        assert_eq!(state.character.gender, Gender::Girl);
        assert_eq!(state.character.accessories, vec!["hat".to_string()]);

        let moved = reduce(state.clone(), Event::KeyDown { key: "w".into() }).state;
        assert_eq!(moved.player, state.player, "picker blocks movement");

        let state = reduce(state, Event::ConfirmCharacter).state;
        assert!(state.overlay.is_none());
    }

    #[test]
    fn movement_requires_login() {
        let state = demo_state();
        let after = reduce(state.clone(), Event::KeyDown { key: "w".into() }).state;
        assert_eq!(after, state);
    }

    #[test]
    fn key_down_moves_player() {
        let state = signed_in(demo_state());
        let state = reduce(state, Event::KeyDown { key: "ArrowLeft".into() }).state;
        assert_eq!(state.player.position, Position::new(1475.0, 2780.0));

        let state = reduce(state, Event::KeyDown { key: "x".into() }).state;
        assert_eq!(state.player.position, Position::new(1475.0, 2780.0));
    }

    #[test]
    fn capture_flow_discovers_plant() {
        let state = signed_in(demo_state());
        let state = reduce(
            state,
            Event::SelectPlant {
                plant_id: "near".into(),
            },
        )
        .state;
        assert!(matches!(state.overlay, Overlay::Capture(_)));

        let t = reduce(
            state,
            Event::SubmitPhoto {
                image: "data:image/jpeg;base64,AAAA".into(),
            },
        );
        let (ticket, delay) = only_schedule(&t.effects);
        assert_eq!(delay, Duration::from_millis(1000));

        let t = reduce(t.state, Event::TimerFired { ticket });
        let (ticket, delay) = only_schedule(&t.effects);
        assert_eq!(delay, Duration::from_millis(3000));
        assert!(!t.state.registry.plant("near").unwrap().is_discovered());

        let t = reduce(t.state, Event::TimerFired { ticket });
        assert!(t.effects.is_empty());
        assert!(t.state.registry.plant("near").unwrap().is_discovered());
        match &t.state.overlay {
            Overlay::Discovery(record) => {
                assert!(record.is_new);
                assert_eq!(record.name, "Banyan");
            }
            other => panic!("expected discovery modal, got {other:?}"),
        }

        let state = reduce(t.state, Event::DismissDiscovery).state;
        assert!(state.overlay.is_none());
    }

    #[test]
    fn closing_capture_suppresses_pending_timer() {
        let state = signed_in(demo_state());
        let state = reduce(
            state,
            Event::SelectPlant {
                plant_id: "near".into(),
            },
        )
        .state;
        let t = reduce(state, Event::SubmitPhoto { image: "x".into() });
        let (ticket, _) = only_schedule(&t.effects);

        let closed = reduce(t.state, Event::CloseCapture).state;
        assert!(closed.overlay.is_none());

        let after = reduce(closed.clone(), Event::TimerFired { ticket });
        assert!(after.effects.is_empty());
        assert_eq!(after.state, closed);
    }

    #[test]
    fn celebration_cannot_be_closed() {
        let state = signed_in(demo_state());
        let state = reduce(
            state,
            Event::SelectPlant {
                plant_id: "near".into(),
            },
        )
        .state;
        let t = reduce(state, Event::SubmitPhoto { image: "x".into() });
        let (ticket, _) = only_schedule(&t.effects);
        let t = reduce(t.state, Event::TimerFired { ticket });

        let still = reduce(t.state.clone(), Event::CloseCapture).state;
        assert_eq!(still, t.state);
    }

    #[test]
    fn far_plant_cannot_be_selected() {
        let state = signed_in(demo_state());
        let after = reduce(
            state.clone(),
            Event::SelectPlant {
                plant_id: "far".into(),
            },
        );
        assert_eq!(after.state, state);
        assert!(after.effects.is_empty());
    }

    #[test]
    fn building_modal_opens_in_range_only() {
        let state = signed_in(demo_state());
        // campus gate at (1500, 2850) is 70 away
        let reachable: Vec<&str> = state
            .interactable_buildings()
            .map(|building| building.id.as_str())
            .collect();
        assert_eq!(reachable, vec!["1"]);

        let opened = reduce(
            state.clone(),
            Event::SelectBuilding {
                building_id: "1".into(),
            },
        )
        .state;
        assert_eq!(
            opened.overlay,
            Overlay::Building {
                building_id: "1".into()
            }
        );

        let moved = reduce(opened.clone(), Event::KeyDown { key: "s".into() }).state;
        assert_eq!(moved, opened, "modal blocks movement");

        let closed = reduce(opened, Event::DismissBuilding).state;
        assert!(closed.overlay.is_none());

        let library = reduce(
            state.clone(),
            Event::SelectBuilding {
                building_id: "3".into(),
            },
        )
        .state;
        assert_eq!(library, state);
    }

    #[test]
    fn menu_toggle_does_not_block_movement() {
        let state = signed_in(demo_state());
        let state = reduce(state, Event::ToggleMenu).state;
        assert!(state.menu_open);

        let state = reduce(state, Event::KeyDown { key: "d".into() }).state;
        assert_eq!(state.player.position, Position::new(1525.0, 2780.0));

        let state = reduce(state, Event::ToggleMenu).state;
        assert!(!state.menu_open);
    }

    #[test]
    fn tickets_are_unique() {
        let mut state = demo_state();
        let a = state.issue_ticket();
        let b = state.issue_ticket();
        assert_ne!(a, b);
    }

    #[test]
    fn timer_events_are_not_accepted_from_json() {
        let posted = serde_json::json!({"type": "timer_fired", "ticket": 1});
        assert!(serde_json::from_value::<Event>(posted).is_err());

        let toggle = serde_json::json!({"type": "toggle_menu"});
        assert_eq!(serde_json::from_value::<Event>(toggle).unwrap(), Event::ToggleMenu);
    }

    #[test]
    fn invalid_config_is_rejected_before_building_state() {
        let mut config = GameConfig::default();
        config.map.size = -10.0;

        assert_eq!(
            GameState::from_config(&config).unwrap_err(),
            ConfigError::MapSize(-10.0)
        );
        assert!(GameState::from_config(&GameConfig::default()).is_ok());
    }
}
