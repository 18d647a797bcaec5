//! Core match types and entities

pub mod card;
pub mod entity;
pub mod message;
pub mod player;
pub mod types;

pub use card::Monster;
pub use entity::{EntityStore, GameEntity};
pub use message::{parse_embedded, ServerMessage};
pub use player::Player;
pub use types::{CardId, CardName, PlayerId, PlayerName};
