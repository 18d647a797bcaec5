//! Player representation

use crate::core::{GameEntity, PlayerId, PlayerName};
use crate::error::RefKind;
use serde::{Deserialize, Serialize};

/// One participant of the match as mirrored from server messages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Server-assigned id
    pub id: PlayerId,

    /// Display name
    pub name: PlayerName,

    /// Cosmetic class (soul colour), used for styling only
    pub class: Option<String>,

    /// Health
    pub hp: i64,

    pub gold: i64,

    /// Remaining lives; a player with more than one survives reaching 0 hp
    pub lives: u32,

    pub level: Option<i64>,

    pub rank: Option<i64>,

    /// Cards in hand, from the periodic stats refresh
    pub hand_size: Option<u32>,

    /// Cards left in deck, from the periodic stats refresh
    pub deck_size: Option<u32>,

    /// Already logged losing a life during the current turn cycle
    #[serde(default)]
    pub lost_life: bool,
}

impl Player {
    pub fn new(id: PlayerId, name: impl Into<PlayerName>, hp: i64, gold: i64) -> Self {
        Player {
            id,
            name: name.into(),
            class: None,
            hp,
            gold,
            lives: 1,
            level: None,
            rank: None,
            hand_size: None,
            deck_size: None,
            lost_life: false,
        }
    }

    /// Store a new health value and return the previous one
    pub fn set_hp(&mut self, hp: i64) -> i64 {
        std::mem::replace(&mut self.hp, hp)
    }

    /// Whether reaching 0 hp now should be narrated as losing a life
    pub fn loses_life_at(&self, hp: i64) -> bool {
        hp == 0 && self.lives > 1 && !self.lost_life
    }

    /// Start a new turn cycle for life-loss reporting
    pub fn reset_turn_flags(&mut self) {
        self.lost_life = false;
    }
}

impl GameEntity for Player {
    type Id = PlayerId;
    const KIND: RefKind = RefKind::Player;

    fn id(&self) -> PlayerId {
        self.id
    }

    fn name(&self) -> &str {
        self.name.as_str()
    }
}
