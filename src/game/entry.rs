//! Narrative log entries and the descriptor values they reference
//!
//! An entry is a short sequence of parts: plain text interleaved with
//! snapshots of the players and cards it mentions, taken at the moment the
//! entry was written. Renderers turn descriptors into hover cards; the
//! `Display` impls give the plain-text form used by the CLI and tests.

use crate::core::{CardId, Monster, Player, PlayerId};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// Snapshot of a player for rendering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerDescriptor {
    pub id: PlayerId,
    pub name: String,
    pub class: Option<String>,
    pub hp: i64,
    pub gold: i64,
    pub lives: u32,
}

impl PlayerDescriptor {
    /// Hover text: "30 hp, 2 gold"
    pub fn summary(&self) -> String {
        format!("{} hp, {} gold", self.hp, self.gold)
    }
}

impl From<&Player> for PlayerDescriptor {
    fn from(player: &Player) -> Self {
        PlayerDescriptor {
            id: player.id,
            name: player.name.to_string(),
            class: player.class.clone(),
            hp: player.hp,
            gold: player.gold,
            lives: player.lives,
        }
    }
}

/// Snapshot of a card for rendering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardDescriptor {
    pub id: CardId,
    pub name: String,
    pub class: Option<String>,
    pub cost: i64,
    pub attack: i64,
    pub hp: i64,
    pub max_hp: i64,
    pub rarity: Option<String>,
    pub creature: bool,
    pub description: String,
    pub statuses: Vec<String>,
    pub silenced: bool,
    pub paralyzed: bool,
    pub shiny: bool,
    pub image: Option<String>,
}

impl CardDescriptor {
    /// Creatures show attack/health; health is styled when below max
    pub fn is_damaged(&self) -> bool {
        self.creature && self.hp != self.max_hp
    }
}

impl From<&Monster> for CardDescriptor {
    fn from(card: &Monster) -> Self {
        CardDescriptor {
            id: card.id,
            name: card.name.to_string(),
            class: card.class_name().map(str::to_string),
            cost: card.cost,
            attack: card.attack,
            hp: card.hp,
            max_hp: card.max_hp,
            rarity: card.rarity.clone(),
            creature: card.is_creature(),
            description: card.description.clone(),
            statuses: card.statuses.to_vec(),
            silenced: card.silence,
            paralyzed: card.paralyzed,
            shiny: card.shiny,
            image: card.image.clone(),
        }
    }
}

/// One piece of a log entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LogPart {
    Text { text: String },
    Player { player: PlayerDescriptor },
    Card { card: CardDescriptor },
}

impl fmt::Display for LogPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogPart::Text { text } => write!(f, "{text}"),
            LogPart::Player { player } => write!(f, "{}", player.name),
            LogPart::Card { card } => write!(f, "{}", card.name),
        }
    }
}

/// One line of the battle narrative
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LogEntry {
    pub parts: SmallVec<[LogPart; 4]>,
}

impl LogEntry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entry consisting of a single text part
    pub fn text(text: impl Into<String>) -> Self {
        Self::new().push_text(text)
    }

    #[must_use]
    pub fn push_text(mut self, text: impl Into<String>) -> Self {
        self.parts.push(LogPart::Text { text: text.into() });
        self
    }

    #[must_use]
    pub fn push_player(mut self, player: &Player) -> Self {
        self.parts.push(LogPart::Player {
            player: player.into(),
        });
        self
    }

    #[must_use]
    pub fn push_card(mut self, card: &Monster) -> Self {
        self.parts.push(LogPart::Card { card: card.into() });
        self
    }

    /// Players mentioned by this entry, in order
    pub fn players(&self) -> impl Iterator<Item = &PlayerDescriptor> {
        self.parts.iter().filter_map(|part| match part {
            LogPart::Player { player } => Some(player),
            _ => None,
        })
    }

    /// Cards mentioned by this entry, in order
    pub fn cards(&self) -> impl Iterator<Item = &CardDescriptor> {
        self.parts.iter().filter_map(|part| match part {
            LogPart::Card { card } => Some(card),
            _ => None,
        })
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for part in &self.parts {
            write!(f, "{part}")?;
        }
        Ok(())
    }
}
