//! Board entities

use crate::core::types::{flag, truthy};
use crate::core::{CardId, CardName, GameEntity};
use crate::error::RefKind;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use smallvec::SmallVec;

/// Status effects the server reports as boolean-ish card fields
pub const STATUS_FIELDS: &[&str] = &[
    "taunt",
    "charge",
    "armor",
    "dodge",
    "haste",
    "thorns",
    "transparency",
    "invulnerable",
    "cantAttack",
    "candy",
    "kr",
];

/// A creature or non-creature card instance in play
///
/// Deserialized straight from the server's card JSON. Fields the mirror
/// does not model are kept in `extra` so status tags and describers can
/// still see them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Monster {
    pub id: CardId,

    pub name: CardName,

    #[serde(default)]
    pub attack: i64,

    /// Current health
    #[serde(default)]
    pub hp: i64,

    #[serde(default)]
    pub max_hp: i64,

    #[serde(default)]
    pub cost: i64,

    #[serde(default)]
    pub rarity: Option<String>,

    /// Non-creature (spell) card when set
    #[serde(default, deserialize_with = "flag")]
    pub type_card: bool,

    #[serde(default)]
    pub classe: Option<String>,

    #[serde(default)]
    pub class: Option<String>,

    #[serde(default)]
    pub image: Option<String>,

    #[serde(default, deserialize_with = "flag")]
    pub shiny: bool,

    #[serde(default, deserialize_with = "flag")]
    pub silence: bool,

    #[serde(default, deserialize_with = "flag")]
    pub paralyzed: bool,

    /// Rules text, filled in by the card describer
    #[serde(default, skip_deserializing)]
    pub description: String,

    /// Active status tags, derived from `extra`
    #[serde(default, skip_deserializing)]
    pub statuses: SmallVec<[String; 4]>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Monster {
    pub fn new(id: CardId, name: impl Into<CardName>) -> Self {
        Monster {
            id,
            name: name.into(),
            attack: 0,
            hp: 0,
            max_hp: 0,
            cost: 0,
            rarity: None,
            type_card: false,
            classe: None,
            class: None,
            image: None,
            shiny: false,
            silence: false,
            paralyzed: false,
            description: String::new(),
            statuses: SmallVec::new(),
            extra: Map::new(),
        }
    }

    pub fn is_creature(&self) -> bool {
        !self.type_card
    }

    pub fn is_damaged(&self) -> bool {
        self.hp != self.max_hp
    }

    /// Class used for styling; the server uses either spelling
    pub fn class_name(&self) -> Option<&str> {
        self.classe.as_deref().or(self.class.as_deref())
    }

    /// Recompute status tags from the raw card fields
    pub fn refresh_statuses(&mut self) {
        self.statuses = STATUS_FIELDS
            .iter()
            .filter(|field| self.extra.get(**field).is_some_and(truthy))
            .map(|field| field.to_string())
            .collect();
    }
}

impl GameEntity for Monster {
    type Id = CardId;
    const KIND: RefKind = RefKind::Card;

    fn id(&self) -> CardId {
        self.id
    }

    fn name(&self) -> &str {
        self.name.as_str()
    }
}
