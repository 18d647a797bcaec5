//! Inbound server messages and their typed payloads
//!
//! A message is a JSON object with an `action` tag and arbitrary fields.
//! Handlers decode the fields they need into one of the payload structs
//! below; several payloads carry further JSON serialized into a string
//! field, which [`parse_embedded`] unpacks.

use crate::core::types::flag;
use crate::core::{CardId, PlayerId};
use crate::{BattleLogError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A decoded server message: the tag plus its remaining fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerMessage {
    pub action: String,

    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl ServerMessage {
    pub fn new(action: impl Into<String>) -> Self {
        ServerMessage {
            action: action.into(),
            fields: Map::new(),
        }
    }

    /// Add a field (builder pattern)
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    /// Add a field holding JSON serialized into a string, the way the
    /// server ships boards, cards and per-player tables
    #[must_use]
    pub fn with_embedded(self, key: &str, value: &Value) -> Self {
        let text = value.to_string();
        self.with(key, text)
    }

    /// Parse one raw frame from the transport
    pub fn parse(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|source| BattleLogError::Decode {
            action: "<frame>".to_string(),
            source,
        })
    }

    /// Decode the fields into a typed payload
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(Value::Object(self.fields.clone())).map_err(|source| {
            BattleLogError::Decode {
                action: self.action.clone(),
                source,
            }
        })
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

/// Unpack JSON that the server serialized into a string field
pub fn parse_embedded<T: DeserializeOwned>(action: &str, field: &'static str, raw: &str) -> Result<T> {
    serde_json::from_str(raw).map_err(|source| BattleLogError::EmbeddedJson {
        action: action.to_string(),
        field,
        source,
    })
}

/// Cosmetic profile fields sent with every start message
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profiles {
    #[serde(default)]
    pub your_level: Option<i64>,
    #[serde(default)]
    pub your_class: Option<String>,
    #[serde(default)]
    pub your_rank: Option<i64>,
    #[serde(default)]
    pub enemy_level: Option<i64>,
    #[serde(default)]
    pub enemy_class: Option<String>,
    #[serde(default)]
    pub enemy_rank: Option<i64>,
    #[serde(default)]
    pub game_type: Option<String>,
    #[serde(default)]
    pub turn: Option<u32>,
    #[serde(default)]
    pub user_turn: Option<PlayerId>,
}

/// `getGameStarted`: a fresh match, players get default stats
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStarted {
    pub your_id: PlayerId,
    pub your_username: String,
    pub enemy_id: PlayerId,
    pub enemy_username: String,
    #[serde(flatten)]
    pub profiles: Profiles,
}

/// `getReconnection` / `getAllGameInfos`: a match already under way
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    pub you: String,
    pub enemy: String,
    pub golds: String,
    pub lives: String,
    #[serde(default)]
    pub board: Option<String>,
    #[serde(flatten)]
    pub profiles: Profiles,
}

/// Serialized player inside a [`GameSnapshot`]
#[derive(Debug, Clone, Deserialize)]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    pub username: String,
    #[serde(default)]
    pub hp: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnStart {
    pub num_turn: u32,
    pub id_player: PlayerId,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnEnd {
    pub id_player: PlayerId,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerHp {
    pub player_id: PlayerId,
    pub hp: i64,
    #[serde(default, deserialize_with = "flag")]
    pub is_damage: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonsterEffect {
    pub monster_id: CardId,
}

/// Artifact and soul activations
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerEffect {
    pub player_id: PlayerId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BoardUpdate {
    pub board: String,
}

/// `getCardBoard`, `getSpellPlayed`, `getShowCard`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardPlay {
    pub card: String,
    pub id_player: PlayerId,
}

/// `getCardDestroyedHandFull`; its player field is not trusted
#[derive(Debug, Clone, Deserialize)]
pub struct CardDiscard {
    pub card: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonsterDestroyed {
    pub monster_id: CardId,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fight {
    pub attack_monster: CardId,
    pub defend_monster: CardId,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FightPlayer {
    pub attack_monster: CardId,
    pub defend_player: PlayerId,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayersStats {
    pub golds: String,
    pub lives: String,
    #[serde(default)]
    pub hands_size: Option<String>,
    #[serde(default)]
    pub decks_size: Option<String>,
}

/// `refreshTimer`, the per-second countdown of the current turn
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TimerTick {
    #[serde(default)]
    pub time: Option<i64>,
}

/// `getResult`, sent to spectators; players are named, not referenced
#[derive(Debug, Clone, Deserialize)]
pub struct SpectatorResult {
    pub winner: String,
    pub looser: String,
    #[serde(default)]
    pub cause: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_frame() {
        let msg = ServerMessage::parse(r#"{"action":"getTurnStart","numTurn":3,"idPlayer":7}"#).unwrap();
        assert_eq!(msg.action, "getTurnStart");

        let turn: TurnStart = msg.decode().unwrap();
        assert_eq!(turn.num_turn, 3);
        assert_eq!(turn.id_player, PlayerId::new(7));
    }

    #[test]
    fn test_frame_without_action_fails() {
        assert!(ServerMessage::parse(r#"{"numTurn":3}"#).is_err());
    }

    #[test]
    fn test_decode_failure_names_action() {
        let msg = ServerMessage::new("getTurnEnd").with("idPlayer", "not a number");
        let err = msg.decode::<TurnEnd>().unwrap_err();
        assert!(matches!(err, BattleLogError::Decode { ref action, .. } if action == "getTurnEnd"));
    }

    #[test]
    fn test_damage_flag_accepts_numbers() {
        let msg = ServerMessage::new("getUpdatePlayerHp")
            .with("playerId", 2)
            .with("hp", 25)
            .with("isDamage", 1);
        let hp: PlayerHp = msg.decode().unwrap();
        assert!(hp.is_damage);
    }

    #[test]
    fn test_embedded_round() {
        let msg = ServerMessage::new("getPlayersStats").with_embedded("golds", &json!({"1": 4, "2": 7}));
        let raw = msg.field("golds").and_then(Value::as_str).unwrap();
        let golds: std::collections::BTreeMap<String, i64> = parse_embedded("getPlayersStats", "golds", raw).unwrap();
        assert_eq!(golds["2"], 7);

        let err = parse_embedded::<Vec<i64>>("getUpdateBoard", "board", "[1,").unwrap_err();
        assert!(matches!(err, BattleLogError::EmbeddedJson { field: "board", .. }));
    }
}
