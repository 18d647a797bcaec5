//! Error types for the battle log

use thiserror::Error;

/// What kind of id an invalid reference named
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    Player,
    Card,
}

impl std::fmt::Display for RefKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RefKind::Player => write!(f, "player"),
            RefKind::Card => write!(f, "card"),
        }
    }
}

#[derive(Error, Debug)]
pub enum BattleLogError {
    #[error("Cannot decode {action} payload: {source}")]
    Decode {
        action: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Cannot decode embedded field {field} of {action}: {source}")]
    EmbeddedJson {
        action: String,
        field: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid reference in {action}: unknown {kind} {id}")]
    InvalidReference {
        action: String,
        kind: RefKind,
        id: i64,
    },

    #[error("{0} needs the current turn holder, but no turn has started")]
    NoTurnHolder(String),

    #[error("Received {0} before any match was started")]
    MatchNotStarted(String),

    #[error("Cannot render log entry: {0}")]
    Render(#[source] serde_json::Error),

    #[error("Battle log is closed, refusing entry: {0}")]
    LogClosed(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl BattleLogError {
    /// True for the loud protocol-drift failure (unknown player or card id)
    pub fn is_invalid_reference(&self) -> bool {
        matches!(self, BattleLogError::InvalidReference { .. })
    }
}

pub type Result<T> = std::result::Result<T, BattleLogError>;
