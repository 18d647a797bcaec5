//! Battle log for an online card game
//!
//! The game server pushes a stream of JSON messages, each tagged with an
//! `action`. This crate publishes every message on a two-phase
//! [`EventBus`](dispatch::EventBus) and keeps a mirror of the match
//! (players, board, turn) that it turns into a human-readable narrative.
//!
//! ```
//! use battlelog::{MatchFeed, Settings};
//!
//! let mut feed = MatchFeed::new(Settings::new());
//! feed.deliver_raw(r#"{"action":"getGameStarted","yourId":1,"yourUsername":"A","enemyId":2,"enemyUsername":"B"}"#)
//!     .unwrap();
//! assert_eq!(feed.reconstructor().lines(), vec!["A vs B"]);
//! ```

pub mod core;
pub mod dispatch;
pub mod error;
pub mod game;
pub mod settings;

pub use error::{BattleLogError, Result};
pub use game::{BattleLog, LogEntry, MatchFeed, Reconstructor};
pub use settings::Settings;
