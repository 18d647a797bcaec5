//! Match state reconstruction and the battle narrative

pub mod context;
pub mod describe;
pub mod entry;
pub mod feed;
pub mod ignored;
pub mod logger;
pub mod reconstructor;
pub mod result_screen;

pub use context::{Banner, CardPlayKind, EffectToken, MatchContext, MatchDefaults, MatchEnd, MatchPhase};
pub use describe::{CardDescriber, ServerDescription};
pub use entry::{CardDescriptor, LogEntry, LogPart, PlayerDescriptor};
pub use feed::{Delivery, MatchFeed};
pub use logger::{BattleLog, OutputFormat, OutputMode};
pub use reconstructor::Reconstructor;
pub use result_screen::{Notice, NoticeQueue};
