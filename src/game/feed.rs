//! Host-facing entry point: one call per server message
//!
//! [`MatchFeed::deliver`] runs the cancelable pre-event for the message's
//! action, then the final event. Pre-event subscribers (the result-screen
//! override, host code) may cancel; the verdict is handed back to the host,
//! which decides whether to run its own default behavior. The final event
//! always reaches the reconstructor.

use crate::core::ServerMessage;
use crate::dispatch::{EventBus, Verdict};
use crate::game::ignored::is_ignored;
use crate::game::reconstructor::Reconstructor;
use crate::game::result_screen::{self, Notice, NoticeQueue};
use crate::game::BattleLog;
use crate::settings::Settings;
use crate::Result;
use std::rc::Rc;
use tracing::{debug, warn};

/// What happened to one delivered message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    /// Pre-event verdict for the host's default behavior
    pub verdict: Verdict,
    /// Whether any final-phase subscriber ran
    pub ran: bool,
    /// Arrived after the match finished and was not applied
    pub extra: bool,
}

pub struct MatchFeed {
    bus: EventBus<ServerMessage>,
    reconstructor: Reconstructor,
    settings: Rc<Settings>,
    notices: NoticeQueue,
}

impl MatchFeed {
    pub fn new(settings: Settings) -> Self {
        Self::with_reconstructor(settings, Reconstructor::new(BattleLog::new()))
    }

    pub fn with_reconstructor(settings: Settings, reconstructor: Reconstructor) -> Self {
        let settings = Rc::new(settings);
        let notices = NoticeQueue::default();
        let mut bus = EventBus::new();
        reconstructor.attach(&mut bus);
        result_screen::attach(&mut bus, Rc::clone(&settings), Rc::clone(&notices));
        MatchFeed {
            bus,
            reconstructor,
            settings,
            notices,
        }
    }

    /// Add host subscribers
    pub fn bus_mut(&mut self) -> &mut EventBus<ServerMessage> {
        &mut self.bus
    }

    pub fn reconstructor(&self) -> &Reconstructor {
        &self.reconstructor
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn set_turn_clock(&self, remaining: Option<i64>) {
        self.reconstructor.set_turn_clock(remaining);
    }

    /// Run the pre-event phase only
    ///
    /// Extra messages after the match ended are not offered to subscribers.
    pub fn pre_event(&mut self, msg: &ServerMessage) -> Result<Verdict> {
        if self.reconstructor.is_finished() {
            return Ok(Verdict::Proceed);
        }
        self.bus.emit_pre(&msg.action, msg)
    }

    /// Run the final phase only
    pub fn event(&mut self, msg: &ServerMessage) -> Result<Delivery> {
        if self.reconstructor.is_finished() {
            // Ignored chatter keeps arriving after the end; only real actions are extra
            if !is_ignored(&msg.action) {
                debug!(target: "battlelog::extra", action = %msg.action, "extra action after match end");
            }
            return Ok(Delivery {
                verdict: Verdict::Proceed,
                ran: false,
                extra: true,
            });
        }
        let result = self.bus.emit_final(&msg.action, msg)?;
        if !result.ran {
            warn!(target: "battlelog::unknown", action = %msg.action, "unknown action");
        }
        Ok(Delivery {
            verdict: Verdict::Proceed,
            ran: result.ran,
            extra: false,
        })
    }

    /// Pre-event then final event for one message
    pub fn deliver(&mut self, msg: &ServerMessage) -> Result<Delivery> {
        let verdict = self.pre_event(msg)?;
        let delivery = self.event(msg)?;
        Ok(Delivery { verdict, ..delivery })
    }

    /// Parse one JSON frame and deliver it
    pub fn deliver_raw(&mut self, raw: &str) -> Result<Delivery> {
        let msg = ServerMessage::parse(raw)?;
        self.deliver(&msg)
    }

    /// Drain notices queued by subscribers
    pub fn take_notices(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.notices.borrow_mut())
    }
}

impl Default for MatchFeed {
    fn default() -> Self {
        Self::new(Settings::new())
    }
}

impl std::fmt::Debug for MatchFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchFeed")
            .field("bus", &self.bus)
            .field("reconstructor", &self.reconstructor)
            .field("settings", &self.settings)
            .finish()
    }
}
