//! Spectator result-screen override
//!
//! When a spectated match ends the host would normally navigate to its
//! own result page. Unless disabled in settings, this pre-event subscriber
//! cancels that default and queues a "Game Finished" notice instead, so the
//! spectator stays on the battle log.

use crate::core::ServerMessage;
use crate::dispatch::EventBus;
use crate::settings::{Settings, DISABLE_RESULT_TOAST};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::debug;

/// Message for the host to show the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub title: String,
    pub text: String,
}

impl Notice {
    pub fn game_finished() -> Self {
        Notice {
            title: "Game Finished".to_string(),
            text: "Return Home".to_string(),
        }
    }
}

/// Queue of notices shared between subscribers and the host
pub type NoticeQueue = Rc<RefCell<Vec<Notice>>>;

/// Subscribe the override to `getResult` pre-events
pub fn attach(bus: &mut EventBus<ServerMessage>, settings: Rc<Settings>, notices: NoticeQueue) {
    bus.subscribe_pre("getResult", move |_, invocation| {
        if settings.is_set(DISABLE_RESULT_TOAST) {
            return Ok(());
        }
        debug!(target: "battlelog::result", "overriding spectator result screen");
        invocation.cancel();
        notices.borrow_mut().push(Notice::game_finished());
        Ok(())
    });
}
