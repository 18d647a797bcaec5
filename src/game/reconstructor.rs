//! Wires the match mirror to the dispatch bus
//!
//! The [`Reconstructor`] subscribes one handler per server action. Handlers
//! share a single session behind `Rc<RefCell<_>>`; the bus runs them one at
//! a time on the caller's thread and none of them emits, so the session is
//! never borrowed twice.

use crate::core::message::TimerTick;
use crate::core::ServerMessage;
use crate::dispatch::EventBus;
use crate::game::context::{Banner, CardPlayKind, MatchContext, MatchDefaults, MatchEnd, MatchPhase};
use crate::game::describe::{CardDescriber, ServerDescription};
use crate::game::ignored::ignored_topics;
use crate::game::BattleLog;
use crate::{BattleLogError, Result};
use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;
use tracing::{debug, trace};

struct Session {
    context: Option<MatchContext>,
    log: BattleLog,
    describer: Box<dyn CardDescriber>,
    defaults: MatchDefaults,
    /// Remaining time of the current turn, last reported by the host
    clock: Option<i64>,
}

/// What a match handler gets besides the context
struct Scope<'a> {
    log: &'a mut BattleLog,
    describer: &'a dyn CardDescriber,
    clock: &'a mut Option<i64>,
}

impl Session {
    fn is_finished(&self) -> bool {
        self.context.as_ref().is_some_and(MatchContext::is_finished)
    }

    fn scope(&mut self, action: &str) -> Result<(&mut MatchContext, Scope<'_>)> {
        let Session {
            context,
            log,
            describer,
            clock,
            ..
        } = self;
        let ctx = context
            .as_mut()
            .ok_or_else(|| BattleLogError::MatchNotStarted(action.to_string()))?;
        Ok((
            ctx,
            Scope {
                log,
                describer: &**describer,
                clock,
            },
        ))
    }

    /// Install a freshly built context and write the opening lines
    fn begin(&mut self, action: &str, ctx: MatchContext) -> Result<()> {
        let opening = ctx.opening(action)?;
        self.log.reset();
        for entry in opening {
            self.log.push(entry)?;
        }
        self.context = Some(ctx);
        self.clock = None;
        Ok(())
    }
}

/// Reconstructs match state and the battle narrative from bus events
#[derive(Clone)]
pub struct Reconstructor {
    session: Rc<RefCell<Session>>,
}

impl Reconstructor {
    pub fn new(log: BattleLog) -> Self {
        Reconstructor {
            session: Rc::new(RefCell::new(Session {
                context: None,
                log,
                describer: Box::new(ServerDescription),
                defaults: MatchDefaults::default(),
                clock: None,
            })),
        }
    }

    /// Use a card-data collaborator for descriptions (builder pattern)
    #[must_use]
    pub fn with_describer(self, describer: impl CardDescriber + 'static) -> Self {
        self.session.borrow_mut().describer = Box::new(describer);
        self
    }

    #[must_use]
    pub fn with_defaults(self, defaults: MatchDefaults) -> Self {
        self.session.borrow_mut().defaults = defaults;
        self
    }

    /// Subscribe every handler to `bus`
    pub fn attach(&self, bus: &mut EventBus<ServerMessage>) {
        self.on(bus, "getGameStarted", |session, msg, action| {
            let ctx = MatchContext::from_started(action, msg.decode()?, session.defaults)?;
            session.begin(action, ctx)
        });
        self.on(bus, "getReconnection getAllGameInfos", |session, msg, action| {
            let ctx = MatchContext::from_snapshot(
                action,
                msg.decode()?,
                session.defaults,
                &*session.describer,
            )?;
            session.begin(action, ctx)
        });

        // A reported time belongs to the turn it was reported in
        self.on_match(bus, "getTurnStart", |ctx, scope, msg, action| {
            *scope.clock = None;
            ctx.turn_start(action, msg.decode()?, scope.log)
        });
        self.on_match(bus, "getTurnEnd", |ctx, scope, msg, action| {
            let msg = msg.decode()?;
            ctx.turn_end(action, msg, scope.clock.take(), scope.log)
        });
        self.on(bus, "refreshTimer", |session, msg, _| {
            let tick: TimerTick = msg.decode()?;
            if tick.time.is_some() {
                session.clock = tick.time;
            }
            Ok(())
        });
        self.on_match(bus, "getUpdatePlayerHp", |ctx, scope, msg, action| {
            ctx.update_hp(action, msg.decode()?, scope.log)
        });
        self.on_match(bus, "getDoingEffect", |ctx, scope, msg, action| {
            ctx.monster_effect(action, msg.decode()?, scope.log)
        });
        self.on_match(bus, "getArtifactDoingEffect", |ctx, scope, msg, action| {
            ctx.artifact_effect(action, msg.decode()?, scope.log)
        });
        self.on_match(bus, "getSoulDoingEffect", |ctx, scope, msg, action| {
            ctx.soul_effect(action, msg.decode()?, scope.log)
        });
        self.on_match(bus, "getUpdateBoard", |ctx, scope, msg, action| {
            ctx.replace_board(action, msg.decode()?, scope.describer)
        });
        self.on_match(bus, "getCardBoard getSpellPlayed getShowCard", |ctx, scope, msg, action| {
            let kind = match action {
                "getSpellPlayed" => CardPlayKind::Spell,
                "getShowCard" => CardPlayKind::Show,
                _ => CardPlayKind::Board,
            };
            ctx.card_played(action, kind, msg.decode()?, scope.describer, scope.log)
        });
        self.on_match(bus, "getCardDestroyedHandFull", |ctx, scope, msg, action| {
            ctx.card_discarded(action, msg.decode()?, scope.describer, scope.log)
        });
        self.on_match(bus, "getMonsterDestroyed", |ctx, scope, msg, action| {
            ctx.monster_destroyed(action, msg.decode()?, scope.log)
        });
        self.on_match(bus, "getFight", |ctx, scope, msg, action| {
            ctx.fight(action, msg.decode()?, scope.log)
        });
        self.on_match(bus, "getFightPlayer", |ctx, scope, msg, action| {
            ctx.fight_player(action, msg.decode()?, scope.log)
        });
        self.on_match(bus, "getPlayersStats", |ctx, _, msg, action| {
            ctx.refresh_stats(action, msg.decode()?)
        });
        self.on_match(bus, "getVictory getVictoryDeco getDefeat", |ctx, scope, _, action| {
            let end = match action {
                "getVictoryDeco" => MatchEnd::VictoryByDisconnect,
                "getDefeat" => MatchEnd::Defeat,
                _ => MatchEnd::Victory,
            };
            ctx.finish(action, end, scope.log)
        });
        self.on_match(bus, "getResult", |ctx, scope, msg, _| {
            ctx.finish_spectated(msg.decode()?, scope.log)
        });

        bus.subscribe(&ignored_topics(), |msg, invocation| {
            debug!(target: "battlelog::ignored", action = invocation.topic(), "ignored action");
            trace!(target: "battlelog::raw", action = invocation.topic(), payload = ?msg.fields);
            Ok(())
        });
    }

    /// Subscribe a handler that sees the whole session
    fn on<F>(&self, bus: &mut EventBus<ServerMessage>, topics: &str, mut apply: F)
    where
        F: FnMut(&mut Session, &ServerMessage, &str) -> Result<()> + 'static,
    {
        let session = Rc::clone(&self.session);
        bus.subscribe(topics, move |msg, invocation| {
            let action = invocation.topic();
            let mut session = session.borrow_mut();
            if session.is_finished() {
                debug!(target: "battlelog::extra", action, "extra action after match end");
                return Ok(());
            }
            trace!(target: "battlelog::raw", action, payload = ?msg.fields);
            apply(&mut session, msg, action)
        });
    }

    /// Subscribe a handler that needs a started match
    fn on_match<F>(&self, bus: &mut EventBus<ServerMessage>, topics: &str, mut apply: F)
    where
        F: FnMut(&mut MatchContext, &mut Scope<'_>, &ServerMessage, &str) -> Result<()> + 'static,
    {
        self.on(bus, topics, move |session, msg, action| {
            let (ctx, mut scope) = session.scope(action)?;
            apply(ctx, &mut scope, msg, action)
        });
    }

    /// Drop the current match and its narrative
    pub fn reset(&self) {
        let mut session = self.session.borrow_mut();
        session.context = None;
        session.clock = None;
        session.log.reset();
    }

    pub fn phase(&self) -> MatchPhase {
        self.session
            .borrow()
            .context
            .as_ref()
            .map_or(MatchPhase::NotStarted, MatchContext::phase)
    }

    pub fn is_finished(&self) -> bool {
        self.session.borrow().is_finished()
    }

    /// Record the remaining turn time reported by the host
    pub fn set_turn_clock(&self, remaining: Option<i64>) {
        self.session.borrow_mut().clock = remaining;
    }

    /// The current match mirror, if a match has started
    pub fn context(&self) -> Option<Ref<'_, MatchContext>> {
        Ref::filter_map(self.session.borrow(), |session| session.context.as_ref()).ok()
    }

    pub fn log(&self) -> Ref<'_, BattleLog> {
        Ref::map(self.session.borrow(), |session| &session.log)
    }

    pub fn log_mut(&self) -> RefMut<'_, BattleLog> {
        RefMut::map(self.session.borrow_mut(), |session| &mut session.log)
    }

    /// Plain-text narrative lines
    pub fn lines(&self) -> Vec<String> {
        self.log().lines()
    }

    /// Header data for the two participants
    pub fn banner(&self) -> Option<Banner> {
        self.context().and_then(|ctx| ctx.banner().ok())
    }
}

impl Default for Reconstructor {
    fn default() -> Self {
        Self::new(BattleLog::new())
    }
}

impl std::fmt::Debug for Reconstructor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let session = self.session.borrow();
        f.debug_struct("Reconstructor")
            .field("phase", &self.phase())
            .field("log", &session.log)
            .finish()
    }
}
