//! Per-match mirror of server state
//!
//! A [`MatchContext`] is built from a start or reconnect message and
//! discarded when the next match starts. Every handler decodes and
//! validates first and mutates second, so a failed message leaves the
//! mirror as it was.

use crate::core::message::{
    BoardUpdate, CardDiscard, CardPlay, Fight, FightPlayer, GameSnapshot, GameStarted,
    MonsterDestroyed, MonsterEffect, PlayerEffect, PlayerHp, PlayerSnapshot, PlayersStats,
    Profiles, SpectatorResult, TurnEnd, TurnStart,
};
use crate::core::{parse_embedded, CardId, EntityStore, Monster, Player, PlayerId};
use crate::error::RefKind;
use crate::game::describe::{prepare_card, CardDescriber};
use crate::game::{BattleLog, LogEntry, PlayerDescriptor};
use crate::{BattleLogError, Result};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Stats a player starts with when the server does not send them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchDefaults {
    pub starting_hp: i64,
    pub starting_gold: i64,
    pub starting_lives: u32,
}

impl Default for MatchDefaults {
    fn default() -> Self {
        MatchDefaults {
            starting_hp: 30,
            starting_gold: 2,
            starting_lives: 1,
        }
    }
}

/// Lifecycle of the match being observed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPhase {
    NotStarted,
    InProgress,
    Finished,
}

/// Source of the most recent logged activation
///
/// Each source kind is its own namespace: monster 3 and player 3 never
/// collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectToken {
    Monster(CardId),
    Artifact(PlayerId),
    Soul(PlayerId),
}

/// How a card reached the log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardPlayKind {
    /// `getCardBoard`: placed on the board
    Board,
    /// `getSpellPlayed`
    Spell,
    /// `getShowCard`: revealed, never enters the board
    Show,
}

impl CardPlayKind {
    fn verb(self) -> &'static str {
        match self {
            CardPlayKind::Board => " played ",
            CardPlayKind::Spell => " used ",
            CardPlayKind::Show => " exposed ",
        }
    }

    fn enters_board(self) -> bool {
        !matches!(self, CardPlayKind::Show)
    }
}

/// Terminal messages sent to the two participants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchEnd {
    /// `getVictory`
    Victory,
    /// `getVictoryDeco`: the opponent disconnected
    VictoryByDisconnect,
    /// `getDefeat`
    Defeat,
}

/// Header data for the renderer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Banner {
    pub game_type: Option<String>,
    pub you: PlayerDescriptor,
    pub enemy: PlayerDescriptor,
}

/// Mirror of one match
#[derive(Debug, Clone)]
pub struct MatchContext {
    pub game_type: Option<String>,
    /// The perspective player ("you" in start messages)
    pub you: PlayerId,
    pub enemy: PlayerId,
    pub players: EntityStore<Player>,
    pub board: EntityStore<Monster>,
    opponents: FxHashMap<PlayerId, PlayerId>,
    pub turn: u32,
    pub current_turn: Option<PlayerId>,
    finished: bool,
    last_effect: Option<EffectToken>,
}

impl MatchContext {
    /// Two players, an empty board, turn 0
    pub fn new(you: Player, enemy: Player) -> Self {
        let mut opponents = FxHashMap::default();
        opponents.insert(you.id, enemy.id);
        opponents.insert(enemy.id, you.id);

        let mut ctx = MatchContext {
            game_type: None,
            you: you.id,
            enemy: enemy.id,
            players: EntityStore::new(),
            board: EntityStore::new(),
            opponents,
            turn: 0,
            current_turn: None,
            finished: false,
            last_effect: None,
        };
        ctx.players.insert(you);
        ctx.players.insert(enemy);
        ctx
    }

    /// Build from `getGameStarted`; stats are seeded from `defaults`
    pub fn from_started(action: &str, msg: GameStarted, defaults: MatchDefaults) -> Result<Self> {
        let seed = |id, name: String| {
            let mut player = Player::new(id, name, defaults.starting_hp, defaults.starting_gold);
            player.lives = defaults.starting_lives;
            player
        };
        let you = seed(msg.your_id, msg.your_username);
        let enemy = seed(msg.enemy_id, msg.enemy_username);

        let mut ctx = MatchContext::new(you, enemy);
        ctx.apply_profiles(action, &msg.profiles)?;
        Ok(ctx)
    }

    /// Build from `getReconnection` / `getAllGameInfos` snapshots
    pub fn from_snapshot(
        action: &str,
        msg: GameSnapshot,
        defaults: MatchDefaults,
        describer: &dyn CardDescriber,
    ) -> Result<Self> {
        let you: PlayerSnapshot = parse_embedded(action, "you", &msg.you)?;
        let enemy: PlayerSnapshot = parse_embedded(action, "enemy", &msg.enemy)?;
        let golds: FxHashMap<PlayerId, i64> = parse_embedded(action, "golds", &msg.golds)?;
        let lives: FxHashMap<PlayerId, u32> = parse_embedded(action, "lives", &msg.lives)?;
        let board = match &msg.board {
            Some(raw) => parse_board(action, raw, describer)?,
            None => EntityStore::new(),
        };

        let restore = |snapshot: PlayerSnapshot| {
            let id = snapshot.id;
            let mut player = Player::new(
                id,
                snapshot.username,
                snapshot.hp.unwrap_or(defaults.starting_hp),
                golds.get(&id).copied().unwrap_or(defaults.starting_gold),
            );
            player.lives = lives.get(&id).copied().unwrap_or(defaults.starting_lives);
            player
        };

        let mut ctx = MatchContext::new(restore(you), restore(enemy));
        ctx.board = board;
        ctx.apply_profiles(action, &msg.profiles)?;
        Ok(ctx)
    }

    fn apply_profiles(&mut self, action: &str, profiles: &Profiles) -> Result<()> {
        // A zero turn holder means nobody holds the turn yet
        let holder = profiles.user_turn.filter(|id| id.as_i64() != 0);
        if let Some(id) = holder {
            self.players.get(id, action)?;
        }

        let you = self.players.get_mut(self.you, action)?;
        you.class = profiles.your_class.clone();
        you.level = profiles.your_level;
        you.rank = profiles.your_rank;

        let enemy = self.players.get_mut(self.enemy, action)?;
        enemy.class = profiles.enemy_class.clone();
        enemy.level = profiles.enemy_level;
        enemy.rank = profiles.enemy_rank;

        self.game_type = profiles.game_type.clone();
        self.turn = profiles.turn.unwrap_or(0);
        self.current_turn = holder;
        Ok(())
    }

    pub fn phase(&self) -> MatchPhase {
        if self.finished {
            MatchPhase::Finished
        } else {
            MatchPhase::InProgress
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn last_effect(&self) -> Option<EffectToken> {
        self.last_effect
    }

    /// The opposing player of `id`
    pub fn opponent_of(&self, id: PlayerId, action: &str) -> Result<PlayerId> {
        self.opponents
            .get(&id)
            .copied()
            .ok_or_else(|| BattleLogError::InvalidReference {
                action: action.to_string(),
                kind: RefKind::Player,
                id: id.as_i64(),
            })
    }

    pub fn banner(&self) -> Result<Banner> {
        Ok(Banner {
            game_type: self.game_type.clone(),
            you: self.players.get(self.you, "banner")?.into(),
            enemy: self.players.get(self.enemy, "banner")?.into(),
        })
    }

    /// Versus line, then the turn number and holder when already known
    pub fn opening(&self, action: &str) -> Result<Vec<LogEntry>> {
        let you = self.players.get(self.you, action)?;
        let enemy = self.players.get(self.enemy, action)?;

        let mut versus = LogEntry::new();
        if let Some(game_type) = &self.game_type {
            versus = versus.push_text(format!("[{game_type}] "));
        }
        let mut entries = vec![versus.push_player(you).push_text(" vs ").push_player(enemy)];

        if self.turn > 0 {
            entries.push(LogEntry::text(format!("Turn {}", self.turn)));
        }
        if let Some(holder) = self.current_turn {
            let holder = self.players.get(holder, action)?;
            entries.push(LogEntry::new().push_player(holder).push_text("'s turn"));
        }
        Ok(entries)
    }

    pub fn turn_start(&mut self, action: &str, msg: TurnStart, log: &mut BattleLog) -> Result<()> {
        self.players.get(msg.id_player, action)?;

        self.last_effect = None;
        // Same number and holder again is a duplicate notice, not a new turn
        if msg.num_turn == self.turn && self.current_turn == Some(msg.id_player) {
            return Ok(());
        }
        if msg.num_turn != self.turn {
            log.push(LogEntry::text(format!("Turn {}", msg.num_turn)))?;
        }
        self.turn = msg.num_turn;
        self.current_turn = Some(msg.id_player);

        let holder = self.players.get(msg.id_player, action)?;
        log.push(LogEntry::new().push_player(holder).push_text("'s turn"))
    }

    /// Hand the turn to the opponent of whoever just ended it
    ///
    /// `clock` is the remaining turn time last reported by the host; a
    /// value at or below zero means the outgoing holder timed out.
    pub fn turn_end(
        &mut self,
        action: &str,
        msg: TurnEnd,
        clock: Option<i64>,
        log: &mut BattleLog,
    ) -> Result<()> {
        let outgoing = self.current_turn.unwrap_or(msg.id_player);
        let incoming = self.opponent_of(msg.id_player, action)?;
        self.players.get(outgoing, action)?;
        self.players.get(incoming, action)?;

        if clock.is_some_and(|remaining| remaining <= 0) {
            let holder = self.players.get(outgoing, action)?;
            log.push(LogEntry::new().push_player(holder).push_text(" timed out"))?;
        }

        self.players.get_mut(outgoing, action)?.reset_turn_flags();
        self.current_turn = Some(incoming);
        self.players.get_mut(incoming, action)?.reset_turn_flags();
        self.last_effect = None;
        Ok(())
    }

    pub fn update_hp(&mut self, action: &str, msg: PlayerHp, log: &mut BattleLog) -> Result<()> {
        let player = self.players.get_mut(msg.player_id, action)?;
        let previous = player.set_hp(msg.hp);

        if previous != msg.hp {
            // Delta in the direction the flag claims; negative when the
            // flag disagrees with the actual change
            let delta = if msg.is_damage { previous - msg.hp } else { msg.hp - previous };
            let lost = msg.is_damage == (delta > 0);
            let verb = if lost { "lost" } else { "gained" };
            let amount = delta.abs();
            log.push(
                LogEntry::new()
                    .push_player(player)
                    .push_text(format!(" {verb} {amount} hp")),
            )?;
        }

        if player.loses_life_at(msg.hp) {
            player.lost_life = true;
            log.push(LogEntry::new().push_player(player).push_text(" lost a life"))?;
        }
        Ok(())
    }

    /// Record `token` as the latest activation; false for a direct repeat
    fn claim_effect(&mut self, token: EffectToken) -> bool {
        if self.last_effect == Some(token) {
            return false;
        }
        self.last_effect = Some(token);
        true
    }

    pub fn monster_effect(&mut self, action: &str, msg: MonsterEffect, log: &mut BattleLog) -> Result<()> {
        let token = EffectToken::Monster(msg.monster_id);
        if self.last_effect == Some(token) {
            return Ok(());
        }
        let card = self.board.get(msg.monster_id, action)?;
        let entry = LogEntry::new().push_card(card).push_text("'s effect activated");
        self.claim_effect(token);
        log.push(entry)
    }

    pub fn artifact_effect(&mut self, action: &str, msg: PlayerEffect, log: &mut BattleLog) -> Result<()> {
        self.player_effect(action, EffectToken::Artifact(msg.player_id), msg.player_id, "'s artifact activated", log)
    }

    pub fn soul_effect(&mut self, action: &str, msg: PlayerEffect, log: &mut BattleLog) -> Result<()> {
        self.player_effect(action, EffectToken::Soul(msg.player_id), msg.player_id, "'s soul activated", log)
    }

    fn player_effect(
        &mut self,
        action: &str,
        token: EffectToken,
        id: PlayerId,
        text: &str,
        log: &mut BattleLog,
    ) -> Result<()> {
        if self.last_effect == Some(token) {
            return Ok(());
        }
        let player = self.players.get(id, action)?;
        let entry = LogEntry::new().push_player(player).push_text(text);
        self.claim_effect(token);
        log.push(entry)
    }

    /// Replace the whole board from a full snapshot
    pub fn replace_board(&mut self, action: &str, msg: BoardUpdate, describer: &dyn CardDescriber) -> Result<()> {
        self.board = parse_board(action, &msg.board, describer)?;
        Ok(())
    }

    pub fn card_played(
        &mut self,
        action: &str,
        kind: CardPlayKind,
        msg: CardPlay,
        describer: &dyn CardDescriber,
        log: &mut BattleLog,
    ) -> Result<()> {
        let card = parse_card(action, &msg.card, describer)?;
        let player = self.players.get(msg.id_player, action)?;
        let entry = LogEntry::new()
            .push_player(player)
            .push_text(kind.verb())
            .push_card(&card);

        if kind.enters_board() {
            self.board.insert(card);
        }
        log.push(entry)
    }

    /// A card burned from a full hand
    ///
    /// The message's own player field is unreliable, so the discard is
    /// attributed to the current turn holder.
    pub fn card_discarded(
        &mut self,
        action: &str,
        msg: CardDiscard,
        describer: &dyn CardDescriber,
        log: &mut BattleLog,
    ) -> Result<()> {
        let card = parse_card(action, &msg.card, describer)?;
        let holder = self
            .current_turn
            .ok_or_else(|| BattleLogError::NoTurnHolder(action.to_string()))?;
        let player = self.players.get(holder, action)?;
        log.push(
            LogEntry::new()
                .push_player(player)
                .push_text(" discarded ")
                .push_card(&card),
        )
    }

    pub fn monster_destroyed(&mut self, action: &str, msg: MonsterDestroyed, log: &mut BattleLog) -> Result<()> {
        let card = self.board.take(msg.monster_id, action)?;
        log.push(LogEntry::new().push_card(&card).push_text(" was killed"))
    }

    pub fn fight(&mut self, action: &str, msg: Fight, log: &mut BattleLog) -> Result<()> {
        let attacker = self.board.get(msg.attack_monster, action)?;
        let defender = self.board.get(msg.defend_monster, action)?;
        log.push(
            LogEntry::new()
                .push_card(attacker)
                .push_text(" attacked ")
                .push_card(defender),
        )
    }

    pub fn fight_player(&mut self, action: &str, msg: FightPlayer, log: &mut BattleLog) -> Result<()> {
        let attacker = self.board.get(msg.attack_monster, action)?;
        let defender = self.players.get(msg.defend_player, action)?;
        log.push(
            LogEntry::new()
                .push_card(attacker)
                .push_text(" attacked ")
                .push_player(defender),
        )
    }

    /// Merge the periodic stats refresh; never logged
    pub fn refresh_stats(&mut self, action: &str, msg: PlayersStats) -> Result<()> {
        let golds: FxHashMap<PlayerId, i64> = parse_embedded(action, "golds", &msg.golds)?;
        let lives: FxHashMap<PlayerId, u32> = parse_embedded(action, "lives", &msg.lives)?;
        let hands: FxHashMap<PlayerId, u32> = match &msg.hands_size {
            Some(raw) => parse_embedded(action, "handsSize", raw)?,
            None => FxHashMap::default(),
        };
        let decks: FxHashMap<PlayerId, u32> = match &msg.decks_size {
            Some(raw) => parse_embedded(action, "decksSize", raw)?,
            None => FxHashMap::default(),
        };

        for id in golds.keys().chain(lives.keys()).chain(hands.keys()).chain(decks.keys()) {
            self.players.get(*id, action)?;
        }

        for (id, gold) in golds {
            self.players.get_mut(id, action)?.gold = gold;
        }
        for (id, count) in lives {
            self.players.get_mut(id, action)?.lives = count;
        }
        for (id, size) in hands {
            self.players.get_mut(id, action)?.hand_size = Some(size);
        }
        for (id, size) in decks {
            self.players.get_mut(id, action)?.deck_size = Some(size);
        }
        Ok(())
    }

    /// Terminal transition for the two participants
    pub fn finish(&mut self, action: &str, end: MatchEnd, log: &mut BattleLog) -> Result<()> {
        if self.finished {
            return Ok(());
        }
        let you = self.players.get(self.you, action)?;
        let enemy = self.players.get(self.enemy, action)?;

        let mut outcome = Vec::with_capacity(2);
        if end == MatchEnd::VictoryByDisconnect {
            outcome.push(LogEntry::new().push_player(enemy).push_text(" left the game"));
        }
        let (winner, loser) = match end {
            MatchEnd::Defeat => (enemy, you),
            MatchEnd::Victory | MatchEnd::VictoryByDisconnect => (you, enemy),
        };
        outcome.push(
            LogEntry::new()
                .push_player(winner)
                .push_text(" beat ")
                .push_player(loser),
        );

        self.finished = true;
        log.finish(outcome)
    }

    /// Terminal transition seen by spectators
    pub fn finish_spectated(&mut self, msg: SpectatorResult, log: &mut BattleLog) -> Result<()> {
        if self.finished {
            return Ok(());
        }
        let mut outcome = Vec::with_capacity(2);
        match msg.cause.as_deref() {
            Some("Surrender") => outcome.push(LogEntry::text(format!("{} surrendered.", msg.looser))),
            Some("Disconnection") => outcome.push(LogEntry::text(format!("{} disconnected.", msg.looser))),
            _ => {}
        }
        outcome.push(LogEntry::text(format!("{} beat {}", msg.winner, msg.looser)));

        self.finished = true;
        log.finish(outcome)
    }
}

fn parse_card(action: &str, raw: &str, describer: &dyn CardDescriber) -> Result<Monster> {
    let mut card: Monster = parse_embedded(action, "card", raw)?;
    prepare_card(&mut card, describer);
    Ok(card)
}

/// Parse a board array; `null` slots are empty
fn parse_board(action: &str, raw: &str, describer: &dyn CardDescriber) -> Result<EntityStore<Monster>> {
    let slots: Vec<Option<Monster>> = parse_embedded(action, "board", raw)?;
    let mut board = EntityStore::new();
    for mut card in slots.into_iter().flatten() {
        prepare_card(&mut card, describer);
        board.insert(card);
    }
    Ok(board)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::describe::ServerDescription;
    use serde_json::json;

    const ALICE: PlayerId = PlayerId::new(1);
    const BOB: PlayerId = PlayerId::new(2);

    fn context() -> MatchContext {
        MatchContext::new(Player::new(ALICE, "Alice", 30, 2), Player::new(BOB, "Bob", 30, 2))
    }

    fn froggit(id: i64) -> Monster {
        let mut card = Monster::new(CardId::new(id), "Froggit");
        card.attack = 1;
        card.hp = 3;
        card.max_hp = 3;
        card
    }

    #[test]
    fn test_turn_start_logs_number_once() {
        let mut ctx = context();
        let mut log = BattleLog::new();

        ctx.turn_start("getTurnStart", TurnStart { num_turn: 1, id_player: ALICE }, &mut log).unwrap();
        ctx.turn_start("getTurnStart", TurnStart { num_turn: 1, id_player: BOB }, &mut log).unwrap();

        assert_eq!(log.lines(), vec!["Turn 1", "Alice's turn", "Bob's turn"]);
        assert_eq!(ctx.current_turn, Some(BOB));
    }

    #[test]
    fn test_turn_end_derives_next_holder() {
        let mut ctx = context();
        let mut log = BattleLog::new();
        ctx.current_turn = Some(ALICE);

        ctx.turn_end("getTurnEnd", TurnEnd { id_player: ALICE }, Some(12), &mut log).unwrap();
        assert_eq!(ctx.current_turn, Some(BOB));
        assert!(log.is_empty());

        ctx.turn_end("getTurnEnd", TurnEnd { id_player: BOB }, Some(0), &mut log).unwrap();
        assert_eq!(ctx.current_turn, Some(ALICE));
        assert_eq!(log.lines(), vec!["Bob timed out"]);
    }

    #[test]
    fn test_turn_end_unknown_player() {
        let mut ctx = context();
        let err = ctx
            .turn_end("getTurnEnd", TurnEnd { id_player: PlayerId::new(9) }, None, &mut BattleLog::new())
            .unwrap_err();
        assert!(err.is_invalid_reference());
    }

    #[test]
    fn test_effect_suppression_per_source() {
        let mut ctx = context();
        let mut log = BattleLog::new();
        ctx.board.insert(froggit(10));
        ctx.board.insert(froggit(11));

        let fire = |ctx: &mut MatchContext, log: &mut BattleLog, id| {
            ctx.monster_effect("getDoingEffect", MonsterEffect { monster_id: CardId::new(id) }, log)
                .unwrap()
        };
        fire(&mut ctx, &mut log, 10);
        fire(&mut ctx, &mut log, 10);
        fire(&mut ctx, &mut log, 11);
        fire(&mut ctx, &mut log, 10);

        assert_eq!(log.len(), 3);
        assert_eq!(ctx.last_effect(), Some(EffectToken::Monster(CardId::new(10))));
    }

    #[test]
    fn test_effect_kinds_do_not_collide() {
        let mut ctx = context();
        let mut log = BattleLog::new();

        ctx.artifact_effect("getArtifactDoingEffect", PlayerEffect { player_id: ALICE }, &mut log).unwrap();
        ctx.soul_effect("getSoulDoingEffect", PlayerEffect { player_id: ALICE }, &mut log).unwrap();
        ctx.soul_effect("getSoulDoingEffect", PlayerEffect { player_id: ALICE }, &mut log).unwrap();

        assert_eq!(log.lines(), vec!["Alice's artifact activated", "Alice's soul activated"]);
    }

    #[test]
    fn test_effect_from_unknown_monster() {
        let mut ctx = context();
        let err = ctx
            .monster_effect("getDoingEffect", MonsterEffect { monster_id: CardId::new(4) }, &mut BattleLog::new())
            .unwrap_err();
        assert!(err.is_invalid_reference());
        assert_eq!(ctx.last_effect(), None);
    }

    #[test]
    fn test_board_replace_skips_empty_slots() {
        let mut ctx = context();
        ctx.board.insert(froggit(1));

        let board = json!([null, {"id": 5, "name": "Whimsun", "hp": 1, "maxHp": 1}, null, {"id": 6, "name": "Vegetoid"}]);
        ctx.replace_board("getUpdateBoard", BoardUpdate { board: board.to_string() }, &ServerDescription)
            .unwrap();

        assert_eq!(ctx.board.len(), 2);
        assert!(!ctx.board.contains(CardId::new(1)));
        assert!(ctx.board.contains(CardId::new(6)));
    }

    #[test]
    fn test_malformed_board_keeps_previous_board() {
        let mut ctx = context();
        ctx.board.insert(froggit(1));

        let err = ctx
            .replace_board("getUpdateBoard", BoardUpdate { board: "[{".to_string() }, &ServerDescription)
            .unwrap_err();
        assert!(matches!(err, BattleLogError::EmbeddedJson { .. }));
        assert!(ctx.board.contains(CardId::new(1)));
    }

    #[test]
    fn test_shown_card_stays_off_board() {
        let mut ctx = context();
        let mut log = BattleLog::new();
        let card = json!({"id": 7, "name": "Dog Residue", "typeCard": 1}).to_string();

        ctx.card_played(
            "getShowCard",
            CardPlayKind::Show,
            CardPlay { card: card.clone(), id_player: BOB },
            &ServerDescription,
            &mut log,
        )
        .unwrap();
        assert!(!ctx.board.contains(CardId::new(7)));

        ctx.card_played(
            "getSpellPlayed",
            CardPlayKind::Spell,
            CardPlay { card, id_player: BOB },
            &ServerDescription,
            &mut log,
        )
        .unwrap();
        assert!(ctx.board.contains(CardId::new(7)));
        assert_eq!(log.lines(), vec!["Bob exposed Dog Residue", "Bob used Dog Residue"]);
    }

    #[test]
    fn test_discard_needs_turn_holder() {
        let mut ctx = context();
        let card = json!({"id": 8, "name": "Temmie"}).to_string();
        let err = ctx
            .card_discarded(
                "getCardDestroyedHandFull",
                CardDiscard { card },
                &ServerDescription,
                &mut BattleLog::new(),
            )
            .unwrap_err();
        assert!(matches!(err, BattleLogError::NoTurnHolder(_)));
    }

    #[test]
    fn test_stats_refresh_merges_silently() {
        let mut ctx = context();
        let msg = PlayersStats {
            golds: json!({"1": 5, "2": 9}).to_string(),
            lives: json!({"1": 2, "2": 1}).to_string(),
            hands_size: Some(json!({"1": 4, "2": 6}).to_string()),
            decks_size: None,
        };
        ctx.refresh_stats("getPlayersStats", msg).unwrap();

        let alice = ctx.players.get(ALICE, "test").unwrap();
        assert_eq!((alice.gold, alice.lives, alice.hand_size), (5, 2, Some(4)));
        assert_eq!(ctx.players.get(BOB, "test").unwrap().gold, 9);
    }

    #[test]
    fn test_stats_refresh_unknown_player_changes_nothing() {
        let mut ctx = context();
        let msg = PlayersStats {
            golds: json!({"1": 5, "3": 9}).to_string(),
            lives: json!({}).to_string(),
            hands_size: None,
            decks_size: None,
        };
        assert!(ctx.refresh_stats("getPlayersStats", msg).unwrap_err().is_invalid_reference());
        assert_eq!(ctx.players.get(ALICE, "test").unwrap().gold, 2);
    }

    #[test]
    fn test_finish_outcomes() {
        let mut ctx = context();
        let mut log = BattleLog::new();
        ctx.finish("getVictoryDeco", MatchEnd::VictoryByDisconnect, &mut log).unwrap();
        assert_eq!(log.lines(), vec!["Bob left the game", "Alice beat Bob"]);
        assert_eq!(ctx.phase(), MatchPhase::Finished);

        // idempotent
        ctx.finish("getDefeat", MatchEnd::Defeat, &mut log).unwrap();
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_finish_with_missing_participant() {
        let mut ctx = context();
        let mut log = BattleLog::new();
        ctx.players.take(BOB, "test").unwrap();

        let err = ctx.finish("getVictory", MatchEnd::Victory, &mut log).unwrap_err();
        assert!(err.is_invalid_reference());
        assert!(!ctx.is_finished());
        assert!(!log.is_closed());
        assert!(log.is_empty());
    }

    #[test]
    fn test_turn_start_repeat_is_silent() {
        let mut ctx = context();
        let mut log = BattleLog::new();
        ctx.board.insert(froggit(10));

        ctx.turn_start("getTurnStart", TurnStart { num_turn: 1, id_player: ALICE }, &mut log).unwrap();
        ctx.monster_effect("getDoingEffect", MonsterEffect { monster_id: CardId::new(10) }, &mut log).unwrap();
        ctx.turn_start("getTurnStart", TurnStart { num_turn: 1, id_player: ALICE }, &mut log).unwrap();

        assert_eq!(log.lines(), vec!["Turn 1", "Alice's turn", "Froggit's effect activated"]);
        assert_eq!(ctx.last_effect(), None);
    }

    #[test]
    fn test_spectated_surrender() {
        let mut ctx = context();
        let mut log = BattleLog::new();
        let msg = SpectatorResult {
            winner: "Alice".to_string(),
            looser: "Bob".to_string(),
            cause: Some("Surrender".to_string()),
        };
        ctx.finish_spectated(msg, &mut log).unwrap();
        assert_eq!(log.lines(), vec!["Bob surrendered.", "Alice beat Bob"]);
        assert!(ctx.is_finished());
    }
}
