//! Table-driven checks of the reconstructor's guarantees
//!
//! Each table row is a small message sequence and the narrative it must
//! produce; every row runs against a fresh match.

use battlelog::{
    core::{CardId, PlayerId, ServerMessage},
    MatchFeed, Result, Settings,
};
use serde_json::json;

const A: i64 = 1;
const B: i64 = 2;

fn new_match() -> Result<MatchFeed> {
    let mut feed = MatchFeed::new(Settings::new());
    feed.deliver(
        &ServerMessage::new("getGameStarted")
            .with("yourId", A)
            .with("yourUsername", "A")
            .with("enemyId", B)
            .with("enemyUsername", "B"),
    )?;
    Ok(feed)
}

/// Lines written after the versus line
fn narrative(feed: &MatchFeed) -> Vec<String> {
    feed.reconstructor().lines().into_iter().skip(1).collect()
}

fn turn_start(num_turn: u32, player: i64) -> ServerMessage {
    ServerMessage::new("getTurnStart")
        .with("numTurn", num_turn)
        .with("idPlayer", player)
}

fn turn_end(player: i64) -> ServerMessage {
    ServerMessage::new("getTurnEnd").with("idPlayer", player)
}

fn hp(player: i64, hp: i64, is_damage: bool) -> ServerMessage {
    ServerMessage::new("getUpdatePlayerHp")
        .with("playerId", player)
        .with("hp", hp)
        .with("isDamage", is_damage)
}

#[test]
fn test_turn_line_once_per_number() -> Result<()> {
    let cases: &[&[u32]] = &[&[1], &[1, 1], &[1, 1, 2, 2, 3], &[1, 2, 3, 4], &[5, 5, 5, 5]];

    for turns in cases {
        let mut feed = new_match()?;
        for (i, &n) in turns.iter().enumerate() {
            let holder = if i % 2 == 0 { A } else { B };
            feed.deliver(&turn_start(n, holder))?;
        }

        let turn_lines: Vec<String> = narrative(&feed)
            .into_iter()
            .filter(|line| line.starts_with("Turn "))
            .collect();
        let mut distinct: Vec<u32> = turns.to_vec();
        distinct.dedup();
        let expected: Vec<String> = distinct.iter().map(|n| format!("Turn {n}")).collect();
        assert_eq!(turn_lines, expected, "turns {turns:?}");

        let holder_lines = narrative(&feed)
            .into_iter()
            .filter(|line| line.ends_with("'s turn"))
            .count();
        assert_eq!(holder_lines, turns.len(), "turns {turns:?}");
    }
    Ok(())
}

#[test]
fn test_hp_delta_lines() -> Result<()> {
    // (new hp, is damage, expected line)
    let cases: &[(i64, bool, Option<&str>)] = &[
        (30, true, None),
        (30, false, None),
        (25, true, Some("B lost 5 hp")),
        (1, true, Some("B lost 29 hp")),
        (34, false, Some("B gained 4 hp")),
        (45, false, Some("B gained 15 hp")),
        // the flag disagrees with the actual change
        (35, true, Some("B gained 5 hp")),
        (20, false, Some("B lost 10 hp")),
    ];

    for &(value, is_damage, expected) in cases {
        let mut feed = new_match()?;
        feed.deliver(&hp(B, value, is_damage))?;

        let lines = narrative(&feed);
        assert_eq!(lines, expected.into_iter().collect::<Vec<_>>(), "hp {value}");

        let ctx = feed.reconstructor().context().unwrap();
        assert_eq!(ctx.players.get(PlayerId::new(B), "test")?.hp, value);
    }
    Ok(())
}

#[test]
fn test_effect_suppression() -> Result<()> {
    let monster = |id: i64| ServerMessage::new("getDoingEffect").with("monsterId", id);
    let artifact = |id: i64| ServerMessage::new("getArtifactDoingEffect").with("playerId", id);
    let soul = |id: i64| ServerMessage::new("getSoulDoingEffect").with("playerId", id);

    let cases: Vec<(Vec<ServerMessage>, usize)> = vec![
        (vec![monster(10), monster(10)], 1),
        (vec![monster(10), monster(11)], 2),
        (vec![monster(10), monster(11), monster(10)], 3),
        (vec![artifact(A), artifact(A), artifact(B)], 2),
        (vec![artifact(A), soul(A)], 2),
        (vec![soul(B), soul(B), soul(B)], 1),
        // monster 1 and player 1 are different sources
        (vec![monster(1), artifact(1)], 2),
        (vec![monster(10), turn_start(1, A), monster(10)], 2),
    ];

    for (messages, expected) in cases {
        let mut feed = new_match()?;
        for id in [1, 10, 11] {
            feed.deliver(
                &ServerMessage::new("getCardBoard")
                    .with("idPlayer", A)
                    .with_embedded("card", &json!({"id": id, "name": format!("Card{id}")})),
            )?;
        }
        let before = feed.reconstructor().log().len();

        for msg in &messages {
            feed.deliver(msg)?;
        }

        let activations = feed.reconstructor().lines()[before..]
            .iter()
            .filter(|line| line.ends_with(" activated"))
            .count();
        let tags: Vec<&str> = messages.iter().map(|m| m.action.as_str()).collect();
        assert_eq!(activations, expected, "sequence {tags:?}");
    }
    Ok(())
}

#[test]
fn test_life_lost_once_per_turn_cycle() -> Result<()> {
    let mut feed = new_match()?;
    feed.deliver(
        &ServerMessage::new("getPlayersStats")
            .with_embedded("golds", &json!({"1": 2, "2": 2}))
            .with_embedded("lives", &json!({"1": 1, "2": 2})),
    )?;
    feed.deliver(&turn_start(1, A))?;

    feed.deliver(&hp(B, 0, true))?;
    feed.deliver(&hp(B, 30, false))?;
    feed.deliver(&hp(B, 0, true))?;
    let losses = |feed: &MatchFeed| {
        narrative(feed)
            .iter()
            .filter(|line| line.as_str() == "B lost a life")
            .count()
    };
    assert_eq!(losses(&feed), 1);

    // turn end clears the flag for both holders
    feed.deliver(&turn_end(A))?;
    feed.deliver(&hp(B, 30, false))?;
    feed.deliver(&hp(B, 0, true))?;
    assert_eq!(losses(&feed), 2);

    // a player on their last life never logs one
    feed.deliver(&hp(A, 0, true))?;
    assert!(!narrative(&feed).contains(&"A lost a life".to_string()));
    Ok(())
}

#[test]
fn test_terminal_messages_freeze_state() -> Result<()> {
    let terminals = [
        ServerMessage::new("getVictory"),
        ServerMessage::new("getVictoryDeco"),
        ServerMessage::new("getDefeat"),
        ServerMessage::new("getResult")
            .with("winner", "A")
            .with("looser", "B")
            .with("cause", "Disconnection"),
    ];
    let followers = [
        turn_start(7, B),
        turn_end(A),
        hp(A, 3, true),
        ServerMessage::new("getCardBoard")
            .with("idPlayer", B)
            .with_embedded("card", &json!({"id": 77, "name": "Temmie"})),
        ServerMessage::new("getUpdateBoard").with_embedded("board", &json!([])),
        ServerMessage::new("getPlayersStats")
            .with_embedded("golds", &json!({"1": 9}))
            .with_embedded("lives", &json!({})),
        ServerMessage::new("getVictory"),
        ServerMessage::new("getDefeat"),
    ];

    for terminal in &terminals {
        let mut feed = new_match()?;
        feed.deliver(&turn_start(1, A))?;
        feed.deliver(
            &ServerMessage::new("getCardBoard")
                .with("idPlayer", A)
                .with_embedded("card", &json!({"id": 5, "name": "Froggit"})),
        )?;
        feed.deliver(terminal)?;
        assert!(feed.reconstructor().is_finished(), "{}", terminal.action);
        let lines = feed.reconstructor().lines();

        for msg in &followers {
            let delivery = feed.deliver(msg)?;
            assert!(delivery.extra, "{} after {}", msg.action, terminal.action);
        }

        let reconstructor = feed.reconstructor();
        assert_eq!(reconstructor.lines(), lines, "{}", terminal.action);
        let ctx = reconstructor.context().unwrap();
        assert_eq!(ctx.turn, 1);
        assert_eq!(ctx.current_turn, Some(PlayerId::new(A)));
        assert!(ctx.board.contains(CardId::new(5)));
        assert!(!ctx.board.contains(CardId::new(77)));
        let a = ctx.players.get(PlayerId::new(A), "test")?;
        assert_eq!((a.hp, a.gold), (30, 2));
    }
    Ok(())
}
