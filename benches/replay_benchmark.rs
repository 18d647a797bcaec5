//! Replay throughput benchmarks
//!
//! Measures how fast captured matches are pushed through the feed:
//!
//! 1. **Parse** - decode raw frames into messages only
//! 2. **Replay** - decode and deliver every frame to a fresh feed
//! 3. **Long match** - a synthetic capture with many turns and effects

use battlelog::{core::ServerMessage, MatchFeed, Settings};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde_json::json;

const CAPTURES: &[(&str, &str)] = &[
    ("ranked_victory", include_str!("../test_matches/ranked_victory.jsonl")),
    ("reconnect_disconnect", include_str!("../test_matches/reconnect_disconnect.jsonl")),
    ("spectated_surrender", include_str!("../test_matches/spectated_surrender.jsonl")),
];

fn frames(capture: &str) -> Vec<&str> {
    capture.lines().filter(|line| !line.trim().is_empty()).collect()
}

/// Start, then `turns` turns of play, attack, effect and damage
fn long_match(turns: u32) -> Vec<ServerMessage> {
    let mut messages = vec![ServerMessage::new("getGameStarted")
        .with("yourId", 1)
        .with("yourUsername", "Frisk")
        .with("enemyId", 2)
        .with("enemyUsername", "Chara")];
    let mut hp = [0i64, 30, 30];

    for turn in 1..=turns {
        let player = i64::from(turn % 2) + 1;
        let enemy = 3 - player;
        let card_id = i64::from(turn) + 100;
        messages.push(
            ServerMessage::new("getTurnStart")
                .with("numTurn", turn)
                .with("idPlayer", player),
        );
        messages.push(ServerMessage::new("refreshTimer"));
        messages.push(
            ServerMessage::new("getCardBoard")
                .with("idPlayer", player)
                .with_embedded(
                    "card",
                    &json!({"id": card_id, "name": "Froggit", "attack": 1, "hp": 3, "maxHp": 3}),
                ),
        );
        messages.push(ServerMessage::new("getDoingEffect").with("monsterId", card_id));
        messages.push(
            ServerMessage::new("getFightPlayer")
                .with("attackMonster", card_id)
                .with("defendPlayer", enemy),
        );
        hp[enemy as usize] = (hp[enemy as usize] + 1) % 40;
        messages.push(
            ServerMessage::new("getUpdatePlayerHp")
                .with("playerId", enemy)
                .with("hp", hp[enemy as usize])
                .with("isDamage", true),
        );
        messages.push(
            ServerMessage::new("getPlayersStats")
                .with_embedded("golds", &json!({"1": turn, "2": turn}))
                .with_embedded("lives", &json!({"1": 1, "2": 1})),
        );
        messages.push(ServerMessage::new("getMonsterDestroyed").with("monsterId", card_id));
        messages.push(ServerMessage::new("getTurnEnd").with("idPlayer", player));
    }
    messages.push(ServerMessage::new("getVictory"));
    messages
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    for &(name, capture) in CAPTURES {
        let frames = frames(capture);
        group.throughput(Throughput::Elements(frames.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(name), &frames, |b, frames| {
            b.iter(|| {
                for frame in frames {
                    black_box(ServerMessage::parse(frame).unwrap());
                }
            });
        });
    }
    group.finish();
}

fn bench_replay(c: &mut Criterion) {
    let mut group = c.benchmark_group("replay");
    for &(name, capture) in CAPTURES {
        let frames = frames(capture);
        group.throughput(Throughput::Elements(frames.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(name), &frames, |b, frames| {
            b.iter(|| {
                let mut feed = MatchFeed::new(Settings::new());
                for frame in frames {
                    feed.deliver_raw(frame).unwrap();
                }
                let entries = feed.reconstructor().log().len();
                black_box(entries)
            });
        });
    }
    group.finish();
}

fn bench_long_match(c: &mut Criterion) {
    let mut group = c.benchmark_group("long_match");
    for turns in [10u32, 100, 1000] {
        let messages = long_match(turns);
        group.throughput(Throughput::Elements(messages.len() as u64));
        group.bench_with_input(BenchmarkId::new("turns", turns), &messages, |b, messages| {
            b.iter(|| {
                let mut feed = MatchFeed::new(Settings::new());
                for msg in messages {
                    feed.deliver(msg).unwrap();
                }
                let entries = feed.reconstructor().log().len();
                black_box(entries)
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_parse, bench_replay, bench_long_match);
criterion_main!(benches);
