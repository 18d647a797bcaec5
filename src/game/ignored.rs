//! Server actions that are known but carry nothing worth narrating
//!
//! They are still subscribed (to a no-op diagnostic handler) so that an
//! emission reports `ran` and the feed can tell them apart from tags
//! nothing understands.

pub const IGNORED_ACTIONS: &[&str] = &[
    "getConnectedFirst",
    // cards the player may play this turn
    "getPlayableCards",
    "getTurn",
    "getCardDrawed",
    "updateSpell",
    "updateMonster",
    // card "died" and respawns a second later
    "getFakeDeath",
    "getMonsterTemp",
    "getSpellTemp",
    "getTempCancel",
    "getShowMulligan",
    // sent twice
    "getHideMulligan",
    "getUpdateHand",
    "getError",
    "getGameError",
];

pub fn is_ignored(action: &str) -> bool {
    IGNORED_ACTIONS.contains(&action)
}

/// All ignored actions as one space-separated topic list
pub fn ignored_topics() -> String {
    IGNORED_ACTIONS.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ignored_lookup() {
        assert!(is_ignored("getShowMulligan"));
        assert!(!is_ignored("refreshTimer"));
        assert!(!is_ignored("getTurnStart"));
        assert_eq!(ignored_topics().split_whitespace().count(), IGNORED_ACTIONS.len());
    }
}
