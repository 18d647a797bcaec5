//! Card description seam
//!
//! Rules text depends on static card data the log does not own. The data
//! collaborator plugs in a [`CardDescriber`]; everything else only reads
//! the resulting `Monster::description`.

use crate::core::Monster;

/// Produces the description text shown for a card
pub trait CardDescriber {
    fn describe(&self, card: &Monster) -> String;
}

impl<F> CardDescriber for F
where
    F: Fn(&Monster) -> String,
{
    fn describe(&self, card: &Monster) -> String {
        self(card)
    }
}

/// Uses whatever description text the server shipped with the card
#[derive(Debug, Clone, Copy, Default)]
pub struct ServerDescription;

impl CardDescriber for ServerDescription {
    fn describe(&self, card: &Monster) -> String {
        ["desc", "description"]
            .iter()
            .find_map(|key| card.extra.get(*key).and_then(|v| v.as_str()))
            .unwrap_or_default()
            .to_string()
    }
}

/// Fill in description and status tags on a freshly parsed card
pub fn prepare_card(card: &mut Monster, describer: &dyn CardDescriber) {
    card.description = describer.describe(card);
    card.refresh_statuses();
}
