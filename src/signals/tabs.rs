// =============================================================================
// Signal Tabs — All / Buy / Sell / Neutral grouping with search
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::types::{Direction, Signal};

/// Dashboard tab; `All` shows every signal that matches the search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalTab {
    #[default]
    All,
    Buy,
    Sell,
    Neutral,
}

impl SignalTab {
    fn admits(&self, direction: Direction) -> bool {
        match self {
            Self::All => true,
            Self::Buy => direction == Direction::Buy,
            Self::Sell => direction == Direction::Sell,
            Self::Neutral => direction == Direction::Neutral,
        }
    }
}

/// Badge counts shown next to each tab (after search is applied).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TabCounts {
    pub all: usize,
    pub buy: usize,
    pub sell: usize,
    pub neutral: usize,
}

impl TabCounts {
    pub fn tally<'a>(signals: impl IntoIterator<Item = &'a Signal>) -> Self {
        let mut counts = Self::default();
        for signal in signals {
            counts.all += 1;
            match signal.direction {
                Direction::Buy => counts.buy += 1,
                Direction::Sell => counts.sell += 1,
                Direction::Neutral => counts.neutral += 1,
            }
        }
        counts
    }
}

fn matches_search(signal: &Signal, needle: &str) -> bool {
    needle.is_empty()
        || signal.pair.to_lowercase().contains(needle)
        || signal.rationale.to_lowercase().contains(needle)
}

/// Signals matching `search` (case-insensitive, pair or rationale), in their
/// original order, restricted to `tab`. Also returns the per-tab counts of
/// the search result.
pub fn filter_signals<'a>(
    signals: &'a [Signal],
    search: &str,
    tab: SignalTab,
) -> (Vec<&'a Signal>, TabCounts) {
    let needle = search.trim().to_lowercase();
    let searched: Vec<&Signal> = signals
        .iter()
        .filter(|s| matches_search(s, &needle))
        .collect();
    let counts = TabCounts::tally(searched.iter().copied());
    let visible = searched
        .into_iter()
        .filter(|s| tab.admits(s.direction))
        .collect();
    (visible, counts)
}
