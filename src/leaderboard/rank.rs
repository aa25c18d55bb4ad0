//! Ordering and display placing shared by player and team standings.

use std::cmp::Ordering;

/// Rank label shown for entries that have not recorded anything yet.
pub const RANK_PLACEHOLDER: &str = "--";
/// Medal label shown for entries that have not recorded anything yet.
pub const MEDAL_PLACEHOLDER: &str = "\u{2014}";

const MEDALS: [&str; 3] = ["\u{1F947}", "\u{1F948}", "\u{1F949}"];

/// Compare two totals, lowest first, with a zero total sorting after any positive one.
///
/// Two zero totals compare equal; callers apply their own secondary key.
pub fn compare_totals(a: u32, b: u32) -> Ordering {
    match (a == 0, b == 0) {
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        _ => a.cmp(&b),
    }
}

/// Display placing derived from a slot in the ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placing {
    /// Zero-based slot in the ordering.
    pub position: usize,
    /// One-based rank, absent for unranked (zero-total) entries.
    pub rank: Option<usize>,
    /// `"1"`, `"2"`, ... or [`RANK_PLACEHOLDER`].
    pub rank_label: String,
    /// Medal for the podium, `"{n}."` below it, or [`MEDAL_PLACEHOLDER`].
    pub medal: String,
}

impl Placing {
    /// Build the placing for the entry sitting at `position` with the given total.
    pub fn new(position: usize, total: u32) -> Self {
        if total == 0 {
            return Self {
                position,
                rank: None,
                rank_label: RANK_PLACEHOLDER.to_string(),
                medal: MEDAL_PLACEHOLDER.to_string(),
            };
        }

        let medal = MEDALS
            .get(position)
            .map_or_else(|| format!("{}.", position + 1), |medal| (*medal).to_string());

        Self {
            position,
            rank: Some(position + 1),
            rank_label: (position + 1).to_string(),
            medal,
        }
    }
}

/// Sort `items` by total and assign placings in order.
pub fn rank_by<T, F, K>(mut items: Vec<T>, total: F, tie_break: K) -> Vec<(Placing, T)>
where
    F: Fn(&T) -> u32,
    K: Fn(&T, &T) -> Ordering,
{
    items.sort_by(|a, b| compare_totals(total(a), total(b)).then_with(|| tie_break(a, b)));
    items
        .into_iter()
        .enumerate()
        .map(|(position, item)| (Placing::new(position, total(&item)), item))
        .collect()
}
