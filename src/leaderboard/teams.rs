//! Team roll-up built on top of the ranked player rows.

use indexmap::IndexMap;

use crate::leaderboard::{
    RankedRow, RankedTeamRow,
    model::normalize_team,
    rank::rank_by,
};

/// Label displayed for the implicit bucket of players without a team.
pub const NO_TEAM_LABEL: &str = "No team";

/// Grouping key for the team roll-up.
///
/// The implicit bucket is its own variant, so a real team literally named
/// "No team" still lands in a separate group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TeamKey {
    /// Trimmed, non-empty team label.
    Named(String),
    /// Players without a team.
    Unassigned,
}

impl TeamKey {
    /// Build the key from an optional raw label.
    pub fn from_label(team: Option<&str>) -> Self {
        normalize_team(team).map_or(Self::Unassigned, Self::Named)
    }

    /// Label shown in the team header row.
    pub fn label(&self) -> &str {
        match self {
            Self::Named(name) => name,
            Self::Unassigned => NO_TEAM_LABEL,
        }
    }

    /// Real team name, `None` for the implicit bucket.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Named(name) => Some(name),
            Self::Unassigned => None,
        }
    }
}

/// Group ranked player rows by team and rank the groups by summed total.
///
/// Members keep the order they have in `players`.
pub fn roll_up(players: &[RankedRow]) -> Vec<RankedTeamRow> {
    let mut buckets: IndexMap<TeamKey, Vec<RankedRow>> = IndexMap::new();
    for row in players {
        buckets
            .entry(TeamKey::from_label(row.team.as_deref()))
            .or_default()
            .push(row.clone());
    }

    let groups: Vec<(TeamKey, u32, Vec<RankedRow>)> = buckets
        .into_iter()
        .map(|(key, members)| {
            let total = members
                .iter()
                .fold(0u32, |sum, member| sum.saturating_add(member.total));
            (key, total, members)
        })
        .collect();

    rank_by(groups, |(_, total, _)| *total, |a, b| a.0.cmp(&b.0))
        .into_iter()
        .map(|(placing, (team, total, members))| RankedTeamRow {
            team,
            placing,
            total,
            members,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_labels_share_the_implicit_bucket() {
        assert_eq!(TeamKey::from_label(None), TeamKey::Unassigned);
        assert_eq!(TeamKey::from_label(Some("  ")), TeamKey::Unassigned);
        assert_eq!(
            TeamKey::from_label(Some(" Hawks ")),
            TeamKey::Named("Hawks".into())
        );
    }

    #[test]
    fn team_named_like_the_bucket_stays_separate() {
        let named = TeamKey::from_label(Some(NO_TEAM_LABEL));
        assert_ne!(named, TeamKey::Unassigned);
        assert_eq!(named.label(), TeamKey::Unassigned.label());
        assert_eq!(named.name(), Some(NO_TEAM_LABEL));
        assert_eq!(TeamKey::Unassigned.name(), None);
    }

    #[test]
    fn unassigned_sorts_after_named_on_ties() {
        assert!(TeamKey::Named("Zebras".into()) < TeamKey::Unassigned);
    }
}
