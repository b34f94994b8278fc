use crate::models::{AbGroup, AppData, Membership};

fn group_counts(data: &AppData, challenge_id: &str) -> (usize, usize) {
    data.memberships
        .values()
        .filter(|m| m.challenge_id == challenge_id)
        .fold((0, 0), |(a, b), m| match m.ab_group {
            Some(AbGroup::A) => (a + 1, b),
            Some(AbGroup::B) => (a, b + 1),
            None => (a, b),
        })
}

/// Group for a new member: the smaller group, a coin flip on a tie.
pub fn group_for_new_member(data: &AppData, challenge_id: &str) -> AbGroup {
    balanced_group(group_counts(data, challenge_id), rand::random::<bool>())
}

fn balanced_group((count_a, count_b): (usize, usize), coin: bool) -> AbGroup {
    match count_a.cmp(&count_b) {
        std::cmp::Ordering::Less => AbGroup::A,
        std::cmp::Ordering::Greater => AbGroup::B,
        std::cmp::Ordering::Equal if coin => AbGroup::A,
        std::cmp::Ordering::Equal => AbGroup::B,
    }
}

/// Assigns every ungrouped member in join order, alternating, starting with
/// the group that is not ahead. Returns the number of members assigned.
pub fn assign_unassigned(data: &mut AppData, challenge_id: &str) -> usize {
    let (count_a, count_b) = group_counts(data, challenge_id);
    let mut next = if count_a <= count_b { AbGroup::A } else { AbGroup::B };

    let unassigned: Vec<String> = data
        .members_of(challenge_id)
        .into_iter()
        .filter(|m| m.ab_group.is_none())
        .map(|m| m.id.clone())
        .collect();

    for id in &unassigned {
        if let Some(membership) = data.memberships.get_mut(id) {
            membership.ab_group = Some(next);
            next = next.other();
        }
    }
    unassigned.len()
}

/// Scores are hidden only from members of group B while A/B is active.
pub fn scores_visible(ab_enabled: bool, group: Option<AbGroup>) -> bool {
    !(ab_enabled && group == Some(AbGroup::B))
}

pub fn effective_group(membership: Option<&Membership>, dev_override: Option<AbGroup>) -> Option<AbGroup> {
    dev_override.or_else(|| membership.and_then(|m| m.ab_group))
}
