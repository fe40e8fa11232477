use std::collections::{BTreeMap, HashSet, VecDeque};

use crate::state::Territory;

use super::graph::neighbors;

/// Whether `to` is reachable from `from` through territories owned by
/// `player_id`.
///
/// Breadth-first search: an edge is traversable when its destination is owned
/// by the acting player, so enemy or unclaimed territories block paths
/// through them but not around them. A territory is trivially connected to
/// itself. Visits each territory at most once.
pub fn connected(
    from: &str,
    to: &str,
    player_id: &str,
    territories: &BTreeMap<String, Territory>,
) -> bool {
    if from == to {
        return true;
    }

    let owned_by_player = |name: &str| {
        territories
            .get(name)
            .and_then(|t| t.owner.as_deref())
            .map(|owner| owner == player_id)
            .unwrap_or(false)
    };

    let mut visited: HashSet<&str> = HashSet::new();
    let mut queue: VecDeque<&str> = VecDeque::new();
    visited.insert(from);
    queue.push_back(from);

    while let Some(current) = queue.pop_front() {
        for next in neighbors(current) {
            if !owned_by_player(next) || !visited.insert(next) {
                continue;
            }
            if next == to {
                return true;
            }
            queue.push_back(next);
        }
    }

    false
}
