//! Star-of-groups topology resolution (C1).
//!
//! Every node's role is recomputed per view, since the leader rotates
//! round-robin and a node's group-leader/member status is defined relative
//! to the current leader.

/// A node's position in the two-level tree for a given view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Root,
    GroupLeader,
    Member,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TopologyInfo {
    pub role: Role,
    pub parent: Option<u32>,
    pub group_id: Option<u32>,
    pub group_size: Option<u32>,
}

/// The leader for `view`, round-robin over `n` nodes.
pub fn leader(view: u64, n: u32) -> u32 {
    debug_assert!(n > 0, "node_count must be positive");
    (view % n as u64) as u32
}

/// Resolve `node_id`'s role, parent, and group membership for `view`.
///
/// `branch_count` (`k`) is clamped to at least 1; group size is
/// `max(1, n / k)`, with the final group absorbing any remainder nodes
/// (matching the original `min(group_start + group_size, n)` bound).
pub fn resolve(view: u64, node_id: u32, n: u32, branch_count: u32) -> TopologyInfo {
    let k = branch_count.max(1);
    let leader_id = leader(view, n);

    if node_id == leader_id {
        return TopologyInfo {
            role: Role::Root,
            parent: None,
            group_id: None,
            group_size: None,
        };
    }

    let group_size = (n / k).max(1);
    let group_id = node_id / group_size;
    let group_start = group_id * group_size;
    let group_end = ((group_id + 1) * group_size).min(n);
    let actual_group_size = group_end.saturating_sub(group_start);

    if node_id == group_start && group_start != leader_id {
        TopologyInfo {
            role: Role::GroupLeader,
            parent: Some(leader_id),
            group_id: Some(group_id),
            group_size: Some(actual_group_size),
        }
    } else {
        TopologyInfo {
            role: Role::Member,
            parent: Some(group_start),
            group_id: Some(group_id),
            group_size: Some(actual_group_size),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leader_rotates_round_robin() {
        assert_eq!(leader(0, 4), 0);
        assert_eq!(leader(1, 4), 1);
        assert_eq!(leader(4, 4), 0);
    }

    #[test]
    fn leader_is_root_with_no_parent() {
        let info = resolve(0, 0, 4, 2);
        assert_eq!(info.role, Role::Root);
        assert_eq!(info.parent, None);
    }

    #[test]
    fn group_leader_parents_to_global_leader() {
        let info = resolve(0, 2, 4, 2);
        assert_eq!(info.role, Role::GroupLeader);
        assert_eq!(info.parent, Some(0));
        assert_eq!(info.group_size, Some(2));
    }

    #[test]
    fn member_parents_to_group_start() {
        let info = resolve(0, 3, 4, 2);
        assert_eq!(info.role, Role::Member);
        assert_eq!(info.parent, Some(2));
    }

    #[test]
    fn member_of_leaders_own_group_parents_to_leader_directly() {
        // node 1's group starts at 0, which is also this view's leader.
        let info = resolve(0, 1, 4, 2);
        assert_eq!(info.role, Role::Member);
        assert_eq!(info.parent, Some(0));
    }

    #[test]
    fn roles_rotate_with_the_leader() {
        let info = resolve(1, 0, 4, 2);
        assert_eq!(info.role, Role::Member);
    }
}
