//! A pure, side-effect-free classifier that turns two state-descriptor
//! lists into a categorised [`SyncPlan`] (§4.4). Grounded on the teacher's
//! `design-notes` recommendation (§9 here) to encode a decision matrix as
//! a table rather than nested conditionals, so each of the 13 cases below
//! maps 1:1 to a test row.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::model::StateDescriptor;

use super::error::{SyncError, SyncResult};

/// Five disjoint action categories produced by [`build_plan`]. Every
/// `client_side_id` appears in at most one list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncPlan {
    pub download: Vec<StateDescriptor>,
    pub upload: Vec<StateDescriptor>,
    pub update: Vec<StateDescriptor>,
    pub delete_client: Vec<StateDescriptor>,
    pub delete_server: Vec<StateDescriptor>,
}

impl SyncPlan {
    pub fn is_empty(&self) -> bool {
        self.download.is_empty()
            && self.upload.is_empty()
            && self.update.is_empty()
            && self.delete_client.is_empty()
            && self.delete_server.is_empty()
    }
}

/// Build a [`SyncPlan`] from the server's and the client's view of item
/// state. Pure and CPU-only: never touches the adapter, the store, or the
/// data-encryption key.
pub fn build_plan(
    server_states: &[StateDescriptor],
    client_states: &[StateDescriptor],
    ctx: &CancellationToken,
) -> SyncResult<SyncPlan> {
    let client_by_id: HashMap<Uuid, &StateDescriptor> =
        client_states.iter().map(|s| (s.client_side_id, s)).collect();
    let server_by_id: HashMap<Uuid, &StateDescriptor> =
        server_states.iter().map(|s| (s.client_side_id, s)).collect();

    let mut plan = SyncPlan::default();

    if ctx.is_cancelled() {
        return Err(SyncError::Cancelled);
    }
    for server in server_states {
        match client_by_id.get(&server.client_side_id) {
            None => {
                // Server only.
                if !server.deleted {
                    plan.download.push(server.clone());
                }
            }
            Some(client) => classify_both_present(server, client, &mut plan),
        }
    }

    if ctx.is_cancelled() {
        return Err(SyncError::Cancelled);
    }
    for client in client_states {
        if !server_by_id.contains_key(&client.client_side_id) {
            // Client only.
            if !client.deleted {
                plan.upload.push(client.clone());
            }
        }
    }

    Ok(plan)
}

/// The 13-row decision matrix from §4.4, for an item present on both
/// sides. Ties are broken by version, then deletion intent, then hash.
fn classify_both_present(server: &StateDescriptor, client: &StateDescriptor, plan: &mut SyncPlan) {
    use std::cmp::Ordering::*;

    match server.version.cmp(&client.version) {
        Greater => {
            // A newer server version is authoritative regardless of
            // deletion flags on either side.
            if server.deleted {
                plan.delete_client.push(server.clone());
            } else {
                plan.download.push(server.clone());
            }
        }
        Less => {
            // A newer client version is authoritative regardless of
            // deletion flags on either side.
            if client.deleted {
                plan.delete_server.push(client.clone());
            } else {
                plan.update.push(client.clone());
            }
        }
        Equal => {
            match (server.deleted, client.deleted) {
                (true, true) => {} // Both sides agree it's gone; no action.
                (true, false) => plan.delete_client.push(server.clone()),
                (false, true) => plan.delete_server.push(client.clone()),
                (false, false) => {
                    if server.hash != client.hash {
                        // Equal version but diverging hash: an offline
                        // edit that never bumped the version. Only the
                        // client could have produced this divergence, so
                        // the client's copy is pushed.
                        plan.update.push(client.clone());
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(id: Uuid, version: u64, hash: &str, deleted: bool) -> StateDescriptor {
        StateDescriptor::new(id, version, hash, deleted)
    }

    fn ids() -> (Uuid, Uuid, Uuid, Uuid) {
        (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4())
    }

    #[test]
    fn server_only_alive_downloads_server_only_deleted_is_ignored() {
        let (alive, deleted, _, _) = ids();
        let server = vec![state(alive, 1, "h", false), state(deleted, 1, "h", true)];
        let plan = build_plan(&server, &[], &CancellationToken::new()).unwrap();

        assert_eq!(plan.download, vec![state(alive, 1, "h", false)]);
        assert!(plan.upload.is_empty());
        assert!(plan.update.is_empty());
        assert!(plan.delete_client.is_empty());
        assert!(plan.delete_server.is_empty());
    }

    #[test]
    fn client_only_alive_uploads_client_only_deleted_is_ignored() {
        let (alive, deleted, _, _) = ids();
        let client = vec![state(alive, 1, "h", false), state(deleted, 1, "h", true)];
        let plan = build_plan(&[], &client, &CancellationToken::new()).unwrap();

        assert_eq!(plan.upload, vec![state(alive, 1, "h", false)]);
        assert!(plan.download.is_empty());
    }

    #[test]
    fn equal_version_equal_hash_alive_is_a_no_op() {
        let (id, _, _, _) = ids();
        let server = vec![state(id, 2, "same", false)];
        let client = vec![state(id, 2, "same", false)];
        let plan = build_plan(&server, &client, &CancellationToken::new()).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn equal_version_diverging_hash_updates_from_the_client() {
        let (id, _, _, _) = ids();
        let server = vec![state(id, 2, "h1", false)];
        let client = vec![state(id, 2, "h2", false)];
        let plan = build_plan(&server, &client, &CancellationToken::new()).unwrap();
        assert_eq!(plan.update, vec![state(id, 2, "h2", false)]);
    }

    #[test]
    fn equal_version_both_tombstoned_is_a_no_op() {
        let (id, _, _, _) = ids();
        let server = vec![state(id, 2, "h", true)];
        let client = vec![state(id, 2, "h", true)];
        let plan = build_plan(&server, &client, &CancellationToken::new()).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn equal_version_server_tombstoned_deletes_client() {
        let (id, _, _, _) = ids();
        let server = vec![state(id, 2, "h", true)];
        let client = vec![state(id, 2, "h", false)];
        let plan = build_plan(&server, &client, &CancellationToken::new()).unwrap();
        assert_eq!(plan.delete_client, vec![state(id, 2, "h", true)]);
    }

    #[test]
    fn equal_version_client_tombstoned_deletes_server() {
        let (id, _, _, _) = ids();
        let server = vec![state(id, 2, "h", false)];
        let client = vec![state(id, 2, "h", true)];
        let plan = build_plan(&server, &client, &CancellationToken::new()).unwrap();
        assert_eq!(plan.delete_server, vec![state(id, 2, "h", true)]);
    }

    #[test]
    fn newer_tombstoned_server_wins_over_alive_client() {
        let (id, _, _, _) = ids();
        let server = vec![state(id, 5, "h", true)];
        let client = vec![state(id, 2, "h", false)];
        let plan = build_plan(&server, &client, &CancellationToken::new()).unwrap();
        assert_eq!(plan.delete_client, vec![state(id, 5, "h", true)]);
    }

    #[test]
    fn newer_alive_server_wins_over_tombstoned_client() {
        let (id, _, _, _) = ids();
        let server = vec![state(id, 5, "h", false)];
        let client = vec![state(id, 2, "h", true)];
        let plan = build_plan(&server, &client, &CancellationToken::new()).unwrap();
        assert_eq!(plan.download, vec![state(id, 5, "h", false)]);
    }

    #[test]
    fn newer_tombstoned_client_wins_over_alive_server() {
        let (id, _, _, _) = ids();
        let server = vec![state(id, 2, "h", false)];
        let client = vec![state(id, 5, "h", true)];
        let plan = build_plan(&server, &client, &CancellationToken::new()).unwrap();
        assert_eq!(plan.delete_server, vec![state(id, 5, "h", true)]);
    }

    #[test]
    fn newer_alive_client_wins_over_tombstoned_server() {
        let (id, _, _, _) = ids();
        let server = vec![state(id, 2, "h", true)];
        let client = vec![state(id, 5, "h", false)];
        let plan = build_plan(&server, &client, &CancellationToken::new()).unwrap();
        assert_eq!(plan.update, vec![state(id, 5, "h", false)]);
    }

    #[test]
    fn plans_never_put_the_same_id_in_two_categories() {
        let (a, b, c, d) = ids();
        let server = vec![
            state(a, 3, "h1", false),
            state(b, 3, "h4", true),
            state(c, 1, "hc", false),
        ];
        let client = vec![
            state(a, 3, "h1", false),
            state(b, 1, "h4", false),
            state(d, 1, "hd", false),
        ];
        let plan = build_plan(&server, &client, &CancellationToken::new()).unwrap();

        let mut seen = std::collections::HashSet::new();
        for list in [
            &plan.download,
            &plan.upload,
            &plan.update,
            &plan.delete_client,
            &plan.delete_server,
        ] {
            for item in list {
                assert!(seen.insert(item.client_side_id), "duplicate id across categories");
            }
        }
    }

    #[test]
    fn cancellation_yields_an_empty_plan_and_an_error() {
        let token = CancellationToken::new();
        token.cancel();
        let err = build_plan(&[state(Uuid::new_v4(), 1, "h", false)], &[], &token).unwrap_err();
        assert!(matches!(err, SyncError::Cancelled));
    }

    /// Scenario 3 from the spec, with literal values.
    #[test]
    fn literal_decision_matrix_scenario() {
        let pass1 = Uuid::new_v4();
        let pass4 = Uuid::new_v4();
        let pass8 = Uuid::new_v4();

        let server = vec![
            state(pass1, 3, "h1", false),
            state(pass4, 3, "h4", true),
        ];
        let client = vec![
            state(pass1, 3, "h1", false),
            state(pass4, 1, "h4", false),
            state(pass8, 1, "h8", false),
        ];

        let plan = build_plan(&server, &client, &CancellationToken::new()).unwrap();

        assert_eq!(plan.upload, vec![state(pass8, 1, "h8", false)]);
        assert_eq!(plan.delete_client, vec![state(pass4, 3, "h4", true)]);
        assert!(plan.download.is_empty());
        assert!(plan.update.is_empty());
        assert!(plan.delete_server.is_empty());
    }
}
