//! Validation workflow
//!
//! An outcome only counts toward bingo once an administrator has validated
//! it. Until then, a player's attempt to confirm it files a pending request:
//!
//! ```text
//! Unvalidated ──request──> Pending(count, requestedBy) ──approve──> Validated
//!                                   │
//!                                   └──cancel──> (request removed)
//! ```
//!
//! `approve` writes the validated set first and removes the request second.
//! A crash between the two leaves an orphaned request for a validated
//! outcome, which `request_confirmation` treats as already validated.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;

use bingo_core::{AdminPolicy, BingoError, BingoResult, Identity, Outcome, OutcomeSet};
use bingo_store::{Collection, DocumentStore, FieldPatch, VALIDATED_KEY};

use crate::identity::require_admin;
use crate::records::{PendingRequest, ValidatedRecord, decode, encode};

/// Result of a confirmation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestStatus {
    /// Request recorded; waiting for an administrator
    Pending(PendingRequest),
    /// Outcome is already validated; nothing was written
    AlreadyValidated,
}

/// Read the global validated set; a missing document is an empty set
pub fn load_validated(store: &dyn DocumentStore) -> BingoResult<OutcomeSet> {
    match store.get(Collection::Validated, VALIDATED_KEY) {
        Ok(doc) => {
            let record: ValidatedRecord = decode(Collection::Validated, VALIDATED_KEY, doc)?;
            Ok(record.into_set())
        }
        Err(e) if e.is_not_found() => Ok(OutcomeSet::new()),
        Err(e) => Err(e.into()),
    }
}

/// Administrator-gated validation of outcomes
pub struct ValidationWorkflow {
    store: Arc<dyn DocumentStore>,
    policy: AdminPolicy,
    strict_requests: bool,
    // Serializes read-modify-write of the validated set within this process
    validated_lock: Mutex<()>,
}

impl ValidationWorkflow {
    pub fn new(store: Arc<dyn DocumentStore>, policy: AdminPolicy) -> Self {
        Self {
            store,
            policy,
            strict_requests: false,
            validated_lock: Mutex::new(()),
        }
    }

    /// Fail requests for validated outcomes instead of ignoring them
    pub fn with_strict_requests(mut self, strict: bool) -> Self {
        self.strict_requests = strict;
        self
    }

    /// Current validated set
    pub fn validated_set(&self) -> BingoResult<OutcomeSet> {
        load_validated(self.store.as_ref())
    }

    pub fn is_validated(&self, outcome: &str) -> BingoResult<bool> {
        Ok(self.validated_set()?.contains(outcome))
    }

    /// All pending requests, ordered by outcome
    pub fn pending_requests(&self) -> BingoResult<Vec<PendingRequest>> {
        let docs = self.store.list(Collection::EventRequests)?;
        let mut requests = Vec::with_capacity(docs.len());
        for (key, doc) in docs {
            match decode::<PendingRequest>(Collection::EventRequests, &key, doc) {
                Ok(request) => requests.push(request),
                Err(e) => log::warn!("Skipping malformed request: {}", e),
            }
        }
        Ok(requests)
    }

    /// Pending request for one outcome, if any
    pub fn pending_request(&self, outcome: &str) -> BingoResult<Option<PendingRequest>> {
        match self.store.get(Collection::EventRequests, outcome) {
            Ok(doc) => Ok(Some(decode(Collection::EventRequests, outcome, doc)?)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Ask for an unvalidated outcome to be approved
    ///
    /// Creates the request or bumps its count; `requested_by` always ends up
    /// as the latest requester.
    pub fn request_confirmation(&self, outcome: &str, requester: &str) -> BingoResult<RequestStatus> {
        if self.validated_set()?.contains(outcome) {
            // An orphaned request means an approve was cut short; never an error
            if self.pending_request(outcome)?.is_some() {
                log::warn!("Orphaned request for validated outcome '{}'", outcome);
                return Ok(RequestStatus::AlreadyValidated);
            }
            if self.strict_requests {
                return Err(BingoError::AlreadyValidated(outcome.to_string()));
            }
            return Ok(RequestStatus::AlreadyValidated);
        }

        let patch = vec![
            ("count".to_string(), FieldPatch::Increment(1)),
            ("requestedBy".to_string(), FieldPatch::Set(Value::from(requester))),
        ];
        let initial = encode(&PendingRequest::new(outcome, requester))?;
        let doc = self
            .store
            .upsert(Collection::EventRequests, outcome, initial, patch)?;
        let request: PendingRequest = decode(Collection::EventRequests, outcome, doc)?;

        log::info!(
            "Confirmation requested for '{}' by {} (count {})",
            outcome,
            requester,
            request.request_count
        );
        Ok(RequestStatus::Pending(request))
    }

    /// Validate an outcome and clear its pending request. Idempotent.
    pub fn approve(&self, actor: &Identity, outcome: &str) -> BingoResult<()> {
        require_admin(&self.policy, actor, "approve outcome")?;

        {
            let _guard = self.validated_lock.lock();
            let mut validated = self.validated_set()?;
            if validated.insert(outcome.to_string()) {
                self.write_validated(&validated)?;
                log::info!("Validated '{}'", outcome);
            }
        }

        self.store.delete(Collection::EventRequests, outcome)?;
        Ok(())
    }

    /// Drop a pending request without validating. No-op when absent.
    pub fn cancel(&self, actor: &Identity, outcome: &str) -> BingoResult<()> {
        require_admin(&self.policy, actor, "cancel request")?;

        if self.store.delete(Collection::EventRequests, outcome)? {
            log::info!("Cancelled request for '{}'", outcome);
        }
        Ok(())
    }

    /// Remove an outcome from the validated set
    ///
    /// Players who already confirmed it keep their confirmation. Returns
    /// whether the outcome was validated.
    pub fn revoke(&self, actor: &Identity, outcome: &str) -> BingoResult<bool> {
        require_admin(&self.policy, actor, "revoke outcome")?;

        let removed = {
            let _guard = self.validated_lock.lock();
            let mut validated = self.validated_set()?;
            let removed = validated.remove(outcome);
            if removed {
                self.write_validated(&validated)?;
                log::info!("Revoked validation of '{}'", outcome);
            }
            removed
        };

        self.store.delete(Collection::EventRequests, outcome)?;
        Ok(removed)
    }

    fn write_validated(&self, validated: &OutcomeSet) -> BingoResult<()> {
        let doc = encode(&ValidatedRecord::from_set(validated))?;
        self.store.put(Collection::Validated, VALIDATED_KEY, doc)?;
        Ok(())
    }
}

/// Outcomes a player may not confirm yet
pub fn unvalidated<'a>(outcomes: impl IntoIterator<Item = &'a Outcome>, validated: &OutcomeSet) -> Vec<&'a Outcome> {
    outcomes
        .into_iter()
        .filter(|o| !validated.contains(*o))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bingo_store::MemoryStore;

    fn setup() -> (Arc<MemoryStore>, ValidationWorkflow, Identity) {
        let _ = env_logger::builder().is_test(true).try_init();
        let store = Arc::new(MemoryStore::new());
        let workflow = ValidationWorkflow::new(store.clone(), AdminPolicy::new(["host@example.com"]));
        let admin = Identity::new("host").with_email("host@example.com");
        (store, workflow, admin)
    }

    #[test]
    fn test_requests_accumulate() {
        let (_, workflow, _) = setup();
        workflow.request_confirmation("X", "alice").unwrap();
        let status = workflow.request_confirmation("X", "bob").unwrap();

        let expected = PendingRequest {
            outcome: "X".into(),
            request_count: 2,
            requested_by: "bob".into(),
        };
        assert_eq!(status, RequestStatus::Pending(expected.clone()));
        assert_eq!(workflow.pending_request("X").unwrap(), Some(expected));
    }

    #[test]
    fn test_approve_clears_request() {
        let (_, workflow, admin) = setup();
        workflow.request_confirmation("X", "alice").unwrap();
        workflow.approve(&admin, "X").unwrap();

        assert!(workflow.is_validated("X").unwrap());
        assert!(workflow.pending_request("X").unwrap().is_none());

        // Approving twice is harmless
        workflow.approve(&admin, "X").unwrap();
        assert_eq!(workflow.validated_set().unwrap().len(), 1);
    }

    #[test]
    fn test_request_after_approval_is_noop() {
        let (store, workflow, admin) = setup();
        workflow.approve(&admin, "X").unwrap();

        let status = workflow.request_confirmation("X", "carol").unwrap();
        assert_eq!(status, RequestStatus::AlreadyValidated);
        assert_eq!(store.count(Collection::EventRequests), 0);
    }

    #[test]
    fn test_strict_request_errors() {
        let (store, _, admin) = setup();
        let workflow = ValidationWorkflow::new(store, AdminPolicy::new(["host@example.com"]))
            .with_strict_requests(true);
        workflow.approve(&admin, "X").unwrap();

        assert_eq!(
            workflow.request_confirmation("X", "carol"),
            Err(BingoError::AlreadyValidated("X".into()))
        );
    }

    #[test]
    fn test_orphaned_request_is_tolerated() {
        let (store, workflow, admin) = setup();
        workflow.request_confirmation("X", "alice").unwrap();

        // Validated set written, request delete never happened
        let doc = encode(&ValidatedRecord { values: vec!["X".into()] }).unwrap();
        store.put(Collection::Validated, VALIDATED_KEY, doc).unwrap();

        let status = workflow.request_confirmation("X", "bob").unwrap();
        assert_eq!(status, RequestStatus::AlreadyValidated);
        assert_eq!(workflow.pending_request("X").unwrap().map(|r| r.request_count), Some(1));

        // A later approve cleans it up
        workflow.approve(&admin, "X").unwrap();
        assert!(workflow.pending_request("X").unwrap().is_none());
    }

    #[test]
    fn test_orphaned_request_is_tolerated_in_strict_mode() {
        let (store, _, admin) = setup();
        let workflow = ValidationWorkflow::new(store.clone(), AdminPolicy::new(["host@example.com"]))
            .with_strict_requests(true);
        workflow.request_confirmation("X", "alice").unwrap();

        let doc = encode(&ValidatedRecord { values: vec!["X".into()] }).unwrap();
        store.put(Collection::Validated, VALIDATED_KEY, doc).unwrap();

        let status = workflow.request_confirmation("X", "bob").unwrap();
        assert_eq!(status, RequestStatus::AlreadyValidated);
        assert_eq!(workflow.pending_request("X").unwrap().map(|r| r.request_count), Some(1));

        workflow.approve(&admin, "X").unwrap();
        assert_eq!(
            workflow.request_confirmation("X", "carol"),
            Err(BingoError::AlreadyValidated("X".into()))
        );
    }

    #[test]
    fn test_concurrent_first_requests_all_count() {
        let (_, workflow, _) = setup();
        let workflow = Arc::new(workflow);
        let barrier = Arc::new(std::sync::Barrier::new(2));

        let handles: Vec<_> = ["alice", "bob"]
            .into_iter()
            .map(|requester| {
                let workflow = Arc::clone(&workflow);
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    for _ in 0..50 {
                        workflow.request_confirmation("X", requester).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let request = workflow.pending_request("X").unwrap().unwrap();
        assert_eq!(request.request_count, 100);
        assert!(request.requested_by == "alice" || request.requested_by == "bob");
    }

    #[test]
    fn test_cancel() {
        let (_, workflow, admin) = setup();
        workflow.request_confirmation("X", "alice").unwrap();
        workflow.cancel(&admin, "X").unwrap();
        assert!(workflow.pending_requests().unwrap().is_empty());
        assert!(!workflow.is_validated("X").unwrap());

        // Nothing to cancel
        workflow.cancel(&admin, "X").unwrap();
    }

    #[test]
    fn test_revoke() {
        let (_, workflow, admin) = setup();
        workflow.approve(&admin, "X").unwrap();
        assert!(workflow.revoke(&admin, "X").unwrap());
        assert!(!workflow.revoke(&admin, "X").unwrap());
        assert!(!workflow.is_validated("X").unwrap());
    }

    #[test]
    fn test_admin_only() {
        let (_, workflow, _) = setup();
        let guest = Identity::new("guest").with_email("guest@example.com");
        for result in [
            workflow.approve(&guest, "X"),
            workflow.cancel(&guest, "X"),
            workflow.revoke(&guest, "X").map(|_| ()),
        ] {
            assert!(matches!(result, Err(BingoError::Permission(_))));
        }
        assert!(workflow.validated_set().unwrap().is_empty());
    }

    #[test]
    fn test_pending_requests_sorted() {
        let (_, workflow, _) = setup();
        for outcome in ["c", "a", "b"] {
            workflow.request_confirmation(outcome, "alice").unwrap();
        }
        let outcomes: Vec<_> = workflow
            .pending_requests()
            .unwrap()
            .into_iter()
            .map(|r| r.outcome)
            .collect();
        assert_eq!(outcomes, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_unvalidated_filter() {
        let validated: OutcomeSet = ["a".to_string()].into_iter().collect();
        let cells = vec!["a".to_string(), "b".to_string()];
        assert_eq!(unvalidated(&cells, &validated), vec![&"b".to_string()]);
    }
}
