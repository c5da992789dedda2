//! Identity provider contract and access checks

use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};

use bingo_core::{AdminPolicy, BingoError, BingoResult, Identity};

/// Callback invoked when the signed-in identity changes
pub type IdentityCallback = Box<dyn Fn(Option<&Identity>) + Send + Sync>;

/// Supplies the current identity and pushes changes to watchers
pub trait IdentityProvider: Send + Sync {
    /// Identity currently signed in, if any
    fn current_identity(&self) -> Option<Identity>;

    /// Watch sign-in / sign-out. The current identity is delivered immediately.
    fn watch(&self, on_change: IdentityCallback) -> IdentityWatch;
}

type WatcherTable = Mutex<BTreeMap<u64, Arc<dyn Fn(Option<&Identity>) + Send + Sync>>>;

/// Handle to an identity watcher; dropping it stops notifications
pub struct IdentityWatch {
    id: u64,
    table: Weak<WatcherTable>,
}

impl IdentityWatch {
    pub fn cancel(self) {}
}

impl Drop for IdentityWatch {
    fn drop(&mut self) {
        if let Some(table) = self.table.upgrade() {
            table.lock().remove(&self.id);
        }
    }
}

/// In-process identity provider with explicit sign in / sign out
#[derive(Default)]
pub struct LocalIdentityProvider {
    current: RwLock<Option<Identity>>,
    watchers: Arc<WatcherTable>,
    next_id: Mutex<u64>,
}

impl LocalIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sign_in(&self, identity: Identity) {
        log::info!("Signed in: {}", identity.id);
        *self.current.write() = Some(identity);
        self.notify();
    }

    pub fn sign_out(&self) {
        if let Some(previous) = self.current.write().take() {
            log::info!("Signed out: {}", previous.id);
        }
        self.notify();
    }

    fn notify(&self) {
        let current = self.current.read().clone();
        let watchers: Vec<_> = self.watchers.lock().values().cloned().collect();
        for watcher in watchers {
            watcher(current.as_ref());
        }
    }
}

impl IdentityProvider for LocalIdentityProvider {
    fn current_identity(&self) -> Option<Identity> {
        self.current.read().clone()
    }

    fn watch(&self, on_change: IdentityCallback) -> IdentityWatch {
        let callback: Arc<dyn Fn(Option<&Identity>) + Send + Sync> = Arc::from(on_change);
        let id = {
            let mut next = self.next_id.lock();
            *next += 1;
            *next
        };
        self.watchers.lock().insert(id, Arc::clone(&callback));

        let current = self.current.read().clone();
        callback(current.as_ref());

        IdentityWatch {
            id,
            table: Arc::downgrade(&self.watchers),
        }
    }
}

/// Reject non-administrators before any write
pub(crate) fn require_admin(policy: &AdminPolicy, actor: &Identity, action: &str) -> BingoResult<()> {
    if policy.is_admin_identity(actor) {
        return Ok(());
    }
    log::warn!("Denied '{}' for non-administrator {}", action, actor.id);
    Err(BingoError::Permission(format!(
        "{} requires an administrator, {} is not one",
        action, actor.id
    )))
}

/// Reject anyone but the session owner
pub(crate) fn require_owner(actor: &Identity, player_id: &str) -> BingoResult<()> {
    if actor.id == player_id {
        return Ok(());
    }
    log::warn!("Denied {} access to session of {}", actor.id, player_id);
    Err(BingoError::Permission(format!(
        "{} cannot modify the session of {}",
        actor.id, player_id
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watch_sees_sign_in_and_out() {
        let provider = LocalIdentityProvider::new();
        let seen: Arc<Mutex<Vec<Option<String>>>> = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&seen);
        let watch = provider.watch(Box::new(move |id| {
            sink.lock().push(id.map(|i| i.id.clone()));
        }));

        provider.sign_in(Identity::new("u1"));
        assert_eq!(provider.current_identity().map(|i| i.id), Some("u1".to_string()));
        provider.sign_out();
        assert!(provider.current_identity().is_none());

        drop(watch);
        provider.sign_in(Identity::new("u2"));

        assert_eq!(
            *seen.lock(),
            vec![None, Some("u1".to_string()), None]
        );
    }

    #[test]
    fn test_access_checks() {
        let policy = AdminPolicy::new(["host@example.com"]);
        let host = Identity::new("h").with_email("host@example.com");
        let guest = Identity::new("g").with_email("guest@example.com");

        assert!(require_admin(&policy, &host, "approve").is_ok());
        assert!(matches!(
            require_admin(&policy, &guest, "approve"),
            Err(BingoError::Permission(_))
        ));

        assert!(require_owner(&guest, "g").is_ok());
        assert!(require_owner(&guest, "h").is_err());
    }
}
