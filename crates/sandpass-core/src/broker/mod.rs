//! Permission brokering for paths outside the sandbox container
//!
//! The broker answers one question for the host application: may this
//! process touch that path? It checks persisted grants first, prompts the
//! user through the injected chooser only when it has to, and brackets the
//! caller's work in an OS access scope that is always released.

mod paths;

pub use paths::{existing_ancestor, normalize};

use crate::error::{BrokerError, Result};
use crate::persist::{BookmarkStore, GrantLedger, PreferencesStore};
use crate::platform::{
    AccessScope, Chooser, ChooserRequest, PanelOptions, SecurityScoped, SelectionFilter,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A granted right to touch `path`, with the bookmark that persists it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grant {
    /// The path the user approved; may be an ancestor of the requested target
    pub path: PathBuf,
    /// Present when the grant was loaded from or written to the store
    pub bookmark: Option<Vec<u8>>,
}

/// Requests, obtains, and persists user consent for file access outside the
/// sandbox container.
///
/// Operations are synchronous and expected on the UI thread, since obtaining
/// consent may show a modal panel. Concurrent calls for the same path are
/// not serialized here; callers that need that serialize themselves.
pub struct PermissionBroker {
    chooser: Arc<dyn Chooser>,
    scopes: Arc<dyn SecurityScoped>,
    ledger: GrantLedger,
    options: PanelOptions,
}

impl PermissionBroker {
    /// Broker with explicit capabilities and grant store
    pub fn new(
        chooser: Arc<dyn Chooser>,
        scopes: Arc<dyn SecurityScoped>,
        store: Arc<dyn BookmarkStore>,
    ) -> Self {
        Self {
            chooser,
            scopes,
            ledger: GrantLedger::new(store),
            options: PanelOptions::default(),
        }
    }

    /// Broker persisting grants to the file-backed preferences store for
    /// `app_name`, which is also templated into the prompt message
    pub fn with_preferences(
        chooser: Arc<dyn Chooser>,
        scopes: Arc<dyn SecurityScoped>,
        app_name: &str,
    ) -> Result<Self> {
        let store = Arc::new(PreferencesStore::new(app_name)?);
        let mut broker = Self::new(chooser, scopes, store);
        broker.options = PanelOptions::for_app(app_name);
        Ok(broker)
    }

    /// Set the prompt panel title
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.options.title = title.into();
    }

    /// Set the prompt panel message
    pub fn set_message(&mut self, message: impl Into<String>) {
        self.options.message = message.into();
    }

    /// Set the prompt panel confirm-button label
    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.options.prompt = prompt.into();
    }

    pub fn panel_options(&self) -> &PanelOptions {
        &self.options
    }

    /// Access `target` for reading or writing, prompting the user if no
    /// usable persisted grant exists.
    ///
    /// `work` runs synchronously while the access scope is active; the scope
    /// is released before this returns, whether `work` completes or panics
    /// (a panic propagates after release). With `persist`, an approved grant
    /// is remembered so later calls skip the prompt.
    ///
    /// Returns true when access was obtained and `work` ran.
    pub fn access<F>(&self, target: impl AsRef<Path>, persist: bool, work: F) -> bool
    where
        F: FnOnce(),
    {
        self.run(target.as_ref(), true, persist, work)
    }

    /// Like [`access`](Self::access), but never prompts: succeeds only on an
    /// already persisted, still-resolvable grant.
    pub fn try_access<F>(&self, target: impl AsRef<Path>, persist: bool, work: F) -> bool
    where
        F: FnOnce(),
    {
        self.run(target.as_ref(), false, persist, work)
    }

    /// Obtain a grant for `target` without beginning an access scope.
    ///
    /// For hosts that manage scopes themselves; most callers want
    /// [`access`](Self::access) or [`scoped`](Self::scoped).
    pub fn request(&self, target: impl AsRef<Path>, ask: bool, persist: bool) -> Result<Grant> {
        self.obtain(target.as_ref(), ask, persist)
    }

    /// Obtain a grant for `target` and begin access, returning the live
    /// scope guard.
    pub fn scoped(&self, target: impl AsRef<Path>, persist: bool) -> Result<AccessScope<'_>> {
        let grant = self.obtain(target.as_ref(), true, persist)?;
        AccessScope::begin(self.scopes.as_ref(), &grant.path)
    }

    /// Persist the caller's current access to `target` so later calls skip
    /// the prompt.
    ///
    /// For paths the user introduced outside the prompt flow, e.g. by
    /// dropping a file onto the application window or dock. Does nothing
    /// when the process holds no live access to `target`; never prompts.
    pub fn persist_grant(&self, target: impl AsRef<Path>) -> Option<Vec<u8>> {
        let target = target.as_ref();
        if target.as_os_str().is_empty() {
            return None;
        }
        let path = paths::normalize(target);
        match self.scopes.make_bookmark(&path) {
            Ok(bookmark) => {
                self.ledger.insert(&path, bookmark.clone());
                Some(bookmark)
            }
            Err(e) => {
                debug!("Not persisting {:?}, no live access: {}", path, e);
                None
            }
        }
    }

    /// Forget the stored grant for `target`, if any
    pub fn clear_grant(&self, target: impl AsRef<Path>) {
        self.ledger.clear(&paths::normalize(target.as_ref()));
    }

    fn run<F: FnOnce()>(&self, target: &Path, ask: bool, persist: bool, work: F) -> bool {
        let grant = match self.obtain(target, ask, persist) {
            Ok(grant) => grant,
            Err(e) => {
                debug!("Access to {:?} not granted: {}", target, e);
                return false;
            }
        };
        let _scope = match AccessScope::begin(self.scopes.as_ref(), &grant.path) {
            Ok(scope) => scope,
            Err(e) => {
                warn!("Could not begin access scope on {:?}: {}", grant.path, e);
                return false;
            }
        };
        work();
        true
    }

    fn obtain(&self, target: &Path, ask: bool, persist: bool) -> Result<Grant> {
        if target.as_os_str().is_empty() {
            return Err(BrokerError::EmptyTarget.into());
        }
        let target = paths::normalize(target);

        if let Some(grant) = self.stored(&target) {
            return Ok(grant);
        }
        if !ask {
            return Err(BrokerError::NotGranted(target.display().to_string()).into());
        }
        self.prompt(&target, persist)
    }

    /// Stored-grant fast path: find, resolve, refresh when stale.
    fn stored(&self, target: &Path) -> Option<Grant> {
        let (entry_path, record) = self.ledger.find(target)?;
        match self.scopes.resolve_bookmark(&record.bookmark) {
            Ok(resolved) if resolved.stale => {
                debug!("Bookmark for {:?} is stale, refreshing", entry_path);
                self.ledger.clear(&entry_path);
                match self.scopes.make_bookmark(&resolved.path) {
                    Ok(fresh) => {
                        self.ledger.insert(&resolved.path, fresh.clone());
                        Some(Grant {
                            path: resolved.path,
                            bookmark: Some(fresh),
                        })
                    }
                    Err(e) => {
                        debug!(
                            "Could not refresh stale bookmark for {:?}: {}",
                            resolved.path, e
                        );
                        None
                    }
                }
            }
            Ok(resolved) => Some(Grant {
                path: resolved.path,
                bookmark: Some(record.bookmark),
            }),
            Err(e) => {
                // Revoked or moved since it was stored. Drop the dead entry
                // so an approved prompt can persist a fresh one.
                info!("Stored grant for {:?} no longer resolves: {}", entry_path, e);
                self.ledger.clear(&entry_path);
                None
            }
        }
    }

    /// Live-prompt path: scope the panel to the nearest existing ancestor,
    /// validate the choice, persist when asked.
    fn prompt(&self, target: &Path, persist: bool) -> Result<Grant> {
        let directory = paths::existing_ancestor(target)
            .ok_or_else(|| BrokerError::TargetUnresolvable(target.display().to_string()))?;

        let request = ChooserRequest {
            options: self.options.clone(),
            directory,
            target: target.to_path_buf(),
        };
        let chosen = self
            .chooser
            .choose(&request)
            .ok_or(BrokerError::UserDeclined)?;

        // A conforming panel cannot produce a path outside the ancestor
        // chain; treat one as a decline rather than granting it.
        if !SelectionFilter::new(target).allows(&chosen) {
            warn!("Chooser returned {:?}, which does not cover {:?}", chosen, target);
            return Err(BrokerError::SelectionRejected(chosen.display().to_string()).into());
        }

        info!("User granted access to {:?}", chosen);

        let bookmark = if persist {
            match self.scopes.make_bookmark(&chosen) {
                Ok(bookmark) => {
                    self.ledger.insert(&chosen, bookmark.clone());
                    Some(bookmark)
                }
                Err(e) => {
                    // The grant still stands for this launch even if it
                    // cannot be remembered.
                    warn!("Could not persist grant for {:?}: {}", chosen, e);
                    None
                }
            }
        } else {
            None
        };

        Ok(Grant {
            path: chosen,
            bookmark,
        })
    }
}
