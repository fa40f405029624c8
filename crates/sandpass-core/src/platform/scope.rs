//! Security-scoped resource seam and the access guard

use crate::error::Result;
use std::path::{Path, PathBuf};
use tracing::debug;

#[cfg(test)]
use mockall::automock;

/// Opaque handle for one live OS access scope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeToken(pub u64);

/// Outcome of resolving stored bookmark bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedBookmark {
    pub path: PathBuf,
    /// The OS wants the bookmark re-created from the resolved path
    pub stale: bool,
}

/// OS security-scope capability: begin and end resource use, create and
/// resolve bookmarks. Implemented by the host over the platform security
/// framework.
#[cfg_attr(test, automock)]
pub trait SecurityScoped {
    /// Mark the resource at `path` as in use by this process
    fn begin_access(&self, path: &Path) -> Result<ScopeToken>;

    /// Release a scope obtained from `begin_access`
    fn end_access(&self, token: ScopeToken);

    /// Serialize the caller's current access to `path` into opaque bookmark
    /// bytes. Fails when the process holds no access to `path`.
    fn make_bookmark(&self, path: &Path) -> Result<Vec<u8>>;

    /// Resolve bookmark bytes back into the path they grant access to
    fn resolve_bookmark(&self, bookmark: &[u8]) -> Result<ResolvedBookmark>;
}

/// Live access to a path, released exactly once when dropped.
///
/// Holding the guard brackets the OS-level scope around whatever the caller
/// does with the path; release is tied to `Drop` so it happens on early
/// returns and panics too.
pub struct AccessScope<'a> {
    provider: &'a dyn SecurityScoped,
    token: Option<ScopeToken>,
    path: PathBuf,
}

impl<'a> AccessScope<'a> {
    pub fn begin(provider: &'a dyn SecurityScoped, path: &Path) -> Result<Self> {
        let token = provider.begin_access(path)?;
        debug!("Began access scope on {:?}", path);
        Ok(Self {
            provider,
            token: Some(token),
            path: path.to_path_buf(),
        })
    }

    /// The path this scope grants access to
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for AccessScope<'_> {
    fn drop(&mut self) {
        if let Some(token) = self.token.take() {
            self.provider.end_access(token);
            debug!("Ended access scope on {:?}", self.path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;
    use std::panic::{catch_unwind, AssertUnwindSafe};

    #[test]
    fn scope_is_released_on_drop() {
        let mut scopes = MockSecurityScoped::new();
        scopes
            .expect_begin_access()
            .times(1)
            .returning(|_| Ok(ScopeToken(1)));
        scopes
            .expect_end_access()
            .with(eq(ScopeToken(1)))
            .times(1)
            .return_const(());

        let scope = AccessScope::begin(&scopes, Path::new("/outside/container")).unwrap();
        assert_eq!(scope.path(), Path::new("/outside/container"));
        drop(scope);
    }

    #[test]
    fn scope_is_released_when_the_caller_panics() {
        let mut scopes = MockSecurityScoped::new();
        scopes
            .expect_begin_access()
            .times(1)
            .returning(|_| Ok(ScopeToken(7)));
        scopes
            .expect_end_access()
            .with(eq(ScopeToken(7)))
            .times(1)
            .return_const(());

        let result = catch_unwind(AssertUnwindSafe(|| {
            let _scope = AccessScope::begin(&scopes, Path::new("/outside/container")).unwrap();
            panic!("caller work failed");
        }));
        assert!(result.is_err());
    }

    #[test]
    fn failed_begin_produces_no_scope() {
        let mut scopes = MockSecurityScoped::new();
        scopes.expect_begin_access().times(1).returning(|path| {
            Err(crate::error::BrokerError::NoCurrentAccess(path.display().to_string()).into())
        });
        scopes.expect_end_access().times(0);

        assert!(AccessScope::begin(&scopes, Path::new("/outside/container")).is_err());
    }
}
