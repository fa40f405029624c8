//! Sandpass Core Library
//!
//! A sandboxed desktop application cannot touch paths outside its container
//! until the user grants access. This crate wraps the two OS services
//! involved - a modal file panel to obtain consent and security-scoped
//! bookmarks to remember it - behind one call: try to access this path; if
//! not already permitted, prompt once; persist the grant if asked.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       sandpass-core                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  broker/       - PermissionBroker, path resolution          │
//! │  platform/     - Chooser and SecurityScoped capability      │
//! │                  seams, AccessScope guard                   │
//! │  persist/      - grant records, stores, GrantLedger         │
//! │  error.rs      - Error types                                │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The OS-owned services are injected as trait objects, so the broker logic
//! runs unchanged against the host application's real panel and security
//! framework, or against fakes in tests.

pub mod broker;
pub mod error;
pub mod persist;
pub mod platform;

// Re-export commonly used types
pub use error::{BrokerError, Error, PersistError, Result};

// Re-export the broker surface
pub use broker::{existing_ancestor, normalize, Grant, PermissionBroker};

// Re-export capability seams
pub use platform::{
    AccessScope, Chooser, ChooserRequest, PanelOptions, ResolvedBookmark, ScopeToken,
    SecurityScoped, SelectionFilter,
};

// Re-export persistence
pub use persist::{BookmarkStore, GrantLedger, MemoryStore, PersistedGrant, PreferencesStore};
