//! Capability seams over the host OS services
//!
//! This module defines the two abstractions the broker is built on:
//! - `Chooser` - the modal directory/file picker used to obtain consent
//! - `SecurityScoped` - begin/end of OS access scopes plus bookmark
//!   creation and resolution
//!
//! Host applications implement both over the real platform services; tests
//! substitute fakes.

mod chooser;
mod scope;

pub use chooser::{Chooser, ChooserRequest, PanelOptions, SelectionFilter};
pub use scope::{AccessScope, ResolvedBookmark, ScopeToken, SecurityScoped};

#[cfg(test)]
pub use chooser::MockChooser;
#[cfg(test)]
pub use scope::MockSecurityScoped;
