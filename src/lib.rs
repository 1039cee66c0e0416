//! Split one stream of text messages across named, filtered tabs.
//!
//! Each [`Tab`] owns a [`Classifier`]: a regex or literal pattern that either
//! admits (whitelist) or excludes (blacklist) the messages it finds. Tabs live
//! in ordered [`TabGroup`]s which a [`TabManager`] pages through and cycles
//! between, and a [`TabStore`] keeps the layout in a small versioned file.

pub mod classifier;
pub mod editor;
pub mod error;
pub mod group;
pub mod host;
pub mod manager;
pub mod store;
pub mod tab;
pub mod text;

pub use classifier::Classifier;
pub use editor::TabDraft;
pub use error::{ReadError, Result, TabError};
pub use group::TabGroup;
pub use host::{Notifier, NullScreen, ScreenHost, Silent};
pub use manager::{TABS_PER_PAGE, TabManager};
pub use store::TabStore;
pub use tab::{Tab, TabSettings};
