//! Reading, merging, writing and migrating message catalogs on disk.

mod layout;
mod store;

pub use layout::{CatalogLocator, Layout};
pub use store::{MessageStore, MigrationOutcome, merge_missing};
pub(crate) use store::write_if_changed;
