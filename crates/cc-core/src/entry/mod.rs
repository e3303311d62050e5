//! Clipboard entries and their client-side projections.

mod entry;
mod selection;
mod view;

pub use entry::{sort_for_view, Entry, NewEntry, ServerTimestamp};
pub use selection::SelectionSet;
pub use view::{LocalView, ViewHealth};
