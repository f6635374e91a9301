//! Concrete event payload types.

pub mod sync;

pub use sync::{GroupsSynced, MemberFlagsChanged};
