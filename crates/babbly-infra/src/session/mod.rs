//! Session lifecycle helpers.

mod sync;

pub use sync::ProfileSynchronizer;
