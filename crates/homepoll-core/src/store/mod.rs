// ── Status store ──
//
// Non-blocking cache of the latest device snapshot with push-based
// change notification.

mod status_store;

pub use status_store::{StatusStore, UpdateHealth};
