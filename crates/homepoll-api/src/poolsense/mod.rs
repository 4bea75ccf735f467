// PoolSense cloud API
//
// Token-authenticated REST API at `api.poolsense.net`. Every poll logs in
// afresh: tokens are short-lived and the hourly poll cadence makes caching
// them pointless.

mod client;
mod models;

pub use client::{DEFAULT_BASE_URL, PoolSenseClient};
pub use models::{LoginResponse, PoolSenseData};
