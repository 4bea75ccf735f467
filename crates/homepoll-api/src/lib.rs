// homepoll-api: Async Rust clients for the vendor device APIs (PoolSense cloud + Steamist local)

pub mod error;
pub mod poolsense;
pub mod steamist;
pub mod transport;

pub use error::Error;
pub use poolsense::{PoolSenseClient, PoolSenseData};
pub use steamist::{SteamistClient, SteamistStatusResponse};
pub use transport::{TlsMode, TransportConfig};
