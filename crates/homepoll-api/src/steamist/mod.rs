// Steamist local API
//
// The steam controller serves a flat XML status page on the LAN; there is
// no authentication and no cloud component.

mod client;
mod models;

pub use client::SteamistClient;
pub use models::SteamistStatusResponse;
