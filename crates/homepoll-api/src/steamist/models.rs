use serde::{Deserialize, Serialize};

/// Decoded `status.xml` document.
///
/// ```xml
/// <response>
///   <units>F</units>
///   <temp0>104</temp0>
///   <tmr0>15</tmr0>
///   <active>1</active>
/// </response>
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SteamistStatusResponse {
    /// Temperature unit letter, `F` or `C`.
    pub units: String,
    /// Current set temperature.
    pub temp0: i32,
    /// Minutes left on the running steam session.
    pub tmr0: u32,
    /// `1` while steam is being generated.
    pub active: u8,
}

impl SteamistStatusResponse {
    pub fn is_active(&self) -> bool {
        self.active != 0
    }
}
