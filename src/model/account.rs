//! Administrative view of an account row

use super::Username;
use serde::Serialize;

/// What an operator may see about an account without its password.
///
/// Never carries the payload bytes or the credential hash.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AccountInfo {
    pub username: Username,
    /// Whether a payload has ever been written
    pub has_payload: bool,
    /// Payload length in bytes (0 when never written)
    pub payload_size: u64,
    /// Reserved; no operation populates it yet
    pub last_login_time: Option<String>,
    /// Reserved; no operation populates it yet
    pub last_login_ip: Option<String>,
}
