//! Bearer token state and the redacted secret wrapper shared with [`Credentials`](super::Credentials).

pub mod secret;
pub mod state;
