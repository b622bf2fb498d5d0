//! Email operator — reconciles `Email` custom resources against an SMTP relay.

pub mod config;
pub mod credentials;
pub mod dispatch;
pub mod error;
pub mod resolver;
pub mod resources;
pub mod status;
pub mod store;
pub mod transport;
