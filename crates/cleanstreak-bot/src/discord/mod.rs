//! Discord adapter: REST for outbound operations, a gateway socket reader
//! for inbound events.

pub mod rest;
pub mod socket;

pub use rest::DiscordRest;
