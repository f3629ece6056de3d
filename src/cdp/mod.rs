//! CDP wire types

pub mod types;

pub use types::{CdpCommand, CdpError, CdpEvent, CdpResponse, TargetInfo};
