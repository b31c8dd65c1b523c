//! Wire types shared between the dashboard server and its clients.

pub mod api;
pub mod types;

pub use api::*;
pub use types::{ConnectionProfile, ControlAction, ProfileMap, UnknownAction};
