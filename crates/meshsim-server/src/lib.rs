//! Meshsim Server
//!
//! The control-plane HTTP surface of the mesh peer simulator. A control
//! client provisions simulated peers with `POST /create_peer`, tears them
//! down with `POST /delete_peer`, and observes the running mesh through
//! `GET /state_overview`.

pub mod api;
pub mod config;

pub use api::build_router;
pub use config::NodeConfig;
