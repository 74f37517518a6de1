//! The engine crate (§4.6, §4.8, §6.1): owns session state, dispatches the
//! flat command API, and assembles visualization/export payloads. Every
//! lower-crate error is normalized to [`error::EngineError`] here.

pub mod api;
pub mod engine;
pub mod error;
pub mod export;
pub mod ids;
pub mod mesh;
pub mod session;
pub mod visualize;

pub use api::{dispatch, CommandRequest, CommandResponse};
pub use engine::Engine;
pub use error::EngineError;
pub use session::SessionManager;
