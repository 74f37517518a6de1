//! Feature execution: extrude and boolean combination (§4.5, §4.6).

pub mod boolean;
pub mod error;
pub mod extrude;

pub use error::FeatureError;
