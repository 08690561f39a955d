//! Data transfer objects for the service layer
//!
//! Requests implement `Deserialize` + `Validate`; responses implement
//! `Serialize` with Snowflake ids rendered as strings.

pub mod mappers;
pub mod requests;
pub mod responses;

pub use requests::*;
pub use responses::*;
