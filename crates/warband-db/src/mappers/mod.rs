//! Entity <-> model mappers
//!
//! Plain column mappings are `From` impls; rows carrying encoded enums go
//! through fallible functions so a corrupt discriminant surfaces as an
//! internal error instead of a silent default.

mod activity;
mod aggregate;
mod attendance;
mod character;
mod guild;
mod member;
mod profile;
mod role;
mod stat;
mod team;
mod war;

pub use activity::activity_from_model;
pub use attendance::attendance_from_model;
pub use guild::{guild_from_model, integration_to_json};
pub use profile::availability_to_json;
pub use team::{slot_setup_to_json, team_from_model};
pub use war::war_from_model;
