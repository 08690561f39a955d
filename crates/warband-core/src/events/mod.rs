//! Domain events

mod war_event;

pub use war_event::WarEvent;
