//! Per-war stat entity and the raw counter block shared with aggregates

use serde::{Deserialize, Serialize};

use crate::value_objects::Snowflake;

/// Raw per-category counters captured from the end-of-war screen.
///
/// The same block is accumulated in the aggregate tables, so addition and
/// the derived total-kills rule live here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StatCounters {
    pub command_post: i32,
    pub fort: i32,
    pub gate: i32,
    pub help: i32,
    pub mount: i32,
    pub placed_objects: i32,
    pub guild_master: i32,
    pub officer: i32,
    pub member: i32,
    pub death: i32,
    pub siege_weapons: i32,
}

impl StatCounters {
    pub const ZERO: StatCounters = StatCounters {
        command_post: 0,
        fort: 0,
        gate: 0,
        help: 0,
        mount: 0,
        placed_objects: 0,
        guild_master: 0,
        officer: 0,
        member: 0,
        death: 0,
        siege_weapons: 0,
    };

    /// Add another counter block into this one
    pub fn add(&mut self, other: &StatCounters) {
        self.command_post += other.command_post;
        self.fort += other.fort;
        self.gate += other.gate;
        self.help += other.help;
        self.mount += other.mount;
        self.placed_objects += other.placed_objects;
        self.guild_master += other.guild_master;
        self.officer += other.officer;
        self.member += other.member;
        self.death += other.death;
        self.siege_weapons += other.siege_weapons;
    }

    /// Player kills only: structure destruction and help/mount counts are
    /// tracked but excluded from the kill total.
    #[inline]
    pub fn total_kills(&self) -> i32 {
        self.guild_master + self.officer + self.member + self.siege_weapons
    }

    /// Kill/death ratio with a divide-by-zero-safe result
    #[inline]
    pub fn kdr(&self) -> f64 {
        if self.death > 0 {
            f64::from(self.total_kills()) / f64::from(self.death)
        } else {
            0.0
        }
    }
}

/// Stats for one attendee in one war. One-to-one with an attendance row
/// whose player actually participated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarStat {
    pub id: Snowflake,
    pub attendance_id: Snowflake,
    pub counters: StatCounters,
}

impl WarStat {
    #[inline]
    pub fn total_kills(&self) -> i32 {
        self.counters.total_kills()
    }

    /// Per-war KDR; `None` when the player never died
    pub fn kdr(&self) -> Option<f64> {
        if self.counters.death == 0 {
            None
        } else {
            Some(f64::from(self.total_kills()) / f64::from(self.counters.death))
        }
    }
}
