//! Finalization service
//!
//! Finishing a war is the one-way transition that records the outcome,
//! reconciles sign-up intent against who actually fought, writes per-war
//! stat rows, and folds everything into the three aggregate scopes. The
//! whole write is planned up front as plain data and applied atomically by
//! the repository layer.
//!
//! Finished wars can still be revised: the revision path diffs the new stat
//! lines against the stored ones and carries recomputed aggregate histories
//! for the affected profiles inside the same plan.

use std::collections::{HashMap, HashSet};

use tracing::{info, instrument, warn};
use validator::Validate;

use warband_core::entities::{
    reconcile_attendance, Activity, ActivityKind, AttendanceClassification, AttendanceStatus,
    Guild, GuildMemberAggregate, PlayerAggregate, StatCounters, War, WarAttendance, WarOutcome,
    WarStat,
};
use warband_core::error::DomainError;
use warband_core::events::WarEvent;
use warband_core::traits::{
    AggregateBase, FinalizePlan, MemberRebuild, PlayerRebuild, StatRevisionPlan, StatusUpdate,
};
use warband_core::value_objects::{GuildPermissions, Snowflake, SnowflakeGenerator};

use crate::dto::{FinishWarRequest, UpdateFinishedWarRequest, WarResponse, WarStatEntry};

use super::aggregate::{member_history, player_history};
use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};
use super::permission::PermissionService;

/// One stat line resolved to a concrete attendance row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedEntry {
    pub attendance_id: Snowflake,
    pub counters: StatCounters,
}

/// Finalization service
pub struct FinalizeService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> FinalizeService<'a> {
    /// Create a new FinalizeService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Finish a pending war
    #[instrument(skip(self, request))]
    pub async fn finish(
        &self,
        war_id: Snowflake,
        actor_id: Snowflake,
        request: FinishWarRequest,
    ) -> ServiceResult<WarResponse> {
        request.validate()?;

        let mut war = self.load_war(war_id).await?;
        if !war.is_pending() {
            return Err(DomainError::WarAlreadyFinished.into());
        }
        PermissionService::new(self.ctx)
            .require_permission(war.guild_id, actor_id, GuildPermissions::CHANGE_WAR)
            .await?;

        let guild = self.load_guild(war.guild_id).await?;
        let mut attendance = self.ctx.attendance_repo().find_by_war(war_id).await?;
        let (entries, walk_ins) = self
            .resolve_entries(&war, &attendance, &request.entries)
            .await?;
        attendance.extend(walk_ins.iter().cloned());

        let mut member_bases = HashMap::new();
        let mut player_bases = HashMap::new();
        let mut bases = Vec::with_capacity(attendance.len());
        for row in &attendance {
            let profile_id = row.user_profile_id;
            let member = self
                .ctx
                .aggregate_repo()
                .find_member_latest(war.guild_id, profile_id)
                .await?;
            let player = self.ctx.aggregate_repo().find_player_latest(profile_id).await?;
            bases.push(AggregateBase {
                user_profile_id: profile_id,
                member_base: member.as_ref().map(|r| r.id),
                player_base: player.as_ref().map(|r| r.id),
            });
            member_bases.insert(
                profile_id,
                member.unwrap_or_else(|| {
                    GuildMemberAggregate::new(self.ctx.generate_id(), war.guild_id, profile_id)
                }),
            );
            player_bases.insert(
                profile_id,
                player.unwrap_or_else(|| PlayerAggregate::new(self.ctx.generate_id(), profile_id)),
            );
        }
        // Locked in a fixed order by the applying transaction
        bases.sort_unstable_by_key(|b| b.user_profile_id);

        let plan = build_finalize_plan(
            &war,
            request.outcome,
            request.note,
            &entries,
            &attendance,
            &walk_ins,
            &member_bases,
            &player_bases,
            bases,
            actor_id,
            self.ctx.snowflake_generator(),
        )?;

        self.ctx.war_repo().apply_finalize(&plan).await?;

        war.outcome = Some(request.outcome);
        war.note = plan.note.clone();

        info!(
            war_id = %war_id,
            outcome = ?request.outcome,
            stats = plan.stats.len(),
            walk_ins = plan.attendance_inserts.len(),
            "War finalized"
        );

        if guild.notifies(WarEvent::Finished) {
            if let Err(e) = self.ctx.notifier().notify_war(&guild, &war, WarEvent::Finished).await {
                warn!(war_id = %war_id, error = %e, "Notification failed");
            }
        }

        Ok(WarResponse::from(&war))
    }

    /// Revise a finished war's stats, note, or outcome
    ///
    /// The entry list is a complete replacement: stored stats absent from it
    /// are deleted and their attendee becomes a no-show. Aggregates for the
    /// affected profiles (and the guild row) are recomputed and land in the
    /// same transaction as the stat diff.
    #[instrument(skip(self, request))]
    pub async fn update_finished(
        &self,
        war_id: Snowflake,
        actor_id: Snowflake,
        request: UpdateFinishedWarRequest,
    ) -> ServiceResult<WarResponse> {
        request.validate()?;

        let mut war = self.load_war(war_id).await?;
        let Some(current_outcome) = war.outcome else {
            return Err(ServiceError::validation("War has not been finished yet"));
        };
        PermissionService::new(self.ctx)
            .require_permission(war.guild_id, actor_id, GuildPermissions::CHANGE_WAR)
            .await?;

        let mut attendance = self.ctx.attendance_repo().find_by_war(war_id).await?;
        let (entries, walk_ins) = self
            .resolve_entries(&war, &attendance, &request.entries)
            .await?;
        attendance.extend(walk_ins.iter().cloned());

        let existing = self.ctx.stat_repo().find_by_war(war_id).await?;

        let mut plan = build_revision_plan(
            &war,
            current_outcome,
            request.outcome,
            request.note,
            &entries,
            &existing,
            &attendance,
            &walk_ins,
            actor_id,
            self.ctx.snowflake_generator(),
        )?;

        let mut affected: Vec<Snowflake> =
            affected_profiles(&plan, &existing, &attendance).into_iter().collect();
        affected.sort_unstable();

        for &profile_id in &affected {
            let member_latest = self
                .ctx
                .aggregate_repo()
                .find_member_latest(war.guild_id, profile_id)
                .await?;
            let history = self
                .ctx
                .attendance_repo()
                .find_finalized_by_guild_profile(war.guild_id, profile_id)
                .await?;
            let stats = self
                .ctx
                .stat_repo()
                .find_by_guild_profile(war.guild_id, profile_id)
                .await?;
            let (history, counters) = revised_history(&plan, profile_id, history, stats);
            let base = GuildMemberAggregate::new(self.ctx.generate_id(), war.guild_id, profile_id);
            plan.member_rebuilds.push(MemberRebuild {
                guild_id: war.guild_id,
                user_profile_id: profile_id,
                expected_latest: member_latest.map(|r| r.id),
                rows: member_history(&base, &history, &counters, self.ctx.snowflake_generator()),
            });

            let player_latest = self.ctx.aggregate_repo().find_player_latest(profile_id).await?;
            let history = self
                .ctx
                .attendance_repo()
                .find_finalized_by_profile(profile_id)
                .await?;
            let stats = self.ctx.stat_repo().find_by_profile(profile_id).await?;
            let (history, counters) = revised_history(&plan, profile_id, history, stats);
            let base = PlayerAggregate::new(self.ctx.generate_id(), profile_id);
            plan.player_rebuilds.push(PlayerRebuild {
                user_profile_id: profile_id,
                expected_latest: player_latest.map(|r| r.id),
                rows: player_history(&base, &history, &counters, self.ctx.snowflake_generator()),
            });
        }

        self.ctx.stat_repo().apply_revision(&plan).await?;

        if let Some((_, to)) = plan.outcome_change {
            war.outcome = Some(to);
        }
        if let Some(note) = plan.note.clone() {
            war.note = Some(note);
        }

        info!(
            war_id = %war_id,
            updates = plan.stat_updates.len(),
            inserts = plan.stat_inserts.len(),
            deletes = plan.stat_deletes.len(),
            profiles = affected.len(),
            "War stats revised"
        );

        Ok(WarResponse::from(&war))
    }

    /// Resolve raw stat entries to attendance rows
    ///
    /// Entries name an attendance id directly or a family name. A family
    /// name with no attendance row yet gets one built in memory (the player
    /// fought without ever being on the roster); the row is persisted by the
    /// same transaction that applies the plan referencing it.
    async fn resolve_entries(
        &self,
        war: &War,
        attendance: &[WarAttendance],
        raw: &[WarStatEntry],
    ) -> ServiceResult<(Vec<ResolvedEntry>, Vec<WarAttendance>)> {
        let by_id: HashSet<Snowflake> = attendance.iter().map(|a| a.id).collect();
        let mut by_profile: HashMap<Snowflake, Snowflake> = attendance
            .iter()
            .map(|a| (a.user_profile_id, a.id))
            .collect();

        let mut resolved = Vec::with_capacity(raw.len());
        let mut walk_ins = Vec::new();
        for entry in raw {
            let attendance_id = if let Some(id) = entry.attendance_id {
                if !by_id.contains(&id) {
                    return Err(DomainError::AttendanceWrongWar.into());
                }
                id
            } else if let Some(family_name) = entry.family_name.as_deref() {
                let profile = self
                    .ctx
                    .profile_repo()
                    .find_by_family_name(family_name)
                    .await?
                    .ok_or_else(|| ServiceError::not_found("Profile", family_name.to_string()))?;

                if let Some(&id) = by_profile.get(&profile.id) {
                    id
                } else {
                    let row = WarAttendance::new(
                        self.ctx.generate_id(),
                        war.id,
                        profile.id,
                        AttendanceStatus::Undecided,
                    );
                    by_profile.insert(profile.id, row.id);
                    let id = row.id;
                    walk_ins.push(row);
                    id
                }
            } else {
                return Err(DomainError::MissingField("attendance_id").into());
            };

            resolved.push(ResolvedEntry {
                attendance_id,
                counters: entry.counters,
            });
        }
        Ok((resolved, walk_ins))
    }

    async fn load_war(&self, war_id: Snowflake) -> ServiceResult<War> {
        self.ctx
            .war_repo()
            .find_by_id(war_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("War", war_id.to_string()))
    }

    async fn load_guild(&self, guild_id: Snowflake) -> ServiceResult<Guild> {
        self.ctx
            .guild_repo()
            .find_by_id(guild_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Guild", guild_id.to_string()))
    }
}

/// Build the full finalization write as plain data
///
/// Reconciles every attendee's intent against the stat entry list (an entry
/// means the player fought), creates per-war stat rows, sums the guild
/// delta, and produces the next versioned aggregate row per attendee.
/// `attendance` must already include the walk-in rows.
#[allow(clippy::too_many_arguments)]
pub fn build_finalize_plan(
    war: &War,
    outcome: WarOutcome,
    note: Option<String>,
    entries: &[ResolvedEntry],
    attendance: &[WarAttendance],
    walk_ins: &[WarAttendance],
    member_bases: &HashMap<Snowflake, GuildMemberAggregate>,
    player_bases: &HashMap<Snowflake, PlayerAggregate>,
    bases: Vec<AggregateBase>,
    actor_id: Snowflake,
    ids: &SnowflakeGenerator,
) -> ServiceResult<FinalizePlan> {
    let rows: HashMap<Snowflake, &WarAttendance> =
        attendance.iter().map(|a| (a.id, a)).collect();

    let mut counters_by_attendance: HashMap<Snowflake, StatCounters> = HashMap::new();
    for entry in entries {
        if !rows.contains_key(&entry.attendance_id) {
            return Err(DomainError::AttendanceWrongWar.into());
        }
        if counters_by_attendance
            .insert(entry.attendance_id, entry.counters)
            .is_some()
        {
            return Err(ServiceError::validation(format!(
                "Duplicate stat entry for attendance {}",
                entry.attendance_id
            )));
        }
    }

    let mut stats = Vec::with_capacity(entries.len());
    let mut guild_delta = StatCounters::ZERO;
    let mut corrections: HashMap<AttendanceStatus, Vec<Snowflake>> = HashMap::new();
    let mut member_rows = Vec::with_capacity(attendance.len());
    let mut player_rows = Vec::with_capacity(attendance.len());

    for row in attendance {
        let counters = counters_by_attendance.get(&row.id).copied();
        let attended = counters.is_some();

        let final_status = match reconcile_attendance(row.status, attended) {
            Some(corrected) => {
                corrections.entry(corrected).or_default().push(row.id);
                corrected
            }
            None => row.status,
        };

        if let Some(counters) = counters {
            stats.push(WarStat {
                id: ids.generate(),
                attendance_id: row.id,
                counters,
            });
            guild_delta.add(&counters);
        }

        let classification = AttendanceClassification::from_status(final_status);

        let member_base = member_bases
            .get(&row.user_profile_id)
            .ok_or(DomainError::InvalidAttendee(row.user_profile_id))?;
        member_rows.push(member_base.clone_and_increment(
            ids.generate(),
            war.id,
            classification,
            counters.as_ref(),
        ));

        let player_base = player_bases
            .get(&row.user_profile_id)
            .ok_or(DomainError::InvalidAttendee(row.user_profile_id))?;
        player_rows.push(player_base.clone_and_increment(
            ids.generate(),
            war.id,
            classification,
            counters.as_ref(),
        ));
    }

    let status_updates = corrections
        .into_iter()
        .map(|(status, attendance_ids)| StatusUpdate {
            status,
            attendance_ids,
        })
        .collect();

    let activity = Activity::new(
        ids.generate(),
        war.guild_id,
        Some(actor_id),
        ActivityKind::WarEnd,
        Some(format!("{outcome:?}")),
    );

    Ok(FinalizePlan {
        war_id: war.id,
        guild_id: war.guild_id,
        outcome,
        note,
        attendance_inserts: walk_ins.to_vec(),
        stats,
        status_updates,
        guild_delta,
        member_rows,
        player_rows,
        bases,
        activity,
    })
}

/// Diff replacement stat lines against the stored rows of a finished war
///
/// `attendance` must already include the walk-in rows; the returned plan
/// carries empty rebuild lists, filled in by the caller per affected profile.
#[allow(clippy::too_many_arguments)]
pub fn build_revision_plan(
    war: &War,
    current_outcome: WarOutcome,
    new_outcome: Option<WarOutcome>,
    note: Option<String>,
    entries: &[ResolvedEntry],
    existing: &[WarStat],
    attendance: &[WarAttendance],
    walk_ins: &[WarAttendance],
    actor_id: Snowflake,
    ids: &SnowflakeGenerator,
) -> ServiceResult<StatRevisionPlan> {
    let rows: HashMap<Snowflake, &WarAttendance> =
        attendance.iter().map(|a| (a.id, a)).collect();
    let stored: HashMap<Snowflake, &WarStat> =
        existing.iter().map(|s| (s.attendance_id, s)).collect();

    let mut seen: HashSet<Snowflake> = HashSet::new();
    let mut stat_updates = Vec::new();
    let mut stat_inserts = Vec::new();
    let mut late: Vec<Snowflake> = Vec::new();
    let mut no_show: Vec<Snowflake> = Vec::new();

    let mut old_total = StatCounters::ZERO;
    for stat in existing {
        old_total.add(&stat.counters);
    }
    let mut new_total = StatCounters::ZERO;

    for entry in entries {
        let Some(row) = rows.get(&entry.attendance_id) else {
            return Err(DomainError::AttendanceWrongWar.into());
        };
        if !seen.insert(entry.attendance_id) {
            return Err(ServiceError::validation(format!(
                "Duplicate stat entry for attendance {}",
                entry.attendance_id
            )));
        }
        new_total.add(&entry.counters);

        match stored.get(&entry.attendance_id) {
            Some(stat) => {
                if stat.counters != entry.counters {
                    stat_updates.push(WarStat {
                        id: stat.id,
                        attendance_id: entry.attendance_id,
                        counters: entry.counters,
                    });
                }
            }
            None => {
                stat_inserts.push(WarStat {
                    id: ids.generate(),
                    attendance_id: entry.attendance_id,
                    counters: entry.counters,
                });
                // Gained a stat line: the attendee fought after all
                if !row.status.counts_as_attended() {
                    late.push(entry.attendance_id);
                }
            }
        }
    }

    let mut stat_deletes = Vec::new();
    for stat in existing {
        if !seen.contains(&stat.attendance_id) {
            stat_deletes.push(stat.id);
            no_show.push(stat.attendance_id);
        }
    }

    // Signed difference between the replacement lines and the stored ones
    let mut guild_delta = new_total;
    guild_delta.add(&negate(&old_total));

    let mut status_updates = Vec::new();
    if !late.is_empty() {
        status_updates.push(StatusUpdate {
            status: AttendanceStatus::Late,
            attendance_ids: late,
        });
    }
    if !no_show.is_empty() {
        status_updates.push(StatusUpdate {
            status: AttendanceStatus::NoShow,
            attendance_ids: no_show,
        });
    }

    let outcome_change = new_outcome
        .filter(|&to| to != current_outcome)
        .map(|to| (current_outcome, to));

    let activity = Activity::new(
        ids.generate(),
        war.guild_id,
        Some(actor_id),
        ActivityKind::WarUpdate,
        Some("stats revised".to_string()),
    );

    Ok(StatRevisionPlan {
        war_id: war.id,
        guild_id: war.guild_id,
        outcome_change,
        note,
        attendance_inserts: walk_ins.to_vec(),
        stat_updates,
        stat_inserts,
        stat_deletes,
        status_updates,
        guild_delta,
        member_rebuilds: Vec::new(),
        player_rebuilds: Vec::new(),
        activity,
    })
}

/// Profiles whose aggregates need recomputation after a revision lands
fn affected_profiles(
    plan: &StatRevisionPlan,
    existing: &[WarStat],
    attendance: &[WarAttendance],
) -> HashSet<Snowflake> {
    let profile_of: HashMap<Snowflake, Snowflake> = attendance
        .iter()
        .map(|a| (a.id, a.user_profile_id))
        .collect();
    let stat_attendance: HashMap<Snowflake, Snowflake> =
        existing.iter().map(|s| (s.id, s.attendance_id)).collect();

    let mut profiles = HashSet::new();
    for stat in plan.stat_updates.iter().chain(plan.stat_inserts.iter()) {
        if let Some(&profile_id) = profile_of.get(&stat.attendance_id) {
            profiles.insert(profile_id);
        }
    }
    for stat_id in &plan.stat_deletes {
        if let Some(attendance_id) = stat_attendance.get(stat_id) {
            if let Some(&profile_id) = profile_of.get(attendance_id) {
                profiles.insert(profile_id);
            }
        }
    }
    for update in &plan.status_updates {
        for attendance_id in &update.attendance_ids {
            if let Some(&profile_id) = profile_of.get(attendance_id) {
                profiles.insert(profile_id);
            }
        }
    }
    profiles
}

/// One profile's finalized history with a pending revision plan overlaid
///
/// Returns the attendance rows (statuses corrected, walk-ins added, ordered
/// by war) and the counters per attendance id as they will read once the
/// plan lands, so the replacement aggregate rows can be replayed up front.
fn revised_history(
    plan: &StatRevisionPlan,
    profile_id: Snowflake,
    mut attendance: Vec<WarAttendance>,
    stats: Vec<WarStat>,
) -> (Vec<WarAttendance>, HashMap<Snowflake, StatCounters>) {
    let status_of: HashMap<Snowflake, AttendanceStatus> = plan
        .status_updates
        .iter()
        .flat_map(|u| u.attendance_ids.iter().map(move |&id| (id, u.status)))
        .collect();

    attendance.extend(
        plan.attendance_inserts
            .iter()
            .filter(|r| r.user_profile_id == profile_id)
            .cloned(),
    );
    for row in &mut attendance {
        if let Some(&status) = status_of.get(&row.id) {
            row.status = status;
        }
    }
    attendance.sort_unstable_by_key(|row| (row.war_id, row.id));

    let deleted: HashSet<Snowflake> = plan.stat_deletes.iter().copied().collect();
    let mut counters: HashMap<Snowflake, StatCounters> = stats
        .iter()
        .filter(|s| !deleted.contains(&s.id))
        .map(|s| (s.attendance_id, s.counters))
        .collect();
    for stat in plan.stat_updates.iter().chain(plan.stat_inserts.iter()) {
        counters.insert(stat.attendance_id, stat.counters);
    }
    (attendance, counters)
}

fn negate(counters: &StatCounters) -> StatCounters {
    StatCounters {
        command_post: -counters.command_post,
        fort: -counters.fort,
        gate: -counters.gate,
        help: -counters.help,
        mount: -counters.mount,
        placed_objects: -counters.placed_objects,
        guild_master: -counters.guild_master,
        officer: -counters.officer,
        member: -counters.member,
        death: -counters.death,
        siege_weapons: -counters.siege_weapons,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::services::support::MemoryStore;

    fn war() -> War {
        War {
            id: Snowflake::new(100),
            guild_id: Snowflake::new(1),
            date: Utc::now(),
            node: None,
            outcome: None,
            note: None,
            reminder_sent: false,
        }
    }

    fn roster() -> Vec<WarAttendance> {
        // 10: signed up, 11: declined, 12: undecided, 13: signed up
        vec![
            WarAttendance::new(
                Snowflake::new(10),
                Snowflake::new(100),
                Snowflake::new(210),
                AttendanceStatus::Attending,
            ),
            WarAttendance::new(
                Snowflake::new(11),
                Snowflake::new(100),
                Snowflake::new(211),
                AttendanceStatus::NotAttending,
            ),
            WarAttendance::new(
                Snowflake::new(12),
                Snowflake::new(100),
                Snowflake::new(212),
                AttendanceStatus::Undecided,
            ),
            WarAttendance::new(
                Snowflake::new(13),
                Snowflake::new(100),
                Snowflake::new(213),
                AttendanceStatus::Attending,
            ),
        ]
    }

    fn bases(
        attendance: &[WarAttendance],
    ) -> (
        HashMap<Snowflake, GuildMemberAggregate>,
        HashMap<Snowflake, PlayerAggregate>,
    ) {
        let mut members = HashMap::new();
        let mut players = HashMap::new();
        for row in attendance {
            members.insert(
                row.user_profile_id,
                GuildMemberAggregate::new(Snowflake::new(0), Snowflake::new(1), row.user_profile_id),
            );
            players.insert(
                row.user_profile_id,
                PlayerAggregate::new(Snowflake::new(0), row.user_profile_id),
            );
        }
        (members, players)
    }

    fn counters(member: i32, death: i32) -> StatCounters {
        StatCounters {
            member,
            death,
            ..StatCounters::ZERO
        }
    }

    fn finalize_with_walk_ins(
        entries: &[ResolvedEntry],
        walk_ins: &[WarAttendance],
    ) -> ServiceResult<FinalizePlan> {
        let war = war();
        let mut attendance = roster();
        attendance.extend(walk_ins.iter().cloned());
        let (members, players) = bases(&attendance);
        build_finalize_plan(
            &war,
            WarOutcome::Win,
            None,
            entries,
            &attendance,
            walk_ins,
            &members,
            &players,
            Vec::new(),
            Snowflake::new(999),
            &SnowflakeGenerator::new(1),
        )
    }

    fn finalize(entries: &[ResolvedEntry]) -> ServiceResult<FinalizePlan> {
        finalize_with_walk_ins(entries, &[])
    }

    fn status_for(plan: &FinalizePlan, attendance_id: Snowflake) -> Option<AttendanceStatus> {
        plan.status_updates
            .iter()
            .find(|u| u.attendance_ids.contains(&attendance_id))
            .map(|u| u.status)
    }

    #[test]
    fn test_finalize_reconciles_intent() {
        // 10 fought as announced; 11 fought despite declining; 12 and 13
        // never showed
        let plan = finalize(&[
            ResolvedEntry {
                attendance_id: Snowflake::new(10),
                counters: counters(8, 2),
            },
            ResolvedEntry {
                attendance_id: Snowflake::new(11),
                counters: counters(3, 1),
            },
        ])
        .unwrap();

        assert_eq!(status_for(&plan, Snowflake::new(10)), None);
        assert_eq!(
            status_for(&plan, Snowflake::new(11)),
            Some(AttendanceStatus::Late)
        );
        assert_eq!(
            status_for(&plan, Snowflake::new(12)),
            Some(AttendanceStatus::NoShow)
        );
        assert_eq!(
            status_for(&plan, Snowflake::new(13)),
            Some(AttendanceStatus::Reneged)
        );
    }

    #[test]
    fn test_finalize_sums_guild_delta() {
        let plan = finalize(&[
            ResolvedEntry {
                attendance_id: Snowflake::new(10),
                counters: counters(8, 2),
            },
            ResolvedEntry {
                attendance_id: Snowflake::new(11),
                counters: counters(3, 1),
            },
        ])
        .unwrap();

        assert_eq!(plan.guild_delta.member, 11);
        assert_eq!(plan.guild_delta.death, 3);
        assert_eq!(plan.stats.len(), 2);
        // every attendee gets a new aggregate row, fighters or not
        assert_eq!(plan.member_rows.len(), 4);
        assert_eq!(plan.player_rows.len(), 4);
    }

    #[test]
    fn test_finalize_classifies_aggregate_rows() {
        let plan = finalize(&[ResolvedEntry {
            attendance_id: Snowflake::new(10),
            counters: counters(8, 2),
        }])
        .unwrap();

        let fighter = plan
            .member_rows
            .iter()
            .find(|r| r.user_profile_id == Snowflake::new(210))
            .unwrap();
        assert_eq!(fighter.attendance.wars_attended, 1);
        assert_eq!(fighter.totals.member, 8);
        assert_eq!(fighter.war_id, Snowflake::new(100));

        // signed up but absent counts only as reneged
        let reneged = plan
            .member_rows
            .iter()
            .find(|r| r.user_profile_id == Snowflake::new(213))
            .unwrap();
        assert_eq!(reneged.attendance.wars_reneged, 1);
        assert_eq!(reneged.attendance.wars_missed, 0);
        assert_eq!(reneged.totals, StatCounters::ZERO);
    }

    #[test]
    fn test_finalize_carries_walk_in_rows() {
        // profile 300 fought without ever being on the roster
        let walk_in = WarAttendance::new(
            Snowflake::new(14),
            Snowflake::new(100),
            Snowflake::new(300),
            AttendanceStatus::Undecided,
        );
        let plan = finalize_with_walk_ins(
            &[ResolvedEntry {
                attendance_id: Snowflake::new(14),
                counters: counters(4, 1),
            }],
            &[walk_in],
        )
        .unwrap();

        assert_eq!(plan.attendance_inserts.len(), 1);
        assert_eq!(plan.attendance_inserts[0].id, Snowflake::new(14));
        // undecided + fought reconciles to late
        assert_eq!(
            status_for(&plan, Snowflake::new(14)),
            Some(AttendanceStatus::Late)
        );
        assert!(plan.stats.iter().any(|s| s.attendance_id == Snowflake::new(14)));

        let fighter = plan
            .member_rows
            .iter()
            .find(|r| r.user_profile_id == Snowflake::new(300))
            .unwrap();
        assert_eq!(fighter.attendance.wars_attended, 1);
        assert_eq!(fighter.totals.member, 4);
    }

    #[test]
    fn test_finalize_rejects_duplicates_and_strays() {
        let dup = [
            ResolvedEntry {
                attendance_id: Snowflake::new(10),
                counters: counters(1, 0),
            },
            ResolvedEntry {
                attendance_id: Snowflake::new(10),
                counters: counters(2, 0),
            },
        ];
        assert!(finalize(&dup).is_err());

        let stray = [ResolvedEntry {
            attendance_id: Snowflake::new(77),
            counters: counters(1, 0),
        }];
        assert!(finalize(&stray).is_err());
    }

    fn revise(
        entries: &[ResolvedEntry],
        existing: &[WarStat],
        new_outcome: Option<WarOutcome>,
    ) -> ServiceResult<StatRevisionPlan> {
        let mut war = war();
        war.outcome = Some(WarOutcome::Win);
        let mut attendance = roster();
        attendance[1].status = AttendanceStatus::Late;
        attendance[3].status = AttendanceStatus::Reneged;
        build_revision_plan(
            &war,
            WarOutcome::Win,
            new_outcome,
            None,
            entries,
            existing,
            &attendance,
            &[],
            Snowflake::new(999),
            &SnowflakeGenerator::new(1),
        )
    }

    #[test]
    fn test_revision_diffs_stored_stats() {
        let existing = vec![
            WarStat {
                id: Snowflake::new(500),
                attendance_id: Snowflake::new(10),
                counters: counters(8, 2),
            },
            WarStat {
                id: Snowflake::new(501),
                attendance_id: Snowflake::new(11),
                counters: counters(3, 1),
            },
        ];
        // 10 corrected, 11 dropped, 13 added
        let entries = [
            ResolvedEntry {
                attendance_id: Snowflake::new(10),
                counters: counters(9, 2),
            },
            ResolvedEntry {
                attendance_id: Snowflake::new(13),
                counters: counters(4, 0),
            },
        ];
        let plan = revise(&entries, &existing, None).unwrap();

        assert_eq!(plan.stat_updates.len(), 1);
        assert_eq!(plan.stat_updates[0].id, Snowflake::new(500));
        assert_eq!(plan.stat_updates[0].counters.member, 9);

        assert_eq!(plan.stat_inserts.len(), 1);
        assert_eq!(plan.stat_inserts[0].attendance_id, Snowflake::new(13));

        assert_eq!(plan.stat_deletes, vec![Snowflake::new(501)]);

        // (9 + 4) - (8 + 3)
        assert_eq!(plan.guild_delta.member, 2);
        assert_eq!(plan.guild_delta.death, -1);

        // 13 was reneged and now has stats; 11 lost its stats
        let late = plan
            .status_updates
            .iter()
            .find(|u| u.status == AttendanceStatus::Late)
            .unwrap();
        assert_eq!(late.attendance_ids, vec![Snowflake::new(13)]);
        let no_show = plan
            .status_updates
            .iter()
            .find(|u| u.status == AttendanceStatus::NoShow)
            .unwrap();
        assert_eq!(no_show.attendance_ids, vec![Snowflake::new(11)]);
    }

    #[test]
    fn test_revision_outcome_change() {
        let plan = revise(&[], &[], Some(WarOutcome::Loss)).unwrap();
        assert_eq!(plan.outcome_change, Some((WarOutcome::Win, WarOutcome::Loss)));

        let plan = revise(&[], &[], Some(WarOutcome::Win)).unwrap();
        assert_eq!(plan.outcome_change, None);
    }

    #[test]
    fn test_revision_identical_entries_is_empty() {
        let existing = vec![WarStat {
            id: Snowflake::new(500),
            attendance_id: Snowflake::new(10),
            counters: counters(8, 2),
        }];
        let entries = [ResolvedEntry {
            attendance_id: Snowflake::new(10),
            counters: counters(8, 2),
        }];
        let plan = revise(&entries, &existing, None).unwrap();

        assert!(plan.stat_updates.is_empty());
        assert!(plan.stat_inserts.is_empty());
        assert!(plan.stat_deletes.is_empty());
        assert!(plan.status_updates.is_empty());
        assert_eq!(plan.guild_delta, StatCounters::ZERO);
    }

    #[test]
    fn test_affected_profiles_covers_all_touches() {
        let existing = vec![WarStat {
            id: Snowflake::new(501),
            attendance_id: Snowflake::new(11),
            counters: counters(3, 1),
        }];
        let entries = [ResolvedEntry {
            attendance_id: Snowflake::new(13),
            counters: counters(4, 0),
        }];
        let plan = revise(&entries, &existing, None).unwrap();

        let mut attendance = roster();
        attendance[1].status = AttendanceStatus::Late;
        let profiles = affected_profiles(&plan, &existing, &attendance);
        assert!(profiles.contains(&Snowflake::new(211)));
        assert!(profiles.contains(&Snowflake::new(213)));
        assert!(!profiles.contains(&Snowflake::new(210)));
    }

    #[test]
    fn test_revised_history_overlays_plan() {
        let existing = vec![
            WarStat {
                id: Snowflake::new(500),
                attendance_id: Snowflake::new(10),
                counters: counters(8, 2),
            },
            WarStat {
                id: Snowflake::new(501),
                attendance_id: Snowflake::new(11),
                counters: counters(3, 1),
            },
        ];
        // 10 corrected to 9 kills, 11 dropped
        let entries = [ResolvedEntry {
            attendance_id: Snowflake::new(10),
            counters: counters(9, 2),
        }];
        let plan = revise(&entries, &existing, None).unwrap();

        // profile 211 held attendance 11 and loses its stat line
        let history = vec![WarAttendance::new(
            Snowflake::new(11),
            Snowflake::new(100),
            Snowflake::new(211),
            AttendanceStatus::Late,
        )];
        let (history, counters_map) =
            revised_history(&plan, Snowflake::new(211), history, existing.clone());

        assert_eq!(history[0].status, AttendanceStatus::NoShow);
        assert!(!counters_map.contains_key(&Snowflake::new(11)));
        // the other attendee's correction is visible through the same map
        assert_eq!(counters_map[&Snowflake::new(10)].member, 9);
    }

    // End-to-end service paths over the in-memory store

    async fn seed_finished_war(store: &MemoryStore) {
        store.seed_guild(1);
        store.seed_role(5, "Officer", GuildPermissions::OFFICER);
        store.seed_profile(900, "Warden");
        store.seed_member(1, 900, 5);
        store.seed_profile(210, "Aldebaran");
        store.seed_member(1, 210, 5);
        store.seed_finished_war(100, 1, WarOutcome::Win);
        store.seed_attendance(10, 100, 210, AttendanceStatus::Attending);
        store.seed_stat(500, 10, counters(8, 2));
        store.finalize_seeded_aggregates(1);
    }

    #[tokio::test]
    async fn test_finish_adds_walk_in_fighter() {
        let store = MemoryStore::shared();
        store.seed_guild(1);
        store.seed_role(5, "Officer", GuildPermissions::OFFICER);
        store.seed_profile(900, "Warden");
        store.seed_member(1, 900, 5);
        store.seed_profile(210, "Aldebaran");
        store.seed_member(1, 210, 5);
        store.seed_profile(300, "Falken");
        store.seed_pending_war(100, 1);
        store.seed_attendance(10, 100, 210, AttendanceStatus::Attending);

        let ctx = store.context();
        let request = FinishWarRequest {
            outcome: WarOutcome::Win,
            note: None,
            entries: vec![
                WarStatEntry {
                    attendance_id: Some(Snowflake::new(10)),
                    family_name: None,
                    counters: counters(8, 2),
                },
                WarStatEntry {
                    attendance_id: None,
                    family_name: Some("Falken".to_string()),
                    counters: counters(3, 1),
                },
            ],
        };
        FinalizeService::new(&ctx)
            .finish(Snowflake::new(100), Snowflake::new(900), request)
            .await
            .unwrap();

        let rows = store.attendance_rows(100);
        let walk_in = rows
            .iter()
            .find(|r| r.user_profile_id == Snowflake::new(300))
            .expect("walk-in row created");
        assert_eq!(walk_in.status, AttendanceStatus::Late);

        assert_eq!(store.stat_rows(100).len(), 2);
        let player = store.player_latest(300).unwrap();
        assert_eq!(player.attendance.wars_attended, 1);
        assert_eq!(player.totals.member, 3);
        let guild = store.guild_totals(1);
        assert_eq!(guild.totals.member, 11);
        assert_eq!(guild.wars_won, 1);
    }

    #[tokio::test]
    async fn test_finish_requires_change_war() {
        let store = MemoryStore::shared();
        store.seed_guild(1);
        store.seed_role(4, "Member", GuildPermissions::MEMBER);
        store.seed_profile(210, "Aldebaran");
        store.seed_member(1, 210, 4);
        store.seed_pending_war(100, 1);
        store.seed_attendance(10, 100, 210, AttendanceStatus::Attending);

        let ctx = store.context();
        let request = FinishWarRequest {
            outcome: WarOutcome::Win,
            note: None,
            entries: Vec::new(),
        };
        let err = FinalizeService::new(&ctx)
            .finish(Snowflake::new(100), Snowflake::new(210), request)
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "MISSING_PERMISSIONS");
        assert!(store.war(100).is_pending());
    }

    #[tokio::test]
    async fn test_revision_rejects_invalid_entries_without_writing() {
        let store = MemoryStore::shared();
        seed_finished_war(&store).await;
        store.seed_profile(300, "Falken");
        let rows_before = store.attendance_rows(100).len();

        let ctx = store.context();
        // a walk-in line followed by a duplicate of the stored line
        let request = UpdateFinishedWarRequest {
            outcome: None,
            note: None,
            entries: vec![
                WarStatEntry {
                    attendance_id: None,
                    family_name: Some("Falken".to_string()),
                    counters: counters(3, 1),
                },
                WarStatEntry {
                    attendance_id: Some(Snowflake::new(10)),
                    family_name: None,
                    counters: counters(8, 2),
                },
                WarStatEntry {
                    attendance_id: Some(Snowflake::new(10)),
                    family_name: None,
                    counters: counters(9, 2),
                },
            ],
        };
        let err = FinalizeService::new(&ctx)
            .update_finished(Snowflake::new(100), Snowflake::new(900), request)
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");

        // nothing persisted: no walk-in row, stats untouched
        assert_eq!(store.attendance_rows(100).len(), rows_before);
        assert_eq!(store.stat_rows(100)[0].counters.member, 8);
    }

    #[tokio::test]
    async fn test_revision_rebuilds_aggregates_in_plan() {
        let store = MemoryStore::shared();
        seed_finished_war(&store).await;

        let ctx = store.context();
        let request = UpdateFinishedWarRequest {
            outcome: Some(WarOutcome::Loss),
            note: None,
            entries: vec![WarStatEntry {
                attendance_id: Some(Snowflake::new(10)),
                family_name: None,
                counters: counters(9, 3),
            }],
        };
        FinalizeService::new(&ctx)
            .update_finished(Snowflake::new(100), Snowflake::new(900), request)
            .await
            .unwrap();

        let member = store.member_latest(1, 210).unwrap();
        assert_eq!(member.totals.member, 9);
        assert_eq!(member.totals.death, 3);
        assert_eq!(member.attendance.wars_attended, 1);

        let player = store.player_latest(210).unwrap();
        assert_eq!(player.totals.member, 9);

        let guild = store.guild_totals(1);
        assert_eq!(guild.totals.member, 9);
        assert_eq!(guild.wars_won, 0);
        assert_eq!(guild.wars_lost, 1);
    }

    #[tokio::test]
    async fn test_finalize_rejects_moved_aggregate_history() {
        use warband_core::traits::WarRepository;

        let store = MemoryStore::shared();
        seed_finished_war(&store).await;
        store.seed_pending_war(200, 1);

        // A plan built before profile 210's history gained its rows claims a
        // fresh base; the apply must reject it instead of losing the rows.
        let plan = FinalizePlan {
            war_id: Snowflake::new(200),
            guild_id: Snowflake::new(1),
            outcome: WarOutcome::Win,
            note: None,
            attendance_inserts: Vec::new(),
            stats: Vec::new(),
            status_updates: Vec::new(),
            guild_delta: StatCounters::ZERO,
            member_rows: Vec::new(),
            player_rows: Vec::new(),
            bases: vec![AggregateBase {
                user_profile_id: Snowflake::new(210),
                member_base: None,
                player_base: None,
            }],
            activity: Activity::new(
                Snowflake::new(901),
                Snowflake::new(1),
                Some(Snowflake::new(900)),
                ActivityKind::WarEnd,
                None,
            ),
        };
        let err = WarRepository::apply_finalize(&*store, &plan)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::AggregateConflict(p) if p == Snowflake::new(210)));

        assert!(store.war(200).outcome.is_none());
        let guild = store.guild_totals(1);
        assert_eq!(guild.wars_won, 1);
        assert_eq!(guild.totals.member, 8);
    }
}
