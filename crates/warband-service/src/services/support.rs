//! In-memory repository fixtures for exercising services end to end
//!
//! One `MemoryStore` backs every repository trait plus the notification
//! sink, so a test can drive a whole service call and then inspect what
//! was persisted. Plan application mirrors the Postgres transaction
//! semantics: validation first, then all writes, or nothing.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, NaiveTime, Utc};

use warband_core::entities::{
    Activity, AttendanceClassification, AttendanceStatus, Character, Guild, GuildAggregate,
    GuildIntegration, GuildMember, GuildMemberAggregate, GuildRole, PlayerAggregate, Profile,
    StatCounters, War, WarAttendance, WarCallSign, WarOutcome, WarRole, WarStat, WarTeam,
};
use warband_core::error::DomainError;
use warband_core::events::WarEvent;
use warband_core::traits::{
    ActivityRepository, AggregateRepository, AttendanceRepository, CallSignRepository,
    CharacterRepository, FinalizePlan, GuildRepository, MemberRepository, NotificationSink,
    ProfileRepository, RepoResult, RoleRepository, RosterSyncPlan, StatRepository,
    StatRevisionPlan, TeamRepository, TeamSlot, WarRepository,
};
use warband_core::value_objects::{
    AvailabilityMap, GuildPermissions, Snowflake, SnowflakeGenerator,
};

use super::context::ServiceContext;

#[derive(Default)]
struct State {
    guilds: HashMap<i64, Guild>,
    roles: HashMap<i64, GuildRole>,
    profiles: HashMap<i64, Profile>,
    characters: HashMap<i64, Character>,
    members: Vec<GuildMember>,
    wars: HashMap<i64, War>,
    attendance: HashMap<i64, WarAttendance>,
    teams: HashMap<i64, WarTeam>,
    slots: Vec<TeamSlot>,
    call_signs: HashMap<i64, WarCallSign>,
    call_sign_members: Vec<(Snowflake, Snowflake)>,
    stats: HashMap<i64, WarStat>,
    guild_aggregates: HashMap<i64, GuildAggregate>,
    member_aggregates: Vec<GuildMemberAggregate>,
    player_aggregates: Vec<PlayerAggregate>,
    activities: Vec<Activity>,
    war_roles: HashMap<i64, WarRole>,
    next_seed_id: i64,
}

pub(crate) struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub(crate) fn shared() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(State {
                next_seed_id: 1_000_000,
                ..State::default()
            }),
        })
    }

    /// Wire a service context where every dependency is this store
    pub(crate) fn context(self: &Arc<Self>) -> ServiceContext {
        ServiceContext::new(
            self.clone(),
            self.clone(),
            self.clone(),
            self.clone(),
            self.clone(),
            self.clone(),
            self.clone(),
            self.clone(),
            self.clone(),
            self.clone(),
            self.clone(),
            self.clone(),
            self.clone(),
            Arc::new(SnowflakeGenerator::new(1)),
        )
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    // ------------------------------------------------------------------
    // Seeding
    // ------------------------------------------------------------------

    pub(crate) fn seed_guild(&self, id: i64) {
        let mut s = self.lock();
        s.guilds.insert(
            id,
            Guild {
                id: Snowflake::new(id),
                name: format!("Guild {id}"),
                description: String::new(),
                logo_url: None,
                region: "Europe/London".to_string(),
                war_start_time: NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
                integration: GuildIntegration::default(),
            },
        );
        s.guild_aggregates
            .insert(id, GuildAggregate::new(Snowflake::new(id), Snowflake::new(id)));
    }

    pub(crate) fn seed_role(&self, id: i64, name: &str, permissions: GuildPermissions) {
        self.lock().roles.insert(
            id,
            GuildRole {
                id: Snowflake::new(id),
                name: name.to_string(),
                priority: 10,
                permissions,
            },
        );
    }

    pub(crate) fn seed_profile(&self, id: i64, family_name: &str) {
        self.lock().profiles.insert(
            id,
            Profile {
                id: Snowflake::new(id),
                family_name: family_name.to_string(),
                external_id: None,
                availability: AvailabilityMap::new(),
                auto_sign_up: false,
            },
        );
    }

    pub(crate) fn seed_member(&self, guild_id: i64, profile_id: i64, role_id: i64) {
        self.lock().members.push(GuildMember::new(
            Snowflake::new(guild_id),
            Snowflake::new(profile_id),
            Snowflake::new(role_id),
        ));
    }

    pub(crate) fn seed_pending_war(&self, id: i64, guild_id: i64) {
        self.insert_war(id, guild_id, None);
    }

    pub(crate) fn seed_finished_war(&self, id: i64, guild_id: i64, outcome: WarOutcome) {
        self.insert_war(id, guild_id, Some(outcome));
    }

    fn insert_war(&self, id: i64, guild_id: i64, outcome: Option<WarOutcome>) {
        self.lock().wars.insert(
            id,
            War {
                id: Snowflake::new(id),
                guild_id: Snowflake::new(guild_id),
                date: Utc::now(),
                node: None,
                outcome,
                note: None,
                reminder_sent: false,
            },
        );
    }

    pub(crate) fn seed_attendance(
        &self,
        id: i64,
        war_id: i64,
        profile_id: i64,
        status: AttendanceStatus,
    ) {
        self.lock().attendance.insert(
            id,
            WarAttendance::new(
                Snowflake::new(id),
                Snowflake::new(war_id),
                Snowflake::new(profile_id),
                status,
            ),
        );
    }

    pub(crate) fn seed_stat(&self, id: i64, attendance_id: i64, counters: StatCounters) {
        self.lock().stats.insert(
            id,
            WarStat {
                id: Snowflake::new(id),
                attendance_id: Snowflake::new(attendance_id),
                counters,
            },
        );
    }

    pub(crate) fn seed_team(&self, id: i64, war_id: i64, kind: warband_core::entities::TeamKind) {
        let mut s = self.lock();
        s.war_roles.entry(1).or_insert_with(|| WarRole {
            id: Snowflake::new(1),
            name: "Flex".to_string(),
        });
        s.teams.insert(
            id,
            WarTeam {
                id: Snowflake::new(id),
                war_id: Snowflake::new(war_id),
                name: format!("Team {id}"),
                kind,
                slot_setup: HashMap::new(),
                default_role_id: Snowflake::new(1),
            },
        );
    }

    /// Replay the seeded finished wars into stored aggregate rows so the
    /// store starts consistent, the way finalization would have left it
    pub(crate) fn finalize_seeded_aggregates(&self, guild_id: i64) {
        let mut s = self.lock();
        let gid = Snowflake::new(guild_id);

        let finished: HashMap<Snowflake, WarOutcome> = s
            .wars
            .values()
            .filter(|w| w.guild_id == gid)
            .filter_map(|w| w.outcome.map(|o| (w.id, o)))
            .collect();

        let mut rows: Vec<WarAttendance> = s
            .attendance
            .values()
            .filter(|a| finished.contains_key(&a.war_id))
            .cloned()
            .collect();
        rows.sort_by_key(|a| (a.user_profile_id, a.war_id, a.id));
        let counters: HashMap<Snowflake, StatCounters> = s
            .stats
            .values()
            .map(|st| (st.attendance_id, st.counters))
            .collect();

        let mut totals = StatCounters::ZERO;
        let mut profile_rows: HashMap<Snowflake, Vec<WarAttendance>> = HashMap::new();
        for row in rows.drain(..) {
            if let Some(c) = counters.get(&row.id) {
                totals.add(c);
            }
            profile_rows.entry(row.user_profile_id).or_default().push(row);
        }

        for (profile_id, history) in profile_rows {
            let mut member = GuildMemberAggregate::new(next_id(&mut s), gid, profile_id);
            let mut player = PlayerAggregate::new(next_id(&mut s), profile_id);
            for row in &history {
                let classification = AttendanceClassification::from_status(row.status);
                let stats = counters.get(&row.id);
                member =
                    member.clone_and_increment(next_id(&mut s), row.war_id, classification, stats);
                player =
                    player.clone_and_increment(next_id(&mut s), row.war_id, classification, stats);
                s.member_aggregates.push(member.clone());
                s.player_aggregates.push(player.clone());
            }
        }

        let aggregate = s
            .guild_aggregates
            .get_mut(&guild_id)
            .expect("guild seeded before aggregates");
        aggregate.totals = totals;
        for outcome in finished.values() {
            match outcome {
                WarOutcome::Win => aggregate.wars_won += 1,
                WarOutcome::Loss => aggregate.wars_lost += 1,
                WarOutcome::Stalemate => aggregate.wars_stalemated += 1,
            }
        }
    }

    // ------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------

    pub(crate) fn war(&self, id: i64) -> War {
        self.lock().wars[&id].clone()
    }

    pub(crate) fn attendance_rows(&self, war_id: i64) -> Vec<WarAttendance> {
        let mut rows: Vec<WarAttendance> = self
            .lock()
            .attendance
            .values()
            .filter(|a| a.war_id == Snowflake::new(war_id))
            .cloned()
            .collect();
        rows.sort_by_key(|a| a.id);
        rows
    }

    pub(crate) fn stat_rows(&self, war_id: i64) -> Vec<WarStat> {
        let s = self.lock();
        let attendance: HashSet<Snowflake> = s
            .attendance
            .values()
            .filter(|a| a.war_id == Snowflake::new(war_id))
            .map(|a| a.id)
            .collect();
        let mut rows: Vec<WarStat> = s
            .stats
            .values()
            .filter(|st| attendance.contains(&st.attendance_id))
            .cloned()
            .collect();
        rows.sort_by_key(|st| st.id);
        rows
    }

    pub(crate) fn member_latest(
        &self,
        guild_id: i64,
        profile_id: i64,
    ) -> Option<GuildMemberAggregate> {
        self.lock()
            .member_aggregates
            .iter()
            .filter(|r| {
                r.guild_id == Snowflake::new(guild_id)
                    && r.user_profile_id == Snowflake::new(profile_id)
            })
            .max_by_key(|r| r.id)
            .cloned()
    }

    pub(crate) fn player_latest(&self, profile_id: i64) -> Option<PlayerAggregate> {
        self.lock()
            .player_aggregates
            .iter()
            .filter(|r| r.user_profile_id == Snowflake::new(profile_id))
            .max_by_key(|r| r.id)
            .cloned()
    }

    pub(crate) fn guild_totals(&self, guild_id: i64) -> GuildAggregate {
        self.lock().guild_aggregates[&guild_id].clone()
    }

    pub(crate) fn slot_rows(&self, war_id: i64) -> Vec<TeamSlot> {
        let s = self.lock();
        let teams: HashSet<Snowflake> = s
            .teams
            .values()
            .filter(|t| t.war_id == Snowflake::new(war_id))
            .map(|t| t.id)
            .collect();
        s.slots
            .iter()
            .filter(|slot| teams.contains(&slot.team_id))
            .copied()
            .collect()
    }
}

fn next_id(s: &mut State) -> Snowflake {
    s.next_seed_id += 1;
    Snowflake::new(s.next_seed_id)
}

fn latest_member_id(s: &State, guild_id: Snowflake, profile_id: Snowflake) -> Option<Snowflake> {
    s.member_aggregates
        .iter()
        .filter(|r| r.guild_id == guild_id && r.user_profile_id == profile_id)
        .map(|r| r.id)
        .max()
}

fn latest_player_id(s: &State, profile_id: Snowflake) -> Option<Snowflake> {
    s.player_aggregates
        .iter()
        .filter(|r| r.user_profile_id == profile_id)
        .map(|r| r.id)
        .max()
}

fn apply_status_updates(
    s: &mut State,
    updates: &[warband_core::traits::StatusUpdate],
) {
    for update in updates {
        for id in &update.attendance_ids {
            if let Some(row) = s.attendance.get_mut(&id.into_inner()) {
                row.status = update.status;
            }
        }
    }
}

#[async_trait]
impl GuildRepository for MemoryStore {
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Guild>> {
        Ok(self.lock().guilds.get(&id.into_inner()).cloned())
    }

    async fn find_by_profile(&self, profile_id: Snowflake) -> RepoResult<Vec<Guild>> {
        let s = self.lock();
        Ok(s.members
            .iter()
            .filter(|m| m.user_profile_id == profile_id)
            .filter_map(|m| s.guilds.get(&m.guild_id.into_inner()).cloned())
            .collect())
    }

    async fn find_integrated(&self) -> RepoResult<Vec<Guild>> {
        Ok(self
            .lock()
            .guilds
            .values()
            .filter(|g| g.integration.external_id.is_some())
            .cloned()
            .collect())
    }

    async fn name_exists(&self, name: &str, region: &str) -> RepoResult<bool> {
        Ok(self
            .lock()
            .guilds
            .values()
            .any(|g| g.name.eq_ignore_ascii_case(name) && g.region == region))
    }

    async fn create(&self, guild: &Guild) -> RepoResult<()> {
        self.lock().guilds.insert(guild.id.into_inner(), guild.clone());
        Ok(())
    }

    async fn update(&self, guild: &Guild) -> RepoResult<()> {
        self.lock().guilds.insert(guild.id.into_inner(), guild.clone());
        Ok(())
    }

    async fn update_integration(
        &self,
        guild_id: Snowflake,
        integration: &GuildIntegration,
    ) -> RepoResult<()> {
        let mut s = self.lock();
        let guild = s
            .guilds
            .get_mut(&guild_id.into_inner())
            .ok_or(DomainError::GuildNotFound(guild_id))?;
        guild.integration = integration.clone();
        Ok(())
    }

    async fn delete(&self, id: Snowflake) -> RepoResult<()> {
        self.lock().guilds.remove(&id.into_inner());
        Ok(())
    }
}

#[async_trait]
impl RoleRepository for MemoryStore {
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<GuildRole>> {
        Ok(self.lock().roles.get(&id.into_inner()).cloned())
    }

    async fn find_by_name(&self, name: &str) -> RepoResult<Option<GuildRole>> {
        Ok(self.lock().roles.values().find(|r| r.name == name).cloned())
    }

    async fn find_all(&self) -> RepoResult<Vec<GuildRole>> {
        let mut roles: Vec<GuildRole> = self.lock().roles.values().cloned().collect();
        roles.sort_by_key(|r| r.priority);
        Ok(roles)
    }

    async fn create(&self, role: &GuildRole) -> RepoResult<()> {
        self.lock().roles.insert(role.id.into_inner(), role.clone());
        Ok(())
    }

    async fn update(&self, role: &GuildRole) -> RepoResult<()> {
        self.lock().roles.insert(role.id.into_inner(), role.clone());
        Ok(())
    }

    async fn delete(&self, id: Snowflake) -> RepoResult<()> {
        self.lock().roles.remove(&id.into_inner());
        Ok(())
    }
}

#[async_trait]
impl ProfileRepository for MemoryStore {
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Profile>> {
        Ok(self.lock().profiles.get(&id.into_inner()).cloned())
    }

    async fn find_by_external_id(&self, external_id: &str) -> RepoResult<Option<Profile>> {
        Ok(self
            .lock()
            .profiles
            .values()
            .find(|p| p.external_id.as_deref() == Some(external_id))
            .cloned())
    }

    async fn find_by_family_name(&self, family_name: &str) -> RepoResult<Option<Profile>> {
        Ok(self
            .lock()
            .profiles
            .values()
            .find(|p| p.family_name.eq_ignore_ascii_case(family_name))
            .cloned())
    }

    async fn create(&self, profile: &Profile) -> RepoResult<()> {
        self.lock().profiles.insert(profile.id.into_inner(), profile.clone());
        Ok(())
    }

    async fn update(&self, profile: &Profile) -> RepoResult<()> {
        self.lock().profiles.insert(profile.id.into_inner(), profile.clone());
        Ok(())
    }
}

#[async_trait]
impl CharacterRepository for MemoryStore {
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Character>> {
        Ok(self.lock().characters.get(&id.into_inner()).cloned())
    }

    async fn find_by_profile(&self, profile_id: Snowflake) -> RepoResult<Vec<Character>> {
        Ok(self
            .lock()
            .characters
            .values()
            .filter(|c| c.profile_id == profile_id)
            .cloned()
            .collect())
    }

    async fn find_main(&self, profile_id: Snowflake) -> RepoResult<Option<Character>> {
        Ok(self
            .lock()
            .characters
            .values()
            .find(|c| c.profile_id == profile_id && c.is_main)
            .cloned())
    }

    async fn create(&self, character: &Character) -> RepoResult<()> {
        self.lock()
            .characters
            .insert(character.id.into_inner(), character.clone());
        Ok(())
    }

    async fn update(&self, character: &Character) -> RepoResult<()> {
        self.lock()
            .characters
            .insert(character.id.into_inner(), character.clone());
        Ok(())
    }

    async fn delete(&self, id: Snowflake) -> RepoResult<()> {
        self.lock().characters.remove(&id.into_inner());
        Ok(())
    }
}

#[async_trait]
impl MemberRepository for MemoryStore {
    async fn find(
        &self,
        guild_id: Snowflake,
        profile_id: Snowflake,
    ) -> RepoResult<Option<GuildMember>> {
        Ok(self
            .lock()
            .members
            .iter()
            .find(|m| m.guild_id == guild_id && m.user_profile_id == profile_id)
            .cloned())
    }

    async fn find_by_guild(&self, guild_id: Snowflake) -> RepoResult<Vec<GuildMember>> {
        Ok(self
            .lock()
            .members
            .iter()
            .filter(|m| m.guild_id == guild_id)
            .cloned()
            .collect())
    }

    async fn find_by_profile(&self, profile_id: Snowflake) -> RepoResult<Vec<GuildMember>> {
        Ok(self
            .lock()
            .members
            .iter()
            .filter(|m| m.user_profile_id == profile_id)
            .cloned()
            .collect())
    }

    async fn create(&self, member: &GuildMember) -> RepoResult<()> {
        self.lock().members.push(member.clone());
        Ok(())
    }

    async fn update_role(
        &self,
        guild_id: Snowflake,
        profile_id: Snowflake,
        role_id: Snowflake,
    ) -> RepoResult<()> {
        let mut s = self.lock();
        let member = s
            .members
            .iter_mut()
            .find(|m| m.guild_id == guild_id && m.user_profile_id == profile_id)
            .ok_or(DomainError::MemberNotFound)?;
        member.role_id = role_id;
        Ok(())
    }

    async fn delete(&self, guild_id: Snowflake, profile_id: Snowflake) -> RepoResult<()> {
        self.lock()
            .members
            .retain(|m| !(m.guild_id == guild_id && m.user_profile_id == profile_id));
        Ok(())
    }

    async fn apply_sync(&self, plan: &RosterSyncPlan) -> RepoResult<()> {
        let mut s = self.lock();
        for member in &plan.add {
            s.members.push(member.clone());
        }
        for (profile_id, role_id) in &plan.update_roles {
            if let Some(member) = s
                .members
                .iter_mut()
                .find(|m| m.guild_id == plan.guild_id && m.user_profile_id == *profile_id)
            {
                member.role_id = *role_id;
            }
        }
        s.members.retain(|m| {
            !(m.guild_id == plan.guild_id && plan.remove.contains(&m.user_profile_id))
        });
        if let Some(guild) = s.guilds.get_mut(&plan.guild_id.into_inner()) {
            guild.integration.member_cache = plan.member_cache.clone();
        }
        Ok(())
    }
}

#[async_trait]
impl WarRepository for MemoryStore {
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<War>> {
        Ok(self.lock().wars.get(&id.into_inner()).cloned())
    }

    async fn find_by_guild(&self, guild_id: Snowflake, limit: i64) -> RepoResult<Vec<War>> {
        let mut wars: Vec<War> = self
            .lock()
            .wars
            .values()
            .filter(|w| w.guild_id == guild_id)
            .cloned()
            .collect();
        wars.sort_by(|a, b| b.date.cmp(&a.date));
        wars.truncate(usize::try_from(limit.clamp(1, 1000)).unwrap_or(1000));
        Ok(wars)
    }

    async fn find_pending(&self, guild_id: Snowflake) -> RepoResult<Option<War>> {
        Ok(self
            .lock()
            .wars
            .values()
            .filter(|w| w.guild_id == guild_id && w.outcome.is_none())
            .max_by_key(|w| w.date)
            .cloned())
    }

    async fn find_latest_finished(&self, guild_id: Snowflake) -> RepoResult<Option<War>> {
        Ok(self
            .lock()
            .wars
            .values()
            .filter(|w| w.guild_id == guild_id && w.outcome.is_some())
            .max_by_key(|w| w.date)
            .cloned())
    }

    async fn find_due_reminders(
        &self,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> RepoResult<Vec<War>> {
        Ok(self
            .lock()
            .wars
            .values()
            .filter(|w| {
                w.outcome.is_none() && !w.reminder_sent && w.date >= from && w.date <= until
            })
            .cloned()
            .collect())
    }

    async fn create(&self, war: &War) -> RepoResult<()> {
        self.lock().wars.insert(war.id.into_inner(), war.clone());
        Ok(())
    }

    async fn update(&self, war: &War) -> RepoResult<()> {
        let mut s = self.lock();
        if !s.wars.contains_key(&war.id.into_inner()) {
            return Err(DomainError::WarNotFound(war.id));
        }
        s.wars.insert(war.id.into_inner(), war.clone());
        Ok(())
    }

    async fn mark_reminder_sent(&self, id: Snowflake) -> RepoResult<()> {
        let mut s = self.lock();
        let war = s
            .wars
            .get_mut(&id.into_inner())
            .ok_or(DomainError::WarNotFound(id))?;
        war.reminder_sent = true;
        Ok(())
    }

    async fn delete(&self, id: Snowflake) -> RepoResult<()> {
        let mut s = self.lock();
        if s.wars.remove(&id.into_inner()).is_none() {
            return Err(DomainError::WarNotFound(id));
        }
        s.attendance.retain(|_, a| a.war_id != id);
        Ok(())
    }

    async fn apply_finalize(&self, plan: &FinalizePlan) -> RepoResult<()> {
        let mut s = self.lock();

        let pending = s
            .wars
            .get(&plan.war_id.into_inner())
            .is_some_and(|w| w.outcome.is_none());
        if !pending {
            return Err(DomainError::WarAlreadyFinished);
        }
        for base in &plan.bases {
            if latest_member_id(&s, plan.guild_id, base.user_profile_id) != base.member_base {
                return Err(DomainError::AggregateConflict(base.user_profile_id));
            }
            if latest_player_id(&s, base.user_profile_id) != base.player_base {
                return Err(DomainError::AggregateConflict(base.user_profile_id));
            }
        }
        if !s.guild_aggregates.contains_key(&plan.guild_id.into_inner()) {
            return Err(DomainError::AggregateMissing(plan.guild_id));
        }

        if let Some(war) = s.wars.get_mut(&plan.war_id.into_inner()) {
            war.outcome = Some(plan.outcome);
            if let Some(note) = &plan.note {
                war.note = Some(note.clone());
            }
        }
        for row in &plan.attendance_inserts {
            s.attendance.insert(row.id.into_inner(), row.clone());
        }
        for stat in &plan.stats {
            s.stats.insert(stat.id.into_inner(), stat.clone());
        }
        apply_status_updates(&mut s, &plan.status_updates);
        s.member_aggregates.extend(plan.member_rows.iter().cloned());
        s.player_aggregates.extend(plan.player_rows.iter().cloned());
        if let Some(aggregate) = s.guild_aggregates.get_mut(&plan.guild_id.into_inner()) {
            aggregate.totals.add(&plan.guild_delta);
            match plan.outcome {
                WarOutcome::Win => aggregate.wars_won += 1,
                WarOutcome::Loss => aggregate.wars_lost += 1,
                WarOutcome::Stalemate => aggregate.wars_stalemated += 1,
            }
        }
        s.activities.push(plan.activity.clone());
        Ok(())
    }
}

#[async_trait]
impl AttendanceRepository for MemoryStore {
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<WarAttendance>> {
        Ok(self.lock().attendance.get(&id.into_inner()).cloned())
    }

    async fn find_by_war(&self, war_id: Snowflake) -> RepoResult<Vec<WarAttendance>> {
        let mut rows: Vec<WarAttendance> = self
            .lock()
            .attendance
            .values()
            .filter(|a| a.war_id == war_id)
            .cloned()
            .collect();
        rows.sort_by_key(|a| a.id);
        Ok(rows)
    }

    async fn find_by_war_and_profile(
        &self,
        war_id: Snowflake,
        profile_id: Snowflake,
    ) -> RepoResult<Option<WarAttendance>> {
        Ok(self
            .lock()
            .attendance
            .values()
            .find(|a| a.war_id == war_id && a.user_profile_id == profile_id)
            .cloned())
    }

    async fn exists_for_war(&self, war_id: Snowflake) -> RepoResult<bool> {
        Ok(self.lock().attendance.values().any(|a| a.war_id == war_id))
    }

    async fn create(&self, attendance: &WarAttendance) -> RepoResult<()> {
        let mut s = self.lock();
        if s.attendance.values().any(|a| {
            a.war_id == attendance.war_id && a.user_profile_id == attendance.user_profile_id
        }) {
            return Err(DomainError::AttendanceExists);
        }
        s.attendance.insert(attendance.id.into_inner(), attendance.clone());
        Ok(())
    }

    async fn create_many(&self, rows: &[WarAttendance]) -> RepoResult<()> {
        let mut s = self.lock();
        for row in rows {
            s.attendance.insert(row.id.into_inner(), row.clone());
        }
        Ok(())
    }

    async fn update(&self, attendance: &WarAttendance) -> RepoResult<()> {
        let mut s = self.lock();
        if !s.attendance.contains_key(&attendance.id.into_inner()) {
            return Err(DomainError::AttendanceNotFound(attendance.id));
        }
        s.attendance.insert(attendance.id.into_inner(), attendance.clone());
        Ok(())
    }

    async fn find_finalized_by_guild_profile(
        &self,
        guild_id: Snowflake,
        profile_id: Snowflake,
    ) -> RepoResult<Vec<WarAttendance>> {
        let s = self.lock();
        let finished: HashSet<Snowflake> = s
            .wars
            .values()
            .filter(|w| w.guild_id == guild_id && w.outcome.is_some())
            .map(|w| w.id)
            .collect();
        let mut rows: Vec<WarAttendance> = s
            .attendance
            .values()
            .filter(|a| a.user_profile_id == profile_id && finished.contains(&a.war_id))
            .cloned()
            .collect();
        rows.sort_by_key(|a| a.war_id);
        Ok(rows)
    }

    async fn find_finalized_by_profile(
        &self,
        profile_id: Snowflake,
    ) -> RepoResult<Vec<WarAttendance>> {
        let s = self.lock();
        let finished: HashSet<Snowflake> = s
            .wars
            .values()
            .filter(|w| w.outcome.is_some())
            .map(|w| w.id)
            .collect();
        let mut rows: Vec<WarAttendance> = s
            .attendance
            .values()
            .filter(|a| a.user_profile_id == profile_id && finished.contains(&a.war_id))
            .cloned()
            .collect();
        rows.sort_by_key(|a| a.war_id);
        Ok(rows)
    }
}

#[async_trait]
impl TeamRepository for MemoryStore {
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<WarTeam>> {
        Ok(self.lock().teams.get(&id.into_inner()).cloned())
    }

    async fn find_by_war(&self, war_id: Snowflake) -> RepoResult<Vec<WarTeam>> {
        Ok(self
            .lock()
            .teams
            .values()
            .filter(|t| t.war_id == war_id)
            .cloned()
            .collect())
    }

    async fn create(&self, team: &WarTeam) -> RepoResult<()> {
        self.lock().teams.insert(team.id.into_inner(), team.clone());
        Ok(())
    }

    async fn update(&self, team: &WarTeam) -> RepoResult<()> {
        self.lock().teams.insert(team.id.into_inner(), team.clone());
        Ok(())
    }

    async fn delete(&self, id: Snowflake) -> RepoResult<()> {
        let mut s = self.lock();
        if s.teams.remove(&id.into_inner()).is_none() {
            return Err(DomainError::TeamNotFound(id));
        }
        s.slots.retain(|slot| slot.team_id != id);
        Ok(())
    }

    async fn find_slots(&self, team_id: Snowflake) -> RepoResult<Vec<TeamSlot>> {
        Ok(self
            .lock()
            .slots
            .iter()
            .filter(|slot| slot.team_id == team_id)
            .copied()
            .collect())
    }

    async fn find_slots_by_war(&self, war_id: Snowflake) -> RepoResult<Vec<TeamSlot>> {
        let s = self.lock();
        let teams: HashSet<Snowflake> = s
            .teams
            .values()
            .filter(|t| t.war_id == war_id)
            .map(|t| t.id)
            .collect();
        Ok(s.slots
            .iter()
            .filter(|slot| teams.contains(&slot.team_id))
            .copied()
            .collect())
    }

    async fn set_slot(&self, war_id: Snowflake, slot: TeamSlot) -> RepoResult<()> {
        let mut s = self.lock();
        let team_in_war = s
            .teams
            .get(&slot.team_id.into_inner())
            .is_some_and(|t| t.war_id == war_id);
        if !team_in_war {
            return Err(DomainError::TeamNotFound(slot.team_id));
        }
        let war_teams: HashSet<Snowflake> = s
            .teams
            .values()
            .filter(|t| t.war_id == war_id)
            .map(|t| t.id)
            .collect();
        // same transaction as the insert: move the attendee out of any held
        // slot, then evict the target slot's occupant
        s.slots.retain(|existing| {
            !(war_teams.contains(&existing.team_id)
                && existing.attendance_id == slot.attendance_id)
        });
        s.slots
            .retain(|existing| !(existing.team_id == slot.team_id && existing.slot == slot.slot));
        s.slots.push(slot);
        Ok(())
    }

    async fn clear_slot(&self, team_id: Snowflake, slot: u16) -> RepoResult<()> {
        self.lock()
            .slots
            .retain(|existing| !(existing.team_id == team_id && existing.slot == slot));
        Ok(())
    }

    async fn find_role(&self, id: Snowflake) -> RepoResult<Option<WarRole>> {
        Ok(self.lock().war_roles.get(&id.into_inner()).cloned())
    }

    async fn find_roles(&self) -> RepoResult<Vec<WarRole>> {
        Ok(self.lock().war_roles.values().cloned().collect())
    }

    async fn create_role(&self, role: &WarRole) -> RepoResult<()> {
        self.lock().war_roles.insert(role.id.into_inner(), role.clone());
        Ok(())
    }
}

#[async_trait]
impl CallSignRepository for MemoryStore {
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<WarCallSign>> {
        Ok(self.lock().call_signs.get(&id.into_inner()).cloned())
    }

    async fn find_by_war(&self, war_id: Snowflake) -> RepoResult<Vec<WarCallSign>> {
        Ok(self
            .lock()
            .call_signs
            .values()
            .filter(|c| c.war_id == war_id)
            .cloned()
            .collect())
    }

    async fn create(&self, call_sign: &WarCallSign) -> RepoResult<()> {
        self.lock()
            .call_signs
            .insert(call_sign.id.into_inner(), call_sign.clone());
        Ok(())
    }

    async fn update(&self, call_sign: &WarCallSign) -> RepoResult<()> {
        self.lock()
            .call_signs
            .insert(call_sign.id.into_inner(), call_sign.clone());
        Ok(())
    }

    async fn delete(&self, id: Snowflake) -> RepoResult<()> {
        let mut s = self.lock();
        s.call_signs.remove(&id.into_inner());
        s.call_sign_members.retain(|(call_sign_id, _)| *call_sign_id != id);
        Ok(())
    }

    async fn find_members(&self, call_sign_id: Snowflake) -> RepoResult<Vec<Snowflake>> {
        Ok(self
            .lock()
            .call_sign_members
            .iter()
            .filter(|(id, _)| *id == call_sign_id)
            .map(|(_, attendance_id)| *attendance_id)
            .collect())
    }

    async fn add_member(
        &self,
        call_sign_id: Snowflake,
        attendance_id: Snowflake,
    ) -> RepoResult<()> {
        self.lock().call_sign_members.push((call_sign_id, attendance_id));
        Ok(())
    }

    async fn remove_member(
        &self,
        call_sign_id: Snowflake,
        attendance_id: Snowflake,
    ) -> RepoResult<()> {
        self.lock()
            .call_sign_members
            .retain(|entry| *entry != (call_sign_id, attendance_id));
        Ok(())
    }
}

#[async_trait]
impl StatRepository for MemoryStore {
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<WarStat>> {
        Ok(self.lock().stats.get(&id.into_inner()).cloned())
    }

    async fn find_by_attendance(&self, attendance_id: Snowflake) -> RepoResult<Option<WarStat>> {
        Ok(self
            .lock()
            .stats
            .values()
            .find(|st| st.attendance_id == attendance_id)
            .cloned())
    }

    async fn find_by_war(&self, war_id: Snowflake) -> RepoResult<Vec<WarStat>> {
        let s = self.lock();
        let attendance: HashSet<Snowflake> = s
            .attendance
            .values()
            .filter(|a| a.war_id == war_id)
            .map(|a| a.id)
            .collect();
        let mut rows: Vec<WarStat> = s
            .stats
            .values()
            .filter(|st| attendance.contains(&st.attendance_id))
            .cloned()
            .collect();
        rows.sort_by_key(|st| st.id);
        Ok(rows)
    }

    async fn find_by_guild_profile(
        &self,
        guild_id: Snowflake,
        profile_id: Snowflake,
    ) -> RepoResult<Vec<WarStat>> {
        let s = self.lock();
        let guild_wars: HashSet<Snowflake> = s
            .wars
            .values()
            .filter(|w| w.guild_id == guild_id)
            .map(|w| w.id)
            .collect();
        let attendance: HashSet<Snowflake> = s
            .attendance
            .values()
            .filter(|a| a.user_profile_id == profile_id && guild_wars.contains(&a.war_id))
            .map(|a| a.id)
            .collect();
        Ok(s.stats
            .values()
            .filter(|st| attendance.contains(&st.attendance_id))
            .cloned()
            .collect())
    }

    async fn find_by_profile(&self, profile_id: Snowflake) -> RepoResult<Vec<WarStat>> {
        let s = self.lock();
        let attendance: HashSet<Snowflake> = s
            .attendance
            .values()
            .filter(|a| a.user_profile_id == profile_id)
            .map(|a| a.id)
            .collect();
        Ok(s.stats
            .values()
            .filter(|st| attendance.contains(&st.attendance_id))
            .cloned()
            .collect())
    }

    async fn apply_revision(&self, plan: &StatRevisionPlan) -> RepoResult<()> {
        let mut s = self.lock();

        let finished = s
            .wars
            .get(&plan.war_id.into_inner())
            .is_some_and(|w| w.outcome.is_some());
        if !finished {
            return Err(DomainError::WarNotFound(plan.war_id));
        }
        for rebuild in &plan.member_rebuilds {
            if latest_member_id(&s, rebuild.guild_id, rebuild.user_profile_id)
                != rebuild.expected_latest
            {
                return Err(DomainError::AggregateConflict(rebuild.user_profile_id));
            }
        }
        for rebuild in &plan.player_rebuilds {
            if latest_player_id(&s, rebuild.user_profile_id) != rebuild.expected_latest {
                return Err(DomainError::AggregateConflict(rebuild.user_profile_id));
            }
        }
        if !s.guild_aggregates.contains_key(&plan.guild_id.into_inner()) {
            return Err(DomainError::AggregateMissing(plan.guild_id));
        }

        if let Some(war) = s.wars.get_mut(&plan.war_id.into_inner()) {
            if let Some((_, to)) = plan.outcome_change {
                war.outcome = Some(to);
            }
            if let Some(note) = &plan.note {
                war.note = Some(note.clone());
            }
        }
        for row in &plan.attendance_inserts {
            s.attendance.insert(row.id.into_inner(), row.clone());
        }
        for stat in plan.stat_updates.iter().chain(plan.stat_inserts.iter()) {
            s.stats.insert(stat.id.into_inner(), stat.clone());
        }
        for stat_id in &plan.stat_deletes {
            s.stats.remove(&stat_id.into_inner());
        }
        apply_status_updates(&mut s, &plan.status_updates);

        for rebuild in &plan.member_rebuilds {
            s.member_aggregates.retain(|r| {
                !(r.guild_id == rebuild.guild_id
                    && r.user_profile_id == rebuild.user_profile_id)
            });
            s.member_aggregates.extend(rebuild.rows.iter().cloned());
        }
        for rebuild in &plan.player_rebuilds {
            s.player_aggregates
                .retain(|r| r.user_profile_id != rebuild.user_profile_id);
            s.player_aggregates.extend(rebuild.rows.iter().cloned());
        }

        if let Some(aggregate) = s.guild_aggregates.get_mut(&plan.guild_id.into_inner()) {
            aggregate.totals.add(&plan.guild_delta);
            if let Some((from, to)) = plan.outcome_change {
                match from {
                    WarOutcome::Win => aggregate.wars_won -= 1,
                    WarOutcome::Loss => aggregate.wars_lost -= 1,
                    WarOutcome::Stalemate => aggregate.wars_stalemated -= 1,
                }
                match to {
                    WarOutcome::Win => aggregate.wars_won += 1,
                    WarOutcome::Loss => aggregate.wars_lost += 1,
                    WarOutcome::Stalemate => aggregate.wars_stalemated += 1,
                }
            }
        }
        s.activities.push(plan.activity.clone());
        Ok(())
    }
}

#[async_trait]
impl AggregateRepository for MemoryStore {
    async fn find_guild(&self, guild_id: Snowflake) -> RepoResult<Option<GuildAggregate>> {
        Ok(self.lock().guild_aggregates.get(&guild_id.into_inner()).cloned())
    }

    async fn create_guild(&self, aggregate: &GuildAggregate) -> RepoResult<()> {
        self.lock()
            .guild_aggregates
            .insert(aggregate.guild_id.into_inner(), aggregate.clone());
        Ok(())
    }

    async fn find_member_latest(
        &self,
        guild_id: Snowflake,
        profile_id: Snowflake,
    ) -> RepoResult<Option<GuildMemberAggregate>> {
        Ok(self
            .lock()
            .member_aggregates
            .iter()
            .filter(|r| r.guild_id == guild_id && r.user_profile_id == profile_id)
            .max_by_key(|r| r.id)
            .cloned())
    }

    async fn find_members_latest(
        &self,
        guild_id: Snowflake,
    ) -> RepoResult<Vec<GuildMemberAggregate>> {
        let s = self.lock();
        let mut latest: HashMap<Snowflake, GuildMemberAggregate> = HashMap::new();
        for row in s.member_aggregates.iter().filter(|r| r.guild_id == guild_id) {
            let entry = latest.entry(row.user_profile_id).or_insert_with(|| row.clone());
            if row.id > entry.id {
                *entry = row.clone();
            }
        }
        Ok(latest.into_values().collect())
    }

    async fn find_player_latest(
        &self,
        profile_id: Snowflake,
    ) -> RepoResult<Option<PlayerAggregate>> {
        Ok(self
            .lock()
            .player_aggregates
            .iter()
            .filter(|r| r.user_profile_id == profile_id)
            .max_by_key(|r| r.id)
            .cloned())
    }

    async fn replace_member_rows(
        &self,
        guild_id: Snowflake,
        profile_id: Snowflake,
        rows: &[GuildMemberAggregate],
    ) -> RepoResult<()> {
        let mut s = self.lock();
        s.member_aggregates
            .retain(|r| !(r.guild_id == guild_id && r.user_profile_id == profile_id));
        s.member_aggregates.extend(rows.iter().cloned());
        Ok(())
    }

    async fn replace_player_rows(
        &self,
        profile_id: Snowflake,
        rows: &[PlayerAggregate],
    ) -> RepoResult<()> {
        let mut s = self.lock();
        s.player_aggregates.retain(|r| r.user_profile_id != profile_id);
        s.player_aggregates.extend(rows.iter().cloned());
        Ok(())
    }

    async fn replace_guild(&self, aggregate: &GuildAggregate) -> RepoResult<()> {
        self.lock()
            .guild_aggregates
            .insert(aggregate.guild_id.into_inner(), aggregate.clone());
        Ok(())
    }
}

#[async_trait]
impl ActivityRepository for MemoryStore {
    async fn create(&self, activity: &Activity) -> RepoResult<()> {
        self.lock().activities.push(activity.clone());
        Ok(())
    }

    async fn find_by_guild(&self, guild_id: Snowflake, limit: i64) -> RepoResult<Vec<Activity>> {
        let mut entries: Vec<Activity> = self
            .lock()
            .activities
            .iter()
            .filter(|a| a.guild_id == guild_id)
            .cloned()
            .collect();
        entries.sort_by_key(|a| std::cmp::Reverse(a.id));
        entries.truncate(usize::try_from(limit.max(0)).unwrap_or(0));
        Ok(entries)
    }
}

#[async_trait]
impl NotificationSink for MemoryStore {
    async fn notify_war(&self, _guild: &Guild, _war: &War, _event: WarEvent) -> Result<(), DomainError> {
        Ok(())
    }

    async fn remind_war(&self, _guild: &Guild, _war: &War) -> Result<(), DomainError> {
        Ok(())
    }
}
