//! Service context - dependency container for services
//!
//! Holds all repositories, the notification sink, and the id generator.

use std::sync::Arc;

use warband_core::traits::{
    ActivityRepository, AggregateRepository, AttendanceRepository, CallSignRepository,
    CharacterRepository, GuildRepository, MemberRepository, NotificationSink, ProfileRepository,
    RoleRepository, StatRepository, TeamRepository, WarRepository,
};
use warband_core::SnowflakeGenerator;
use warband_db::{
    PgActivityRepository, PgAggregateRepository, PgAttendanceRepository, PgCallSignRepository,
    PgCharacterRepository, PgGuildRepository, PgMemberRepository, PgPool, PgProfileRepository,
    PgRoleRepository, PgStatRepository, PgTeamRepository, PgWarRepository,
};

/// Service context containing all dependencies
///
/// Passed to every service. Repositories are behind trait objects so the
/// service layer never depends on a concrete storage backend.
#[derive(Clone)]
pub struct ServiceContext {
    guild_repo: Arc<dyn GuildRepository>,
    role_repo: Arc<dyn RoleRepository>,
    profile_repo: Arc<dyn ProfileRepository>,
    character_repo: Arc<dyn CharacterRepository>,
    member_repo: Arc<dyn MemberRepository>,
    war_repo: Arc<dyn WarRepository>,
    attendance_repo: Arc<dyn AttendanceRepository>,
    team_repo: Arc<dyn TeamRepository>,
    call_sign_repo: Arc<dyn CallSignRepository>,
    stat_repo: Arc<dyn StatRepository>,
    aggregate_repo: Arc<dyn AggregateRepository>,
    activity_repo: Arc<dyn ActivityRepository>,

    notifier: Arc<dyn NotificationSink>,
    snowflake_generator: Arc<SnowflakeGenerator>,
}

impl ServiceContext {
    /// Create a new service context with all dependencies
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        guild_repo: Arc<dyn GuildRepository>,
        role_repo: Arc<dyn RoleRepository>,
        profile_repo: Arc<dyn ProfileRepository>,
        character_repo: Arc<dyn CharacterRepository>,
        member_repo: Arc<dyn MemberRepository>,
        war_repo: Arc<dyn WarRepository>,
        attendance_repo: Arc<dyn AttendanceRepository>,
        team_repo: Arc<dyn TeamRepository>,
        call_sign_repo: Arc<dyn CallSignRepository>,
        stat_repo: Arc<dyn StatRepository>,
        aggregate_repo: Arc<dyn AggregateRepository>,
        activity_repo: Arc<dyn ActivityRepository>,
        notifier: Arc<dyn NotificationSink>,
        snowflake_generator: Arc<SnowflakeGenerator>,
    ) -> Self {
        Self {
            guild_repo,
            role_repo,
            profile_repo,
            character_repo,
            member_repo,
            war_repo,
            attendance_repo,
            team_repo,
            call_sign_repo,
            stat_repo,
            aggregate_repo,
            activity_repo,
            notifier,
            snowflake_generator,
        }
    }

    /// Wire a context with Postgres repositories over one connection pool
    pub fn with_postgres(
        pool: PgPool,
        notifier: Arc<dyn NotificationSink>,
        worker_id: u16,
    ) -> Self {
        Self::new(
            Arc::new(PgGuildRepository::new(pool.clone())),
            Arc::new(PgRoleRepository::new(pool.clone())),
            Arc::new(PgProfileRepository::new(pool.clone())),
            Arc::new(PgCharacterRepository::new(pool.clone())),
            Arc::new(PgMemberRepository::new(pool.clone())),
            Arc::new(PgWarRepository::new(pool.clone())),
            Arc::new(PgAttendanceRepository::new(pool.clone())),
            Arc::new(PgTeamRepository::new(pool.clone())),
            Arc::new(PgCallSignRepository::new(pool.clone())),
            Arc::new(PgStatRepository::new(pool.clone())),
            Arc::new(PgAggregateRepository::new(pool.clone())),
            Arc::new(PgActivityRepository::new(pool)),
            notifier,
            Arc::new(SnowflakeGenerator::new(worker_id)),
        )
    }

    /// Get the guild repository
    pub fn guild_repo(&self) -> &dyn GuildRepository {
        self.guild_repo.as_ref()
    }

    /// Get the role repository
    pub fn role_repo(&self) -> &dyn RoleRepository {
        self.role_repo.as_ref()
    }

    /// Get the profile repository
    pub fn profile_repo(&self) -> &dyn ProfileRepository {
        self.profile_repo.as_ref()
    }

    /// Get the character repository
    pub fn character_repo(&self) -> &dyn CharacterRepository {
        self.character_repo.as_ref()
    }

    /// Get the member repository
    pub fn member_repo(&self) -> &dyn MemberRepository {
        self.member_repo.as_ref()
    }

    /// Get the war repository
    pub fn war_repo(&self) -> &dyn WarRepository {
        self.war_repo.as_ref()
    }

    /// Get the attendance repository
    pub fn attendance_repo(&self) -> &dyn AttendanceRepository {
        self.attendance_repo.as_ref()
    }

    /// Get the team repository
    pub fn team_repo(&self) -> &dyn TeamRepository {
        self.team_repo.as_ref()
    }

    /// Get the call sign repository
    pub fn call_sign_repo(&self) -> &dyn CallSignRepository {
        self.call_sign_repo.as_ref()
    }

    /// Get the stat repository
    pub fn stat_repo(&self) -> &dyn StatRepository {
        self.stat_repo.as_ref()
    }

    /// Get the aggregate repository
    pub fn aggregate_repo(&self) -> &dyn AggregateRepository {
        self.aggregate_repo.as_ref()
    }

    /// Get the activity repository
    pub fn activity_repo(&self) -> &dyn ActivityRepository {
        self.activity_repo.as_ref()
    }

    /// Get the notification sink
    pub fn notifier(&self) -> &dyn NotificationSink {
        self.notifier.as_ref()
    }

    /// Get the snowflake ID generator
    pub fn snowflake_generator(&self) -> &SnowflakeGenerator {
        self.snowflake_generator.as_ref()
    }

    /// Generate a new Snowflake ID
    pub fn generate_id(&self) -> warband_core::Snowflake {
        self.snowflake_generator.generate()
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("repositories", &"...")
            .field("notifier", &"...")
            .finish()
    }
}

/// Builder for creating ServiceContext
#[derive(Default)]
pub struct ServiceContextBuilder {
    guild_repo: Option<Arc<dyn GuildRepository>>,
    role_repo: Option<Arc<dyn RoleRepository>>,
    profile_repo: Option<Arc<dyn ProfileRepository>>,
    character_repo: Option<Arc<dyn CharacterRepository>>,
    member_repo: Option<Arc<dyn MemberRepository>>,
    war_repo: Option<Arc<dyn WarRepository>>,
    attendance_repo: Option<Arc<dyn AttendanceRepository>>,
    team_repo: Option<Arc<dyn TeamRepository>>,
    call_sign_repo: Option<Arc<dyn CallSignRepository>>,
    stat_repo: Option<Arc<dyn StatRepository>>,
    aggregate_repo: Option<Arc<dyn AggregateRepository>>,
    activity_repo: Option<Arc<dyn ActivityRepository>>,
    notifier: Option<Arc<dyn NotificationSink>>,
    snowflake_generator: Option<Arc<SnowflakeGenerator>>,
}

impl ServiceContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn guild_repo(mut self, repo: Arc<dyn GuildRepository>) -> Self {
        self.guild_repo = Some(repo);
        self
    }

    pub fn role_repo(mut self, repo: Arc<dyn RoleRepository>) -> Self {
        self.role_repo = Some(repo);
        self
    }

    pub fn profile_repo(mut self, repo: Arc<dyn ProfileRepository>) -> Self {
        self.profile_repo = Some(repo);
        self
    }

    pub fn character_repo(mut self, repo: Arc<dyn CharacterRepository>) -> Self {
        self.character_repo = Some(repo);
        self
    }

    pub fn member_repo(mut self, repo: Arc<dyn MemberRepository>) -> Self {
        self.member_repo = Some(repo);
        self
    }

    pub fn war_repo(mut self, repo: Arc<dyn WarRepository>) -> Self {
        self.war_repo = Some(repo);
        self
    }

    pub fn attendance_repo(mut self, repo: Arc<dyn AttendanceRepository>) -> Self {
        self.attendance_repo = Some(repo);
        self
    }

    pub fn team_repo(mut self, repo: Arc<dyn TeamRepository>) -> Self {
        self.team_repo = Some(repo);
        self
    }

    pub fn call_sign_repo(mut self, repo: Arc<dyn CallSignRepository>) -> Self {
        self.call_sign_repo = Some(repo);
        self
    }

    pub fn stat_repo(mut self, repo: Arc<dyn StatRepository>) -> Self {
        self.stat_repo = Some(repo);
        self
    }

    pub fn aggregate_repo(mut self, repo: Arc<dyn AggregateRepository>) -> Self {
        self.aggregate_repo = Some(repo);
        self
    }

    pub fn activity_repo(mut self, repo: Arc<dyn ActivityRepository>) -> Self {
        self.activity_repo = Some(repo);
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn NotificationSink>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn snowflake_generator(mut self, generator: Arc<SnowflakeGenerator>) -> Self {
        self.snowflake_generator = Some(generator);
        self
    }

    /// Build the ServiceContext
    ///
    /// # Errors
    /// Returns `ServiceError::Validation` if any required dependency is missing
    pub fn build(self) -> super::error::ServiceResult<ServiceContext> {
        use super::error::ServiceError;

        Ok(ServiceContext::new(
            self.guild_repo
                .ok_or_else(|| ServiceError::validation("guild_repo is required"))?,
            self.role_repo
                .ok_or_else(|| ServiceError::validation("role_repo is required"))?,
            self.profile_repo
                .ok_or_else(|| ServiceError::validation("profile_repo is required"))?,
            self.character_repo
                .ok_or_else(|| ServiceError::validation("character_repo is required"))?,
            self.member_repo
                .ok_or_else(|| ServiceError::validation("member_repo is required"))?,
            self.war_repo
                .ok_or_else(|| ServiceError::validation("war_repo is required"))?,
            self.attendance_repo
                .ok_or_else(|| ServiceError::validation("attendance_repo is required"))?,
            self.team_repo
                .ok_or_else(|| ServiceError::validation("team_repo is required"))?,
            self.call_sign_repo
                .ok_or_else(|| ServiceError::validation("call_sign_repo is required"))?,
            self.stat_repo
                .ok_or_else(|| ServiceError::validation("stat_repo is required"))?,
            self.aggregate_repo
                .ok_or_else(|| ServiceError::validation("aggregate_repo is required"))?,
            self.activity_repo
                .ok_or_else(|| ServiceError::validation("activity_repo is required"))?,
            self.notifier
                .ok_or_else(|| ServiceError::validation("notifier is required"))?,
            self.snowflake_generator
                .ok_or_else(|| ServiceError::validation("snowflake_generator is required"))?,
        ))
    }
}
