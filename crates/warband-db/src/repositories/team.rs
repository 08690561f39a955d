//! PostgreSQL implementation of TeamRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use warband_core::entities::{WarRole, WarTeam};
use warband_core::error::DomainError;
use warband_core::traits::{RepoResult, TeamRepository, TeamSlot};
use warband_core::value_objects::Snowflake;

use crate::mappers::{slot_setup_to_json, team_from_model};
use crate::models::{TeamModel, TeamSlotModel, WarRoleModel};

use super::error::{map_db_error, map_unique_violation, team_not_found};

const TEAM_COLUMNS: &str = "id, war_id, name, kind, slot_setup, default_role_id";

/// PostgreSQL implementation of TeamRepository
#[derive(Clone)]
pub struct PgTeamRepository {
    pool: PgPool,
}

impl PgTeamRepository {
    /// Create a new PgTeamRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl From<TeamSlotModel> for TeamSlot {
    fn from(model: TeamSlotModel) -> Self {
        TeamSlot {
            team_id: Snowflake::new(model.team_id),
            slot: model.slot.unsigned_abs(),
            attendance_id: Snowflake::new(model.attendance_id),
        }
    }
}

#[async_trait]
impl TeamRepository for PgTeamRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<WarTeam>> {
        let result = sqlx::query_as::<_, TeamModel>(&format!(
            "SELECT {TEAM_COLUMNS} FROM war_teams WHERE id = $1"
        ))
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        result.map(team_from_model).transpose()
    }

    #[instrument(skip(self))]
    async fn find_by_war(&self, war_id: Snowflake) -> RepoResult<Vec<WarTeam>> {
        let results = sqlx::query_as::<_, TeamModel>(&format!(
            "SELECT {TEAM_COLUMNS} FROM war_teams WHERE war_id = $1 ORDER BY id"
        ))
        .bind(war_id.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        results.into_iter().map(team_from_model).collect()
    }

    #[instrument(skip(self, team))]
    async fn create(&self, team: &WarTeam) -> RepoResult<()> {
        sqlx::query(
            r"
            INSERT INTO war_teams (id, war_id, name, kind, slot_setup, default_role_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(team.id.into_inner())
        .bind(team.war_id.into_inner())
        .bind(&team.name)
        .bind(team.kind.as_i16())
        .bind(slot_setup_to_json(&team.slot_setup))
        .bind(team.default_role_id.into_inner())
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    #[instrument(skip(self, team))]
    async fn update(&self, team: &WarTeam) -> RepoResult<()> {
        let result = sqlx::query(
            r"
            UPDATE war_teams SET name = $2, kind = $3, slot_setup = $4, default_role_id = $5
            WHERE id = $1
            ",
        )
        .bind(team.id.into_inner())
        .bind(&team.name)
        .bind(team.kind.as_i16())
        .bind(slot_setup_to_json(&team.slot_setup))
        .bind(team.default_role_id.into_inner())
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(team_not_found(team.id));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: Snowflake) -> RepoResult<()> {
        // Slot assignments cascade via foreign key
        let result = sqlx::query("DELETE FROM war_teams WHERE id = $1")
            .bind(id.into_inner())
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(team_not_found(id));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_slots(&self, team_id: Snowflake) -> RepoResult<Vec<TeamSlot>> {
        let results = sqlx::query_as::<_, TeamSlotModel>(
            "SELECT team_id, slot, attendance_id FROM team_slots WHERE team_id = $1 ORDER BY slot",
        )
        .bind(team_id.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(results.into_iter().map(TeamSlot::from).collect())
    }

    #[instrument(skip(self))]
    async fn find_slots_by_war(&self, war_id: Snowflake) -> RepoResult<Vec<TeamSlot>> {
        let results = sqlx::query_as::<_, TeamSlotModel>(
            r"
            SELECT ts.team_id, ts.slot, ts.attendance_id
            FROM team_slots ts
            JOIN war_teams wt ON wt.id = ts.team_id
            WHERE wt.war_id = $1
            ORDER BY ts.team_id, ts.slot
            ",
        )
        .bind(war_id.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(results.into_iter().map(TeamSlot::from).collect())
    }

    #[instrument(skip(self))]
    async fn set_slot(&self, war_id: Snowflake, slot: TeamSlot) -> RepoResult<()> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        let team_in_war = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM war_teams WHERE id = $1 AND war_id = $2)",
        )
        .bind(slot.team_id.into_inner())
        .bind(war_id.into_inner())
        .fetch_one(&mut *tx)
        .await
        .map_err(map_db_error)?;

        if !team_in_war {
            return Err(team_not_found(slot.team_id));
        }

        // Move the attendee out of any slot they already hold in this war
        sqlx::query(
            r"
            DELETE FROM team_slots ts
            USING war_teams wt
            WHERE ts.team_id = wt.id AND wt.war_id = $1 AND ts.attendance_id = $2
            ",
        )
        .bind(war_id.into_inner())
        .bind(slot.attendance_id.into_inner())
        .execute(&mut *tx)
        .await
        .map_err(map_db_error)?;

        // Evict whoever currently holds the target slot
        sqlx::query("DELETE FROM team_slots WHERE team_id = $1 AND slot = $2")
            .bind(slot.team_id.into_inner())
            .bind(i16::try_from(slot.slot).unwrap_or(i16::MAX))
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;

        // The unique index on attendance_id backstops the eviction above
        sqlx::query(
            r"
            INSERT INTO team_slots (team_id, slot, attendance_id)
            VALUES ($1, $2, $3)
            ",
        )
        .bind(slot.team_id.into_inner())
        .bind(i16::try_from(slot.slot).unwrap_or(i16::MAX))
        .bind(slot.attendance_id.into_inner())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_unique_violation(e, || DomainError::AttendanceExists))?;

        tx.commit().await.map_err(map_db_error)
    }

    #[instrument(skip(self))]
    async fn clear_slot(&self, team_id: Snowflake, slot: u16) -> RepoResult<()> {
        sqlx::query("DELETE FROM team_slots WHERE team_id = $1 AND slot = $2")
            .bind(team_id.into_inner())
            .bind(i16::try_from(slot).unwrap_or(i16::MAX))
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_role(&self, id: Snowflake) -> RepoResult<Option<WarRole>> {
        let result =
            sqlx::query_as::<_, WarRoleModel>("SELECT id, name FROM war_roles WHERE id = $1")
                .bind(id.into_inner())
                .fetch_optional(&self.pool)
                .await
                .map_err(map_db_error)?;

        Ok(result.map(WarRole::from))
    }

    #[instrument(skip(self))]
    async fn find_roles(&self) -> RepoResult<Vec<WarRole>> {
        let results =
            sqlx::query_as::<_, WarRoleModel>("SELECT id, name FROM war_roles ORDER BY name")
                .fetch_all(&self.pool)
                .await
                .map_err(map_db_error)?;

        Ok(results.into_iter().map(WarRole::from).collect())
    }

    #[instrument(skip(self, role))]
    async fn create_role(&self, role: &WarRole) -> RepoResult<()> {
        sqlx::query("INSERT INTO war_roles (id, name) VALUES ($1, $2)")
            .bind(role.id.into_inner())
            .bind(&role.name)
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(())
    }
}
