//! PostgreSQL implementation of AttendanceRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use warband_core::entities::WarAttendance;
use warband_core::traits::{AttendanceRepository, RepoResult};
use warband_core::value_objects::Snowflake;

use crate::mappers::attendance_from_model;
use crate::models::AttendanceModel;

use super::error::{attendance_not_found, map_db_error, map_unique_violation};

const ATTENDANCE_COLUMNS: &str = "id, war_id, user_profile_id, character_id, status, note";

/// PostgreSQL implementation of AttendanceRepository
#[derive(Clone)]
pub struct PgAttendanceRepository {
    pool: PgPool,
}

impl PgAttendanceRepository {
    /// Create a new PgAttendanceRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AttendanceRepository for PgAttendanceRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<WarAttendance>> {
        let result = sqlx::query_as::<_, AttendanceModel>(&format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM war_attendances WHERE id = $1"
        ))
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        result.map(attendance_from_model).transpose()
    }

    #[instrument(skip(self))]
    async fn find_by_war(&self, war_id: Snowflake) -> RepoResult<Vec<WarAttendance>> {
        let results = sqlx::query_as::<_, AttendanceModel>(&format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM war_attendances WHERE war_id = $1 ORDER BY id"
        ))
        .bind(war_id.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        results.into_iter().map(attendance_from_model).collect()
    }

    #[instrument(skip(self))]
    async fn find_by_war_and_profile(
        &self,
        war_id: Snowflake,
        profile_id: Snowflake,
    ) -> RepoResult<Option<WarAttendance>> {
        let result = sqlx::query_as::<_, AttendanceModel>(&format!(
            r"
            SELECT {ATTENDANCE_COLUMNS} FROM war_attendances
            WHERE war_id = $1 AND user_profile_id = $2
            "
        ))
        .bind(war_id.into_inner())
        .bind(profile_id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        result.map(attendance_from_model).transpose()
    }

    #[instrument(skip(self))]
    async fn exists_for_war(&self, war_id: Snowflake) -> RepoResult<bool> {
        let result = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM war_attendances WHERE war_id = $1)",
        )
        .bind(war_id.into_inner())
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result)
    }

    #[instrument(skip(self, attendance))]
    async fn create(&self, attendance: &WarAttendance) -> RepoResult<()> {
        sqlx::query(
            r"
            INSERT INTO war_attendances (id, war_id, user_profile_id, character_id, status, note)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(attendance.id.into_inner())
        .bind(attendance.war_id.into_inner())
        .bind(attendance.user_profile_id.into_inner())
        .bind(attendance.character_id.map(Snowflake::into_inner))
        .bind(attendance.status.as_i16())
        .bind(&attendance.note)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, || warband_core::DomainError::AttendanceExists))?;

        Ok(())
    }

    #[instrument(skip(self, rows), fields(count = rows.len()))]
    async fn create_many(&self, rows: &[WarAttendance]) -> RepoResult<()> {
        if rows.is_empty() {
            return Ok(());
        }

        let ids: Vec<i64> = rows.iter().map(|r| r.id.into_inner()).collect();
        let war_ids: Vec<i64> = rows.iter().map(|r| r.war_id.into_inner()).collect();
        let profile_ids: Vec<i64> = rows.iter().map(|r| r.user_profile_id.into_inner()).collect();
        let character_ids: Vec<Option<i64>> = rows
            .iter()
            .map(|r| r.character_id.map(Snowflake::into_inner))
            .collect();
        let statuses: Vec<i16> = rows.iter().map(|r| r.status.as_i16()).collect();
        let notes: Vec<Option<String>> = rows.iter().map(|r| r.note.clone()).collect();

        sqlx::query(
            r"
            INSERT INTO war_attendances (id, war_id, user_profile_id, character_id, status, note)
            SELECT * FROM UNNEST($1::bigint[], $2::bigint[], $3::bigint[], $4::bigint[],
                $5::smallint[], $6::text[])
            ",
        )
        .bind(&ids)
        .bind(&war_ids)
        .bind(&profile_ids)
        .bind(&character_ids)
        .bind(&statuses)
        .bind(&notes)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, || warband_core::DomainError::AttendanceExists))?;

        Ok(())
    }

    #[instrument(skip(self, attendance))]
    async fn update(&self, attendance: &WarAttendance) -> RepoResult<()> {
        let result = sqlx::query(
            r"
            UPDATE war_attendances SET character_id = $2, status = $3, note = $4
            WHERE id = $1
            ",
        )
        .bind(attendance.id.into_inner())
        .bind(attendance.character_id.map(Snowflake::into_inner))
        .bind(attendance.status.as_i16())
        .bind(&attendance.note)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(attendance_not_found(attendance.id));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_finalized_by_guild_profile(
        &self,
        guild_id: Snowflake,
        profile_id: Snowflake,
    ) -> RepoResult<Vec<WarAttendance>> {
        let results = sqlx::query_as::<_, AttendanceModel>(
            r"
            SELECT wa.id, wa.war_id, wa.user_profile_id, wa.character_id, wa.status, wa.note
            FROM war_attendances wa
            JOIN wars w ON w.id = wa.war_id
            WHERE w.guild_id = $1 AND wa.user_profile_id = $2 AND w.outcome IS NOT NULL
            ORDER BY wa.war_id
            ",
        )
        .bind(guild_id.into_inner())
        .bind(profile_id.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        results.into_iter().map(attendance_from_model).collect()
    }

    #[instrument(skip(self))]
    async fn find_finalized_by_profile(
        &self,
        profile_id: Snowflake,
    ) -> RepoResult<Vec<WarAttendance>> {
        let results = sqlx::query_as::<_, AttendanceModel>(
            r"
            SELECT wa.id, wa.war_id, wa.user_profile_id, wa.character_id, wa.status, wa.note
            FROM war_attendances wa
            JOIN wars w ON w.id = wa.war_id
            WHERE wa.user_profile_id = $1 AND w.outcome IS NOT NULL
            ORDER BY wa.war_id
            ",
        )
        .bind(profile_id.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        results.into_iter().map(attendance_from_model).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PgAttendanceRepository>();
    }
}
