use assess_core::model::{Role, Student};

use super::SqliteRepository;
use super::mapping::{conn, map_profile_row};
use crate::repository::{RosterRepository, StorageError};

impl SqliteRepository {
    /// Insert or replace a profile.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write fails.
    pub async fn upsert_profile(&self, student: &Student) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO profiles (id, first_name, last_name, role)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
                first_name = excluded.first_name,
                last_name = excluded.last_name,
                role = excluded.role
            ",
        )
        .bind(student.id.to_string())
        .bind(student.first_name.as_deref())
        .bind(student.last_name.as_deref())
        .bind(student.role.as_str())
        .execute(&self.pool)
        .await
        .map_err(conn)?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl RosterRepository for SqliteRepository {
    async fn students_with_role(&self, role: Role) -> Result<Vec<Student>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, first_name, last_name, role
            FROM profiles
            WHERE role = ?1
            ORDER BY rowid ASC
            ",
        )
        .bind(role.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_profile_row).collect()
    }
}
