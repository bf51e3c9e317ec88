use super::SqlitePublishingStore;
use crate::domain::{Genre, Journal, LocalizedText, Role, User, WorkflowStage};
use crate::repository::error::RepositoryResult;
use crate::repository::publishing_store::ContextRepository;
use rusqlite::{params, OptionalExtension};

impl ContextRepository for SqlitePublishingStore {
    fn find_journal_by_path(&self, path: &str) -> RepositoryResult<Option<Journal>> {
        let conn = self.get_conn()?;
        let journal = conn
            .query_row(
                "SELECT journal_id, path, name_json, primary_locale FROM journals WHERE path = ?1",
                params![path],
                |row| {
                    Ok(Journal {
                        id: row.get(0)?,
                        path: row.get(1)?,
                        name: LocalizedText::from_json(&row.get::<_, String>(2)?),
                        primary_locale: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(journal)
    }

    fn find_user_by_username(&self, username: &str) -> RepositoryResult<Option<User>> {
        let conn = self.get_conn()?;
        let user = conn
            .query_row(
                "SELECT user_id, username, email FROM users WHERE username = ?1",
                params![username],
                |row| {
                    Ok(User {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        email: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(user)
    }

    fn find_user_group_for_stage(
        &self,
        context_id: i64,
        role: Role,
        stage: WorkflowStage,
    ) -> RepositoryResult<Option<i64>> {
        let conn = self.get_conn()?;
        let group_id = conn
            .query_row(
                r#"SELECT g.user_group_id
                   FROM user_groups g
                   JOIN user_group_stages s ON s.user_group_id = g.user_group_id
                   WHERE g.context_id = ?1 AND g.role = ?2 AND s.stage = ?3
                   ORDER BY g.user_group_id
                   LIMIT 1"#,
                params![context_id, role.to_db_str(), stage.to_db_str()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(group_id)
    }

    fn find_first_user_group(&self, context_id: i64, role: Role) -> RepositoryResult<Option<i64>> {
        let conn = self.get_conn()?;
        let group_id = conn
            .query_row(
                r#"SELECT user_group_id FROM user_groups
                   WHERE context_id = ?1 AND role = ?2
                   ORDER BY user_group_id
                   LIMIT 1"#,
                params![context_id, role.to_db_str()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(group_id)
    }

    fn find_genre_by_key(&self, context_id: i64, key: &str) -> RepositoryResult<Option<Genre>> {
        let conn = self.get_conn()?;
        let genre = conn
            .query_row(
                "SELECT genre_id, context_id, genre_key FROM genres WHERE context_id = ?1 AND genre_key = ?2",
                params![context_id, key],
                |row| {
                    Ok(Genre {
                        id: row.get(0)?,
                        context_id: row.get(1)?,
                        key: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(genre)
    }
}
