use super::{fmt_datetime, parse_datetime, SqlitePublishingStore};
use crate::domain::{AccessStatus, Issue, LocalizedText};
use crate::repository::error::RepositoryResult;
use crate::repository::publishing_store::IssueRepository;
use rusqlite::{params, OptionalExtension, Row};

const ISSUE_COLUMNS: &str = r#"i.issue_id, i.context_id, i.volume, i.number, i.year, i.published,
    i.is_current, i.date_published, i.access_status, i.show_volume, i.show_number,
    i.show_year, i.show_title, i.cover_image_json"#;

fn map_issue(row: &Row) -> rusqlite::Result<Issue> {
    Ok(Issue {
        id: row.get(0)?,
        context_id: row.get(1)?,
        volume: row.get(2)?,
        number: row.get(3)?,
        year: row.get(4)?,
        published: row.get(5)?,
        current: row.get(6)?,
        date_published: parse_datetime(&row.get::<_, String>(7)?)?,
        access_status: AccessStatus::from_db_str(&row.get::<_, String>(8)?),
        show_volume: row.get(9)?,
        show_number: row.get(10)?,
        show_year: row.get(11)?,
        show_title: row.get(12)?,
        cover_image: LocalizedText::from_json(&row.get::<_, String>(13)?),
    })
}

impl IssueRepository for SqlitePublishingStore {
    fn find_issue(
        &self,
        context_id: i64,
        volume: &str,
        number: &str,
    ) -> RepositoryResult<Option<Issue>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM issues i WHERE i.context_id = ?1 AND i.volume = ?2 AND i.number = ?3",
            ISSUE_COLUMNS
        );
        let issue = conn
            .query_row(&sql, params![context_id, volume, number], map_issue)
            .optional()?;
        Ok(issue)
    }

    fn insert_issue(&self, issue: &Issue) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO issues (
                context_id, volume, number, year, published, is_current, date_published,
                access_status, show_volume, show_number, show_year, show_title, cover_image_json
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"#,
            params![
                issue.context_id,
                issue.volume,
                issue.number,
                issue.year,
                issue.published,
                issue.current,
                fmt_datetime(&issue.date_published),
                issue.access_status.to_db_str(),
                issue.show_volume,
                issue.show_number,
                issue.show_year,
                issue.show_title,
                issue.cover_image.to_json(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn update_issue_cover(&self, issue_id: i64, cover: &LocalizedText) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "UPDATE issues SET cover_image_json = ?1 WHERE issue_id = ?2",
            params![cover.to_json(), issue_id],
        )?;
        Ok(())
    }

    fn delete_issue(&self, issue_id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        tx.execute(
            "UPDATE journals SET current_issue_id = NULL WHERE current_issue_id = ?1",
            params![issue_id],
        )?;
        tx.execute("DELETE FROM issues WHERE issue_id = ?1", params![issue_id])?;
        tx.commit()?;
        Ok(())
    }

    fn list_published_issues(&self, context_id: i64) -> RepositoryResult<Vec<Issue>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"SELECT {} FROM issues i
               LEFT JOIN custom_issue_orders o ON o.issue_id = i.issue_id
               WHERE i.context_id = ?1 AND i.published = 1
               ORDER BY o.seq IS NULL, o.seq, i.issue_id"#,
            ISSUE_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let issues = stmt
            .query_map(params![context_id], map_issue)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(issues)
    }

    fn delete_custom_issue_orders(&self, context_id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "DELETE FROM custom_issue_orders WHERE context_id = ?1",
            params![context_id],
        )?;
        Ok(())
    }

    fn insert_custom_issue_order(
        &self,
        context_id: i64,
        issue_id: i64,
        seq: i64,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO custom_issue_orders (issue_id, context_id, seq) VALUES (?1, ?2, ?3)",
            params![issue_id, context_id, seq],
        )?;
        Ok(())
    }

    fn set_current_issue(&self, context_id: i64, issue_id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        tx.execute(
            "UPDATE issues SET is_current = (issue_id = ?2) WHERE context_id = ?1",
            params![context_id, issue_id],
        )?;
        tx.execute(
            "UPDATE journals SET current_issue_id = ?2 WHERE journal_id = ?1",
            params![context_id, issue_id],
        )?;
        tx.commit()?;
        Ok(())
    }
}
