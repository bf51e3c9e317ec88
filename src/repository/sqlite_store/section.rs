use super::SqlitePublishingStore;
use crate::domain::{LocalizedText, Section};
use crate::repository::error::RepositoryResult;
use crate::repository::publishing_store::SectionRepository;
use rusqlite::{params, OptionalExtension};

impl SectionRepository for SqlitePublishingStore {
    fn find_section_by_title(
        &self,
        context_id: i64,
        title: &str,
        locale: &str,
    ) -> RepositoryResult<Option<Section>> {
        let conn = self.get_conn()?;
        let section = conn
            .query_row(
                r#"SELECT s.section_id, s.context_id, s.title_json, s.abbrev_json, s.policy_json,
                          s.abstracts_not_required, s.meta_indexed, s.meta_reviewed,
                          s.editor_restricted, s.hide_title, s.hide_author
                   FROM sections s
                   JOIN section_titles t ON t.section_id = s.section_id
                   WHERE s.context_id = ?1 AND t.locale = ?2 AND t.title = ?3
                   ORDER BY s.section_id
                   LIMIT 1"#,
                params![context_id, locale, title],
                |row| {
                    Ok(Section {
                        id: row.get(0)?,
                        context_id: row.get(1)?,
                        title: LocalizedText::from_json(&row.get::<_, String>(2)?),
                        abbrev: LocalizedText::from_json(&row.get::<_, String>(3)?),
                        policy: LocalizedText::from_json(&row.get::<_, String>(4)?),
                        abstracts_not_required: row.get(5)?,
                        meta_indexed: row.get(6)?,
                        meta_reviewed: row.get(7)?,
                        editor_restricted: row.get(8)?,
                        hide_title: row.get(9)?,
                        hide_author: row.get(10)?,
                    })
                },
            )
            .optional()?;
        Ok(section)
    }

    fn insert_section(&self, section: &Section) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        tx.execute(
            r#"INSERT INTO sections (
                context_id, title_json, abbrev_json, policy_json, abstracts_not_required,
                meta_indexed, meta_reviewed, editor_restricted, hide_title, hide_author
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"#,
            params![
                section.context_id,
                section.title.to_json(),
                section.abbrev.to_json(),
                section.policy.to_json(),
                section.abstracts_not_required,
                section.meta_indexed,
                section.meta_reviewed,
                section.editor_restricted,
                section.hide_title,
                section.hide_author,
            ],
        )?;
        let section_id = tx.last_insert_rowid();
        for (locale, title) in section.title.iter() {
            tx.execute(
                "INSERT INTO section_titles (section_id, locale, title) VALUES (?1, ?2, ?3)",
                params![section_id, locale, title],
            )?;
        }
        tx.commit()?;
        Ok(section_id)
    }

    fn delete_section(&self, section_id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute("DELETE FROM sections WHERE section_id = ?1", params![section_id])?;
        Ok(())
    }

    fn has_custom_section_order(&self, issue_id: i64, section_id: i64) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let found: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM custom_section_orders WHERE issue_id = ?1 AND section_id = ?2",
                params![issue_id, section_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn insert_custom_section_order(
        &self,
        issue_id: i64,
        section_id: i64,
        seq: i64,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO custom_section_orders (issue_id, section_id, seq) VALUES (?1, ?2, ?3)",
            params![issue_id, section_id, seq],
        )?;
        Ok(())
    }
}
