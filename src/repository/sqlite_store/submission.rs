use super::{fmt_datetime, parse_datetime, SqlitePublishingStore};
use crate::domain::{
    AccessStatus, Author, CoverImage, Galley, LocalizedText, Publication, PublicationStatus,
    Submission, WorkflowStage,
};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::publishing_store::SubmissionRepository;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use std::collections::BTreeMap;

// ==========================================
// 行映射
// ==========================================

fn map_submission(row: &Row) -> rusqlite::Result<Submission> {
    Ok(Submission {
        id: row.get(0)?,
        context_id: row.get(1)?,
        section_id: row.get(2)?,
        status: PublicationStatus::from_db_str(&row.get::<_, String>(3)?),
        stage: WorkflowStage::from_db_str(&row.get::<_, String>(4)?),
        locale: row.get(5)?,
        date_submitted: parse_datetime(&row.get::<_, String>(6)?)?,
        current_publication_id: row.get(7)?,
    })
}

const SUBMISSION_COLUMNS: &str = r#"submission_id, context_id, section_id, status, stage, locale,
    date_submitted, current_publication_id"#;

fn map_publication(row: &Row) -> rusqlite::Result<Publication> {
    let cover_image: BTreeMap<String, CoverImage> =
        serde_json::from_str(&row.get::<_, String>(20)?).unwrap_or_default();
    Ok(Publication {
        id: row.get(0)?,
        submission_id: row.get(1)?,
        status: PublicationStatus::from_db_str(&row.get::<_, String>(2)?),
        version: row.get(3)?,
        seq: row.get(4)?,
        access_status: AccessStatus::from_db_str(&row.get::<_, String>(5)?),
        date_published: parse_datetime(&row.get::<_, String>(6)?)?,
        section_id: row.get(7)?,
        issue_id: row.get(8)?,
        pages: row.get(9)?,
        title: LocalizedText::from_json(&row.get::<_, String>(10)?),
        subtitle: LocalizedText::from_json(&row.get::<_, String>(11)?),
        abstract_text: LocalizedText::from_json(&row.get::<_, String>(12)?),
        locale: row.get(13)?,
        language: row.get(14)?,
        copyright_holder: LocalizedText::from_json(&row.get::<_, String>(15)?),
        copyright_notice: LocalizedText::from_json(&row.get::<_, String>(16)?),
        copyright_year: row.get(17)?,
        license_url: row.get(18)?,
        citations_raw: row.get(19)?,
        cover_image,
        pub_ids: BTreeMap::new(),
        primary_contact_id: row.get(21)?,
    })
}

fn map_galley(row: &Row) -> rusqlite::Result<Galley> {
    Ok(Galley {
        id: row.get(0)?,
        publication_id: row.get(1)?,
        name: LocalizedText::from_json(&row.get::<_, String>(2)?),
        seq: row.get(3)?,
        label: row.get(4)?,
        locale: row.get(5)?,
        submission_file_id: row.get(6)?,
    })
}

fn map_author(row: &Row) -> rusqlite::Result<Author> {
    Ok(Author {
        id: row.get(0)?,
        publication_id: row.get(1)?,
        given_name: LocalizedText::from_json(&row.get::<_, String>(2)?),
        family_name: LocalizedText::from_json(&row.get::<_, String>(3)?),
        affiliation: LocalizedText::from_json(&row.get::<_, String>(4)?),
        email: row.get(5)?,
        url: row.get(6)?,
        seq: row.get(7)?,
        include_in_browse: row.get(8)?,
        primary_contact: row.get(9)?,
        user_group_id: row.get(10)?,
    })
}

fn cover_image_json(publication: &Publication) -> RepositoryResult<String> {
    serde_json::to_string(&publication.cover_image).map_err(|e| RepositoryError::FieldValueError {
        field: "cover_image".to_string(),
        message: e.to_string(),
    })
}

fn write_pub_ids(tx: &Transaction, publication: &Publication) -> rusqlite::Result<()> {
    tx.execute(
        "DELETE FROM publication_pub_ids WHERE publication_id = ?1",
        params![publication.id],
    )?;
    for (pub_id_type, value) in &publication.pub_ids {
        tx.execute(
            "INSERT INTO publication_pub_ids (publication_id, pub_id_type, value) VALUES (?1, ?2, ?3)",
            params![publication.id, pub_id_type, value],
        )?;
    }
    Ok(())
}

// ==========================================
// 查询辅助（供 SqlitePublishingStore 公共方法使用）
// ==========================================

pub(super) fn find_submission(
    conn: &Connection,
    submission_id: i64,
) -> RepositoryResult<Option<Submission>> {
    let sql = format!(
        "SELECT {} FROM submissions WHERE submission_id = ?1",
        SUBMISSION_COLUMNS
    );
    Ok(conn
        .query_row(&sql, params![submission_id], map_submission)
        .optional()?)
}

pub(super) fn list_submissions(
    conn: &Connection,
    context_id: i64,
) -> RepositoryResult<Vec<Submission>> {
    let sql = format!(
        "SELECT {} FROM submissions WHERE context_id = ?1 ORDER BY submission_id",
        SUBMISSION_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![context_id], map_submission)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub(super) fn list_keywords(
    conn: &Connection,
    publication_id: i64,
    locale: &str,
) -> RepositoryResult<Vec<String>> {
    let mut stmt = conn.prepare(
        r#"SELECT keyword FROM publication_keywords
           WHERE publication_id = ?1 AND locale = ?2 ORDER BY seq"#,
    )?;
    let rows = stmt
        .query_map(params![publication_id, locale], |row| row.get(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub(super) fn list_galleys(conn: &Connection, publication_id: i64) -> RepositoryResult<Vec<Galley>> {
    let mut stmt = conn.prepare(
        r#"SELECT galley_id, publication_id, name_json, seq, label, locale, submission_file_id
           FROM galleys WHERE publication_id = ?1 ORDER BY seq"#,
    )?;
    let rows = stmt
        .query_map(params![publication_id], map_galley)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ==========================================
// SubmissionRepository 实现
// ==========================================

impl SubmissionRepository for SqlitePublishingStore {
    fn submission_exists_by_pub_id(
        &self,
        context_id: i64,
        pub_id_type: &str,
        value: &str,
    ) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let found: Option<i64> = conn
            .query_row(
                r#"SELECT s.submission_id
                   FROM publication_pub_ids i
                   JOIN publications p ON p.publication_id = i.publication_id
                   JOIN submissions s ON s.submission_id = p.submission_id
                   WHERE s.context_id = ?1 AND i.pub_id_type = ?2 AND i.value = ?3
                   LIMIT 1"#,
                params![context_id, pub_id_type, value],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn insert_submission(&self, submission: &Submission) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO submissions (
                context_id, section_id, status, stage, locale, date_submitted, current_publication_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"#,
            params![
                submission.context_id,
                submission.section_id,
                submission.status.to_db_str(),
                submission.stage.to_db_str(),
                submission.locale,
                fmt_datetime(&submission.date_submitted),
                submission.current_publication_id,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn update_current_publication(
        &self,
        submission_id: i64,
        publication_id: i64,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let changed = conn.execute(
            "UPDATE submissions SET current_publication_id = ?1 WHERE submission_id = ?2",
            params![publication_id, submission_id],
        )?;
        if changed == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Submission".to_string(),
                id: submission_id.to_string(),
            });
        }
        Ok(())
    }

    fn delete_submission(&self, submission_id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "DELETE FROM submissions WHERE submission_id = ?1",
            params![submission_id],
        )?;

        // 清理已复制的物理文件
        let dir = self.submission_dir(submission_id);
        if dir.exists() {
            if let Err(e) = std::fs::remove_dir_all(&dir) {
                tracing::warn!("提交文件目录清理失败: {} ({})", dir.display(), e);
            }
        }
        Ok(())
    }

    fn insert_publication(&self, publication: &Publication) -> RepositoryResult<i64> {
        let cover_json = cover_image_json(publication)?;
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        tx.execute(
            r#"INSERT INTO publications (
                submission_id, status, version, seq, access_status, date_published,
                section_id, issue_id, pages, title_json, subtitle_json, abstract_json,
                locale, language, copyright_holder_json, copyright_notice_json,
                copyright_year, license_url, citations_raw, cover_image_json, primary_contact_id
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12,
                ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21
            )"#,
            params![
                publication.submission_id,
                publication.status.to_db_str(),
                publication.version,
                publication.seq,
                publication.access_status.to_db_str(),
                fmt_datetime(&publication.date_published),
                publication.section_id,
                publication.issue_id,
                publication.pages,
                publication.title.to_json(),
                publication.subtitle.to_json(),
                publication.abstract_text.to_json(),
                publication.locale,
                publication.language,
                publication.copyright_holder.to_json(),
                publication.copyright_notice.to_json(),
                publication.copyright_year,
                publication.license_url,
                publication.citations_raw,
                cover_json,
                publication.primary_contact_id,
            ],
        )?;
        let publication_id = tx.last_insert_rowid();
        let stored = Publication {
            id: publication_id,
            ..publication.clone()
        };
        write_pub_ids(&tx, &stored)?;
        tx.commit()?;
        Ok(publication_id)
    }

    fn update_publication(&self, publication: &Publication) -> RepositoryResult<()> {
        let cover_json = cover_image_json(publication)?;
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        let changed = tx.execute(
            r#"UPDATE publications SET
                status = ?2, version = ?3, seq = ?4, access_status = ?5, date_published = ?6,
                section_id = ?7, issue_id = ?8, pages = ?9, title_json = ?10,
                subtitle_json = ?11, abstract_json = ?12, locale = ?13, language = ?14,
                copyright_holder_json = ?15, copyright_notice_json = ?16, copyright_year = ?17,
                license_url = ?18, citations_raw = ?19, cover_image_json = ?20,
                primary_contact_id = ?21
               WHERE publication_id = ?1"#,
            params![
                publication.id,
                publication.status.to_db_str(),
                publication.version,
                publication.seq,
                publication.access_status.to_db_str(),
                fmt_datetime(&publication.date_published),
                publication.section_id,
                publication.issue_id,
                publication.pages,
                publication.title.to_json(),
                publication.subtitle.to_json(),
                publication.abstract_text.to_json(),
                publication.locale,
                publication.language,
                publication.copyright_holder.to_json(),
                publication.copyright_notice.to_json(),
                publication.copyright_year,
                publication.license_url,
                publication.citations_raw,
                cover_json,
                publication.primary_contact_id,
            ],
        )?;
        if changed == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Publication".to_string(),
                id: publication.id.to_string(),
            });
        }
        write_pub_ids(&tx, publication)?;
        tx.commit()?;
        Ok(())
    }

    fn find_publication(&self, publication_id: i64) -> RepositoryResult<Option<Publication>> {
        let conn = self.get_conn()?;
        let publication = conn
            .query_row(
                r#"SELECT publication_id, submission_id, status, version, seq, access_status,
                          date_published, section_id, issue_id, pages, title_json, subtitle_json,
                          abstract_json, locale, language, copyright_holder_json,
                          copyright_notice_json, copyright_year, license_url, citations_raw,
                          cover_image_json, primary_contact_id
                   FROM publications WHERE publication_id = ?1"#,
                params![publication_id],
                map_publication,
            )
            .optional()?;

        let Some(mut publication) = publication else {
            return Ok(None);
        };

        let mut stmt = conn.prepare(
            "SELECT pub_id_type, value FROM publication_pub_ids WHERE publication_id = ?1",
        )?;
        let pub_ids = stmt
            .query_map(params![publication_id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<BTreeMap<_, _>, _>>()?;
        publication.pub_ids = pub_ids;
        Ok(Some(publication))
    }

    fn insert_author(&self, author: &Author) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO authors (
                publication_id, given_name_json, family_name_json, affiliation_json, email,
                url, seq, include_in_browse, primary_contact, user_group_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"#,
            params![
                author.publication_id,
                author.given_name.to_json(),
                author.family_name.to_json(),
                author.affiliation.to_json(),
                author.email,
                author.url,
                author.seq,
                author.include_in_browse,
                author.primary_contact,
                author.user_group_id,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn list_authors(&self, publication_id: i64) -> RepositoryResult<Vec<Author>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT author_id, publication_id, given_name_json, family_name_json,
                      affiliation_json, email, url, seq, include_in_browse, primary_contact,
                      user_group_id
               FROM authors WHERE publication_id = ?1 ORDER BY seq, author_id"#,
        )?;
        let rows = stmt
            .query_map(params![publication_id], map_author)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn replace_keywords(
        &self,
        publication_id: i64,
        locale: &str,
        keywords: &[String],
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        tx.execute(
            "DELETE FROM publication_keywords WHERE publication_id = ?1 AND locale = ?2",
            params![publication_id, locale],
        )?;
        for (seq, keyword) in keywords.iter().enumerate() {
            tx.execute(
                r#"INSERT INTO publication_keywords (publication_id, locale, seq, keyword)
                   VALUES (?1, ?2, ?3, ?4)"#,
                params![publication_id, locale, seq as i64 + 1, keyword],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn insert_galley(&self, galley: &Galley) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO galleys (publication_id, name_json, seq, label, locale, submission_file_id)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6)"#,
            params![
                galley.publication_id,
                galley.name.to_json(),
                galley.seq,
                galley.label,
                galley.locale,
                galley.submission_file_id,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn update_galley_file(&self, galley_id: i64, submission_file_id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "UPDATE galleys SET submission_file_id = ?1 WHERE galley_id = ?2",
            params![submission_file_id, galley_id],
        )?;
        Ok(())
    }

    fn assign_stage(
        &self,
        submission_id: i64,
        user_group_id: i64,
        user_id: i64,
        stage: WorkflowStage,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO stage_assignments (submission_id, user_group_id, user_id, stage)
               VALUES (?1, ?2, ?3, ?4)"#,
            params![submission_id, user_group_id, user_id, stage.to_db_str()],
        )?;
        Ok(())
    }
}
