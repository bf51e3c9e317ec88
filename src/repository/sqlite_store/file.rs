use super::SqlitePublishingStore;
use crate::domain::{FileAssoc, FileStage, LocalizedText, SubmissionFile};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::publishing_store::FileRepository;
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use uuid::Uuid;

impl SqlitePublishingStore {
    /// 提交文件目录: {files_dir}/submissions/{submission_id}
    pub(super) fn submission_dir(&self, submission_id: i64) -> PathBuf {
        self.files_dir
            .join("submissions")
            .join(submission_id.to_string())
    }

    /// 期刊公共文件目录: {files_dir}/public/journals/{context_id}
    pub fn public_dir(&self, context_id: i64) -> PathBuf {
        self.files_dir
            .join("public")
            .join("journals")
            .join(context_id.to_string())
    }

    /// 为提交生成新的存储文件名（uuid + 原扩展名）
    fn allocate_stored_path(&self, submission_id: i64, extension: &str) -> RepositoryResult<(PathBuf, String)> {
        let dir = self.submission_dir(submission_id);
        std::fs::create_dir_all(&dir).map_err(|e| RepositoryError::file_storage(&dir, e))?;

        let file_name = if extension.is_empty() {
            Uuid::new_v4().to_string()
        } else {
            format!("{}.{}", Uuid::new_v4(), extension.to_lowercase())
        };
        let relative = format!("submissions/{}/{}", submission_id, file_name);
        Ok((dir.join(file_name), relative))
    }

    fn insert_submission_file_row(
        &self,
        file: &SubmissionFile,
        stored_path: &str,
        file_size: u64,
    ) -> RepositoryResult<i64> {
        let (assoc_type, assoc_id) = match file.assoc {
            Some(assoc) => {
                let (kind, id) = assoc.to_db_parts();
                (Some(kind), Some(id))
            }
            None => (None, None),
        };
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO submission_files (
                submission_id, stored_path, genre_id, file_stage, uploader_user_id,
                assoc_type, assoc_id, name_json, file_type, file_size
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"#,
            params![
                file.submission_id,
                stored_path,
                file.genre_id,
                file.file_stage.to_db_str(),
                file.uploader_user_id,
                assoc_type,
                assoc_id,
                file.name.to_json(),
                file.file_type,
                file_size as i64,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }
}

pub(super) fn list_submission_files(
    conn: &Connection,
    submission_id: i64,
) -> RepositoryResult<Vec<SubmissionFile>> {
    let mut stmt = conn.prepare(
        r#"SELECT submission_file_id, submission_id, stored_path, genre_id, file_stage,
                  uploader_user_id, assoc_type, assoc_id, name_json, file_type, file_size
           FROM submission_files WHERE submission_id = ?1 ORDER BY submission_file_id"#,
    )?;
    let rows = stmt
        .query_map(params![submission_id], |row| {
            let assoc_type: Option<String> = row.get(6)?;
            let assoc_id: Option<i64> = row.get(7)?;
            Ok(SubmissionFile {
                id: row.get(0)?,
                submission_id: row.get(1)?,
                stored_path: row.get(2)?,
                genre_id: row.get(3)?,
                file_stage: FileStage::from_db_str(&row.get::<_, String>(4)?),
                uploader_user_id: row.get(5)?,
                assoc: match (assoc_type, assoc_id) {
                    (Some(kind), Some(id)) => FileAssoc::from_db_parts(&kind, id),
                    _ => None,
                },
                name: LocalizedText::from_json(&row.get::<_, String>(8)?),
                file_type: row.get(9)?,
                file_size: row.get::<_, i64>(10)?.max(0) as u64,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_string()
}

impl FileRepository for SqlitePublishingStore {
    fn store_submission_file(
        &self,
        source: &Path,
        file: &SubmissionFile,
    ) -> RepositoryResult<i64> {
        let (target, relative) =
            self.allocate_stored_path(file.submission_id, &extension_of(source))?;
        let file_size =
            std::fs::copy(source, &target).map_err(|e| RepositoryError::file_storage(source, e))?;
        self.insert_submission_file_row(file, &relative, file_size)
    }

    fn store_submission_file_content(
        &self,
        content: &[u8],
        extension: &str,
        file: &SubmissionFile,
    ) -> RepositoryResult<i64> {
        let (target, relative) = self.allocate_stored_path(file.submission_id, extension)?;
        std::fs::write(&target, content).map_err(|e| RepositoryError::file_storage(&target, e))?;
        self.insert_submission_file_row(file, &relative, content.len() as u64)
    }

    fn store_public_file(
        &self,
        context_id: i64,
        source: &Path,
        target_name: &str,
    ) -> RepositoryResult<String> {
        let dir = self.public_dir(context_id);
        std::fs::create_dir_all(&dir).map_err(|e| RepositoryError::file_storage(&dir, e))?;
        let target = dir.join(target_name);
        std::fs::copy(source, &target).map_err(|e| RepositoryError::file_storage(source, e))?;
        Ok(target_name.to_string())
    }

    fn delete_public_file(&self, context_id: i64, name: &str) -> RepositoryResult<()> {
        let target = self.public_dir(context_id).join(name);
        match std::fs::remove_file(&target) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(RepositoryError::file_storage(&target, e)),
        }
    }
}
