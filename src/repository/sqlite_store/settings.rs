use super::SqlitePublishingStore;
use crate::config::settings::ImportSettings;
use crate::repository::error::RepositoryResult;
use rusqlite::{params, OptionalExtension};

impl ImportSettings for SqlitePublishingStore {
    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_setting(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::config_keys;
    use tempfile::TempDir;

    #[test]
    fn test_setting_upsert_and_read() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("store.db");
        let store =
            SqlitePublishingStore::new(db_path.to_str().unwrap(), dir.path().join("files")).unwrap();
        store.init_schema().unwrap();

        assert_eq!(store.get_setting(config_keys::PARSERS).unwrap(), None);
        assert_eq!(store.get_parser_names().unwrap(), vec!["aplusplus", "jats"]);

        store.set_setting(config_keys::PARSERS, "jats").unwrap();
        store.set_setting(config_keys::PARSERS, "jats,aplusplus").unwrap();
        assert_eq!(store.get_parser_names().unwrap(), vec!["jats", "aplusplus"]);
    }
}
