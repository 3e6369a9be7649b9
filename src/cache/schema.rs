//! SQL for the cache table.
//!
//! Statements are rendered once per handle from the configured table name.
//! The name is checked by [`CacheConfig::validate`](crate::CacheConfig::validate)
//! before it gets here, so plain interpolation is safe. Identifiers are
//! quoted with backticks: SQLite never reads those as string literals, so a
//! missing column is an error instead of a constant.

/// Rendered statements for one cache table.
#[derive(Debug, Clone)]
pub(crate) struct Statements {
    pub create_table: String,
    pub select_value: String,
    pub select_record: String,
    pub count_key: String,
    pub upsert: String,
    pub delete: String,
}

impl Statements {
    pub fn new(table: &str) -> Self {
        Self {
            create_table: format!(
                "CREATE TABLE IF NOT EXISTS `{table}` (\
                 `id` INTEGER PRIMARY KEY AUTOINCREMENT, \
                 `key` VARCHAR(128) UNIQUE, \
                 `value` TEXT, \
                 `create_time` TIMESTAMP DEFAULT (DATETIME('now', 'localtime')), \
                 `update_time` TIMESTAMP DEFAULT (DATETIME('now', 'localtime')))"
            ),
            select_value: format!("SELECT `value` FROM `{table}` WHERE `key` = ?1"),
            select_record: format!(
                "SELECT `id`, `key`, `value`, `create_time`, `update_time` \
                 FROM `{table}` WHERE `key` = ?1"
            ),
            count_key: format!("SELECT COUNT(*) FROM `{table}` WHERE `key` = ?1"),
            // ?3 is bound once and used for both timestamps on insert; on
            // conflict only value and update_time change. MAX keeps
            // update_time from moving backwards when the clock steps back.
            upsert: format!(
                "INSERT INTO `{table}` (`key`, `value`, `create_time`, `update_time`) \
                 VALUES (?1, ?2, ?3, ?3) \
                 ON CONFLICT(`key`) DO UPDATE SET \
                 `value` = excluded.`value`, \
                 `update_time` = MAX(`update_time`, excluded.`update_time`)"
            ),
            delete: format!("DELETE FROM `{table}` WHERE `key` = ?1"),
        }
    }

    /// All statements the handle runs after the table exists.
    pub fn runtime(&self) -> [&str; 5] {
        [
            self.select_value.as_str(),
            self.select_record.as_str(),
            self.count_key.as_str(),
            self.upsert.as_str(),
            self.delete.as_str(),
        ]
    }
}
