//! LanceDB connection wrapper with table lifecycle helpers.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow_schema::Schema;

/// A LanceDB database rooted at a filesystem path, one table per collection.
pub struct LanceVectorStore {
    db: lancedb::Connection,
    base_path: PathBuf,
}

impl LanceVectorStore {
    /// Open or create a LanceDB store at `base_path`, creating the directory.
    pub async fn new(base_path: PathBuf) -> Result<Self, lancedb::Error> {
        std::fs::create_dir_all(&base_path).map_err(|e| lancedb::Error::CreateDir {
            path: base_path.display().to_string(),
            source: e,
        })?;

        let uri = base_path
            .to_str()
            .ok_or_else(|| lancedb::Error::InvalidInput {
                message: format!("Path contains invalid UTF-8: {}", base_path.display()),
            })?;

        let db = lancedb::connect(uri).execute().await?;

        Ok(Self { db, base_path })
    }

    /// Open a table, or `None` if it does not exist.
    pub async fn open_table(&self, table_name: &str) -> Result<Option<lancedb::Table>, lancedb::Error> {
        match self.db.open_table(table_name).execute().await {
            Ok(table) => Ok(Some(table)),
            Err(lancedb::Error::TableNotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Open the table, creating it empty with `schema` if missing.
    ///
    /// A concurrent creator winning the race is treated as success.
    pub async fn ensure_table(
        &self,
        table_name: &str,
        schema: Arc<Schema>,
    ) -> Result<lancedb::Table, lancedb::Error> {
        if let Some(table) = self.open_table(table_name).await? {
            return Ok(table);
        }
        match self.db.create_empty_table(table_name, schema).execute().await {
            Ok(table) => Ok(table),
            Err(lancedb::Error::TableAlreadyExists { .. }) => {
                self.db.open_table(table_name).execute().await
            }
            Err(e) => Err(e),
        }
    }

    /// Drop a table. Missing tables are not an error.
    pub async fn drop_table(&self, table_name: &str) -> Result<(), lancedb::Error> {
        match self.db.drop_table(table_name, &[]).await {
            Ok(()) => Ok(()),
            Err(lancedb::Error::TableNotFound { .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }

    pub async fn table_names(&self) -> Result<Vec<String>, lancedb::Error> {
        self.db.table_names().execute().await
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}
