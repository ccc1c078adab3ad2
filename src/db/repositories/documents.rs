use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Row};
use uuid::Uuid;

use crate::db::{
    connection::Database,
    helpers::{parse_datetime, to_i64, to_u64},
    models::UnifiedDocument,
};

fn row_to_document(row: &Row) -> Result<UnifiedDocument> {
    let change_count: i64 = row.get("change_count")?;
    let created_at: String = row.get("created_at")?;

    Ok(UnifiedDocument {
        id: row.get("id")?,
        workspace_id: row.get("workspace_id")?,
        file_name: row.get("file_name")?,
        change_count: to_u64(change_count, "change_count")?,
        created_at: parse_datetime(&created_at, "created_at")?,
    })
}

impl Database {
    /// Records one unified-document row per file name, all sharing the same
    /// change count. Returns rows written.
    pub async fn record_unified_documents(
        &self,
        workspace_id: &str,
        file_names: &[String],
        change_count: u64,
    ) -> Result<usize> {
        let workspace_id = workspace_id.to_string();
        let file_names = file_names.to_vec();
        self.execute(move |conn| {
            let created_at = Utc::now().to_rfc3339();
            let change_count = to_i64(change_count)?;
            let tx = conn.transaction()?;
            for file_name in &file_names {
                tx.execute(
                    "INSERT INTO unified_documents (id, workspace_id, file_name, change_count, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        Uuid::new_v4().to_string(),
                        workspace_id,
                        file_name,
                        change_count,
                        created_at,
                    ],
                )
                .with_context(|| format!("failed to record unified document {file_name}"))?;
            }
            tx.commit().context("failed to commit unified documents")?;
            Ok(file_names.len())
        })
        .await
    }

    pub async fn list_unified_documents(&self, workspace_id: &str) -> Result<Vec<UnifiedDocument>> {
        let workspace_id = workspace_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, workspace_id, file_name, change_count, created_at
                 FROM unified_documents
                 WHERE workspace_id = ?1
                 ORDER BY created_at DESC, file_name ASC",
            )?;

            let mut rows = stmt.query(params![workspace_id])?;
            let mut documents = Vec::new();
            while let Some(row) = rows.next()? {
                documents.push(row_to_document(row)?);
            }

            Ok(documents)
        })
        .await
    }

    pub async fn count_unified_documents(&self, workspace_id: &str) -> Result<u64> {
        let workspace_id = workspace_id.to_string();
        self.execute(move |conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM unified_documents WHERE workspace_id = ?1",
                params![workspace_id],
                |row| row.get(0),
            )?;
            to_u64(count, "document count")
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn documents_are_scoped_by_workspace() {
        let db = Database::in_memory().unwrap();
        let names = vec!["a.docx".to_string(), "b.pdf".to_string()];

        assert_eq!(db.record_unified_documents("ws1", &names, 3).await.unwrap(), 2);
        db.record_unified_documents("ws2", &names[..1], 1)
            .await
            .unwrap();

        assert_eq!(db.count_unified_documents("ws1").await.unwrap(), 2);
        assert_eq!(db.count_unified_documents("ws2").await.unwrap(), 1);

        let listed = db.list_unified_documents("ws1").await.unwrap();
        let names: Vec<&str> = listed.iter().map(|d| d.file_name.as_str()).collect();
        assert_eq!(names, vec!["a.docx", "b.pdf"]);
        assert!(listed.iter().all(|d| d.change_count == 3));
    }
}
