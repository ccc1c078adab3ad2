use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Row};

use crate::db::{
    connection::Database,
    helpers::{parse_datetime, parse_source, to_i64, to_u64},
    models::StoredTerm,
};
use crate::models::TermGroup;

fn row_to_term(row: &Row) -> Result<StoredTerm> {
    let variants: String = row.get("variants")?;
    let source: String = row.get("source")?;
    let confidence: i64 = row.get("confidence")?;
    let occurrence_count: i64 = row.get("occurrence_count")?;
    let updated_at: String = row.get("updated_at")?;

    Ok(StoredTerm {
        workspace_id: row.get("workspace_id")?,
        term: row.get("term")?,
        variants: serde_json::from_str(&variants).context("failed to decode variants")?,
        source: parse_source(&source)?,
        confidence: u8::try_from(confidence.clamp(0, 100)).unwrap_or(100),
        occurrence_count: to_u64(occurrence_count, "occurrence_count")?,
        updated_at: parse_datetime(&updated_at, "updated_at")?,
    })
}

impl Database {
    /// Saves each group's standard form for `workspace_id`. Re-saving a term
    /// replaces its variants and bumps `updated_at`. Returns rows written.
    pub async fn upsert_terms(&self, workspace_id: &str, groups: &[TermGroup]) -> Result<usize> {
        let workspace_id = workspace_id.to_string();
        let groups = groups.to_vec();
        self.execute(move |conn| {
            let now = Utc::now().to_rfc3339();
            let tx = conn.transaction()?;
            let mut written = 0;
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO terms (workspace_id, term, variants, source, confidence, occurrence_count, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                     ON CONFLICT(workspace_id, term) DO UPDATE SET
                         variants = excluded.variants,
                         source = excluded.source,
                         confidence = excluded.confidence,
                         occurrence_count = excluded.occurrence_count,
                         updated_at = excluded.updated_at",
                )?;
                for group in &groups {
                    let variants = serde_json::to_string(&group.variants)?;
                    written += stmt
                        .execute(params![
                            workspace_id,
                            group.standard,
                            variants,
                            group.source.as_str(),
                            i64::from(group.confidence),
                            to_i64(u64::from(group.total_count))?,
                            now,
                        ])
                        .with_context(|| format!("failed to upsert term {}", group.standard))?;
                }
            }
            tx.commit().context("failed to commit term upsert")?;
            Ok(written)
        })
        .await
    }

    pub async fn count_terms(&self, workspace_id: &str) -> Result<u64> {
        let workspace_id = workspace_id.to_string();
        self.execute(move |conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM terms WHERE workspace_id = ?1",
                params![workspace_id],
                |row| row.get(0),
            )?;
            to_u64(count, "term count")
        })
        .await
    }

    pub async fn list_terms(&self, workspace_id: &str) -> Result<Vec<StoredTerm>> {
        let workspace_id = workspace_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT workspace_id, term, variants, source, confidence, occurrence_count, updated_at
                 FROM terms
                 WHERE workspace_id = ?1
                 ORDER BY term ASC",
            )?;

            let mut rows = stmt.query(params![workspace_id])?;
            let mut terms = Vec::new();
            while let Some(row) = rows.next()? {
                terms.push(row_to_term(row)?);
            }

            Ok(terms)
        })
        .await
    }
}
