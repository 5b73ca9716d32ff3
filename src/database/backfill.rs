use indicatif::{ProgressBar, ProgressStyle};
use rusqlite::{params, Connection, TransactionBehavior};
use tracing::info;

use crate::error::Result;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BackfillReport {
    /// Artworks that had at least one NULL counter.
    pub nulls_filled: usize,
    /// Artworks whose stored counters disagreed with their interaction rows.
    pub recounted: usize,
}

/// Normalizes legacy NULL counters to zero and, with `recount`, rebuilds every
/// counter from the like/save/view tables.
pub fn backfill_counts(
    conn: &mut Connection,
    recount: bool,
    progress: Option<&ProgressBar>,
) -> Result<BackfillReport> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let mut report = BackfillReport::default();

    report.nulls_filled = tx.execute(
        "UPDATE artworks
         SET like_count = COALESCE(like_count, 0),
             save_count = COALESCE(save_count, 0),
             view_count = COALESCE(view_count, 0)
         WHERE like_count IS NULL OR save_count IS NULL OR view_count IS NULL",
        [],
    )?;
    info!("Filled NULL counters on {} artworks", report.nulls_filled);

    if recount {
        let ids: Vec<i64> = tx
            .prepare("SELECT id FROM artworks ORDER BY id")?
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        if let Some(pb) = progress {
            pb.set_length(ids.len() as u64);
        }

        let mut stmt_recount = tx.prepare(
            "UPDATE artworks
             SET like_count = (SELECT COUNT(*) FROM likes WHERE artwork_id = ?1),
                 save_count = (SELECT COUNT(*) FROM saves WHERE artwork_id = ?1),
                 view_count = (SELECT COUNT(*) FROM views WHERE artwork_id = ?1)
             WHERE id = ?1
               AND (like_count IS NOT (SELECT COUNT(*) FROM likes WHERE artwork_id = ?1)
                 OR save_count IS NOT (SELECT COUNT(*) FROM saves WHERE artwork_id = ?1)
                 OR view_count IS NOT (SELECT COUNT(*) FROM views WHERE artwork_id = ?1))",
        )?;
        for id in &ids {
            report.recounted += stmt_recount.execute(params![id])?;
            if let Some(pb) = progress {
                pb.inc(1);
            }
        }
        drop(stmt_recount);
        info!("Recounted {} of {} artworks", report.recounted, ids.len());
    }

    tx.commit()?;
    Ok(report)
}

pub fn progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::with_template("{spinner} recounting [{bar:40}] {pos}/{len} artworks")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    pb
}
