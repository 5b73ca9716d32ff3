use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use tracing::{debug, error};

use crate::database::Store;
use crate::error::{GalleryError, Result};
use crate::interactions::{ArtworkId, InteractionKind, InteractionState, SessionId, Toggle};

/// Applies likes, saves and views against the store.
///
/// The engine holds nothing but a store handle; all state lives in SQLite and
/// every mutation is a single `BEGIN IMMEDIATE` transaction.
#[derive(Clone)]
pub struct InteractionEngine {
    store: Store,
}

impl InteractionEngine {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Removes the session's row if present, creates it otherwise, and moves
    /// the counter by one in the same step.
    pub async fn toggle(
        &self,
        toggle: Toggle,
        artwork: ArtworkId,
        session: SessionId,
    ) -> Result<InteractionState> {
        let kind = InteractionKind::from(toggle);
        let logged = session.clone();
        let result = self
            .store
            .call(move |conn| toggle_relation(conn, kind, artwork, &session))
            .await;
        log_outcome(kind, artwork, &logged, &result);
        result
    }

    /// Counts the first view per session, later calls are no-ops.
    pub async fn record_view(
        &self,
        artwork: ArtworkId,
        session: SessionId,
    ) -> Result<InteractionState> {
        let logged = session.clone();
        let result = self
            .store
            .call(move |conn| record_first_view(conn, artwork, &session))
            .await;
        log_outcome(InteractionKind::View, artwork, &logged, &result);
        result
    }

    /// Like and save need a session; view falls back to the bare counter
    /// without one. A missing artwork reads as zero.
    pub async fn state(
        &self,
        kind: InteractionKind,
        artwork: ArtworkId,
        session: Option<SessionId>,
    ) -> Result<InteractionState> {
        if kind != InteractionKind::View && session.is_none() {
            return Err(GalleryError::validation("sessionId is required"));
        }
        self.store
            .call(move |conn| read_state(conn, kind, artwork, session.as_ref()))
            .await
    }
}

fn log_outcome(
    kind: InteractionKind,
    artwork: ArtworkId,
    session: &SessionId,
    result: &Result<InteractionState>,
) {
    match result {
        Ok(state) => debug!(
            kind = %kind,
            artwork_id = artwork.get(),
            session = %session,
            active = ?state.active,
            count = state.count,
            "interaction applied"
        ),
        Err(e) => error!(
            kind = %kind,
            artwork_id = artwork.get(),
            session = %session,
            "interaction failed: {e}"
        ),
    }
}

pub(crate) fn toggle_relation(
    conn: &mut Connection,
    kind: InteractionKind,
    artwork: ArtworkId,
    session: &SessionId,
) -> Result<InteractionState> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let table = kind.table();

    let removed = tx.execute(
        &format!("DELETE FROM {table} WHERE artwork_id = ?1 AND session_id = ?2"),
        params![artwork.get(), session.as_str()],
    )?;
    let delta = if removed > 0 {
        -1
    } else {
        tx.execute(
            &format!("INSERT INTO {table} (artwork_id, session_id, created_at) VALUES (?1, ?2, ?3)"),
            params![artwork.get(), session.as_str(), Utc::now()],
        )?;
        1
    };
    debug!(kind = %kind, session = %session, delta, "relation row toggled");

    let count = bump_counter(&tx, kind, artwork, delta)?;
    tx.commit()?;
    Ok(InteractionState {
        kind,
        active: Some(delta > 0),
        count,
    })
}

pub(crate) fn record_first_view(
    conn: &mut Connection,
    artwork: ArtworkId,
    session: &SessionId,
) -> Result<InteractionState> {
    let kind = InteractionKind::View;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let inserted = tx.execute(
        "INSERT INTO views (artwork_id, session_id, created_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(artwork_id, session_id) DO NOTHING",
        params![artwork.get(), session.as_str(), Utc::now()],
    )?;
    let count = if inserted > 0 {
        bump_counter(&tx, kind, artwork, 1)?
    } else {
        read_counter(&tx, kind, artwork)?
    };

    tx.commit()?;
    Ok(InteractionState {
        kind,
        active: Some(inserted > 0),
        count,
    })
}

fn read_state(
    conn: &mut Connection,
    kind: InteractionKind,
    artwork: ArtworkId,
    session: Option<&SessionId>,
) -> Result<InteractionState> {
    // Deferred transaction: the row check and the counter come from one snapshot.
    let tx = conn.transaction()?;
    let active = match session {
        Some(session) => Some(tx.query_row(
            &format!(
                "SELECT EXISTS(SELECT 1 FROM {} WHERE artwork_id = ?1 AND session_id = ?2)",
                kind.table()
            ),
            params![artwork.get(), session.as_str()],
            |row| row.get::<_, bool>(0),
        )?),
        None => None,
    };
    let count = read_counter(&tx, kind, artwork)?;
    tx.commit()?;
    Ok(InteractionState { kind, active, count })
}

/// Applies `delta` with a store-side expression, so no read-modify-write
/// happens in Rust. NULL legacy counters start from zero and the result
/// never drops below zero. A missing artwork surfaces as a store error.
fn bump_counter(
    tx: &Transaction<'_>,
    kind: InteractionKind,
    artwork: ArtworkId,
    delta: i64,
) -> Result<i64> {
    let col = kind.counter_column();
    let count = tx.query_row(
        &format!(
            "UPDATE artworks SET {col} = MAX(COALESCE({col}, 0) + ?2, 0)
             WHERE id = ?1
             RETURNING {col}"
        ),
        params![artwork.get(), delta],
        |row| row.get(0),
    )?;
    Ok(count)
}

fn read_counter(tx: &Transaction<'_>, kind: InteractionKind, artwork: ArtworkId) -> Result<i64> {
    let col = kind.counter_column();
    let count = tx
        .query_row(
            &format!("SELECT COALESCE({col}, 0) FROM artworks WHERE id = ?1"),
            params![artwork.get()],
            |row| row.get(0),
        )
        .optional()?;
    Ok(count.unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::repo;
    use crate::database::repo::tests::{artwork, student};
    use crate::utils::config::StoreConfig;
    use tempfile::{tempdir, TempDir};

    async fn engine_with_artwork() -> anyhow::Result<(TempDir, InteractionEngine, Store, ArtworkId)> {
        let dir = tempdir()?;
        let store = Store::open(&StoreConfig {
            db_path: dir.path().join("gallery.sqlite"),
            max_connections: 8,
            ..StoreConfig::default()
        })
        .await?;
        let id = store
            .call(|conn| {
                let s = repo::create_student(conn, &student("9001"))?;
                let a = repo::create_artwork(conn, &artwork(s.id, "batik"), |_| Ok(String::new()))?;
                Ok(a.artwork.id)
            })
            .await?;
        Ok((dir, InteractionEngine::new(store.clone()), store, ArtworkId::new(id)?))
    }

    fn sid(s: &str) -> SessionId {
        SessionId::new(s).expect("session id")
    }

    async fn rows(store: &Store, table: &'static str, artwork: ArtworkId) -> i64 {
        store
            .call(move |conn| {
                Ok(conn.query_row(
                    &format!("SELECT COUNT(*) FROM {table} WHERE artwork_id = ?1"),
                    params![artwork.get()],
                    |r| r.get(0),
                )?)
            })
            .await
            .expect("count rows")
    }

    #[tokio::test]
    async fn test_like_toggle_twice_restores_state() -> anyhow::Result<()> {
        let (_dir, engine, store, id) = engine_with_artwork().await?;

        let first = engine.toggle(Toggle::Like, id, sid("s1")).await?;
        assert_eq!((first.active, first.count), (Some(true), 1));
        assert_eq!(rows(&store, "likes", id).await, 1);

        let second = engine.toggle(Toggle::Like, id, sid("s1")).await?;
        assert_eq!((second.active, second.count), (Some(false), 0));
        assert_eq!(rows(&store, "likes", id).await, 0);

        let third = engine.toggle(Toggle::Like, id, sid("s1")).await?;
        assert_eq!((third.active, third.count), (Some(true), 1));
        Ok(())
    }

    #[tokio::test]
    async fn test_save_is_independent_of_like() -> anyhow::Result<()> {
        let (_dir, engine, _store, id) = engine_with_artwork().await?;
        engine.toggle(Toggle::Like, id, sid("s1")).await?;
        let saved = engine.toggle(Toggle::Save, id, sid("s1")).await?;
        assert_eq!(saved.kind, InteractionKind::Save);
        assert_eq!((saved.active, saved.count), (Some(true), 1));

        let like = engine.state(InteractionKind::Like, id, Some(sid("s1"))).await?;
        assert_eq!((like.active, like.count), (Some(true), 1));
        let other = engine.state(InteractionKind::Save, id, Some(sid("s2"))).await?;
        assert_eq!((other.active, other.count), (Some(false), 1));
        Ok(())
    }

    #[tokio::test]
    async fn test_view_counts_once_per_session() -> anyhow::Result<()> {
        let (_dir, engine, store, id) = engine_with_artwork().await?;

        let first = engine.record_view(id, sid("s1")).await?;
        assert_eq!((first.active, first.count), (Some(true), 1));
        for _ in 0..3 {
            let again = engine.record_view(id, sid("s1")).await?;
            assert_eq!((again.active, again.count), (Some(false), 1));
        }
        let other = engine.record_view(id, sid("s2")).await?;
        assert_eq!((other.active, other.count), (Some(true), 2));
        assert_eq!(rows(&store, "views", id).await, 2);

        let bare = engine.state(InteractionKind::View, id, None).await?;
        assert_eq!((bare.active, bare.count), (None, 2));
        let seen = engine.state(InteractionKind::View, id, Some(sid("s1"))).await?;
        assert_eq!(seen.active, Some(true));
        Ok(())
    }

    #[tokio::test]
    async fn test_untouched_artwork_reads_zero() -> anyhow::Result<()> {
        let (_dir, engine, _store, id) = engine_with_artwork().await?;
        for kind in [InteractionKind::Like, InteractionKind::Save] {
            let st = engine.state(kind, id, Some(sid("nobody"))).await?;
            assert_eq!((st.active, st.count), (Some(false), 0));
        }
        let views = engine.state(InteractionKind::View, id, None).await?;
        assert_eq!(views.count, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_artwork_reads_zero_but_writes_fail() -> anyhow::Result<()> {
        let (_dir, engine, _store, _id) = engine_with_artwork().await?;
        let ghost = ArtworkId::new(4242)?;

        let st = engine.state(InteractionKind::Like, ghost, Some(sid("s1"))).await?;
        assert_eq!((st.active, st.count), (Some(false), 0));

        let err = engine.toggle(Toggle::Like, ghost, sid("s1")).await.unwrap_err();
        assert!(matches!(err, GalleryError::Store(_)));
        let err = engine.record_view(ghost, sid("s1")).await.unwrap_err();
        assert!(matches!(err, GalleryError::Store(_)));
        Ok(())
    }

    #[tokio::test]
    async fn test_state_requires_session_for_like_and_save() -> anyhow::Result<()> {
        let (_dir, engine, _store, id) = engine_with_artwork().await?;
        let err = engine.state(InteractionKind::Like, id, None).await.unwrap_err();
        assert!(matches!(err, GalleryError::Validation(_)));
        let err = engine.state(InteractionKind::Save, id, None).await.unwrap_err();
        assert!(matches!(err, GalleryError::Validation(_)));
        Ok(())
    }

    #[tokio::test]
    async fn test_null_legacy_counter_is_coalesced() -> anyhow::Result<()> {
        let (_dir, engine, store, id) = engine_with_artwork().await?;
        store
            .call(move |conn| {
                conn.execute(
                    "UPDATE artworks SET like_count = NULL, view_count = NULL WHERE id = ?1",
                    params![id.get()],
                )?;
                Ok(())
            })
            .await?;

        assert_eq!(engine.state(InteractionKind::Like, id, Some(sid("s1"))).await?.count, 0);
        assert_eq!(engine.toggle(Toggle::Like, id, sid("s1")).await?.count, 1);
        assert_eq!(engine.record_view(id, sid("s1")).await?.count, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_counter_never_goes_negative() -> anyhow::Result<()> {
        let (_dir, engine, store, id) = engine_with_artwork().await?;
        engine.toggle(Toggle::Save, id, sid("s1")).await?;
        // Simulate drift: the row exists but the stored counter says zero.
        store
            .call(move |conn| {
                conn.execute("UPDATE artworks SET save_count = 0 WHERE id = ?1", params![id.get()])?;
                Ok(())
            })
            .await?;
        let st = engine.toggle(Toggle::Save, id, sid("s1")).await?;
        assert_eq!((st.active, st.count), (Some(false), 0));
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_likes_from_distinct_sessions_are_all_counted() -> anyhow::Result<()> {
        let (_dir, engine, store, id) = engine_with_artwork().await?;
        const N: usize = 24;

        let handles: Vec<_> = (0..N)
            .map(|i| {
                let engine = engine.clone();
                tokio::spawn(async move { engine.toggle(Toggle::Like, id, sid(&format!("s{i}"))).await })
            })
            .collect();
        for h in handles {
            let st = h.await??;
            assert_eq!(st.active, Some(true));
        }

        let st = engine.state(InteractionKind::Like, id, Some(sid("s0"))).await?;
        assert_eq!(st.count, N as i64);
        assert_eq!(rows(&store, "likes", id).await, N as i64);
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_toggles_on_one_pair_stay_consistent() -> anyhow::Result<()> {
        let (_dir, engine, store, id) = engine_with_artwork().await?;

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let engine = engine.clone();
                tokio::spawn(async move { engine.toggle(Toggle::Like, id, sid("same")).await })
            })
            .collect();
        for h in handles {
            h.await??;
        }

        // An even number of flips lands back on "not liked".
        let st = engine.state(InteractionKind::Like, id, Some(sid("same"))).await?;
        assert_eq!((st.active, st.count), (Some(false), 0));
        assert_eq!(rows(&store, "likes", id).await, 0);
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_views_count_once() -> anyhow::Result<()> {
        let (_dir, engine, _store, id) = engine_with_artwork().await?;

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let engine = engine.clone();
                tokio::spawn(async move { engine.record_view(id, sid("same")).await })
            })
            .collect();
        let mut firsts = 0;
        for h in handles {
            if h.await??.active == Some(true) {
                firsts += 1;
            }
        }
        assert_eq!(firsts, 1);
        assert_eq!(engine.state(InteractionKind::View, id, None).await?.count, 1);
        Ok(())
    }
}
