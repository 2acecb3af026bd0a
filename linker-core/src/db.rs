//! Durable panel state that outlives every panel teardown.
//!
//! The store is a WAL-mode SQLite file. The session is kept as independent
//! logical keys in `kv_store` rather than one blob, so a threshold drag or a
//! single toggle rewrites one row. Reads tolerate garbage: a value that does not
//! parse is logged, deleted, and treated as absent.

use std::collections::{BTreeSet, HashMap};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rusqlite::OptionalExtension;
use tokio_rusqlite::Connection;
use tracing::{debug, warn};

use crate::error::{LinkerError, LinkerResult};
use crate::filter::ThresholdBounds;
use crate::selection::SelectionTracker;
use crate::types::{Context, ContextKind, PredictionResult, SessionState, ThresholdHint};

/// Opens (or creates) the SQLite database at `path`, configures WAL mode,
/// and applies schema migrations via the `schema_version` table.
///
/// Sets `busy_timeout` via the `Connection` method (not a PRAGMA string) so the
/// setting takes effect regardless of pragma caching.
///
/// # Errors
///
/// Returns `tokio_rusqlite::Error` if the file cannot be opened, WAL configuration
/// fails, or schema DDL fails.
pub async fn open_db(path: &str) -> Result<Connection, tokio_rusqlite::Error> {
    let conn = Connection::open(path).await?;

    conn.call(|db| -> rusqlite::Result<()> {
        db.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA synchronous=NORMAL;",
        )?;
        db.busy_timeout(Duration::from_secs(5))?;
        crate::schema::migrate(db)
    })
    .await?;

    Ok(conn)
}

/// Returns the current Unix timestamp in seconds.
fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

/// The logical keys of the durable store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKey {
    Repo,
    Kind,
    LocalId,
    LastResult,
    Selected,
    Threshold,
    MaxThreshold,
}

impl StoreKey {
    pub const ALL: [StoreKey; 7] = [
        StoreKey::Repo,
        StoreKey::Kind,
        StoreKey::LocalId,
        StoreKey::LastResult,
        StoreKey::Selected,
        StoreKey::Threshold,
        StoreKey::MaxThreshold,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StoreKey::Repo => "repo",
            StoreKey::Kind => "kind",
            StoreKey::LocalId => "localId",
            StoreKey::LastResult => "lastResult",
            StoreKey::Selected => "selected",
            StoreKey::Threshold => "threshold",
            StoreKey::MaxThreshold => "maxThreshold",
        }
    }
}

/// What `load_session` found on disk.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RestoredSession {
    pub state: SessionState,
    /// `true` when a threshold was persisted for `state.context`'s repository,
    /// i.e. a service hint must not overwrite it with the default.
    pub threshold_persisted: bool,
}

/// Handle to the durable store. Cheap to clone; all clones share one connection.
#[derive(Clone)]
pub struct StateStore {
    conn: Connection,
}

impl StateStore {
    /// Opens the store at `path` (see [`open_db`]).
    ///
    /// # Errors
    ///
    /// Returns `LinkerError::Store` if the database cannot be opened or migrated.
    pub async fn open(path: &str) -> LinkerResult<Self> {
        Ok(Self { conn: open_db(path).await? })
    }

    /// Wraps an already-opened and migrated connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    /// The underlying connection, for diagnostics and tests.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Reads one raw value.
    pub async fn get(&self, key: StoreKey) -> LinkerResult<Option<String>> {
        let name = key.as_str();
        let value = self
            .conn
            .call(move |db| -> rusqlite::Result<Option<String>> {
                db.query_row("SELECT value FROM kv_store WHERE key = ?1", [name], |r| r.get(0))
                    .optional()
            })
            .await?;
        Ok(value)
    }

    /// Upserts one raw value. Last writer wins.
    pub async fn set(&self, key: StoreKey, value: impl Into<String>) -> LinkerResult<()> {
        self.write(vec![(key, Some(value.into()))]).await
    }

    /// Deletes one key. Removing an absent key is not an error.
    pub async fn remove(&self, key: StoreKey) -> LinkerResult<()> {
        self.write(vec![(key, None)]).await
    }

    /// Applies several upserts (`Some`) and deletes (`None`) in one `BEGIN IMMEDIATE`
    /// transaction.
    async fn write(&self, entries: Vec<(StoreKey, Option<String>)>) -> LinkerResult<()> {
        self.conn
            .call(move |db| -> rusqlite::Result<()> {
                let now = now_secs();
                let tx = db.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
                for (key, value) in &entries {
                    match value {
                        Some(value) => {
                            tx.execute(
                                "INSERT INTO kv_store (key, value, updated_at)
                                 VALUES (?1, ?2, ?3)
                                 ON CONFLICT(key)
                                 DO UPDATE SET value = excluded.value,
                                               updated_at = excluded.updated_at",
                                rusqlite::params![key.as_str(), value, now],
                            )?;
                        }
                        None => {
                            tx.execute("DELETE FROM kv_store WHERE key = ?1", [key.as_str()])?;
                        }
                    }
                }
                tx.commit()
            })
            .await?;
        Ok(())
    }

    /// Loads and validates the persisted session.
    ///
    /// Every key is parsed independently; a malformed value is logged as
    /// `MalformedPersistedState`, removed, and treated as absent. The context
    /// needs all of `repo`, `kind` and `localId` to be valid or none of them is
    /// used. Selected ids not present in the persisted result are dropped.
    pub async fn load_session(&self) -> LinkerResult<RestoredSession> {
        let rows: HashMap<String, String> = self
            .conn
            .call(|db| -> rusqlite::Result<HashMap<String, String>> {
                let mut stmt = db.prepare("SELECT key, value FROM kv_store")?;
                let rows = stmt
                    .query_map([], |r| Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?)))?
                    .collect::<rusqlite::Result<HashMap<_, _>>>()?;
                Ok(rows)
            })
            .await?;

        let mut discard = Vec::new();
        let mut state = SessionState::default();

        let context = match (
            rows.get(StoreKey::Repo.as_str()),
            rows.get(StoreKey::Kind.as_str()),
            rows.get(StoreKey::LocalId.as_str()),
        ) {
            (None, None, None) => None,
            (Some(repo), Some(kind), Some(local_id)) => {
                match ContextKind::parse(kind) {
                    Some(kind) if !repo.is_empty() && !local_id.is_empty() => Some(Context {
                        repository: repo.clone(),
                        kind,
                        local_id: local_id.clone(),
                    }),
                    _ => {
                        malformed(StoreKey::Kind, format!("unusable context ({repo}, {kind}, {local_id})"));
                        discard.extend([StoreKey::Repo, StoreKey::Kind, StoreKey::LocalId]);
                        None
                    }
                }
            }
            _ => {
                malformed(StoreKey::Repo, "partial context".to_owned());
                discard.extend([StoreKey::Repo, StoreKey::Kind, StoreKey::LocalId]);
                None
            }
        };

        state.last_result =
            parse_json::<PredictionResult>(&rows, StoreKey::LastResult, &mut discard);
        let selected = parse_json::<BTreeSet<String>>(&rows, StoreKey::Selected, &mut discard)
            .unwrap_or_default();
        state.selection = SelectionTracker::from_ids(selected);

        let threshold = parse_number(&rows, StoreKey::Threshold, &mut discard);
        let max = parse_number(&rows, StoreKey::MaxThreshold, &mut discard);
        state.thresholds = ThresholdBounds::new(threshold.unwrap_or(0.0), max.unwrap_or(1.0));

        // Without a context nothing else can be trusted to belong to a page.
        if context.is_none() {
            state.last_result = None;
            state.selection.clear();
        }
        match &state.last_result {
            Some(result) => {
                let dropped = state.selection.retain_in(result);
                if dropped > 0 {
                    debug!(dropped, "dropped persisted selections missing from the last result");
                }
            }
            None => state.selection.clear(),
        }
        state.context = context;

        if !discard.is_empty() {
            self.write(discard.into_iter().map(|k| (k, None)).collect()).await?;
        }

        let threshold_persisted = state.context.is_some() && threshold.is_some();
        Ok(RestoredSession { state, threshold_persisted })
    }

    /// Replaces the persisted context.
    ///
    /// Always clears `lastResult` and `selected`. When the repository changes the
    /// thresholds are cleared too, since they belong to the previous repository.
    pub async fn replace_context(&self, context: &Context, same_repository: bool) -> LinkerResult<()> {
        let mut entries = vec![
            (StoreKey::Repo, Some(context.repository.clone())),
            (StoreKey::Kind, Some(context.kind.as_str().to_owned())),
            (StoreKey::LocalId, Some(context.local_id.clone())),
            (StoreKey::LastResult, None),
            (StoreKey::Selected, None),
        ];
        if !same_repository {
            entries.push((StoreKey::Threshold, None));
            entries.push((StoreKey::MaxThreshold, None));
        }
        self.write(entries).await
    }

    pub async fn save_result(&self, result: &PredictionResult) -> LinkerResult<()> {
        self.set(StoreKey::LastResult, to_json(result)?).await
    }

    pub async fn save_selection(&self, selection: &SelectionTracker) -> LinkerResult<()> {
        self.set(StoreKey::Selected, to_json(selection.ids())?).await
    }

    pub async fn save_thresholds(&self, bounds: &ThresholdBounds) -> LinkerResult<()> {
        self.write(vec![
            (StoreKey::Threshold, Some(bounds.value.to_string())),
            (StoreKey::MaxThreshold, Some(bounds.max.to_string())),
        ])
        .await
    }

    /// Forgets the result and selection after a recorded link round trip.
    pub async fn clear_result(&self) -> LinkerResult<()> {
        self.write(vec![(StoreKey::LastResult, None), (StoreKey::Selected, None)]).await
    }

    /// Returns the durable hint for `repository`, if one was ever received.
    pub async fn threshold_hint(&self, repository: &str) -> LinkerResult<Option<ThresholdHint>> {
        let repository = repository.to_owned();
        let hint = self
            .conn
            .call(move |db| -> rusqlite::Result<Option<f64>> {
                db.query_row(
                    "SELECT hint FROM threshold_hints WHERE repository = ?1",
                    [&repository],
                    |r| r.get(0),
                )
                .optional()
            })
            .await?;
        Ok(hint.map(|value| ThresholdHint { value }))
    }

    pub async fn save_threshold_hint(&self, repository: &str, hint: ThresholdHint) -> LinkerResult<()> {
        let repository = repository.to_owned();
        self.conn
            .call(move |db| -> rusqlite::Result<()> {
                db.execute(
                    "INSERT INTO threshold_hints (repository, hint, received_at)
                     VALUES (?1, ?2, ?3)
                     ON CONFLICT(repository)
                     DO UPDATE SET hint = excluded.hint,
                                   received_at = excluded.received_at",
                    rusqlite::params![&repository, hint.value.clamp(0.0, 1.0), now_secs()],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }
}

fn malformed(key: StoreKey, reason: String) {
    let err = LinkerError::MalformedPersistedState { key: key.as_str(), reason };
    warn!(error = %err, "ignoring persisted value");
}

fn parse_json<T: serde::de::DeserializeOwned>(
    rows: &HashMap<String, String>,
    key: StoreKey,
    discard: &mut Vec<StoreKey>,
) -> Option<T> {
    let raw = rows.get(key.as_str())?;
    match serde_json::from_str(raw) {
        Ok(value) => Some(value),
        Err(e) => {
            malformed(key, e.to_string());
            discard.push(key);
            None
        }
    }
}

fn parse_number(
    rows: &HashMap<String, String>,
    key: StoreKey,
    discard: &mut Vec<StoreKey>,
) -> Option<f64> {
    let raw = rows.get(key.as_str())?;
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && (0.0..=1.0).contains(&value) => Some(value),
        Ok(value) => {
            malformed(key, format!("{value} is outside [0, 1]"));
            discard.push(key);
            None
        }
        Err(e) => {
            malformed(key, e.to_string());
            discard.push(key);
            None
        }
    }
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> LinkerResult<String> {
    serde_json::to_string(value)
        .map_err(|e| LinkerError::Protocol(format!("failed to serialise session value: {e}")))
}
