//! Per-rater session state and the store that owns it

use crate::error::{AppError, Result};
use crate::evaluation::Selection;
use crate::models::AnnotationRecord;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

/// Message shown once on the next render
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Warning(String),
    Info(String),
}

/// Display order of `models` for one sample, a pure function of the seed and index
pub fn shuffle_for(seed: u64, sample_index: usize, models: &[String]) -> Vec<String> {
    let mixed = seed ^ (sample_index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    let mut rng = StdRng::seed_from_u64(mixed);
    let mut order = models.to_vec();
    order.shuffle(&mut rng);
    order
}

/// Everything one rater accumulates between the first visit and the CSV write
#[derive(Debug)]
pub struct SessionState {
    user_id: String,
    cursor: usize,
    records: Vec<AnnotationRecord>,
    shuffle_orders: HashMap<usize, Vec<String>>,
    selections: HashMap<usize, Selection>,
    seed: u64,
    output_path: Option<PathBuf>,
    notice: Option<Notice>,
}

impl SessionState {
    pub fn new(seed: u64) -> Self {
        Self {
            user_id: String::new(),
            cursor: 0,
            records: Vec::new(),
            shuffle_orders: HashMap::new(),
            selections: HashMap::new(),
            seed,
            output_path: None,
            notice: None,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn set_user_id(&mut self, user_id: &str) {
        self.user_id = user_id.trim().to_string();
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn advance(&mut self) {
        self.cursor += 1;
    }

    /// Step back one sample; returns the new cursor, or `None` at the start
    pub fn retreat(&mut self) -> Option<usize> {
        self.cursor = self.cursor.checked_sub(1)?;
        Some(self.cursor)
    }

    pub fn records(&self) -> &[AnnotationRecord] {
        &self.records
    }

    pub fn append_records(&mut self, records: impl IntoIterator<Item = AnnotationRecord>) {
        self.records.extend(records);
    }

    /// Drop every record of one sample; returns how many went
    pub fn purge_records(&mut self, sample_index: usize) -> usize {
        let before = self.records.len();
        self.records.retain(|r| r.sample_index != sample_index);
        before - self.records.len()
    }

    /// Frozen display order for a sample, generated on first request
    pub fn shuffle_order(&mut self, sample_index: usize, models: &[String]) -> &[String] {
        let seed = self.seed;
        self.shuffle_orders
            .entry(sample_index)
            .or_insert_with(|| shuffle_for(seed, sample_index, models))
    }

    /// Display order only if the sample has already been shown
    pub fn existing_shuffle_order(&self, sample_index: usize) -> Option<&[String]> {
        self.shuffle_orders.get(&sample_index).map(Vec::as_slice)
    }

    pub fn selection(&self, sample_index: usize) -> Option<Selection> {
        self.selections.get(&sample_index).copied()
    }

    pub fn remember_selection(&mut self, sample_index: usize, selection: Selection) {
        self.selections.insert(sample_index, selection);
    }

    pub fn output_path(&self) -> Option<&Path> {
        self.output_path.as_deref()
    }

    pub fn is_finalized(&self) -> bool {
        self.output_path.is_some()
    }

    pub fn mark_finalized(&mut self, path: PathBuf) {
        self.output_path = Some(path);
    }

    pub fn set_notice(&mut self, notice: Notice) {
        self.notice = Some(notice);
    }

    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }
}

/// A session behind its own lock, so one rater's slow request never waits on another's
pub type SharedSession = Arc<Mutex<SessionState>>;

#[derive(Debug)]
struct StoreEntry {
    session: SharedSession,
    last_seen: Instant,
}

/// All live sessions, keyed by the id embedded in the session URL
#[derive(Debug)]
pub struct SessionStore {
    sessions: HashMap<Uuid, StoreEntry>,
    ttl: Duration,
    fixed_seed: Option<u64>,
}

impl SessionStore {
    pub fn new(ttl: Duration, fixed_seed: Option<u64>) -> Self {
        Self {
            sessions: HashMap::new(),
            ttl,
            fixed_seed,
        }
    }

    /// Start a fresh session for a first visit
    pub fn create(&mut self) -> Uuid {
        self.expire_idle(Instant::now());

        let id = Uuid::new_v4();
        let seed = self.fixed_seed.unwrap_or_else(rand::random);
        self.sessions.insert(
            id,
            StoreEntry {
                session: Arc::new(Mutex::new(SessionState::new(seed))),
                last_seen: Instant::now(),
            },
        );
        info!("Created session {} ({} live)", id, self.len());
        id
    }

    /// Look up a live session and mark it active
    pub fn get(&mut self, id: Uuid) -> Result<SharedSession> {
        let now = Instant::now();
        self.expire_idle(now);

        let entry = self
            .sessions
            .get_mut(&id)
            .ok_or(AppError::SessionNotFound(id))?;
        entry.last_seen = now;
        Ok(Arc::clone(&entry.session))
    }

    /// Drop sessions idle longer than the ttl; returns how many were dropped
    pub fn expire_idle(&mut self, now: Instant) -> usize {
        let ttl = self.ttl;
        let before = self.sessions.len();
        self.sessions.retain(|id, entry| {
            let keep = now.saturating_duration_since(entry.last_seen) <= ttl;
            if !keep {
                debug!("Expiring idle session {}", id);
            }
            keep
        });
        let expired = before - self.sessions.len();
        if expired > 0 {
            info!("Expired {} idle session(s)", expired);
        }
        expired
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }
}
