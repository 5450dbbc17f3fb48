use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::config::DEFAULT_MAX_LEARNERS;
use crate::services::progress::Progress;

pub const DEFAULT_LEARNER: &str = "default";
const MAX_LEARNER_ID_LEN: usize = 64;

pub fn is_valid_learner_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_LEARNER_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
}

/// Per-learner progress, each behind its own mutex.
///
/// Holding a learner's lock across a read-check-write sequence is what keeps
/// completions, score and achievements consistent under concurrent requests.
/// The registry holds at most `capacity` learners; when full, the least
/// recently used learner that no request is holding is evicted.
pub struct LearnerRegistry {
    learners: RwLock<HashMap<String, LearnerSlot>>,
    default_goal: String,
    capacity: usize,
    clock: AtomicU64,
}

struct LearnerSlot {
    progress: Arc<Mutex<Progress>>,
    last_seen: AtomicU64,
}

impl LearnerRegistry {
    pub fn new(default_goal: &str) -> Self {
        Self::with_capacity(default_goal, DEFAULT_MAX_LEARNERS)
    }

    pub fn with_capacity(default_goal: &str, capacity: usize) -> Self {
        Self {
            learners: RwLock::new(HashMap::new()),
            default_goal: default_goal.to_string(),
            capacity: capacity.max(1),
            clock: AtomicU64::new(0),
        }
    }

    pub fn default_goal(&self) -> &str {
        &self.default_goal
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Existing learner, without registering unknown ids.
    pub fn get(&self, learner_id: &str) -> Option<Arc<Mutex<Progress>>> {
        let learners = self.learners.read();
        let slot = learners.get(learner_id)?;
        slot.last_seen.store(self.tick(), Ordering::Relaxed);
        Some(Arc::clone(&slot.progress))
    }

    /// Existing learner, or an unregistered fresh progress for read-only use.
    pub fn view(&self, learner_id: &str) -> Arc<Mutex<Progress>> {
        self.get(learner_id)
            .unwrap_or_else(|| Arc::new(Mutex::new(Progress::new(&self.default_goal))))
    }

    pub fn get_or_create(&self, learner_id: &str) -> Arc<Mutex<Progress>> {
        if let Some(progress) = self.get(learner_id) {
            return progress;
        }

        let mut learners = self.learners.write();
        if let Some(slot) = learners.get(learner_id) {
            slot.last_seen.store(self.tick(), Ordering::Relaxed);
            return Arc::clone(&slot.progress);
        }
        if learners.len() >= self.capacity {
            evict_idle(&mut learners);
        }

        tracing::info!(learner = learner_id, "new learner session");
        let progress = Arc::new(Mutex::new(Progress::new(&self.default_goal)));
        learners.insert(
            learner_id.to_string(),
            LearnerSlot {
                progress: Arc::clone(&progress),
                last_seen: AtomicU64::new(self.tick()),
            },
        );
        progress
    }

    pub fn reset(&self, learner_id: &str) {
        let progress = self.get_or_create(learner_id);
        progress.lock().reset(&self.default_goal);
        tracing::info!(learner = learner_id, "progress reset");
    }

    pub fn len(&self) -> usize {
        self.learners.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.learners.read().is_empty()
    }
}

/// Drops the least recently used learner no request currently holds.
fn evict_idle(learners: &mut HashMap<String, LearnerSlot>) {
    let victim = learners
        .iter()
        .filter(|(_, slot)| Arc::strong_count(&slot.progress) == 1)
        .min_by_key(|(_, slot)| slot.last_seen.load(Ordering::Relaxed))
        .map(|(id, _)| id.clone());

    match victim {
        Some(id) => {
            learners.remove(&id);
            tracing::info!(learner = %id, "learner evicted, registry full");
        }
        None => tracing::warn!(
            learners = learners.len(),
            "learner registry full and every learner is in use"
        ),
    }
}
