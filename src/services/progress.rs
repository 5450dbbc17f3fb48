use std::collections::VecDeque;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::services::catalog::{GridPosition, ResourceCatalog};
use crate::services::curriculum::{CompletedSet, Curriculum};
use crate::services::recommendation::PathStep;

pub const COMPLETION_SCORE: u32 = 10;
/// Path-history entries kept per learner; older paths are dropped.
pub const RECENT_HISTORY_LEN: usize = 5;
const MAX_ACTIVITY_LEN: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AchievementRequirement {
    Completed(usize),
    EntireCatalog,
}

#[derive(Debug, Clone, Copy)]
pub struct AchievementDef {
    pub name: &'static str,
    pub description: &'static str,
    pub requirement: AchievementRequirement,
}

pub const ACHIEVEMENTS: &[AchievementDef] = &[
    AchievementDef {
        name: "First Steps",
        description: "Complete your first resource",
        requirement: AchievementRequirement::Completed(1),
    },
    AchievementDef {
        name: "Getting Started",
        description: "Complete 5 resources",
        requirement: AchievementRequirement::Completed(5),
    },
    AchievementDef {
        name: "Making Progress",
        description: "Complete 10 resources",
        requirement: AchievementRequirement::Completed(10),
    },
    AchievementDef {
        name: "Dedicated Learner",
        description: "Complete 20 resources",
        requirement: AchievementRequirement::Completed(20),
    },
    AchievementDef {
        name: "Expert",
        description: "Complete 50 resources",
        requirement: AchievementRequirement::Completed(50),
    },
    AchievementDef {
        name: "Master",
        description: "Complete every resource",
        requirement: AchievementRequirement::EntireCatalog,
    },
];

impl AchievementDef {
    /// `(achieved, target)` for this milestone, or `None` when it cannot be met.
    fn standing(&self, completed: usize, in_catalog: usize, catalog_len: usize) -> Option<(usize, usize)> {
        match self.requirement {
            AchievementRequirement::Completed(n) => Some((completed, n)),
            AchievementRequirement::EntireCatalog if catalog_len > 0 => {
                Some((in_catalog, catalog_len))
            }
            AchievementRequirement::EntireCatalog => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementStatus {
    pub name: &'static str,
    pub description: &'static str,
    pub requirement: usize,
    pub unlocked: bool,
    pub progress: u8,
}

#[derive(Debug, thiserror::Error)]
pub enum ProgressError {
    #[error("{0}")]
    Validation(String),
    #[error("resource not found: {0}")]
    UnknownResource(String),
    #[error("prerequisites not met for {resource}: {}", .missing.join(", "))]
    PrerequisitesNotMet {
        resource: String,
        missing: Vec<String>,
    },
    #[error("unknown goal: {goal}")]
    UnknownGoal { goal: String, valid: Vec<String> },
    #[error("no learning session is active")]
    NoActiveSession,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    ResourceCompleted,
    PathSuggested,
    GoalChanged,
    SessionStarted,
    SessionEnded,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    pub at: String,
    pub kind: ActivityKind,
    pub detail: String,
}

/// One generated path in the learner's history.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathRecord {
    pub generated_at: String,
    pub goal: String,
    pub target: Option<String>,
    pub steps: Vec<PathStep>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionOutcome {
    pub resource: String,
    pub already_completed: bool,
    pub score: u32,
    pub completed_count: usize,
    pub position: GridPosition,
    pub new_achievements: Vec<String>,
}

#[derive(Debug, Clone)]
struct Session {
    number: u32,
    started_at: DateTime<Utc>,
    resources_completed: usize,
    paths_generated: usize,
    actions: usize,
}

impl Session {
    fn summary(&self, ended_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> SessionSummary {
        SessionSummary {
            number: self.number,
            started_at: iso(self.started_at),
            ended_at: ended_at.map(iso),
            duration_seconds: seconds_between(self.started_at, ended_at.unwrap_or(now)),
            resources_completed: self.resources_completed,
            paths_generated: self.paths_generated,
            actions: self.actions,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub number: u32,
    pub started_at: String,
    pub ended_at: Option<String>,
    pub duration_seconds: f64,
    pub resources_completed: usize,
    pub paths_generated: usize,
    pub actions: usize,
}

/// Result of starting a session: the one it closed, if any, and the new one.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionChange {
    pub ended: Option<SessionSummary>,
    pub started: SessionSummary,
    pub session_count: u32,
    pub total_time_spent: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressStats {
    pub completed_resources: Vec<String>,
    pub completed_count: usize,
    pub total_resources: usize,
    pub progress_percentage: f64,
    pub current_position: GridPosition,
    pub score: u32,
    pub current_goal: String,
    pub recent_paths: Vec<PathRecord>,
    pub paths_generated: usize,
    pub achievements: Vec<AchievementStatus>,
    pub unlocked_achievements: Vec<String>,
    pub session_started_at: Option<String>,
    pub session_seconds: i64,
    pub session_count: u32,
    pub total_time_spent: f64,
    pub last_updated: String,
}

/// Volatile learning state of a single learner.
///
/// A fresh instance opens learning session 1; ending a session folds its
/// duration into `total_time_spent`.
#[derive(Debug, Clone)]
pub struct Progress {
    completed: CompletedSet,
    position: GridPosition,
    score: u32,
    goal: String,
    history: VecDeque<PathRecord>,
    paths_generated: usize,
    achievements: Vec<String>,
    activity: VecDeque<ActivityEntry>,
    session: Option<Session>,
    session_count: u32,
    total_time_spent: f64,
    last_updated: DateTime<Utc>,
}

impl Progress {
    pub fn new(goal: &str) -> Self {
        let now = Utc::now();
        Self {
            completed: CompletedSet::new(),
            position: GridPosition::ORIGIN,
            score: 0,
            goal: goal.to_string(),
            history: VecDeque::with_capacity(RECENT_HISTORY_LEN),
            paths_generated: 0,
            achievements: Vec::new(),
            activity: VecDeque::new(),
            session: Some(Session {
                number: 1,
                started_at: now,
                resources_completed: 0,
                paths_generated: 0,
                actions: 0,
            }),
            session_count: 1,
            total_time_spent: 0.0,
            last_updated: now,
        }
    }

    pub fn completed(&self) -> &CompletedSet {
        &self.completed
    }

    pub fn is_completed(&self, resource: &str) -> bool {
        self.completed.contains(resource)
    }

    pub fn position(&self) -> GridPosition {
        self.position
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn goal(&self) -> &str {
        &self.goal
    }

    pub fn achievements(&self) -> &[String] {
        &self.achievements
    }

    /// The last [`RECENT_HISTORY_LEN`] generated paths, oldest first.
    pub fn history(&self) -> impl ExactSizeIterator<Item = &PathRecord> {
        self.history.iter()
    }

    pub fn paths_generated(&self) -> usize {
        self.paths_generated
    }

    pub fn activity(&self) -> impl Iterator<Item = &ActivityEntry> {
        self.activity.iter()
    }

    pub fn session_count(&self) -> u32 {
        self.session_count
    }

    /// Seconds accumulated by ended sessions.
    pub fn total_time_spent(&self) -> f64 {
        self.total_time_spent
    }

    pub fn current_session(&self) -> Option<SessionSummary> {
        self.session.as_ref().map(|s| s.summary(None, Utc::now()))
    }

    /// Records a completion after checking prerequisites.
    ///
    /// Names are accepted when the catalog places them or the curriculum
    /// mentions them. Completing an already-completed resource leaves the
    /// set, the score and the achievements untouched; only a supplied
    /// position is applied.
    pub fn mark_completed(
        &mut self,
        resource: &str,
        position: Option<GridPosition>,
        catalog: &ResourceCatalog,
        curriculum: &Curriculum,
    ) -> Result<CompletionOutcome, ProgressError> {
        let resource = resource.trim();
        if resource.is_empty() {
            return Err(ProgressError::Validation(
                "resource name is required".to_string(),
            ));
        }
        if !catalog.contains(resource) && !curriculum.is_known(resource) {
            return Err(ProgressError::UnknownResource(resource.to_string()));
        }

        let already_completed = self.completed.contains(resource);
        if !already_completed {
            let missing = curriculum.missing_prerequisites(resource, &self.completed);
            if !missing.is_empty() {
                return Err(ProgressError::PrerequisitesNotMet {
                    resource: resource.to_string(),
                    missing,
                });
            }
        }

        if let Some(position) = position {
            self.position = catalog.grid().clamp(position);
        }

        let mut new_achievements = Vec::new();
        if !already_completed {
            self.completed.insert(resource.to_string());
            self.score += COMPLETION_SCORE;
            new_achievements = self.unlock_achievements(catalog);
            if let Some(session) = self.session.as_mut() {
                session.resources_completed += 1;
            }
            self.log(ActivityKind::ResourceCompleted, resource.to_string());
        }
        self.touch();

        Ok(CompletionOutcome {
            resource: resource.to_string(),
            already_completed,
            score: self.score,
            completed_count: self.completed.len(),
            position: self.position,
            new_achievements,
        })
    }

    pub fn set_goal(&mut self, goal: &str, curriculum: &Curriculum) -> Result<(), ProgressError> {
        let goal = goal.trim();
        if !curriculum.has_goal(goal) {
            return Err(ProgressError::UnknownGoal {
                goal: goal.to_string(),
                valid: curriculum.goal_ids(),
            });
        }
        self.adopt_goal(goal);
        Ok(())
    }

    /// Switches goal without validation; callers check `has_goal` first.
    pub(crate) fn adopt_goal(&mut self, goal: &str) {
        if self.goal != goal {
            self.log(
                ActivityKind::GoalChanged,
                format!("{} -> {}", self.goal, goal),
            );
            self.goal = goal.to_string();
        }
        self.touch();
    }

    /// Replaces the whole state with a fresh instance.
    pub fn reset(&mut self, default_goal: &str) {
        *self = Self::new(default_goal);
    }

    pub fn record_path(&mut self, record: PathRecord) {
        let detail = match &record.target {
            Some(target) => format!("{} steps toward {}", record.steps.len(), target),
            None => "no recommendation".to_string(),
        };
        if self.history.len() >= RECENT_HISTORY_LEN {
            self.history.pop_front();
        }
        self.history.push_back(record);
        self.paths_generated += 1;
        if let Some(session) = self.session.as_mut() {
            session.paths_generated += 1;
        }
        self.log(ActivityKind::PathSuggested, detail);
        self.touch();
    }

    pub fn start_session(&mut self) -> SessionChange {
        self.start_session_at(Utc::now())
    }

    /// Opens a new session, closing the active one first.
    pub fn start_session_at(&mut self, now: DateTime<Utc>) -> SessionChange {
        let ended = self.end_session_at(now).ok();
        self.session_count += 1;
        let session = Session {
            number: self.session_count,
            started_at: now,
            resources_completed: 0,
            paths_generated: 0,
            actions: 0,
        };
        let started = session.summary(None, now);
        self.session = Some(session);
        self.log(ActivityKind::SessionStarted, format!("session {}", self.session_count));
        self.last_updated = now;

        SessionChange {
            ended,
            started,
            session_count: self.session_count,
            total_time_spent: self.total_time_spent,
        }
    }

    pub fn end_session(&mut self) -> Result<SessionSummary, ProgressError> {
        self.end_session_at(Utc::now())
    }

    pub fn end_session_at(&mut self, now: DateTime<Utc>) -> Result<SessionSummary, ProgressError> {
        let session = self.session.take().ok_or(ProgressError::NoActiveSession)?;
        let summary = session.summary(Some(now), now);
        self.total_time_spent += summary.duration_seconds;
        self.log(
            ActivityKind::SessionEnded,
            format!("session {} after {:.0}s", summary.number, summary.duration_seconds),
        );
        self.last_updated = now;
        Ok(summary)
    }

    fn completed_in_catalog(&self, catalog: &ResourceCatalog) -> usize {
        catalog
            .iter()
            .filter(|r| self.completed.contains(&r.name))
            .count()
    }

    fn unlock_achievements(&mut self, catalog: &ResourceCatalog) -> Vec<String> {
        let count = self.completed.len();
        let in_catalog = self.completed_in_catalog(catalog);
        let mut unlocked = Vec::new();
        for def in ACHIEVEMENTS {
            let Some((achieved, target)) = def.standing(count, in_catalog, catalog.len()) else {
                continue;
            };
            if achieved >= target && !self.achievements.iter().any(|a| a == def.name) {
                self.achievements.push(def.name.to_string());
                unlocked.push(def.name.to_string());
            }
        }
        unlocked
    }

    pub fn achievement_states(&self, catalog: &ResourceCatalog) -> Vec<AchievementStatus> {
        let count = self.completed.len();
        let in_catalog = self.completed_in_catalog(catalog);
        ACHIEVEMENTS
            .iter()
            .map(|def| {
                let unlocked = self.achievements.iter().any(|a| a == def.name);
                let (achieved, target) = def
                    .standing(count, in_catalog, catalog.len())
                    .unwrap_or((0, 0));
                let progress = if unlocked {
                    100
                } else if target > 0 {
                    ((achieved as f64 / target as f64) * 100.0).round().clamp(0.0, 100.0) as u8
                } else {
                    0
                };
                AchievementStatus {
                    name: def.name,
                    description: def.description,
                    requirement: target,
                    unlocked,
                    progress,
                }
            })
            .collect()
    }

    pub fn stats(&self, catalog: &ResourceCatalog) -> ProgressStats {
        let total = catalog.len();
        let percentage = if total > 0 {
            let done = self.completed_in_catalog(catalog);
            ((done as f64 / total as f64) * 10_000.0).round() / 100.0
        } else {
            0.0
        };
        let now = Utc::now();

        ProgressStats {
            completed_resources: self.completed.iter().cloned().collect(),
            completed_count: self.completed.len(),
            total_resources: total,
            progress_percentage: percentage,
            current_position: self.position,
            score: self.score,
            current_goal: self.goal.clone(),
            recent_paths: self.history.iter().cloned().collect(),
            paths_generated: self.paths_generated,
            achievements: self.achievement_states(catalog),
            unlocked_achievements: self.achievements.clone(),
            session_started_at: self.session.as_ref().map(|s| iso(s.started_at)),
            session_seconds: self
                .session
                .as_ref()
                .map(|s| (now - s.started_at).num_seconds().max(0))
                .unwrap_or(0),
            session_count: self.session_count,
            total_time_spent: self.total_time_spent,
            last_updated: iso(self.last_updated),
        }
    }

    fn log(&mut self, kind: ActivityKind, detail: String) {
        if self.activity.len() >= MAX_ACTIVITY_LEN {
            self.activity.pop_front();
        }
        self.activity.push_back(ActivityEntry {
            at: iso(Utc::now()),
            kind,
            detail,
        });
        if let Some(session) = self.session.as_mut() {
            session.actions += 1;
        }
    }

    fn touch(&mut self) {
        self.last_updated = Utc::now();
    }
}

pub(crate) fn iso(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn seconds_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    ((end - start).num_milliseconds().max(0) as f64) / 1000.0
}
