use chrono::Utc;
use rand::Rng;
use serde::Serialize;

use crate::services::catalog::{GridPosition, GridSize, ResourceCatalog};
use crate::services::curriculum::{CompletedSet, Curriculum};
use crate::services::progress::{iso, PathRecord, Progress};

pub const MIN_STEP_BOUND: usize = 20;
pub const MAX_STEP_BOUND: usize = 50;
/// Largest accepted grid dimension on either axis.
pub const MAX_GRID_DIM: u32 = 1_000;

// Per-step confidence is a placeholder, not a model output.
const STEP_CONFIDENCE_BASE: f64 = 0.85;
const STEP_CONFIDENCE_DECAY: f64 = 0.01;
const STEP_CONFIDENCE_FLOOR: f64 = 0.5;
const STEP_CONFIDENCE_CEIL: f64 = 0.95;
const STEP_CONFIDENCE_JITTER: f64 = 0.05;

/// Which axis to move along when both still differ from the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    HorizontalFirst,
    VerticalFirst,
    Alternate,
    Random,
}

impl TieBreak {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "vertical" | "vertical_first" => Self::VerticalFirst,
            "alternate" => Self::Alternate,
            "random" => Self::Random,
            _ => Self::HorizontalFirst,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HorizontalFirst => "horizontal",
            Self::VerticalFirst => "vertical",
            Self::Alternate => "alternate",
            Self::Random => "random",
        }
    }

    fn prefers_horizontal(&self, step_index: usize, rng: &mut impl Rng) -> bool {
        match self {
            Self::HorizontalFirst => true,
            Self::VerticalFirst => false,
            Self::Alternate => step_index % 2 == 0,
            Self::Random => rng.random_bool(0.5),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepAction {
    Right,
    Left,
    Up,
    Down,
    /// Nothing left to recommend.
    Complete,
    /// The recommended resource has no cell in the catalog.
    Unreachable,
}

impl StepAction {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Unreachable)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathStep {
    pub x: u32,
    pub y: u32,
    pub action: StepAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl PathStep {
    pub fn terminal(at: GridPosition, action: StepAction) -> Self {
        Self {
            x: at.x,
            y: at.y,
            action,
            step: None,
            confidence: None,
        }
    }

    pub fn position(&self) -> GridPosition {
        GridPosition::new(self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannerConfig {
    pub grid_size_x: u32,
    pub grid_size_y: u32,
    pub max_steps: usize,
    pub tie_break: TieBreak,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            grid_size_x: 10,
            grid_size_y: 10,
            max_steps: MAX_STEP_BOUND,
            tie_break: TieBreak::HorizontalFirst,
        }
    }
}

/// First available, not-completed resource: goal path order, then catalog order.
pub fn recommend_next<'a>(
    catalog: &'a ResourceCatalog,
    curriculum: &'a Curriculum,
    completed: &CompletedSet,
    goal: &str,
) -> Option<&'a str> {
    if catalog.is_empty() {
        return None;
    }

    let open = |name: &str| !completed.contains(name) && curriculum.is_available(name, completed);

    curriculum
        .learning_path(goal)
        .iter()
        .map(String::as_str)
        .find(|&name| open(name))
        .or_else(|| {
            catalog
                .iter()
                .map(|r| r.name.as_str())
                .find(|&name| open(name))
        })
}

/// Resources that could be started right now, in catalog order.
pub fn available_resources<'a>(
    catalog: &'a ResourceCatalog,
    curriculum: &Curriculum,
    completed: &CompletedSet,
    limit: usize,
) -> Vec<&'a str> {
    catalog
        .iter()
        .map(|r| r.name.as_str())
        .filter(|&name| !completed.contains(name) && curriculum.is_available(name, completed))
        .take(limit)
        .collect()
}

/// Placeholder confidence that grows with completion and with distance travelled
/// across the grid. Not derived from any learned model.
pub fn confidence_score(
    position: GridPosition,
    completed_count: usize,
    total_resources: usize,
    grid: GridSize,
) -> f64 {
    let completion = if total_resources > 0 {
        (completed_count as f64 / total_resources as f64).min(1.0)
    } else {
        0.0
    };
    let span = grid.x.saturating_sub(1) as f64 + grid.y.saturating_sub(1) as f64;
    let travelled = if span > 0.0 {
        ((position.x as f64 + position.y as f64) / span).min(1.0)
    } else {
        0.0
    };
    (0.5 + 0.35 * completion + 0.15 * travelled).clamp(0.0, 1.0)
}

#[derive(Debug, Clone)]
pub struct PathPlanner {
    config: PlannerConfig,
}

impl PathPlanner {
    pub fn new(mut config: PlannerConfig) -> Self {
        config.grid_size_x = config.grid_size_x.clamp(1, MAX_GRID_DIM);
        config.grid_size_y = config.grid_size_y.clamp(1, MAX_GRID_DIM);
        config.max_steps = config.max_steps.clamp(MIN_STEP_BOUND, MAX_STEP_BOUND);
        Self { config }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn grid(&self) -> GridSize {
        GridSize {
            x: self.config.grid_size_x,
            y: self.config.grid_size_y,
        }
    }

    pub fn build_path(&self, start: GridPosition, target: GridPosition) -> Vec<PathStep> {
        self.build_path_with(start, target, &mut rand::rng())
    }

    /// Greedy axis-aligned walk from `start` to `target`, one cell per step.
    ///
    /// Both ends are clamped to the grid. The walk stops at the target or after
    /// `max_steps` moves, whichever comes first.
    pub fn build_path_with(
        &self,
        start: GridPosition,
        target: GridPosition,
        rng: &mut impl Rng,
    ) -> Vec<PathStep> {
        let grid = self.grid();
        let target = grid.clamp(target);
        let mut current = grid.clamp(start);
        let mut steps = Vec::new();

        while current != target && steps.len() < self.config.max_steps {
            let index = steps.len();
            let dx = current.x != target.x;
            let dy = current.y != target.y;
            let horizontal = match (dx, dy) {
                (true, true) => self.config.tie_break.prefers_horizontal(index, rng),
                (true, false) => true,
                _ => false,
            };

            let action = if horizontal {
                if target.x > current.x {
                    current.x += 1;
                    StepAction::Right
                } else {
                    current.x -= 1;
                    StepAction::Left
                }
            } else if target.y > current.y {
                current.y += 1;
                StepAction::Up
            } else {
                current.y -= 1;
                StepAction::Down
            };
            current = grid.clamp(current);

            steps.push(PathStep {
                x: current.x,
                y: current.y,
                action,
                step: Some(index + 1),
                confidence: Some(self.step_confidence(index, rng)),
            });
        }

        steps
    }

    fn step_confidence(&self, index: usize, rng: &mut impl Rng) -> f64 {
        let mut value = STEP_CONFIDENCE_BASE - STEP_CONFIDENCE_DECAY * index as f64;
        if self.config.tie_break == TieBreak::Random {
            value += rng.random_range(-STEP_CONFIDENCE_JITTER..=STEP_CONFIDENCE_JITTER);
        }
        let value = value.clamp(STEP_CONFIDENCE_FLOOR, STEP_CONFIDENCE_CEIL);
        (value * 1000.0).round() / 1000.0
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathSuggestion {
    pub next_resource: Option<String>,
    pub target_position: Option<GridPosition>,
    pub path: Vec<PathStep>,
    pub confidence: f64,
    pub confidence_kind: &'static str,
    pub rationale: String,
    pub goal: String,
    pub tie_break: &'static str,
}

/// Plans the learner's next move and appends it to their path history.
///
/// A known `goal` also becomes the learner's current goal; an unknown one is
/// resolved to the default goal for this suggestion only.
pub fn suggest(
    planner: &PathPlanner,
    catalog: &ResourceCatalog,
    curriculum: &Curriculum,
    progress: &mut Progress,
    position: Option<GridPosition>,
    goal: Option<&str>,
) -> PathSuggestion {
    let goal = match goal.map(str::trim).filter(|g| !g.is_empty()) {
        Some(requested) if curriculum.has_goal(requested) => {
            progress.adopt_goal(requested);
            requested.to_string()
        }
        Some(requested) => {
            tracing::debug!(goal = requested, "unknown goal, using default for suggestion");
            curriculum.default_goal().to_string()
        }
        None => curriculum.resolve_goal(progress.goal()).to_string(),
    };

    let start = planner.grid().clamp(position.unwrap_or_else(|| progress.position()));
    let next = recommend_next(catalog, curriculum, progress.completed(), &goal);
    let confidence = confidence_score(
        start,
        progress.completed().len(),
        catalog.len(),
        planner.grid(),
    );

    let (path, target_position, rationale) = match next {
        None => {
            let rationale = if catalog.is_empty() {
                "No resources are loaded, nothing to recommend".to_string()
            } else if catalog.iter().all(|r| progress.is_completed(&r.name)) {
                "Every resource is complete".to_string()
            } else {
                "Remaining resources are blocked by unmet prerequisites".to_string()
            };
            (
                vec![PathStep::terminal(start, StepAction::Complete)],
                None,
                rationale,
            )
        }
        Some(name) => match catalog.get(name) {
            None => (
                vec![PathStep::terminal(start, StepAction::Unreachable)],
                None,
                format!("'{name}' is recommended but has no position on the grid"),
            ),
            Some(resource) => {
                let on_path = curriculum.learning_path(&goal).iter().any(|r| r == name);
                let rationale = if on_path {
                    format!(
                        "'{name}' is the next open step on the '{goal}' path; all of its prerequisites are complete"
                    )
                } else {
                    format!(
                        "The '{goal}' path has no open steps; '{name}' is the next available resource"
                    )
                };
                (
                    planner.build_path(start, resource.position),
                    Some(resource.position),
                    rationale,
                )
            }
        },
    };

    tracing::debug!(
        goal = %goal,
        next = next.unwrap_or("-"),
        steps = path.len(),
        "path suggested"
    );

    let next_resource = next.map(str::to_string);
    progress.record_path(PathRecord {
        generated_at: iso(Utc::now()),
        goal: goal.clone(),
        target: next_resource.clone(),
        steps: path.clone(),
    });

    PathSuggestion {
        next_resource,
        target_position,
        path,
        confidence,
        confidence_kind: "placeholder",
        rationale,
        goal,
        tie_break: planner.config().tie_break.as_str(),
    }
}
