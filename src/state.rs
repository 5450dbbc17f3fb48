use std::sync::Arc;
use std::time::{Instant, SystemTime};

use crate::config::Config;
use crate::services::catalog::{GridSize, ResourceCatalog};
use crate::services::curriculum::Curriculum;
use crate::services::learners::LearnerRegistry;
use crate::services::recommendation::PathPlanner;

/// Shared handles for request handlers. Catalog, curriculum and planner are
/// read-only after startup; learner progress is guarded inside the registry.
#[derive(Clone)]
pub struct AppState {
    started_at: Instant,
    started_at_system: SystemTime,
    catalog: Arc<ResourceCatalog>,
    curriculum: Arc<Curriculum>,
    planner: Arc<PathPlanner>,
    learners: Arc<LearnerRegistry>,
}

impl AppState {
    pub fn new(catalog: ResourceCatalog, curriculum: Curriculum, planner: PathPlanner) -> Self {
        let learners = LearnerRegistry::new(curriculum.default_goal());
        Self {
            started_at: Instant::now(),
            started_at_system: SystemTime::now(),
            catalog: Arc::new(catalog),
            curriculum: Arc::new(curriculum),
            planner: Arc::new(planner),
            learners: Arc::new(learners),
        }
    }

    /// Loads catalog and curriculum as configured, degrading softly on bad data.
    pub fn from_config(config: &Config) -> Self {
        let planner = PathPlanner::new(config.planner());
        let grid = GridSize {
            x: planner.config().grid_size_x,
            y: planner.config().grid_size_y,
        };
        let catalog = ResourceCatalog::load_or_empty(&config.resource_data_path, grid);
        let curriculum =
            Curriculum::load_or_builtin(config.curriculum_path.as_deref(), &config.default_goal);

        if let Some(cycle) = curriculum.find_cycle() {
            tracing::warn!(
                cycle = %cycle.join(" -> "),
                "prerequisite cycle found, resources on it will never become available"
            );
        }

        let unplaced = unplaced_path_resources(&curriculum, &catalog);
        if !unplaced.is_empty() {
            tracing::warn!(
                unplaced = unplaced.len(),
                resources = %unplaced.join(", "),
                "learning paths reference resources missing from the catalog; suggestions toward them end in UNREACHABLE until completed"
            );
        }

        Self::new(catalog, curriculum, planner).with_learner_capacity(config.max_learners)
    }

    /// Replaces the learner registry with an empty one holding at most `capacity` learners.
    pub fn with_learner_capacity(mut self, capacity: usize) -> Self {
        self.learners = Arc::new(LearnerRegistry::with_capacity(
            self.curriculum.default_goal(),
            capacity,
        ));
        self
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    pub fn started_at_system(&self) -> SystemTime {
        self.started_at_system
    }

    pub fn catalog(&self) -> &ResourceCatalog {
        &self.catalog
    }

    pub fn curriculum(&self) -> &Curriculum {
        &self.curriculum
    }

    pub fn planner(&self) -> &PathPlanner {
        &self.planner
    }

    pub fn learners(&self) -> &LearnerRegistry {
        &self.learners
    }
}

/// Learning-path entries the catalog cannot place on the grid, deduplicated.
fn unplaced_path_resources<'a>(curriculum: &'a Curriculum, catalog: &ResourceCatalog) -> Vec<&'a str> {
    let mut unplaced: Vec<&str> = Vec::new();
    for name in curriculum.paths().iter().flat_map(|p| p.resources.iter()) {
        if !catalog.contains(name) && !unplaced.contains(&name.as_str()) {
            unplaced.push(name);
        }
    }
    unplaced
}
