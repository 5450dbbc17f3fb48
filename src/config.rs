use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use crate::services::recommendation::{
    PlannerConfig, TieBreak, MAX_GRID_DIM, MAX_STEP_BOUND, MIN_STEP_BOUND,
};

pub const DEFAULT_GOAL: &str = "complete_course";
pub const DEFAULT_MAX_LEARNERS: usize = 10_000;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    pub log_dir: Option<PathBuf>,
    pub resource_data_path: PathBuf,
    pub curriculum_path: Option<PathBuf>,
    pub grid_size_x: u32,
    pub grid_size_y: u32,
    pub max_path_steps: usize,
    pub tie_break: TieBreak,
    pub default_goal: String,
    pub max_learners: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)),
            port: 5000,
            log_level: "info".to_string(),
            log_dir: None,
            resource_data_path: PathBuf::from("data/resources.json"),
            curriculum_path: None,
            grid_size_x: 10,
            grid_size_y: 10,
            max_path_steps: MAX_STEP_BOUND,
            tie_break: TieBreak::HorizontalFirst,
            default_goal: DEFAULT_GOAL.to_string(),
            max_learners: DEFAULT_MAX_LEARNERS,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let port = env_parse::<u16>("PORT").unwrap_or(defaults.port);
        let host = env_parse::<IpAddr>("HOST").unwrap_or(defaults.host);
        let log_level = std::env::var("RUST_LOG").unwrap_or(defaults.log_level);
        let log_dir = if env_bool("ENABLE_FILE_LOGS").unwrap_or(false) {
            Some(PathBuf::from(
                env_string("LOG_DIR").unwrap_or_else(|| "./logs".to_string()),
            ))
        } else {
            None
        };

        let resource_data_path = env_string("RESOURCE_DATA_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.resource_data_path);
        let curriculum_path = env_string("CURRICULUM_PATH").map(PathBuf::from);

        let grid_size_x = env_grid_dim("GRID_SIZE_X", defaults.grid_size_x);
        let grid_size_y = env_grid_dim("GRID_SIZE_Y", defaults.grid_size_y);
        let max_learners = env_parse::<usize>("MAX_LEARNERS")
            .unwrap_or(defaults.max_learners)
            .max(1);

        let max_path_steps = env_parse::<usize>("PATH_MAX_STEPS")
            .unwrap_or(defaults.max_path_steps)
            .clamp(MIN_STEP_BOUND, MAX_STEP_BOUND);

        let tie_break = env_string("PATH_TIE_BREAK")
            .map(|value| TieBreak::parse(&value))
            .unwrap_or(defaults.tie_break);

        let default_goal = env_string("DEFAULT_GOAL").unwrap_or(defaults.default_goal);

        Self {
            host,
            port,
            log_level,
            log_dir,
            resource_data_path,
            curriculum_path,
            grid_size_x,
            grid_size_y,
            max_path_steps,
            tie_break,
            default_goal,
            max_learners,
        }
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn planner(&self) -> PlannerConfig {
        PlannerConfig {
            grid_size_x: self.grid_size_x,
            grid_size_y: self.grid_size_y,
            max_steps: self.max_path_steps,
            tie_break: self.tie_break,
        }
    }
}

fn env_string(key: &str) -> Option<String> {
    let value = std::env::var(key).ok()?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_string())
}

fn env_bool(key: &str) -> Option<bool> {
    let value = env_string(key)?;
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env_string(key)?.parse::<T>().ok()
}

fn env_grid_dim(key: &str, default: u32) -> u32 {
    env_parse::<u32>(key)
        .unwrap_or(default)
        .clamp(1, MAX_GRID_DIM)
}
