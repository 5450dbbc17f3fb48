use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read resource data: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid resource data: {0}")]
    Json(#[from] serde_json::Error),
    #[error("resource data must be a JSON object keyed by resource name")]
    Shape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Quiz,
    Tutorial,
    #[default]
    Lecture,
}

impl ResourceKind {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "quiz" => Self::Quiz,
            "tutorial" => Self::Tutorial,
            _ => Self::Lecture,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Quiz => "quiz",
            Self::Tutorial => "tutorial",
            Self::Lecture => "lecture",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GridPosition {
    pub x: u32,
    pub y: u32,
}

impl GridPosition {
    pub const ORIGIN: GridPosition = GridPosition { x: 0, y: 0 };

    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GridSize {
    pub x: u32,
    pub y: u32,
}

impl GridSize {
    pub fn clamp(&self, position: GridPosition) -> GridPosition {
        GridPosition {
            x: position.x.min(self.x.saturating_sub(1)),
            y: position.y.min(self.y.saturating_sub(1)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub name: String,
    pub position: GridPosition,
    pub kind: ResourceKind,
}

#[derive(Debug, Deserialize)]
struct RawResource {
    #[serde(default, alias = "x", deserialize_with = "coordinate")]
    x_coordinate: Option<f64>,
    #[serde(default, alias = "y", deserialize_with = "coordinate")]
    y_coordinate: Option<f64>,
    #[serde(default, rename = "type", alias = "kind")]
    kind: Option<String>,
}

/// Accepts plain numbers and numeric strings; anything else reads as missing.
fn coordinate<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}

/// Scales a normalized coordinate onto `[0, dim - 1]`.
pub fn to_grid_cell(normalized: f64, dim: u32) -> u32 {
    if !normalized.is_finite() || normalized <= 0.0 || dim == 0 {
        return 0;
    }
    let cell = (normalized * dim as f64).floor();
    let max = dim.saturating_sub(1) as f64;
    cell.min(max) as u32
}

/// Read-only set of learning resources placed on the grid.
#[derive(Debug, Clone)]
pub struct ResourceCatalog {
    resources: Vec<Resource>,
    index: HashMap<String, usize>,
    grid: GridSize,
}

impl ResourceCatalog {
    pub fn empty(grid: GridSize) -> Self {
        Self {
            resources: Vec::new(),
            index: HashMap::new(),
            grid,
        }
    }

    pub fn from_resources(resources: Vec<Resource>, grid: GridSize) -> Self {
        let mut catalog = Self::empty(grid);
        for mut resource in resources {
            if catalog.index.contains_key(&resource.name) {
                tracing::warn!(resource = %resource.name, "duplicate resource ignored");
                continue;
            }
            resource.position = grid.clamp(resource.position);
            catalog
                .index
                .insert(resource.name.clone(), catalog.resources.len());
            catalog.resources.push(resource);
        }
        catalog
    }

    pub fn from_json(raw: &str, grid: GridSize) -> Result<Self, CatalogError> {
        let value: serde_json::Value = serde_json::from_str(raw)?;
        let serde_json::Value::Object(entries) = value else {
            return Err(CatalogError::Shape);
        };

        let mut resources = Vec::with_capacity(entries.len());
        for (name, entry) in entries {
            let raw = match RawResource::deserialize(entry) {
                Ok(raw) => raw,
                Err(err) => {
                    tracing::warn!(resource = %name, error = %err, "skipping malformed resource");
                    continue;
                }
            };
            let (Some(x), Some(y)) = (raw.x_coordinate, raw.y_coordinate) else {
                tracing::warn!(resource = %name, "skipping resource without numeric coordinates");
                continue;
            };
            resources.push(Resource {
                position: GridPosition::new(to_grid_cell(x, grid.x), to_grid_cell(y, grid.y)),
                kind: raw
                    .kind
                    .as_deref()
                    .map(ResourceKind::parse)
                    .unwrap_or_default(),
                name,
            });
        }

        Ok(Self::from_resources(resources, grid))
    }

    pub fn load(path: &Path, grid: GridSize) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw, grid)
    }

    /// Loads the catalog, degrading to an empty one when the file is unusable.
    pub fn load_or_empty(path: &Path, grid: GridSize) -> Self {
        match Self::load(path, grid) {
            Ok(catalog) => {
                tracing::info!(
                    path = %path.display(),
                    resources = catalog.len(),
                    "resource catalog loaded"
                );
                catalog
            }
            Err(err) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %err,
                    "resource catalog unavailable, continuing with empty catalog"
                );
                Self::empty(grid)
            }
        }
    }

    pub fn grid(&self) -> GridSize {
        self.grid
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Resource> {
        self.index.get(name).map(|&i| &self.resources[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Resource> {
        self.resources.iter()
    }

    /// Name and grid cell of every resource, in catalog order.
    pub fn positions(&self) -> Vec<(&str, GridPosition)> {
        self.resources
            .iter()
            .map(|r| (r.name.as_str(), r.position))
            .collect()
    }
}
