//! Project: the persisted editing state of one session.

use serde::{Deserialize, Serialize};

use crate::animation::Animation;
use crate::registry::TimelineRegistry;

/// Default canvas background colour.
pub const DEFAULT_BACKGROUND: &str = "#111111";

fn default_background() -> String {
    DEFAULT_BACKGROUND.to_string()
}

/// Timelines, animations and canvas settings of one project.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub name: String,
    #[serde(default)]
    pub registry: TimelineRegistry,
    #[serde(default)]
    pub animations: Vec<Animation>,
    #[serde(default = "default_background")]
    pub background_color: String,
}

impl Project {
    /// Create an empty project.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            registry: TimelineRegistry::new(),
            animations: Vec::new(),
            background_color: default_background(),
        }
    }
}
