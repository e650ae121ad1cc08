//! Grouping of imported videos by file name.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::naming::{name_or_fallback, NamingService};

/// A named set of video file names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoGroup {
    pub id: Uuid,
    pub name: String,
    pub videos: Vec<String>,
}

impl VideoGroup {
    pub fn new(name: impl Into<String>, videos: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            videos,
        }
    }
}

/// Whether one name contains the other, ignoring case.
pub fn names_related(a: &str, b: &str) -> bool {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    a.contains(&b) || b.contains(&a)
}

/// Partition file names into groups in a single greedy pass.
///
/// The first ungrouped name seeds a group and pulls in every remaining name
/// related to it. Relatedness is only checked against the seed, so the result
/// depends on input order.
pub fn group_by_name(file_names: &[String]) -> Vec<Vec<String>> {
    let mut ungrouped: Vec<&String> = file_names.iter().collect();
    let mut groups = Vec::new();

    while !ungrouped.is_empty() {
        let seed = ungrouped.remove(0);
        let mut group = vec![seed.clone()];
        ungrouped.retain(|name| {
            if names_related(seed, name) {
                group.push((*name).clone());
                false
            } else {
                true
            }
        });
        groups.push(group);
    }

    groups
}

/// Name every group, one request at a time, in order.
pub async fn name_groups<S: NamingService + ?Sized>(
    service: &S,
    groups: &[Vec<String>],
) -> Vec<String> {
    let mut names = Vec::with_capacity(groups.len());
    for group in groups {
        names.push(name_or_fallback(service, group).await);
    }
    names
}
