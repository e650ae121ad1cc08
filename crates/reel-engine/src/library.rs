//! Imported media resources.

use std::cmp::Ordering;

use reel_media::MediaInfo;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

/// What kind of element a resource can become.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceKind {
    Video,
    Audio,
    Image,
}

/// An imported file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaResource {
    pub id: Uuid,
    pub kind: ResourceKind,
    pub url: String,
    pub file_name: String,
    pub info: MediaInfo,
}

impl MediaResource {
    pub fn new(kind: ResourceKind, url: impl Into<String>, file_name: impl Into<String>, info: MediaInfo) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            url: url.into(),
            file_name: file_name.into(),
            info,
        }
    }

    /// Whether the URL is a browser-style object URL that must be released.
    pub fn is_object_url(&self) -> bool {
        self.url.starts_with("blob:")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    FileName,
    Duration,
    Size,
    DateAdded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

/// Imported resources, kept in display order.
///
/// `generation` changes whenever the set or order of resources changes, so
/// asynchronous work planned against an older state can be recognised.
#[derive(Debug, Clone, Default)]
pub struct MediaLibrary {
    resources: Vec<MediaResource>,
    generation: u64,
}

impl MediaLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn add(&mut self, resource: MediaResource) -> Uuid {
        let id = resource.id;
        debug!(resource = %id, file = %resource.file_name, "Imported resource");
        self.resources.push(resource);
        self.generation += 1;
        id
    }

    pub fn remove(&mut self, id: Uuid) -> Option<MediaResource> {
        let index = self.resources.iter().position(|r| r.id == id)?;
        self.generation += 1;
        Some(self.resources.remove(index))
    }

    pub fn get(&self, id: Uuid) -> Option<&MediaResource> {
        self.resources.iter().find(|r| r.id == id)
    }

    pub fn all(&self) -> &[MediaResource] {
        &self.resources
    }

    /// Resources of one kind, in display order.
    pub fn of_kind(&self, kind: ResourceKind) -> impl Iterator<Item = &MediaResource> + '_ {
        self.resources.iter().filter(move |r| r.kind == kind)
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Reorder the resources of one kind. Other kinds keep their slots.
    pub fn sort(&mut self, kind: ResourceKind, key: SortKey, order: SortOrder) {
        let slots: Vec<usize> = self
            .resources
            .iter()
            .enumerate()
            .filter(|(_, r)| r.kind == kind)
            .map(|(i, _)| i)
            .collect();
        let mut sorted: Vec<MediaResource> = slots.iter().map(|&i| self.resources[i].clone()).collect();
        sorted.sort_by(|a, b| {
            let ord = compare(a, b, key);
            match order {
                SortOrder::Ascending => ord,
                SortOrder::Descending => ord.reverse(),
            }
        });
        for (slot, resource) in slots.into_iter().zip(sorted) {
            self.resources[slot] = resource;
        }
        self.generation += 1;
    }

    /// Drop every resource, returning the object URLs that need releasing.
    pub fn cleanup(&mut self) -> Vec<String> {
        let released = self
            .resources
            .drain(..)
            .filter(|r| r.is_object_url())
            .map(|r| r.url)
            .collect();
        self.generation += 1;
        released
    }
}

fn compare(a: &MediaResource, b: &MediaResource, key: SortKey) -> Ordering {
    match key {
        SortKey::FileName => a
            .file_name
            .to_lowercase()
            .cmp(&b.file_name.to_lowercase())
            .then_with(|| a.file_name.cmp(&b.file_name)),
        SortKey::Duration => a
            .info
            .duration_ms
            .unwrap_or(0)
            .cmp(&b.info.duration_ms.unwrap_or(0)),
        SortKey::Size => a.info.byte_size.cmp(&b.info.byte_size),
        SortKey::DateAdded => a.info.import_timestamp.cmp(&b.info.import_timestamp),
    }
}
