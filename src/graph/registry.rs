use std::fmt;

use serde::{Deserialize, Serialize};

/// Input number on the logger (0 is the cold junction).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChannelId(pub u32);
impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Input {}", self.0)
    }
}
#[derive(Clone, Debug, PartialEq)]
pub struct ChannelEntry {
    pub id: ChannelId,
    pub name: String,
    pub visible: bool,
}
/// Ordered set of the channels of the current run.
#[derive(Clone, Debug, Default)]
pub struct ChannelRegistry {
    entries: Vec<ChannelEntry>,
}
impl ChannelRegistry {
    /// Replaces the channel set. Duplicate ids keep their first occurrence.
    pub fn reset(&mut self, channels: impl IntoIterator<Item = (ChannelId, String)>) {
        self.entries.clear();
        for (id, name) in channels {
            if self.contains(id) {
                log::warn!("ignoring duplicate channel {id} ({name})");
                continue;
            }
            self.entries.push(ChannelEntry {
                id,
                name,
                visible: true,
            });
        }
    }
    pub fn contains(&self, id: ChannelId) -> bool {
        self.get(id).is_some()
    }
    pub fn get(&self, id: ChannelId) -> Option<&ChannelEntry> {
        self.entries.iter().find(|e| e.id == id)
    }
    /// Returns false when the channel is unknown.
    pub fn set_visible(&mut self, id: ChannelId, visible: bool) -> bool {
        match self.entries.iter_mut().find(|e| e.id == id) {
            Some(entry) => {
                entry.visible = visible;
                true
            }
            None => false,
        }
    }
    #[cfg(test)]
    pub fn is_visible(&self, id: ChannelId) -> bool {
        self.get(id).map(|e| e.visible).unwrap_or(false)
    }
    pub fn iter(&self) -> impl Iterator<Item = &ChannelEntry> {
        self.entries.iter()
    }
    pub fn visible(&self) -> impl Iterator<Item = &ChannelEntry> {
        self.entries.iter().filter(|e| e.visible)
    }
    /// Position in the run's channel list, used for palette lookup.
    pub fn slot(&self, id: ChannelId) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
