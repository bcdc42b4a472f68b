//! Channel grouping and the visible channel sub-window.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::data::recording::{ChannelMetadata, ChannelType};

/// Name of the pseudo-group holding every channel.
pub const ALL_CHANNELS: &str = "All Channels";
/// Catch-all group for names no rule matched.
pub const OTHER_GROUP: &str = "Other";

/// Channels whose name starts with `prefix` (case-sensitive) join `group`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRule {
    pub prefix: String,
    pub group: String,
}

impl GroupRule {
    pub fn new(prefix: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            group: group.into(),
        }
    }

    /// Rule table used when none is configured.
    pub fn default_table() -> Vec<GroupRule> {
        ["Fp", "F", "C", "P", "O", "T", "EOG", "ECG", "EMG"]
            .into_iter()
            .map(|p| GroupRule::new(p, p))
            .collect()
    }
}

/// Partition `names` by the first matching rule, in table order.
///
/// Empty groups are omitted; unmatched names go to [`OTHER_GROUP`]. The
/// [`ALL_CHANNELS`] pseudo-group is always first.
pub fn build_groups(names: &[String], rules: &[GroupRule]) -> Vec<(String, Vec<usize>)> {
    let mut groups: Vec<(String, Vec<usize>)> = Vec::new();
    let mut other = Vec::new();
    for (idx, name) in names.iter().enumerate() {
        let Some(rule) = rules.iter().find(|r| name.starts_with(r.prefix.as_str())) else {
            other.push(idx);
            continue;
        };
        match groups.iter_mut().find(|(g, _)| *g == rule.group) {
            Some((_, members)) => members.push(idx),
            None => groups.push((rule.group.clone(), vec![idx])),
        }
    }
    // Keep table order regardless of which channel came first.
    groups.sort_by_key(|(g, _)| rules.iter().position(|r| r.group == *g));
    let mut out = Vec::with_capacity(groups.len() + 2);
    out.push((ALL_CHANNELS.to_string(), (0..names.len()).collect()));
    out.extend(groups);
    if !other.is_empty() {
        out.push((OTHER_GROUP.to_string(), other));
    }
    out
}

/// Owns the active group, the channel offset within it and the visible count.
///
/// Grouping is fixed once built; only the window over it moves.
#[derive(Debug, Clone)]
pub struct ChannelIndex {
    names: Vec<String>,
    types: Vec<ChannelType>,
    bad: BTreeSet<String>,
    groups: Vec<(String, Vec<usize>)>,
    active: usize,
    offset: usize,
    count: usize,
}

impl ChannelIndex {
    pub fn new(metadata: &ChannelMetadata, rules: &[GroupRule], count: usize) -> Self {
        let groups = build_groups(&metadata.names, rules);
        let mut idx = Self {
            names: metadata.names.clone(),
            types: metadata.types.clone(),
            bad: metadata.bad_channels.clone(),
            groups,
            active: 0,
            offset: 0,
            count: 1,
        };
        idx.count = idx.clamp_count(count);
        idx
    }

    pub fn total_channels(&self) -> usize {
        self.names.len()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub fn channel_type(&self, index: usize) -> Option<ChannelType> {
        self.types.get(index).copied()
    }

    pub fn position_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn group_names(&self) -> Vec<&str> {
        self.groups.iter().map(|(g, _)| g.as_str()).collect()
    }

    pub fn group(&self) -> &str {
        self.groups
            .get(self.active)
            .map_or(ALL_CHANNELS, |(g, _)| g.as_str())
    }

    pub fn group_members(&self) -> &[usize] {
        self.groups
            .get(self.active)
            .map_or(&[][..], |(_, m)| m.as_slice())
    }

    pub fn group_size(&self) -> usize {
        self.group_members().len()
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Largest valid offset for the active group and count.
    pub fn max_offset(&self) -> usize {
        self.group_size().saturating_sub(self.count)
    }

    /// Switch group. Resets the offset to 0. Unknown names are ignored.
    /// Returns whether the group changed.
    pub fn set_group(&mut self, name: &str) -> bool {
        let Some(pos) = self.groups.iter().position(|(g, _)| g == name) else {
            warn!(group = name, "unknown channel group ignored");
            return false;
        };
        let changed = pos != self.active || self.offset != 0;
        self.active = pos;
        self.offset = 0;
        debug!(group = name, size = self.group_size(), "channel group selected");
        changed
    }

    /// Move the first visible channel. Clamped to `0..=max_offset()`.
    pub fn set_offset(&mut self, index: usize) -> bool {
        let clamped = index.min(self.max_offset());
        let changed = clamped != self.offset;
        self.offset = clamped;
        changed
    }

    /// Change the number of visible channels, clamped to `1..=total`, then
    /// re-clamp the offset.
    pub fn set_count(&mut self, n: usize) -> bool {
        let before = (self.count, self.offset);
        self.count = self.clamp_count(n);
        self.offset = self.offset.min(self.max_offset());
        before != (self.count, self.offset)
    }

    /// Recording indices of the visible channels, top row first.
    pub fn visible_channel_indices(&self) -> Vec<usize> {
        self.group_members()
            .iter()
            .skip(self.offset)
            .take(self.count)
            .copied()
            .collect()
    }

    /// First `n` channels of the active group.
    pub fn leading_channels(&self, n: usize) -> Vec<usize> {
        self.group_members().iter().take(n).copied().collect()
    }

    pub fn is_bad(&self, channel_name: &str) -> bool {
        self.bad.contains(channel_name)
    }

    pub fn bad_channels(&self) -> &BTreeSet<String> {
        &self.bad
    }

    fn clamp_count(&self, n: usize) -> usize {
        n.clamp(1, self.total_channels().max(1))
    }
}
