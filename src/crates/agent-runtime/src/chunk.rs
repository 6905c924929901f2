//! Tool-call chunk reassembly (spec §4.1 "Tool-call streaming and chunk
//! reassembly", §8 invariant 6).
//!
//! Ported from the source's `_process_tool_call_chunks`: group fragments by
//! `index`, concatenate `args` deltas in arrival order, adopt the first
//! non-empty `name`/`id` seen for that index, and warn (never fail) on a
//! name mismatch within a group. Fragments that arrive without an `index`
//! are never merged with anything else — each becomes its own standalone
//! group.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// One incremental fragment of a tool call as emitted by a streaming
/// provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolCallChunkFragment {
    pub index: Option<u32>,
    pub id: Option<String>,
    pub name: Option<String>,
    pub args: Option<String>,
}

/// A reassembled (possibly still-incomplete) tool call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolCallChunkGroup {
    pub index: u32,
    pub id: String,
    pub name: String,
    pub args: String,
}

/// Accumulates fragments across a single `base` node invocation.
#[derive(Debug, Default)]
pub struct ToolCallChunkAccumulator {
    by_index: std::collections::HashMap<u32, usize>,
    groups: Vec<ToolCallChunkGroup>,
}

impl ToolCallChunkAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one fragment into its group, returning the group's position.
    pub fn push(&mut self, fragment: ToolCallChunkFragment) -> usize {
        let pos = match fragment.index {
            Some(idx) => *self.by_index.entry(idx).or_insert_with(|| {
                self.groups.push(ToolCallChunkGroup {
                    index: idx,
                    ..Default::default()
                });
                self.groups.len() - 1
            }),
            None => {
                self.groups.push(ToolCallChunkGroup {
                    index: 0,
                    ..Default::default()
                });
                self.groups.len() - 1
            }
        };

        let group = &mut self.groups[pos];
        if let Some(args) = fragment.args {
            group.args.push_str(&args);
        }
        match (&fragment.name, group.name.is_empty()) {
            (Some(name), true) if !name.is_empty() => group.name = name.clone(),
            (Some(name), false) if !name.is_empty() && name != &group.name => {
                warn!(
                    group_index = group.index,
                    existing = %group.name,
                    incoming = %name,
                    "tool call chunk name mismatch within a reassembly group"
                );
            }
            _ => {}
        }
        if group.id.is_empty() {
            if let Some(id) = fragment.id {
                if !id.is_empty() {
                    group.id = id;
                }
            }
        }
        pos
    }

    pub fn group(&self, pos: usize) -> Option<&ToolCallChunkGroup> {
        self.groups.get(pos)
    }

    pub fn groups(&self) -> &[ToolCallChunkGroup] {
        &self.groups
    }

    /// A group is ready to dispatch once it has a name; `args` may still be
    /// accumulating valid partial JSON until the provider marks it final.
    pub fn is_named(&self, pos: usize) -> bool {
        self.groups.get(pos).is_some_and(|g| !g.name.is_empty())
    }

    /// Final groups in index order (stable for ties, i.e. arrival order
    /// among same-index fragments and among the indexless standalone
    /// entries sharing index 0).
    pub fn into_sorted_groups(self) -> Vec<ToolCallChunkGroup> {
        let mut groups = self.groups;
        groups.sort_by_key(|g| g.index);
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concatenates_args_across_fragments_for_same_index() {
        let mut acc = ToolCallChunkAccumulator::new();
        acc.push(ToolCallChunkFragment {
            index: Some(0),
            id: Some("t1".into()),
            name: Some("echo".into()),
            args: Some("{\"x\":".into()),
        });
        acc.push(ToolCallChunkFragment {
            index: Some(0),
            id: None,
            name: None,
            args: Some("1}".into()),
        });

        let groups = acc.into_sorted_groups();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].args, "{\"x\":1}");
        assert_eq!(groups[0].name, "echo");
        assert_eq!(groups[0].id, "t1");
    }

    #[test]
    fn adopts_first_nonempty_name_and_warns_on_mismatch() {
        let mut acc = ToolCallChunkAccumulator::new();
        acc.push(ToolCallChunkFragment {
            index: Some(0),
            name: Some("echo".into()),
            ..Default::default()
        });
        acc.push(ToolCallChunkFragment {
            index: Some(0),
            name: Some("other".into()),
            ..Default::default()
        });
        let groups = acc.into_sorted_groups();
        assert_eq!(groups[0].name, "echo");
    }

    #[test]
    fn indexless_fragments_never_merge_with_each_other() {
        let mut acc = ToolCallChunkAccumulator::new();
        acc.push(ToolCallChunkFragment {
            name: Some("a".into()),
            args: Some("1".into()),
            ..Default::default()
        });
        acc.push(ToolCallChunkFragment {
            name: Some("b".into()),
            args: Some("2".into()),
            ..Default::default()
        });
        assert_eq!(acc.groups().len(), 2);
    }

    #[test]
    fn interleaved_indices_reassemble_independently() {
        let mut acc = ToolCallChunkAccumulator::new();
        acc.push(ToolCallChunkFragment {
            index: Some(1),
            name: Some("b".into()),
            args: Some("2".into()),
            ..Default::default()
        });
        acc.push(ToolCallChunkFragment {
            index: Some(0),
            name: Some("a".into()),
            args: Some("1".into()),
            ..Default::default()
        });
        let groups = acc.into_sorted_groups();
        assert_eq!(groups[0].name, "a");
        assert_eq!(groups[1].name, "b");
    }
}
