/// Attachment dependencies between passes.
///
/// Walks enabled leaf passes in execution order and tracks, per attachment,
/// which pass last wrote each subresource range. A read of a range written
/// earlier yields a read-after-write edge; a write over a range written
/// earlier yields a write-after-write edge.

use std::ops::Range;
use rustc_hash::FxHashMap;
use crate::utils::SubresourceRangeMap;
use super::attachment::AttachmentId;
use super::pass::PassKey;
use super::pass_system::PassSystem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependencyKind {
    ReadAfterWrite,
    WriteAfterWrite,
}

/// `consumer` must execute after `producer` for `range` of `attachment`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassDependency {
    pub producer: PassKey,
    pub consumer: PassKey,
    pub attachment: AttachmentId,
    pub range: Range<u64>,
    pub kind: DependencyKind,
}

impl PassSystem {
    pub(crate) fn compute_dependencies(&self) -> Vec<PassDependency> {
        let mut writers: FxHashMap<AttachmentId, SubresourceRangeMap<Option<PassKey>>> = FxHashMap::default();
        let mut dependencies = Vec::new();

        for consumer in self.execution_order() {
            for binding in self.passes[consumer].bindings() {
                let (Some(attachment), Some(range)) = (binding.attachment(), binding.subresource_range()) else {
                    continue;
                };
                let map = writers
                    .entry(attachment.id())
                    .or_insert_with(|| SubresourceRangeMap::with_value(attachment.kind().subresource_count(), None));

                let usage = binding.usage();
                let previous: Vec<(Range<u64>, PassKey)> = map
                    .get(range.clone())
                    .into_iter()
                    .filter_map(|(sub, writer)| writer.map(|writer| (sub, writer)))
                    .filter(|&(_, writer)| writer != consumer)
                    .collect();

                for (sub, producer) in previous {
                    if usage.reads() {
                        dependencies.push(PassDependency {
                            producer,
                            consumer,
                            attachment: attachment.id(),
                            range: sub.clone(),
                            kind: DependencyKind::ReadAfterWrite,
                        });
                    }
                    if usage.writes() && !usage.reads() {
                        dependencies.push(PassDependency {
                            producer,
                            consumer,
                            attachment: attachment.id(),
                            range: sub,
                            kind: DependencyKind::WriteAfterWrite,
                        });
                    }
                }

                if usage.writes() {
                    map.set(range, Some(consumer));
                }
            }
        }

        dependencies
    }
}

#[cfg(test)]
#[path = "dependency_tests.rs"]
mod tests;
