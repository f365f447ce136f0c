use std::collections::BTreeMap;
use std::ops::Range;

#[derive(Debug, Clone, PartialEq)]
struct Entry<T> {
    end: u64,
    value: T,
}

/// Interval map tracking a property over the linear range of a resource.
///
/// Stores an ordered, non-overlapping set of `(range, value)` entries over
/// `[0, size)`. Adjacent entries holding equal values are always coalesced,
/// so the map stays minimally fragmented. Entries are keyed by start offset
/// in a `BTreeMap`, giving O(k log n) `set`/`get` where k is the number of
/// entries touched.
///
/// Offsets are abstract units: bytes for buffers, linearized subresource
/// indices (layer * mip_levels + mip) for images.
///
/// # Example
///
/// ```
/// use galaxy_3d_pass_system::galaxy3d::utils::SubresourceRangeMap;
///
/// let mut map = SubresourceRangeMap::new();
/// map.init(20, 'a');
/// map.set(5..10, 'b');
/// map.set(5..10, 'a');
/// assert_eq!(map.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct SubresourceRangeMap<T> {
    entries: BTreeMap<u64, Entry<T>>,
    size: u64,
}

impl<T: Clone + PartialEq> SubresourceRangeMap<T> {
    /// Create an empty map covering nothing
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            size: 0,
        }
    }

    /// Create a map covering `[0, size)` with `value`
    pub fn with_value(size: u64, value: T) -> Self {
        let mut map = Self::new();
        map.init(size, value);
        map
    }

    /// Cover `[0, size)` with a single entry, discarding previous content
    pub fn init(&mut self, size: u64, value: T) {
        self.entries.clear();
        self.size = size;
        if size > 0 {
            self.entries.insert(0, Entry { end: size, value });
        }
    }

    /// Clear all entries. The map covers nothing until the next `init`.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.size = 0;
    }

    /// Size of the tracked range
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Number of stored (coalesced) entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over all entries in ascending offset order
    pub fn iter(&self) -> impl Iterator<Item = (Range<u64>, &T)> + '_ {
        self.entries
            .iter()
            .map(|(&start, entry)| (start..entry.end, &entry.value))
    }

    /// Overwrite `range` with `value`.
    ///
    /// Entries fully covered by `range` are removed, partially overlapping
    /// ones are split so only their remainder survives, then the new entry
    /// is inserted and merged with equal neighbours. The range is clamped to
    /// `[0, size)`; empty ranges are ignored.
    pub fn set(&mut self, range: Range<u64>, value: T) {
        let range = self.clamp(range);
        if range.is_empty() {
            return;
        }

        self.split_at(range.start);
        self.split_at(range.end);

        let covered: Vec<u64> = self.entries
            .range(range.clone())
            .map(|(&start, _)| start)
            .collect();
        for start in covered {
            self.entries.remove(&start);
        }

        self.entries.insert(range.start, Entry { end: range.end, value });
        self.coalesce(range.start);
    }

    /// Return every entry overlapping `range`, clipped to it, in ascending order.
    pub fn get(&self, range: Range<u64>) -> Vec<(Range<u64>, &T)> {
        let range = self.clamp(range);
        let mut result = Vec::new();
        if range.is_empty() {
            return result;
        }

        // Entry starting before the range but reaching into it
        if let Some((_, entry)) = self.entries.range(..range.start).next_back() {
            if entry.end > range.start {
                result.push((range.start..entry.end.min(range.end), &entry.value));
            }
        }

        for (&start, entry) in self.entries.range(range.start..range.end) {
            result.push((start..entry.end.min(range.end), &entry.value));
        }

        result
    }

    fn clamp(&self, range: Range<u64>) -> Range<u64> {
        let end = range.end.min(self.size);
        range.start.min(end)..end
    }

    /// Split the entry containing `pos` (if any) into `[start, pos)` and `[pos, end)`.
    fn split_at(&mut self, pos: u64) {
        let (start, end, value) = match self.entries.range(..pos).next_back() {
            Some((&start, entry)) if entry.end > pos => (start, entry.end, entry.value.clone()),
            _ => return,
        };

        if let Some(head) = self.entries.get_mut(&start) {
            head.end = pos;
        }
        self.entries.insert(pos, Entry { end, value });
    }

    /// Merge the entry at `start` with equal-valued neighbours that touch it.
    fn coalesce(&mut self, start: u64) {
        let Some(current) = self.entries.get(&start) else {
            return;
        };
        let end = current.end;

        let merge_next = matches!(self.entries.get(&end), Some(next) if next.value == current.value);
        if merge_next {
            if let Some(next) = self.entries.remove(&end) {
                if let Some(current) = self.entries.get_mut(&start) {
                    current.end = next.end;
                }
            }
        }

        let merge_prev = match (self.entries.range(..start).next_back(), self.entries.get(&start)) {
            (Some((_, prev)), Some(current)) => prev.end == start && prev.value == current.value,
            _ => false,
        };
        if merge_prev {
            if let Some(current) = self.entries.remove(&start) {
                if let Some((_, prev)) = self.entries.range_mut(..start).next_back() {
                    prev.end = current.end;
                }
            }
        }
    }
}

impl<T: Clone + PartialEq> Default for SubresourceRangeMap<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "range_map_tests.rs"]
mod tests;
