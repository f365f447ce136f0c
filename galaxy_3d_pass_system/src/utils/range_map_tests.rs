use super::*;

fn entries<T: Clone + PartialEq>(map: &SubresourceRangeMap<T>) -> Vec<(Range<u64>, T)> {
    map.iter().map(|(range, value)| (range, value.clone())).collect()
}

fn clipped<T: Clone>(result: Vec<(Range<u64>, &T)>) -> Vec<(Range<u64>, T)> {
    result.into_iter().map(|(range, value)| (range, value.clone())).collect()
}

// ============================================================================
// Init / reset
// ============================================================================

#[test]
fn test_new_is_empty() {
    let map: SubresourceRangeMap<u32> = SubresourceRangeMap::new();
    assert!(map.is_empty());
    assert_eq!(map.size(), 0);
    assert!(map.get(0..10).is_empty());
}

#[test]
fn test_init_covers_whole_resource() {
    let map = SubresourceRangeMap::with_value(64, 'a');
    assert_eq!(entries(&map), vec![(0..64, 'a')]);
}

#[test]
fn test_reset_clears_everything() {
    let mut map = SubresourceRangeMap::with_value(64, 'a');
    map.set(8..16, 'b');
    map.reset();

    assert!(map.is_empty());
    assert_eq!(map.size(), 0);
}

// ============================================================================
// Set: split / overwrite
// ============================================================================

#[test]
fn test_set_splits_containing_entry() {
    let mut map = SubresourceRangeMap::with_value(30, 'a');
    map.set(10..20, 'b');

    assert_eq!(entries(&map), vec![(0..10, 'a'), (10..20, 'b'), (20..30, 'a')]);
}

#[test]
fn test_set_removes_fully_covered_entries() {
    let mut map = SubresourceRangeMap::with_value(40, 'a');
    map.set(5..10, 'b');
    map.set(12..15, 'c');
    map.set(20..25, 'd');

    map.set(4..30, 'e');

    assert_eq!(entries(&map), vec![(0..4, 'a'), (4..30, 'e'), (30..40, 'a')]);
}

#[test]
fn test_set_trims_partial_overlaps_on_both_sides() {
    let mut map = SubresourceRangeMap::with_value(30, 'a');
    map.set(0..10, 'b');
    map.set(20..30, 'c');

    map.set(5..25, 'd');

    assert_eq!(entries(&map), vec![(0..5, 'b'), (5..25, 'd'), (25..30, 'c')]);
}

#[test]
fn test_set_empty_range_is_ignored() {
    let mut map = SubresourceRangeMap::with_value(16, 'a');
    map.set(4..4, 'b');
    map.set(9..3, 'b');

    assert_eq!(entries(&map), vec![(0..16, 'a')]);
}

#[test]
fn test_set_is_clamped_to_size() {
    let mut map = SubresourceRangeMap::with_value(16, 'a');
    map.set(12..100, 'b');
    map.set(50..60, 'c');

    assert_eq!(entries(&map), vec![(0..12, 'a'), (12..16, 'b')]);
}

#[test]
fn test_set_whole_range_collapses_to_one_entry() {
    let mut map = SubresourceRangeMap::with_value(16, 'a');
    map.set(1..3, 'b');
    map.set(5..9, 'c');
    map.set(0..16, 'z');

    assert_eq!(entries(&map), vec![(0..16, 'z')]);
}

// ============================================================================
// Merge rule
// ============================================================================

#[test]
fn test_adjacent_equal_values_merge() {
    let mut map = SubresourceRangeMap::with_value(20, 'x');
    map.set(0..10, 'a');
    map.set(10..20, 'a');

    assert_eq!(clipped(map.get(0..20)), vec![(0..20, 'a')]);
    assert_eq!(map.len(), 1);
}

#[test]
fn test_merge_with_both_neighbours() {
    let mut map = SubresourceRangeMap::with_value(30, 'a');
    map.set(10..20, 'b');
    map.set(10..20, 'a');

    assert_eq!(entries(&map), vec![(0..30, 'a')]);
}

#[test]
fn test_different_values_do_not_merge() {
    let mut map = SubresourceRangeMap::with_value(20, 'x');
    map.set(0..10, 'a');
    map.set(10..20, 'b');

    assert_eq!(map.len(), 2);
}

#[test]
fn test_set_is_idempotent() {
    let mut base = SubresourceRangeMap::with_value(50, 0u8);
    base.set(3..17, 1);

    let mut once = base.clone();
    once.set(10..40, 2);

    let mut twice = base.clone();
    twice.set(10..40, 2);
    twice.set(10..40, 2);

    assert_eq!(entries(&once), entries(&twice));
}

// ============================================================================
// Get
// ============================================================================

#[test]
fn test_get_clips_to_query() {
    let mut map = SubresourceRangeMap::with_value(30, 'a');
    map.set(10..20, 'b');

    assert_eq!(clipped(map.get(5..15)), vec![(5..10, 'a'), (10..15, 'b')]);
    assert_eq!(clipped(map.get(12..14)), vec![(12..14, 'b')]);
}

#[test]
fn test_get_outside_size_is_empty() {
    let map = SubresourceRangeMap::with_value(8, 'a');
    assert!(map.get(8..20).is_empty());
}

// ============================================================================
// Coverage against a per-unit model
// ============================================================================

/// Deterministic xorshift so the sequence is reproducible without extra crates
fn next(state: &mut u64) -> u64 {
    *state ^= *state << 13;
    *state ^= *state >> 7;
    *state ^= *state << 17;
    *state
}

#[test]
fn test_random_sets_match_model_and_stay_minimal() {
    const SIZE: u64 = 97;
    let mut map = SubresourceRangeMap::with_value(SIZE, 0u8);
    let mut model = vec![0u8; SIZE as usize];
    let mut state = 0x9E37_79B9_7F4A_7C15u64;

    for _ in 0..500 {
        let a = next(&mut state) % (SIZE + 1);
        let b = next(&mut state) % (SIZE + 1);
        let value = (next(&mut state) % 4) as u8;
        let (start, end) = if a <= b { (a, b) } else { (b, a) };

        map.set(start..end, value);
        for unit in start..end {
            model[unit as usize] = value;
        }

        let all = map.get(0..SIZE);

        // Disjoint, ascending and covering [0, SIZE)
        let mut cursor = 0;
        for (range, _) in &all {
            assert_eq!(range.start, cursor);
            assert!(range.end > range.start);
            cursor = range.end;
        }
        assert_eq!(cursor, SIZE);

        // Adjacent entries never hold equal values
        for pair in all.windows(2) {
            assert_ne!(pair[0].1, pair[1].1);
        }

        // Same content as the model
        for (range, value) in &all {
            for unit in range.clone() {
                assert_eq!(model[unit as usize], **value);
            }
        }
    }
}
