//! Tests which aren't associated with a single format.
use std::collections::HashSet;

use proptest::prelude::*;

use crate::*;

const GOSPER_GUN: &str = "\
#N Gosper glider gun
x = 36, y = 9, rule = B3/S23
24bo$22bobo$12b2o6b2o12b2o$11bo3bo4b2o12b2o$2o8bo5bo3b2o$2o8bo3bob2o4b
obo$10bo5bo7bo$11bo3bo$12b2o!";

fn normalized(cells: &[(i64, i64)]) -> HashSet<(i64, i64)> {
    match cell_bounds(cells) {
        None => Default::default(),
        Some((min_x, min_y, _, _)) => cells
            .iter()
            .map(|&(x, y)| (x - min_x, y - min_y))
            .collect(),
    }
}

#[test]
fn test_gosper_gun_roundtrip() {
    let cells = parse_rle(GOSPER_GUN).unwrap();
    assert_eq!(cells.len(), 36);

    let emitted = emit_rle(&cells, "B3/S23");
    let reparsed = parse_rle(&emitted).unwrap();
    assert_eq!(normalized(&cells), normalized(&reparsed));
}

#[test]
fn test_rle_to_packed_to_store() {
    let cells = parse_rle(GOSPER_GUN).unwrap();
    let store = load_packed(&PackedPattern::from_cells(&cells));
    assert_eq!(store.population(), cells.len() as u64);
    for (x, y) in normalized(&cells) {
        assert!(store.get_cell(x, y));
    }
}

proptest! {
    // Emit then parse is the identity on cell sets, up to translation.
    #[test]
    fn fuzz_rle_roundtrip(
        cells in prop::collection::hash_set((-100i64..100, -100i64..100), 0..400)
    ) {
        let cells: Vec<_> = cells.into_iter().collect();
        let emitted = emit_rle(&cells, "B3/S23");
        for line in emitted.lines() {
            prop_assert!(line.len() <= 70);
        }
        let reparsed = parse_rle(&emitted).unwrap();
        prop_assert_eq!(normalized(&cells), normalized(&reparsed));
    }

    // The packed path and the RLE path agree about every cell.
    #[test]
    fn fuzz_packed_matches_rle(
        cells in prop::collection::hash_set((0i64..80, 0i64..80), 1..200)
    ) {
        let cells: Vec<_> = cells.into_iter().collect();
        let packed = PackedPattern::from_cells(&cells);
        let store = load_packed(&packed);
        prop_assert_eq!(store.population(), cells.len() as u64);

        let through_rle = parse_rle(&emit_rle(&cells, "B3/S23")).unwrap();
        let mut store_set = HashSet::new();
        store.for_each_live(|x, y| {
            store_set.insert((x, y));
        });
        prop_assert_eq!(normalized(&through_rle), store_set);
    }
}
