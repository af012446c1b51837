//! Property-based invariant tests for palettes, shade tables, and the field.
//!
//! 1. Table length is `RESOLUTION * (n - 1)` for open palettes.
//! 2. Entry 0 equals anchor 0 exactly.
//! 3. Every segment starts at its own anchor.
//! 4. Identical consecutive anchors give a flat segment.
//! 5. `map` never leaves the table, and clamps out-of-range values.
//! 6. The field is deterministic and bounded.

use plasma_core::{FieldGeometry, Palette, RESOLUTION, Rgb, ShadeTable, evaluate, normalize};
use proptest::prelude::*;

// ── Strategies ────────────────────────────────────────────────────────────

fn color_strategy() -> impl Strategy<Value = Rgb> {
    (0u32..=0xff_ffff).prop_map(Rgb::from_packed)
}

fn anchors_strategy() -> impl Strategy<Value = Vec<Rgb>> {
    proptest::collection::vec(color_strategy(), 2..=12)
}

// ── Shade tables ──────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn table_length_matches_segments(anchors in anchors_strategy()) {
        let table = ShadeTable::build(&anchors, false);
        prop_assert_eq!(table.len(), RESOLUTION * (anchors.len() - 1));
        let cyclic = ShadeTable::build(&anchors, true);
        prop_assert_eq!(cyclic.len(), RESOLUTION * anchors.len());
    }

    #[test]
    fn segments_start_on_anchors(anchors in anchors_strategy()) {
        let table = ShadeTable::build(&anchors, false);
        for (i, anchor) in anchors.iter().take(anchors.len() - 1).enumerate() {
            prop_assert_eq!(table.get(i * RESOLUTION), Some(*anchor));
        }
    }

    #[test]
    fn shades_stay_between_their_anchors(anchors in anchors_strategy()) {
        let table = ShadeTable::build(&anchors, false);
        for (i, pair) in anchors.windows(2).enumerate() {
            let (a, b) = (pair[0], pair[1]);
            for j in 0..RESOLUTION {
                let c = table.get(i * RESOLUTION + j).unwrap_or_default();
                prop_assert!(c.r >= a.r.min(b.r) && c.r <= a.r.max(b.r));
                prop_assert!(c.g >= a.g.min(b.g) && c.g <= a.g.max(b.g));
                prop_assert!(c.b >= a.b.min(b.b) && c.b <= a.b.max(b.b));
            }
        }
    }

    #[test]
    fn repeated_anchor_gives_flat_segment(color in color_strategy(), tail in color_strategy()) {
        let table = ShadeTable::build(&[color, color, tail], false);
        for j in 0..RESOLUTION {
            prop_assert_eq!(table.get(j), Some(color));
        }
    }

    #[test]
    fn map_stays_inside_table(anchors in anchors_strategy(), value in -2.0f64..3.0) {
        let table = ShadeTable::build(&anchors, false);
        let color = table.map(value);
        prop_assert!(table.as_slice().contains(&color));
        if value <= 0.0 {
            prop_assert_eq!(Some(color), table.get(0));
        }
        if value >= 1.0 {
            prop_assert_eq!(Some(color), table.get(table.len() - 1));
        }
    }

    #[test]
    fn rebuild_is_pure(anchors in anchors_strategy(), cyclic in any::<bool>()) {
        prop_assert_eq!(
            ShadeTable::build(&anchors, cyclic),
            ShadeTable::build(&anchors, cyclic)
        );
    }
}

// ── Field generator ───────────────────────────────────────────────────────

proptest! {
    #[test]
    fn field_is_deterministic_and_bounded(
        x in -1.0f64..1.0,
        y in -1.0f64..1.0,
        t in 0.0f64..10_000.0,
    ) {
        let v = evaluate(x, y, t);
        prop_assert_eq!(v.to_bits(), evaluate(x, y, t).to_bits());
        prop_assert!((-3.0..=3.0).contains(&v));
        let n = normalize(v);
        prop_assert!((0.0..=1.0).contains(&n));
    }

    #[test]
    fn geometry_samples_are_normalized(
        w in 1u16..24,
        h in 1u16..24,
        field_size in 0.01f64..2.0,
        t in 0.0f64..1000.0,
    ) {
        let g = FieldGeometry::new(w, h, field_size);
        for row in 0..h {
            for col in 0..w {
                let v = g.sample(col, row, t);
                prop_assert!((0.0..=1.0).contains(&v));
            }
        }
    }
}

// ── End to end ────────────────────────────────────────────────────────────

#[test]
fn black_to_white_source_builds_brightening_table() {
    let set = plasma_core::palette::load("Test = 0x000000, 0xffffff,").expect("valid source");
    assert_eq!(set.len(), 1);
    let pal: &Palette = set.get(0).expect("one palette");
    assert_eq!(pal.anchors().len(), 2);

    let shades = pal.shades().as_slice();
    assert_eq!(shades.len(), RESOLUTION);
    assert_eq!(shades[0], Rgb::BLACK);
    // Truncation maps 256 steps onto 255 levels, so one neighbouring pair
    // repeats; brightness never drops.
    for pair in shades.windows(2) {
        assert!(pair[1].brightness() >= pair[0].brightness());
    }
    assert!(shades[shades.len() - 1].brightness() > shades[0].brightness());
    assert_eq!(shades[shades.len() - 1], Rgb::from_packed(0xfefefe));
}
