//! Candidate-pair blocking.
//!
//! Located records are dropped into a grid of square cells and paired with
//! everything in their own cell and a ring of neighbouring cells. The ring is
//! one cell wide, or wide enough to cover the scorer's spatial reach when that
//! exceeds a cell. Cell columns are scaled by the cosine of the row's latitude
//! so cells stay roughly square.
//! Records without coordinates fall back to locality blocking: they pair with
//! every record sharing their city and state, or their ZIP.

use std::collections::{BTreeMap, BTreeSet};

use corral_core::CanonicalRecord;

/// Metres per degree of latitude, and of longitude at the equator.
const METRES_PER_DEGREE: f64 = 111_320.0;

/// Floor on the longitude scale so polar rows stay finite.
const MIN_LONGITUDE_SCALE: f64 = 0.01;

/// Widest neighbour ring searched, in cells.
const MAX_RING: i64 = 64;

/// Unordered pair of record indices, smaller first.
pub(crate) type Pair = (usize, usize);

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Locality {
    CityState(String, String),
    Zip(String),
}

const fn ordered(a: usize, b: usize) -> Pair {
    if a < b { (a, b) } else { (b, a) }
}

#[expect(
    clippy::float_arithmetic,
    clippy::cast_possible_truncation,
    reason = "grid rows are latitude in metres divided by the cell size"
)]
fn row_of(lat: f64, cell_m: f64) -> i64 {
    (lat * METRES_PER_DEGREE / cell_m).floor() as i64
}

#[expect(
    clippy::float_arithmetic,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    reason = "grid columns scale longitude by the row's mean latitude"
)]
fn col_of(lon: f64, row: i64, cell_m: f64) -> i64 {
    let row_lat = (row as f64 + 0.5) * cell_m / METRES_PER_DEGREE;
    let scale = row_lat.to_radians().cos().abs().max(MIN_LONGITUDE_SCALE);
    (lon * METRES_PER_DEGREE * scale / cell_m).floor() as i64
}

/// Cells either side of a record's own cell that can hold a match.
#[expect(
    clippy::float_arithmetic,
    clippy::cast_possible_truncation,
    reason = "the ring is the reach divided by the cell size, rounded up"
)]
fn ring_for(cell_m: f64, reach_m: Option<f64>) -> i64 {
    reach_m
        .filter(|reach| reach.is_finite())
        .map_or(1, |reach| ((reach / cell_m).ceil() as i64).clamp(1, MAX_RING))
}

fn localities(record: &CanonicalRecord) -> Vec<Locality> {
    let mut keys = Vec::with_capacity(2);
    if let (Some(city), Some(state)) = (&record.city, &record.state) {
        keys.push(Locality::CityState(city.to_lowercase(), state.clone()));
    }
    if let Some(zip) = &record.zip {
        keys.push(Locality::Zip(zip.clone()));
    }
    keys
}

fn grid_pairs(records: &[CanonicalRecord], cell_m: f64, ring: i64, pairs: &mut BTreeSet<Pair>) {
    let mut grid: BTreeMap<(i64, i64), Vec<usize>> = BTreeMap::new();
    let located: Vec<(usize, i64, f64)> = records
        .iter()
        .enumerate()
        .filter_map(|(index, record)| {
            record
                .location
                .map(|coord| (index, row_of(coord.y, cell_m), coord.x))
        })
        .collect();
    for &(index, row, lon) in &located {
        grid.entry((row, col_of(lon, row, cell_m)))
            .or_default()
            .push(index);
    }
    for &(index, row, lon) in &located {
        for neighbour_row in row.saturating_sub(ring)..=row.saturating_add(ring) {
            let col = col_of(lon, neighbour_row, cell_m);
            for neighbour_col in col.saturating_sub(ring)..=col.saturating_add(ring) {
                let Some(cell) = grid.get(&(neighbour_row, neighbour_col)) else {
                    continue;
                };
                pairs.extend(
                    cell.iter()
                        .filter(|other| **other != index)
                        .map(|other| ordered(index, *other)),
                );
            }
        }
    }
}

fn locality_pairs(records: &[CanonicalRecord], pairs: &mut BTreeSet<Pair>) {
    let mut blocks: BTreeMap<Locality, Vec<(usize, bool)>> = BTreeMap::new();
    for (index, record) in records.iter().enumerate() {
        for locality in localities(record) {
            blocks
                .entry(locality)
                .or_default()
                .push((index, record.location.is_some()));
        }
    }
    for block in blocks.values() {
        for &(index, located) in block {
            if located {
                continue;
            }
            pairs.extend(
                block
                    .iter()
                    .filter(|(other, _)| *other != index)
                    .map(|(other, _)| ordered(index, *other)),
            );
        }
    }
}

/// Index pairs worth scoring, each listed once with the smaller index first.
///
/// `reach_m` is the farthest distance at which the scorer still credits
/// proximity; located pairs within it always land in each other's ring.
pub(crate) fn candidate_pairs(
    records: &[CanonicalRecord],
    cell_m: f64,
    reach_m: Option<f64>,
) -> BTreeSet<Pair> {
    let mut pairs = BTreeSet::new();
    grid_pairs(records, cell_m, ring_for(cell_m, reach_m), &mut pairs);
    locality_pairs(records, &mut pairs);
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use corral_core::SourceId;
    use corral_core::test_support::RecordBuilder;
    use rstest::rstest;

    fn at(key: &str, lon: f64, lat: f64) -> CanonicalRecord {
        RecordBuilder::new(SourceId::Osm, key, "Boot Barn")
            .at(lon, lat, 0.95)
            .build()
    }

    #[rstest]
    fn neighbours_across_a_cell_edge_are_paired() {
        // About 60 m apart, straddling whichever edge lies between them.
        let records = vec![at("a", -97.33, 32.750_0), at("b", -97.33, 32.750_54)];
        assert!(candidate_pairs(&records, 200.0, None).contains(&(0, 1)));
    }

    #[rstest]
    #[case(250.0)]
    #[case(330.0)]
    #[case(480.0)]
    #[expect(clippy::float_arithmetic, reason = "offsets the test coordinate")]
    fn pairs_within_the_scorer_reach_are_found(#[case] metres: f64) {
        let lat = 32.75 + metres / 111_200.0;
        let records = vec![at("a", -97.33, 32.75), at("b", -97.33, lat)];
        assert!(candidate_pairs(&records, 200.0, Some(500.0)).contains(&(0, 1)));
    }

    #[rstest]
    #[case(None, 1)]
    #[case(Some(150.0), 1)]
    #[case(Some(500.0), 3)]
    #[case(Some(f64::INFINITY), 1)]
    #[case(Some(1.0e9), MAX_RING)]
    fn ring_covers_the_reach(#[case] reach: Option<f64>, #[case] expected: i64) {
        assert_eq!(ring_for(200.0, reach), expected);
    }

    #[rstest]
    fn distant_records_are_not_paired() {
        let records = vec![at("a", -99.73, 32.45), at("b", -99.57, 32.45)];
        assert!(candidate_pairs(&records, 200.0, None).is_empty());
    }

    #[rstest]
    fn unlocated_records_block_on_city_and_state() {
        let records = vec![
            RecordBuilder::new(SourceId::Osm, "a", "Cavender's")
                .locality("Amarillo", "TX")
                .at(-101.83, 35.22, 0.95)
                .build(),
            RecordBuilder::new(SourceId::Yelp, "b", "Cavenders")
                .locality("Amarillo", "TX")
                .build(),
            RecordBuilder::new(SourceId::Yelp, "c", "Cavenders")
                .locality("Abilene", "TX")
                .build(),
        ];
        let pairs = candidate_pairs(&records, 200.0, None);
        assert_eq!(pairs.into_iter().collect::<Vec<_>>(), vec![(0, 1)]);
    }

    #[rstest]
    fn unlocated_records_block_on_zip() {
        let records = vec![
            RecordBuilder::new(SourceId::Yelp, "a", "Hat Hut").zip("79101").build(),
            RecordBuilder::new(SourceId::YellowPages, "b", "Hat Hut")
                .zip("79101")
                .build(),
        ];
        assert!(candidate_pairs(&records, 200.0, None).contains(&(0, 1)));
    }

    #[rstest]
    fn located_records_sharing_a_locality_rely_on_the_grid() {
        let records = vec![
            RecordBuilder::new(SourceId::Osm, "a", "Boot Barn")
                .locality("Fort Worth", "TX")
                .at(-97.33, 32.75, 0.95)
                .build(),
            RecordBuilder::new(SourceId::Osm, "b", "Boot Barn")
                .locality("Fort Worth", "TX")
                .at(-97.20, 32.80, 0.95)
                .build(),
        ];
        assert!(candidate_pairs(&records, 200.0, None).is_empty());
    }
}
