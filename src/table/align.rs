//! Nearest-timestamp merge of independently fetched column series.

use chrono::NaiveDateTime;

use crate::table::types::{AlignedTable, Sample, Series};

/// Merges `series_list` onto the timeline of its first series.
///
/// The first series becomes the running table. Every later series is joined
/// to it by nearest timestamp: both sides are sorted ascending and each table
/// row receives the value of the closest sample. Equidistant candidates
/// resolve to the earlier one. The row count always equals the first
/// series' length; a single series is returned in its original order.
///
/// Callers are expected to drop empty series beforehand. An empty list
/// yields an empty table, and an empty later series yields an all-null column.
pub fn align(series_list: Vec<Series>) -> AlignedTable {
    let mut iter = series_list.into_iter();
    let Some(first) = iter.next() else {
        return AlignedTable::default();
    };

    let mut table = AlignedTable::from_series(first);

    for mut next in iter {
        table.sort_by_time();
        next.sort_by_time();

        let values = table
            .rows()
            .iter()
            .map(|row| nearest_index(&next.samples, row.time).map(|i| next.samples[i].value))
            .collect();

        table.push_column(next.column, values);
    }

    table
}

/// Index of the sample closest to `t` in a time-sorted slice.
///
/// The backward candidate is the last sample at or before `t`, the forward
/// candidate the first sample at or after `t`. The forward one only wins when
/// strictly closer.
pub(crate) fn nearest_index(sorted: &[Sample], t: NaiveDateTime) -> Option<usize> {
    let backward = sorted.partition_point(|s| s.time <= t).checked_sub(1);
    let lower = sorted.partition_point(|s| s.time < t);
    let forward = (lower < sorted.len()).then_some(lower);

    match (backward, forward) {
        (Some(b), Some(f)) => {
            let back_gap = t - sorted[b].time;
            let fwd_gap = sorted[f].time - t;
            if fwd_gap < back_gap { Some(f) } else { Some(b) }
        }
        (b, f) => b.or(f),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 8, 12)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn series(column: &str, points: &[(NaiveDateTime, f64)]) -> Series {
        Series::new(
            column,
            points
                .iter()
                .map(|&(time, value)| Sample { time, value })
                .collect(),
        )
    }

    #[test]
    fn test_align_empty_list() {
        let table = align(Vec::new());
        assert!(table.is_empty());
        assert!(table.columns().is_empty());
    }

    #[test]
    fn test_align_single_series_is_unchanged() {
        let pac = series("Pac", &[(at(12, 0), 3.0), (at(8, 0), 1.0), (at(10, 0), 2.0)]);
        let table = align(vec![pac.clone()]);

        assert_eq!(table.columns(), ["Pac".to_string()]);
        assert_eq!(table.len(), 3);
        for (row, sample) in table.rows().iter().zip(&pac.samples) {
            assert_eq!(row.time, sample.time);
            assert_eq!(row.values, vec![Some(sample.value)]);
        }
    }

    #[test]
    fn test_align_disjoint_timestamps_keeps_every_left_row() {
        let pac = series("Pac", &[(at(8, 0), 100.0), (at(9, 0), 500.0), (at(10, 0), 42.0)]);
        let eday = series("Eday", &[(at(8, 2), 0.1), (at(9, 58), 2.5)]);

        let table = align(vec![pac, eday]);

        assert_eq!(table.len(), 3);
        assert_eq!(table.columns(), ["Pac".to_string(), "Eday".to_string()]);
        assert_eq!(table.rows()[0].values, vec![Some(100.0), Some(0.1)]);
        // 09:00 is 58 min after 08:02 and 58 min before 09:58: tie goes to the earlier sample
        assert_eq!(table.rows()[1].values, vec![Some(500.0), Some(0.1)]);
        assert_eq!(table.rows()[2].values, vec![Some(42.0), Some(2.5)]);
    }

    #[test]
    fn test_align_sorts_before_merging() {
        let pac = series("Pac", &[(at(10, 0), 3.0), (at(8, 0), 1.0)]);
        let soc = series("Cbattery1", &[(at(10, 1), 90.0), (at(7, 59), 40.0)]);

        let table = align(vec![pac, soc]);

        assert_eq!(table.rows()[0].time, at(8, 0));
        assert_eq!(table.rows()[0].values, vec![Some(1.0), Some(40.0)]);
        assert_eq!(table.rows()[1].time, at(10, 0));
        assert_eq!(table.rows()[1].values, vec![Some(3.0), Some(90.0)]);
    }

    #[test]
    fn test_align_empty_later_series_gives_null_column() {
        let pac = series("Pac", &[(at(8, 0), 1.0)]);
        let table = align(vec![pac, Series::empty("Eday")]);

        assert_eq!(table.rows()[0].values, vec![Some(1.0), None]);
    }

    #[test]
    fn test_align_three_columns_in_request_order() {
        let pac = series("Pac", &[(at(8, 0), 1.0), (at(8, 5), 2.0)]);
        let eday = series("Eday", &[(at(8, 5), 0.4)]);
        let soc = series("Cbattery1", &[(at(8, 0), 55.0), (at(8, 5), 56.0)]);

        let table = align(vec![pac, eday, soc]);

        assert_eq!(
            table.columns(),
            ["Pac".to_string(), "Eday".to_string(), "Cbattery1".to_string()]
        );
        assert_eq!(table.rows()[0].values, vec![Some(1.0), Some(0.4), Some(55.0)]);
        assert_eq!(table.rows()[1].values, vec![Some(2.0), Some(0.4), Some(56.0)]);
    }

    #[test]
    fn test_nearest_index_exact_match_takes_last_duplicate() {
        let samples = series("v", &[(at(8, 0), 1.0), (at(9, 0), 2.0), (at(9, 0), 3.0)]).samples;
        assert_eq!(nearest_index(&samples, at(9, 0)), Some(2));
    }

    #[test]
    fn test_nearest_index_strictly_closer_forward_wins() {
        let samples = series("v", &[(at(8, 0), 1.0), (at(9, 0), 2.0)]).samples;
        assert_eq!(nearest_index(&samples, at(8, 31)), Some(1));
        assert_eq!(nearest_index(&samples, at(8, 30)), Some(0));
    }

    #[test]
    fn test_nearest_index_outside_range() {
        let samples = series("v", &[(at(8, 0), 1.0), (at(9, 0), 2.0)]).samples;
        assert_eq!(nearest_index(&samples, at(6, 0)), Some(0));
        assert_eq!(nearest_index(&samples, at(23, 0)), Some(1));
        assert_eq!(nearest_index(&[], at(8, 0)), None);
    }
}
