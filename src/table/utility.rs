use chrono::NaiveDateTime;

use crate::table::types::AlignedTable;

/// Non-null values of `column` in row order. Empty when the column is absent.
pub fn non_null(table: &AlignedTable, column: &str) -> Vec<(NaiveDateTime, f64)> {
    table
        .column(column)
        .map(|it| it.filter_map(|(t, v)| v.map(|v| (t, v))).collect())
        .unwrap_or_default()
}

/// First non-null value of `column`.
pub fn first_value(table: &AlignedTable, column: &str) -> Option<f64> {
    table.column(column)?.find_map(|(_, v)| v)
}

/// Last non-null value of `column`.
pub fn last_value(table: &AlignedTable, column: &str) -> Option<f64> {
    table.column(column)?.filter_map(|(_, v)| v).last()
}

/// Maximum non-null value of `column` with its timestamp. Ties keep the first row.
pub fn argmax(table: &AlignedTable, column: &str) -> Option<(NaiveDateTime, f64)> {
    non_null(table, column)
        .into_iter()
        .fold(None, |best, (t, v)| match best {
            Some((_, b)) if v <= b => best,
            _ => Some((t, v)),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::types::Row;
    use chrono::NaiveDate;

    fn at(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 8, 12)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn table(values: &[Option<f64>]) -> AlignedTable {
        let rows = values
            .iter()
            .enumerate()
            .map(|(i, v)| Row {
                time: at(i as u32),
                values: vec![*v],
            })
            .collect();
        AlignedTable::from_rows(vec!["Pac".into()], rows)
    }

    #[test]
    fn test_first_and_last_skip_nulls() {
        let t = table(&[None, Some(2.0), Some(3.0), None]);
        assert_eq!(first_value(&t, "Pac"), Some(2.0));
        assert_eq!(last_value(&t, "Pac"), Some(3.0));
    }

    #[test]
    fn test_missing_column() {
        let t = table(&[Some(1.0)]);
        assert_eq!(first_value(&t, "Eday"), None);
        assert_eq!(last_value(&t, "Eday"), None);
        assert_eq!(argmax(&t, "Eday"), None);
        assert!(non_null(&t, "Eday").is_empty());
    }

    #[test]
    fn test_argmax_first_occurrence_on_tie() {
        let t = table(&[Some(1.0), Some(5.0), None, Some(5.0)]);
        assert_eq!(argmax(&t, "Pac"), Some((at(1), 5.0)));
    }

    #[test]
    fn test_argmax_all_null() {
        let t = table(&[None, None]);
        assert_eq!(argmax(&t, "Pac"), None);
    }
}
