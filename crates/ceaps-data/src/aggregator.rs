//! Daily aggregation of normalized expense records.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use ceaps_core::models::{DailyTotal, ExpenseRecord, ForecastSeries};

// ── Public API ────────────────────────────────────────────────────────────────

/// Group records by calendar date, summing and counting resolved amounts.
///
/// Rows without a resolved date are dropped from the aggregation. A row with
/// a date but no amount keeps its date group alive without contributing to
/// either the sum or the count. The result is ordered ascending by date;
/// dates are unique since they are the group key.
pub fn aggregate_daily(records: &[ExpenseRecord]) -> Vec<DailyTotal> {
    // BTreeMap keeps the keys sorted ascending.
    let mut map: BTreeMap<NaiveDate, (f64, u32)> = BTreeMap::new();

    for record in records {
        let Some(date) = record.date else {
            continue;
        };
        let entry = map.entry(date).or_insert((0.0, 0));
        if let Some(amount) = record.amount {
            entry.0 += amount;
            entry.1 += 1;
        }
    }

    map.into_iter()
        .map(|(date, (total_amount, entry_count))| DailyTotal {
            date,
            total_amount,
            entry_count,
        })
        .collect()
}

/// Build the collaborator-facing two-column series from the daily totals.
pub fn to_forecast_series(days: &[DailyTotal]) -> ForecastSeries {
    ForecastSeries::from(days)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn record(date: Option<&str>, amount: Option<f64>) -> ExpenseRecord {
        ExpenseRecord {
            year: Some(2021),
            month: Some(1),
            senator: "FULANO".to_string(),
            expense_type: "Passagens".to_string(),
            payee_tax_id: "Não Identificado".to_string(),
            supplier: "Fornecedor SA".to_string(),
            document: "NF-1".to_string(),
            date: date.and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()),
            details: "Sem detalhamento".to_string(),
            amount,
            document_code: "1".to_string(),
        }
    }

    #[test]
    fn test_groups_sum_and_count_per_date() {
        let records = vec![
            record(Some("2021-01-01"), Some(10.0)),
            record(Some("2021-01-01"), Some(20.0)),
            record(Some("2021-01-02"), Some(5.0)),
        ];
        let days = aggregate_daily(&records);

        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2021, 1, 1).unwrap());
        assert_eq!(days[0].total_amount, 30.0);
        assert_eq!(days[0].entry_count, 2);
        assert_eq!(days[1].date, NaiveDate::from_ymd_opt(2021, 1, 2).unwrap());
        assert_eq!(days[1].total_amount, 5.0);
        assert_eq!(days[1].entry_count, 1);
    }

    #[test]
    fn test_sorted_ascending_regardless_of_input_order() {
        let records = vec![
            record(Some("2021-03-05"), Some(1.0)),
            record(Some("2021-01-20"), Some(1.0)),
            record(Some("2021-02-11"), Some(1.0)),
        ];
        let days = aggregate_daily(&records);
        let dates: Vec<NaiveDate> = days.iter().map(|d| d.date).collect();
        let mut sorted = dates.clone();
        sorted.sort();
        assert_eq!(dates, sorted);
    }

    #[test]
    fn test_rows_without_date_are_dropped() {
        let records = vec![
            record(None, Some(10.0)),
            record(Some("2021-01-01"), Some(5.0)),
        ];
        let days = aggregate_daily(&records);
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].total_amount, 5.0);
    }

    #[test]
    fn test_missing_amount_keeps_group_but_contributes_nothing() {
        let records = vec![
            record(Some("2021-01-01"), None),
            record(Some("2021-01-02"), Some(7.0)),
        ];
        let days = aggregate_daily(&records);
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].total_amount, 0.0);
        assert_eq!(days[0].entry_count, 0);
    }

    #[test]
    fn test_empty_input() {
        assert!(aggregate_daily(&[]).is_empty());
    }

    #[test]
    fn test_forecast_series_mirrors_daily_totals() {
        let records = vec![
            record(Some("2021-01-01"), Some(10.0)),
            record(Some("2021-01-02"), Some(5.0)),
        ];
        let days = aggregate_daily(&records);
        let series = to_forecast_series(&days);
        assert_eq!(series.points.len(), 2);
        assert_eq!(series.points[0].y, 10.0);
        assert_eq!(
            series.points[1].ds,
            NaiveDate::from_ymd_opt(2021, 1, 2).unwrap()
        );
    }
}
