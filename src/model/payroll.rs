use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Payroll {
    pub id: u64,
    pub user_id: u64,
    #[schema(example = "2026-01-01", value_type = String, format = "date")]
    pub month: NaiveDate,
    #[schema(example = 50000.0)]
    pub base_salary: f64,
    #[schema(example = 5000.0)]
    pub bonus: f64,
    #[schema(example = 2000.0)]
    pub deductions: f64,
    #[schema(example = 53000.0)]
    pub net_salary: f64,
}

#[derive(Debug, Clone)]
pub struct NewPayroll {
    pub user_id: u64,
    pub month: NaiveDate,
    pub base_salary: f64,
    pub bonus: f64,
    pub deductions: f64,
}

pub fn net_salary(base_salary: f64, bonus: f64, deductions: f64) -> f64 {
    base_salary + bonus - deductions
}

/// Payroll rows are keyed by the first day of their month.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_is_normalised_to_first_day() {
        let d = NaiveDate::from_ymd_opt(2026, 3, 17).unwrap();
        assert_eq!(month_start(d), NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
    }

    #[test]
    fn net_is_base_plus_bonus_minus_deductions() {
        assert_eq!(net_salary(50_000.0, 5_000.0, 2_000.0), 53_000.0);
    }
}
