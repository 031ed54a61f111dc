//! Date-interval overlap checks for effectivity ranges.
//!
//! An open bound (`None` / NULL) extends the interval to infinity on
//! that side, so a price row with no end date conflicts with everything
//! after its start date.

use backoffice_core::error::AppError;
use chrono::NaiveDate;
use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

/// True when the two closed intervals share at least one day. A `None`
/// bound is treated as minus or plus infinity.
pub fn intervals_overlap(
    a_start: Option<NaiveDate>,
    a_end: Option<NaiveDate>,
    b_start: Option<NaiveDate>,
    b_end: Option<NaiveDate>,
) -> bool {
    let a_start = a_start.unwrap_or(NaiveDate::MIN);
    let a_end = a_end.unwrap_or(NaiveDate::MAX);
    let b_start = b_start.unwrap_or(NaiveDate::MIN);
    let b_end = b_end.unwrap_or(NaiveDate::MAX);

    // An interval whose bounds are inverted is empty and cannot share a
    // day with anything.
    if a_start > a_end || b_start > b_end {
        return false;
    }

    a_start <= b_end && b_start <= a_end
}

/// Check whether any other active sell price for the product overlaps
/// the candidate interval. `exclude_id` skips the row being updated.
#[instrument(skip(conn))]
pub async fn has_date_overlap(
    conn: &mut PgConnection,
    company_id: Uuid,
    product_id: Uuid,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    exclude_id: Option<Uuid>,
) -> Result<bool, AppError> {
    let intervals: Vec<(Option<NaiveDate>, Option<NaiveDate>)> = sqlx::query_as(
        r#"
        SELECT start_date, end_date FROM sell_prices
        WHERE company_id = $1
          AND product_id = $2
          AND active = TRUE
          AND deleted_at IS NULL
          AND ($3::uuid IS NULL OR sell_price_id <> $3)
        "#,
    )
    .bind(company_id)
    .bind(product_id)
    .bind(exclude_id)
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| {
        AppError::DatabaseError(anyhow::anyhow!("Failed to load price schedules: {}", e))
    })?;

    Ok(intervals
        .into_iter()
        .any(|(other_start, other_end)| {
            intervals_overlap(start_date, end_date, other_start, other_end)
        }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, day)
    }

    #[test]
    fn disjoint_intervals_do_not_overlap() {
        assert!(!intervals_overlap(
            d(2026, 1, 1),
            d(2026, 1, 31),
            d(2026, 2, 1),
            d(2026, 2, 28)
        ));
    }

    #[test]
    fn touching_endpoints_count_as_overlap() {
        assert!(intervals_overlap(
            d(2026, 1, 1),
            d(2026, 1, 31),
            d(2026, 1, 31),
            d(2026, 2, 28)
        ));
    }

    #[test]
    fn containment_overlaps() {
        assert!(intervals_overlap(
            d(2026, 1, 1),
            d(2026, 12, 31),
            d(2026, 6, 1),
            d(2026, 6, 30)
        ));
    }

    #[test]
    fn open_end_extends_to_infinity() {
        assert!(intervals_overlap(
            d(2026, 1, 1),
            None,
            d(2030, 1, 1),
            d(2030, 12, 31)
        ));
        assert!(!intervals_overlap(
            None,
            d(2025, 12, 31),
            d(2026, 1, 1),
            None
        ));
    }

    #[test]
    fn fully_open_interval_overlaps_everything() {
        assert!(intervals_overlap(None, None, d(1999, 1, 1), d(1999, 1, 2)));
        assert!(intervals_overlap(None, None, None, None));
    }

    #[test]
    fn inverted_interval_is_empty() {
        assert!(!intervals_overlap(
            d(2026, 2, 1),
            d(2026, 1, 1),
            d(2026, 1, 15),
            d(2026, 1, 20)
        ));
        // Empty even against intervals that enclose its bounds.
        assert!(!intervals_overlap(d(2026, 2, 1), d(2026, 1, 1), None, None));
        assert!(!intervals_overlap(
            d(2026, 2, 1),
            d(2026, 1, 1),
            d(2026, 1, 1),
            None
        ));
        assert!(!intervals_overlap(
            d(2026, 1, 15),
            d(2026, 1, 20),
            d(2026, 2, 1),
            d(2026, 1, 1)
        ));
    }
}
