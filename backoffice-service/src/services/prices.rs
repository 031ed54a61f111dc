//! Sell-price schedule operations.
//!
//! Active schedules of one product must not overlap in time; the check
//! runs inside the writing transaction. Nothing in the schema enforces
//! this, so every write path goes through these methods.

use backoffice_core::error::AppError;
use rust_decimal::Decimal;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::models::{
    stamp_create, stamp_soft_delete, stamp_update, CreateSellPrice, SellPrice, UpdateSellPrice,
};
use crate::services::database::Database;
use crate::services::metrics::DB_QUERY_DURATION;
use crate::services::overlap::has_date_overlap;

const SELL_PRICE_COLUMNS: &str = "sell_price_id, company_id, product_id, start_date, end_date, \
     sell_price, market_price, discount, active, slug, created_by, updated_by, deleted_by, \
     deleted_at, created_utc";

/// Discount percentage implied by selling below market price. Zero when
/// the market price is missing or not above zero.
pub fn derive_discount(sell_price: Decimal, market_price: Decimal) -> Decimal {
    if market_price <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    ((market_price - sell_price) / market_price * Decimal::from(100)).round_dp(2)
}

impl Database {
    /// Create a price schedule after verifying it does not overlap any
    /// other active schedule for the product.
    #[instrument(skip(self, input), fields(product_id = %input.product_id))]
    pub async fn create_sell_price(
        &self,
        input: &CreateSellPrice,
        actor: Uuid,
    ) -> Result<SellPrice, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_sell_price"])
            .start_timer();

        let mut input = input.clone();
        stamp_create(&mut input, actor);

        let discount = input
            .discount
            .unwrap_or_else(|| derive_discount(input.sell_price, input.market_price));

        let mut tx = self.pool().begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        if input.active
            && has_date_overlap(
                &mut tx,
                input.company_id,
                input.product_id,
                input.start_date,
                input.end_date,
                None,
            )
            .await?
        {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "An active price schedule for product {} already covers part of this interval",
                input.product_id
            )));
        }

        let sql = format!(
            r#"
            INSERT INTO sell_prices (sell_price_id, company_id, product_id, start_date, end_date,
                                     sell_price, market_price, discount, active, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {SELL_PRICE_COLUMNS}
            "#
        );
        let price = sqlx::query_as::<_, SellPrice>(&sql)
            .bind(Uuid::new_v4())
            .bind(input.company_id)
            .bind(input.product_id)
            .bind(input.start_date)
            .bind(input.end_date)
            .bind(input.sell_price)
            .bind(input.market_price)
            .bind(discount)
            .bind(input.active)
            .bind(input.audit.created_by)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to create sell price: {}", e))
            })?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();
        info!(sell_price_id = %price.sell_price_id, "Created sell price schedule");
        Ok(price)
    }

    /// Fetch a price schedule by id, excluding soft-deleted rows.
    #[instrument(skip(self))]
    pub async fn get_sell_price(
        &self,
        company_id: Uuid,
        sell_price_id: Uuid,
    ) -> Result<SellPrice, AppError> {
        let sql = format!(
            "SELECT {SELL_PRICE_COLUMNS} FROM sell_prices \
             WHERE company_id = $1 AND sell_price_id = $2 AND deleted_at IS NULL"
        );
        sqlx::query_as::<_, SellPrice>(&sql)
            .bind(company_id)
            .bind(sell_price_id)
            .fetch_optional(self.pool())
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to fetch sell price: {}", e))
            })?
            .ok_or_else(|| {
                AppError::NotFound(anyhow::anyhow!("Sell price {} not found", sell_price_id))
            })
    }

    /// Update a price schedule, re-validating overlap with the interval
    /// that would be stored. `start_date` keeps its stored value when
    /// `None`; `end_date` is replaced wholesale so a schedule can be
    /// reopened.
    #[instrument(skip(self, input))]
    pub async fn update_sell_price(
        &self,
        company_id: Uuid,
        sell_price_id: Uuid,
        input: &UpdateSellPrice,
        actor: Uuid,
    ) -> Result<SellPrice, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_sell_price"])
            .start_timer();

        let mut input = input.clone();
        stamp_update(&mut input, actor);

        let mut tx = self.pool().begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let sql = format!(
            "SELECT {SELL_PRICE_COLUMNS} FROM sell_prices \
             WHERE company_id = $1 AND sell_price_id = $2 AND deleted_at IS NULL FOR UPDATE"
        );
        let current = sqlx::query_as::<_, SellPrice>(&sql)
            .bind(company_id)
            .bind(sell_price_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to fetch sell price: {}", e))
            })?
            .ok_or_else(|| {
                AppError::NotFound(anyhow::anyhow!("Sell price {} not found", sell_price_id))
            })?;

        let start_date = input.start_date.or(current.start_date);
        let end_date = input.end_date;
        let sell_price = input.sell_price.unwrap_or(current.sell_price);
        let market_price = input.market_price.unwrap_or(current.market_price);
        let active = input.active.unwrap_or(current.active);

        let price_changed = input.sell_price.is_some() || input.market_price.is_some();
        let discount = match input.discount {
            Some(d) => d,
            None if price_changed => derive_discount(sell_price, market_price),
            None => current.discount,
        };

        if active
            && has_date_overlap(
                &mut tx,
                company_id,
                current.product_id,
                start_date,
                end_date,
                Some(sell_price_id),
            )
            .await?
        {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "An active price schedule for product {} already covers part of this interval",
                current.product_id
            )));
        }

        let sql = format!(
            r#"
            UPDATE sell_prices
            SET start_date = $3, end_date = $4, sell_price = $5, market_price = $6,
                discount = $7, active = $8, updated_by = $9
            WHERE company_id = $1 AND sell_price_id = $2
            RETURNING {SELL_PRICE_COLUMNS}
            "#
        );
        let price = sqlx::query_as::<_, SellPrice>(&sql)
            .bind(company_id)
            .bind(sell_price_id)
            .bind(start_date)
            .bind(end_date)
            .bind(sell_price)
            .bind(market_price)
            .bind(discount)
            .bind(active)
            .bind(input.audit.updated_by)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to update sell price: {}", e))
            })?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();
        info!(sell_price_id = %price.sell_price_id, "Updated sell price schedule");
        Ok(price)
    }

    /// Soft-delete a price schedule, recording who deleted it and when.
    #[instrument(skip(self))]
    pub async fn delete_sell_price(
        &self,
        company_id: Uuid,
        sell_price_id: Uuid,
        actor: Uuid,
    ) -> Result<(), AppError> {
        let mut price = self.get_sell_price(company_id, sell_price_id).await?;
        stamp_soft_delete(&mut price, actor);

        let result = sqlx::query(
            "UPDATE sell_prices SET deleted_by = $3, deleted_at = $4 \
             WHERE company_id = $1 AND sell_price_id = $2 AND deleted_at IS NULL",
        )
        .bind(company_id)
        .bind(sell_price_id)
        .bind(price.audit.deleted_by)
        .bind(price.audit.deleted_at)
        .execute(self.pool())
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to delete sell price: {}", e))
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(anyhow::anyhow!(
                "Sell price {} not found",
                sell_price_id
            )));
        }
        info!(sell_price_id = %sell_price_id, "Soft-deleted sell price schedule");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discount_derives_from_sell_and_market_price() {
        assert_eq!(
            derive_discount(Decimal::from(80), Decimal::from(100)),
            Decimal::from(20)
        );
        assert_eq!(
            derive_discount(Decimal::from(75), Decimal::from(150)),
            Decimal::from(50)
        );
    }

    #[test]
    fn discount_is_zero_without_a_positive_market_price() {
        assert_eq!(
            derive_discount(Decimal::from(80), Decimal::ZERO),
            Decimal::ZERO
        );
        assert_eq!(
            derive_discount(Decimal::from(80), Decimal::from(-5)),
            Decimal::ZERO
        );
    }

    #[test]
    fn selling_above_market_yields_negative_discount() {
        assert_eq!(
            derive_discount(Decimal::from(110), Decimal::from(100)),
            Decimal::from(-10)
        );
    }
}
