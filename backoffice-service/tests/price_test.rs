//! Sell-price schedule integration tests for backoffice-service.

mod common;

use backoffice_core::error::AppError;
use backoffice_service::models::{AuditFields, CreateSellPrice, UpdateSellPrice};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn price_input(
    company_id: Uuid,
    product_id: Uuid,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
) -> CreateSellPrice {
    CreateSellPrice {
        company_id,
        product_id,
        start_date,
        end_date,
        sell_price: Decimal::from(80),
        market_price: Decimal::from(100),
        discount: None,
        active: true,
        audit: AuditFields::default(),
    }
}

#[tokio::test]
async fn creating_a_schedule_derives_the_discount() {
    let Some(db) = common::try_database().await else {
        return;
    };
    let company_id = Uuid::new_v4();
    let product_id = common::seed_product(&db, company_id).await;
    let actor = Uuid::new_v4();

    let input = price_input(
        company_id,
        product_id,
        Some(date(2026, 1, 1)),
        Some(date(2026, 6, 30)),
    );
    let price = db
        .create_sell_price(&input, actor)
        .await
        .expect("Failed to create sell price");

    assert_eq!(price.discount, Decimal::from(20));
    assert!(price.active);
    assert_eq!(price.audit.created_by, Some(actor));
}

#[tokio::test]
async fn overlapping_active_schedules_are_rejected() {
    let Some(db) = common::try_database().await else {
        return;
    };
    let company_id = Uuid::new_v4();
    let product_id = common::seed_product(&db, company_id).await;
    let actor = Uuid::new_v4();

    let first = price_input(
        company_id,
        product_id,
        Some(date(2026, 1, 1)),
        Some(date(2026, 6, 30)),
    );
    db.create_sell_price(&first, actor)
        .await
        .expect("Failed to create first schedule");

    // Starts inside the first interval.
    let second = price_input(
        company_id,
        product_id,
        Some(date(2026, 6, 1)),
        Some(date(2026, 12, 31)),
    );
    let err = db
        .create_sell_price(&second, actor)
        .await
        .expect_err("Overlapping schedule should be rejected");
    assert!(matches!(err, AppError::Conflict(_)), "got {:?}", err);
}

#[tokio::test]
async fn adjacent_schedules_are_allowed() {
    let Some(db) = common::try_database().await else {
        return;
    };
    let company_id = Uuid::new_v4();
    let product_id = common::seed_product(&db, company_id).await;
    let actor = Uuid::new_v4();

    let first = price_input(
        company_id,
        product_id,
        Some(date(2026, 1, 1)),
        Some(date(2026, 6, 30)),
    );
    db.create_sell_price(&first, actor)
        .await
        .expect("Failed to create first schedule");

    let second = price_input(
        company_id,
        product_id,
        Some(date(2026, 7, 1)),
        Some(date(2026, 12, 31)),
    );
    db.create_sell_price(&second, actor)
        .await
        .expect("Adjacent schedule should be accepted");
}

#[tokio::test]
async fn an_open_ended_schedule_blocks_everything_after_its_start() {
    let Some(db) = common::try_database().await else {
        return;
    };
    let company_id = Uuid::new_v4();
    let product_id = common::seed_product(&db, company_id).await;
    let actor = Uuid::new_v4();

    let open_ended = price_input(company_id, product_id, Some(date(2026, 1, 1)), None);
    db.create_sell_price(&open_ended, actor)
        .await
        .expect("Failed to create open-ended schedule");

    let far_future = price_input(
        company_id,
        product_id,
        Some(date(2030, 1, 1)),
        Some(date(2030, 12, 31)),
    );
    let err = db
        .create_sell_price(&far_future, actor)
        .await
        .expect_err("Open-ended schedule should block later intervals");
    assert!(matches!(err, AppError::Conflict(_)), "got {:?}", err);
}

#[tokio::test]
async fn an_inverted_interval_is_empty_and_never_conflicts() {
    let Some(db) = common::try_database().await else {
        return;
    };
    let company_id = Uuid::new_v4();
    let product_id = common::seed_product(&db, company_id).await;
    let actor = Uuid::new_v4();

    let open_ended = price_input(company_id, product_id, Some(date(2026, 1, 1)), None);
    db.create_sell_price(&open_ended, actor)
        .await
        .expect("Failed to create open-ended schedule");

    // start > end: the candidate covers no days, so even an enclosing
    // open-ended schedule is no conflict.
    let inverted = price_input(
        company_id,
        product_id,
        Some(date(2026, 2, 1)),
        Some(date(2026, 1, 1)),
    );
    db.create_sell_price(&inverted, actor)
        .await
        .expect("Empty candidate interval must not be rejected");
}

#[tokio::test]
async fn inactive_schedules_do_not_block() {
    let Some(db) = common::try_database().await else {
        return;
    };
    let company_id = Uuid::new_v4();
    let product_id = common::seed_product(&db, company_id).await;
    let actor = Uuid::new_v4();

    let mut inactive = price_input(company_id, product_id, Some(date(2026, 1, 1)), None);
    inactive.active = false;
    db.create_sell_price(&inactive, actor)
        .await
        .expect("Failed to create inactive schedule");

    let overlapping = price_input(
        company_id,
        product_id,
        Some(date(2026, 3, 1)),
        Some(date(2026, 3, 31)),
    );
    db.create_sell_price(&overlapping, actor)
        .await
        .expect("Inactive schedules should not block new ones");
}

#[tokio::test]
async fn closing_a_schedule_makes_room_for_a_successor() {
    let Some(db) = common::try_database().await else {
        return;
    };
    let company_id = Uuid::new_v4();
    let product_id = common::seed_product(&db, company_id).await;
    let actor = Uuid::new_v4();

    let open_ended = price_input(company_id, product_id, Some(date(2026, 1, 1)), None);
    let first = db
        .create_sell_price(&open_ended, actor)
        .await
        .expect("Failed to create schedule");

    // Close the interval, then add a successor starting after it.
    let close = UpdateSellPrice {
        end_date: Some(date(2026, 6, 30)),
        ..Default::default()
    };
    let closed = db
        .update_sell_price(company_id, first.sell_price_id, &close, actor)
        .await
        .expect("Failed to close schedule");
    assert_eq!(closed.end_date, Some(date(2026, 6, 30)));

    let successor = price_input(company_id, product_id, Some(date(2026, 7, 1)), None);
    db.create_sell_price(&successor, actor)
        .await
        .expect("Successor should fit after the closed interval");
}

#[tokio::test]
async fn price_change_rederives_the_discount() {
    let Some(db) = common::try_database().await else {
        return;
    };
    let company_id = Uuid::new_v4();
    let product_id = common::seed_product(&db, company_id).await;
    let actor = Uuid::new_v4();

    let input = price_input(
        company_id,
        product_id,
        Some(date(2026, 1, 1)),
        Some(date(2026, 12, 31)),
    );
    let price = db
        .create_sell_price(&input, actor)
        .await
        .expect("Failed to create sell price");
    assert_eq!(price.discount, Decimal::from(20));

    let update = UpdateSellPrice {
        sell_price: Some(Decimal::from(50)),
        end_date: price.end_date,
        ..Default::default()
    };
    let updated = db
        .update_sell_price(company_id, price.sell_price_id, &update, actor)
        .await
        .expect("Failed to update sell price");

    assert_eq!(updated.sell_price, Decimal::from(50));
    assert_eq!(updated.discount, Decimal::from(50));
    assert_eq!(updated.audit.updated_by, Some(actor));
}
