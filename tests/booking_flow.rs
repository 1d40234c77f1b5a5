//! Сквозные сценарии движка бронирования: каталог в памяти, полный
//! конвейер бронь/отмена, конкурентные попытки на одну категорию.

use std::sync::Arc;

use anyhow::Result;
use chrono::{Duration, Utc};
use uuid::Uuid;

use show_booking::config::{BookingConfig, Config};
use show_booking::models::{MovieSlot, SeatType};
use show_booking::{BookSeatsRequest, BookingEngine, BookingError, BookingSystem, InMemoryCatalog};

const SLOT_MAIN: i64 = 1;
const SLOT_PULLED: i64 = 2;
const SLOT_TEMPLATED: i64 = 3;
const REGULAR: i64 = 1;
const VIP: i64 = 2;

fn seed_catalog() -> Arc<InMemoryCatalog> {
    let catalog = InMemoryCatalog::new();

    catalog.insert_seat_type(SeatType {
        id: REGULAR,
        name: "Regular".to_string(),
        premium_percentage: 0.0,
        location: 2,
    });
    catalog.insert_seat_type(SeatType {
        id: VIP,
        name: "VIP".to_string(),
        premium_percentage: 50.0,
        location: 1,
    });

    catalog.insert_slot(MovieSlot {
        id: SLOT_MAIN,
        movie_id: 1,
        showroom_id: 1,
        base_price: 100,
        starts_at: Utc::now() + Duration::hours(2),
        watchable: true,
    });
    catalog.set_slot_capacity(SLOT_MAIN, REGULAR, 10);
    catalog.set_slot_capacity(SLOT_MAIN, VIP, 5);

    // фильм снят с проката
    catalog.insert_slot(MovieSlot {
        id: SLOT_PULLED,
        movie_id: 2,
        showroom_id: 1,
        base_price: 100,
        starts_at: Utc::now() + Duration::hours(3),
        watchable: false,
    });
    catalog.set_slot_capacity(SLOT_PULLED, REGULAR, 10);

    // сеанс без явной рассадки, работает шаблон зала 7
    catalog.insert_slot(MovieSlot {
        id: SLOT_TEMPLATED,
        movie_id: 1,
        showroom_id: 7,
        base_price: 200,
        starts_at: Utc::now() + Duration::hours(4),
        watchable: true,
    });
    catalog.set_showroom_default(7, REGULAR, 3);

    Arc::new(catalog)
}

fn engine() -> BookingEngine {
    BookingEngine::new(seed_catalog(), BookingConfig::default())
}

fn request(user_id: i64, slot_id: i64, seat_type_id: i64, quantity: u32) -> BookSeatsRequest {
    BookSeatsRequest {
        user_id,
        slot_id,
        seat_type_id,
        quantity,
    }
}

#[tokio::test]
async fn book_then_cancel_restores_remaining() -> Result<()> {
    let engine = engine();

    assert_eq!(engine.get_remaining(SLOT_MAIN, REGULAR).await?, 10);

    let booking = engine.book_seats(request(7, SLOT_MAIN, REGULAR, 4)).await?;
    assert_eq!(booking.quantity, 4);
    assert_eq!(booking.total_price, 400);
    assert!(booking.is_active());
    assert!(!booking.ticket_number.is_empty());
    assert_eq!(engine.get_remaining(SLOT_MAIN, REGULAR).await?, 6);

    engine.cancel_booking(booking.id).await?;
    assert_eq!(engine.get_remaining(SLOT_MAIN, REGULAR).await?, 10);

    // запись остается для аудита, но уже не активна
    let cancelled = engine.get_booking(booking.id).expect("record retained");
    assert!(!cancelled.is_active());
    Ok(())
}

#[tokio::test]
async fn vip_premium_is_applied_to_price() -> Result<()> {
    let engine = engine();
    let booking = engine.book_seats(request(7, SLOT_MAIN, VIP, 2)).await?;
    // 100 * 1.5 * 2
    assert_eq!(booking.total_price, 300);
    Ok(())
}

#[tokio::test]
async fn non_watchable_slot_is_rejected_before_ledger() {
    let engine = engine();
    let err = engine
        .book_seats(request(7, SLOT_PULLED, REGULAR, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::InvalidRequest(_)));
    // леджер не трогали: строка так и не установлена
    assert!(!engine.ledger().is_configured(SLOT_PULLED, REGULAR));
}

#[tokio::test]
async fn invalid_quantities_are_rejected() {
    let engine = engine();

    let err = engine
        .book_seats(request(7, SLOT_MAIN, REGULAR, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::InvalidRequest(_)));

    // выше лимита на одну бронь
    let err = engine
        .book_seats(request(7, SLOT_MAIN, REGULAR, 11))
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::InvalidRequest(_)));
}

#[tokio::test]
async fn unknown_slot_and_seat_type_are_invalid_requests() {
    let engine = engine();

    let err = engine
        .book_seats(request(7, 999, REGULAR, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::InvalidRequest(_)));

    let err = engine
        .book_seats(request(7, SLOT_MAIN, 999, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::InvalidRequest(_)));
}

#[tokio::test]
async fn overlapping_bookings_exactly_one_wins() -> Result<()> {
    let engine = Arc::new(engine());
    let barrier = Arc::new(tokio::sync::Barrier::new(2));

    let mut handles = Vec::new();
    for user_id in [7, 8] {
        let engine = engine.clone();
        let barrier = barrier.clone();
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            engine.book_seats(request(user_id, SLOT_MAIN, VIP, 3)).await
        }));
    }

    let mut successes = 0;
    let mut sold_out = 0;
    for handle in handles {
        match handle.await? {
            Ok(_) => successes += 1,
            Err(BookingError::SoldOut { .. }) => sold_out += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(sold_out, 1);
    assert_eq!(engine.get_remaining(SLOT_MAIN, VIP).await?, 2);
    Ok(())
}

#[tokio::test]
async fn concurrent_single_seat_rush_never_oversells() -> Result<()> {
    let engine = Arc::new(engine());
    let barrier = Arc::new(tokio::sync::Barrier::new(25));

    let mut handles = Vec::new();
    for user_id in 0..25 {
        let engine = engine.clone();
        let barrier = barrier.clone();
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            engine
                .book_seats(request(user_id + 1, SLOT_MAIN, REGULAR, 1))
                .await
        }));
    }

    let mut tickets = std::collections::HashSet::new();
    let mut successes = 0;
    for handle in handles {
        if let Ok(booking) = handle.await? {
            successes += 1;
            assert!(tickets.insert(booking.ticket_number));
        }
    }

    // ровно вместимость категории, ни местом больше
    assert_eq!(successes, 10);
    assert_eq!(engine.get_remaining(SLOT_MAIN, REGULAR).await?, 0);
    Ok(())
}

#[tokio::test]
async fn failed_pricing_after_hold_releases_seats() -> Result<()> {
    // каталог с испорченной ценой сеанса: валидации и резерв проходят,
    // падает только расчет цены — уже после удержания мест
    let catalog = InMemoryCatalog::new();
    catalog.insert_seat_type(SeatType {
        id: REGULAR,
        name: "Regular".to_string(),
        premium_percentage: 0.0,
        location: 1,
    });
    catalog.insert_slot(MovieSlot {
        id: 9,
        movie_id: 1,
        showroom_id: 1,
        base_price: -100,
        starts_at: Utc::now() + Duration::hours(1),
        watchable: true,
    });
    catalog.set_slot_capacity(9, REGULAR, 5);
    let engine = BookingEngine::new(Arc::new(catalog), BookingConfig::default());

    let err = engine.book_seats(request(7, 9, REGULAR, 2)).await.unwrap_err();
    assert!(matches!(err, BookingError::InvalidRequest(_)));

    // компенсирующий release вернул места: вместимость не утекла
    assert_eq!(engine.get_remaining(9, REGULAR).await?, 5);
    let booking = engine.book_seats(request(7, 9, REGULAR, 5)).await;
    assert!(booking.is_err()); // цена всё ещё кривая
    assert_eq!(engine.get_remaining(9, REGULAR).await?, 5);
    Ok(())
}

#[tokio::test]
async fn cancel_unknown_and_double_cancel() -> Result<()> {
    let engine = engine();

    let err = engine.cancel_booking(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, BookingError::NotFound { .. }));

    let booking = engine.book_seats(request(7, SLOT_MAIN, REGULAR, 2)).await?;
    engine.cancel_booking(booking.id).await?;
    let err = engine.cancel_booking(booking.id).await.unwrap_err();
    assert!(matches!(err, BookingError::AlreadyCancelled(id) if id == booking.id));

    // повторная отмена не вернула места второй раз
    assert_eq!(engine.get_remaining(SLOT_MAIN, REGULAR).await?, 10);
    Ok(())
}

#[tokio::test]
async fn availability_listing_is_ordered_by_location() -> Result<()> {
    let engine = engine();
    engine.book_seats(request(7, SLOT_MAIN, REGULAR, 4)).await?;

    let listing = engine.list_availability(SLOT_MAIN).await?;
    let view: Vec<(String, u32)> = listing
        .into_iter()
        .map(|a| (a.seat_type_name, a.remaining))
        .collect();
    // VIP (location 1) раньше Regular (location 2)
    assert_eq!(
        view,
        vec![("VIP".to_string(), 5), ("Regular".to_string(), 6)]
    );

    let err = engine.list_availability(999).await.unwrap_err();
    assert!(matches!(err, BookingError::NotFound { .. }));
    Ok(())
}

#[tokio::test]
async fn open_slots_hide_booked_out_and_pulled_shows() -> Result<()> {
    let engine = engine();

    let open = engine.list_open_slots().await?;
    let ids: Vec<i64> = open.iter().map(|o| o.slot.id).collect();
    assert_eq!(ids, vec![SLOT_MAIN, SLOT_TEMPLATED]);

    // выкупаем главный сеанс целиком
    engine.book_seats(request(1, SLOT_MAIN, REGULAR, 10)).await?;
    engine.book_seats(request(1, SLOT_MAIN, VIP, 5)).await?;

    let open = engine.list_open_slots().await?;
    let ids: Vec<i64> = open.iter().map(|o| o.slot.id).collect();
    assert_eq!(ids, vec![SLOT_TEMPLATED]);
    Ok(())
}

#[tokio::test]
async fn showroom_template_supplies_capacity() -> Result<()> {
    let engine = engine();

    assert_eq!(engine.get_remaining(SLOT_TEMPLATED, REGULAR).await?, 3);
    let booking = engine
        .book_seats(request(7, SLOT_TEMPLATED, REGULAR, 3))
        .await?;
    assert_eq!(booking.total_price, 600);
    assert_eq!(engine.get_remaining(SLOT_TEMPLATED, REGULAR).await?, 0);

    // VIP в шаблоне зала 7 нет
    let err = engine
        .book_seats(request(7, SLOT_TEMPLATED, VIP, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::InvalidRequest(_)));
    Ok(())
}

#[tokio::test]
async fn booking_system_wires_engine_from_env_config() -> Result<()> {
    let system = BookingSystem::new(seed_catalog(), Config::from_env());

    let booking = system
        .engine
        .book_seats(request(7, SLOT_MAIN, REGULAR, 1))
        .await?;
    assert!(booking
        .ticket_number
        .starts_with(&system.config.booking.ticket_prefix));
    Ok(())
}

#[tokio::test]
async fn user_booking_history_is_newest_first() -> Result<()> {
    let engine = engine();

    let first = engine.book_seats(request(7, SLOT_MAIN, REGULAR, 1)).await?;
    let second = engine.book_seats(request(7, SLOT_MAIN, VIP, 1)).await?;
    engine.book_seats(request(8, SLOT_MAIN, REGULAR, 1)).await?;

    let history = engine.bookings_for_user(7);
    assert_eq!(history.len(), 2);
    assert!(history.iter().all(|b| b.user_id == 7));
    let pos_first = history.iter().position(|b| b.id == first.id).unwrap();
    let pos_second = history.iter().position(|b| b.id == second.id).unwrap();
    assert!(pos_second < pos_first);
    Ok(())
}
