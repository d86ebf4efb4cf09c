//! Demo order source for the interval publisher.
//!
//! Stands in for an upstream producer: every call yields a fresh, valid order keyed by its UID.

use crate::model::{Delivery, Item, Order, Payment};
use chrono::Utc;
use uuid::Uuid;

const BRANDS: [&str; 4] = ["Vivienne Sabo", "Maybelline", "Loreal", "Nivea"];
const CITIES: [(&str, &str); 3] = [
    ("Kiryat Mozkin", "Kraiot"),
    ("Haifa", "Hefa"),
    ("Tel Aviv", "Merkaz"),
];

/// Returns `(key, order)` with `key == order.order_uid.to_string()`.
pub fn demo_order() -> (String, Order) {
    let order_uid = Uuid::new_v4();
    let seed = order_uid.as_bytes();
    let track_number = format!("WBILM{:08}", u32::from_be_bytes([seed[0], seed[1], seed[2], seed[3]]) % 100_000_000);
    let (city, region) = CITIES[seed[4] as usize % CITIES.len()];

    let item_count = 1 + seed[5] as usize % 3;
    let items: Vec<Item> = (0..item_count)
        .map(|i| {
            let price = 100 + i64::from(seed[6 + i]) * 10;
            let sale = i64::from(seed[9] % 50);
            Item {
                chrt_id: 9_934_930 + i64::from(seed[10]) * 100 + i as i64,
                track_number: track_number.clone(),
                price,
                rid: Uuid::new_v4(),
                name: "Mascaras".to_string(),
                sale,
                size: "0".to_string(),
                total_price: (price * (100 - sale) / 100).max(1),
                nm_id: 2_389_212 + i64::from(seed[11]),
                brand: BRANDS[(seed[12] as usize + i) % BRANDS.len()].to_string(),
                status: 202,
            }
        })
        .collect();

    let goods_total: i64 = items.iter().map(|item| item.total_price).sum();
    let delivery_cost = 1500;
    let now = Utc::now();

    let order = Order {
        order_uid,
        track_number,
        entry: "WBIL".to_string(),
        delivery: Delivery {
            name: "Test Testov".to_string(),
            phone: format!("+972{:08}", u32::from_be_bytes([0, seed[13], seed[14], seed[15]]) % 100_000_000),
            zip: format!("{:06}", u32::from(seed[13]) * 1000 + u32::from(seed[14])),
            city: city.to_string(),
            address: format!("Ploshad Mira {}", 1 + seed[15] % 40),
            region: region.to_string(),
            email: "test@gmail.com".to_string(),
        },
        payment: Payment {
            transaction: order_uid,
            request_id: String::new(),
            currency: "USD".to_string(),
            provider: "wbpay".to_string(),
            amount: goods_total + delivery_cost,
            payment_dt: now.timestamp(),
            bank: "alpha".to_string(),
            delivery_cost,
            goods_total,
            custom_fee: 0,
        },
        items,
        locale: "en".to_string(),
        internal_signature: "demo".to_string(),
        customer_id: "test".to_string(),
        delivery_service: "meest".to_string(),
        shardkey: (seed[1] % 10).to_string(),
        sm_id: 99,
        date_created: now,
        oof_shard: "1".to_string(),
    };

    (order_uid.to_string(), order)
}
