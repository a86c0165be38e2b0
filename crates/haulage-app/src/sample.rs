// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Fixed demo data shown when no backend is configured.

use time::macros::{date, datetime};

use crate::{
    DailyActivity, DailyShipments, Invoice, InvoiceId, Notification, NotificationId,
    PaymentStatus, PendingInvoice, QuickAction, ShipmentStatus, StatusShare, Supplier, Trip,
    TripId, VehicleUsage, WeightUnit,
};

pub const INVOICE_COUNT: usize = 30;

const SUPPLIER_NAME: &str = "Midway Concrete (Vic) Pty Ltd";
const SUPPLIER_ADDRESS: &str = "6-12 Plummer Rd, Laverton North, Vic 3026";
const MIXED_PRODUCT: &str = "Sand, 14ML ROCK, 20ML ROCK, CRUSHED ROCK";

/// The 30-row invoice list, newest number first.
pub fn invoices() -> Vec<Invoice> {
    (0..INVOICE_COUNT).map(sample_invoice).collect()
}

fn sample_invoice(i: usize) -> Invoice {
    let even = i % 2 == 0;
    Invoice {
        id: InvoiceId::new(i as i64 + 1),
        number: format!("INV20251100{:03}", 41 - i),
        date: date!(2025 - 11 - 16),
        supplier: Supplier {
            name: SUPPLIER_NAME.to_owned(),
            address: SUPPLIER_ADDRESS.to_owned(),
        },
        product: if even { MIXED_PRODUCT } else { "MANSAND" }.to_owned(),
        pickup: if i % 3 == 0 {
            "HANSON BM"
        } else {
            "Hanson Wollert"
        }
        .to_owned(),
        drop_location: if even { "MIDWAY LAVERTON" } else { "MIDWAY LARA" }.to_owned(),
        total_cents: sample_price_cents(i),
        vehicle: if even { "XW47RQ" } else { "XW77MK" }.to_owned(),
        loads: sample_loads(i),
    }
}

/// Spread over 300.00..9300.00 without a random source.
fn sample_price_cents(i: usize) -> i64 {
    30_000 + (i as i64 * 379_981 + 12_345) % 900_000
}

fn sample_loads(i: usize) -> u32 {
    (i as u32 * 7 + 3) % 25 + 1
}

/// Trips waiting to be billed on the new-invoice screen.
pub fn trips() -> Vec<Trip> {
    vec![
        Trip {
            id: TripId::new(1),
            number: "TRIP-001".to_owned(),
            docket: "DCK-1001".to_owned(),
            material: "Cement".to_owned(),
            net_weight: 12_500,
            unit: WeightUnit::Kg,
            start: datetime!(2025-11-18 08:15),
            end: datetime!(2025-11-18 12:40),
        },
        Trip {
            id: TripId::new(2),
            number: "TRIP-002".to_owned(),
            docket: "DCK-1002".to_owned(),
            material: "Steel Rods".to_owned(),
            net_weight: 8_200,
            unit: WeightUnit::Kg,
            start: datetime!(2025-11-18 09:00),
            end: datetime!(2025-11-18 13:05),
        },
        Trip {
            id: TripId::new(3),
            number: "TRIP-003".to_owned(),
            docket: "DCK-1003".to_owned(),
            material: "Sand".to_owned(),
            net_weight: 15_000,
            unit: WeightUnit::Kg,
            start: datetime!(2025-11-17 22:30),
            end: datetime!(2025-11-18 02:10),
        },
    ]
}

const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

pub fn weekly_activity() -> Vec<DailyActivity> {
    let trips = [30, 42, 36, 52, 44, 28, 18];
    let revenue = [4200, 5200, 4800, 6200, 5800, 3400, 2200];
    WEEKDAYS
        .iter()
        .zip(trips.into_iter().zip(revenue))
        .map(|(day, (trips, revenue))| DailyActivity {
            day: (*day).to_owned(),
            trips,
            revenue_cents: revenue * 100,
        })
        .collect()
}

pub fn weekly_shipments() -> Vec<DailyShipments> {
    let rows = [
        (12, 10, 6),
        (16, 18, 8),
        (14, 12, 10),
        (20, 22, 10),
        (18, 20, 6),
        (10, 12, 6),
        (6, 8, 4),
    ];
    WEEKDAYS
        .iter()
        .zip(rows)
        .map(|(day, (in_transit, delivered, delayed))| DailyShipments {
            day: (*day).to_owned(),
            in_transit,
            delivered,
            delayed,
        })
        .collect()
}

pub fn status_split() -> Vec<StatusShare> {
    [
        (ShipmentStatus::Delivered, 55),
        (ShipmentStatus::InTransit, 25),
        (ShipmentStatus::Delayed, 12),
        (ShipmentStatus::Cancelled, 8),
    ]
    .into_iter()
    .map(|(status, value)| StatusShare { status, value })
    .collect()
}

pub fn top_vehicles() -> Vec<VehicleUsage> {
    [
        ("TR-1001", "Volvo FH16", 124_000, 420, 92),
        ("TR-1002", "Scania R450", 98_000, 390, 88),
        ("TR-1003", "Mahindra Bolero", 72_000, 312, 76),
        ("TR-1004", "Tata Prima", 133_000, 450, 95),
    ]
    .into_iter()
    .map(|(id, model, km, trips, utilization)| VehicleUsage {
        id: id.to_owned(),
        model: model.to_owned(),
        km,
        trips,
        utilization,
    })
    .collect()
}

pub fn pending_invoices() -> Vec<PendingInvoice> {
    vec![
        PendingInvoice {
            id: "INV-1009".to_owned(),
            client: "Cremica Foods".to_owned(),
            amount_cents: 1_200_000,
            due: date!(2025 - 11 - 18),
            status: PaymentStatus::Unpaid,
        },
        PendingInvoice {
            id: "INV-1010".to_owned(),
            client: "Heti Logistics".to_owned(),
            amount_cents: 560_000,
            due: date!(2025 - 11 - 20),
            status: PaymentStatus::Partial,
        },
        PendingInvoice {
            id: "INV-1011".to_owned(),
            client: "BluePharm".to_owned(),
            amount_cents: 2_250_000,
            due: date!(2025 - 11 - 22),
            status: PaymentStatus::Unpaid,
        },
    ]
}

/// Shown when the notification feed is unreachable.
pub fn fallback_notifications() -> Vec<Notification> {
    [
        (1, "New trip created by R. Singh", "2m"),
        (2, "Invoice #1002 paid", "1h"),
        (3, "Vehicle TR-1004 due for service", "3h"),
    ]
    .into_iter()
    .map(|(id, text, time)| Notification {
        id: NotificationId::new(id),
        text: text.to_owned(),
        time: time.to_owned(),
    })
    .collect()
}

pub fn fallback_quick_actions() -> Vec<QuickAction> {
    vec![
        QuickAction {
            id: "view_trips".to_owned(),
            label: "View all trips".to_owned(),
        },
        QuickAction {
            id: "create_trip".to_owned(),
            label: "Create trip".to_owned(),
        },
    ]
}
