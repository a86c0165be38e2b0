// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use time::{Date, PrimitiveDateTime};

use crate::ids::*;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supplier {
    pub name: String,
    pub address: String,
}

impl Supplier {
    /// Both lines separated by `separator`.
    pub fn joined(&self, separator: &str) -> String {
        format!("{}{separator}{}", self.name, self.address)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub number: String,
    pub date: Date,
    pub supplier: Supplier,
    pub product: String,
    pub pickup: String,
    pub drop_location: String,
    pub total_cents: i64,
    pub vehicle: String,
    pub loads: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScreenKind {
    Login,
    Dashboard,
    InvoiceList,
    InvoiceNew,
}

impl ScreenKind {
    pub const ALL: [Self; 4] = [
        Self::Login,
        Self::Dashboard,
        Self::InvoiceList,
        Self::InvoiceNew,
    ];

    pub const fn route(self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::Dashboard => "/dashboard",
            Self::InvoiceList => "/invoice/list",
            Self::InvoiceNew => "/invoice/new",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Dashboard => "dashboard",
            Self::InvoiceList => "invoices",
            Self::InvoiceNew => "new invoice",
        }
    }

    pub fn from_route(route: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|screen| screen.route() == route)
    }

    pub fn shows_chrome(self) -> bool {
        !crate::nav::hides_chrome(self.route())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeightUnit {
    Kg,
    Tonne,
}

impl WeightUnit {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Kg => "kg",
            Self::Tonne => "t",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trip {
    pub id: TripId,
    pub number: String,
    pub docket: String,
    pub material: String,
    pub net_weight: i64,
    pub unit: WeightUnit,
    pub start: PrimitiveDateTime,
    pub end: PrimitiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub text: String,
    pub time: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickAction {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuickActionOutcome {
    /// The backend accepted the action.
    Completed,
    /// The backend was unavailable; a fixed delay stood in for it.
    Simulated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyActivity {
    pub day: String,
    pub trips: u32,
    pub revenue_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyShipments {
    pub day: String,
    pub in_transit: u32,
    pub delivered: u32,
    pub delayed: u32,
}

impl DailyShipments {
    pub fn total(&self) -> u32 {
        self.in_transit + self.delivered + self.delayed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShipmentStatus {
    Delivered,
    InTransit,
    Delayed,
    Cancelled,
}

impl ShipmentStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Delivered => "Delivered",
            Self::InTransit => "In Transit",
            Self::Delayed => "Delayed",
            Self::Cancelled => "Cancelled",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusShare {
    pub status: ShipmentStatus,
    pub value: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleUsage {
    pub id: String,
    pub model: String,
    pub km: u32,
    pub trips: u32,
    pub utilization: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    Unpaid,
    Partial,
    Paid,
}

impl PaymentStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unpaid => "Unpaid",
            Self::Partial => "Partial",
            Self::Paid => "Paid",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingInvoice {
    pub id: String,
    pub client: String,
    pub amount_cents: i64,
    pub due: Date,
    pub status: PaymentStatus,
}

/// Two-decimal rendering of a cent amount, without a currency symbol.
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let absolute = cents.unsigned_abs();
    format!("{sign}{}.{:02}", absolute / 100, absolute % 100)
}
