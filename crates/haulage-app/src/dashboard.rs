// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{
    DailyActivity, DailyShipments, PendingInvoice, StatusShare, VehicleUsage, format_cents,
    sample,
};

const AVG_DELIVERY_MINUTES: u32 = 28;
const TOP_DRIVER: &str = "R. Singh";
const TOP_DRIVER_TRIPS: u32 = 142;
const FUEL_EFFICIENCY_KM_PER_L: &str = "5.6";

/// Everything the overview screen shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardData {
    pub activity: Vec<DailyActivity>,
    pub shipments: Vec<DailyShipments>,
    pub status_split: Vec<StatusShare>,
    pub vehicles: Vec<VehicleUsage>,
    pub pending: Vec<PendingInvoice>,
}

impl DashboardData {
    pub fn sample() -> Self {
        Self {
            activity: sample::weekly_activity(),
            shipments: sample::weekly_shipments(),
            status_split: sample::status_split(),
            vehicles: sample::top_vehicles(),
            pending: sample::pending_invoices(),
        }
    }

    pub fn total_revenue_cents(&self) -> i64 {
        self.activity.iter().map(|day| day.revenue_cents).sum()
    }

    pub fn total_trips(&self) -> u32 {
        self.activity.iter().map(|day| day.trips).sum()
    }

    /// Mean vehicle utilization rounded to a whole percent; 0 with no fleet.
    pub fn fleet_utilization(&self) -> u32 {
        if self.vehicles.is_empty() {
            return 0;
        }
        let sum: u32 = self.vehicles.iter().map(|vehicle| vehicle.utilization).sum();
        let len = self.vehicles.len() as u32;
        (sum * 2 + len) / (len * 2)
    }

    pub fn pending_total_cents(&self) -> i64 {
        self.pending.iter().map(|invoice| invoice.amount_cents).sum()
    }

    /// Each status as a share of the split total, in whole percent.
    pub fn status_percentages(&self) -> Vec<(String, u32)> {
        let total: u32 = self.status_split.iter().map(|share| share.value).sum();
        self.status_split
            .iter()
            .map(|share| {
                let pct = if total == 0 {
                    0
                } else {
                    (share.value * 100 + total / 2) / total
                };
                (share.status.label().to_owned(), pct)
            })
            .collect()
    }

    pub fn busiest_shipment_day(&self) -> Option<&DailyShipments> {
        self.shipments.iter().max_by_key(|day| day.total())
    }

    pub fn kpis(&self) -> Vec<Kpi> {
        vec![
            Kpi::new(
                "Active Trips",
                self.total_trips().to_string(),
                "+6%",
                "Last 7 days",
            ),
            Kpi::new(
                "Revenue (7d)",
                format_cents(self.total_revenue_cents()),
                "+12%",
                "Estimated",
            ),
            Kpi::new(
                "Avg Delivery (mins)",
                format!("{AVG_DELIVERY_MINUTES}m"),
                "-2%",
                "Lower is better",
            ),
            Kpi::new(
                "Fleet Utilization",
                format!("{}%", self.fleet_utilization()),
                "+3%",
                "Avg across fleet",
            ),
            Kpi::new(
                "Top Driver",
                TOP_DRIVER.to_owned(),
                "+15 Trips",
                format!("{TOP_DRIVER_TRIPS} Trips"),
            ),
            Kpi::new(
                "Fuel Efficiency",
                format!("{FUEL_EFFICIENCY_KM_PER_L} km/L"),
                "+0.4",
                "Fleet average",
            ),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Kpi {
    pub title: &'static str,
    pub value: String,
    pub diff: &'static str,
    pub sub: String,
}

impl Kpi {
    fn new(title: &'static str, value: String, diff: &'static str, sub: impl Into<String>) -> Self {
        Self {
            title,
            value,
            diff,
            sub: sub.into(),
        }
    }

    /// Improvement reads as a leading `+`.
    pub fn is_positive(&self) -> bool {
        self.diff.starts_with('+')
    }
}
