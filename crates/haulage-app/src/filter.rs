// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::Invoice;

/// Records whose number, supplier, product, or vehicle contains `query`.
///
/// The query is trimmed and compared case-insensitively as a plain substring.
/// A blank query keeps every record. Surviving records keep their input order.
pub fn filter<'a>(records: &'a [Invoice], query: &str) -> Vec<&'a Invoice> {
    let needle = normalize_query(query);
    if needle.is_empty() {
        return records.iter().collect();
    }

    records
        .iter()
        .filter(|record| matches_query(record, &needle))
        .collect()
}

pub fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}

/// `needle` must already be normalized.
pub fn matches_query(record: &Invoice, needle: &str) -> bool {
    searchable_fields(record)
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
}

fn searchable_fields(record: &Invoice) -> [String; 4] {
    [
        record.number.clone(),
        record.supplier.joined("\n"),
        record.product.clone(),
        record.vehicle.clone(),
    ]
}
