// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use std::collections::BTreeSet;
use tracing::debug;

use crate::Invoice;

/// Immutable invoice collection for one browsing session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecordStore {
    records: Vec<Invoice>,
}

impl RecordStore {
    pub fn new(records: Vec<Invoice>) -> Result<Self> {
        let mut seen = BTreeSet::new();
        for record in &records {
            if !seen.insert(record.number.as_str()) {
                bail!(
                    "duplicate invoice number {:?} -- invoice numbers must be unique within a store",
                    record.number
                );
            }
            if record.total_cents < 0 {
                bail!(
                    "invoice {} has a negative total price; totals must be non-negative",
                    record.number
                );
            }
        }

        debug!(records = records.len(), "record store loaded");
        Ok(Self { records })
    }

    /// All records in insertion order.
    pub fn records(&self) -> &[Invoice] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
