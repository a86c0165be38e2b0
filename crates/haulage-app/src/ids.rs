// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};

macro_rules! entity_id {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub struct $name(i64);

        impl $name {
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }
    };
}

entity_id!(InvoiceId);
entity_id!(TripId);
entity_id!(LineItemId);
entity_id!(NotificationId);

/// Hands out line-item ids for a single invoice draft.
///
/// Ids are strictly increasing and never reused, even after the item they
/// were issued for is removed from the draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItemIds {
    next: i64,
}

impl Default for LineItemIds {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl LineItemIds {
    pub fn issue(&mut self) -> LineItemId {
        let id = LineItemId::new(self.next);
        self.next += 1;
        id
    }
}
