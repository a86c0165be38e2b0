// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use haulage_app::{Invoice, InvoiceId, Supplier};
use time::{Date, Duration, Month};

const SUPPLIER_NAMES: [&str; 8] = [
    "Midway Concrete (Vic) Pty Ltd",
    "Boral Resources",
    "Holcim Australia",
    "Hanson Construction Materials",
    "Barro Group",
    "Hy-Tec Industries",
    "Alex Fraser Group",
    "Adbri Masonry",
];

const STREETS: [&str; 10] = [
    "Plummer Rd",
    "Boundary Rd",
    "Cooper St",
    "Dohertys Rd",
    "Kororoit Creek Rd",
    "Somerton Rd",
    "Princes Hwy",
    "Foundry Rd",
    "Quarry Rd",
    "Western Ave",
];

const SUBURBS: [&str; 8] = [
    "Laverton North",
    "Epping",
    "Wollert",
    "Lara",
    "Altona",
    "Sunshine West",
    "Derrimut",
    "Campbellfield",
];

const PRODUCTS: [&str; 8] = [
    "MANSAND",
    "Sand, 14ML ROCK, 20ML ROCK, CRUSHED ROCK",
    "20ML ROCK",
    "CRUSHED ROCK",
    "Washed Sand",
    "Class 2 Road Base",
    "Screenings",
    "Recycled Concrete",
];

const SITES: [&str; 8] = [
    "HANSON BM",
    "Hanson Wollert",
    "MIDWAY LAVERTON",
    "MIDWAY LARA",
    "Boral Deer Park",
    "Holcim Lysterfield",
    "Barro Kealba",
    "Hy-Tec Bacchus Marsh",
];

const PLATE_LETTERS: &[u8] = b"ABCDEFGHJKLMNPRSTUVWXYZ";

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }

    fn bool(&mut self) -> bool {
        (self.next_u64() & 1) == 1
    }
}

/// Seeded generator of plausible haulage records for property tests.
#[derive(Debug, Clone)]
pub struct FleetFaker {
    rng: DeterministicRng,
    next_number: u64,
}

impl FleetFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            next_number: 1,
        }
    }

    pub fn int_n(&mut self, n: usize) -> usize {
        self.rng.int_n(n)
    }

    /// One invoice with a number no earlier call has produced.
    pub fn invoice(&mut self) -> Invoice {
        let serial = self.next_number;
        self.next_number += 1;

        let suburb = self.pick(&SUBURBS);
        let address = format!(
            "{}-{} {}, {suburb}, Vic 30{:02}",
            1 + self.rng.int_n(40),
            41 + self.rng.int_n(40),
            self.pick(&STREETS),
            self.rng.int_n(100),
        );

        Invoice {
            id: InvoiceId::new(serial as i64),
            number: format!("INV{}{:05}", self.int_range(202401, 202512), serial),
            date: self.date_in_year(2025),
            supplier: Supplier {
                name: self.pick(&SUPPLIER_NAMES).to_owned(),
                address,
            },
            product: self.pick(&PRODUCTS).to_owned(),
            pickup: self.pick(&SITES).to_owned(),
            drop_location: self.pick(&SITES).to_owned(),
            total_cents: self.int_range(0, 2_000_000) as i64,
            vehicle: self.plate(),
            loads: self.int_range(0, 30) as u32,
        }
    }

    pub fn invoices(&mut self, count: usize) -> Vec<Invoice> {
        (0..count).map(|_| self.invoice()).collect()
    }

    /// A query likely to hit: a slice of some searchable field of a random
    /// record, with randomized case. Falls back to free text for empty
    /// collections or on a coin flip.
    pub fn query_for(&mut self, records: &[Invoice]) -> String {
        if records.is_empty() || self.rng.int_n(4) == 0 {
            return self.pick(&PRODUCTS).to_owned();
        }
        let record = &records[self.rng.int_n(records.len())];
        let field = match self.rng.int_n(6) {
            0 => record.number.clone(),
            1 => record.supplier.name.clone(),
            2 => record.supplier.address.clone(),
            3 => record.product.clone(),
            4 => record.vehicle.clone(),
            _ => record.pickup.clone(),
        };
        let chars: Vec<char> = field.chars().collect();
        if chars.is_empty() {
            return String::new();
        }
        let start = self.rng.int_n(chars.len());
        let len = 1 + self.rng.int_n((chars.len() - start).min(6));
        chars[start..start + len]
            .iter()
            .map(|ch| {
                if self.rng.bool() {
                    ch.to_ascii_uppercase()
                } else {
                    ch.to_ascii_lowercase()
                }
            })
            .collect()
    }

    pub fn date_in_year(&mut self, year: i32) -> Date {
        let start = Date::from_calendar_date(year, Month::January, 1).expect("valid year start");
        start + Duration::days(self.rng.int_n(365) as i64)
    }

    fn plate(&mut self) -> String {
        let mut plate = String::with_capacity(6);
        for position in 0..6 {
            if position == 2 || position == 3 {
                plate.push(char::from(b'0' + self.rng.int_n(10) as u8));
            } else {
                plate.push(char::from(PLATE_LETTERS[self.rng.int_n(PLATE_LETTERS.len())]));
            }
        }
        plate
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.int_n(items.len())]
    }

    fn int_range(&mut self, min: u64, max: u64) -> u64 {
        if max <= min {
            return min;
        }
        min + self.rng.next_u64() % (max - min + 1)
    }
}
