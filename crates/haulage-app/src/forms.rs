// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow, bail};
use std::collections::BTreeMap;
use time::Date;

use crate::{LineItemId, LineItemIds, Trip, TripId};

pub const DEFAULT_TAX_PERCENT: i64 = 18;

/// Static sign-in pair for the demo login. There is no account backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            email: "admin@admin.com".to_owned(),
            password: "12345".to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Per-field messages shown under the login inputs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LoginErrors {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl LoginErrors {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.password.is_none()
    }
}

impl LoginForm {
    /// Field checks only; credentials are not consulted.
    pub fn validate(&self) -> LoginErrors {
        let email = self.email.trim();
        let email_error = if email.is_empty() {
            Some("Please enter your email")
        } else if !looks_like_email(email) {
            Some("Please enter a valid email")
        } else {
            None
        };
        let password_error = self
            .password
            .is_empty()
            .then_some("Please enter your password");

        LoginErrors {
            email: email_error.map(str::to_owned),
            password: password_error.map(str::to_owned),
        }
    }

    /// Validates, then compares against `credentials`. A mismatch is
    /// reported on the password field only.
    pub fn submit(&self, credentials: &Credentials) -> std::result::Result<(), LoginErrors> {
        let errors = self.validate();
        if !errors.is_empty() {
            return Err(errors);
        }
        if self.email == credentials.email && self.password == credentials.password {
            return Ok(());
        }
        Err(LoginErrors {
            email: None,
            password: Some("Invalid credentials. Try again.".to_owned()),
        })
    }
}

/// `local@domain.tld` with no whitespace anywhere.
fn looks_like_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    value
        .char_indices()
        .filter(|(index, ch)| *ch == '@' && *index > 0)
        .any(|(index, _)| {
            let domain = &value[index + 1..];
            domain
                .char_indices()
                .any(|(dot, ch)| ch == '.' && dot > 0 && dot + 1 < domain.len())
        })
}

/// Criteria for pulling billable trips onto a new invoice.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TripFilterForm {
    pub drop_address: String,
    pub driver: String,
    pub vehicle: String,
    pub from_date: Option<Date>,
    pub to_date: Option<Date>,
    pub bill_to: String,
    pub fuel_levy_cents: Option<i64>,
}

impl TripFilterForm {
    pub fn validate(&self) -> Result<()> {
        let required = [
            (&self.drop_address, "drop address"),
            (&self.driver, "driver"),
            (&self.vehicle, "vehicle"),
            (&self.bill_to, "bill-to"),
        ];
        for (value, label) in required {
            if value.trim().is_empty() {
                bail!("{label} is required -- fill it in and retry");
            }
        }
        let (Some(from), Some(to)) = (self.from_date, self.to_date) else {
            bail!("from and to dates are required -- pick both dates and retry");
        };
        if to < from {
            bail!("trip to-date must be on/after from-date");
        }
        match self.fuel_levy_cents {
            None => bail!("fuel levy is required -- enter 0 if none applies"),
            Some(levy) if levy < 0 => bail!("fuel levy cannot be negative"),
            Some(_) => Ok(()),
        }
    }
}

/// Checkbox state for the trip table on the new-invoice screen.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TripSelection {
    order: Vec<TripId>,
    checked: BTreeMap<TripId, bool>,
}

impl TripSelection {
    pub fn new(trips: &[Trip]) -> Self {
        Self {
            order: trips.iter().map(|trip| trip.id).collect(),
            checked: trips.iter().map(|trip| (trip.id, false)).collect(),
        }
    }

    /// Flips one trip. Unknown ids are ignored.
    pub fn toggle_one(&mut self, id: TripId) {
        if let Some(checked) = self.checked.get_mut(&id) {
            *checked = !*checked;
        }
    }

    /// Checks every trip, or clears them all when everything is already
    /// checked.
    pub fn toggle_all(&mut self) {
        let next = !self.all_checked();
        for checked in self.checked.values_mut() {
            *checked = next;
        }
    }

    pub fn is_checked(&self, id: TripId) -> bool {
        self.checked.get(&id).copied().unwrap_or(false)
    }

    pub fn checked_count(&self) -> usize {
        self.checked.values().filter(|checked| **checked).count()
    }

    pub fn all_checked(&self) -> bool {
        !self.checked.is_empty() && self.checked_count() == self.checked.len()
    }

    pub fn can_proceed(&self) -> bool {
        self.checked_count() > 0
    }

    pub fn selected_ids(&self) -> Vec<TripId> {
        self.order
            .iter()
            .copied()
            .filter(|id| self.is_checked(*id))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItem {
    pub id: LineItemId,
    pub description: String,
    pub qty: i64,
    pub rate_cents: i64,
}

impl LineItem {
    fn blank(id: LineItemId) -> Self {
        Self {
            id,
            description: String::new(),
            qty: 1,
            rate_cents: 0,
        }
    }

    pub fn amount_cents(&self) -> i64 {
        self.qty.saturating_mul(self.rate_cents)
    }
}

/// Partial update for one line item; `None` fields are left alone.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LineItemPatch {
    pub description: Option<String>,
    pub qty: Option<i64>,
    pub rate_cents: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceDraft {
    pub customer: String,
    pub invoice_date: Date,
    pub notes: String,
    pub tax_percent: i64,
    items: Vec<LineItem>,
    ids: LineItemIds,
}

impl InvoiceDraft {
    /// A draft dated `today` with one blank line item.
    pub fn new(today: Date) -> Self {
        let mut ids = LineItemIds::default();
        let first = LineItem::blank(ids.issue());
        Self {
            customer: String::new(),
            invoice_date: today,
            notes: String::new(),
            tax_percent: DEFAULT_TAX_PERCENT,
            items: vec![first],
            ids,
        }
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn add_item(&mut self) -> LineItemId {
        let id = self.ids.issue();
        self.items.push(LineItem::blank(id));
        id
    }

    /// Returns false when no item has `id`.
    pub fn update_item(&mut self, id: LineItemId, patch: LineItemPatch) -> bool {
        let Some(item) = self.items.iter_mut().find(|item| item.id == id) else {
            return false;
        };
        if let Some(description) = patch.description {
            item.description = description;
        }
        if let Some(qty) = patch.qty {
            item.qty = qty;
        }
        if let Some(rate_cents) = patch.rate_cents {
            item.rate_cents = rate_cents;
        }
        true
    }

    pub fn remove_item(&mut self, id: LineItemId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        self.items.len() != before
    }

    pub fn subtotal_cents(&self) -> i64 {
        self.items
            .iter()
            .fold(0_i64, |total, item| total.saturating_add(item.amount_cents()))
    }

    /// Tax on the subtotal, rounded half-up to the cent.
    pub fn tax_cents(&self) -> i64 {
        let scaled = self.subtotal_cents().saturating_mul(self.tax_percent);
        scaled.saturating_add(50).div_euclid(100)
    }

    pub fn grand_total_cents(&self) -> i64 {
        self.subtotal_cents().saturating_add(self.tax_cents())
    }

    pub fn validate(&self) -> Result<()> {
        if self.customer.trim().is_empty() {
            bail!("customer is required -- enter a customer name and retry");
        }
        if self.items.is_empty() {
            bail!("invoice needs at least one line item -- add an item and retry");
        }
        if self.tax_percent < 0 {
            bail!("tax percent cannot be negative");
        }
        let mut subtotal = 0_i64;
        for item in &self.items {
            if item.qty < 0 || item.rate_cents < 0 {
                bail!("line item quantities and rates cannot be negative");
            }
            subtotal = item
                .qty
                .checked_mul(item.rate_cents)
                .and_then(|amount| subtotal.checked_add(amount))
                .ok_or_else(|| {
                    anyhow!("invoice total is too large -- lower a quantity or rate and retry")
                })?;
        }
        if subtotal
            .checked_mul(self.tax_percent)
            .and_then(|scaled| scaled.checked_add(50))
            .is_none()
        {
            bail!("invoice total is too large -- lower a quantity or rate and retry");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{
        Credentials, InvoiceDraft, LineItemPatch, LoginForm, TripFilterForm, TripSelection,
        looks_like_email,
    };
    use crate::{LineItemId, TripId, sample};
    use time::macros::date;

    fn login(email: &str, password: &str) -> LoginForm {
        LoginForm {
            email: email.to_owned(),
            password: password.to_owned(),
        }
    }

    #[test]
    fn email_shape() {
        assert!(looks_like_email("admin@admin.com"));
        assert!(looks_like_email("a@b.c"));
        assert!(looks_like_email("@x@y.z"));
        assert!(!looks_like_email("admin@admin"));
        assert!(!looks_like_email("@admin.com"));
        assert!(!looks_like_email("admin@.com"));
        assert!(!looks_like_email("admin@admin."));
        assert!(!looks_like_email("ad min@admin.com"));
    }

    #[test]
    fn empty_login_reports_both_fields() {
        let errors = login("  ", "").validate();
        assert_eq!(errors.email.as_deref(), Some("Please enter your email"));
        assert_eq!(errors.password.as_deref(), Some("Please enter your password"));
    }

    #[test]
    fn malformed_email_is_rejected_before_credentials() {
        let errors = login("admin", "12345")
            .submit(&Credentials::default())
            .expect_err("malformed email should fail");
        assert_eq!(errors.email.as_deref(), Some("Please enter a valid email"));
        assert_eq!(errors.password, None);
    }

    #[test]
    fn wrong_password_flags_password_only() {
        let errors = login("admin@admin.com", "nope")
            .submit(&Credentials::default())
            .expect_err("wrong password should fail");
        assert_eq!(errors.email, None);
        assert_eq!(
            errors.password.as_deref(),
            Some("Invalid credentials. Try again.")
        );
    }

    #[test]
    fn demo_credentials_sign_in() {
        assert!(
            login("admin@admin.com", "12345")
                .submit(&Credentials::default())
                .is_ok()
        );
    }

    #[test]
    fn trip_filter_requires_every_field() {
        let mut form = TripFilterForm {
            drop_address: "MIDWAY LARA".to_owned(),
            driver: "R. Singh".to_owned(),
            vehicle: "XW47RQ".to_owned(),
            from_date: Some(date!(2025 - 11 - 17)),
            to_date: Some(date!(2025 - 11 - 18)),
            bill_to: "Midway Concrete".to_owned(),
            fuel_levy_cents: Some(0),
        };
        assert!(form.validate().is_ok());

        form.to_date = Some(date!(2025 - 11 - 16));
        let error = form.validate().expect_err("reversed dates should fail");
        assert!(error.to_string().contains("on/after"));

        form.to_date = Some(date!(2025 - 11 - 18));
        form.fuel_levy_cents = Some(-1);
        assert!(form.validate().is_err());

        form.fuel_levy_cents = Some(250);
        form.driver.clear();
        let error = form.validate().expect_err("missing driver should fail");
        assert!(error.to_string().contains("driver is required"));
    }

    #[test]
    fn toggle_all_checks_then_clears() {
        let trips = sample::trips();
        let mut selection = TripSelection::new(&trips);
        assert!(!selection.can_proceed());

        selection.toggle_one(TripId::new(2));
        selection.toggle_all();
        assert!(selection.all_checked());
        assert_eq!(selection.checked_count(), 3);

        selection.toggle_all();
        assert_eq!(selection.checked_count(), 0);
    }

    #[test]
    fn selected_ids_follow_trip_order() {
        let trips = sample::trips();
        let mut selection = TripSelection::new(&trips);
        selection.toggle_one(TripId::new(3));
        selection.toggle_one(TripId::new(1));
        selection.toggle_one(TripId::new(99));
        assert_eq!(selection.selected_ids(), vec![TripId::new(1), TripId::new(3)]);
        assert!(selection.can_proceed());
        assert!(!selection.all_checked());
    }

    #[test]
    fn empty_selection_is_never_all_checked() {
        let selection = TripSelection::new(&[]);
        assert!(!selection.all_checked());
    }

    #[test]
    fn draft_totals_apply_tax_half_up() {
        let mut draft = InvoiceDraft::new(date!(2025 - 11 - 16));
        let first = draft.items()[0].id;
        assert!(draft.update_item(
            first,
            LineItemPatch {
                description: Some("Cartage".to_owned()),
                qty: Some(3),
                rate_cents: Some(1_250),
            },
        ));
        let second = draft.add_item();
        draft.update_item(
            second,
            LineItemPatch {
                rate_cents: Some(1),
                ..LineItemPatch::default()
            },
        );

        assert_eq!(draft.subtotal_cents(), 3_751);
        // 3751 * 18 / 100 = 675.18
        assert_eq!(draft.tax_cents(), 675);
        assert_eq!(draft.grand_total_cents(), 4_426);
    }

    #[test]
    fn removed_line_item_ids_are_not_reissued() {
        let mut draft = InvoiceDraft::new(date!(2025 - 11 - 16));
        let second = draft.add_item();
        assert!(draft.remove_item(second));
        assert!(!draft.remove_item(second));
        let third = draft.add_item();
        assert_eq!(third, LineItemId::new(3));
    }

    #[test]
    fn oversized_line_item_saturates_and_fails_validation() {
        let mut draft = InvoiceDraft::new(date!(2025 - 11 - 16));
        draft.customer = "Cremica Foods".to_owned();
        let first = draft.items()[0].id;
        draft.update_item(
            first,
            LineItemPatch {
                qty: Some(999_999_999_999),
                rate_cents: Some(999_999_999),
                ..LineItemPatch::default()
            },
        );

        assert_eq!(draft.subtotal_cents(), i64::MAX);
        assert_eq!(draft.tax_cents(), i64::MAX / 100);
        assert_eq!(draft.grand_total_cents(), i64::MAX);
        let error = draft.validate().expect_err("overflowing total should fail");
        assert!(error.to_string().contains("too large"));
    }

    #[test]
    fn draft_validation() {
        let mut draft = InvoiceDraft::new(date!(2025 - 11 - 16));
        assert!(draft.validate().is_err());

        draft.customer = "Cremica Foods".to_owned();
        assert!(draft.validate().is_ok());

        draft.tax_percent = -1;
        assert!(draft.validate().is_err());
        draft.tax_percent = 18;

        let only = draft.items()[0].id;
        draft.remove_item(only);
        let error = draft.validate().expect_err("no items should fail");
        assert!(error.to_string().contains("at least one line item"));
    }
}
