use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::booking::BookingError;

/// A catalog add-on as listed at selection time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Addon {
    pub id: String,
    pub name: String,
    pub unit_price: Decimal,
    pub category: String,
}

/// What the client asks for: an add-on id and a quantity. Prices submitted
/// alongside are never read.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AddonSelection {
    #[serde(alias = "addon_id")]
    pub addon_id: String,
    pub quantity: i64,
}

/// An add-on frozen into a booking with the unit price it had when selected.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SelectedAddon {
    pub addon_id: String,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

impl SelectedAddon {
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PriceBreakdown {
    pub base_price: Decimal,
    pub addon_total_price: Decimal,
    pub total_price: Decimal,
}

/// Largest amount the ledger stores: `numeric(12, 2)`.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);

/// Checks that an amount fits the ledger: at most two decimal places and no
/// larger than [`MAX_AMOUNT`] either way.
///
/// # Errors
///
/// [`BookingError::Validation`] naming `what`.
pub fn validate_amount(amount: Decimal, what: &str) -> Result<(), BookingError> {
    if amount.normalize().scale() > 2 {
        return Err(BookingError::Validation(format!(
            "{what} has more than two decimal places"
        )));
    }
    if amount.abs() > MAX_AMOUNT {
        return Err(BookingError::Validation(format!("{what} is out of range")));
    }
    Ok(())
}

#[must_use]
pub fn addon_total(addons: &[SelectedAddon]) -> Decimal {
    addons.iter().map(SelectedAddon::line_total).sum()
}

/// `total = base + Σ quantity × unit price`. Pure; the base price must come
/// from the stored booking, never from the request.
#[must_use]
pub fn compute_total(base_price: Decimal, addons: &[SelectedAddon]) -> PriceBreakdown {
    let addon_total_price = addon_total(addons);
    PriceBreakdown {
        base_price,
        addon_total_price,
        total_price: base_price + addon_total_price,
    }
}

/// Resolves client selections against the catalog and freezes their prices.
///
/// Zero quantities are dropped, repeated ids are merged, and the result keeps
/// the order in which ids first appeared.
///
/// # Errors
///
/// [`BookingError::Validation`] for negative quantities and
/// [`BookingError::NotFound`] for ids the catalog does not list.
pub fn freeze_selection(
    selections: &[AddonSelection],
    catalog: &[Addon],
) -> Result<Vec<SelectedAddon>, BookingError> {
    let mut frozen: Vec<SelectedAddon> = Vec::new();
    for selection in selections {
        if selection.quantity < 0 {
            return Err(BookingError::Validation(format!(
                "add-on `{}` has a negative quantity",
                selection.addon_id
            )));
        }
        let quantity = u32::try_from(selection.quantity).map_err(|_| {
            BookingError::Validation(format!(
                "add-on `{}` quantity is too large",
                selection.addon_id
            ))
        })?;
        let addon = catalog
            .iter()
            .find(|a| a.id == selection.addon_id)
            .ok_or_else(|| BookingError::NotFound(format!("add-on `{}`", selection.addon_id)))?;

        if let Some(existing) = frozen.iter_mut().find(|s| s.addon_id == addon.id) {
            existing.quantity = existing.quantity.saturating_add(quantity);
        } else {
            frozen.push(SelectedAddon {
                addon_id: addon.id.clone(),
                name: addon.name.clone(),
                quantity,
                unit_price: addon.unit_price,
            });
        }
    }
    frozen.retain(|s| s.quantity > 0);
    Ok(frozen)
}
