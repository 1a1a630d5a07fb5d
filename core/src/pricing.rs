// bazaar/src/pricing.rs

//! Price recalculation. Totals are derived only from the price snapshots stored on
//! line items; nothing here talks to the product service.

use rust_decimal::Decimal;

use crate::error::{BazaarError, BazaarResult};
use crate::model::LineItem;

/// Σ(unit_price × quantity) over `items`.
///
/// Exact decimal arithmetic: recomputing the same items any number of times yields
/// the same total, with no rounding applied. A subtotal or total that does not fit
/// a `Decimal` is an `InvalidState`.
pub fn recompute<'a, I>(items: I) -> BazaarResult<Decimal>
where
  I: IntoIterator<Item = &'a LineItem>,
{
  items.into_iter().try_fold(Decimal::ZERO, |total, item| {
    item
      .subtotal()
      .and_then(|subtotal| total.checked_add(subtotal))
      .ok_or_else(|| {
        BazaarError::InvalidState(format!(
          "Order total overflows at product {} ({} × {})",
          item.product_id, item.unit_price, item.quantity
        ))
      })
  })
}

/// Rounds a total for display (2 dp, banker's rounding as rust_decimal does by default).
pub fn display_amount(total: Decimal) -> Decimal {
  total.round_dp(2)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::{ProductSnapshot, ProductStatus};
  use uuid::Uuid;

  fn item(price: &str, quantity: i32) -> LineItem {
    let snapshot = ProductSnapshot {
      id: 1,
      unit_price: price.parse().unwrap(),
      display_name: "Widget".to_string(),
      availability: ProductStatus::Active,
    };
    LineItem::from_snapshot(Uuid::new_v4(), &snapshot, quantity)
  }

  fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
  }

  #[test]
  fn empty_order_totals_zero() {
    assert_eq!(recompute(&Vec::<LineItem>::new()).unwrap(), Decimal::ZERO);
  }

  #[test]
  fn sums_price_times_quantity() {
    let items = vec![item("150.00", 2), item("0.99", 3)];
    assert_eq!(recompute(&items).unwrap(), dec("302.97"));
  }

  #[test]
  fn repeated_recomputation_does_not_drift() {
    let items = vec![item("0.10", 1), item("0.20", 1), item("19.99", 7)];
    let first = recompute(&items).unwrap();
    for _ in 0..1_000 {
      assert_eq!(recompute(&items).unwrap(), first);
    }
    assert_eq!(first, dec("140.23"));
  }

  #[test]
  fn sub_cent_prices_are_kept_exact() {
    let items = vec![item("0.333", 3)];
    assert_eq!(recompute(&items).unwrap(), dec("0.999"));
    assert_eq!(display_amount(recompute(&items).unwrap()), dec("1.00"));
  }

  #[test]
  fn overflowing_subtotal_is_rejected() {
    let items = vec![item("50000000000000000000000000000", 2)];
    assert!(items[0].subtotal().is_none());
    assert!(matches!(recompute(&items), Err(BazaarError::InvalidState(_))));
  }

  #[test]
  fn overflowing_sum_is_rejected() {
    let items = vec![
      item("50000000000000000000000000000", 1),
      item("50000000000000000000000000000", 1),
    ];
    assert!(matches!(recompute(&items), Err(BazaarError::InvalidState(_))));
  }
}
