// tests/cart_lifecycle_tests.rs
mod common;

use bazaar::{pricing, BazaarError, OrderStatus, OrderView, ProductStatus};
use common::*;
use rust_decimal::Decimal;
use serial_test::serial;

fn assert_total_matches_items(view: &OrderView) {
  let expected: Decimal = view.items.iter().map(|i| i.unit_price * Decimal::from(i.quantity)).sum();
  assert_eq!(view.total_price, expected, "total must equal the sum of item subtotals");
}

#[tokio::test]
#[serial]
async fn first_add_creates_cart_and_sets_total() {
  setup_tracing();
  let h = harness();
  let user = user();

  let view = h.controller.add_item(user, P1, 2).await.unwrap();

  assert_eq!(view.status, OrderStatus::Cart);
  assert_eq!(view.item_count(), 1);
  assert_eq!(view.items[0].quantity, 2);
  assert_eq!(view.items[0].product_name, "Walnut desk lamp");
  assert_eq!(view.total_price, dec("300.00"));
  assert_eq!(h.store.cart_count(user), 1);
}

#[tokio::test]
#[serial]
async fn re_adding_merges_and_keeps_price_snapshot() {
  setup_tracing();
  let h = harness();
  let user = user();
  h.controller.add_item(user, P1, 2).await.unwrap();

  h.catalog.set_price(P1, dec("999.00"));
  let view = h.controller.add_item(user, P1, 3).await.unwrap();

  assert_eq!(view.item_count(), 1, "same product must merge into one line item");
  assert_eq!(view.items[0].quantity, 5);
  assert_eq!(view.items[0].unit_price, dec("150.00"));
  assert_eq!(view.total_price, dec("750.00"));
}

#[tokio::test]
#[serial]
async fn zero_quantity_removes_item() {
  setup_tracing();
  let h = harness();
  let user = user();
  let view = h.controller.add_item(user, P1, 2).await.unwrap();
  let item_id = view.items[0].id;

  let view = h.controller.update_item_quantity(user, item_id, 0).await.unwrap();

  assert!(view.items.is_empty());
  assert_eq!(view.total_price, Decimal::ZERO);
  assert_eq!(h.store.line_item_count(), 0);
}

#[tokio::test]
#[serial]
async fn remove_item_matches_setting_quantity_to_zero() {
  setup_tracing();
  let h = harness();
  let user = user();
  h.controller.add_item(user, P1, 1).await.unwrap();
  let view = h.controller.add_item(user, P2, 3).await.unwrap();
  let tote = view.items.iter().find(|i| i.product_id == P2).unwrap().id;

  let view = h.controller.remove_item(user, tote).await.unwrap();

  assert_eq!(view.item_count(), 1);
  assert_eq!(view.items[0].product_id, P1);
  assert_eq!(view.total_price, dec("150.00"));
}

#[tokio::test]
#[serial]
async fn positive_quantity_overwrites_without_touching_price() {
  setup_tracing();
  let h = harness();
  let user = user();
  let view = h.controller.add_item(user, P2, 1).await.unwrap();
  h.catalog.set_price(P2, dec("1.00"));

  let view = h.controller.update_item_quantity(user, view.items[0].id, 4).await.unwrap();

  assert_eq!(view.items[0].quantity, 4);
  assert_eq!(view.items[0].unit_price, dec("19.99"));
  assert_eq!(view.total_price, dec("79.96"));
}

#[tokio::test]
#[serial]
async fn checkout_of_empty_cart_is_rejected_and_creates_nothing() {
  setup_tracing();
  let h = harness();
  let user = user();

  let err = h.controller.checkout(user, "1 Main St").await.unwrap_err();
  assert!(matches!(err, BazaarError::InvalidState(_)), "got {:?}", err);
  assert_eq!(h.store.order_count(), 0);

  // An existing but emptied cart is rejected the same way.
  let view = h.controller.add_item(user, P1, 1).await.unwrap();
  h.controller.remove_item(user, view.items[0].id).await.unwrap();
  let err = h.controller.checkout(user, "1 Main St").await.unwrap_err();
  assert!(matches!(err, BazaarError::InvalidState(_)));
  assert!(h.controller.list_orders(user).await.unwrap().is_empty());
}

#[tokio::test]
#[serial]
async fn checkout_places_order_and_provisions_fresh_cart() {
  setup_tracing();
  let h = harness();
  let user = user();
  let cart = h.controller.add_item(user, P1, 2).await.unwrap();

  let order = h.controller.checkout(user, "1 Main St").await.unwrap();

  assert_eq!(order.id, cart.id, "the cart row itself becomes the order");
  assert_eq!(order.status, OrderStatus::Pending);
  assert_eq!(order.delivery_address.as_deref(), Some("1 Main St"));
  assert_eq!(order.total_price, dec("300.00"));
  assert_eq!(order.item_count(), 1);

  let next = h.controller.get_cart(user).await.unwrap();
  assert_ne!(next.id, order.id);
  assert_eq!(next.status, OrderStatus::Cart);
  assert!(next.items.is_empty());
  assert_eq!(next.total_price, Decimal::ZERO);
  assert_eq!(h.store.cart_count(user), 1);
}

#[tokio::test]
#[serial]
async fn unknown_product_is_not_found_and_writes_nothing() {
  setup_tracing();
  let h = harness();
  let user = user();
  h.controller.add_item(user, P1, 2).await.unwrap();

  let err = h.controller.add_item(user, UNKNOWN_PRODUCT, 1).await.unwrap_err();

  assert!(matches!(err, BazaarError::NotFound { entity: "Product", .. }), "got {:?}", err);
  let cart = h.controller.get_cart(user).await.unwrap();
  assert_eq!(cart.item_count(), 1);
  assert_eq!(cart.total_price, dec("300.00"));
}

#[tokio::test]
#[serial]
async fn non_positive_quantity_is_rejected_before_any_lookup() {
  setup_tracing();
  let h = harness();

  for quantity in [0, -3] {
    let err = h.controller.add_item(user(), P1, quantity).await.unwrap_err();
    assert!(matches!(err, BazaarError::InvalidState(_)));
  }
  assert_eq!(h.catalog.call_count(), 0);
  assert_eq!(h.store.order_count(), 0);
}

#[tokio::test]
#[serial]
async fn inactive_product_cannot_be_added() {
  setup_tracing();
  let h = harness();
  let user = user();
  h.catalog.set_status(P2, ProductStatus::Other("BLOCKED".to_string()));

  let err = h.controller.add_item(user, P2, 1).await.unwrap_err();

  assert!(matches!(err, BazaarError::InvalidState(_)));
  assert_eq!(h.store.line_item_count(), 0);
}

#[tokio::test]
#[serial]
async fn product_withdrawn_after_adding_does_not_invalidate_cart() {
  setup_tracing();
  let h = harness();
  let user = user();
  h.controller.add_item(user, P1, 1).await.unwrap();
  h.controller.add_item(user, P2, 1).await.unwrap();

  h.catalog.remove(P1);
  h.catalog.set_status(P2, ProductStatus::Other("ARCHIVED".to_string()));

  let cart = h.controller.get_cart(user).await.unwrap();
  assert_eq!(cart.item_count(), 2);
  let order = h.controller.checkout(user, "9 Elm Rd").await.unwrap();
  assert_eq!(order.total_price, dec("169.99"));
}

#[tokio::test]
#[serial]
async fn re_adding_a_removed_product_takes_a_fresh_snapshot() {
  setup_tracing();
  let h = harness();
  let user = user();
  let view = h.controller.add_item(user, P1, 1).await.unwrap();
  h.controller.remove_item(user, view.items[0].id).await.unwrap();

  h.catalog.set_price(P1, dec("120.00"));
  let view = h.controller.add_item(user, P1, 1).await.unwrap();

  assert_eq!(view.items[0].unit_price, dec("120.00"));
  assert_eq!(view.total_price, dec("120.00"));
}

#[tokio::test]
#[serial]
async fn items_of_another_users_cart_are_not_found() {
  setup_tracing();
  let h = harness();
  let (alice, bob) = (user(), user());
  let alice_cart = h.controller.add_item(alice, P1, 1).await.unwrap();
  h.controller.add_item(bob, P2, 1).await.unwrap();
  let alice_item = alice_cart.items[0].id;

  let err = h.controller.update_item_quantity(bob, alice_item, 5).await.unwrap_err();
  assert!(matches!(err, BazaarError::NotFound { .. }));

  // A user without any cart gets the same answer.
  let err = h.controller.remove_item(user(), alice_item).await.unwrap_err();
  assert!(matches!(err, BazaarError::NotFound { .. }));

  let alice_cart = h.controller.get_cart(alice).await.unwrap();
  assert_eq!(alice_cart.items[0].quantity, 1);
}

#[tokio::test]
#[serial]
async fn items_of_placed_orders_can_no_longer_change() {
  setup_tracing();
  let h = harness();
  let user = user();
  let cart = h.controller.add_item(user, P1, 1).await.unwrap();
  h.controller.checkout(user, "1 Main St").await.unwrap();

  let err = h.controller.update_item_quantity(user, cart.items[0].id, 3).await.unwrap_err();
  assert!(matches!(err, BazaarError::NotFound { .. }));
}

#[tokio::test]
#[serial]
async fn clear_cart_is_idempotent() {
  setup_tracing();
  let h = harness();
  let user = user();

  // Never-created cart.
  h.controller.clear_cart(user).await.unwrap();

  h.controller.add_item(user, P1, 2).await.unwrap();
  h.controller.add_item(user, P2, 1).await.unwrap();
  h.controller.clear_cart(user).await.unwrap();
  let first = h.controller.get_cart(user).await.unwrap();
  h.controller.clear_cart(user).await.unwrap();
  let second = h.controller.get_cart(user).await.unwrap();

  assert!(first.items.is_empty());
  assert_eq!(first.total_price, Decimal::ZERO);
  assert_eq!(first.id, second.id);
  assert_eq!(first.items, second.items);
  assert_eq!(first.total_price, second.total_price);
}

#[tokio::test]
#[serial]
async fn total_tracks_items_through_a_long_sequence() {
  setup_tracing();
  let h = harness();
  let user = user();

  let mut view = h.controller.add_item(user, P3, 3).await.unwrap();
  assert_total_matches_items(&view);
  view = h.controller.add_item(user, P2, 2).await.unwrap();
  assert_total_matches_items(&view);
  view = h.controller.add_item(user, P3, 4).await.unwrap();
  assert_total_matches_items(&view);

  let candle = view.items.iter().find(|i| i.product_id == P3).unwrap().id;
  view = h.controller.update_item_quantity(user, candle, 10).await.unwrap();
  assert_total_matches_items(&view);
  assert_eq!(view.total_price, dec("43.31"));

  view = h.controller.add_item(user, P1, 1).await.unwrap();
  assert_total_matches_items(&view);
  let tote = view.items.iter().find(|i| i.product_id == P2).unwrap().id;
  view = h.controller.remove_item(user, tote).await.unwrap();
  assert_total_matches_items(&view);
  assert_eq!(view.total_price, dec("153.33"));
  assert_eq!(pricing::display_amount(view.total_price), dec("153.33"));
}

#[tokio::test]
#[serial]
async fn placed_orders_are_listed_newest_first_and_scoped_to_owner() {
  setup_tracing();
  let h = harness();
  let (alice, bob) = (user(), user());

  h.controller.add_item(alice, P1, 1).await.unwrap();
  let first = h.controller.checkout(alice, "1 Main St").await.unwrap();
  tokio::time::sleep(std::time::Duration::from_millis(5)).await;
  h.controller.add_item(alice, P2, 1).await.unwrap();
  let second = h.controller.checkout(alice, "2 Main St").await.unwrap();

  let orders = h.controller.list_orders(alice).await.unwrap();
  let ids: Vec<_> = orders.iter().map(|o| o.id).collect();
  assert_eq!(ids, vec![second.id, first.id]);
  assert!(h.controller.list_orders(bob).await.unwrap().is_empty());

  let fetched = h.controller.get_order(alice, first.id).await.unwrap();
  assert_eq!(fetched.total_price, dec("150.00"));
  let err = h.controller.get_order(bob, first.id).await.unwrap_err();
  assert!(matches!(err, BazaarError::NotFound { entity: "Order", .. }));
}

#[tokio::test]
#[serial]
async fn placed_orders_follow_the_status_machine() {
  setup_tracing();
  let h = harness();
  let user = user();
  h.controller.add_item(user, P1, 1).await.unwrap();
  let order = h.controller.checkout(user, "1 Main St").await.unwrap();

  let err = h.controller.transition_order(order.id, OrderStatus::Delivered).await.unwrap_err();
  assert!(matches!(err, BazaarError::InvalidState(_)));

  for next in [OrderStatus::Processing, OrderStatus::Shipped, OrderStatus::Delivered] {
    let view = h.controller.transition_order(order.id, next).await.unwrap();
    assert_eq!(view.status, next);
  }

  let err = h.controller.transition_order(order.id, OrderStatus::Canceled).await.unwrap_err();
  assert!(matches!(err, BazaarError::InvalidState(_)));
}

#[tokio::test]
#[serial]
async fn carts_cannot_be_moved_by_status_transitions() {
  setup_tracing();
  let h = harness();
  let user = user();
  let cart = h.controller.get_cart(user).await.unwrap();

  for target in [OrderStatus::Pending, OrderStatus::Canceled] {
    let err = h.controller.transition_order(cart.id, target).await.unwrap_err();
    assert!(matches!(err, BazaarError::InvalidState(_)));
  }

  h.controller.add_item(user, P1, 1).await.unwrap();
  let order = h.controller.checkout(user, "1 Main St").await.unwrap();
  let err = h.controller.transition_order(order.id, OrderStatus::Cart).await.unwrap_err();
  assert!(matches!(err, BazaarError::InvalidState(_)));

  let canceled = h.controller.transition_order(order.id, OrderStatus::Canceled).await.unwrap();
  assert_eq!(canceled.status, OrderStatus::Canceled);

  let err = h.controller.transition_order(uuid::Uuid::new_v4(), OrderStatus::Processing).await.unwrap_err();
  assert!(matches!(err, BazaarError::NotFound { entity: "Order", .. }));
}

#[tokio::test]
#[serial]
async fn overflowing_totals_are_rejected_before_any_write() {
  setup_tracing();
  let h = harness();
  let user = user();
  let huge = dec("50000000000000000000000000000");
  h.catalog.insert(7, "Bulk order of everything", huge);
  h.catalog.insert(8, "Second bulk order", huge);

  let err = h.controller.add_item(user, 7, 2).await.unwrap_err();
  assert!(matches!(err, BazaarError::InvalidState(_)), "got {:?}", err);
  assert_eq!(h.store.line_item_count(), 0);

  // Each item fits on its own but the sum does not.
  h.controller.add_item(user, 7, 1).await.unwrap();
  let err = h.controller.add_item(user, 8, 1).await.unwrap_err();
  assert!(matches!(err, BazaarError::InvalidState(_)), "got {:?}", err);

  let cart = h.controller.get_cart(user).await.unwrap();
  assert_eq!(cart.item_count(), 1);
  assert_eq!(cart.total_price, huge);
  assert_total_matches_items(&cart);
}

#[tokio::test]
#[serial]
async fn negative_price_snapshots_are_rejected() {
  setup_tracing();
  let h = harness();
  let user = user();
  h.catalog.insert(9, "Refund voucher", dec("-5.00"));

  let err = h.controller.add_item(user, 9, 1).await.unwrap_err();

  assert!(matches!(err, BazaarError::InvalidState(_)), "got {:?}", err);
  assert_eq!(h.store.line_item_count(), 0);
  let cart = h.controller.get_cart(user).await.unwrap();
  assert_eq!(cart.total_price, Decimal::ZERO);
}

#[tokio::test]
#[serial]
async fn only_the_owner_can_cancel_their_order() {
  setup_tracing();
  let h = harness();
  let (alice, mallory) = (user(), user());
  h.controller.add_item(alice, P1, 1).await.unwrap();
  let order = h.controller.checkout(alice, "1 Main St").await.unwrap();

  let err = h.controller.cancel_order(mallory, order.id).await.unwrap_err();
  assert!(matches!(err, BazaarError::NotFound { entity: "Order", .. }), "got {:?}", err);
  let untouched = h.controller.get_order(alice, order.id).await.unwrap();
  assert_eq!(untouched.status, OrderStatus::Pending);

  let canceled = h.controller.cancel_order(alice, order.id).await.unwrap();
  assert_eq!(canceled.status, OrderStatus::Canceled);

  // Canceling twice is an invalid move, not a silent success.
  let err = h.controller.cancel_order(alice, order.id).await.unwrap_err();
  assert!(matches!(err, BazaarError::InvalidState(_)));
}
