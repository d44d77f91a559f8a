use std::collections::HashSet;

use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::cart::{decrement_quantity, CartLine, CartSnapshot, DiscountPercent};
use crate::domain::catalog::CategoryRef;
use crate::domain::errors::{DomainError, Resource};
use crate::domain::ports::CartRepository;
use crate::schema::{cart_items, carts, categories, favorites, products};

use super::models::{CartItemRow, CartRow, CategoryRow, NewCartItemRow, NewCartRow, ProductRow};
use super::DieselRepository;

fn find_cart(conn: &mut PgConnection, user_id: Uuid) -> QueryResult<Option<CartRow>> {
    carts::table
        .filter(carts::user_id.eq(user_id))
        .select(CartRow::as_select())
        .first(conn)
        .optional()
}

/// Row-locks the user's cart for the rest of the transaction. Every cart
/// mutation and checkout goes through here first, so they serialize per user.
pub(super) fn lock_cart(conn: &mut PgConnection, user_id: Uuid) -> QueryResult<Option<CartRow>> {
    carts::table
        .filter(carts::user_id.eq(user_id))
        .select(CartRow::as_select())
        .for_update()
        .first(conn)
        .optional()
}

/// Insert-or-fetch on the unique `user_id`, so two first requests racing for
/// the same user end up with the same cart. The returned cart is locked.
fn get_or_create_cart(conn: &mut PgConnection, user_id: Uuid) -> QueryResult<CartRow> {
    diesel::insert_into(carts::table)
        .values(&NewCartRow {
            id: Uuid::new_v4(),
            user_id,
        })
        .on_conflict(carts::user_id)
        .do_nothing()
        .execute(conn)?;

    carts::table
        .filter(carts::user_id.eq(user_id))
        .select(CartRow::as_select())
        .for_update()
        .first(conn)
}

fn require_cart(conn: &mut PgConnection, user_id: Uuid) -> Result<CartRow, DomainError> {
    lock_cart(conn, user_id)?.ok_or(DomainError::NotFound(Resource::Cart))
}

pub(super) fn load_snapshot(
    conn: &mut PgConnection,
    cart: &CartRow,
) -> Result<CartSnapshot, DomainError> {
    let rows: Vec<(CartItemRow, ProductRow, CategoryRow)> = cart_items::table
        .inner_join(products::table.inner_join(categories::table))
        .filter(cart_items::cart_id.eq(cart.id))
        .order(cart_items::created_at.asc())
        .select((
            CartItemRow::as_select(),
            ProductRow::as_select(),
            CategoryRow::as_select(),
        ))
        .load(conn)?;

    let product_ids: Vec<Uuid> = rows.iter().map(|(item, _, _)| item.product_id).collect();
    let favorite_ids: HashSet<Uuid> = favorites::table
        .filter(favorites::user_id.eq(cart.user_id))
        .filter(favorites::product_id.eq_any(&product_ids))
        .select(favorites::product_id)
        .load::<Uuid>(conn)?
        .into_iter()
        .collect();

    Ok(CartSnapshot {
        id: Some(cart.id),
        discount: cart
            .discount_percent
            .and_then(|pct| DiscountPercent::new(i64::from(pct))),
        lines: rows
            .into_iter()
            .map(|(item, product, category)| CartLine {
                product_id: product.id,
                in_favorite: favorite_ids.contains(&product.id),
                name: product.name,
                price: product.price,
                quantity: item.quantity,
                selected: item.selected,
                category: CategoryRef {
                    id: category.id,
                    name: category.name,
                },
            })
            .collect(),
    })
}

/// Locks the line for the rest of the transaction. Callers hold the cart lock.
fn lock_line(
    conn: &mut PgConnection,
    cart_id: Uuid,
    product_id: Uuid,
) -> Result<CartItemRow, DomainError> {
    cart_items::table
        .filter(cart_items::cart_id.eq(cart_id))
        .filter(cart_items::product_id.eq(product_id))
        .select(CartItemRow::as_select())
        .for_update()
        .first(conn)
        .optional()?
        .ok_or(DomainError::NotFound(Resource::CartItem))
}

impl CartRepository for DieselRepository {
    fn snapshot(&self, user_id: Uuid) -> Result<CartSnapshot, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| match find_cart(conn, user_id)? {
            Some(cart) => load_snapshot(conn, &cart),
            None => Ok(CartSnapshot::default()),
        })
    }

    fn add_item(&self, user_id: Uuid, product_id: Uuid) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let cart = get_or_create_cart(conn, user_id)?;

            diesel::insert_into(cart_items::table)
                .values(&NewCartItemRow {
                    id: Uuid::new_v4(),
                    cart_id: cart.id,
                    product_id,
                    quantity: 1,
                    selected: true,
                })
                .on_conflict((cart_items::cart_id, cart_items::product_id))
                .do_update()
                .set(cart_items::quantity.eq(cart_items::quantity + 1))
                .execute(conn)?;

            Ok(())
        })
    }

    fn decrement_item(&self, user_id: Uuid, product_id: Uuid) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let cart = require_cart(conn, user_id)?;
            let line = lock_line(conn, cart.id, product_id)?;
            let name: String = products::table
                .find(product_id)
                .select(products::name)
                .first(conn)?;

            let quantity = decrement_quantity(line.quantity, &name)?;
            diesel::update(cart_items::table.find(line.id))
                .set(cart_items::quantity.eq(quantity))
                .execute(conn)?;

            Ok(())
        })
    }

    fn remove_item(&self, user_id: Uuid, product_id: Uuid) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let cart = require_cart(conn, user_id)?;
            let deleted = diesel::delete(
                cart_items::table
                    .filter(cart_items::cart_id.eq(cart.id))
                    .filter(cart_items::product_id.eq(product_id)),
            )
            .execute(conn)?;

            if deleted == 0 {
                return Err(DomainError::NotFound(Resource::CartItem));
            }
            Ok(())
        })
    }

    fn toggle_selected(&self, user_id: Uuid, product_id: Uuid) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let cart = require_cart(conn, user_id)?;
            let line = lock_line(conn, cart.id, product_id)?;

            diesel::update(cart_items::table.find(line.id))
                .set(cart_items::selected.eq(!line.selected))
                .execute(conn)?;

            Ok(())
        })
    }

    fn set_all_selected(&self, user_id: Uuid, selected: bool) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            if let Some(cart) = lock_cart(conn, user_id)? {
                diesel::update(cart_items::table.filter(cart_items::cart_id.eq(cart.id)))
                    .set(cart_items::selected.eq(selected))
                    .execute(conn)?;
            }
            Ok(())
        })
    }

    fn delete_selected(&self, user_id: Uuid) -> Result<usize, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let Some(cart) = lock_cart(conn, user_id)? else {
                return Ok(0);
            };
            let deleted = diesel::delete(
                cart_items::table
                    .filter(cart_items::cart_id.eq(cart.id))
                    .filter(cart_items::selected.eq(true)),
            )
            .execute(conn)?;
            Ok(deleted)
        })
    }

    fn set_discount(&self, user_id: Uuid, discount: DiscountPercent) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let cart = get_or_create_cart(conn, user_id)?;
            diesel::update(carts::table.find(cart.id))
                .set(carts::discount_percent.eq(Some(i16::from(discount.value()))))
                .execute(conn)?;
            Ok(())
        })
    }
}
