use diesel::dsl::max;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::sql_types::BigInt;
use serde_json::json;
use uuid::Uuid;

use crate::domain::cart::DiscountPercent;
use crate::domain::errors::{DomainError, Resource};
use crate::domain::order::{
    next_order_number, CheckoutCommand, CheckoutPlan, CheckoutPolicy, ListResult, OrderLineView,
    OrderView, EMPTY_CART, UNPAID_ORDER_PENDING,
};
use crate::domain::ports::OrderRepository;
use crate::schema::{cart_items, carts, marketplace_outbox, order_lines, orders};

use super::cart_repo::{load_snapshot, lock_cart};
use super::models::{NewOrderLineRow, NewOrderRow, NewOutboxEventRow, OrderLineRow, OrderRow};
use super::DieselRepository;

/// Key of the transaction-scoped advisory lock that serializes order number
/// allocation.
const ORDER_NUMBER_LOCK: i64 = 0x6f72_6465_725f_6e6f;

fn to_view(order: OrderRow, lines: Vec<OrderLineRow>) -> OrderView {
    OrderView {
        id: order.id,
        user_id: order.user_id,
        number_order: order.number_order,
        pay_method: order.pay_method,
        send_to: order.send_to,
        total_cost: order.total_cost,
        discount: order
            .discount_percent
            .and_then(|pct| DiscountPercent::new(i64::from(pct))),
        is_paid: order.is_paid,
        created_at: order.created_at,
        lines: lines
            .into_iter()
            .map(|l| OrderLineView {
                id: l.id,
                product_id: l.product_id,
                product_name: l.product_name,
                unit_price: l.unit_price,
                quantity: l.quantity,
            })
            .collect(),
    }
}

fn lock_order(
    conn: &mut PgConnection,
    user_id: Uuid,
    id: Uuid,
) -> Result<OrderRow, DomainError> {
    orders::table
        .filter(orders::id.eq(id))
        .filter(orders::user_id.eq(user_id))
        .select(OrderRow::as_select())
        .for_update()
        .first(conn)
        .optional()?
        .ok_or(DomainError::NotFound(Resource::Order))
}

fn load_lines(conn: &mut PgConnection, order: &OrderRow) -> QueryResult<Vec<OrderLineRow>> {
    OrderLineRow::belonging_to(order)
        .select(OrderLineRow::as_select())
        .order(order_lines::created_at.asc())
        .load(conn)
}

fn allocate_order_number(conn: &mut PgConnection, first_order_number: i64) -> QueryResult<i64> {
    diesel::sql_query("SELECT pg_advisory_xact_lock($1)")
        .bind::<BigInt, _>(ORDER_NUMBER_LOCK)
        .execute(conn)?;

    let current_max: Option<i64> = orders::table
        .select(max(orders::number_order))
        .first(conn)?;

    Ok(next_order_number(current_max, first_order_number))
}

impl OrderRepository for DieselRepository {
    fn checkout(
        &self,
        user_id: Uuid,
        command: &CheckoutCommand,
        policy: &CheckoutPolicy,
    ) -> Result<OrderView, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            if policy.single_unpaid_order {
                let unpaid: i64 = orders::table
                    .filter(orders::user_id.eq(user_id))
                    .filter(orders::is_paid.eq(false))
                    .count()
                    .get_result(conn)?;
                if unpaid > 0 {
                    return Err(DomainError::validation("errors", UNPAID_ORDER_PENDING));
                }
            }

            // 1. Lock the cart. Cart mutations take the same lock first, so
            // the snapshot below stays valid until commit.
            let cart = lock_cart(conn, user_id)?
                .ok_or_else(|| DomainError::validation("errors", EMPTY_CART))?;
            let plan = CheckoutPlan::from_cart(&load_snapshot(conn, &cart)?)?;

            // 2. Insert the order under a fresh number
            let order_id = Uuid::new_v4();
            let number_order = allocate_order_number(conn, policy.first_order_number)?;
            let order: OrderRow = diesel::insert_into(orders::table)
                .values(&NewOrderRow {
                    id: order_id,
                    user_id,
                    number_order,
                    pay_method: command.pay_method.as_str().to_string(),
                    send_to: command.send_to.clone(),
                    total_cost: plan.total_cost,
                    discount_percent: plan.discount.map(|d| i16::from(d.value())),
                })
                .returning(OrderRow::as_returning())
                .get_result(conn)?;

            // 3. Snapshot the selected lines
            let new_lines: Vec<NewOrderLineRow> = plan
                .lines
                .iter()
                .map(|l| NewOrderLineRow {
                    id: Uuid::new_v4(),
                    order_id,
                    product_id: Some(l.product_id),
                    product_name: l.product_name.clone(),
                    unit_price: l.unit_price,
                    quantity: l.quantity,
                })
                .collect();
            let lines: Vec<OrderLineRow> = diesel::insert_into(order_lines::table)
                .values(&new_lines)
                .returning(OrderLineRow::as_returning())
                .get_results(conn)?;

            // 4. Clear exactly what was ordered; unselected lines stay for later.
            let ordered: Vec<Uuid> = plan.lines.iter().map(|l| l.product_id).collect();
            diesel::delete(
                cart_items::table
                    .filter(cart_items::cart_id.eq(cart.id))
                    .filter(cart_items::product_id.eq_any(&ordered)),
            )
            .execute(conn)?;
            diesel::update(carts::table.find(cart.id))
                .set(carts::discount_percent.eq(None::<i16>))
                .execute(conn)?;

            // 5. Outbox event in the same transaction.
            let line_payloads: Vec<serde_json::Value> = plan
                .lines
                .iter()
                .map(|l| {
                    json!({
                        "product_id": l.product_id,
                        "quantity": l.quantity,
                        "unit_price": l.unit_price
                    })
                })
                .collect();
            diesel::insert_into(marketplace_outbox::table)
                .values(&NewOutboxEventRow::order_event(
                    order_id,
                    "OrderCreated",
                    json!({
                        "order_id": order_id,
                        "number_order": number_order,
                        "user_id": user_id,
                        "pay_method": command.pay_method.as_str(),
                        "total_cost": plan.total_cost,
                        "lines": line_payloads
                    }),
                ))
                .execute(conn)?;

            Ok(to_view(order, lines))
        })
    }

    fn find_by_id(&self, user_id: Uuid, id: Uuid) -> Result<Option<OrderView>, DomainError> {
        let mut conn = self.pool.get()?;

        let order = orders::table
            .filter(orders::id.eq(id))
            .filter(orders::user_id.eq(user_id))
            .select(OrderRow::as_select())
            .first(&mut conn)
            .optional()?;

        let Some(order) = order else {
            return Ok(None);
        };

        let lines = load_lines(&mut conn, &order)?;
        Ok(Some(to_view(order, lines)))
    }

    fn list(&self, user_id: Uuid, page: i64, limit: i64) -> Result<ListResult, DomainError> {
        let mut conn = self.pool.get()?;

        let offset = (page - 1).saturating_mul(limit);
        conn.transaction::<_, DomainError, _>(|conn| {
            let total: i64 = orders::table
                .filter(orders::user_id.eq(user_id))
                .count()
                .get_result(conn)?;

            let rows = orders::table
                .filter(orders::user_id.eq(user_id))
                .select(OrderRow::as_select())
                .order((orders::created_at.desc(), orders::number_order.desc()))
                .limit(limit)
                .offset(offset)
                .load(conn)?;

            let lines = OrderLineRow::belonging_to(&rows)
                .select(OrderLineRow::as_select())
                .order(order_lines::created_at.asc())
                .load(conn)?;

            Ok(ListResult {
                items: lines
                    .grouped_by(&rows)
                    .into_iter()
                    .zip(rows)
                    .map(|(lines, order)| to_view(order, lines))
                    .collect(),
                total,
            })
        })
    }

    fn mark_paid(&self, user_id: Uuid, id: Uuid) -> Result<OrderView, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let mut order = lock_order(conn, user_id, id)?;

            if !order.is_paid {
                order = diesel::update(orders::table.find(order.id))
                    .set(orders::is_paid.eq(true))
                    .returning(OrderRow::as_returning())
                    .get_result(conn)?;

                diesel::insert_into(marketplace_outbox::table)
                    .values(&NewOutboxEventRow::order_event(
                        order.id,
                        "OrderPaid",
                        json!({
                            "order_id": order.id,
                            "number_order": order.number_order,
                            "user_id": order.user_id
                        }),
                    ))
                    .execute(conn)?;
            }

            let lines = load_lines(conn, &order)?;
            Ok(to_view(order, lines))
        })
    }

    fn delete(&self, user_id: Uuid, id: Uuid) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let order = lock_order(conn, user_id, id)?;
            to_view(order.clone(), Vec::new()).ensure_deletable()?;

            diesel::delete(orders::table.find(order.id)).execute(conn)?;
            diesel::insert_into(marketplace_outbox::table)
                .values(&NewOutboxEventRow::order_event(
                    order.id,
                    "OrderDeleted",
                    json!({
                        "order_id": order.id,
                        "number_order": order.number_order,
                        "user_id": order.user_id
                    }),
                ))
                .execute(conn)?;

            Ok(())
        })
    }
}
