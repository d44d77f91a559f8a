//! In-memory implementation of the repository ports for service and handler
//! tests. One mutex guards the whole store, so every call is atomic.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use uuid::Uuid;

use crate::domain::cart::{decrement_quantity, CartLine, CartSnapshot, DiscountPercent};
use crate::domain::catalog::{CategoryRef, PriceRange, Product};
use crate::domain::errors::{DomainError, Resource};
use crate::domain::order::{
    next_order_number, CheckoutCommand, CheckoutPlan, CheckoutPolicy, ListResult, OrderLineView,
    OrderView, EMPTY_CART, UNPAID_ORDER_PENDING,
};
use crate::domain::ports::{CartRepository, CatalogRepository, OrderRepository};

struct StoredLine {
    product_id: Uuid,
    quantity: i32,
    selected: bool,
}

struct StoredCart {
    id: Uuid,
    discount: Option<DiscountPercent>,
    lines: Vec<StoredLine>,
}

#[derive(Default)]
struct State {
    products: HashMap<Uuid, Product>,
    favorites: HashSet<(Uuid, Uuid)>,
    carts: HashMap<Uuid, StoredCart>,
    orders: Vec<OrderView>,
    outbox: Vec<String>,
}

pub struct MemoryStore {
    category: CategoryRef,
    state: Mutex<State>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            category: CategoryRef {
                id: Uuid::new_v4(),
                name: "Telegram bots".to_string(),
            },
            state: Mutex::new(State::default()),
        }
    }
}

impl MemoryStore {
    fn state(&self) -> Result<MutexGuard<'_, State>, DomainError> {
        self.state
            .lock()
            .map_err(|e| DomainError::Internal(e.to_string()))
    }

    pub fn insert_product(&self, name: &str, price: i64) -> Uuid {
        let id = Uuid::new_v4();
        let product = Product {
            id,
            name: name.to_string(),
            price,
        };
        self.state()
            .expect("store lock poisoned")
            .products
            .insert(id, product);
        id
    }

    pub fn mark_favorite(&self, user_id: Uuid, product_id: Uuid) {
        self.state()
            .expect("store lock poisoned")
            .favorites
            .insert((user_id, product_id));
    }

    pub fn outbox_events(&self, event_type: &str) -> usize {
        self.state()
            .expect("store lock poisoned")
            .outbox
            .iter()
            .filter(|e| e.as_str() == event_type)
            .count()
    }

    fn snapshot_of(&self, state: &State, user_id: Uuid) -> CartSnapshot {
        let Some(cart) = state.carts.get(&user_id) else {
            return CartSnapshot::default();
        };
        CartSnapshot {
            id: Some(cart.id),
            discount: cart.discount,
            lines: cart
                .lines
                .iter()
                .filter_map(|line| {
                    let product = state.products.get(&line.product_id)?;
                    Some(CartLine {
                        product_id: product.id,
                        name: product.name.clone(),
                        price: product.price,
                        quantity: line.quantity,
                        selected: line.selected,
                        in_favorite: state.favorites.contains(&(user_id, product.id)),
                        category: self.category.clone(),
                    })
                })
                .collect(),
        }
    }
}

fn cart_line<'a>(
    state: &'a mut State,
    user_id: Uuid,
    product_id: Uuid,
) -> Result<&'a mut StoredLine, DomainError> {
    state
        .carts
        .get_mut(&user_id)
        .ok_or(DomainError::NotFound(Resource::Cart))?
        .lines
        .iter_mut()
        .find(|line| line.product_id == product_id)
        .ok_or(DomainError::NotFound(Resource::CartItem))
}

impl CatalogRepository for MemoryStore {
    fn find_product(&self, id: Uuid) -> Result<Option<Product>, DomainError> {
        Ok(self.state()?.products.get(&id).cloned())
    }

    fn price_range(&self) -> Result<PriceRange, DomainError> {
        let state = self.state()?;
        let prices = state.products.values().map(|p| p.price);
        Ok(PriceRange {
            min: prices.clone().min(),
            max: prices.max(),
        })
    }
}

impl CartRepository for MemoryStore {
    fn snapshot(&self, user_id: Uuid) -> Result<CartSnapshot, DomainError> {
        let state = self.state()?;
        Ok(self.snapshot_of(&state, user_id))
    }

    fn add_item(&self, user_id: Uuid, product_id: Uuid) -> Result<(), DomainError> {
        let mut state = self.state()?;
        let cart = state.carts.entry(user_id).or_insert_with(|| StoredCart {
            id: Uuid::new_v4(),
            discount: None,
            lines: Vec::new(),
        });
        match cart.lines.iter_mut().find(|l| l.product_id == product_id) {
            Some(line) => line.quantity += 1,
            None => cart.lines.push(StoredLine {
                product_id,
                quantity: 1,
                selected: true,
            }),
        }
        Ok(())
    }

    fn decrement_item(&self, user_id: Uuid, product_id: Uuid) -> Result<(), DomainError> {
        let mut state = self.state()?;
        let name = state
            .products
            .get(&product_id)
            .map(|p| p.name.clone())
            .unwrap_or_default();
        let line = cart_line(&mut state, user_id, product_id)?;
        line.quantity = decrement_quantity(line.quantity, &name)?;
        Ok(())
    }

    fn remove_item(&self, user_id: Uuid, product_id: Uuid) -> Result<(), DomainError> {
        let mut state = self.state()?;
        cart_line(&mut state, user_id, product_id)?;
        if let Some(cart) = state.carts.get_mut(&user_id) {
            cart.lines.retain(|line| line.product_id != product_id);
        }
        Ok(())
    }

    fn toggle_selected(&self, user_id: Uuid, product_id: Uuid) -> Result<(), DomainError> {
        let mut state = self.state()?;
        let line = cart_line(&mut state, user_id, product_id)?;
        line.selected = !line.selected;
        Ok(())
    }

    fn set_all_selected(&self, user_id: Uuid, selected: bool) -> Result<(), DomainError> {
        let mut state = self.state()?;
        if let Some(cart) = state.carts.get_mut(&user_id) {
            cart.lines.iter_mut().for_each(|line| line.selected = selected);
        }
        Ok(())
    }

    fn delete_selected(&self, user_id: Uuid) -> Result<usize, DomainError> {
        let mut state = self.state()?;
        let Some(cart) = state.carts.get_mut(&user_id) else {
            return Ok(0);
        };
        let before = cart.lines.len();
        cart.lines.retain(|line| !line.selected);
        Ok(before - cart.lines.len())
    }

    fn set_discount(&self, user_id: Uuid, discount: DiscountPercent) -> Result<(), DomainError> {
        let mut state = self.state()?;
        let cart = state.carts.entry(user_id).or_insert_with(|| StoredCart {
            id: Uuid::new_v4(),
            discount: None,
            lines: Vec::new(),
        });
        cart.discount = Some(discount);
        Ok(())
    }
}

impl OrderRepository for MemoryStore {
    fn checkout(
        &self,
        user_id: Uuid,
        command: &CheckoutCommand,
        policy: &CheckoutPolicy,
    ) -> Result<OrderView, DomainError> {
        let mut state = self.state()?;

        if policy.single_unpaid_order
            && state.orders.iter().any(|o| o.user_id == user_id && !o.is_paid)
        {
            return Err(DomainError::validation("errors", UNPAID_ORDER_PENDING));
        }
        if !state.carts.contains_key(&user_id) {
            return Err(DomainError::validation("errors", EMPTY_CART));
        }
        let plan = CheckoutPlan::from_cart(&self.snapshot_of(&state, user_id))?;

        let current_max = state.orders.iter().map(|o| o.number_order).max();
        let order = OrderView {
            id: Uuid::new_v4(),
            user_id,
            number_order: next_order_number(current_max, policy.first_order_number),
            pay_method: command.pay_method.as_str().to_string(),
            send_to: command.send_to.clone(),
            total_cost: plan.total_cost,
            discount: plan.discount,
            is_paid: false,
            created_at: Utc::now(),
            lines: plan
                .lines
                .into_iter()
                .map(|line| OrderLineView {
                    id: Uuid::new_v4(),
                    product_id: Some(line.product_id),
                    product_name: line.product_name,
                    unit_price: line.unit_price,
                    quantity: line.quantity,
                })
                .collect(),
        };

        if let Some(cart) = state.carts.get_mut(&user_id) {
            cart.lines.retain(|line| !line.selected);
            cart.discount = None;
        }
        state.orders.push(order.clone());
        state.outbox.push("OrderCreated".to_string());
        Ok(order)
    }

    fn find_by_id(&self, user_id: Uuid, id: Uuid) -> Result<Option<OrderView>, DomainError> {
        Ok(self
            .state()?
            .orders
            .iter()
            .find(|o| o.id == id && o.user_id == user_id)
            .cloned())
    }

    fn list(&self, user_id: Uuid, page: i64, limit: i64) -> Result<ListResult, DomainError> {
        let state = self.state()?;
        let mut mine: Vec<OrderView> = state
            .orders
            .iter()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        mine.sort_by(|a, b| b.number_order.cmp(&a.number_order));

        let offset = usize::try_from((page - 1).saturating_mul(limit)).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(ListResult {
            total: i64::try_from(mine.len()).unwrap_or(i64::MAX),
            items: mine.into_iter().skip(offset).take(limit).collect(),
        })
    }

    fn mark_paid(&self, user_id: Uuid, id: Uuid) -> Result<OrderView, DomainError> {
        let mut state = self.state()?;
        let order = state
            .orders
            .iter_mut()
            .find(|o| o.id == id && o.user_id == user_id)
            .ok_or(DomainError::NotFound(Resource::Order))?;
        let first_payment = !order.is_paid;
        order.is_paid = true;
        let order = order.clone();
        if first_payment {
            state.outbox.push("OrderPaid".to_string());
        }
        Ok(order)
    }

    fn delete(&self, user_id: Uuid, id: Uuid) -> Result<(), DomainError> {
        let mut state = self.state()?;
        let index = state
            .orders
            .iter()
            .position(|o| o.id == id && o.user_id == user_id)
            .ok_or(DomainError::NotFound(Resource::Order))?;
        state.orders[index].ensure_deletable()?;
        state.orders.remove(index);
        state.outbox.push("OrderDeleted".to_string());
        Ok(())
    }
}
