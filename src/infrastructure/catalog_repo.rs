use diesel::dsl::{max, min};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::catalog::{PriceRange, Product};
use crate::domain::errors::DomainError;
use crate::domain::ports::CatalogRepository;
use crate::schema::products;

use super::DieselRepository;

impl CatalogRepository for DieselRepository {
    fn find_product(&self, id: Uuid) -> Result<Option<Product>, DomainError> {
        let mut conn = self.pool.get()?;

        let product = products::table
            .find(id)
            .select((products::id, products::name, products::price))
            .first::<(Uuid, String, i64)>(&mut conn)
            .optional()?;

        Ok(product.map(|(id, name, price)| Product { id, name, price }))
    }

    fn price_range(&self) -> Result<PriceRange, DomainError> {
        let mut conn = self.pool.get()?;

        let (min, max) = products::table
            .select((min(products::price), max(products::price)))
            .first::<(Option<i64>, Option<i64>)>(&mut conn)?;

        Ok(PriceRange { min, max })
    }
}
