use std::sync::Arc;

use crate::domain::catalog::PriceRange;
use crate::domain::errors::DomainError;
use crate::domain::ports::CatalogRepository;

pub struct CatalogService<R> {
    repo: Arc<R>,
}

impl<R: CatalogRepository> CatalogService<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub fn price_range(&self) -> Result<PriceRange, DomainError> {
        self.repo.price_range()
    }
}
