use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::application::CatalogService;
use crate::domain::catalog::PriceRange;
use crate::domain::ports::CatalogRepository;
use crate::errors::AppError;

/// Cheapest and most expensive catalog prices, `null` for an empty catalog.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PriceRangeResponse {
    #[serde(rename = "price__min")]
    pub min: Option<i64>,
    #[serde(rename = "price__max")]
    pub max: Option<i64>,
}

impl From<PriceRange> for PriceRangeResponse {
    fn from(range: PriceRange) -> Self {
        Self {
            min: range.min,
            max: range.max,
        }
    }
}

/// GET /get_min_max_cost/
#[utoipa::path(
    get,
    path = "/get_min_max_cost/",
    responses((status = 200, description = "Catalog price bounds", body = PriceRangeResponse)),
    tag = "catalog"
)]
pub async fn price_range<R: CatalogRepository>(
    service: web::Data<CatalogService<R>>,
) -> Result<HttpResponse, AppError> {
    let range = web::block(move || service.price_range()).await??;
    Ok(HttpResponse::Ok().json(PriceRangeResponse::from(range)))
}
