//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tracing::instrument;

use crate::db::Store;
use crate::error::{AppError, PageError};
use crate::middleware::Visitor;
use crate::models::Product;
use crate::services::{CartService, CatalogService};
use crate::state::AppState;

/// Product display data for the catalog grid.
#[derive(Clone)]
pub struct ProductCard {
    pub id: String,
    pub name: String,
    pub description: String,
    pub image: String,
    pub category: String,
    pub price: String,
    pub stock: u32,
}

impl From<&Product> for ProductCard {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            description: product.description.clone(),
            image: product.image.clone(),
            category: product.category.clone(),
            price: product.price.to_string(),
            stock: product.stock,
        }
    }
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub struct HomeTemplate {
    pub products: Vec<ProductCard>,
    pub cart_count: u32,
}

/// Display the product catalog.
#[instrument(skip(state, visitor), fields(user_id = %visitor.user_id))]
pub async fn home<S: Store>(
    State(state): State<AppState<S>>,
    visitor: Visitor,
) -> Result<HomeTemplate, PageError> {
    let products = CatalogService::new(state.store())
        .list_products()
        .await
        .map_err(AppError::during("Failed to fetch products"))?;

    let cart = CartService::new(state.store())
        .get_cart(&visitor.user_id)
        .await
        .map_err(AppError::during("Failed to fetch cart"))?;

    Ok(HomeTemplate {
        products: products.iter().map(ProductCard::from).collect(),
        cart_count: cart.item_count,
    })
}
