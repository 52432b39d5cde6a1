use crate::{
    db_types::{NewProduct, Product},
    traits::StoreError,
};

/// Storage for the product catalogue that checkout prices are taken from.
#[allow(async_fn_in_trait)]
pub trait ProductManagement {
    /// Inserts the product, or replaces the stored product with the same `product_id`.
    async fn upsert_product(&self, product: NewProduct) -> Result<Product, StoreError>;

    async fn fetch_product(&self, product_id: &str) -> Result<Option<Product>, StoreError>;

    async fn fetch_products(&self) -> Result<Vec<Product>, StoreError>;

    async fn delete_product(&self, product_id: &str) -> Result<bool, StoreError>;
}
