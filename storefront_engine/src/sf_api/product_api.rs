use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{NewProduct, Product},
    sf_api::errors::ProductError,
    traits::ProductManagement,
};

/// The product catalogue. Checkout looks prices up here.
pub struct ProductApi<B> {
    db: B,
}

impl<B> Debug for ProductApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ProductApi")
    }
}

impl<B: Clone> Clone for ProductApi<B> {
    fn clone(&self) -> Self {
        Self { db: self.db.clone() }
    }
}

impl<B> ProductApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

fn check_product(product: &NewProduct) -> Result<(), ProductError> {
    if product.product_id.trim().is_empty() {
        return Err(ProductError::Validation("A product id is required".into()));
    }
    if product.name.trim().is_empty() {
        return Err(ProductError::Validation("A product name is required".into()));
    }
    if product.price.is_negative() {
        return Err(ProductError::Validation("The price cannot be negative".into()));
    }
    Ok(())
}

impl<B> ProductApi<B>
where B: ProductManagement
{
    /// Adds the product to the catalogue, replacing any product with the same id.
    pub async fn save_product(&self, mut product: NewProduct) -> Result<Product, ProductError> {
        product.product_id = product.product_id.trim().to_string();
        check_product(&product)?;
        let product = self.db.upsert_product(product).await?;
        info!("🛒️ Product {} is now listed at {} {}", product.product_id, product.price, product.currency);
        Ok(product)
    }

    pub async fn fetch_product(&self, product_id: &str) -> Result<Option<Product>, ProductError> {
        Ok(self.db.fetch_product(product_id).await?)
    }

    pub async fn list_products(&self) -> Result<Vec<Product>, ProductError> {
        Ok(self.db.fetch_products().await?)
    }

    pub async fn delete_product(&self, product_id: &str) -> Result<(), ProductError> {
        if !self.db.delete_product(product_id).await? {
            return Err(ProductError::NotFound(product_id.to_string()));
        }
        info!("🛒️ Product {product_id} removed from the catalogue");
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::db_types::Money;

    #[test]
    fn product_rules() {
        let ok = NewProduct::new("ebook", "Ebook", Money::from(990));
        assert!(check_product(&ok).is_ok());
        let free = NewProduct { price: Money::default(), ..ok.clone() };
        assert!(check_product(&free).is_ok());
        let no_id = NewProduct { product_id: " ".into(), ..ok.clone() };
        assert!(matches!(check_product(&no_id), Err(ProductError::Validation(_))));
        let negative = NewProduct { price: Money::from(-1), ..ok };
        assert!(check_product(&negative).is_err());
    }
}
