use chrono::Utc;
use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewProduct, Product},
    traits::StoreError,
};

pub async fn upsert_product(product: NewProduct, conn: &mut SqliteConnection) -> Result<Product, StoreError> {
    let product: Product = sqlx::query_as(
        r#"
            INSERT INTO products (product_id, name, price, currency, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            ON CONFLICT (product_id) DO UPDATE SET
                name = excluded.name,
                price = excluded.price,
                currency = excluded.currency,
                is_active = excluded.is_active,
                updated_at = excluded.updated_at
            RETURNING *;
        "#,
    )
    .bind(product.product_id)
    .bind(product.name)
    .bind(product.price)
    .bind(product.currency)
    .bind(product.is_active)
    .bind(Utc::now())
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Product [{}] saved at {}", product.product_id, product.price);
    Ok(product)
}

pub async fn fetch_product(product_id: &str, conn: &mut SqliteConnection) -> Result<Option<Product>, StoreError> {
    let product =
        sqlx::query_as("SELECT * FROM products WHERE product_id = $1").bind(product_id).fetch_optional(conn).await?;
    Ok(product)
}

pub async fn fetch_products(conn: &mut SqliteConnection) -> Result<Vec<Product>, StoreError> {
    let products = sqlx::query_as("SELECT * FROM products ORDER BY product_id").fetch_all(conn).await?;
    Ok(products)
}

pub async fn delete_product(product_id: &str, conn: &mut SqliteConnection) -> Result<bool, StoreError> {
    let result = sqlx::query("DELETE FROM products WHERE product_id = $1").bind(product_id).execute(conn).await?;
    Ok(result.rows_affected() > 0)
}
