use chrono::Utc;
use log::{debug, trace};
use sqlx::{types::Json, QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    db_types::{Money, NewOrder, Order, OrderStatusType},
    sf_api::order_objects::{OrderPage, OrderQuery, OrderStats, OrderUpdate},
    traits::StoreError,
};

/// Inserts a new order into the database using the given connection. This is not atomic. You can embed this call
/// inside a transaction if you need to ensure atomicity, and pass `&mut *tx` as the connection argument.
///
/// New orders always start out as `Pending`, unarchived and unpaid.
pub async fn insert_order(
    order_number: &str,
    order: NewOrder,
    conn: &mut SqliteConnection,
) -> Result<Order, StoreError> {
    let now = Utc::now();
    let order: Order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                order_number,
                customer_name,
                customer_email,
                items,
                total,
                currency,
                status,
                payment_method,
                funnel_id,
                woo_order_id,
                woo_date_created,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *;
        "#,
    )
    .bind(order_number)
    .bind(order.customer_name)
    .bind(order.customer_email)
    .bind(Json(&order.items))
    .bind(order.total)
    .bind(order.currency)
    .bind(OrderStatusType::Pending)
    .bind(order.payment_method)
    .bind(order.funnel_id)
    .bind(order.woo_order_id)
    .bind(order.woo_date_created)
    .bind(order.created_at)
    .bind(now)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Order [{}] inserted with id {}", order.order_number, order.id);
    Ok(order)
}

pub async fn fetch_order(id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, StoreError> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_order_by_number(
    order_number: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, StoreError> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE order_number = $1")
        .bind(order_number)
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

fn push_filters(builder: &mut QueryBuilder<'_, Sqlite>, query: &OrderQuery) {
    if !query.has_filters() {
        return;
    }
    builder.push(" WHERE ");
    let mut where_clause = builder.separated(" AND ");
    if let Some(statuses) = query.status.as_ref().filter(|s| !s.is_empty()) {
        where_clause.push("status IN (");
        for (i, status) in statuses.iter().enumerate() {
            if i > 0 {
                where_clause.push_unseparated(", ");
            }
            where_clause.push_bind_unseparated(status.to_string());
        }
        where_clause.push_unseparated(")");
    }
    if query.exclude_completed {
        where_clause.push("status != ");
        where_clause.push_bind_unseparated(OrderStatusType::Completed.to_string());
    }
    if let Some(since) = query.since {
        where_clause.push("created_at >= ");
        where_clause.push_bind_unseparated(since);
    }
    if let Some(until) = query.until {
        where_clause.push("created_at <= ");
        where_clause.push_bind_unseparated(until);
    }
    if let Some(archived) = query.is_archived {
        where_clause.push("is_archived = ");
        where_clause.push_bind_unseparated(archived);
    }
    if let Some(term) = query.search.as_ref().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", escape_like(term));
        where_clause.push("(customer_name LIKE ");
        where_clause.push_bind_unseparated(pattern.clone());
        where_clause.push_unseparated(" ESCAPE '\\' OR customer_email LIKE ");
        where_clause.push_bind_unseparated(pattern.clone());
        where_clause.push_unseparated(" ESCAPE '\\' OR order_number LIKE ");
        where_clause.push_bind_unseparated(pattern);
        where_clause.push_unseparated(" ESCAPE '\\' OR CAST(id AS TEXT) = ");
        where_clause.push_bind_unseparated(term.to_string());
        where_clause.push_unseparated(")");
    }
}

/// Escapes the `LIKE` wildcards in `term`, so that `%` and `_` only match themselves.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Fetches orders according to the filters, sort order and pagination in `query`.
///
/// The total count ignores pagination, so that callers can render page controls.
pub async fn search_orders(query: &OrderQuery, conn: &mut SqliteConnection) -> Result<OrderPage, StoreError> {
    let mut count_builder = QueryBuilder::new("SELECT COUNT(*) FROM orders");
    push_filters(&mut count_builder, query);
    trace!("🗃️ Executing query: {}", count_builder.sql());
    let total_count = count_builder.build_query_scalar::<i64>().fetch_one(&mut *conn).await?;

    let pagination = query.pagination.normalized();
    let mut builder = QueryBuilder::new("SELECT * FROM orders");
    push_filters(&mut builder, query);
    let direction = query.direction.sql();
    builder.push(format!(" ORDER BY {} {direction}, id {direction}", query.sort_by.column()));
    builder.push(" LIMIT ");
    builder.push_bind(pagination.limit);
    builder.push(" OFFSET ");
    builder.push_bind(pagination.offset);
    trace!("🗃️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as::<Order>().fetch_all(conn).await?;
    trace!("🗃️ Result of search_orders: {} of {total_count}", orders.len());
    Ok(OrderPage { orders, total_count })
}

pub async fn order_stats(conn: &mut SqliteConnection) -> Result<OrderStats, StoreError> {
    let rows: Vec<(OrderStatusType, i64, i64)> =
        sqlx::query_as("SELECT status, COUNT(*), COALESCE(SUM(total), 0) FROM orders GROUP BY status")
            .fetch_all(conn)
            .await?;
    let mut stats = OrderStats::default();
    let mut completed = 0;
    for (status, count, sum) in rows {
        stats.total_orders += count;
        stats.count_by_status.insert(status, count);
        if status == OrderStatusType::Completed {
            completed = count;
            stats.total_revenue = Money::from(sum);
        }
    }
    if completed > 0 {
        stats.average_order_value = Money::from(stats.total_revenue.value() / completed);
    }
    Ok(stats)
}

pub async fn update_order(
    id: i64,
    update: OrderUpdate,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, StoreError> {
    if update.is_empty() {
        debug!("🗃️ No fields to update for order {id}. Update request skipped.");
        return fetch_order(id, conn).await;
    }
    let mut builder = QueryBuilder::new("UPDATE orders SET ");
    let mut set_clause = builder.separated(", ");
    set_clause.push("updated_at = ");
    set_clause.push_bind_unseparated(Utc::now());
    if let Some(status) = update.status {
        set_clause.push("status = ");
        set_clause.push_bind_unseparated(status.to_string());
    }
    if let Some(archived) = update.is_archived {
        set_clause.push("is_archived = ");
        set_clause.push_bind_unseparated(archived);
    }
    if let Some(date_paid) = update.date_paid {
        set_clause.push("date_paid = ");
        set_clause.push_bind_unseparated(date_paid);
    }
    if let Some(method) = update.payment_method {
        set_clause.push("payment_method = ");
        set_clause.push_bind_unseparated(method.to_string());
    }
    if let Some(gateway) = update.gateway {
        set_clause.push("gateway = ");
        set_clause.push_bind_unseparated(Json(gateway));
    }
    builder.push(" WHERE id = ");
    builder.push_bind(id);
    builder.push(" RETURNING *");
    trace!("🗃️ Executing query: {}", builder.sql());
    let order = builder.build_query_as::<Order>().fetch_optional(conn).await?;
    trace!("🗃️ Result of update_order: {order:?}");
    Ok(order)
}

pub async fn delete_order(id: i64, conn: &mut SqliteConnection) -> Result<bool, StoreError> {
    let result = sqlx::query("DELETE FROM orders WHERE id = $1").bind(id).execute(conn).await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod test {
    use super::escape_like;

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("anna"), "anna");
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b\\c"), "a\\_b\\\\c");
    }
}
