use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use storefront_engine::{
    db_types::{MembershipPage, OrderStatusType},
    order_objects::{OrderQuery, OrderSortField, Pagination, SortDirection, DEFAULT_PAGE_SIZE},
};

use crate::errors::ServerError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StatusUpdateParams {
    pub status: OrderStatusType,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ArchiveParams {
    pub archived: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscribeParams {
    pub user_id: String,
    pub membership_id: i64,
    #[serde(default)]
    pub order_id: Option<i64>,
    #[serde(default)]
    pub auto_renew: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleteItemParams {
    pub item_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizParams {
    pub item_id: String,
    pub answers: Vec<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserParams {
    pub user_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageViewParams {
    pub user_id: Option<String>,
}

/// A membership page, together with whether the requesting user may see its content.
///
/// When the user may not, the content is withheld.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageView {
    pub can_view: bool,
    #[serde(flatten)]
    pub page: MembershipPage,
}

impl PageView {
    pub fn new(mut page: MembershipPage, can_view: bool) -> Self {
        if !can_view {
            page.content = String::default();
        }
        Self { can_view, page }
    }
}

/// Query string parameters for the admin order listing, e.g.
/// `?status=pending,on-hold&search=anna&sort_by=total&direction=asc&offset=50&limit=50`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderListParams {
    /// A comma separated list of statuses
    pub status: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub archived: Option<bool>,
    pub search: Option<String>,
    pub exclude_completed: bool,
    pub sort_by: Option<OrderSortField>,
    pub direction: Option<SortDirection>,
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

impl OrderListParams {
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.offset.unwrap_or(0), self.limit.unwrap_or(DEFAULT_PAGE_SIZE))
    }
}

impl TryFrom<OrderListParams> for OrderQuery {
    type Error = ServerError;

    fn try_from(params: OrderListParams) -> Result<Self, Self::Error> {
        let pagination = params.pagination();
        let mut query = OrderQuery::default().paged(pagination).sorted_by(
            params.sort_by.unwrap_or_default(),
            params.direction.unwrap_or_default(),
        );
        if let Some(statuses) = params.status {
            for s in statuses.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                let status = s
                    .parse::<OrderStatusType>()
                    .map_err(|e| ServerError::InvalidRequestPath(format!("Invalid status filter. {e}")))?;
                query = query.with_status(status);
            }
        }
        if let Some(since) = params.since {
            query = query.since(since);
        }
        if let Some(until) = params.until {
            query = query.until(until);
        }
        if let Some(archived) = params.archived {
            query = query.archived(archived);
        }
        if let Some(term) = params.search.filter(|s| !s.trim().is_empty()) {
            query = query.with_search(term.trim());
        }
        if params.exclude_completed {
            query = query.excluding_completed();
        }
        Ok(query)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn order_list_params_become_a_query() {
        let params = OrderListParams {
            status: Some("pending, on-hold,".into()),
            search: Some("  anna ".into()),
            sort_by: Some(OrderSortField::Total),
            limit: Some(10),
            ..Default::default()
        };
        let query = OrderQuery::try_from(params).unwrap();
        assert_eq!(query.status, Some(vec![OrderStatusType::Pending, OrderStatusType::OnHold]));
        assert_eq!(query.search.as_deref(), Some("anna"));
        assert_eq!(query.sort_by, OrderSortField::Total);
        assert_eq!(query.direction, SortDirection::Desc);
        assert_eq!(query.pagination, Pagination::new(0, 10));
        assert!(!query.exclude_completed);
    }

    #[test]
    fn unknown_status_filters_are_rejected() {
        let params = OrderListParams { status: Some("pending,shipped".into()), ..Default::default() };
        let err = OrderQuery::try_from(params).unwrap_err();
        assert!(matches!(err, ServerError::InvalidRequestPath(_)));
    }

    #[test]
    fn order_list_params_from_query_string() {
        let params = actix_web::web::Query::<OrderListParams>::from_query(
            "status=completed&archived=true&direction=asc&offset=20",
        )
        .unwrap();
        let query = OrderQuery::try_from(params.into_inner()).unwrap();
        assert_eq!(query.status, Some(vec![OrderStatusType::Completed]));
        assert_eq!(query.is_archived, Some(true));
        assert_eq!(query.direction, SortDirection::Asc);
        assert_eq!(query.pagination.offset, 20);
    }
}
