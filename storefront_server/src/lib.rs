//! # Storefront server
//! This crate hosts the HTTP server for the storefront back office. It is responsible for:
//! * Taking checkouts from the shop front end and handing them to the payment gateways.
//! * Serving funnel and countdown data to landing pages.
//! * The admin API for orders, funnels, memberships, membership pages and courses.
//! * Sending transactional email when orders and subscriptions change.
//! * Expiring subscriptions in the background.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/checkout` and `/checkout/{order_id}/complete`: The public checkout flow.
//! * `/funnel/{slug}` and `/funnel/{slug}/countdown`: Public funnel data.
//! * `/api/...`: The admin API. Every request must carry the admin key in the `sf_admin_key` header.
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod email;
pub mod errors;
pub mod expiry_worker;
pub mod integrations;
pub mod middleware;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
