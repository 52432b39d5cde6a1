use std::time::Duration;

use chrono::Utc;
use log::*;
use storefront_engine::{db_types::Subscription, events::EventProducers, MembershipApi, SqliteDatabase};
use tokio::task::JoinHandle;

/// Starts the subscription expiry worker. Do not await the returned JoinHandle, as it will run indefinitely.
///
/// Every `interval`, active subscriptions whose end date has passed are marked as expired.
pub fn start_expiry_worker(db: SqliteDatabase, producers: EventProducers, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        let api = MembershipApi::new(db, producers);
        info!("🕰️ Subscription expiry worker started. Sweeping every {}s", interval.as_secs());
        loop {
            timer.tick().await;
            trace!("🕰️ Running subscription expiry job");
            match api.expire_subscriptions(Utc::now()).await {
                Ok(expired) if expired.is_empty() => {},
                Ok(expired) => {
                    info!("🕰️ {} subscriptions expired", expired.len());
                    debug!("🕰️ Expired subscriptions: {}", subscription_list(&expired));
                },
                Err(e) => {
                    error!("🕰️ Error running subscription expiry job: {e}");
                },
            }
        }
    })
}

fn subscription_list(subscriptions: &[Subscription]) -> String {
    subscriptions
        .iter()
        .map(|s| format!("[{}] user: {} membership: {} ended: {}", s.id, s.user_id, s.membership_id, s.end_date))
        .collect::<Vec<String>>()
        .join(", ")
}
