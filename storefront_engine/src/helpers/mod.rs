use chrono::{DateTime, Utc};
use rand::{distributions::Alphanumeric, Rng};

const ORDER_NUMBER_SUFFIX_LEN: usize = 4;

/// Generates a human-facing order number such as `SF-1718000000123-X7QK`.
///
/// The timestamp keeps numbers roughly sortable by creation time; the random suffix separates orders created in the
/// same millisecond. Uniqueness is still enforced by the database.
pub fn generate_order_number(now: DateTime<Utc>) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(ORDER_NUMBER_SUFFIX_LEN)
        .map(|c| char::from(c).to_ascii_uppercase())
        .collect();
    format!("SF-{}-{suffix}", now.timestamp_millis())
}

/// Normalises a user-supplied slug by trimming whitespace and surrounding slashes.
pub fn clean_slug(slug: &str) -> String {
    slug.trim().trim_matches('/').trim().to_string()
}

#[cfg(test)]
mod test {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn order_numbers() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let n = generate_order_number(now);
        assert!(n.starts_with(&format!("SF-{}-", now.timestamp_millis())));
        assert_eq!(n.len(), format!("SF-{}-", now.timestamp_millis()).len() + ORDER_NUMBER_SUFFIX_LEN);
        assert_ne!(generate_order_number(now), generate_order_number(now));
    }

    #[test]
    fn slugs() {
        assert_eq!(clean_slug(" /test-funnel/ "), "test-funnel");
        assert_eq!(clean_slug("   "), "");
    }
}
