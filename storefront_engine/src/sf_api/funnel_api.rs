use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;

use crate::{
    countdown::CountdownStatus,
    db_types::{Funnel, NewFunnel},
    helpers::clean_slug,
    sf_api::errors::{FunnelAction, FunnelError},
    traits::FunnelManagement,
};

/// Create, edit and query marketing funnels.
pub struct FunnelApi<B> {
    db: B,
}

impl<B> Debug for FunnelApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FunnelApi")
    }
}

impl<B: Clone> Clone for FunnelApi<B> {
    fn clone(&self) -> Self {
        Self { db: self.db.clone() }
    }
}

impl<B> FunnelApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

/// Checks the rules that do not need the database, in the order the editor reports them.
fn check_funnel(funnel: &NewFunnel, action: FunnelAction) -> Result<(), FunnelError> {
    let invalid = |msg: &str| -> Result<(), FunnelError> { Err(FunnelError::Invalid(action, msg.to_string())) };
    if funnel.name.trim().is_empty() {
        return invalid("Name ist erforderlich");
    }
    if funnel.slug.is_empty() {
        return invalid("URL-Pfad ist erforderlich");
    }
    if funnel.products.main.trim().is_empty() {
        return invalid("Hauptprodukt ist erforderlich");
    }
    if let Some(countdown) = &funnel.countdown {
        if countdown.start_date >= countdown.end_date {
            return invalid("Startdatum muss vor dem Enddatum liegen");
        }
    }
    let in_range = |p: i64| (0..=100).contains(&p);
    if !in_range(funnel.discounts.main_percent) || !in_range(funnel.discounts.upsell_percent) {
        return invalid("Rabatt muss zwischen 0 und 100 liegen");
    }
    Ok(())
}

impl<B> FunnelApi<B>
where B: FunnelManagement
{
    async fn validate(&self, mut funnel: NewFunnel, action: FunnelAction, id: Option<i64>) -> Result<NewFunnel, FunnelError> {
        funnel.slug = clean_slug(&funnel.slug);
        check_funnel(&funnel, action)?;
        if self.db.funnel_slug_exists(&funnel.slug, id).await? {
            return Err(FunnelError::SlugTaken(action));
        }
        Ok(funnel)
    }

    pub async fn create_funnel(&self, funnel: NewFunnel) -> Result<Funnel, FunnelError> {
        let funnel = self.validate(funnel, FunnelAction::Create, None).await.map_err(|e| {
            debug!("🎯️ Funnel rejected. {e}");
            e
        })?;
        let funnel = self.db.insert_funnel(funnel).await.map_err(|e| {
            error!("🎯️ Could not save funnel. {e}");
            e
        })?;
        info!("🎯️ Funnel '{}' created at /{}", funnel.name, funnel.slug);
        Ok(funnel)
    }

    pub async fn update_funnel(&self, id: i64, funnel: NewFunnel) -> Result<Funnel, FunnelError> {
        let funnel = self.validate(funnel, FunnelAction::Update, Some(id)).await?;
        let funnel = self.db.update_funnel(id, funnel).await?.ok_or_else(|| FunnelError::NotFound(id.to_string()))?;
        info!("🎯️ Funnel #{id} '{}' updated", funnel.name);
        Ok(funnel)
    }

    pub async fn fetch_funnel(&self, id: i64) -> Result<Option<Funnel>, FunnelError> {
        Ok(self.db.fetch_funnel(id).await?)
    }

    pub async fn fetch_funnel_by_slug(&self, slug: &str) -> Result<Option<Funnel>, FunnelError> {
        Ok(self.db.fetch_funnel_by_slug(&clean_slug(slug)).await?)
    }

    pub async fn list_funnels(&self) -> Result<Vec<Funnel>, FunnelError> {
        Ok(self.db.fetch_funnels().await?)
    }

    pub async fn delete_funnel(&self, id: i64) -> Result<(), FunnelError> {
        if !self.db.delete_funnel(id).await? {
            return Err(FunnelError::NotFound(id.to_string()));
        }
        info!("🎯️ Funnel #{id} deleted");
        Ok(())
    }

    /// The countdown status of the funnel at `slug`. Funnels without a countdown are always open.
    pub async fn countdown_status(&self, slug: &str, now: DateTime<Utc>) -> Result<CountdownStatus, FunnelError> {
        let funnel = self.fetch_funnel_by_slug(slug).await?.ok_or_else(|| FunnelError::NotFound(slug.to_string()))?;
        Ok(funnel.countdown.map(|c| c.status_at(now)).unwrap_or_else(CountdownStatus::unlimited))
    }
}

#[cfg(test)]
mod test {
    use chrono::TimeZone;

    use super::*;
    use crate::db_types::{Countdown, FunnelProducts};

    fn valid() -> NewFunnel {
        NewFunnel {
            name: "Test Funnel".into(),
            slug: "test-funnel".into(),
            products: FunnelProducts { main: "product-1".into(), upsells: vec![] },
            ..Default::default()
        }
    }

    fn message(funnel: NewFunnel) -> String {
        check_funnel(&funnel, FunnelAction::Create).unwrap_err().to_string()
    }

    #[test]
    fn rules_apply_in_order() {
        assert!(check_funnel(&valid(), FunnelAction::Create).is_ok());
        let only_name = NewFunnel { name: "Test Funnel".into(), ..Default::default() };
        assert_eq!(message(only_name), "Fehler beim Erstellen des Funnels: URL-Pfad ist erforderlich");
        assert!(message(NewFunnel::default()).ends_with("Name ist erforderlich"));
        let no_product = NewFunnel { products: FunnelProducts::default(), ..valid() };
        assert!(message(no_product).ends_with("Hauptprodukt ist erforderlich"));
    }

    #[test]
    fn countdown_must_end_after_it_starts() {
        let countdown = Countdown::new(
            Utc.with_ymd_and_hms(2024, 2, 20, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 2, 19, 0, 0, 0).unwrap(),
        );
        let funnel = NewFunnel { countdown: Some(countdown), ..valid() };
        assert!(message(funnel).contains("Startdatum muss vor dem Enddatum liegen"));
    }

    #[test]
    fn discounts_are_percentages() {
        let mut funnel = valid();
        funnel.discounts.upsell_percent = 101;
        assert!(message(funnel.clone()).contains("Rabatt muss zwischen 0 und 100 liegen"));
        funnel.discounts.upsell_percent = 100;
        funnel.discounts.main_percent = -1;
        assert!(message(funnel).contains("Rabatt"));
    }

    #[test]
    fn update_messages_use_update_prefix() {
        let err = check_funnel(&NewFunnel::default(), FunnelAction::Update).unwrap_err();
        assert_eq!(err.to_string(), "Fehler beim Aktualisieren des Funnels: Name ist erforderlich");
    }
}
