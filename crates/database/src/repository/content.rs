//! Admin-edited lists of the public site: sponsors, plans, citizens of
//! honour and About page sections. Each list is written back as a whole in
//! one transaction, following a [`SyncPlan`].

use super::DbRepository;
use crate::DbError;
use core_types::payloads::{AboutItemInput, AboutSectionInput, CitizenInput, PlanInput, SponsorInput};
use core_types::validation::clean;
use core_types::{
    AboutItem, AboutSection, AboutSectionContent, AboutSectionMeta, Citizen, Plan, Sponsor, SyncPlan,
};

impl DbRepository {
    // --- Sponsors ---

    pub async fn list_sponsors(&self) -> Result<Vec<Sponsor>, DbError> {
        let sponsors = sqlx::query_as::<_, Sponsor>(
            "SELECT id, name, website, sponsor_type, logo_url, position FROM sponsors ORDER BY position, lower(name)",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(sponsors)
    }

    pub async fn sync_sponsors(&self, plan: &SyncPlan<'_, SponsorInput>) -> Result<Vec<Sponsor>, DbError> {
        let mut tx = self.pool.begin().await?;

        if !plan.deletes.is_empty() {
            sqlx::query("DELETE FROM sponsors WHERE id = ANY($1)")
                .bind(&plan.deletes)
                .execute(&mut *tx)
                .await?;
        }

        for entry in &plan.upserts {
            let sponsor = entry.item;
            let sql = if entry.is_new {
                "INSERT INTO sponsors (id, name, website, sponsor_type, logo_url, position) \
                 VALUES ($1, $2, $3, $4, $5, $6)"
            } else {
                "UPDATE sponsors SET name = $2, website = $3, sponsor_type = $4, logo_url = $5, position = $6 \
                 WHERE id = $1"
            };
            sqlx::query(sql)
                .bind(entry.id)
                .bind(sponsor.name.trim())
                .bind(clean(sponsor.website.as_deref()))
                .bind(sponsor.sponsor_type)
                .bind(clean(sponsor.logo_url.as_deref()))
                .bind(entry.position)
                .execute(&mut *tx)
                .await
                .map_err(DbError::from_query)?;
        }

        tx.commit().await?;
        self.list_sponsors().await
    }

    // --- Plans ---

    pub async fn list_plans(&self, active_only: bool) -> Result<Vec<Plan>, DbError> {
        let plans = sqlx::query_as::<_, Plan>(
            "SELECT id, kind, name, price_cents, currency, features, is_active, position FROM plans \
             WHERE is_active OR NOT $1 ORDER BY position",
        )
        .bind(active_only)
        .fetch_all(&self.pool)
        .await?;
        Ok(plans)
    }

    pub async fn sync_plans(&self, plan: &SyncPlan<'_, PlanInput>) -> Result<Vec<Plan>, DbError> {
        let mut tx = self.pool.begin().await?;

        if !plan.deletes.is_empty() {
            sqlx::query("DELETE FROM plans WHERE id = ANY($1)")
                .bind(&plan.deletes)
                .execute(&mut *tx)
                .await?;
        }

        for entry in &plan.upserts {
            let input = entry.item;
            let features: Vec<String> = input.features.iter().map(|f| f.trim().to_string()).collect();
            let sql = if entry.is_new {
                "INSERT INTO plans (id, kind, name, price_cents, currency, features, is_active, position) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"
            } else {
                "UPDATE plans SET kind = $2, name = $3, price_cents = $4, currency = $5, features = $6, \
                 is_active = $7, position = $8 WHERE id = $1"
            };
            sqlx::query(sql)
                .bind(entry.id)
                .bind(input.kind)
                .bind(input.name.trim())
                .bind(input.price_cents)
                .bind(&input.currency)
                .bind(features)
                .bind(input.is_active)
                .bind(entry.position)
                .execute(&mut *tx)
                .await
                .map_err(DbError::from_query)?;
        }

        tx.commit().await?;
        self.list_plans(false).await
    }

    // --- Citizens of Honour ---

    pub async fn list_citizens(&self, year: i32) -> Result<Vec<Citizen>, DbError> {
        let citizens = sqlx::query_as::<_, Citizen>(
            "SELECT id, year, name, description, image_url, website, position FROM citizens \
             WHERE year = $1 ORDER BY position",
        )
        .bind(year)
        .fetch_all(&self.pool)
        .await?;
        Ok(citizens)
    }

    pub async fn latest_citizen_year(&self) -> Result<Option<i32>, DbError> {
        let year = sqlx::query_scalar::<_, Option<i32>>("SELECT MAX(year) FROM citizens")
            .fetch_one(&self.pool)
            .await?;
        Ok(year)
    }

    /// Writes the citizens of one year. Rows of other years are never touched.
    pub async fn sync_citizens(&self, year: i32, plan: &SyncPlan<'_, CitizenInput>) -> Result<Vec<Citizen>, DbError> {
        let mut tx = self.pool.begin().await?;

        if !plan.deletes.is_empty() {
            sqlx::query("DELETE FROM citizens WHERE year = $1 AND id = ANY($2)")
                .bind(year)
                .bind(&plan.deletes)
                .execute(&mut *tx)
                .await?;
        }

        for entry in &plan.upserts {
            let citizen = entry.item;
            let sql = if entry.is_new {
                "INSERT INTO citizens (id, year, name, description, image_url, website, position) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7)"
            } else {
                "UPDATE citizens SET name = $3, description = $4, image_url = $5, website = $6, position = $7 \
                 WHERE id = $1 AND year = $2"
            };
            sqlx::query(sql)
                .bind(entry.id)
                .bind(year)
                .bind(citizen.name.trim())
                .bind(clean(citizen.description.as_deref()))
                .bind(clean(citizen.image_url.as_deref()))
                .bind(clean(citizen.website.as_deref()))
                .bind(entry.position)
                .execute(&mut *tx)
                .await
                .map_err(DbError::from_query)?;
        }

        tx.commit().await?;
        self.list_citizens(year).await
    }

    // --- About page ---

    pub async fn get_about_section(&self, section: AboutSection) -> Result<AboutSectionContent, DbError> {
        let meta = sqlx::query_as::<_, AboutSectionMeta>(
            "SELECT section, title, description, is_visible FROM about_sections WHERE section = $1",
        )
        .bind(section)
        .fetch_optional(&self.pool)
        .await?;

        let items = sqlx::query_as::<_, AboutItem>(
            "SELECT id, section, title, description, link, image_url, position FROM about_items \
             WHERE section = $1 ORDER BY position",
        )
        .bind(section)
        .fetch_all(&self.pool)
        .await?;

        // A section that was never saved is visible and empty.
        let (title, description, is_visible) = match meta {
            Some(meta) => (meta.title, meta.description, meta.is_visible),
            None => (None, None, true),
        };
        Ok(AboutSectionContent { section, title, description, is_visible, items })
    }

    pub async fn sync_about_section(
        &self,
        section: AboutSection,
        input: &AboutSectionInput,
        plan: &SyncPlan<'_, AboutItemInput>,
    ) -> Result<AboutSectionContent, DbError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO about_sections (section, title, description, is_visible)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (section) DO UPDATE SET
                title = EXCLUDED.title,
                description = EXCLUDED.description,
                is_visible = EXCLUDED.is_visible
            "#,
        )
        .bind(section)
        .bind(clean(input.title.as_deref()))
        .bind(clean(input.description.as_deref()))
        .bind(input.is_visible)
        .execute(&mut *tx)
        .await?;

        if !plan.deletes.is_empty() {
            sqlx::query("DELETE FROM about_items WHERE section = $1 AND id = ANY($2)")
                .bind(section)
                .bind(&plan.deletes)
                .execute(&mut *tx)
                .await?;
        }

        for entry in &plan.upserts {
            let item = entry.item;
            let sql = if entry.is_new {
                "INSERT INTO about_items (id, section, title, description, link, image_url, position) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7)"
            } else {
                "UPDATE about_items SET title = $3, description = $4, link = $5, image_url = $6, position = $7 \
                 WHERE id = $1 AND section = $2"
            };
            sqlx::query(sql)
                .bind(entry.id)
                .bind(section)
                .bind(item.title.trim())
                .bind(clean(item.description.as_deref()))
                .bind(clean(item.link.as_deref()))
                .bind(clean(item.image_url.as_deref()))
                .bind(entry.position)
                .execute(&mut *tx)
                .await
                .map_err(DbError::from_query)?;
        }

        tx.commit().await?;
        self.get_about_section(section).await
    }
}
