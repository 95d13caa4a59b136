use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};

use crate::entities::alumni;

#[derive(Debug, Clone, Default)]
pub struct AlumniInput {
    pub name: String,
    pub batch: String,
    pub email: String,
    pub phone: String,
    pub company: String,
    pub bio: String,
}

pub struct AlumniRepository {
    conn: DatabaseConnection,
}

impl AlumniRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list(&self) -> Result<Vec<alumni::Model>> {
        let rows = alumni::Entity::find()
            .order_by_desc(alumni::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to list alumni")?;

        Ok(rows)
    }

    pub async fn get(&self, id: i32) -> Result<Option<alumni::Model>> {
        let row = alumni::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to get alumni record")?;

        Ok(row)
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<alumni::Model>> {
        let row = alumni::Entity::find()
            .filter(alumni::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to get alumni record by email")?;

        Ok(row)
    }

    pub async fn create(&self, input: AlumniInput) -> Result<alumni::Model> {
        let model = Self::to_active(input, &chrono::Utc::now().to_rfc3339())
            .insert(&self.conn)
            .await
            .context("Failed to insert alumni record")?;

        Ok(model)
    }

    pub async fn update(&self, id: i32, input: AlumniInput) -> Result<Option<alumni::Model>> {
        let Some(row) = alumni::Entity::find_by_id(id).one(&self.conn).await? else {
            return Ok(None);
        };

        let mut active: alumni::ActiveModel = row.into();
        active.name = Set(input.name);
        active.batch = Set(input.batch);
        active.email = Set(input.email);
        active.phone = Set(input.phone);
        active.company = Set(input.company);
        active.bio = Set(input.bio);
        let model = active.update(&self.conn).await?;

        Ok(Some(model))
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let res = alumni::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete alumni record")?;

        Ok(res.rows_affected > 0)
    }

    /// Bulk insert for CSV import. Rows are appended, not replaced.
    pub async fn insert_many(&self, rows: Vec<AlumniInput>) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }

        let now = chrono::Utc::now().to_rfc3339();
        let count = rows.len();
        let models: Vec<alumni::ActiveModel> = rows
            .into_iter()
            .map(|r| Self::to_active(r, &now))
            .collect();

        alumni::Entity::insert_many(models)
            .exec(&self.conn)
            .await
            .context("Failed to bulk insert alumni")?;

        Ok(count)
    }

    /// Destructive import support: clear and refill the alumni table.
    pub async fn replace_all(&self, rows: Vec<AlumniInput>) -> Result<usize> {
        let txn = self.conn.begin().await?;

        alumni::Entity::delete_many().exec(&txn).await?;

        let count = rows.len();
        if !rows.is_empty() {
            let now = chrono::Utc::now().to_rfc3339();
            let models: Vec<alumni::ActiveModel> = rows
                .into_iter()
                .map(|r| Self::to_active(r, &now))
                .collect();
            alumni::Entity::insert_many(models).exec(&txn).await?;
        }

        txn.commit().await?;
        Ok(count)
    }

    /// Alumni counts grouped by batch, largest batch first.
    pub async fn counts_by_batch(&self) -> Result<Vec<(String, i64)>> {
        let rows: Vec<(String, i64)> = alumni::Entity::find()
            .select_only()
            .column(alumni::Column::Batch)
            .column_as(alumni::Column::Id.count(), "cnt")
            .group_by(alumni::Column::Batch)
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to aggregate alumni by batch")?;

        let mut rows = rows;
        rows.sort_by(|a, b| b.1.cmp(&a.1));
        Ok(rows)
    }

    pub async fn count(&self) -> Result<u64> {
        let total = alumni::Entity::find()
            .count(&self.conn)
            .await
            .context("Failed to count alumni")?;

        Ok(total)
    }

    fn to_active(input: AlumniInput, now: &str) -> alumni::ActiveModel {
        alumni::ActiveModel {
            name: Set(input.name),
            batch: Set(input.batch),
            email: Set(input.email),
            phone: Set(input.phone),
            company: Set(input.company),
            bio: Set(input.bio),
            created_at: Set(now.to_string()),
            ..Default::default()
        }
    }
}
