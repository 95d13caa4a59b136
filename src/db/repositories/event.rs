use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set, TransactionTrait,
};

use crate::entities::events;

#[derive(Debug, Clone, Default)]
pub struct EventInput {
    pub title: String,
    pub date: String,
    pub venue: String,
    pub description: String,
}

pub struct EventRepository {
    conn: DatabaseConnection,
}

impl EventRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list(&self) -> Result<Vec<events::Model>> {
        let rows = events::Entity::find()
            .order_by_desc(events::Column::Date)
            .all(&self.conn)
            .await
            .context("Failed to list events")?;

        Ok(rows)
    }

    pub async fn get(&self, id: i32) -> Result<Option<events::Model>> {
        let row = events::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to get event")?;

        Ok(row)
    }

    pub async fn create(&self, input: EventInput) -> Result<events::Model> {
        let model = Self::to_active(input, &chrono::Utc::now().to_rfc3339())
            .insert(&self.conn)
            .await
            .context("Failed to insert event")?;

        Ok(model)
    }

    pub async fn update(&self, id: i32, input: EventInput) -> Result<Option<events::Model>> {
        let Some(row) = events::Entity::find_by_id(id).one(&self.conn).await? else {
            return Ok(None);
        };

        let mut active: events::ActiveModel = row.into();
        active.title = Set(input.title);
        active.date = Set(input.date);
        active.venue = Set(input.venue);
        active.description = Set(input.description);
        let model = active.update(&self.conn).await?;

        Ok(Some(model))
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let res = events::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete event")?;

        Ok(res.rows_affected > 0)
    }

    /// Destructive import support: clear and refill the events table.
    pub async fn replace_all(&self, rows: Vec<EventInput>) -> Result<usize> {
        let txn = self.conn.begin().await?;

        events::Entity::delete_many().exec(&txn).await?;

        let count = rows.len();
        if !rows.is_empty() {
            let now = chrono::Utc::now().to_rfc3339();
            let models: Vec<events::ActiveModel> = rows
                .into_iter()
                .map(|r| Self::to_active(r, &now))
                .collect();
            events::Entity::insert_many(models).exec(&txn).await?;
        }

        txn.commit().await?;
        Ok(count)
    }

    fn to_active(input: EventInput, now: &str) -> events::ActiveModel {
        events::ActiveModel {
            title: Set(input.title),
            date: Set(input.date),
            venue: Set(input.venue),
            description: Set(input.description),
            created_at: Set(now.to_string()),
            ..Default::default()
        }
    }
}
