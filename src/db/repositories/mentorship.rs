use anyhow::{Context, Result};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};

use crate::entities::mentor_applications::{self, ApplicationStatus};
use crate::entities::mentorships;

/// Outcome of an approve/reject transition attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecisionOutcome {
    Decided,
    NotFound,
    /// Application already reached a terminal state; carries that state.
    AlreadyDecided(ApplicationStatus),
}

#[derive(Debug, Clone)]
pub struct NewApplication {
    pub user_id: Option<i32>,
    pub name: String,
    pub email: String,
    pub field: String,
    pub note: String,
}

#[derive(Debug, Clone)]
pub struct MentorshipInput {
    pub title: String,
    pub alumni_id: i32,
    pub student_name: String,
    pub field: String,
    pub note: String,
}

pub struct MentorshipRepository {
    conn: DatabaseConnection,
}

impl MentorshipRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    // ----- mentorship records -----

    pub async fn list(&self) -> Result<Vec<mentorships::Model>> {
        let rows = mentorships::Entity::find()
            .order_by_desc(mentorships::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to list mentorships")?;

        Ok(rows)
    }

    pub async fn get(&self, id: i32) -> Result<Option<mentorships::Model>> {
        let row = mentorships::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to get mentorship")?;

        Ok(row)
    }

    pub async fn create(&self, input: MentorshipInput) -> Result<mentorships::Model> {
        let active = mentorships::ActiveModel {
            title: Set(input.title),
            alumni_id: Set(input.alumni_id),
            student_name: Set(input.student_name),
            field: Set(input.field),
            note: Set(input.note),
            approved: Set(true),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert mentorship")?;

        Ok(model)
    }

    pub async fn update(
        &self,
        id: i32,
        title: String,
        field: String,
        note: String,
    ) -> Result<Option<mentorships::Model>> {
        let Some(row) = mentorships::Entity::find_by_id(id).one(&self.conn).await? else {
            return Ok(None);
        };

        let mut active: mentorships::ActiveModel = row.into();
        active.title = Set(title);
        active.field = Set(field);
        active.note = Set(note);
        let model = active.update(&self.conn).await?;

        Ok(Some(model))
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let res = mentorships::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete mentorship")?;

        Ok(res.rows_affected > 0)
    }

    // ----- mentor applications -----

    pub async fn submit_application(
        &self,
        input: NewApplication,
    ) -> Result<mentor_applications::Model> {
        let active = mentor_applications::ActiveModel {
            user_id: Set(input.user_id),
            name: Set(input.name),
            email: Set(input.email),
            field: Set(input.field),
            note: Set(input.note),
            status: Set(ApplicationStatus::Pending),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert mentor application")?;

        Ok(model)
    }

    pub async fn list_applications(&self) -> Result<Vec<mentor_applications::Model>> {
        let rows = mentor_applications::Entity::find()
            .order_by_desc(mentor_applications::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to list mentor applications")?;

        Ok(rows)
    }

    /// Approve a pending application and materialize a mentorship record.
    ///
    /// The status flip is a conditional update (`status = 'pending'` in the
    /// WHERE clause) issued as the transaction's first statement, so
    /// concurrent approve calls serialize on the write lock instead of
    /// deadlocking on a shared-to-reserved upgrade. The flip shares one
    /// transaction with the mentorship insert: the same application
    /// produces exactly one mentorship, with the losers seeing
    /// `AlreadyDecided`.
    pub async fn approve_application(&self, id: i32) -> Result<DecisionOutcome> {
        let txn = self
            .conn
            .begin()
            .await
            .context("Failed to begin approval transaction")?;

        let flipped = mentor_applications::Entity::update_many()
            .col_expr(
                mentor_applications::Column::Status,
                Expr::value(ApplicationStatus::Approved),
            )
            .filter(mentor_applications::Column::Id.eq(id))
            .filter(mentor_applications::Column::Status.eq(ApplicationStatus::Pending))
            .exec(&txn)
            .await
            .context("Failed to update application status")?;

        if flipped.rows_affected == 0 {
            // Re-read after the flip so a concurrent loser reports the
            // status the winner installed, not a stale `Pending`.
            let outcome = match mentor_applications::Entity::find_by_id(id).one(&txn).await? {
                Some(app) => DecisionOutcome::AlreadyDecided(app.status),
                None => DecisionOutcome::NotFound,
            };
            txn.rollback().await.ok();
            return Ok(outcome);
        }

        let Some(app) = mentor_applications::Entity::find_by_id(id).one(&txn).await? else {
            txn.rollback().await.ok();
            return Ok(DecisionOutcome::NotFound);
        };

        let mentorship = mentorships::ActiveModel {
            title: Set(format!("Mentor: {}", app.name)),
            alumni_id: Set(app.user_id.unwrap_or(0)),
            student_name: Set(String::new()),
            field: Set(app.field),
            note: Set(app.note),
            approved: Set(true),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };
        mentorship
            .insert(&txn)
            .await
            .context("Failed to insert mentorship for approved application")?;

        txn.commit()
            .await
            .context("Failed to commit approval transaction")?;

        Ok(DecisionOutcome::Decided)
    }

    /// Reject a pending application. Same conditional-update discipline as
    /// approval, but no derived record is created.
    pub async fn reject_application(&self, id: i32) -> Result<DecisionOutcome> {
        let flipped = mentor_applications::Entity::update_many()
            .col_expr(
                mentor_applications::Column::Status,
                Expr::value(ApplicationStatus::Rejected),
            )
            .filter(mentor_applications::Column::Id.eq(id))
            .filter(mentor_applications::Column::Status.eq(ApplicationStatus::Pending))
            .exec(&self.conn)
            .await
            .context("Failed to update application status")?;

        if flipped.rows_affected == 0 {
            let outcome = match mentor_applications::Entity::find_by_id(id)
                .one(&self.conn)
                .await?
            {
                Some(app) => DecisionOutcome::AlreadyDecided(app.status),
                None => DecisionOutcome::NotFound,
            };
            return Ok(outcome);
        }

        Ok(DecisionOutcome::Decided)
    }

    /// Destructive import support: clear and refill the mentorships table.
    pub async fn replace_all(&self, rows: Vec<MentorshipInput>) -> Result<usize> {
        let txn = self.conn.begin().await?;

        mentorships::Entity::delete_many().exec(&txn).await?;

        let count = rows.len();
        if !rows.is_empty() {
            let now = chrono::Utc::now().to_rfc3339();
            let models: Vec<mentorships::ActiveModel> = rows
                .into_iter()
                .map(|r| mentorships::ActiveModel {
                    title: Set(r.title),
                    alumni_id: Set(r.alumni_id),
                    student_name: Set(r.student_name),
                    field: Set(r.field),
                    note: Set(r.note),
                    approved: Set(true),
                    created_at: Set(now.clone()),
                    ..Default::default()
                })
                .collect();

            mentorships::Entity::insert_many(models).exec(&txn).await?;
        }

        txn.commit().await?;
        Ok(count)
    }
}
