use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::SecurityConfig;
use crate::entities::{alumni, events, mentor_applications, mentorships};

pub mod migrator;
pub mod repositories;

pub use repositories::alumni::AlumniInput;
pub use repositories::event::EventInput;
pub use repositories::mentorship::{DecisionOutcome, MentorshipInput, NewApplication};
pub use repositories::reset_token::ConsumeOutcome;
pub use repositories::user::User;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.starts_with(":memory:") && !db_url.contains("memory") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn reset_token_repo(&self) -> repositories::reset_token::ResetTokenRepository {
        repositories::reset_token::ResetTokenRepository::new(self.conn.clone())
    }

    fn alumni_repo(&self) -> repositories::alumni::AlumniRepository {
        repositories::alumni::AlumniRepository::new(self.conn.clone())
    }

    fn event_repo(&self) -> repositories::event::EventRepository {
        repositories::event::EventRepository::new(self.conn.clone())
    }

    fn mentorship_repo(&self) -> repositories::mentorship::MentorshipRepository {
        repositories::mentorship::MentorshipRepository::new(self.conn.clone())
    }

    // ========== Users ==========

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.user_repo().get_by_username(username).await
    }

    pub async fn get_user_by_id(&self, id: i32) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.user_repo().get_by_email(email).await
    }

    /// Returns `Ok(None)` on duplicate username.
    pub async fn create_user(
        &self,
        username: &str,
        password: &str,
        role: crate::entities::users::Role,
        email: Option<&str>,
        security: &SecurityConfig,
    ) -> Result<Option<User>> {
        self.user_repo()
            .create(username, password, role, email, security)
            .await
    }

    pub async fn verify_credentials(
        &self,
        username: &str,
        password: &str,
        security: &SecurityConfig,
    ) -> Result<Option<User>> {
        self.user_repo()
            .verify_credentials(username, password, security)
            .await
    }

    pub async fn update_user_password(
        &self,
        user_id: i32,
        new_password: &str,
        security: &SecurityConfig,
    ) -> Result<()> {
        self.user_repo()
            .update_password(user_id, new_password, security)
            .await
    }

    // ========== Reset tokens ==========

    pub async fn insert_reset_token(
        &self,
        user_id: i32,
        token: &str,
        expires_at: &str,
    ) -> Result<()> {
        self.reset_token_repo()
            .insert(user_id, token, expires_at)
            .await
    }

    pub async fn consume_reset_token(
        &self,
        token: &str,
        new_password_hash: &str,
    ) -> Result<ConsumeOutcome> {
        self.reset_token_repo()
            .consume(token, new_password_hash)
            .await
    }

    pub async fn count_reset_tokens(&self, user_id: i32) -> Result<u64> {
        self.reset_token_repo().count_for_user(user_id).await
    }

    // ========== Alumni ==========

    pub async fn list_alumni(&self) -> Result<Vec<alumni::Model>> {
        self.alumni_repo().list().await
    }

    pub async fn get_alumni(&self, id: i32) -> Result<Option<alumni::Model>> {
        self.alumni_repo().get(id).await
    }

    pub async fn get_alumni_by_email(&self, email: &str) -> Result<Option<alumni::Model>> {
        self.alumni_repo().get_by_email(email).await
    }

    pub async fn add_alumni(&self, input: AlumniInput) -> Result<alumni::Model> {
        self.alumni_repo().create(input).await
    }

    pub async fn update_alumni(
        &self,
        id: i32,
        input: AlumniInput,
    ) -> Result<Option<alumni::Model>> {
        self.alumni_repo().update(id, input).await
    }

    pub async fn delete_alumni(&self, id: i32) -> Result<bool> {
        self.alumni_repo().delete(id).await
    }

    pub async fn insert_alumni_batch(&self, rows: Vec<AlumniInput>) -> Result<usize> {
        self.alumni_repo().insert_many(rows).await
    }

    pub async fn replace_alumni(&self, rows: Vec<AlumniInput>) -> Result<usize> {
        self.alumni_repo().replace_all(rows).await
    }

    pub async fn alumni_counts_by_batch(&self) -> Result<Vec<(String, i64)>> {
        self.alumni_repo().counts_by_batch().await
    }

    pub async fn alumni_count(&self) -> Result<u64> {
        self.alumni_repo().count().await
    }

    // ========== Events ==========

    pub async fn list_events(&self) -> Result<Vec<events::Model>> {
        self.event_repo().list().await
    }

    pub async fn get_event(&self, id: i32) -> Result<Option<events::Model>> {
        self.event_repo().get(id).await
    }

    pub async fn add_event(&self, input: EventInput) -> Result<events::Model> {
        self.event_repo().create(input).await
    }

    pub async fn update_event(&self, id: i32, input: EventInput) -> Result<Option<events::Model>> {
        self.event_repo().update(id, input).await
    }

    pub async fn delete_event(&self, id: i32) -> Result<bool> {
        self.event_repo().delete(id).await
    }

    pub async fn replace_events(&self, rows: Vec<EventInput>) -> Result<usize> {
        self.event_repo().replace_all(rows).await
    }

    // ========== Mentorships & applications ==========

    pub async fn list_mentorships(&self) -> Result<Vec<mentorships::Model>> {
        self.mentorship_repo().list().await
    }

    pub async fn get_mentorship(&self, id: i32) -> Result<Option<mentorships::Model>> {
        self.mentorship_repo().get(id).await
    }

    pub async fn add_mentorship(&self, input: MentorshipInput) -> Result<mentorships::Model> {
        self.mentorship_repo().create(input).await
    }

    pub async fn update_mentorship(
        &self,
        id: i32,
        title: String,
        field: String,
        note: String,
    ) -> Result<Option<mentorships::Model>> {
        self.mentorship_repo().update(id, title, field, note).await
    }

    pub async fn delete_mentorship(&self, id: i32) -> Result<bool> {
        self.mentorship_repo().delete(id).await
    }

    pub async fn replace_mentorships(&self, rows: Vec<MentorshipInput>) -> Result<usize> {
        self.mentorship_repo().replace_all(rows).await
    }

    pub async fn submit_mentor_application(
        &self,
        input: NewApplication,
    ) -> Result<mentor_applications::Model> {
        self.mentorship_repo().submit_application(input).await
    }

    pub async fn list_mentor_applications(&self) -> Result<Vec<mentor_applications::Model>> {
        self.mentorship_repo().list_applications().await
    }

    pub async fn approve_mentor_application(&self, id: i32) -> Result<DecisionOutcome> {
        self.mentorship_repo().approve_application(id).await
    }

    pub async fn reject_mentor_application(&self, id: i32) -> Result<DecisionOutcome> {
        self.mentorship_repo().reject_application(id).await
    }
}
