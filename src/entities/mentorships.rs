use sea_orm::entity::prelude::*;
use serde::Serialize;

/// Mentorship record. Either entered directly or materialized from an
/// approved mentor application; its lifecycle is independent of the
/// application afterwards.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "mentorships")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub title: String,

    /// Owning user id, 0 for anonymous applicants.
    pub alumni_id: i32,

    pub student_name: String,

    pub field: String,

    pub note: String,

    pub approved: bool,

    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
