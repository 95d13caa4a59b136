use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Application state machine: `Pending` is initial, `Approved` and
/// `Rejected` are terminal. A terminal status never reverts.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    #[sea_orm(string_value = "pending")]
    Pending,

    #[sea_orm(string_value = "approved")]
    Approved,

    #[sea_orm(string_value = "rejected")]
    Rejected,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "mentor_applications")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Applicant may be anonymous.
    pub user_id: Option<i32>,

    pub name: String,

    pub email: String,

    pub field: String,

    pub note: String,

    pub status: ApplicationStatus,

    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
