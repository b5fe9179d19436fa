use sea_orm::entity::prelude::*;

/// The shared identity collection. Subtypes are told apart by `kind`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// `User`, `Applicant` or `Instructor`
    pub kind: String,

    #[sea_orm(unique)]
    pub username: String,

    pub first_name: String,

    pub last_name: String,

    pub email: String,

    /// PBKDF2 hash (base64), or plaintext when no salt was ever drawn
    pub password: String,

    pub salt: Option<String>,

    pub provider: String,

    /// External account id, used to find returning provider logins.
    pub provider_subject: Option<String>,

    pub provider_data: Json,

    pub additional_providers_data: Json,

    pub roles: Json,

    /// Subtype-specific fields as a JSON document.
    pub details: Json,

    pub revision: i64,

    pub created: String,

    pub updated: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
