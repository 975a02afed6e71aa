use chrono::{DateTime, Utc};

/// An image record as stored in the primary database. Scalar metadata is
/// optional except `identifier`, which is the stable key the search index
/// stores documents under.
#[derive(sqlx::FromRow, Debug, Clone)]
pub struct ImageRow {
    pub id: i32,
    pub identifier: String,
    pub title: Option<String>,
    pub creator: Option<String>,
    pub creator_url: Option<String>,
    pub url: Option<String>,
    pub provider: Option<String>,
    pub source: Option<String>,
    pub license: Option<String>,
    pub foreign_landing_url: Option<String>,
    pub created_on: Option<DateTime<Utc>>,
}

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct TagRow {
    pub name: String,
}
