use crate::schema::{artist_links, artists};

use diesel::prelude::*;

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = artists)]
pub struct ArtistRow {
  pub id: String,
  pub name: String,
  pub kind: String,
  pub bio: Option<String>,
  pub version: i64,
  pub created_at: String,
  pub updated_at: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = artists)]
pub struct NewArtistRow {
  pub id: String,
  pub name: String,
  pub kind: String,
  pub bio: Option<String>,
  pub version: i64,
}

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = artist_links)]
pub struct LinkRow {
  pub id: String,
  pub artist_id: String,
  pub side: String,
  pub counterpart_id: String,
  pub counterpart_name: String,
  pub year_from: String,
  pub year_to: String,
  pub position: i32,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = artist_links)]
pub struct NewLinkRow {
  pub id: String,
  pub artist_id: String,
  pub side: String,
  pub counterpart_id: String,
  pub counterpart_name: String,
  pub year_from: String,
  pub year_to: String,
  pub position: i32,
}
