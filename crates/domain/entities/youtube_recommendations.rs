use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::infra::db::postgres::schema::youtube_recommendations;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable, PartialEq)]
#[diesel(table_name = youtube_recommendations)]
pub struct YoutubeRecommendationEntity {
    pub id: i32,
    pub course_id: String,
    pub title: String,
    pub video_id: String,
    pub created_at: DateTime<Utc>,
}
