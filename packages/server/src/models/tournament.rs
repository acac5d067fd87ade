use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::entity::tournament;

/// A tournament products can be attached to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tournament {
    pub id: i32,
    pub name: String,
    pub is_active: bool,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
}

impl From<tournament::Model> for Tournament {
    fn from(m: tournament::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            is_active: m.is_active,
            sort_order: m.sort_order,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct TournamentResponse {
    #[schema(example = 3)]
    pub id: i32,
    #[schema(example = "Spring Open 2026")]
    pub name: String,
    pub is_active: bool,
    pub sort_order: i32,
}

impl From<Tournament> for TournamentResponse {
    fn from(t: Tournament) -> Self {
        Self {
            id: t.id,
            name: t.name,
            is_active: t.is_active,
            sort_order: t.sort_order,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct TournamentListResponse {
    pub tournaments: Vec<TournamentResponse>,
}

impl From<Vec<Tournament>> for TournamentListResponse {
    fn from(tournaments: Vec<Tournament>) -> Self {
        Self {
            tournaments: tournaments.into_iter().map(Into::into).collect(),
        }
    }
}
