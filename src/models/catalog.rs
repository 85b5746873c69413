use serde::{Deserialize, Serialize};

use super::{DirectorId, Patch};

/// Film genre, seeded reference data
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Genre {
    pub id: i64,
    pub name: String,
}

/// MPA rating, seeded reference data
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Mpa {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Director {
    pub id: DirectorId,
    pub name: String,
}

/// Payload for creating a director
#[derive(Debug, Clone, Deserialize)]
pub struct NewDirector {
    pub name: String,
}

/// Partial update of a director
#[derive(Debug, Clone, Deserialize)]
pub struct DirectorPatch {
    pub id: DirectorId,
    #[serde(default)]
    pub name: Patch<String>,
}

/// Reference to another entity by id, as it appears in film payloads
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdRef {
    pub id: i64,
}
