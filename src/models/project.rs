use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A tracked project as stored and exchanged over HTTP.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Project {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub due_date: Option<DateTime<Utc>>,
    pub status: String,
}

/// The client-writable fields of a project.
///
/// Any `id` sent in a request body is ignored; ids come from the store or the path.
/// Text fields that are absent or `null` decode as empty strings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProjectInput {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub status: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl ProjectInput {
    pub fn with_id(self, id: i32) -> Project {
        Project {
            id,
            name: self.name,
            description: self.description,
            due_date: self.due_date,
            status: self.status,
        }
    }

    /// `due_date` as the store's zone-less TIMESTAMP.
    pub fn due_date_naive(&self) -> Option<NaiveDateTime> {
        self.due_date.map(|d| d.naive_utc())
    }
}

/// Row shape of the `projects` table. TIMESTAMP carries no zone, so it is read naive.
/// Text columns are nullable for rows written outside this service.
#[derive(sqlx::FromRow, Debug)]
pub struct ProjectRow {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDateTime>,
    pub status: Option<String>,
}

impl From<ProjectRow> for Project {
    fn from(row: ProjectRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description.unwrap_or_default(),
            due_date: row.due_date.map(|d| d.and_utc()),
            status: row.status.unwrap_or_default(),
        }
    }
}
