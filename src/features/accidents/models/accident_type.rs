use std::hash::{Hash, Hasher};

use sqlx::FromRow;

/// Classification lookup for accidents.
///
/// Equality and hashing look at `id` only. A renamed type must keep matching
/// the references accidents already hold, so `name` is left out on purpose.
#[derive(Debug, Clone, FromRow)]
pub struct AccidentType {
    pub id: i32,
    pub name: String,
}

impl AccidentType {
    pub fn new(id: i32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    /// Reference carrying only the identifier, resolved later by the service
    pub fn reference(id: i32) -> Self {
        Self::new(id, String::new())
    }
}

impl PartialEq for AccidentType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for AccidentType {}

impl Hash for AccidentType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
