use std::hash::{Hash, Hasher};

use sqlx::FromRow;

/// Cited regulation or article, many-to-many with accidents.
///
/// Identity is the `id` alone: editing a rule's text must not change its
/// membership in the rule sets of existing accidents.
#[derive(Debug, Clone, FromRow)]
pub struct Rule {
    pub id: i32,
    pub name: String,
}

impl Rule {
    pub fn new(id: i32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Rule {}

impl Hash for Rule {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
