mod accident_repository;
mod accident_type_repository;
mod rule_repository;

pub use accident_repository::{AccidentRepository, PgAccidentRepository};
pub use accident_type_repository::{AccidentTypeRepository, PgAccidentTypeRepository};
pub use rule_repository::{PgRuleRepository, RuleRepository};
