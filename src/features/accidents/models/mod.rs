mod accident;
mod accident_type;
mod rule;

pub use accident::{Accident, AccidentStatus};
pub use accident_type::AccidentType;
pub use rule::Rule;
