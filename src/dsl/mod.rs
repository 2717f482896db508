pub mod parser;
pub mod schema;
pub mod validator;

pub use parser::{load_workflow, parse_workflow, DslFormat};
pub use schema::*;
pub use validator::validate_workflow;
