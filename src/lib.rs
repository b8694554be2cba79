pub mod config;
pub mod interpreter;
pub mod models;
pub mod util;

pub use config::InterpreterConfig;
pub use interpreter::{CompletionTransport, QueryInterpreter};
pub use models::{BodyType, CarFilters, SearchResult};
