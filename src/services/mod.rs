pub mod category_provider;
pub mod config_store;
pub mod question_provider;

pub use category_provider::{CategoryLoad, CategoryProvider};
pub use config_store::ConfigurationStore;
pub use question_provider::{QuestionProvider, QuestionSource};
