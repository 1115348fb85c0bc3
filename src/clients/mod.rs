pub mod trivia_client;

pub use trivia_client::{TriviaApi, TriviaClient};
