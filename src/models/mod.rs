pub mod category;
pub mod question;
pub mod quiz_config;

pub use category::{category_name, Category, CategoryResponse};
pub use question::{Question, QuestionResponse, QuestionSet, Submission};
pub use quiz_config::{
    Difficulty, QuestionType, QuizConfiguration, MAX_TIMER_SECS, QUESTION_COUNT_CHOICES,
    TIMER_STEP_SECS,
};
