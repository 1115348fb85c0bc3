use serde::{Deserialize, Serialize};

/// 一次作答
///
/// 超时是单独的变体，因此无论题目的正确答案是什么文本都不会被判为正确。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Submission {
    /// 玩家选择的答案
    Answer(String),
    /// 倒计时归零
    Timeout,
}

impl Submission {
    /// 玩家选择的答案文本，超时时为 `None`
    pub fn answer(&self) -> Option<&str> {
        match self {
            Submission::Answer(text) => Some(text),
            Submission::Timeout => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Submission::Timeout)
    }
}

impl From<&str> for Submission {
    fn from(text: &str) -> Self {
        Submission::Answer(text.to_string())
    }
}

impl From<String> for Submission {
    fn from(text: String) -> Self {
        Submission::Answer(text)
    }
}

/// 单道题目
///
/// 所有文本都是题库返回的原始内容（未清洗），显示前必须经过 `utils::html::to_plain_text`。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    #[serde(rename = "question")]
    pub prompt: String,
    pub correct_answer: String,
    #[serde(default)]
    pub incorrect_answers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub question_type: Option<String>,
}

impl Question {
    pub fn new(
        prompt: impl Into<String>,
        correct_answer: impl Into<String>,
        incorrect_answers: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            correct_answer: correct_answer.into(),
            incorrect_answers: incorrect_answers.into_iter().map(Into::into).collect(),
            category: None,
            difficulty: None,
            question_type: None,
        }
    }

    /// 判断答案是否正确（精确匹配）
    pub fn is_correct(&self, answer: &str) -> bool {
        answer == self.correct_answer
    }

    /// 判分：只有与正确答案完全相同的作答得分
    pub fn judge(&self, submission: &Submission) -> bool {
        submission.answer().is_some_and(|answer| self.is_correct(answer))
    }

    /// 正确答案在前、错误答案按原顺序在后
    pub fn all_answers(&self) -> Vec<String> {
        std::iter::once(self.correct_answer.clone())
            .chain(self.incorrect_answers.iter().cloned())
            .collect()
    }
}

/// 一次会话的题目集合
///
/// 题库返回的数量少于请求数量时照常使用，不做补齐。
pub type QuestionSet = Vec<Question>;

/// 拉题接口响应
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionResponse {
    pub response_code: i64,
    #[serde(default)]
    pub results: Vec<Question>,
}

impl QuestionResponse {
    /// response_code 为 0 表示成功
    pub fn is_success(&self) -> bool {
        self.response_code == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_provider_payload() {
        let json = r#"{
            "response_code": 0,
            "results": [{
                "type": "multiple",
                "difficulty": "easy",
                "category": "Geography",
                "question": "What is the capital of France?",
                "correct_answer": "Paris",
                "incorrect_answers": ["Rome", "Berlin", "Madrid"]
            }]
        }"#;
        let response: QuestionResponse = serde_json::from_str(json).unwrap();
        assert!(response.is_success());
        let question = &response.results[0];
        assert_eq!(question.prompt, "What is the capital of France?");
        assert_eq!(question.category.as_deref(), Some("Geography"));
        assert_eq!(question.question_type.as_deref(), Some("multiple"));
        assert_eq!(question.all_answers().len(), 4);
    }

    #[test]
    fn test_no_results_payload_has_empty_results() {
        let response: QuestionResponse =
            serde_json::from_str(r#"{"response_code": 1, "results": []}"#).unwrap();
        assert!(!response.is_success());
        assert!(response.results.is_empty());
    }

    #[test]
    fn test_timeout_never_matches() {
        let question = Question::new("Q", "Paris", ["Rome", "Berlin"]);
        assert!(question.judge(&"Paris".into()));
        assert!(!question.judge(&"paris".into()));
        assert!(!question.judge(&Submission::Timeout));

        // 正确答案恰好是 "timeout" 时，超时也不得分
        let literal = Question::new("Which word means time has run out?", "timeout", ["pause"]);
        assert!(literal.judge(&"timeout".into()));
        assert!(!literal.judge(&Submission::Timeout));
    }
}
