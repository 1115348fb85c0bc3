use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// 配置界面提供的题目数量选项
pub const QUESTION_COUNT_CHOICES: [u32; 4] = [5, 10, 25, 50];
/// 题库单次最多返回的题目数量
pub const MAX_QUESTION_COUNT: u32 = 50;
/// 计时器步长（秒）
pub const TIMER_STEP_SECS: u32 = 5;
/// 计时器上限（秒）
pub const MAX_TIMER_SECS: u32 = 60;

/// 难度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    /// 题库 API 使用的参数值
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    /// 显示名称
    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("未知难度: {}", other)),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 题型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    /// 多选一
    Multiple,
    /// 判断题
    Boolean,
}

impl QuestionType {
    pub const ALL: [QuestionType; 2] = [QuestionType::Multiple, QuestionType::Boolean];

    pub fn as_str(self) -> &'static str {
        match self {
            QuestionType::Multiple => "multiple",
            QuestionType::Boolean => "boolean",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            QuestionType::Multiple => "Multiple Choice",
            QuestionType::Boolean => "True/False",
        }
    }
}

impl FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "multiple" => Ok(QuestionType::Multiple),
            "boolean" => Ok(QuestionType::Boolean),
            other => Err(format!("未知题型: {}", other)),
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 测验配置
///
/// 会话开始后不可变。序列化字段名与网页版保存的 `quizSettings` 一致。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizConfiguration {
    /// 题目数量
    #[serde(rename = "amount", deserialize_with = "deserialize_amount")]
    pub question_count: u32,
    /// 分类 ID，`None` 表示任意分类
    #[serde(rename = "category", default, deserialize_with = "deserialize_category")]
    pub category_id: Option<u32>,
    #[serde(default, deserialize_with = "deserialize_blank_as_none")]
    pub difficulty: Option<Difficulty>,
    #[serde(rename = "type", default, deserialize_with = "deserialize_blank_as_none")]
    pub question_type: Option<QuestionType>,
    /// 每题限时（秒），0 表示不计时
    #[serde(rename = "timerDuration", default, deserialize_with = "deserialize_timer")]
    pub timer_seconds: u32,
}

impl Default for QuizConfiguration {
    fn default() -> Self {
        Self {
            question_count: 10,
            category_id: None,
            difficulty: None,
            question_type: None,
            timer_seconds: 0,
        }
    }
}

impl QuizConfiguration {
    /// 校验配置是否可以用来开始会话
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.question_count == 0 || self.question_count > MAX_QUESTION_COUNT {
            return Err(ConfigError::QuestionCountOutOfRange(self.question_count));
        }
        if self.timer_seconds > MAX_TIMER_SECS || self.timer_seconds % TIMER_STEP_SECS != 0 {
            return Err(ConfigError::InvalidTimer(self.timer_seconds));
        }
        Ok(())
    }

    pub fn timer_enabled(&self) -> bool {
        self.timer_seconds > 0
    }

    /// 拉题请求参数，未设置的可选项不出现
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("amount", self.question_count.to_string())];
        if let Some(category) = self.category_id {
            params.push(("category", category.to_string()));
        }
        if let Some(difficulty) = self.difficulty {
            params.push(("difficulty", difficulty.as_str().to_string()));
        }
        if let Some(question_type) = self.question_type {
            params.push(("type", question_type.as_str().to_string()));
        }
        params
    }
}

impl fmt::Display for QuizConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} 题", self.question_count)?;
        match self.category_id {
            Some(id) => write!(f, " | 分类 #{}", id)?,
            None => write!(f, " | 任意分类")?,
        }
        match self.difficulty {
            Some(d) => write!(f, " | {}", d)?,
            None => write!(f, " | 任意难度")?,
        }
        match self.question_type {
            Some(t) => write!(f, " | {}", t)?,
            None => write!(f, " | 任意题型")?,
        }
        if self.timer_enabled() {
            write!(f, " | 每题 {} 秒", self.timer_seconds)
        } else {
            write!(f, " | 不计时")
        }
    }
}

// 网页版的 <select> 会把数字保存为字符串，空字符串表示 "任意"
struct LenientNumberVisitor;

impl<'de> serde::de::Visitor<'de> for LenientNumberVisitor {
    type Value = Option<u32>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("an integer, numeric string, empty string or null")
    }

    fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        trimmed.parse().map(Some).map_err(E::custom)
    }

    fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        u32::try_from(value).map(Some).map_err(E::custom)
    }

    fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        u32::try_from(value).map(Some).map_err(E::custom)
    }

    fn visit_none<E>(self) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Ok(None)
    }

    fn visit_unit<E>(self) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Ok(None)
    }

    fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(self)
    }
}

fn deserialize_category<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(LenientNumberVisitor)
}

fn deserialize_amount<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer
        .deserialize_any(LenientNumberVisitor)?
        .ok_or_else(|| serde::de::Error::custom("amount 不能为空"))
}

// 空值视为不计时
fn deserialize_timer<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(deserializer
        .deserialize_any(LenientNumberVisitor)?
        .unwrap_or(0))
}

// 网页版把 "任意" 保存为空字符串
fn deserialize_blank_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr<Err = String>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        Some(s) if !s.trim().is_empty() => s.parse().map(Some).map_err(serde::de::Error::custom),
        _ => Ok(None),
    }
}
