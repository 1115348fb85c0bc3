//! 答案顺序
//!
//! 每道题进入时洗牌一次，之后显示都使用同一顺序。

use rand::seq::SliceRandom;
use rand::Rng;

use crate::models::Question;

/// 返回正确答案与错误答案的一个均匀随机排列（Fisher–Yates）
pub fn shuffle_answers<R: Rng + ?Sized>(question: &Question, rng: &mut R) -> Vec<String> {
    let mut answers = question.all_answers();
    answers.shuffle(rng);
    answers
}
