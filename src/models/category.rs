use serde::{Deserialize, Serialize};

/// 题目分类
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: u32,
    pub name: String,
}

/// 分类接口响应
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryResponse {
    pub trivia_categories: Vec<Category>,
}

/// 按 ID 查找分类名称
pub fn category_name(categories: &[Category], id: u32) -> Option<&str> {
    categories
        .iter()
        .find(|c| c.id == id)
        .map(|c| c.name.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_category_list() {
        let json = r#"{"trivia_categories":[{"id":9,"name":"General Knowledge"},{"id":22,"name":"Geography"}]}"#;
        let response: CategoryResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.trivia_categories.len(), 2);
        assert_eq!(category_name(&response.trivia_categories, 22), Some("Geography"));
        assert_eq!(category_name(&response.trivia_categories, 1), None);
    }
}
