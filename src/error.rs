use thiserror::Error;

/// 布局引擎的错误类型
///
/// 无法放置的单词和退化输入（空列表、零面积视口）不属于错误，
/// 它们只会让结果里少几个单词。
#[derive(Debug, Error)]
pub enum Error {
    #[error("Font error: {0}")]
    Font(String),
    #[error("Render error: {0}")]
    Render(String),
    #[error("Invalid config: {0}")]
    Config(String),
    #[error("Invalid input: {0}")]
    Input(String),
}
