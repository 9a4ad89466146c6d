use serde::Serialize;

/// 界面侧看到的查询状态 `{data, loading, error}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchState<T> {
    pub data: T,
    pub loading: bool,
    pub error: Option<String>,
}

impl<T: Default> Default for FetchState<T> {
    fn default() -> Self {
        Self {
            data: T::default(),
            loading: false,
            error: None,
        }
    }
}

/// 列表渲染必须处理的三种状态（加载中 / 出错 / 空）以及就绪
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListView {
    Loading,
    Error(String),
    Empty,
    Ready(usize),
}

impl<T> FetchState<Vec<T>> {
    /// 加载优先于错误，错误优先于空列表
    pub fn view(&self) -> ListView {
        if self.loading {
            ListView::Loading
        } else if let Some(error) = &self.error {
            ListView::Error(error.clone())
        } else if self.data.is_empty() {
            ListView::Empty
        } else {
            ListView::Ready(self.data.len())
        }
    }
}
