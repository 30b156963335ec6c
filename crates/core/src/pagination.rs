use serde::{Deserialize, Serialize};

/// Pagination block returned alongside every notification list page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub pages: u32,
}

impl Pagination {
    pub fn has_more(&self) -> bool {
        self.page < self.pages
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 20,
            total: 0,
            pages: 0,
        }
    }
}
