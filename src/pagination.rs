use serde::{Deserialize, Serialize};

/// Common `?limit=&offset=` query parameters.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    10
}

impl Pagination {
    /// Clamp to sane bounds so a hostile `limit` cannot dump the table.
    pub fn clamped(self) -> Self {
        Self {
            limit: self.limit.clamp(1, 100),
            offset: self.offset.max(0),
        }
    }
}

/// Paginated response envelope: `{items, total, limit, offset}`.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_query_is_empty() {
        let p: Pagination = serde_json::from_str("{}").expect("deserialize");
        assert_eq!(p.limit, 10);
        assert_eq!(p.offset, 0);
    }

    #[test]
    fn clamp_bounds_limit_and_offset() {
        let p = Pagination {
            limit: 10_000,
            offset: -5,
        }
        .clamped();
        assert_eq!(p.limit, 100);
        assert_eq!(p.offset, 0);

        let p = Pagination {
            limit: 0,
            offset: 3,
        }
        .clamped();
        assert_eq!(p.limit, 1);
        assert_eq!(p.offset, 3);
    }
}
