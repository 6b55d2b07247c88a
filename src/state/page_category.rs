use serde::{Deserialize, Serialize};

/// Coarse classification of what a page contains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PageCategory {
    /// Listing or navigation page linking to many items
    Index,
    /// Page about one single item (article, product, post)
    Detail,
    Search,
    Media,
    #[default]
    Unknown,
}

impl PageCategory {
    pub fn is_detail(&self) -> bool {
        matches!(self, Self::Detail)
    }

    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Index => "index",
            Self::Detail => "detail",
            Self::Search => "search",
            Self::Media => "media",
            Self::Unknown => "unknown",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "index" => Some(Self::Index),
            "detail" => Some(Self::Detail),
            "search" => Some(Self::Search),
            "media" => Some(Self::Media),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }
}
