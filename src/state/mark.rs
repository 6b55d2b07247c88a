use serde::{Deserialize, Serialize};
use std::fmt;

/// Pipeline stages that leave a mark on the pages they process
///
/// A mark's value on a page is the batch id of the run that set it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mark {
    Inject,
    Generate,
    Fetch,
    Parse,
    Index,
    /// Set by the out-graph update once it has applied a page's fetch
    UpdateOutgraph,
}

impl Mark {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inject => "inject",
            Self::Generate => "generate",
            Self::Fetch => "fetch",
            Self::Parse => "parse",
            Self::Index => "index",
            Self::UpdateOutgraph => "update_outgraph",
        }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
