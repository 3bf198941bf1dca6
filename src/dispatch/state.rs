//! Request lifecycle stages

use std::fmt;

/// Where a request is in its lifecycle. Any stage may end in failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Authorized,
    Located,
    Mutated,
    Committed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Received => "received",
            Stage::Authorized => "authorized",
            Stage::Located => "located",
            Stage::Mutated => "mutated",
            Stage::Committed => "committed",
        };
        f.write_str(name)
    }
}
