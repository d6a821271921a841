use std::fmt;
use std::str::FromStr;

/// Document collections held by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Category,
    Problem,
    Approach,
    Machine,
    Number,
    Perf,
}

impl Collection {
    pub const ALL: [Collection; 6] = [
        Collection::Category,
        Collection::Problem,
        Collection::Approach,
        Collection::Machine,
        Collection::Number,
        Collection::Perf,
    ];

    /// Directory name under the store root.
    pub fn dir_name(self) -> &'static str {
        match self {
            Collection::Category => "categories",
            Collection::Problem => "problems",
            Collection::Approach => "approaches",
            Collection::Machine => "machines",
            Collection::Number => "numbers",
            Collection::Perf => "perfs",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Collection::Category => "category",
            Collection::Problem => "problem",
            Collection::Approach => "approach",
            Collection::Machine => "machine",
            Collection::Number => "number",
            Collection::Perf => "perf",
        };
        f.write_str(name)
    }
}

impl FromStr for Collection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        Collection::ALL
            .into_iter()
            .find(|c| c.to_string() == lower || c.dir_name() == lower)
            .ok_or_else(|| format!("unknown collection: {s}"))
    }
}
