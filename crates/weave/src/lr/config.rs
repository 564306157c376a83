/// Which item-set construction the table generator uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serialize", serde(rename_all = "lowercase"))]
pub enum TableAlgorithm {
    /// Canonical LR(1): states keep distinct lookaheads
    #[default]
    Lr1,
    /// LR(1) states merged by core (smaller tables, may add reduce/reduce conflicts)
    Lalr1,
    /// LR(0) states with FOLLOW-set lookaheads
    Slr,
}

/// Configuration for LR table generation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serialize", serde(default))]
pub struct LrConfig {
    pub algorithm: TableAlgorithm,
}

impl LrConfig {
    #[must_use]
    pub const fn with_algorithm(algorithm: TableAlgorithm) -> Self {
        Self { algorithm }
    }
}
