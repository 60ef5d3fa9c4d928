//! The fixed enumeration of tools.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    LocalLogReader,
    DomainTableLookup,
    SourceRepoSearch,
    ChangeWindowScanner,
    MetricsSnapshotAnalyzer,
    RunbookCaseLibrary,
}

impl ToolKind {
    pub const ALL: [ToolKind; 6] = [
        ToolKind::LocalLogReader,
        ToolKind::DomainTableLookup,
        ToolKind::SourceRepoSearch,
        ToolKind::ChangeWindowScanner,
        ToolKind::MetricsSnapshotAnalyzer,
        ToolKind::RunbookCaseLibrary,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolKind::LocalLogReader => "local_log_reader",
            ToolKind::DomainTableLookup => "domain_table_lookup",
            ToolKind::SourceRepoSearch => "source_repo_search",
            ToolKind::ChangeWindowScanner => "change_window_scanner",
            ToolKind::MetricsSnapshotAnalyzer => "metrics_snapshot_analyzer",
            ToolKind::RunbookCaseLibrary => "runbook_case_library",
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ToolKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolKind::ALL.iter().find(|k| k.as_str() == s).copied().ok_or(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_six_tools_have_distinct_names() {
        let names: std::collections::HashSet<_> = ToolKind::ALL.iter().map(|t| t.as_str()).collect();
        assert_eq!(names.len(), 6);
    }
}
