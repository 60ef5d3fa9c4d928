//! The debate's phase state machine.

use serde::{Deserialize, Serialize};

/// A named stage in the debate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Init,
    AssetMapping,
    Analysis,
    Critique,
    Rebuttal,
    Judgment,
    Verification,
    Report,
    Terminal,
}

impl Phase {
    /// The phases in their strict, monotone order. `Critique`/`Rebuttal` repeat as a
    /// pair so they appear once here; `is_forward_move` special-cases the loop.
    const ORDER: [Phase; 9] = [
        Phase::Init,
        Phase::AssetMapping,
        Phase::Analysis,
        Phase::Critique,
        Phase::Rebuttal,
        Phase::Judgment,
        Phase::Verification,
        Phase::Report,
        Phase::Terminal,
    ];

    fn rank(self) -> usize {
        Self::ORDER.iter().position(|p| *p == self).expect("exhaustive enum")
    }

    /// True if transitioning `self -> next` respects the phase order: either a
    /// strictly later phase, or the critique/rebuttal loop-back (`Rebuttal ->
    /// Critique`), or staying put (re-emitting the current phase, e.g. while still
    /// fanning out).
    pub fn can_transition_to(self, next: Phase) -> bool {
        if self == next {
            return true;
        }
        if self == Phase::Rebuttal && next == Phase::Critique {
            return true;
        }
        next.rank() > self.rank()
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Phase::Init => "init",
            Phase::AssetMapping => "asset_mapping",
            Phase::Analysis => "analysis",
            Phase::Critique => "critique",
            Phase::Rebuttal => "rebuttal",
            Phase::Judgment => "judgment",
            Phase::Verification => "verification",
            Phase::Report => "report",
            Phase::Terminal => "terminal",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for Phase {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "init" => Ok(Phase::Init),
            "asset_mapping" => Ok(Phase::AssetMapping),
            "analysis" => Ok(Phase::Analysis),
            "critique" => Ok(Phase::Critique),
            "rebuttal" => Ok(Phase::Rebuttal),
            "judgment" => Ok(Phase::Judgment),
            "verification" => Ok(Phase::Verification),
            "report" => Ok(Phase::Report),
            "terminal" => Ok(Phase::Terminal),
            _ => Err(()),
        }
    }
}
