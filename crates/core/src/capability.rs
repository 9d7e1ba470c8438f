//! Generation capabilities and their wire identifiers.

use serde::{Deserialize, Serialize};

/// One of the three generation domains. Each capability maps 1:1 to a
/// dedicated work queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    /// Workout plan generation.
    Workout,
    /// Meal plan generation.
    Meal,
    /// InBody report OCR + analysis.
    InbodyOcr,
}

impl Capability {
    /// All capabilities, in queue iteration order. Used for fan-out.
    pub const ALL: [Capability; 3] = [Capability::Workout, Capability::Meal, Capability::InbodyOcr];

    /// Short prefix used in job IDs and WebSocket event names.
    pub fn prefix(self) -> &'static str {
        match self {
            Capability::Workout => "workout",
            Capability::Meal => "meal",
            Capability::InbodyOcr => "inbody",
        }
    }

    /// Human-readable queue name, used in logs.
    pub fn queue_name(self) -> &'static str {
        match self {
            Capability::Workout => "workout-generation",
            Capability::Meal => "meal-generation",
            Capability::InbodyOcr => "inbody-ocr",
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.prefix())
    }
}

impl std::str::FromStr for Capability {
    type Err = crate::error::CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "workout" => Ok(Capability::Workout),
            "meal" => Ok(Capability::Meal),
            "inbody" | "inbody-ocr" => Ok(Capability::InbodyOcr),
            other => Err(crate::error::CoreError::Validation(format!(
                "Unknown capability: \"{other}\""
            ))),
        }
    }
}
