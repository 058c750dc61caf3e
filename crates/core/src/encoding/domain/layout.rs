use serde::{Deserialize, Serialize};

/// How pixels map onto the `[1, H, W, 3]` input tensor.
///
/// The two supported engines disagree on channel order, so the layout is
/// picked once per pipeline and never changes afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// `[batch][row][col][channel]`, channels R, G, B.
    #[default]
    Planar,
    /// Flat row-major pixel sequence, channels B, G, R.
    FlattenedReversed,
}

impl Layout {
    /// Tensor channel slot for RGB channel `c` (0 = R, 1 = G, 2 = B).
    pub fn channel_slot(self, c: usize) -> usize {
        match self {
            Layout::Planar => c,
            Layout::FlattenedReversed => 2 - c,
        }
    }
}

impl std::str::FromStr for Layout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "planar" => Ok(Layout::Planar),
            "flattened" | "flattened_reversed" => Ok(Layout::FlattenedReversed),
            other => Err(format!(
                "layout must be 'planar' or 'flattened', got '{other}'"
            )),
        }
    }
}

impl std::fmt::Display for Layout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Layout::Planar => write!(f, "planar"),
            Layout::FlattenedReversed => write!(f, "flattened"),
        }
    }
}
