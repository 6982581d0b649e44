use serde::{Deserialize, Serialize};

use btcm7_types::SignalConfig;

/// Summary stance derived from short and medium momentum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    /// Both windows favor BTC beyond the strong threshold.
    StrongBtc,
    /// At least one window favors BTC beyond the moderate threshold.
    ModerateBtc,
    /// No clear stance, or momentum undefined.
    #[default]
    Neutral,
    /// At least one window favors the basket beyond the moderate threshold.
    ModerateBasket,
    /// Both windows favor the basket beyond the strong threshold.
    StrongBasket,
}

impl Signal {
    /// Classify the latest short and medium momentum values (percentage points).
    ///
    /// Rules are checked in order: strong BTC, moderate BTC, strong basket,
    /// moderate basket; anything else (including a missing value) is neutral.
    #[must_use]
    pub fn classify(short: Option<f64>, medium: Option<f64>, cfg: &SignalConfig) -> Self {
        let (Some(s), Some(m)) = (short, medium) else {
            return Self::Neutral;
        };
        if !(s.is_finite() && m.is_finite()) {
            return Self::Neutral;
        }
        let strong = cfg.strong_threshold;
        let moderate = cfg.moderate_threshold;
        if s > strong && m > strong {
            Self::StrongBtc
        } else if s > moderate || m > moderate {
            Self::ModerateBtc
        } else if s < -strong && m < -strong {
            Self::StrongBasket
        } else if s < -moderate || m < -moderate {
            Self::ModerateBasket
        } else {
            Self::Neutral
        }
    }

    /// Short display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::StrongBtc => "strong BTC",
            Self::ModerateBtc => "moderate BTC",
            Self::Neutral => "neutral",
            Self::ModerateBasket => "moderate M7",
            Self::StrongBasket => "strong M7",
        }
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
