use serde::{Deserialize, Serialize};
use std::fmt;

///
/// Aspect
///
/// The displayed state of a signal. Closed vocabulary: the main-signal
/// group, the calling-on group (WHITE), and the reserved shunt aspect
/// (BLUE). A transition between aspects of different groups is legal only
/// for the whitelisted WHITE↔RED pair.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Aspect {
    Red,
    Yellow,
    SingleYellow,
    DoubleYellow,
    Green,
    White,
    Blue,
}

impl Aspect {
    /// Canonical wire name, as stored by the persistence layer.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Red => "RED",
            Self::Yellow => "YELLOW",
            Self::SingleYellow => "SINGLE_YELLOW",
            Self::DoubleYellow => "DOUBLE_YELLOW",
            Self::Green => "GREEN",
            Self::White => "WHITE",
            Self::Blue => "BLUE",
        }
    }

    /// Functional group this aspect belongs to.
    #[must_use]
    pub const fn group(self) -> AspectGroup {
        match self {
            Self::Red | Self::Yellow | Self::SingleYellow | Self::DoubleYellow | Self::Green => {
                AspectGroup::MainSignals
            }
            Self::White => AspectGroup::CallingOn,
            Self::Blue => AspectGroup::ShuntSignals,
        }
    }

    /// Whether this aspect authorizes normal movement (GREEN/YELLOW
    /// family). WHITE is a restrictive calling-on aspect and does not
    /// count as proceed for conflict purposes.
    #[must_use]
    pub const fn is_proceed(self) -> bool {
        matches!(
            self,
            Self::Green | Self::Yellow | Self::SingleYellow | Self::DoubleYellow
        )
    }

    /// The only cross-group transition pair that is ever legal.
    #[must_use]
    pub const fn is_whitelisted_crossing(from: Self, to: Self) -> bool {
        matches!((from, to), (Self::White, Self::Red) | (Self::Red, Self::White))
    }
}

impl fmt::Display for Aspect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

///
/// AspectGroup
///
/// Aspects are partitioned into functional groups. ShuntSignals and
/// BlockSignals are reserved: no deployed layout places aspects there yet.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum AspectGroup {
    MainSignals,
    CallingOn,
    ShuntSignals,
    BlockSignals,
}

///
/// TESTS
///
