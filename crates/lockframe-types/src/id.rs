use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

// Field-element identifiers are layout-configured strings ("HM001", "6T").
// Each kind gets its own newtype so a track id can never be handed to a
// signal lookup.
macro_rules! field_id {
    ($(#[$attr:meta])* $name:ident) => {
        $(#[$attr])*
        #[derive(
            Clone, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize,
        )]
        #[repr(transparent)]
        pub struct $name(String);

        impl $name {
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

field_id! {
    ///
    /// SignalId
    ///
    SignalId
}

field_id! {
    ///
    /// TrackId
    ///
    /// Identifies one track circuit/section.
    ///
    TrackId
}

field_id! {
    ///
    /// PointMachineId
    ///
    PointMachineId
}

field_id! {
    ///
    /// OperatorId
    ///
    /// The actor requesting a change: a panel operator, or the
    /// interlocking system itself on the enforcement path.
    ///
    OperatorId
}

///
/// EntityId
///
/// Closed union of field-element identifiers, used wherever a result or
/// event names the entities it concerns.
///

#[remain::sorted]
#[derive(Clone, Debug, Display, Eq, From, Hash, PartialEq, Serialize, Deserialize)]
pub enum EntityId {
    #[display("{_0}")]
    PointMachine(PointMachineId),
    #[display("{_0}")]
    Signal(SignalId),
    #[display("{_0}")]
    Track(TrackId),
}

///
/// TESTS
///
