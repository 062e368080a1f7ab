use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

macro_rules! id_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub struct $name(pub u32);

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u32> for $name {
            fn from(id: u32) -> Self {
                Self(id)
            }
        }
    };
}

id_type! {
    /// Unique ID of a voting session.
    SessionId
}

id_type! {
    /// Unique ID of a ballot option within a session.
    OptionId
}

id_type! {
    /// Unique ID of an anonymous voter row (approval mode).
    VoterId
}
