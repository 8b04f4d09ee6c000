//! Opaque handles into host-owned data.
//!
//! None of these carry any state of their own. A handle can outlive the thing
//! it points at, so every use goes back through the host.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle to a node in the host scene graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node:{}", self.0)
    }
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Id of a design variable (token)
    VariableId
);

string_id!(
    /// Id of a variable collection
    CollectionId
);

string_id!(
    /// Id of one mode inside a variable collection
    ModeId
);

string_id!(
    /// Id of a shared style definition
    StyleId
);
