use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! index_id {
    ($name:ident, $prefix:literal) => {
        /// Dense index into the simulator's entity table.
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub struct $name(pub usize);

        impl $name {
            pub fn index(self) -> usize {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }
    };
}

index_id!(HostId, "host");
index_id!(LinkId, "link");
index_id!(FlowId, "flow");
