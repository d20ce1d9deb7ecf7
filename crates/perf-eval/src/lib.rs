//! Performance-evaluation core: criteria category weight governance and weighted score
//! aggregation, with the repository seams and HTTP routers used by the API service.

/// Declares a `u64` newtype id with serde transparency and `Display`.
macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
            serde::Serialize, serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

pub mod config;
pub mod error;
pub mod evaluations;
pub mod governance;
pub mod memory;
pub mod telemetry;
