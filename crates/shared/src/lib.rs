pub mod domain;
pub mod error;
pub mod grouping;
pub mod protocol;
