pub mod identities;
pub mod tree;
pub mod types;
