pub mod fuzzy;
pub mod ranking;
