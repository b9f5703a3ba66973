pub mod caller_identity;
pub mod outpost;
