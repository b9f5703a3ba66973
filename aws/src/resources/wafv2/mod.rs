pub mod rule_group;
pub mod statement;
