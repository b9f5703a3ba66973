pub mod iam_role;
pub mod wafv2;
