//! Project configuration layer
//! - traits.rs: ConstraintSource trait and ConfigError
//! - terraform.rs: Terraform configuration directory parser

pub mod terraform;
pub mod traits;

pub use terraform::TerraformConfigParser;
pub use traits::{ConfigError, ConstraintSource, DeclaredConstraint};
