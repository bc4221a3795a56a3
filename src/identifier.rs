//! Public identifier generation.

use uuid::Uuid;

/// Source of globally unique package identifiers
pub trait IdentifierGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Random (v4) UUID identifiers
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIdentifierGenerator;

impl IdentifierGenerator for UuidIdentifierGenerator {
    fn generate(&self) -> String {
        Uuid::new_v4().to_string()
    }
}
