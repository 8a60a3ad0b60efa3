use uuid::Uuid;

/// Source of collision-free identifiers for entities about to be created
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Random v4 uuids in their simple (hyphen-less) form
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIdGenerator;

impl IdGenerator for RandomIdGenerator {
    fn generate(&self) -> String {
        Uuid::new_v4().simple().to_string()
    }
}
