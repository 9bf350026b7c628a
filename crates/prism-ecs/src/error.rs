use crate::entity::Entity;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EcsError {
    #[error("entity {0} is not alive")]
    DeadEntity(Entity),
}
