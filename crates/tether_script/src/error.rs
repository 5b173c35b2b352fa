use crate::marshal::PayloadError;
use crate::script::ScriptId;
use tether_asset::AssetError;
use tether_core::{ComponentIdConflict, ComponentType, Entity};
use thiserror::Error;

/// What a user hook returns. Any boundary error converts with `?`.
pub type ScriptResult = Result<(), Box<dyn std::error::Error>>;

/// Errors surfaced by boundary operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BoundaryError {
    #[error("entity {entity} is not valid")]
    InvalidEntity { entity: Entity },

    #[error("entity {entity} has no {component} component")]
    MissingComponent {
        entity: Entity,
        component: ComponentType,
    },

    #[error("{component} component belongs to entity {owner}, not {entity}")]
    ForeignComponent {
        entity: Entity,
        owner: Entity,
        component: ComponentType,
    },

    #[error("native side refused to attach {component} to entity {entity}")]
    ComponentRejected {
        entity: Entity,
        component: ComponentType,
    },

    #[error(transparent)]
    InvalidPayload(#[from] PayloadError),

    #[error("script {script} is already subscribed to the update signal")]
    DuplicateSubscription { script: ScriptId },

    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error(transparent)]
    TypeConflict(#[from] ComponentIdConflict),
}
