//! Approval event domain

mod entity;
mod rule;

pub use entity::{
    ApprovalEvent, ModelPackageDetail, TriggerError, APPROVAL_APPROVED, STATUS_COMPLETED,
};
pub use rule::EventRule;
