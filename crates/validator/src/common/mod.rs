// Path: crates/validator/src/common/mod.rs

mod notify;
mod signer;

pub use notify::{NotificationService, NotifierFactory};
pub use signer::SignerRouter;
