//! Machinery shared by the PLONK and Honk composers

pub mod composer_helper;
pub mod permutation;
pub mod polynomial_store;
pub mod proving_key;
pub mod work_queue;

pub use composer_helper::Composer;
pub use polynomial_store::PolynomialStore;
pub use proving_key::{ComposerType, ProvingKey};
pub use work_queue::{WorkItem, WorkItemInfo, WorkQueue, WorkType};
