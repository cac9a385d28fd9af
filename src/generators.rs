//! Output generators.
//!
//! - [`current`]: one trailing window ending "now" for every active case, sequential
//! - [`timeline`]: per-bucket risk lists and therapy counts, sharded
//! - [`roc`]: labeled `(risk, label)` pairs for ROC/AUC evaluation, sharded

pub mod current;
pub mod roc;
pub mod timeline;

pub use roc::RocItem;
pub use timeline::{TimelineResult, TimelineShard};
