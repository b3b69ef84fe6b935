//! The editor's single state tree: named intents in, memoized views out.

pub mod intent;
pub mod memo;
pub mod reducer;
pub mod selectors;
pub mod state;

pub use intent::Intent;
pub use reducer::{Outcome, Skip, Store};
pub use selectors::Selectors;
pub use state::{
    ActiveModal, ContentFilter, ContentModalData, GraphicItemModalData, ModalType, PlainModal, ProjectState,
    ScriptModalData, TrackModalData,
};
