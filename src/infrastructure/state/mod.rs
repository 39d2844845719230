//! Application State Implementations

mod local_state;

pub use local_state::LocalState;
