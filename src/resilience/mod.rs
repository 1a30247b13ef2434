pub mod poller;
pub mod throttle;

pub use poller::{settle, OperationPoller, OperationState, OperationStatus, Settled};
pub use throttle::ThrottleRetrier;
