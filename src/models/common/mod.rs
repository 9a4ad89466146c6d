pub mod response;
pub mod state;

pub use response::{DeleteOutcome, Envelope, FetchResult};
pub use state::{FetchState, ListView};
