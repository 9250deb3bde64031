pub mod error;
pub mod init;

pub mod models;
pub mod server;
pub mod stream;

pub use crate::error::{DecodeError, StreamError};
pub use crate::init::StreamConfig;
pub use crate::models::{FlightOffer, SearchRequest, extract_flight_offers};
pub use crate::stream::{ProgressHooks, SearchClient, SessionHandle, StreamEvent};
