pub mod alerts;
pub mod config;
pub mod dom;
pub mod driver;
pub mod error;
pub mod orchestrator;
pub mod pipeline;
pub mod primitives;
pub mod scheduler;
pub mod selectors;

pub use reserva_common::locator;
pub use reserva_common::outcome;
pub use reserva_common::request;
