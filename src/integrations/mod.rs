//! External service integrations.

pub mod cvr_registry {
    pub use crate::cache::SearchCache;
    pub use crate::circuit_breaker::{create_search_circuit_breaker, SearchCircuitBreaker};
    pub use crate::services::*;
}
