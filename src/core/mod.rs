// Domain-layer modules: search planning, ranking and risk scoring
pub mod query_builder {
    pub use crate::query_builder::*;
}

pub mod ranking {
    pub use crate::ranking::*;
}

pub mod risk {
    pub use crate::risk::*;
    pub use crate::risk_financial::{Assessment, FinancialSnapshot};
}

pub mod models {
    pub use crate::models::*;
}
