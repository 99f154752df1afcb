// Domain-layer modules and shared errors/models
pub mod knowledge_base {
    pub use crate::knowledge_base::*;
}

pub mod models {
    pub use crate::models::*;
}

pub mod services {
    pub use crate::services::*;
}

pub mod errors {
    pub use crate::errors::*;
}
