pub use crate::error::*;

mod database;
mod entity;
mod error;
mod modify;
mod pricing;
mod query;
mod search;
mod system;
mod validation;

#[cfg(feature = "prelude")]
pub mod prelude {
    pub mod entity {
        pub use crate::entity::*;
    }
    pub mod pricing {
        pub use crate::pricing::*;
    }
    pub mod search {
        pub use crate::search::*;
    }
    pub mod validation {
        pub use crate::validation::*;
    }
}

#[cfg(feature = "interface")]
pub mod interface {
    pub mod database {
        pub use crate::database::*;
    }
    pub mod query {
        pub use crate::query::*;
    }
    pub mod update {
        pub use crate::modify::*;
    }
    pub mod system {
        pub use crate::system::*;
    }
}
