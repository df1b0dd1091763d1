pub mod memory;
pub mod postgres;

pub use memory::MemoryDiscoveryStore;
pub use postgres::PostgresDiscoveryStore;
