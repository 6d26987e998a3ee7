pub mod manager;
pub mod memory_store;
pub mod redis_store;
pub mod store;

pub use manager::HoldManager;
pub use memory_store::InMemoryHoldStore;
pub use redis_store::RedisHoldStore;
pub use store::HoldStore;
