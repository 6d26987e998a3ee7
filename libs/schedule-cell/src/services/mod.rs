pub mod materialize;
pub mod schedule;
pub mod slots;
pub mod store;
pub mod supabase_store;
pub mod validation;

pub use materialize::{expand_block, ExpansionCache};
pub use schedule::ScheduleService;
pub use slots::{SlotIter, SlotPlan};
pub use store::{InMemoryScheduleStore, ScheduleStore};
pub use supabase_store::SupabaseScheduleStore;
