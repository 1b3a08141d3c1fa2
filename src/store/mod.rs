//! Persistence collaborators — profiles, reviews and sessions.

pub mod memory;
pub mod supabase;
pub mod traits;

pub use memory::MemoryStore;
pub use supabase::SupabaseStore;
pub use traits::{OnboardingStore, SessionProvider};
