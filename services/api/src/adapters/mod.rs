pub mod auth;
pub mod db;
pub mod memory;
pub mod supabase;

pub use auth::SupabaseAuthAdapter;
pub use db::SupabaseDbAdapter;
pub use memory::InMemoryBackend;
pub use supabase::SupabaseClient;
