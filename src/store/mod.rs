pub mod client;
pub mod memory;

pub use client::{HttpStore, InterviewStore, InterviewUpdate, NewInterview, StoredInterview};
pub use memory::MemoryStore;
