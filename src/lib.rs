pub mod config;
pub mod domain;
pub mod importer;
pub mod supabase;
