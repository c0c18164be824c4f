/// State management module
///
/// This module handles all persisted application state, including:
/// - Shared data structures (data.rs)
/// - Query seams used by the tree pipeline (source.rs)
/// - The taxonomy database (taxonomy.rs)
/// - Photo collections and uploads (photos.rs)

pub mod data;
pub mod photos;
pub mod source;
pub mod taxonomy;
