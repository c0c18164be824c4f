/// Photo handling for the gallery view
///
/// This module handles:
/// - Generating gallery thumbnails
/// - Caching thumbnails to disk, one folder per collection

pub mod thumbnail;
