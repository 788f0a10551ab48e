// Utility modules shared across the application

pub mod common; // Data URL codec and response parsing helpers
pub mod logger; // Logging configuration
pub mod poll; // Fixed-interval job polling
