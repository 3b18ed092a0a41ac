/// Application layer - Use cases, ingestion services and DTOs
///
/// This layer contains the application logic that orchestrates
/// domain services and coordinates with infrastructure through ports.
pub mod dto;
pub mod factories;
pub mod ingestion;
pub mod use_cases;
