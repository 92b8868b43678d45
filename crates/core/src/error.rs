//! Storage failure bridge.

/// Domain errors that can carry a storage failure.
///
/// The database layer wraps every `DbErr` through this trait, so the pure
/// error enums stay free of ORM types.
pub trait FromStorage {
    /// Wraps a storage failure message.
    fn from_storage(message: String) -> Self;
}
