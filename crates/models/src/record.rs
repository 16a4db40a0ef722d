/// A record addressable by a unique, immutable string key.
///
/// The key doubles as the index key of a record store; it must never change
/// after the record has been created.
pub trait Record {
    /// Human-readable entity name used in errors and logs.
    const KIND: &'static str;

    fn key(&self) -> &str;
}
