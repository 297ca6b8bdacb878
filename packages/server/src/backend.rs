//! Storage backend boundary.
//!
//! The engine only consults the saturation probe; object and ledger fetch
//! operations live behind the concrete backend and are opaque to dispatch.

/// Saturation probe for the storage layer.
pub trait Backend: Send + Sync {
    /// Whether the backend is too loaded to take more local work. The busy
    /// gate rejects local requests while this holds; forwarded requests are
    /// unaffected since they never touch local storage.
    fn is_too_busy(&self) -> bool;
}
