//! Cart engine configuration.

/// Configuration for the cart service.
#[derive(Debug, Clone, Default)]
pub struct CartConfig {
    /// When `false` (default), a line whose product price cannot be read
    /// contributes zero to the total. When `true`, store failures other
    /// than a missing product abort the mutation instead.
    pub strict_price_lookup: bool,
}
