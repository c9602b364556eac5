//! Bit-level addressing arithmetic shared by the segmented collections:
//! power-of-two block layout (shift/mask element addressing) and
//! strength-reduced division for arbitrary divisors.

pub mod fast_div;
pub mod layout;

pub use fast_div::FastDivisor;
pub use layout::BlockLayout;
