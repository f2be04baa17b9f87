//! Program-time page skip policy.
//!
//! Treating an all-`0x00` page as "probably a factory bad-block artifact" is
//! a pragmatic heuristic, not a correctness guarantee — it can silently drop
//! real all-zero user data. It is therefore a configurable policy rather than
//! a hard-coded rule in [`super::super::infrastructure::flash_protocol::nand`]'s
//! operation drivers.

use std::sync::Arc;

/// Decides whether [`program_from_stream`] skips a page instead of
/// programming it.
///
/// [`program_from_stream`]: crate::infrastructure::flash_protocol::nand::program_from_stream
#[derive(Clone)]
pub enum SkipPolicy {
    /// Skip pages that are uniformly `0xFF` (factory-erased) or uniformly
    /// `0x00` (suspected bad-block artifact). The default.
    SkipBlankAndZero,
    /// Skip only pages that are uniformly `0xFF`; program everything else,
    /// including all-zero pages.
    SkipBlankOnly,
    /// Caller-supplied predicate over the raw page buffer.
    Custom(Arc<dyn Fn(&[u8]) -> bool + Send + Sync>),
}

impl SkipPolicy {
    pub fn should_skip(&self, page: &[u8]) -> bool {
        match self {
            SkipPolicy::SkipBlankAndZero => is_uniform(page, 0xFF) || is_uniform(page, 0x00),
            SkipPolicy::SkipBlankOnly => is_uniform(page, 0xFF),
            SkipPolicy::Custom(f) => f(page),
        }
    }
}

impl Default for SkipPolicy {
    fn default() -> Self {
        SkipPolicy::SkipBlankAndZero
    }
}

impl std::fmt::Debug for SkipPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipPolicy::SkipBlankAndZero => write!(f, "SkipPolicy::SkipBlankAndZero"),
            SkipPolicy::SkipBlankOnly => write!(f, "SkipPolicy::SkipBlankOnly"),
            SkipPolicy::Custom(_) => write!(f, "SkipPolicy::Custom(..)"),
        }
    }
}

fn is_uniform(buf: &[u8], value: u8) -> bool {
    buf.iter().all(|&b| b == value)
}
