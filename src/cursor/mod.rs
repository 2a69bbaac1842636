// ============================================================================
// Cursor Module
// ============================================================================
//
// Border values and the chat-code cursor protocol: the sort-key snapshot
// taken at a page boundary, encoded as a compact string that survives a
// round trip through a text command interface.
//
// ============================================================================

pub mod anchor;
pub mod combined;
pub mod handle;

pub use anchor::KeysetAnchor;
pub use combined::CombinedBorderValue;
pub use handle::{BorderValueHandle, I64Handle, InstantHandle, UuidHandle};
