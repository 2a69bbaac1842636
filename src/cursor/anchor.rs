//! Page anchors and their chat-code serialization.
//!
//! Wire format: tokens joined with `.`, one opaque whitespace-free string
//! embeddable as a single argument of a text command. A set anchor encodes
//! as `<page>.<direction>.<border tokens...>` where `<page>` is the decimal
//! page number (at least 1) and `<direction>` is `f` for forward scroll or
//! `b` for backward. The unset anchor is the single token `u`. Handle tokens
//! are decimal integers or lowercase hex, so no token can contain the
//! delimiter and the format is collision-free and reversible.

use super::handle::BorderValueHandle;

/// Delimiter joining chat-code tokens.
pub const CODE_DELIMITER: &str = ".";

const TOKEN_UNSET: &str = "u";
const TOKEN_FORWARD: &str = "f";
const TOKEN_BACKWARD: &str = "b";

/// A page descriptor: the page number being fetched, the border value the
/// fetch seeks past, and which way it scrolls.
///
/// Anchors are plain values: copied and shared freely, never mutated after
/// construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeysetAnchor<T> {
    /// No anchor yet: requests page 1 with no border value.
    Unset,
    /// A page boundary snapshot.
    At { page: u32, border: T, forward: bool },
}

impl<T> KeysetAnchor<T> {
    /// The sentinel for "start at the first page".
    pub fn unset() -> Self {
        Self::Unset
    }

    /// An anchor at a page boundary. `page` counts from 1.
    pub fn at(page: u32, border: T, forward: bool) -> Self {
        debug_assert!(page >= 1, "page numbers count from 1");
        Self::At {
            page,
            border,
            forward,
        }
    }

    pub fn is_set(&self) -> bool {
        matches!(self, Self::At { .. })
    }

    /// The page this anchor requests; 1 for the unset anchor.
    pub fn page(&self) -> u32 {
        match self {
            Self::Unset => 1,
            Self::At { page, .. } => *page,
        }
    }

    /// Scroll direction; the unset anchor scrolls forward.
    pub fn forward(&self) -> bool {
        match self {
            Self::Unset => true,
            Self::At { forward, .. } => *forward,
        }
    }

    pub fn border(&self) -> Option<&T> {
        match self {
            Self::Unset => None,
            Self::At { border, .. } => Some(border),
        }
    }

    /// Serialize into a chat code using `handle` for the border value.
    pub fn chat_code<H: BorderValueHandle<T>>(&self, handle: &H) -> String {
        match self {
            Self::Unset => TOKEN_UNSET.to_string(),
            Self::At {
                page,
                border,
                forward,
            } => {
                let mut tokens = vec![String::new(); 2 + handle.width()];
                tokens[0] = page.to_string();
                tokens[1] = if *forward { TOKEN_FORWARD } else { TOKEN_BACKWARD }.to_string();
                handle.write_tokens(border, &mut tokens[2..]);
                tokens.join(CODE_DELIMITER)
            }
        }
    }

    /// Parse a chat code back into an anchor; the canonical inverse of
    /// [`chat_code`](Self::chat_code).
    ///
    /// Returns `None` on any malformation: wrong token count, non-numeric or
    /// zero page number, unknown direction token, or a failed border decode.
    /// Stale or hand-typed codes are expected input, not an error condition.
    pub fn from_code<H: BorderValueHandle<T>>(handle: &H, code: &str) -> Option<Self> {
        if code == TOKEN_UNSET {
            return Some(Self::Unset);
        }
        let tokens: Vec<String> = code.split(CODE_DELIMITER).map(str::to_string).collect();
        if tokens.len() != 2 + handle.width() {
            return None;
        }
        let page: u32 = tokens[0].parse().ok()?;
        if page == 0 {
            return None;
        }
        let forward = match tokens[1].as_str() {
            TOKEN_FORWARD => true,
            TOKEN_BACKWARD => false,
            _ => return None,
        };
        let border = handle.read_tokens(&tokens[2..])?;
        Some(Self::At {
            page,
            border,
            forward,
        })
    }
}
