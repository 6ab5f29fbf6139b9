//! Paced transfer engine
//!
//! Line segmentation, the one-line-at-a-time sender with echo flow control,
//! timeout policies and the bulk transfer loop built on top of them.

pub mod bulk;
pub mod policy;
pub mod segmenter;
pub mod sender;

// Re-exports for convenience
pub use bulk::{transfer_text, TransferOptions, TransferReport};
pub use policy::{
    AbortOnTimeout, AskOnTimeout, ContinueOnTimeout, TimeoutAction, TimeoutContext,
    TimeoutDecision, TimeoutPolicy,
};
pub use segmenter::{join, LineEnding, LineSegmenter, Lines};
pub use sender::{
    probe_mode, AckMatcher, PacedSender, PacingSettings, SendState, TransferOutcome,
    DEFAULT_ACK_TIMEOUT, DEFAULT_PROBE_TIMEOUT,
};
