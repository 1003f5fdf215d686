//! Content host tree shared by the shell and the feature panels.
//! Shell 與各功能面板共用的內容樹。

pub mod clock;
pub mod host;
pub mod template;
pub mod wait;

pub use clock::{Clock, SystemClock, TestClock};
pub use host::{ContentHost, HostError, Node, NodeBody, NodeId, SelectOption, Selector};
pub use template::{parse_panel, TemplateError};
pub use wait::{
    await_anchor, AnchorPoll, AnchorWait, WaitError, DEFAULT_ANCHOR_TIMEOUT_MS, POLL_INTERVAL_MS,
};
