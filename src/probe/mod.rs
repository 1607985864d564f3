//! Status probe: script rendering, process invocation, and
//! classification of the raw answer into muted / unmuted.

mod command;
mod normalize;
mod template;

pub use command::{CommandProbe, ProbeError, ProbeResult, StatusProbe};
pub use normalize::{MatchStrategy, StateNormalizer};
pub use template::ScriptTemplate;
