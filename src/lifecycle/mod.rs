//! Process lifecycle: shutdown and reload signals

mod reload;
mod shutdown;

pub use reload::ReloadSignal;
pub use shutdown::ShutdownSignal;
