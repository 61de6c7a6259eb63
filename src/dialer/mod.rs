pub mod distributor;
pub mod lifecycle;
pub mod pacing;
pub mod scheduler;
pub mod sweeper;
pub mod ticker;
pub mod types;
pub mod voicemail;

pub use distributor::CallDistributor;
pub use lifecycle::CallLifecycleManager;
pub use pacing::{PacingConfig, PacingController};
pub use scheduler::DialerScheduler;
pub use sweeper::LockSweeper;
pub use ticker::Ticker;
pub use voicemail::VoicemailPolicyExecutor;
