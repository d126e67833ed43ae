//! Video player core
//!
//! - Surface: commands the session issues to the host media element
//! - Headless: in-memory surface used by the CLI and tests
//! - Session: reducer over playback lifecycle commands
//! - Driver: runs session effects on the tokio runtime

pub mod driver;
pub mod headless;
pub mod session;
pub mod surface;

pub use driver::{Services, SessionDriver};
pub use headless::{HeadlessSurface, SurfaceCall};
pub use session::{
    PlaybackSession, PlaybackSessionState, SessionCommand, SessionEffect, PLAYBACK_RATES,
    SEEK_STEP,
};
pub use surface::{MediaClock, MediaEvent, MediaSurface, PlaybackError};
