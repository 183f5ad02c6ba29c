//! # Events Module
//!
//! Progress reporting for the detection pipeline.
//!
//! ## Design
//! The core passes only need a zero-argument [`ProgressFn`] that is invoked
//! once per unit of work. The pipeline adapts that hook into typed events
//! sent through a channel, so any front end (CLI, GUI) can subscribe.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//!
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         if let Event::Fingerprint(FingerprintEvent::Progress(p)) = event {
//!             println!("Fingerprinted {}/{}", p.completed, p.total);
//!         }
//!     }
//! });
//!
//! pipeline.run_with_events(&sender)?;
//! ```

mod channel;
mod types;

pub use channel::{null_sender, EventChannel, EventReceiver, EventSender, ProgressTicker};
pub use types::*;

/// Zero-argument progress hook, called once per completed unit of work.
///
/// Must be `Sync` because the parallel passes call it from worker threads.
pub type ProgressFn<'a> = &'a (dyn Fn() + Sync);
