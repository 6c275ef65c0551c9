//! # Events Module
//!
//! Progress reporting for long-running batches.
//!
//! ## Design
//! Scans, deletions and conversions push events through a channel so any
//! front end (CLI progress bar, desktop shell) can follow along. Events are
//! a side channel: they never affect result ordering or error handling.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//!
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         if let Event::Convert(ConvertEvent::Progress(p)) = event {
//!             println!("{}/{} {}", p.current, p.total, p.path.display());
//!         }
//!     }
//! });
//!
//! converter.convert_to_folder_with_events(&paths, &out_dir, &options, &sender)?;
//! ```

mod channel;
mod types;

pub use channel::{null_sender, EventChannel, EventReceiver, EventSender};
pub use types::*;
