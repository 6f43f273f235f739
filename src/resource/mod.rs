//! Resources: the cached unit of file content.
//!
//! ```text
//! Resource
//! ├── data: Mutex<Backing>        ─┐
//! │   ├── Reference(Bytes)         ├── data lock (read guards, reload)
//! │   └── Disk { path, bytes, mtime }
//! ├── observers: ObserverSet      ─── observer lock (add/remove/notify)
//! └── disowned: AtomicBool        ─── set once, never cleared
//! ```
//!
//! Managers hand out `Arc<Resource>` and keep only `Weak` references, so a
//! resource lives exactly as long as some handle needs it.

mod core;
mod observer;
mod read;

pub use self::core::{AccessGuard, Resource};
pub use observer::ReloadObserver;
pub use read::{Timestamp, last_modified, read_disk};
