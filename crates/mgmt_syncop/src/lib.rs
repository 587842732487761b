//! Replicated fan-out over an ordered set of peer targets (spec §4.4
//! "cluster-syncop").

mod fanout;
mod inode_lock;

pub use fanout::{fan_out_parallel, fan_out_sequential, FanOutOutcome};
pub use inode_lock::{try_entry_lock, try_inode_lock, LockTarget};
