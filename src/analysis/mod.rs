//! Domain logic driven by map clicks: nearest sample lookup and the bloom
//! threshold scan. Both are pure and run on the UI thread.

pub mod bloom;
pub mod nearest;
