//! Canonical record identifiers shared across the workspace.

/// State machine records.
pub mod qep {
    /// A state was entered.
    pub const STATE_ENTRY: u8 = 1;
    /// A state was exited.
    pub const STATE_EXIT: u8 = 2;
    /// A nested initial transition was taken.
    pub const STATE_INIT: u8 = 3;
    /// The top-most initial transition was taken.
    pub const INIT_TRAN: u8 = 4;
    /// An internal transition was taken.
    pub const INTERN_TRAN: u8 = 5;
    /// A regular transition was taken.
    pub const TRAN: u8 = 6;
    /// An event was ignored.
    pub const IGNORED: u8 = 7;
    /// An event was dispatched (begin of a run-to-completion step).
    pub const DISPATCH: u8 = 8;
    /// A transition to history was taken.
    pub const TRAN_HIST: u8 = 55;
}

/// Framework records.
pub mod qf {
    pub const ACTIVE_DEFER: u8 = 10;
    pub const ACTIVE_RECALL: u8 = 11;
    pub const ACTIVE_SUBSCRIBE: u8 = 12;
    pub const ACTIVE_UNSUBSCRIBE: u8 = 13;
    pub const ACTIVE_POST_FIFO: u8 = 14;
    pub const ACTIVE_POST_LIFO: u8 = 15;
    pub const ACTIVE_GET: u8 = 16;
    pub const ACTIVE_GET_LAST: u8 = 17;
    pub const ACTIVE_RECALL_ATTEMPT: u8 = 18;
    pub const MPOOL_GET: u8 = 24;
    pub const MPOOL_PUT: u8 = 25;
    pub const PUBLISH: u8 = 26;
    pub const NEW_REF: u8 = 27;
    pub const NEW: u8 = 28;
    pub const GC: u8 = 30;
    pub const TICK: u8 = 31;
    pub const DELETE_REF: u8 = 38;
    pub const ACTIVE_POST_ATTEMPT: u8 = 45;
    pub const MPOOL_GET_ATTEMPT: u8 = 47;

    /// Time event records.
    pub mod time_evt {
        pub const ARM: u8 = 32;
        pub const AUTO_DISARM: u8 = 33;
        pub const DISARM_ATTEMPT: u8 = 34;
        pub const DISARM: u8 = 35;
        pub const REARM: u8 = 36;
        pub const POST: u8 = 37;
    }
}

/// Scheduler records.
pub mod sched {
    pub const LOCK: u8 = 50;
    pub const UNLOCK: u8 = 51;
    pub const NEXT: u8 = 52;
    pub const IDLE: u8 = 53;
    pub const RESUME: u8 = 54;
}
