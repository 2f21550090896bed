//! Cache Module
//!
//! Call-tracked key/value caching: value codec, instrumented cache, call
//! tracking and history replay.

mod codec;
mod history;
mod instrumented;
mod tracker;


// Re-export public types
pub use codec::{
    as_binary, as_counter, as_float, as_int, as_text, decode, encode, DecodeError, StoredValue,
    ValueKind,
};
pub use history::{CallHistory, CallHistoryReplayer, CallRecord, MISSING_OUTPUT};
pub use instrumented::{InstrumentedCache, STORE_OPERATION};
pub use tracker::{inputs_key, outputs_key, CallTracker};
