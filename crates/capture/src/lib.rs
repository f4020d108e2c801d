//! Capture engine for hookwatch
//!
//! Turns an external origin into a stream of [`CapturedRequest`] records.
//! Four strategies sit behind the [`CaptureSource`] trait:
//! - on-demand fetch of a URL
//! - fixed-interval polling, optionally through a CORS relay
//! - a push subscription to a newline-delimited JSON event stream
//! - built-in fixture data
//!
//! [`Listener`] runs one strategy at a time and owns the Idle/Listening
//! state machine; [`RequestStore`] keeps what was captured.

pub mod error;
pub mod fetch;
pub mod fixture;
pub mod listener;
pub mod poll;
pub mod push;
pub mod source;
pub mod store;

pub use common::model::CapturedRequest;
pub use error::CaptureError;
pub use listener::{ListenState, Listener, Session, Transition};
pub use source::{CaptureEvent, CaptureSource, EventReceiver, Origin, RecordSink};
pub use store::RequestStore;
