// Licensed under the Apache-2.0 license

//! Time sources for the banner comment of generated files.
//!
//! The timestamp is the only part of the generated text that depends on
//! anything but the input configuration. Generators read it through a
//! [`TimeSource`] so tests can pin it with [`FixedClock`].

use chrono::{Local, NaiveDateTime};
use std::fmt::Debug;

/// Format of the `Generated:` line in every banner comment.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub trait TimeSource: Debug + Send + Sync {
    fn now(&self) -> NaiveDateTime;

    /// The current time rendered with [`TIMESTAMP_FORMAT`].
    fn timestamp(&self) -> String {
        self.now().format(TIMESTAMP_FORMAT).to_string()
    }
}

/// Local wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Always reports the same instant.
#[derive(Clone, Copy, Debug)]
pub struct FixedClock(pub NaiveDateTime);

impl TimeSource for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}
