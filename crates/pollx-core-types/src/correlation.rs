//! Request correlation
//!
//! Every façade call runs under a `RequestContext`. Its id is attached to the
//! boundary log events and to any error handed back, and its clock measures
//! the call's duration.

use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of one façade call (UUIDv7, so ids sort by creation time)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Accepts an id handed in by a caller, e.g. from a transport header
impl FromStr for RequestId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// State carried through one operation boundary
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: RequestId,
    started: Instant,
}

impl RequestContext {
    /// Fresh id, clock starting now
    pub fn new() -> Self {
        Self::for_request(RequestId::new())
    }

    /// Continue a request whose id was assigned upstream
    pub fn for_request(request_id: RequestId) -> Self {
        Self {
            request_id,
            started: Instant::now(),
        }
    }

    /// Milliseconds since the context was created
    pub fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}
