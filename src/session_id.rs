use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Random identity of a [`LiveSession`](crate::LiveSession). Lets a transport
/// notice that the session it was polling has been replaced, in which case
/// the viewer has to reload the full document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> SessionId {
        SessionId(Uuid::new_v4())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}
