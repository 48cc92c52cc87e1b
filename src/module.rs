//! Analysis modules
//!
//! Every metric learned from a log line is filed under one analysis module
//! (one report panel). The set is closed and indexed by a small integer.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TallyError;

/// One analysis dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum Module {
    Visitors = 0,
    Requests = 1,
    RequestsStatic = 2,
    NotFound = 3,
    Hosts = 4,
    Os = 5,
    Browsers = 6,
    VisitTimes = 7,
    VirtualHosts = 8,
    Referrers = 9,
    ReferringSites = 10,
    Keyphrases = 11,
    StatusCodes = 12,
    RemoteUser = 13,
    CacheStatus = 14,
    GeoLocation = 15,
}

impl Module {
    /// Number of modules
    pub const COUNT: usize = 16;

    /// All modules in id order
    pub const ALL: [Module; Module::COUNT] = [
        Module::Visitors,
        Module::Requests,
        Module::RequestsStatic,
        Module::NotFound,
        Module::Hosts,
        Module::Os,
        Module::Browsers,
        Module::VisitTimes,
        Module::VirtualHosts,
        Module::Referrers,
        Module::ReferringSites,
        Module::Keyphrases,
        Module::StatusCodes,
        Module::RemoteUser,
        Module::CacheStatus,
        Module::GeoLocation,
    ];

    /// Position of this module in [`Module::ALL`]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Upper-case name, used in persistence identifiers
    pub fn name(self) -> &'static str {
        match self {
            Module::Visitors => "VISITORS",
            Module::Requests => "REQUESTS",
            Module::RequestsStatic => "REQUESTS_STATIC",
            Module::NotFound => "NOT_FOUND",
            Module::Hosts => "HOSTS",
            Module::Os => "OS",
            Module::Browsers => "BROWSERS",
            Module::VisitTimes => "VISIT_TIMES",
            Module::VirtualHosts => "VIRTUAL_HOSTS",
            Module::Referrers => "REFERRERS",
            Module::ReferringSites => "REFERRING_SITES",
            Module::Keyphrases => "KEYPHRASES",
            Module::StatusCodes => "STATUS_CODES",
            Module::RemoteUser => "REMOTE_USER",
            Module::CacheStatus => "CACHE_STATUS",
            Module::GeoLocation => "GEO_LOCATION",
        }
    }
}

impl TryFrom<u8> for Module {
    type Error = TallyError;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        Module::ALL
            .get(id as usize)
            .copied()
            .ok_or_else(|| TallyError::InvalidArgument(format!("unknown module id {}", id)))
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
