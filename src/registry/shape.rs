//! Shapes and metric identifiers

use serde::{Deserialize, Serialize};

use super::table::{ShapeOps, SHAPE_OPS};

/// Structural kind of a metric table (key type × value type)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MetricShape {
    /// u32 → u32
    IntInt = 0,
    /// u32 → string
    IntStr = 1,
    /// u32 → u64
    IntU64 = 2,
    /// string → u32
    StrInt = 3,
    /// string → string
    StrStr = 4,
    /// u32 → list of u32
    IntList = 5,
    /// string → u64
    StrU64 = 6,
    /// u32 → nested date storage
    IntStore = 7,
    /// u64 → u8
    U64Byte = 8,
}

impl MetricShape {
    pub const COUNT: usize = 9;

    pub const ALL: [MetricShape; MetricShape::COUNT] = [
        MetricShape::IntInt,
        MetricShape::IntStr,
        MetricShape::IntU64,
        MetricShape::StrInt,
        MetricShape::StrStr,
        MetricShape::IntList,
        MetricShape::StrU64,
        MetricShape::IntStore,
        MetricShape::U64Byte,
    ];

    /// Short tag used in persistence identifiers
    pub fn name(self) -> &'static str {
        match self {
            MetricShape::IntInt => "II32",
            MetricShape::IntStr => "IS32",
            MetricShape::IntU64 => "IU64",
            MetricShape::StrInt => "SI32",
            MetricShape::StrStr => "SS32",
            MetricShape::IntList => "IGSL",
            MetricShape::StrU64 => "SU64",
            MetricShape::IntStore => "IGKH",
            MetricShape::U64Byte => "U648",
        }
    }

    /// Allocate/destroy behavior for this shape
    pub fn ops(self) -> &'static ShapeOps {
        &SHAPE_OPS[self as usize]
    }
}

/// Where a metric may live
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricScope {
    /// Per analysis module (per date, and in the aggregate cache)
    Module,
    /// Per date, shared by all modules
    Date,
    /// Process-wide
    Global,
}

/// Metric identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Metric {
    // -------------------------------------------------------------------------
    // Module metrics
    // -------------------------------------------------------------------------
    Keymap,
    Rootmap,
    Datamap,
    Uniqmap,
    Root,
    Hits,
    Visitors,
    Bw,
    Cumts,
    Maxts,
    Methods,
    Protocols,
    Agents,
    Metadata,

    // -------------------------------------------------------------------------
    // Date metrics
    // -------------------------------------------------------------------------
    UniqueKeys,
    CntValid,
    CntBw,

    // -------------------------------------------------------------------------
    // Global metrics
    // -------------------------------------------------------------------------
    Dates,
    AgentKeys,
    AgentVals,
    Hostnames,
    LastParse,
    Overall,

    /// Key allocator sequences (date or global scope)
    Seqs,
}

impl Metric {
    /// Shape of the table backing this metric
    pub fn shape(self) -> MetricShape {
        match self {
            Metric::Keymap => MetricShape::StrInt,
            Metric::Rootmap => MetricShape::IntStr,
            Metric::Datamap => MetricShape::IntStr,
            Metric::Uniqmap => MetricShape::U64Byte,
            Metric::Root => MetricShape::IntInt,
            Metric::Hits => MetricShape::IntInt,
            Metric::Visitors => MetricShape::IntInt,
            Metric::Bw => MetricShape::IntU64,
            Metric::Cumts => MetricShape::IntU64,
            Metric::Maxts => MetricShape::IntU64,
            Metric::Methods => MetricShape::IntStr,
            Metric::Protocols => MetricShape::IntStr,
            Metric::Agents => MetricShape::IntList,
            Metric::Metadata => MetricShape::StrU64,
            Metric::UniqueKeys => MetricShape::StrInt,
            Metric::CntValid => MetricShape::IntInt,
            Metric::CntBw => MetricShape::IntU64,
            Metric::Dates => MetricShape::IntStore,
            Metric::AgentKeys => MetricShape::StrInt,
            Metric::AgentVals => MetricShape::IntStr,
            Metric::Hostnames => MetricShape::StrStr,
            Metric::LastParse => MetricShape::IntInt,
            Metric::Overall => MetricShape::StrInt,
            Metric::Seqs => MetricShape::StrInt,
        }
    }

    /// Whether a slot for this metric may be created in `scope`
    pub fn allowed_in(self, scope: MetricScope) -> bool {
        match self {
            Metric::Keymap
            | Metric::Rootmap
            | Metric::Datamap
            | Metric::Uniqmap
            | Metric::Root
            | Metric::Hits
            | Metric::Visitors
            | Metric::Bw
            | Metric::Cumts
            | Metric::Maxts
            | Metric::Methods
            | Metric::Protocols
            | Metric::Agents
            | Metric::Metadata => scope == MetricScope::Module,
            Metric::UniqueKeys | Metric::CntValid | Metric::CntBw => scope == MetricScope::Date,
            Metric::Dates
            | Metric::AgentKeys
            | Metric::AgentVals
            | Metric::Hostnames
            | Metric::LastParse
            | Metric::Overall => scope == MetricScope::Global,
            Metric::Seqs => scope != MetricScope::Module,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Metric::Keymap => "KEYMAP",
            Metric::Rootmap => "ROOTMAP",
            Metric::Datamap => "DATAMAP",
            Metric::Uniqmap => "UNIQMAP",
            Metric::Root => "ROOT",
            Metric::Hits => "HITS",
            Metric::Visitors => "VISITORS",
            Metric::Bw => "BW",
            Metric::Cumts => "CUMTS",
            Metric::Maxts => "MAXTS",
            Metric::Methods => "METHODS",
            Metric::Protocols => "PROTOCOLS",
            Metric::Agents => "AGENTS",
            Metric::Metadata => "METADATA",
            Metric::UniqueKeys => "UNIQUE_KEYS",
            Metric::CntValid => "CNT_VALID",
            Metric::CntBw => "CNT_BW",
            Metric::Dates => "DATES",
            Metric::AgentKeys => "AGENT_KEYS",
            Metric::AgentVals => "AGENT_VALS",
            Metric::Hostnames => "HOSTNAMES",
            Metric::LastParse => "LAST_PARSE",
            Metric::Overall => "OVERALL",
            Metric::Seqs => "SEQS",
        }
    }
}
