// crates/iec61850-rs/src/types.rs

//! Basic types, functional constraints and the small bitmask/enumeration
//! types shared by every level of the object model.

use bitflags::bitflags;
use core::fmt;

// --- Basic Types ---

/// The declared basic type (`bType`) of a data attribute.
///
/// `Struct` marks a constructed attribute that owns sub-attributes and never
/// carries a scalar value. `Unknown` is produced for any `bType` string that
/// does not match the table below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BasicType {
    Boolean,
    Int8,
    Int16,
    Int24,
    Int32,
    Int64,
    Int128,
    Int8U,
    Int16U,
    Int24U,
    Int32U,
    Float32,
    Float64,
    Enum,
    Dbpos,
    Tcmd,
    Quality,
    Timestamp,
    VisString32,
    VisString64,
    VisString65,
    VisString129,
    VisString255,
    Unicode255,
    Octet64,
    EntryTime,
    EntryId,
    Check,
    ObjRef,
    Currency,
    PhyComAddr,
    TrgOps,
    OptFlds,
    SvOptFlds,
    Struct,
    Unknown,
}

/// How a literal of a given basic type is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Boolean,
    /// Signed integer of the given bit width.
    Signed(u8),
    /// Unsigned integer of the given bit width.
    Unsigned(u8),
    Float,
    /// Passed through as text.
    Text,
    /// Owns sub-attributes; has no scalar value.
    Structured,
}

/// `(SCL name, variant, value kind, engine type code)`.
///
/// This is the one place the basic type is switched on. Parsing, coercion and
/// the engine document all read from it.
const BASIC_TYPES: &[(&str, BasicType, ValueKind, &str)] = &[
    ("BOOLEAN", BasicType::Boolean, ValueKind::Boolean, "BOOLEAN"),
    ("INT8", BasicType::Int8, ValueKind::Signed(8), "INT8"),
    ("INT16", BasicType::Int16, ValueKind::Signed(16), "INT16"),
    ("INT24", BasicType::Int24, ValueKind::Signed(24), "INT32"),
    ("INT32", BasicType::Int32, ValueKind::Signed(32), "INT32"),
    ("INT64", BasicType::Int64, ValueKind::Signed(64), "INT64"),
    ("INT128", BasicType::Int128, ValueKind::Signed(64), "INT64"),
    ("INT8U", BasicType::Int8U, ValueKind::Unsigned(8), "INT8U"),
    ("INT16U", BasicType::Int16U, ValueKind::Unsigned(16), "INT16U"),
    ("INT24U", BasicType::Int24U, ValueKind::Unsigned(24), "INT32U"),
    ("INT32U", BasicType::Int32U, ValueKind::Unsigned(32), "INT32U"),
    ("FLOAT32", BasicType::Float32, ValueKind::Float, "FLOAT32"),
    ("FLOAT64", BasicType::Float64, ValueKind::Float, "FLOAT64"),
    ("Enum", BasicType::Enum, ValueKind::Signed(32), "ENUM"),
    ("Dbpos", BasicType::Dbpos, ValueKind::Signed(8), "CODED_ENUM"),
    ("Tcmd", BasicType::Tcmd, ValueKind::Signed(8), "CODED_ENUM"),
    ("Quality", BasicType::Quality, ValueKind::Unsigned(16), "QUALITY"),
    ("Timestamp", BasicType::Timestamp, ValueKind::Text, "TIMESTAMP"),
    ("VisString32", BasicType::VisString32, ValueKind::Text, "VIS_STRING_32"),
    ("VisString64", BasicType::VisString64, ValueKind::Text, "VIS_STRING_64"),
    ("VisString65", BasicType::VisString65, ValueKind::Text, "VIS_STRING_65"),
    ("VisString129", BasicType::VisString129, ValueKind::Text, "VIS_STRING_129"),
    ("VisString255", BasicType::VisString255, ValueKind::Text, "VIS_STRING_255"),
    ("Unicode255", BasicType::Unicode255, ValueKind::Text, "UNICODE_STRING_255"),
    ("Octet64", BasicType::Octet64, ValueKind::Text, "OCTET_STRING_64"),
    ("EntryTime", BasicType::EntryTime, ValueKind::Text, "ENTRY_TIME"),
    ("EntryID", BasicType::EntryId, ValueKind::Text, "OCTET_STRING_8"),
    ("Check", BasicType::Check, ValueKind::Text, "CHECK"),
    ("ObjRef", BasicType::ObjRef, ValueKind::Text, "VIS_STRING_129"),
    ("Currency", BasicType::Currency, ValueKind::Text, "CURRENCY"),
    ("PhyComAddr", BasicType::PhyComAddr, ValueKind::Text, "PHYCOMADDR"),
    ("TrgOps", BasicType::TrgOps, ValueKind::Text, "TRGOPS"),
    ("OptFlds", BasicType::OptFlds, ValueKind::Text, "OPTFLDS"),
    ("SvOptFlds", BasicType::SvOptFlds, ValueKind::Text, "SVOPTFLDS"),
    ("Struct", BasicType::Struct, ValueKind::Structured, "CONSTRUCTED"),
];

impl BasicType {
    /// Maps an SCL `bType` string to a basic type (case-insensitive).
    /// Unrecognised strings yield [`BasicType::Unknown`].
    pub fn from_scl(s: &str) -> Self {
        let s = s.trim();
        BASIC_TYPES
            .iter()
            .find(|(name, ..)| name.eq_ignore_ascii_case(s))
            .map_or(BasicType::Unknown, |(_, ty, ..)| *ty)
    }

    fn entry(self) -> Option<&'static (&'static str, BasicType, ValueKind, &'static str)> {
        BASIC_TYPES.iter().find(|(_, ty, ..)| *ty == self)
    }

    /// The canonical SCL spelling of this type.
    pub fn as_str(self) -> &'static str {
        self.entry().map_or("Unknown", |(name, ..)| name)
    }

    /// How literals of this type are coerced.
    pub fn kind(self) -> ValueKind {
        self.entry().map_or(ValueKind::Text, |(_, _, kind, _)| *kind)
    }

    /// The type code understood by the external protocol engine.
    pub fn protocol_code(self) -> &'static str {
        self.entry().map_or("UNKNOWN", |(.., code)| code)
    }

    pub fn is_structured(self) -> bool {
        self == BasicType::Struct
    }
}

impl fmt::Display for BasicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// --- Functional Constraints ---

/// Functional constraint (`fc`) partitioning attributes by usage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum FunctionalConstraint {
    /// No constraint declared anywhere on the ancestor chain.
    #[default]
    Unspecified,
    /// Status information
    ST,
    /// Measurands
    MX,
    /// Setpoint
    SP,
    /// Substitution
    SV,
    /// Configuration
    CF,
    /// Description
    DC,
    /// Setting group
    SG,
    /// Setting group editable
    SE,
    /// Service response
    SR,
    /// Operate received
    OR,
    /// Blocking
    BL,
    /// Extended definition
    EX,
    /// Control
    CO,
    /// Unicast sampled value control block
    US,
    /// Multicast sampled value control block
    MS,
    /// Unbuffered report control block
    RP,
    /// Buffered report control block
    BR,
    /// Log control block
    LG,
    /// GOOSE control block
    GO,
}

const FUNCTIONAL_CONSTRAINTS: &[(&str, FunctionalConstraint)] = &[
    ("ST", FunctionalConstraint::ST),
    ("MX", FunctionalConstraint::MX),
    ("SP", FunctionalConstraint::SP),
    ("SV", FunctionalConstraint::SV),
    ("CF", FunctionalConstraint::CF),
    ("DC", FunctionalConstraint::DC),
    ("SG", FunctionalConstraint::SG),
    ("SE", FunctionalConstraint::SE),
    ("SR", FunctionalConstraint::SR),
    ("OR", FunctionalConstraint::OR),
    ("BL", FunctionalConstraint::BL),
    ("EX", FunctionalConstraint::EX),
    ("CO", FunctionalConstraint::CO),
    ("US", FunctionalConstraint::US),
    ("MS", FunctionalConstraint::MS),
    ("RP", FunctionalConstraint::RP),
    ("BR", FunctionalConstraint::BR),
    ("LG", FunctionalConstraint::LG),
    ("GO", FunctionalConstraint::GO),
];

impl FunctionalConstraint {
    /// Parses an `fc` attribute (case-insensitive). Returns `None` for
    /// strings outside the known set.
    pub fn from_scl(s: &str) -> Option<Self> {
        let s = s.trim();
        FUNCTIONAL_CONSTRAINTS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(s))
            .map(|(_, fc)| *fc)
    }

    /// The two-letter code, or an empty string for `Unspecified`.
    pub fn as_str(self) -> &'static str {
        FUNCTIONAL_CONSTRAINTS
            .iter()
            .find(|(_, fc)| *fc == self)
            .map_or("", |(name, _)| name)
    }

    pub fn is_specified(self) -> bool {
        self != FunctionalConstraint::Unspecified
    }

    /// Returns `self` when specified, otherwise the inherited constraint.
    pub fn or_inherit(self, inherited: FunctionalConstraint) -> Self {
        if self.is_specified() { self } else { inherited }
    }
}

impl fmt::Display for FunctionalConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// --- Bitmasks ---

bitflags! {
    /// Trigger options of a data attribute or report/log control block.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TriggerOptions: u8 {
        const DATA_CHANGE = 0x01;
        const QUALITY_CHANGE = 0x02;
        const DATA_UPDATE = 0x04;
        const INTEGRITY = 0x08;
        const GENERAL_INTERROGATION = 0x10;
    }
}

bitflags! {
    /// Quality bitmask. The two low bits hold the validity code, read and
    /// written through [`Quality::validity`] and [`Quality::with_validity`];
    /// the named flags are the detail bits above it.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Quality: u16 {
        const OVERFLOW = 0x0004;
        const OUT_OF_RANGE = 0x0008;
        const BAD_REFERENCE = 0x0010;
        const OSCILLATORY = 0x0020;
        const FAILURE = 0x0040;
        const OLD_DATA = 0x0080;
        const INCONSISTENT = 0x0100;
        const INACCURATE = 0x0200;
        const SOURCE_SUBSTITUTED = 0x0400;
        const TEST = 0x0800;
        const OPERATOR_BLOCKED = 0x1000;
    }
}

/// Validity field of a [`Quality`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validity {
    Good,
    Invalid,
    Reserved,
    Questionable,
}

impl Validity {
    /// Two-bit code as stored in the low bits of a [`Quality`].
    pub const fn bits(self) -> u16 {
        match self {
            Validity::Good => 0,
            Validity::Invalid => 1,
            Validity::Reserved => 2,
            Validity::Questionable => 3,
        }
    }

    /// Decodes the low two bits of `bits`.
    pub const fn from_bits(bits: u16) -> Self {
        match bits & Quality::VALIDITY_MASK {
            0 => Validity::Good,
            1 => Validity::Invalid,
            2 => Validity::Reserved,
            _ => Validity::Questionable,
        }
    }
}

impl Quality {
    pub const GOOD: Quality = Quality::empty();
    const VALIDITY_MASK: u16 = 0x0003;

    pub fn validity(self) -> Validity {
        Validity::from_bits(self.bits())
    }

    /// Same detail flags with the validity field replaced.
    pub fn with_validity(self, validity: Validity) -> Quality {
        Quality::from_bits_retain((self.bits() & !Self::VALIDITY_MASK) | validity.bits())
    }
}

// --- Domain Enumerations ---

/// Double-bit position (`Dbpos`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbPos {
    Intermediate = 0,
    Off = 1,
    On = 2,
    BadState = 3,
}

impl DbPos {
    /// Decodes an ordinal; anything outside 0..=3 is rejected.
    pub fn from_ordinal(value: i64) -> Option<Self> {
        match value {
            0 => Some(DbPos::Intermediate),
            1 => Some(DbPos::Off),
            2 => Some(DbPos::On),
            3 => Some(DbPos::BadState),
            _ => None,
        }
    }

    /// Decodes the textual form used in configuration files.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        [
            ("intermediate-state", DbPos::Intermediate),
            ("off", DbPos::Off),
            ("on", DbPos::On),
            ("bad-state", DbPos::BadState),
        ]
        .into_iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, pos)| pos)
    }
}

/// Control model (`ctlModel`) of a controllable data object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlModel {
    StatusOnly = 0,
    DirectWithNormalSecurity = 1,
    SboWithNormalSecurity = 2,
    DirectWithEnhancedSecurity = 3,
    SboWithEnhancedSecurity = 4,
}

impl ControlModel {
    pub fn from_ordinal(value: i64) -> Option<Self> {
        match value {
            0 => Some(ControlModel::StatusOnly),
            1 => Some(ControlModel::DirectWithNormalSecurity),
            2 => Some(ControlModel::SboWithNormalSecurity),
            3 => Some(ControlModel::DirectWithEnhancedSecurity),
            4 => Some(ControlModel::SboWithEnhancedSecurity),
            _ => None,
        }
    }
}

// --- Timestamps ---

/// Last-update time of an attribute, in milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(pub u64);

impl Timestamp {
    /// Current wall-clock time.
    #[cfg(feature = "std")]
    pub fn now() -> Self {
        let millis = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Timestamp(millis)
    }

    pub fn as_millis(self) -> u64 {
        self.0
    }
}
