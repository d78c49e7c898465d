//! # Codec Configuration Constants
//!
//! This module centralizes every protocol and tuning constant used by the
//! codecs. Constants that depend on each other are co-located and their
//! relationships are enforced with compile-time assertions.
//!
//! ## Dependency Graph
//!
//! ```text
//! DECIMAL32_MAX_PRECISION (9)
//!       │
//!       └─> DECIMAL64_MAX_PRECISION (18)
//!             │   Time(S) is stored as Decimal64(TIME_PRECISION, S), so
//!             │   TIME_PRECISION must equal this value.
//!             │
//!             └─> DECIMAL128_MAX_PRECISION (38)
//!                   │
//!                   └─> DECIMAL256_MAX_PRECISION (76)
//!                         Anything above is rejected by the descriptor parser.
//!
//! LC_UINT8_INDEX_LIMIT (2^8)
//!       │
//!       └─> LC_UINT16_INDEX_LIMIT (2^16)
//!             Dictionary sizes up to and including the limit use the
//!             narrower index width (largest index = limit - 1).
//!
//! BUFFER_POOL_SIZE_CLASSES (48)
//!       │
//!       └─> Class c holds buffers with capacity in [2^c, 2^(c+1)).
//!           48 classes cover every allocation below 256 TiB.
//! ```
//!
//! ## LowCardinality Header
//!
//! The dictionary wire header is three little-endian `u64` words (24 bytes):
//!
//! ```text
//! +----------------+---------------------------+----------------+
//! | version (= 1)  | index type | flag bits    | key count      |
//! +----------------+---------------------------+----------------+
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! use colwire::config::{NULL_DISPLAY, LC_HEADER_SIZE};
//! ```

// ============================================================================
// NULL HANDLING
// ============================================================================

/// Text rendered for a null row of a `Nullable(T)` column.
pub const NULL_DISPLAY: &str = "ᴺᵁᴸᴸ";

/// Literals recognized as null by `Nullable(T)` text ingestion.
pub const NULL_LITERALS: [&str; 4] = ["NULL", "null", "\\N", NULL_DISPLAY];

// ============================================================================
// DECIMAL PRECISION BREAKPOINTS
// Byte width of a decimal row is derived from its declared precision
// ============================================================================

/// Largest precision stored in 4 bytes.
pub const DECIMAL32_MAX_PRECISION: u8 = 9;

/// Largest precision stored in 8 bytes.
pub const DECIMAL64_MAX_PRECISION: u8 = 18;

/// Largest precision stored in 16 bytes.
pub const DECIMAL128_MAX_PRECISION: u8 = 38;

/// Largest precision stored in 32 bytes. Higher precisions are unsupported.
pub const DECIMAL256_MAX_PRECISION: u8 = 76;

/// Precision used by a bare `Decimal` descriptor.
pub const DEFAULT_DECIMAL_PRECISION: u8 = 10;

const _: () = assert!(
    DECIMAL32_MAX_PRECISION < DECIMAL64_MAX_PRECISION
        && DECIMAL64_MAX_PRECISION < DECIMAL128_MAX_PRECISION
        && DECIMAL128_MAX_PRECISION < DECIMAL256_MAX_PRECISION,
    "decimal precision breakpoints must be strictly increasing"
);

const _: () = assert!(
    DEFAULT_DECIMAL_PRECISION <= DECIMAL256_MAX_PRECISION,
    "default decimal precision must be representable"
);

// ============================================================================
// TEMPORAL KINDS
// ============================================================================

/// Precision used by a bare `DateTime64` descriptor (milliseconds).
pub const DEFAULT_DATETIME64_PRECISION: u8 = 3;

/// Largest DateTime64 precision (nanoseconds).
pub const MAX_DATETIME64_PRECISION: u8 = 9;

/// Precision of the decimal backing a `Time(S)` column.
pub const TIME_PRECISION: u8 = DECIMAL64_MAX_PRECISION;

/// Earliest calendar year accepted by `Date32`.
pub const DATE32_MIN_YEAR: i32 = 1900;

/// Latest calendar year accepted by `Date32`.
pub const DATE32_MAX_YEAR: i32 = 2299;

const _: () = assert!(
    TIME_PRECISION == DECIMAL64_MAX_PRECISION,
    "Time(S) must be backed by a Decimal64 row"
);

const _: () = assert!(
    DATE32_MIN_YEAR < 1970 && DATE32_MAX_YEAR > 1970,
    "Date32 range must straddle the Unix epoch"
);

// ============================================================================
// LOWCARDINALITY WIRE FORMAT
// ============================================================================

/// Size of the dictionary header in bytes (three u64 words).
pub const LC_HEADER_SIZE: usize = 24;

/// Serialization version written in the first header word.
pub const LC_SHARED_DICTIONARIES_WITH_ADDITIONAL_KEYS: u64 = 1;

/// Index type tags stored in the low byte of the second header word.
pub const LC_INDEX_U8: u64 = 0;
pub const LC_INDEX_U16: u64 = 1;
pub const LC_INDEX_U32: u64 = 2;
pub const LC_INDEX_U64: u64 = 3;

/// Mask selecting the index type tag from the second header word.
pub const LC_INDEX_TYPE_MASK: u64 = 0xFF;

/// The block carries its own dictionary keys.
pub const LC_HAS_ADDITIONAL_KEYS: u64 = 1 << 9;

/// The receiver must replace its dictionary with the keys in this block.
pub const LC_NEED_UPDATE_DICTIONARY: u64 = 1 << 10;

/// Flags written by this crate on every LowCardinality block.
pub const LC_UPDATE_ALL: u64 = LC_HAS_ADDITIONAL_KEYS | LC_NEED_UPDATE_DICTIONARY;

/// Dictionaries with at most this many keys use 8-bit indices.
pub const LC_UINT8_INDEX_LIMIT: usize = 1 << 8;

/// Dictionaries with at most this many keys use 16-bit indices.
pub const LC_UINT16_INDEX_LIMIT: usize = 1 << 16;

const _: () = assert!(
    LC_HEADER_SIZE == 3 * std::mem::size_of::<u64>(),
    "LowCardinality header is three u64 words"
);

const _: () = assert!(
    LC_UPDATE_ALL & LC_INDEX_TYPE_MASK == 0,
    "LowCardinality flag bits must not overlap the index type tag"
);

// ============================================================================
// BUFFER POOL AND ARENA
// ============================================================================

/// Number of power-of-two size classes kept by the buffer pool.
pub const BUFFER_POOL_SIZE_CLASSES: usize = 48;

/// Maximum number of idle buffers retained per size class.
pub const DEFAULT_BUFFER_POOL_RETAIN: usize = 16;

/// Largest column block, in bytes, a codec is created for or decodes from a
/// stream whose length is unknown.
pub const MAX_BLOCK_BYTES: usize = 1 << 30;

/// Distinct descriptors a factory keeps parsed.
pub const MAX_CACHED_BLUEPRINTS: usize = 1024;

/// Initial byte capacity of a variable-length row arena.
pub const ARENA_INITIAL_CAPACITY: usize = 1024;

const _: () = assert!(
    ARENA_INITIAL_CAPACITY.is_power_of_two(),
    "arena capacity doubles from a power of two"
);
