//! # Internal Macros
//!
//! Boilerplate reducers shared across codec modules.
//!
//! ## zerocopy_accessors!
//!
//! Generates getter and setter methods for zerocopy header fields stored as
//! little-endian `U64` words.
//!
//! ```ignore
//! use zerocopy::little_endian::U64;
//!
//! #[repr(C)]
//! struct Header {
//!     key_count: U64,
//! }
//!
//! impl Header {
//!     zerocopy_accessors! {
//!         key_count: u64,
//!     }
//! }
//!
//! // Generates:
//! // pub fn key_count(&self) -> u64 { self.key_count.get() }
//! // pub fn set_key_count(&mut self, val: u64) { self.key_count = U64::new(val); }
//! ```
//!
//! ## impl_native_int!
//!
//! Implements `NativeInt` for primitive integers, wiring each to its
//! descriptor name and `Value` variant.
//!
//! ```ignore
//! impl_native_int! {
//!     i8 => "Int8", Int8;
//!     u64 => "UInt64", UInt64;
//! }
//! ```

/// Generates getter and setter methods for zerocopy little-endian fields.
#[macro_export]
macro_rules! zerocopy_accessors {
    (@impl $field:ident, u64) => {
        ::paste::paste! {
            #[inline]
            pub fn $field(&self) -> u64 {
                self.$field.get()
            }

            #[inline]
            pub fn [<set_ $field>](&mut self, val: u64) {
                self.$field = ::zerocopy::little_endian::U64::new(val);
            }
        }
    };
    ($($field:ident : $ty:tt),* $(,)?) => {
        $(
            $crate::zerocopy_accessors!(@impl $field, $ty);
        )*
    };
}

/// Implements `NativeInt` for primitive integer types.
macro_rules! impl_native_int {
    ($($native:ty => $name:literal, $variant:ident);* $(;)?) => {
        $(
            impl $crate::column::NativeInt for $native {
                const NAME: &'static str = $name;
                const WIDTH: usize = ::std::mem::size_of::<$native>();

                #[inline]
                fn read_le(bytes: &[u8]) -> Self {
                    let mut buf = [0u8; ::std::mem::size_of::<$native>()];
                    buf.copy_from_slice(bytes);
                    <$native>::from_le_bytes(buf)
                }

                #[inline]
                fn write_le(self, out: &mut [u8]) {
                    out.copy_from_slice(&self.to_le_bytes());
                }

                #[inline]
                fn into_value(self) -> $crate::types::Value {
                    $crate::types::Value::$variant(self)
                }
            }
        )*
    };
}

pub(crate) use impl_native_int;
