// Copyright (C) Back Engineering Labs, Inc. - All Rights Reserved
//
// Unauthorized copying of this file, via any medium is strictly prohibited
// Proprietary and confidential

/// Computes the minimum size of the structure, which is the max of all elements
/// offset + size in the struct.
#[macro_export]
macro_rules! struct_overlay_min_size {
    () => { 0 };
    ([$off:literal] $name:ident: $ty:ty,) => ($off + std::mem::size_of::<$ty>());
    ([$off:literal] $name:ident: $ty:ty, $($next:tt)+) => {{
        let l = $crate::struct_overlay_min_size!($($next)*);
        let r = ($off + std::mem::size_of::<$ty>());
        if l < r {
            r
        } else {
            l
        }
    }};
}

/// Generates one `get_<field>` per field. Scalars are always decoded as
/// little-endian through `scroll`, byte arrays are copied out.
#[macro_export]
macro_rules! struct_overlay_get_gen {
    () => {};
    ([$off:literal] $name:ident: [u8; $count:literal], $($next:tt)*) => {
        concat_idents::concat_idents!(get_name = get_, $name, {
            #[allow(dead_code)]
            #[inline(always)]
            pub fn get_name(&self) -> [u8; $count] {
                let mut out = [0u8; $count];
                out.copy_from_slice(&self.ptr[$off..$off + $count]);
                out
            }
        });
        $crate::struct_overlay_get_gen!($($next)*);
    };
    ([$off:literal] $name:ident: $ty:ty, $($next:tt)*) => {
        concat_idents::concat_idents!(get_name = get_, $name, {
            #[allow(dead_code)]
            #[inline(always)]
            pub fn get_name(&self) -> $ty {
                use scroll::Cread as _;
                // In bounds: the constructor checked MINIMUM_SIZE.
                let bytes: &[u8] = &self.ptr[..];
                bytes.cread_with::<$ty>($off as usize, scroll::LE)
            }
        });
        $crate::struct_overlay_get_gen!($($next)*);
    };
}

#[macro_export]
macro_rules! struct_overlay_debug_fields {
    ($dbg:ident, $bytes:ident,) => {};
    ($dbg:ident, $bytes:ident, [$off:literal] $name:ident: [u8; $count:literal], $($next:tt)*) => {
        $dbg.field(stringify!($name), &&$bytes[$off..$off + $count]);
        $crate::struct_overlay_debug_fields!($dbg, $bytes, $($next)*);
    };
    ($dbg:ident, $bytes:ident, [$off:literal] $name:ident: $ty:ty, $($next:tt)*) => {
        $dbg.field(stringify!($name), &$bytes.cread_with::<$ty>($off as usize, scroll::LE));
        $crate::struct_overlay_debug_fields!($dbg, $bytes, $($next)*);
    };
}

#[macro_export]
macro_rules! struct_overlay_debug_gen {
    ($struct_name:ident, $($next:tt)*) => {
        fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
            use scroll::Cread as _;
            let bytes: &[u8] = &self.ptr[..];
            let mut dbg = f.debug_struct(stringify!($struct_name));
            $crate::struct_overlay_debug_fields!(dbg, bytes, $($next)*);
            dbg.finish()
        }
    };
}

/// Read-only view over a borrowed byte slice.
#[macro_export]
macro_rules! struct_overlay {
    ($vis:vis $struct_name:ident { $($next:tt)* }) => {
        #[derive(Clone, Copy)]
        $vis struct $struct_name<'a> {
            ptr: &'a [u8]
        }
        impl<'a> $struct_name<'a> {
            const MINIMUM_SIZE: usize = $crate::struct_overlay_min_size!($($next)*);
            #[allow(dead_code)]
            #[inline]
            pub fn new(ptr: &'a [u8]) -> Option<Self> {
                if ptr.len() >= Self::MINIMUM_SIZE {
                    Some(Self {
                        ptr: &ptr[0..Self::MINIMUM_SIZE],
                    })
                } else {
                    None
                }
            }
            #[allow(dead_code)]
            pub const fn size() -> usize {
                Self::MINIMUM_SIZE
            }
            $crate::struct_overlay_get_gen!($($next)*);
        }
        impl<'a> core::fmt::Debug for $struct_name<'a> {
            $crate::struct_overlay_debug_gen!($struct_name, $($next)*);
        }
    }
}

/// Same layout language as [`struct_overlay!`], but the bytes are owned by
/// the value so it can outlive the buffer it was read from.
#[macro_export]
macro_rules! offset_struct {
    ($vis:vis $struct_name:ident { $($next:tt)* }) => {
        #[derive(Clone, Copy, PartialEq, Eq)]
        $vis struct $struct_name {
            ptr: [u8; $crate::struct_overlay_min_size!($($next)*)],
        }
        impl $struct_name {
            const MINIMUM_SIZE: usize = $crate::struct_overlay_min_size!($($next)*);
            #[allow(dead_code)]
            #[inline]
            pub fn from_bytes(bytes: [u8; $crate::struct_overlay_min_size!($($next)*)]) -> Self {
                Self { ptr: bytes }
            }
            #[allow(dead_code)]
            pub const fn size() -> usize {
                Self::MINIMUM_SIZE
            }
            #[allow(dead_code)]
            #[inline(always)]
            pub fn as_bytes(&self) -> &[u8] {
                &self.ptr
            }
            $crate::struct_overlay_get_gen!($($next)*);
        }
        impl core::fmt::Debug for $struct_name {
            $crate::struct_overlay_debug_gen!($struct_name, $($next)*);
        }
    }
}
