//! TEAM_450: Error handling infrastructure for the multiwait crates.
//!
//! Provides the `define_error!` macro so every layer (syscall wrappers,
//! semaphore protocol, alternation harness) reports failures the same way:
//! a `Copy` enum with a subsystem byte, a per-variant code and a fixed
//! description.
//!
//! ## Usage
//!
//! ### Simple errors (no inner data)
//! ```ignore
//! define_error! {
//!     pub enum ProbeError(0x09) {
//!         Missing = 0x01 => "Facility missing",
//!     }
//! }
//! ```
//!
//! ### Nested errors (with inner error type)
//! ```ignore
//! define_error! {
//!     pub enum HarnessError(0x02) {
//!         Protocol(SyncError) = 0x03 => "Protocol failure",
//!     }
//! }
//! ```

#![no_std]

/// Declare a coded error enum.
///
/// Each variant carries a one-byte code and a fixed description; a variant
/// may wrap one `Copy + Display` value (an `Errno`, or the error of the layer
/// below), which `Display` appends in parentheses. The generated enum is
/// `Copy`, so it can cross a fork boundary or sit in a shared ledger as is.
#[macro_export]
macro_rules! define_error {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident($subsystem:literal) {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $(($inner:ty))? = $code:literal => $desc:literal
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant $(($inner))?,
            )*
        }

        impl $name {
            /// High byte of every code in this enum.
            pub const SUBSYSTEM: u8 = $subsystem;

            /// Variant byte and description, ignoring any wrapped value.
            const fn entry(&self) -> (u8, &'static str) {
                match self {
                    $( $crate::define_error!(@arm $variant $(($inner))?, _) => ($code, $desc), )*
                }
            }

            /// `SUBSYSTEM << 8 | variant`, printed as `E{:04X}`.
            pub const fn code(&self) -> u16 {
                ((Self::SUBSYSTEM as u16) << 8) | self.entry().0 as u16
            }

            /// Fixed description of the variant.
            pub const fn name(&self) -> &'static str {
                self.entry().1
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "E{:04X}: {}", self.code(), self.name())?;
                match self {
                    $( $crate::define_error!(@arm $variant $(($inner))?, cause) => {
                        $crate::define_error!(@cause f $(($inner))? cause)
                    } )*
                }
            }
        }

        impl core::error::Error for $name {}
    };

    // Match a variant, binding its payload (if any) to `$bind`.
    (@arm $variant:ident ($inner:ty), $bind:tt) => { Self::$variant($bind) };
    (@arm $variant:ident, $bind:tt) => { Self::$variant };

    // Suffix for the wrapped value; nothing for plain variants.
    (@cause $f:ident ($inner:ty) $bind:ident) => { write!($f, " ({})", $bind) };
    (@cause $f:ident $bind:ident) => { Ok(()) };
}

#[cfg(test)]
mod tests {
    extern crate std;
    use std::format;

    define_error! {
        /// Stand-in for a leaf error such as a raw errno wrapper
        pub enum WaitError(0x11) {
            /// Blocking call failed
            Failed = 0x01 => "Blocking wait failed",
            Expired = 0x02 => "Deadline expired",
        }
    }

    define_error! {
        pub enum RoundError(0x12) {
            Wait(WaitError) = 0x01 => "Round aborted",
            OutOfTurn = 0x02 => "Party ran out of turn",
        }
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(WaitError::Failed.code(), 0x1101);
        assert_eq!(WaitError::Expired.code(), 0x1102);
        assert_eq!(RoundError::Wait(WaitError::Expired).code(), 0x1201);
        assert_eq!(RoundError::OutOfTurn.code(), 0x1202);
    }

    #[test]
    fn test_error_names() {
        assert_eq!(WaitError::Failed.name(), "Blocking wait failed");
        assert_eq!(RoundError::Wait(WaitError::Failed).name(), "Round aborted");
    }

    #[test]
    fn test_display_format() {
        assert_eq!(format!("{}", WaitError::Expired), "E1102: Deadline expired");
        assert_eq!(
            format!("{}", RoundError::Wait(WaitError::Failed)),
            "E1201: Round aborted (E1101: Blocking wait failed)"
        );
    }

    #[test]
    fn test_subsystem_constant() {
        assert_eq!(WaitError::SUBSYSTEM, 0x11);
        assert_eq!(RoundError::SUBSYSTEM, 0x12);
    }

    #[test]
    fn test_copy_and_eq() {
        let e = RoundError::Wait(WaitError::Expired);
        let copied = e;
        assert_eq!(e, copied);
        assert_ne!(e, RoundError::OutOfTurn);
    }
}
