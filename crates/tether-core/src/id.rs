//! Opaque identifiers exchanged across the native/managed boundary.

use std::fmt;

/// Reference to a managed-runtime object as seen from native code.
///
/// The value is opaque to Tether: it is whatever token the managed
/// runtime hands out for an object on an up-call result (a JNI local
/// reference, an interop pointer, an index into a runtime table). Two
/// `ObjectRef`s with different values may still denote the same managed
/// object, which is why identity is decided by
/// [`ManagedRuntime::is_same_object`](crate::ManagedRuntime::is_same_object)
/// and never by comparing these values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectRef(pub u64);

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "obj#{:#x}", self.0)
    }
}

impl From<u64> for ObjectRef {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Stable native-side handle standing in for a managed object.
///
/// Native extension code compares handles by value to decide whether two
/// references denote the same object, so the handle cache guarantees at
/// most one live `NativeHandle` per managed-object identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NativeHandle(pub u64);

impl fmt::Display for NativeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handle#{:#x}", self.0)
    }
}

impl From<u64> for NativeHandle {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Lifetime class of a cached handle.
///
/// A slot moves `Empty -> Live(Transient) -> Empty` or
/// `Empty -> Live(Permanent)`, and a permanent slot stays live for the
/// rest of the process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum HandleKind {
    /// Released by the normal release path.
    #[default]
    Transient,
    /// Never released by normal traffic; lives for process lifetime.
    Permanent,
}

impl HandleKind {
    /// Whether this handle survives `release`.
    pub fn is_permanent(self) -> bool {
        matches!(self, Self::Permanent)
    }
}

impl From<bool> for HandleKind {
    fn from(permanent: bool) -> Self {
        if permanent {
            Self::Permanent
        } else {
            Self::Transient
        }
    }
}

impl fmt::Display for HandleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transient => write!(f, "transient"),
            Self::Permanent => write!(f, "permanent"),
        }
    }
}
