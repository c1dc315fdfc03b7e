//! Compiled-method identity and generic-sharing resolution.
//!
//! A [`MethodKey`] names one compiled method body: a `MethodDef` token plus, for generic
//! methods, the instantiation it was compiled for. Sequence-point blobs are registered under
//! the key of the body that was actually compiled, which for shared generic code is not the
//! key the debugger later asks about. [`GenericSharing`] bridges that gap by mapping an
//! inflated method to the keys its blob may have been registered under.
//!
//! # Key Components
//!
//! - [`MethodKey`] - Identity of a compiled method
//! - [`Instantiation`] / [`TypeArg`] - Generic arguments of an inflated method
//! - [`GenericSharing`] - Resolution of declaring and shared methods
//! - [`FullSharing`] - Default resolution where every argument shares one body
//!
//! # Examples
//!
//! ```rust
//! use seqpoints::metadata::{MethodKey, Token, TypeArg};
//!
//! let open = MethodKey::new(Token::method_def(4));
//! let closed = MethodKey::inflated(Token::method_def(4), vec![TypeArg::Type(Token(0x0200_0002))]);
//!
//! assert!(!open.is_inflated());
//! assert!(closed.is_inflated());
//! assert_eq!(closed.declaring_generic_method(), Some(open));
//! assert!(closed.shared_method().unwrap().is_shared());
//! ```

use std::fmt;

use crate::metadata::token::Token;

/// A single generic argument of an inflated method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeArg {
    /// A concrete type, referenced by its `TypeDef`, `TypeRef` or `TypeSpec` token
    Type(Token),
    /// The canonical placeholder substituted for arguments of shared generic code
    Canon,
}

impl fmt::Display for TypeArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeArg::Type(token) => write!(f, "{token}"),
            TypeArg::Canon => f.write_str("__Canon"),
        }
    }
}

/// The generic context a method body was compiled for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Instantiation {
    /// A non-generic method, or the open generic method definition itself
    #[default]
    Definition,
    /// A generic method inflated with concrete (or canonical) arguments
    Inflated(Vec<TypeArg>),
}

/// Identity of a compiled method, used as the registry key for its sequence points.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodKey {
    token: Token,
    instantiation: Instantiation,
}

impl MethodKey {
    /// Creates the key of a non-generic method or of a generic method definition.
    #[must_use]
    pub fn new(token: Token) -> Self {
        MethodKey {
            token,
            instantiation: Instantiation::Definition,
        }
    }

    /// Creates the key of a generic method inflated with `args`.
    #[must_use]
    pub fn inflated(token: Token, args: Vec<TypeArg>) -> Self {
        MethodKey {
            token,
            instantiation: Instantiation::Inflated(args),
        }
    }

    /// Returns the `MethodDef` token of the method body.
    #[must_use]
    pub fn token(&self) -> Token {
        self.token
    }

    /// Returns the generic context of this key.
    #[must_use]
    pub fn instantiation(&self) -> &Instantiation {
        &self.instantiation
    }

    /// Returns true if this key names a generic instantiation.
    #[must_use]
    pub fn is_inflated(&self) -> bool {
        matches!(self.instantiation, Instantiation::Inflated(_))
    }

    /// Returns true if every generic argument is the canonical placeholder.
    #[must_use]
    pub fn is_shared(&self) -> bool {
        match &self.instantiation {
            Instantiation::Definition => false,
            Instantiation::Inflated(args) => args.iter().all(|arg| *arg == TypeArg::Canon),
        }
    }

    /// Returns the open generic definition this instantiation was created from.
    ///
    /// `None` for keys that are not inflated.
    #[must_use]
    pub fn declaring_generic_method(&self) -> Option<MethodKey> {
        self.is_inflated().then(|| MethodKey::new(self.token))
    }

    /// Returns the canonical instantiation whose body is shared by this method.
    ///
    /// `None` for keys that are not inflated. A key that is already shared maps to itself.
    #[must_use]
    pub fn shared_method(&self) -> Option<MethodKey> {
        match &self.instantiation {
            Instantiation::Definition => None,
            Instantiation::Inflated(args) => Some(MethodKey::inflated(
                self.token,
                vec![TypeArg::Canon; args.len()],
            )),
        }
    }
}

impl From<Token> for MethodKey {
    fn from(token: Token) -> Self {
        MethodKey::new(token)
    }
}

impl fmt::Display for MethodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.token)?;
        if let Instantiation::Inflated(args) = &self.instantiation {
            f.write_str("<")?;
            for (index, arg) in args.iter().enumerate() {
                if index > 0 {
                    f.write_str(",")?;
                }
                write!(f, "{arg}")?;
            }
            f.write_str(">")?;
        }
        Ok(())
    }
}

/// Resolves the alternative registry keys of an inflated method.
///
/// The decision which instantiations share code belongs to the compiler; lookups only need
/// to know where to look next when the exact key misses.
pub trait GenericSharing: Send + Sync {
    /// Returns the generic method definition `method` was inflated from, if any.
    fn declaring_generic_method(&self, method: &MethodKey) -> Option<MethodKey>;

    /// Returns the shared instantiation whose code `method` runs, if any.
    fn shared_method(&self, method: &MethodKey) -> Option<MethodKey>;
}

/// Sharing policy where every instantiation of a generic method runs one canonical body.
#[derive(Debug, Clone, Copy, Default)]
pub struct FullSharing;

impl GenericSharing for FullSharing {
    fn declaring_generic_method(&self, method: &MethodKey) -> Option<MethodKey> {
        method.declaring_generic_method()
    }

    fn shared_method(&self, method: &MethodKey) -> Option<MethodKey> {
        method.shared_method()
    }
}
