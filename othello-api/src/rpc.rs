/// RPC method table
///
/// Every method the service declares is listed here with its capability.
/// Game methods are declared but answer `unimplemented` until the game
/// engine lands; names that are not listed at all answer `not_found`.

/// Whether a declared method has a handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Implemented,
    NotYetImplemented,
}

/// A declared RPC method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Method {
    pub name: &'static str,
    pub capability: Capability,
}

/// Declared methods of the account and game service
pub const METHODS: &[Method] = &[
    Method {
        name: "CreateAccount",
        capability: Capability::Implemented,
    },
    Method {
        name: "Authenticate",
        capability: Capability::Implemented,
    },
    // Alias kept for clients that call the password flow "Login"
    Method {
        name: "Login",
        capability: Capability::Implemented,
    },
    Method {
        name: "DeleteAccount",
        capability: Capability::Implemented,
    },
    Method {
        name: "ShowGames",
        capability: Capability::NotYetImplemented,
    },
    Method {
        name: "GetGame",
        capability: Capability::NotYetImplemented,
    },
    Method {
        name: "MakeMove",
        capability: Capability::NotYetImplemented,
    },
];

/// Finds a declared method by name (case-sensitive)
pub fn lookup(name: &str) -> Option<&'static Method> {
    METHODS.iter().find(|method| method.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_declared_methods() {
        assert_eq!(
            lookup("CreateAccount").map(|m| m.capability),
            Some(Capability::Implemented)
        );
        assert_eq!(
            lookup("MakeMove").map(|m| m.capability),
            Some(Capability::NotYetImplemented)
        );
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        assert!(lookup("createaccount").is_none());
        assert!(lookup("Resign").is_none());
    }

    #[test]
    fn test_method_names_unique() {
        for (i, a) in METHODS.iter().enumerate() {
            for b in &METHODS[i + 1..] {
                assert_ne!(a.name, b.name);
            }
        }
    }
}
