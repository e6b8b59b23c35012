use std::collections::HashMap;

use bytes::Bytes;

use super::codec::Request;
use super::commands::Command;
use super::error::CommandError;
use super::utils::extract_string;

/// Builds a [`Command`] from its arguments, rejecting bad arity or values.
pub type Constructor = fn(Vec<Bytes>) -> Result<Command, CommandError>;

/// Lower-cased command name → constructor.
///
/// Immutable once built, so it is shared between connections behind an
/// `Arc` without any locking.
#[derive(Debug, Clone)]
pub struct Registry {
    commands: HashMap<&'static str, Constructor>,
}

#[derive(Debug, Default)]
pub struct RegistryBuilder {
    commands: HashMap<&'static str, Constructor>,
}

impl RegistryBuilder {
    /// Adds `name`; a later registration of the same name wins. Names are
    /// matched case-insensitively, so they are stored lower-cased.
    pub fn register(mut self, name: &'static str, constructor: Constructor) -> Self {
        debug_assert!(
            name.bytes().all(|b| !b.is_ascii_uppercase()),
            "command names are registered lower-case"
        );
        self.commands.insert(name, constructor);
        self
    }

    pub fn build(self) -> Registry {
        Registry {
            commands: self.commands,
        }
    }
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// The server's command set.
    pub fn builtin() -> Self {
        Self::builder()
            .register("ping", Command::ping)
            .register("echo", Command::echo)
            .register("push", Command::push)
            .register("pop", Command::pop)
            .register("length", Command::length)
            .register("command", Command::command)
            .register("quit", Command::quit)
            .build()
    }

    /// Looks up the request's command and validates its arguments. Nothing
    /// is executed here.
    pub fn resolve(&self, request: Request) -> Result<Command, CommandError> {
        let name = extract_string(&request.name).to_ascii_lowercase();
        match self.commands.get(name.as_str()) {
            Some(constructor) => constructor(request.args),
            None => {
                let args = request.args.iter().map(|arg| extract_string(arg)).collect();
                Err(CommandError::unknown(name, args))
            }
        }
    }

    /// Registered names, in no particular order.
    pub fn names(&self) -> impl ExactSizeIterator<Item = &'static str> + '_ {
        self.commands.keys().copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::builtin()
    }
}
