//! Per-operation argument contracts
//!
//! Every exported operation declares its exact arity and the kind expected
//! at each position. [`Contract::validate`] runs before any cryptographic
//! work and stops at the first violation, so a call that fails here never
//! reaches a handler.

use crate::error::CallError;
use crate::value::{Arg, HostValue, MarshalError};

/// The shape a single argument must have
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expect {
    String,
    StringSequence,
}

impl Expect {
    fn describe(&self) -> &'static str {
        match self {
            Expect::String => "a string",
            Expect::StringSequence => "an array of strings",
        }
    }
}

/// A named positional parameter
#[derive(Debug, Clone, Copy)]
pub struct Param {
    pub name: &'static str,
    pub expect: Expect,
}

/// The argument contract of one exported operation
#[derive(Debug, Clone, Copy)]
pub struct Contract {
    pub params: &'static [Param],
}

pub const GENERATE_IDENTITY: Contract = Contract { params: &[] };

pub const DECRYPT: Contract = Contract {
    params: &[
        Param {
            name: "armored_ciphertext",
            expect: Expect::String,
        },
        Param {
            name: "identity",
            expect: Expect::String,
        },
    ],
};

pub const ENCRYPT: Contract = Contract {
    params: &[
        Param {
            name: "plaintext",
            expect: Expect::String,
        },
        Param {
            name: "recipients",
            expect: Expect::StringSequence,
        },
    ],
};

impl Param {
    fn check(&self, position: usize, value: &HostValue) -> Result<Arg, CallError> {
        let expected = self.expect.describe();
        let arg = Arg::try_from(value).map_err(|e| match e {
            MarshalError::UnexpectedKind { kind } => CallError::Type {
                position,
                expected,
                found: kind,
            },
            MarshalError::UnexpectedElementKind { index, kind } => match self.expect {
                Expect::StringSequence => CallError::ElementType {
                    position,
                    expected,
                    index,
                    found: kind,
                },
                // an array where a string belongs is wrong as a whole
                Expect::String => CallError::Type {
                    position,
                    expected,
                    found: value.kind(),
                },
            },
        })?;

        match (self.expect, &arg) {
            (Expect::String, Arg::String(_)) | (Expect::StringSequence, Arg::StringSequence(_)) => {
                Ok(arg)
            }
            _ => Err(CallError::Type {
                position,
                expected,
                found: value.kind(),
            }),
        }
    }
}

impl Contract {
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Check the call's arguments against this contract and marshal them.
    pub fn validate(&self, args: &[HostValue]) -> Result<ValidatedArgs, CallError> {
        if args.len() != self.arity() {
            return Err(CallError::Arity {
                expected: self.arity(),
                got: args.len(),
            });
        }

        let mut validated = Vec::with_capacity(args.len());
        for (i, (param, value)) in self.params.iter().zip(args).enumerate() {
            let position = i + 1;
            let arg = param.check(position, value).inspect_err(|e| {
                tracing::debug!(param = param.name, position, error = %e, "argument rejected")
            })?;
            validated.push(arg);
        }

        Ok(ValidatedArgs(validated))
    }
}

/// Arguments that passed their operation's contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedArgs(Vec<Arg>);

impl ValidatedArgs {
    /// The string at `index` (0-based). Only valid for positions the
    /// contract declared as [`Expect::String`].
    pub fn string(&self, index: usize) -> Result<&str, CallError> {
        match self.0.get(index) {
            Some(Arg::String(s)) => Ok(s),
            other => Err(CallError::InternalFault(format!(
                "argument {} is {}, not a string",
                index + 1,
                other.map(Arg::kind_name).unwrap_or("missing")
            ))),
        }
    }

    /// The string sequence at `index` (0-based).
    pub fn strings(&self, index: usize) -> Result<&[String], CallError> {
        match self.0.get(index) {
            Some(Arg::StringSequence(items)) => Ok(items),
            other => Err(CallError::InternalFault(format!(
                "argument {} is {}, not an array of strings",
                index + 1,
                other.map(Arg::kind_name).unwrap_or("missing")
            ))),
        }
    }
}
