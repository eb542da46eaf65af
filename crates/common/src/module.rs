//! The host-facing export table
//!
//! A [`Module`] maps exported names to a contract and a handler. Every call
//! goes through the same path: the bridge launches a worker and hands back a
//! pending handle, the worker checks the arguments against the contract,
//! runs the handler, and settles the handle with the marshalled outcome.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::bridge::{Bridge, BridgeConfig, CallId, Completion, Promise};
use crate::contract::{self, Contract, ValidatedArgs};
use crate::error::CallError;
use crate::ops;
use crate::value::{HostValue, Outcome};
use crate::version::build_info;

pub const GENERATE_IDENTITY: &str = "generateIdentity";
pub const ENCRYPT: &str = "encrypt";
pub const DECRYPT: &str = "decrypt";

type SharedHandler = Arc<dyn Fn(&ValidatedArgs) -> Result<Outcome, CallError> + Send + Sync>;

#[derive(Clone)]
struct Export {
    contract: Contract,
    handler: SharedHandler,
}

pub struct Module {
    bridge: Bridge,
    exports: BTreeMap<&'static str, Export>,
}

impl Module {
    /// An empty module with no exports
    pub fn new(config: BridgeConfig) -> Self {
        Self {
            bridge: Bridge::new(config),
            exports: BTreeMap::new(),
        }
    }

    /// The `age` module: `generateIdentity`, `encrypt` and `decrypt`
    pub fn age(config: BridgeConfig) -> Self {
        let mut module = Self::new(config);
        module.register(
            GENERATE_IDENTITY,
            contract::GENERATE_IDENTITY,
            ops::generate_identity,
        );
        module.register(ENCRYPT, contract::ENCRYPT, ops::encrypt);
        module.register(DECRYPT, contract::DECRYPT, ops::decrypt);
        module
    }

    /// Build the `age` module, report it, and signal the host once that it
    /// is ready for calls.
    pub fn load(config: BridgeConfig, on_ready: impl FnOnce(&Module)) -> Self {
        let module = Self::age(config);
        let build = build_info();
        tracing::info!(
            version = build.crate_version,
            repo_version = build.version,
            build_profile = build.build_profile,
            age_version = build.age_version,
            exports = ?module.exports().collect::<Vec<_>>(),
            "age module loaded"
        );
        on_ready(&module);
        module
    }

    /// Add or replace an export.
    pub fn register<H>(&mut self, name: &'static str, contract: Contract, handler: H)
    where
        H: Fn(&ValidatedArgs) -> Result<Outcome, CallError> + Send + Sync + 'static,
    {
        self.exports.insert(
            name,
            Export {
                contract,
                handler: Arc::new(handler),
            },
        );
    }

    pub fn exports(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.exports.keys().copied()
    }

    /// Call an export, settling through host-supplied callbacks.
    pub fn call(
        &self,
        name: &str,
        args: Vec<HostValue>,
        completion: Box<dyn Completion>,
    ) -> CallId {
        let work = self.prepare(name, args);
        self.bridge.spawn(completion, move |settler| {
            settler.settle(work());
        })
    }

    /// Call an export and get a [`Promise`] for the result.
    pub fn invoke(&self, name: &str, args: Vec<HostValue>) -> Promise {
        self.bridge.invoke(self.prepare(name, args))
    }

    fn prepare(
        &self,
        name: &str,
        args: Vec<HostValue>,
    ) -> impl FnOnce() -> Result<HostValue, CallError> + Send + 'static {
        tracing::debug!(export = name, args = args.len(), "dispatching call");
        let export = self.exports.get(name).cloned();
        let name = name.to_string();
        move || {
            let export = export.ok_or(CallError::UnknownExport(name))?;
            let args = export.contract.validate(&args)?;
            (export.handler)(&args).map(HostValue::from)
        }
    }
}

impl Default for Module {
    fn default() -> Self {
        Self::age(BridgeConfig::default())
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("bridge", &self.bridge)
            .field("exports", &self.exports().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_age_module_exports() {
        let module = Module::default();
        let names: Vec<_> = module.exports().collect();
        assert_eq!(names, vec![DECRYPT, ENCRYPT, GENERATE_IDENTITY]);
    }

    #[test]
    fn test_load_signals_ready_once() {
        let mut ready = 0;
        let module = Module::load(BridgeConfig::default(), |m| {
            assert_eq!(m.exports().count(), 3);
            ready += 1;
        });
        assert_eq!(ready, 1);
        assert_eq!(module.exports().count(), 3);
    }

    #[test]
    fn test_unknown_export_rejects() {
        let module = Module::default();
        let err = module
            .invoke("generate_x25519_identity", vec![])
            .wait()
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnknownExport);
        assert_eq!(err.message, "unknown export: generate_x25519_identity");
    }
}
