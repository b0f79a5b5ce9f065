// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Local objects assembled at runtime.

use super::meta::{MetaObject, MetaObjectBuilder};
use super::{AnyObject, CallMetrics, CallMetricsSnapshot, MetaCallType, ObjectThreadingModel};
use crate::error::{Error, ErrorKind, Result};
use crate::exec::{default_context, run_async, ExecutionContext, Strand};
use crate::function::{AnyFunction, FunctionKind};
use crate::future::Future;
use crate::signal::{link_signal_id, SignalBus, SignalLink, SignalSubscriber};
use crate::signature::Signature;
use crate::types::{ObjectType, TypeDescriptor, Value};
use parking_lot::Mutex;
use std::any::Any;
use std::fmt;
use std::sync::{Arc, OnceLock, Weak};

enum Slot {
    Method {
        function: AnyFunction,
        call_type: MetaCallType,
    },
    /// Bus is created on first use.
    Signal { bus: OnceLock<SignalBus> },
    Property {
        value: Mutex<Value>,
        desc: TypeDescriptor,
        changed: OnceLock<SignalBus>,
    },
}

/// Object whose members were registered through an [`ObjectBuilder`].
///
/// Always lives in an `Arc`; method receivers and signal subscribers refer
/// back to it through that `Arc`.
pub struct DynamicObject {
    this: Weak<DynamicObject>,
    object_type: ObjectType,
    meta: MetaObject,
    slots: Vec<Slot>,
    context: Option<Arc<dyn ExecutionContext>>,
    threading: ObjectThreadingModel,
    native: Option<Arc<dyn Any + Send + Sync>>,
    metrics: CallMetrics,
}

impl DynamicObject {
    pub fn object_type(&self) -> &ObjectType {
        &self.object_type
    }

    pub fn meta_object(&self) -> &MetaObject {
        &self.meta
    }

    pub fn threading_model(&self) -> ObjectThreadingModel {
        self.threading
    }

    /// Context queued calls run on; `None` means the default context.
    pub fn execution_context(&self) -> Option<&Arc<dyn ExecutionContext>> {
        self.context.as_ref()
    }

    pub fn native<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        Arc::clone(self.native.as_ref()?).downcast::<T>().ok()
    }

    pub fn metrics(&self) -> CallMetricsSnapshot {
        self.metrics.snapshot()
    }

    fn handle(&self) -> Result<AnyObject> {
        self.this
            .upgrade()
            .map(AnyObject::Local)
            .ok_or_else(|| Error::new(ErrorKind::UnknownException, "object is being destroyed"))
    }

    // ===================================================================
    // Methods
    // ===================================================================

    pub fn meta_call(&self, method_id: u32, args: &[Value], call_type: MetaCallType) -> Future {
        self.meta_call_expecting(method_id, args, call_type, None)
    }

    /// Dispatch `method_id`; see [`MetaCallType`] for where it runs.
    pub fn meta_call_expecting(
        &self,
        method_id: u32,
        args: &[Value],
        call_type: MetaCallType,
        returns: Option<&Signature>,
    ) -> Future {
        self.metrics.record_call();
        let (function, declared) = match self.slots.get(method_id as usize) {
            Some(Slot::Method {
                function,
                call_type,
            }) => (function.clone(), *call_type),
            _ => {
                log::debug!(
                    "[dispatch] {}: no method {}",
                    self.object_type.name(),
                    method_id
                );
                return self.rejected(Error::method_not_found(method_id));
            }
        };
        if let Some(expected) = returns {
            let actual = function.return_signature();
            if actual.is_convertible_to(expected) == 0.0 {
                return self.rejected(Error::type_mismatch(format!(
                    "method {} returns {}, caller expects {}",
                    method_id, actual, expected
                )));
            }
        }
        let receiver = if function.kind() == FunctionKind::Method {
            match self.handle() {
                Ok(object) => Some(object),
                Err(e) => return self.rejected(e),
            }
        } else {
            None
        };

        let call_type = match call_type {
            MetaCallType::Auto => declared,
            explicit => explicit,
        };
        let inline = match call_type {
            MetaCallType::Direct => true,
            MetaCallType::Queued => false,
            MetaCallType::Auto => match &self.context {
                None => true,
                Some(context) => context.is_in_this_context(),
            },
        };

        if inline {
            let outcome = invoke(&function, receiver, args);
            self.metrics.record_outcome(outcome.is_ok());
            return Future::from_result(outcome);
        }

        // queued calls own copies of their arguments
        let args = args.to_vec();
        let Some(this) = self.this.upgrade() else {
            return self.rejected(Error::new(
                ErrorKind::UnknownException,
                "object is being destroyed",
            ));
        };
        self.metrics.record_queued();
        log::trace!(
            "[dispatch] {}: queue method {}",
            self.object_type.name(),
            method_id
        );
        let job = move || {
            let outcome = invoke(&function, receiver, &args);
            this.metrics.record_outcome(outcome.is_ok());
            outcome
        };
        match &self.context {
            Some(context) => run_async(context.as_ref(), job),
            None => run_async(default_context().as_ref(), job),
        }
    }

    /// Fail a call before it runs. Counted like any other failed call.
    fn rejected(&self, error: Error) -> Future {
        self.metrics.record_outcome(false);
        Future::from_error(error)
    }

    /// Call the best overload of `name` for `args`.
    pub fn call(&self, name: &str, args: &[Value], call_type: MetaCallType) -> Future {
        match self.meta.find_method(name, &crate::codec::args_signature(args)) {
            Ok(id) => self.meta_call(id, args, call_type),
            Err(e) => Future::from_error(e),
        }
    }

    // ===================================================================
    // Signals
    // ===================================================================

    fn bus(&self, signal_id: u32) -> Option<&SignalBus> {
        match self.slots.get(signal_id as usize)? {
            Slot::Signal { bus } => Some(bus.get_or_init(|| SignalBus::new(signal_id))),
            Slot::Property { changed, .. } => {
                Some(changed.get_or_init(|| SignalBus::new(signal_id)))
            }
            Slot::Method { .. } => None,
        }
    }

    /// Trigger `signal_id`.
    ///
    /// An id naming a method is forwarded to `meta_call` with
    /// [`MetaCallType::Auto`]; its failure is only logged.
    pub fn meta_emit(&self, signal_id: u32, args: &[Value]) -> Result<()> {
        if let Some(bus) = self.bus(signal_id) {
            bus.trigger(args);
            return Ok(());
        }
        if matches!(self.slots.get(signal_id as usize), Some(Slot::Method { .. })) {
            log::debug!(
                "[dispatch] {}: meta_emit on method {}, calling it",
                self.object_type.name(),
                signal_id
            );
            let name = self.object_type.name().to_string();
            self.meta_call(signal_id, args, MetaCallType::Auto)
                .connect(move |done| {
                    if let Some(e) = done.error() {
                        log::warn!("[dispatch] {}: emit of method {} failed: {}", name, signal_id, e);
                    }
                });
            return Ok(());
        }
        log::error!(
            "[dispatch] {}: meta_emit: no such event {}",
            self.object_type.name(),
            signal_id
        );
        Err(Error::signal_not_found(signal_id))
    }

    /// Subscribe to a signal, or to a property's change notification.
    pub fn connect(&self, signal_id: u32, subscriber: SignalSubscriber) -> Result<SignalLink> {
        let bus = self
            .bus(signal_id)
            .ok_or_else(|| Error::signal_not_found(signal_id))?;
        Ok(bus.connect(subscriber))
    }

    pub fn disconnect(&self, link: SignalLink) -> Result<bool> {
        let signal_id = link_signal_id(link);
        let bus = self
            .bus(signal_id)
            .ok_or_else(|| Error::signal_not_found(signal_id))?;
        Ok(bus.disconnect(link))
    }

    // ===================================================================
    // Properties
    // ===================================================================

    pub fn meta_property(&self, property_id: u32) -> Result<Value> {
        match self.slots.get(property_id as usize) {
            Some(Slot::Property { value, .. }) => Ok(value.lock().clone()),
            _ => Err(Error::property_not_found(property_id)),
        }
    }

    /// Store `value` converted to the property type, then notify
    /// subscribers of the change signal with the stored value.
    pub fn meta_set_property(&self, property_id: u32, value: Value) -> Result<()> {
        let Some(Slot::Property {
            value: slot,
            desc,
            changed,
        }) = self.slots.get(property_id as usize)
        else {
            return Err(Error::property_not_found(property_id));
        };
        let stored = value.into_converted(desc)?;
        *slot.lock() = stored.clone();
        if let Some(bus) = changed.get() {
            bus.trigger(&[stored]);
        }
        Ok(())
    }

    pub fn property(&self, name: &str) -> Result<Value> {
        let id = self.property_id(name)?;
        self.meta_property(id)
    }

    pub fn set_property(&self, name: &str, value: Value) -> Result<()> {
        let id = self.property_id(name)?;
        self.meta_set_property(id, value)
    }

    fn property_id(&self, name: &str) -> Result<u32> {
        self.meta.property_id(name).ok_or_else(|| {
            Error::new(
                ErrorKind::PropertyNotFound,
                format!("Can't find property: {}", name),
            )
        })
    }
}

fn invoke(function: &AnyFunction, receiver: Option<AnyObject>, args: &[Value]) -> Result<Value> {
    match receiver {
        Some(object) => {
            let mut full = Vec::with_capacity(args.len() + 1);
            full.push(Value::object(object));
            full.extend_from_slice(args);
            function.call(&full)
        }
        None => function.call(args),
    }
}

impl fmt::Debug for DynamicObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicObject")
            .field("type", &self.object_type.name())
            .field("members", &self.meta.len())
            .field("threading", &self.threading)
            .finish()
    }
}

// =======================================================================
// Builder
// =======================================================================

enum PendingSlot {
    Method(AnyFunction, MetaCallType),
    Signal,
    Property(Value),
}

/// Assembles a [`DynamicObject`].
///
/// Registration errors (duplicate members, bad signatures) are reported by
/// [`build`](Self::build).
pub struct ObjectBuilder {
    object_type: ObjectType,
    meta: MetaObjectBuilder,
    slots: Vec<PendingSlot>,
    context: Option<Arc<dyn ExecutionContext>>,
    threading: ObjectThreadingModel,
    native: Option<Arc<dyn Any + Send + Sync>>,
    error: Option<Error>,
}

impl ObjectBuilder {
    pub fn new(name: &str) -> Self {
        Self::with_type(ObjectType::new(name))
    }

    /// Builder for an object type that declares bases.
    pub fn with_type(object_type: ObjectType) -> Self {
        Self {
            object_type,
            meta: MetaObjectBuilder::new(),
            slots: Vec::new(),
            context: None,
            threading: ObjectThreadingModel::default(),
            native: None,
            error: None,
        }
    }

    #[must_use]
    pub fn description(mut self, description: &str) -> Self {
        self.meta = self.meta.description(description);
        self
    }

    /// Attach native state; method receivers of type `T` resolve to it.
    #[must_use]
    pub fn with_native<T: Any + Send + Sync>(mut self, native: Arc<T>) -> Self {
        self.native = Some(native);
        self
    }

    #[must_use]
    pub fn with_context(mut self, context: Arc<dyn ExecutionContext>) -> Self {
        self.context = Some(context);
        self
    }

    #[must_use]
    pub fn with_threading(mut self, threading: ObjectThreadingModel) -> Self {
        self.threading = threading;
        self
    }

    fn record(&mut self, outcome: Result<u32>, slot: PendingSlot) {
        match outcome {
            Ok(_) => self.slots.push(slot),
            Err(e) => {
                if self.error.is_none() {
                    self.error = Some(e);
                }
            }
        }
    }

    #[must_use]
    pub fn advertise_method(self, name: &str, function: AnyFunction) -> Self {
        self.advertise_method_with(name, function, MetaCallType::Auto, "")
    }

    /// Register a method with its own default call type and description.
    #[must_use]
    pub fn advertise_method_with(
        mut self,
        name: &str,
        function: AnyFunction,
        call_type: MetaCallType,
        description: &str,
    ) -> Self {
        let outcome = self.meta.add_method(
            name,
            function.parameters_signature(),
            function.return_signature().clone(),
            description,
        );
        self.record(outcome, PendingSlot::Method(function, call_type));
        self
    }

    /// Register a signal with parameter tuple `parameters`, e.g. `(i)`.
    #[must_use]
    pub fn advertise_signal(mut self, name: &str, parameters: &str) -> Self {
        let outcome =
            Signature::parse(parameters).and_then(|sig| self.meta.add_signal(name, sig));
        self.record(outcome, PendingSlot::Signal);
        self
    }

    /// Register a property; its type is the type of `initial`.
    #[must_use]
    pub fn advertise_property(mut self, name: &str, initial: Value) -> Self {
        let outcome = self.meta.add_property(name, initial.signature().clone());
        self.record(outcome, PendingSlot::Property(initial));
        self
    }

    pub fn build(self) -> Result<Arc<DynamicObject>> {
        if let Some(error) = self.error {
            return Err(error);
        }
        let context = match self.threading {
            ObjectThreadingModel::SingleThread => {
                let target = self
                    .context
                    .unwrap_or_else(|| default_context() as Arc<dyn ExecutionContext>);
                Some(Arc::new(Strand::new(self.object_type.name(), target))
                    as Arc<dyn ExecutionContext>)
            }
            ObjectThreadingModel::MultiThread => self.context,
        };
        let slots = self
            .slots
            .into_iter()
            .map(|slot| match slot {
                PendingSlot::Method(function, call_type) => Slot::Method {
                    function,
                    call_type,
                },
                PendingSlot::Signal => Slot::Signal {
                    bus: OnceLock::new(),
                },
                PendingSlot::Property(initial) => Slot::Property {
                    desc: initial.descriptor().clone(),
                    value: Mutex::new(initial),
                    changed: OnceLock::new(),
                },
            })
            .collect();
        let meta = self.meta.build();
        log::debug!(
            "[dispatch] built object {} with {} member(s)",
            self.object_type.name(),
            meta.len()
        );
        let object_type = self.object_type;
        let threading = self.threading;
        let native = self.native;
        Ok(Arc::new_cyclic(|this| DynamicObject {
            this: this.clone(),
            object_type,
            meta,
            slots,
            context,
            threading,
            native,
            metrics: CallMetrics::default(),
        }))
    }
}

impl fmt::Debug for ObjectBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectBuilder")
            .field("type", &self.object_type.name())
            .field("members", &self.slots.len())
            .finish()
    }
}
