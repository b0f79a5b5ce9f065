// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type-erased callables.
//!
//! An [`AnyFunction`] wraps a closure together with the descriptors of its
//! parameters and return type. Calls check the argument count, convert each
//! argument to its declared type, run the closure and hand back an owned
//! result. Panics in the wrapped code become `UnknownException` errors.
//!
//! ```
//! use anycall::function::AnyFunction;
//! use anycall::types::Value;
//!
//! let add = AnyFunction::new(|a: i32, b: i32| a + b);
//! assert_eq!(add.parameters_signature().as_str(), "(ii)");
//! let sum = add.call(&[Value::from(2i32), Value::from(3i8)]).unwrap();
//! assert_eq!(sum, Value::from(5i32));
//! ```

mod native;

pub use native::{CallReturn, IntoAnyFunction, IntoAnyMethod};

use crate::error::{Error, ErrorKind, Result};
use crate::signature::Signature;
use crate::types::{Converted, TypeDescriptor, Value, ValueRef};
use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// Where a callable came from; decides how arguments are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionKind {
    /// Free function or closure.
    Plain,
    /// Instance method: the first argument is the receiver object.
    Method,
    /// Receives the raw argument list, unchecked and unconverted.
    Dynamic,
}

type Body = dyn Fn(&[ValueRef<'_>]) -> Result<Value> + Send + Sync;

struct Inner {
    kind: FunctionKind,
    params: Vec<TypeDescriptor>,
    ret: TypeDescriptor,
    body: Box<Body>,
}

/// Type-erased function, method or dynamic callable. Cheap to clone.
#[derive(Clone)]
pub struct AnyFunction {
    inner: Arc<Inner>,
}

impl AnyFunction {
    /// Wrap a typed closure of up to six arguments.
    pub fn new<F, Args>(f: F) -> Self
    where
        F: IntoAnyFunction<Args>,
    {
        f.into_any_function()
    }

    /// Wrap a method taking `&T` first; `T` is looked up on the receiver
    /// object passed as the first argument.
    pub fn method<T, F, Args>(f: F) -> Self
    where
        F: IntoAnyMethod<T, Args>,
    {
        f.into_any_method()
    }

    /// Callable that sees the whole argument list as given.
    pub fn dynamic<F>(f: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        Self::from_body(
            FunctionKind::Dynamic,
            Vec::new(),
            TypeDescriptor::dynamic(),
            move |args: &[ValueRef<'_>]| {
                let owned: Vec<Value> = args.iter().map(|a| a.to_owned()).collect();
                f(&owned)
            },
        )
    }

    pub(crate) fn from_body<B>(
        kind: FunctionKind,
        params: Vec<TypeDescriptor>,
        ret: TypeDescriptor,
        body: B,
    ) -> Self
    where
        B: Fn(&[ValueRef<'_>]) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(Inner {
                kind,
                params,
                ret,
                body: Box::new(body),
            }),
        }
    }

    #[inline]
    pub fn kind(&self) -> FunctionKind {
        self.inner.kind
    }

    /// Declared parameter types, receiver included for methods.
    pub fn parameters(&self) -> &[TypeDescriptor] {
        &self.inner.params
    }

    pub fn return_type(&self) -> &TypeDescriptor {
        &self.inner.ret
    }

    /// Signature callers see: a tuple of the parameters, receiver excluded.
    /// Dynamic callables accept `#m`.
    pub fn parameters_signature(&self) -> Signature {
        match self.inner.kind {
            FunctionKind::Dynamic => Signature::from_validated("#m"),
            FunctionKind::Method => {
                Signature::tuple(self.inner.params.iter().skip(1).map(|p| p.signature()))
            }
            FunctionKind::Plain => {
                Signature::tuple(self.inner.params.iter().map(|p| p.signature()))
            }
        }
    }

    pub fn return_signature(&self) -> &Signature {
        self.inner.ret.signature()
    }

    /// Invoke with `args`. Arguments that already have the declared type are
    /// passed by reference; the others are converted first.
    pub fn call(&self, args: &[Value]) -> Result<Value> {
        let views: Vec<ValueRef<'_>> = args.iter().map(Value::view).collect();
        self.call_refs(&views)
    }

    /// Same as [`call`](Self::call) over borrowed views.
    pub fn call_refs(&self, args: &[ValueRef<'_>]) -> Result<Value> {
        if self.inner.kind == FunctionKind::Dynamic {
            return self.invoke(args);
        }
        let params = &self.inner.params;
        if args.len() != params.len() {
            let receiver = usize::from(self.inner.kind == FunctionKind::Method);
            return Err(Error::argument_count(
                params.len() - receiver,
                args.len().saturating_sub(receiver),
            ));
        }
        let converted = args
            .iter()
            .zip(params)
            .enumerate()
            .map(|(index, (arg, param))| {
                arg.convert(param).ok_or_else(|| {
                    Error::type_mismatch(format!(
                        "argument {}: cannot convert {} to {}",
                        index,
                        arg.descriptor(),
                        param
                    ))
                })
            })
            .collect::<Result<Vec<Converted<'_>>>>()?;
        let views: Vec<ValueRef<'_>> = converted.iter().map(Converted::view).collect();
        self.invoke(&views)
    }

    fn invoke(&self, args: &[ValueRef<'_>]) -> Result<Value> {
        match catch_unwind(AssertUnwindSafe(|| (self.inner.body)(args))) {
            Ok(result) => result,
            Err(payload) => Err(Error::new(
                ErrorKind::UnknownException,
                panic_message(payload.as_ref()),
            )),
        }
    }
}

/// Text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown exception".to_string()
    }
}

impl fmt::Debug for AnyFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyFunction")
            .field("kind", &self.inner.kind)
            .field("parameters", &self.parameters_signature())
            .field("returns", self.return_signature())
            .finish()
    }
}

#[cfg(test)]
mod tests;
