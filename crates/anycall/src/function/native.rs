// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Adapters from typed closures to [`AnyFunction`].

use super::{AnyFunction, FunctionKind};
use crate::error::{Error, Result};
use crate::object::AnyObject;
use crate::types::{FromValue, IntoValue, TypeDescriptor, Value, ValueRef};
use std::any::Any;

/// Return types a wrapped closure may produce: a plain value or a
/// `Result` whose error becomes the call's error.
pub trait CallReturn {
    fn return_descriptor() -> TypeDescriptor;
    fn into_call_result(self) -> Result<Value>;
}

impl<T: IntoValue> CallReturn for T {
    fn return_descriptor() -> TypeDescriptor {
        T::type_descriptor()
    }

    fn into_call_result(self) -> Result<Value> {
        Ok(self.into_value())
    }
}

impl<T: IntoValue> CallReturn for Result<T> {
    fn return_descriptor() -> TypeDescriptor {
        T::type_descriptor()
    }

    fn into_call_result(self) -> Result<Value> {
        self.map(IntoValue::into_value)
    }
}

/// Closure usable as an [`AnyFunction`]; `Args` is the argument tuple.
pub trait IntoAnyFunction<Args>: Send + Sync + 'static {
    fn into_any_function(self) -> AnyFunction;
}

/// Closure taking `&T` then arguments, usable as a method.
pub trait IntoAnyMethod<T, Args>: Send + Sync + 'static {
    fn into_any_method(self) -> AnyFunction;
}

#[inline]
fn extract<T: FromValue>(arg: Option<&ValueRef<'_>>) -> Result<T> {
    let arg = arg.ok_or_else(|| Error::type_mismatch("missing argument"))?;
    T::from_value(*arg).ok_or_else(|| {
        Error::type_mismatch(format!(
            "cannot read {} as {}",
            arg.descriptor(),
            T::type_descriptor()
        ))
    })
}

fn receiver<T: Any + Send + Sync>(arg: Option<&ValueRef<'_>>) -> Result<std::sync::Arc<T>> {
    let object: AnyObject = extract(arg)?;
    object.native::<T>().ok_or_else(|| {
        Error::type_mismatch(format!(
            "receiver is not a {}",
            std::any::type_name::<T>()
        ))
    })
}

macro_rules! impl_callable {
    ($($arg:ident),*) => {
        impl<F, R, $($arg,)*> IntoAnyFunction<($($arg,)*)> for F
        where
            F: Fn($($arg),*) -> R + Send + Sync + 'static,
            R: CallReturn,
            $($arg: FromValue + 'static,)*
        {
            #[allow(non_snake_case, unused_mut, unused_variables)]
            fn into_any_function(self) -> AnyFunction {
                let params = vec![$($arg::type_descriptor()),*];
                AnyFunction::from_body(
                    FunctionKind::Plain,
                    params,
                    R::return_descriptor(),
                    move |args: &[ValueRef<'_>]| {
                        let mut args = args.iter();
                        $(let $arg: $arg = extract(args.next())?;)*
                        (self)($($arg),*).into_call_result()
                    },
                )
            }
        }

        impl<T, F, R, $($arg,)*> IntoAnyMethod<T, ($($arg,)*)> for F
        where
            T: Any + Send + Sync,
            F: Fn(&T, $($arg),*) -> R + Send + Sync + 'static,
            R: CallReturn,
            $($arg: FromValue + 'static,)*
        {
            #[allow(non_snake_case, unused_mut)]
            fn into_any_method(self) -> AnyFunction {
                let params = vec![TypeDescriptor::any_object(), $($arg::type_descriptor()),*];
                AnyFunction::from_body(
                    FunctionKind::Method,
                    params,
                    R::return_descriptor(),
                    move |args: &[ValueRef<'_>]| {
                        let mut args = args.iter();
                        let this = receiver::<T>(args.next())?;
                        $(let $arg: $arg = extract(args.next())?;)*
                        (self)(&this, $($arg),*).into_call_result()
                    },
                )
            }
        }
    };
}

impl_callable!();
impl_callable!(A);
impl_callable!(A, B);
impl_callable!(A, B, C);
impl_callable!(A, B, C, D);
impl_callable!(A, B, C, D, E);
impl_callable!(A, B, C, D, E, G);
