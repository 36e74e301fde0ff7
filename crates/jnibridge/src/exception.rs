//! Exception translation
//!
//! When a VM call signals failure, [`Env::handle_exception`] takes the pending
//! throwable, clears it, and hands it to the active [`ExceptionHandler`], which
//! turns it into a [`BridgeError`]. Three handlers ship with the bridge and are
//! selected through [`ExceptionStrategy`].
//!
//! Handlers may call back into the VM. While one runs, the environment's
//! handler is temporarily [`DescribeHandler`], so a failure inside a handler
//! is described and cleared instead of recursing into the same handler.

use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use serde::Deserialize;
use tracing::debug;

use crate::convert::nullable_string;
use crate::env::Env;
use crate::error::{BridgeError, BridgeResult, StackTraceElement, ThrowableError};
use crate::object::ObjectRef;
use crate::refs::LocalRef;
use crate::types::{Type, TypeSpec, CLASS_CLASS, OBJECT_CLASS, STRING_CLASS};

const THROWABLE_CLASS: &str = "java/lang/Throwable";
const STACK_TRACE_ELEMENT_CLASS: &str = "java/lang/StackTraceElement";

/// Converts a pending Java exception into a bridge error.
///
/// The exception has not been cleared when the handler is called.
pub trait ExceptionHandler {
    fn handle_exception(&self, env: &Env, exception: &ObjectRef) -> BridgeError;
}

// ============================================================================
// Handlers
// ============================================================================

/// Print the exception to stderr/logcat and report a generic error
#[derive(Debug, Clone, Copy, Default)]
pub struct DescribeHandler;

impl ExceptionHandler for DescribeHandler {
    fn handle_exception(&self, env: &Env, _exception: &ObjectRef) -> BridgeError {
        env.native().exception_describe();
        env.native().exception_clear();
        BridgeError::JavaException
    }
}

/// Report the exception by its `toString()` text
#[derive(Debug, Clone, Copy, Default)]
pub struct ToStringHandler;

impl ExceptionHandler for ToStringHandler {
    fn handle_exception(&self, env: &Env, exception: &ObjectRef) -> BridgeError {
        env.native().exception_clear();
        let text = exception
            .cast(OBJECT_CLASS)
            .invoke(env, None, "toString", STRING_CLASS, &[])
            .and_then(|value| nullable_string(env, value));
        match text {
            Ok(text) if text.is_empty() => BridgeError::JavaException,
            Ok(text) => BridgeError::JavaMessage(text),
            Err(err) => err,
        }
    }
}

/// Copy the exception, its stack trace and its causes into a [`ThrowableError`]
///
/// Only the class name and `toString()` text are required. Other parts that
/// cannot be read are left empty, and the failure that prevented reading
/// them is described.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThrowableErrorHandler;

impl ExceptionHandler for ThrowableErrorHandler {
    fn handle_exception(&self, env: &Env, exception: &ObjectRef) -> BridgeError {
        env.native().exception_clear();
        let converted = env.local_frame(None).and_then(|frame| {
            let throwable = throwable_error(env, exception, &mut Vec::new());
            frame.pop(None)?;
            throwable
        });
        match converted {
            Ok(throwable) => throwable.into(),
            Err(err) => BridgeError::ThrowableConversion(err.to_string()),
        }
    }
}

fn string_call(env: &Env, obj: &ObjectRef, class: &str, method: &str) -> BridgeResult<String> {
    let value = obj.cast(class).invoke(env, None, method, STRING_CLASS, &[])?;
    nullable_string(env, value)
}

fn skipped<T: Default>(part: &str, result: BridgeResult<T>) -> T {
    result.unwrap_or_else(|err| {
        debug!(part, error = %err, "skipping unreadable exception detail");
        T::default()
    })
}

/// `seen` holds the exceptions already converted higher up the cause chain
fn throwable_error(
    env: &Env,
    exception: &ObjectRef,
    seen: &mut Vec<ObjectRef>,
) -> BridgeResult<ThrowableError> {
    let class = exception
        .cast(OBJECT_CLASS)
        .invoke(env, None, "getClass", CLASS_CLASS, &[])?
        .into_object()?;
    let class_name = string_call(env, &class, CLASS_CLASS, "getName")?;
    let as_string = string_call(env, exception, THROWABLE_CLASS, "toString")?;
    seen.push(exception.clone());

    let localized_message = skipped(
        "localized message",
        string_call(env, exception, THROWABLE_CLASS, "getLocalizedMessage"),
    );
    let message = skipped(
        "message",
        string_call(env, exception, THROWABLE_CLASS, "getMessage"),
    );
    let stack_trace = skipped("stack trace", read_stack_trace(env, exception));
    let cause = skipped("cause", read_cause(env, exception, seen));

    Ok(ThrowableError {
        class_name,
        localized_message,
        message,
        stack_trace,
        as_string,
        cause,
    })
}

fn read_stack_trace(env: &Env, exception: &ObjectRef) -> BridgeResult<Vec<StackTraceElement>> {
    let trace = exception
        .cast(THROWABLE_CLASS)
        .invoke(
            env,
            None,
            "getStackTrace",
            TypeSpec::object_array(STACK_TRACE_ELEMENT_CLASS),
            &[],
        )?
        .into_object()?;
    if trace.is_null() {
        return Ok(Vec::new());
    }
    let elements = env
        .from_object_array(&trace)?
        .iter()
        .filter(|element| !element.is_null())
        .filter_map(|element| match stack_trace_element(env, element) {
            Ok(element) => Some(element),
            Err(err) => {
                debug!(error = %err, "skipping unreadable stack trace element");
                None
            }
        })
        .collect();
    Ok(elements)
}

fn read_cause(
    env: &Env,
    exception: &ObjectRef,
    seen: &mut Vec<ObjectRef>,
) -> BridgeResult<Option<Box<ThrowableError>>> {
    let cause = exception
        .cast(THROWABLE_CLASS)
        .invoke(env, None, "getCause", THROWABLE_CLASS, &[])?
        .into_object()?;
    if cause.is_null() || seen.iter().any(|earlier| earlier.is_same_object(env, &cause)) {
        return Ok(None);
    }
    Ok(Some(Box::new(throwable_error(env, &cause, seen)?)))
}

fn stack_trace_element(env: &Env, element: &ObjectRef) -> BridgeResult<StackTraceElement> {
    let class = STACK_TRACE_ELEMENT_CLASS;
    let casted = element.cast(class);
    Ok(StackTraceElement {
        class_name: string_call(env, element, class, "getClassName")?,
        file_name: string_call(env, element, class, "getFileName")?,
        line_number: casted.invoke(env, None, "getLineNumber", Type::INT, &[])?.get()?,
        method_name: string_call(env, element, class, "getMethodName")?,
        is_native_method: casted
            .invoke(env, None, "isNativeMethod", Type::BOOLEAN, &[])?
            .get()?,
        as_string: string_call(env, element, class, "toString")?,
    })
}

// ============================================================================
// Strategy Selection
// ============================================================================

/// The built-in handlers, by name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum ExceptionStrategy {
    #[default]
    #[serde(rename = "describe")]
    Describe,
    #[serde(rename = "tostring", alias = "to_string")]
    ToString,
    #[serde(rename = "structured")]
    Structured,
}

impl ExceptionStrategy {
    pub fn handler(self) -> Rc<dyn ExceptionHandler> {
        match self {
            ExceptionStrategy::Describe => Rc::new(DescribeHandler),
            ExceptionStrategy::ToString => Rc::new(ToStringHandler),
            ExceptionStrategy::Structured => Rc::new(ThrowableErrorHandler),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ExceptionStrategy::Describe => "describe",
            ExceptionStrategy::ToString => "tostring",
            ExceptionStrategy::Structured => "structured",
        }
    }
}

impl fmt::Display for ExceptionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExceptionStrategy {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "describe" => Ok(ExceptionStrategy::Describe),
            "tostring" | "to_string" => Ok(ExceptionStrategy::ToString),
            "structured" => Ok(ExceptionStrategy::Structured),
            other => Err(BridgeError::Config(format!(
                "unknown exception handler '{other}'"
            ))),
        }
    }
}

// ============================================================================
// Translation Entry Point
// ============================================================================

/// Puts the saved handler back when dropped
struct HandlerSwap<'a> {
    env: &'a Env,
    saved: Option<Rc<dyn ExceptionHandler>>,
}

impl<'a> HandlerSwap<'a> {
    fn install_describe(env: &'a Env) -> Self {
        let saved = env
            .handler
            .replace(Some(ExceptionStrategy::Describe.handler()));
        HandlerSwap { env, saved }
    }
}

impl Drop for HandlerSwap<'_> {
    fn drop(&mut self) {
        *self.env.handler.borrow_mut() = self.saved.take();
    }
}

impl Env {
    /// Translate the pending exception through the active handler.
    ///
    /// Returns [`BridgeError::NoPendingException`] when nothing is pending.
    /// The exception is cleared on every other path, even when a custom
    /// handler does not clear it.
    pub fn handle_exception(&self) -> BridgeError {
        let raw = self.native().exception_occurred();
        if raw.is_null() {
            return BridgeError::NoPendingException;
        }
        let exception = LocalRef::new(self, raw);
        let handler = self.exception_handler();
        let _swap = HandlerSwap::install_describe(self);
        debug!("translating pending Java exception");
        let err =
            handler.handle_exception(self, &ObjectRef::new(exception.handle(), THROWABLE_CLASS));
        if self.exception_check() {
            debug!("handler left the exception pending, clearing it");
            self.native().exception_clear();
        }
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jnibridge_mock::MockVm;

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("describe".parse::<ExceptionStrategy>().unwrap(), ExceptionStrategy::Describe);
        assert_eq!("ToString".parse::<ExceptionStrategy>().unwrap(), ExceptionStrategy::ToString);
        assert_eq!("to_string".parse::<ExceptionStrategy>().unwrap(), ExceptionStrategy::ToString);
        assert_eq!(
            "structured".parse::<ExceptionStrategy>().unwrap(),
            ExceptionStrategy::Structured
        );
        assert!(matches!(
            "loud".parse::<ExceptionStrategy>(),
            Err(BridgeError::Config(_))
        ));
    }

    #[test]
    fn test_no_pending_exception() {
        let env = Env::new(MockVm::new());
        assert_eq!(env.handle_exception(), BridgeError::NoPendingException);
    }

    #[test]
    fn test_describe_clears_and_releases() {
        let vm = MockVm::new();
        let env = Env::new(vm.clone());
        vm.throw_new("java/lang/IllegalStateException", "broken");
        assert_eq!(env.handle_exception(), BridgeError::JavaException);
        assert!(!vm.has_pending_exception());
        assert_eq!(vm.live_local_refs(), 0);
        assert!(vm.described()[0].contains("broken"));
    }

    #[test]
    fn test_to_string_handler() {
        let vm = MockVm::new();
        let env = Env::new(vm.clone());
        env.set_exception_strategy(ExceptionStrategy::ToString);
        vm.throw_new("java/lang/IllegalStateException", "broken");
        assert_eq!(
            env.handle_exception(),
            BridgeError::JavaMessage("java.lang.IllegalStateException: broken".into())
        );
        assert!(!vm.has_pending_exception());
    }

    #[test]
    fn test_handler_restored_after_translation() {
        let vm = MockVm::new();
        let env = Env::new(vm.clone());
        env.set_exception_strategy(ExceptionStrategy::ToString);
        vm.throw_new("java/lang/RuntimeException", "first");
        env.handle_exception();
        vm.throw_new("java/lang/RuntimeException", "second");
        assert_eq!(
            env.handle_exception(),
            BridgeError::JavaMessage("java.lang.RuntimeException: second".into())
        );
    }

    struct Fixed;

    impl ExceptionHandler for Fixed {
        fn handle_exception(&self, env: &Env, _exception: &ObjectRef) -> BridgeError {
            env.native().exception_clear();
            BridgeError::JavaMessage("custom".into())
        }
    }

    #[test]
    fn test_custom_handler() {
        let vm = MockVm::new();
        let env = Env::new(vm.clone());
        env.set_exception_handler(Fixed);
        vm.throw_new("java/lang/RuntimeException", "x");
        assert_eq!(env.handle_exception(), BridgeError::JavaMessage("custom".into()));
    }
}
