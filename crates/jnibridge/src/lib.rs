//! jnibridge - call into a JVM from Rust through the JNI native interface
//!
//! The bridge infers VM types from host values, builds method and field
//! signatures from them, marshals arguments into `jvalue` buffers, dispatches
//! through the matching typed entry point and converts results back, primitive
//! arrays included. Pending Java exceptions become [`BridgeError`]s through a
//! configurable [`ExceptionHandler`].
//!
//! The VM itself is reached only through [`jnibridge_sdk::NativeInterface`],
//! one implementation per attached thread.
//!
//! # Example
//!
//! ```ignore
//! use jnibridge::{Arg, Env, Type};
//!
//! let env = Env::new(native);
//! let mut hello = jnibridge::new_java_string(&env, "Hello ")?;
//! let joined: String = hello.call_method_into(
//!     &env,
//!     "concat",
//!     "java/lang/String",
//!     &[Arg::Str("World!")],
//! )?;
//! let len = hello.call_method(&env, "length", Type::INT, &[])?.get::<i32>()?;
//! ```

pub mod array;
pub mod buffer;
mod class_loader;
pub mod config;
pub mod convert;
pub mod dispatch;
pub mod env;
pub mod error;
pub mod exception;
mod invoke;
pub mod marshal;
pub mod object;
pub mod refs;
pub mod resolve;
pub mod signature;
pub mod types;
mod utf8;
pub mod value;

pub use array::{to_host_vec, to_java_array, ArrayElement, ByteArray};
pub use config::BridgeConfig;
pub use convert::{java_string, new_java_string, FromJavaObject, ToJava};
pub use env::Env;
pub use error::{BridgeError, BridgeResult, StackTraceElement, ThrowableError};
pub use exception::{
    DescribeHandler, ExceptionHandler, ExceptionStrategy, ThrowableErrorHandler, ToStringHandler,
};
pub use object::{AsJObject, CastedObjectRef, ClassInfo, JavaObject, ObjectRef, TypeGetter, TypedObject};
pub use refs::{LocalFrame, LocalRef, LocalRefs};
pub use signature::{method_signature, type_signature};
pub use types::{Type, TypeSpec, CLASS_CLASS, OBJECT_CLASS, STRING_CLASS};
pub use utf8::release_utf8_string;
pub use value::{Arg, Value};

pub use jnibridge_sdk as sdk;
