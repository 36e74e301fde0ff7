//! Per-thread environment
//!
//! An [`Env`] wraps one attached thread's native interface and owns the state
//! the bridge keeps for it: the pending signature override, the class cache,
//! the optional alternate class loader, the active exception handler and the
//! local-frame depth. It holds an `Rc`, so it can never leave its thread.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use jnibridge_sdk::{from_jboolean, JClass, JFieldId, JMethodId, JObject, NativeInterface};
use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::class_loader::ClassLoaderRef;
use crate::config::BridgeConfig;
use crate::error::{BridgeError, BridgeResult};
use crate::exception::{ExceptionHandler, ExceptionStrategy};
use crate::refs::LocalRef;

/// Bridge context for one attached native thread.
pub struct Env {
    native: Rc<dyn NativeInterface>,
    signature: RefCell<Option<String>>,
    classes: RefCell<FxHashMap<String, JClass>>,
    uncached: RefCell<Vec<JClass>>,
    cache_classes: bool,
    pub(crate) class_loader: RefCell<Option<ClassLoaderRef>>,
    pub(crate) handler: RefCell<Option<Rc<dyn ExceptionHandler>>>,
    pub(crate) frame_depth: Cell<usize>,
    local_frame_capacity: i32,
}

impl Env {
    /// Create an environment with the default configuration
    pub fn new(native: Rc<dyn NativeInterface>) -> Self {
        Self::with_config(native, &BridgeConfig::default())
    }

    pub fn with_config(native: Rc<dyn NativeInterface>, config: &BridgeConfig) -> Self {
        debug!(
            handler = ?config.exception_handler,
            class_cache = config.class_cache,
            "creating bridge environment"
        );
        Env {
            native,
            signature: RefCell::new(None),
            classes: RefCell::new(FxHashMap::default()),
            uncached: RefCell::new(Vec::new()),
            cache_classes: config.class_cache,
            class_loader: RefCell::new(None),
            handler: RefCell::new(Some(config.exception_handler.handler())),
            frame_depth: Cell::new(0),
            local_frame_capacity: config.local_frame_capacity,
        }
    }

    /// The underlying native interface
    pub fn native(&self) -> &dyn NativeInterface {
        &*self.native
    }

    /// Capacity used for frames pushed without an explicit capacity
    pub fn local_frame_capacity(&self) -> i32 {
        self.local_frame_capacity
    }

    // ========================================================================
    // Signature Override
    // ========================================================================

    /// Use `sig` verbatim for the next call instead of synthesizing one.
    ///
    /// The override is consumed by the next facade operation whether or not
    /// that operation succeeds.
    pub fn precalculate_signature(&self, sig: impl Into<String>) {
        *self.signature.borrow_mut() = Some(sig.into());
    }

    /// Take the pending override, leaving none behind
    pub fn take_signature(&self) -> Option<String> {
        self.signature.borrow_mut().take()
    }

    // ========================================================================
    // Exception Handler
    // ========================================================================

    pub fn set_exception_handler(&self, handler: impl ExceptionHandler + 'static) {
        *self.handler.borrow_mut() = Some(Rc::new(handler));
    }

    pub fn set_exception_strategy(&self, strategy: ExceptionStrategy) {
        debug!(?strategy, "exception strategy selected");
        *self.handler.borrow_mut() = Some(strategy.handler());
    }

    /// Remove the handler; exceptions are then described
    pub fn clear_exception_handler(&self) {
        *self.handler.borrow_mut() = None;
    }

    pub fn exception_handler(&self) -> Rc<dyn ExceptionHandler> {
        self.handler
            .borrow()
            .clone()
            .unwrap_or_else(|| ExceptionStrategy::Describe.handler())
    }

    pub fn exception_check(&self) -> bool {
        from_jboolean(self.native.exception_check())
    }

    /// Error for a sentinel failure: the translated pending exception, or
    /// `fallback` when the VM has none
    pub(crate) fn pending_error(&self, fallback: impl FnOnce() -> BridgeError) -> BridgeError {
        if self.exception_check() {
            self.handle_exception()
        } else {
            fallback()
        }
    }

    /// Translate a pending exception after a call
    pub(crate) fn check_exception(&self) -> BridgeResult<()> {
        if self.exception_check() {
            Err(self.handle_exception())
        } else {
            Ok(())
        }
    }

    // ========================================================================
    // Class Resolution
    // ========================================================================

    /// Resolve a class by slash-separated name.
    ///
    /// The returned reference is global and owned by this environment; do not
    /// delete it.
    pub fn find_class(&self, name: &str) -> BridgeResult<JClass> {
        if let Some(class) = self.classes.borrow().get(name) {
            return Ok(*class);
        }
        debug!(class = name, "class cache miss");

        let local = self.lookup_class(name)?;
        let guard = LocalRef::new(self, local);
        let global = self.native.new_global_ref(guard.handle());
        if global.is_null() {
            return Err(self.pending_error(|| {
                BridgeError::Resolution(format!("could not promote class {name}"))
            }));
        }
        drop(guard);

        if self.cache_classes {
            self.classes.borrow_mut().insert(name.to_string(), global);
        } else {
            self.uncached.borrow_mut().push(global);
        }
        Ok(global)
    }

    /// Default loader first, then the alternate loader when one is set
    fn lookup_class(&self, name: &str) -> BridgeResult<JObject> {
        let class = self.native.find_class(name);
        if !class.is_null() {
            return Ok(class);
        }

        let loader = self.class_loader.borrow().clone();
        let Some(loader) = loader else {
            return Err(self.pending_error(|| {
                BridgeError::Resolution(format!("class {name} not found"))
            }));
        };

        warn!(class = name, "default loader failed, trying alternate class loader");
        self.native.exception_clear();
        let class = loader.find_class(self, name)?;
        if class.is_null() {
            return Err(self.pending_error(|| {
                BridgeError::Resolution(format!("class {name} not found by any loader"))
            }));
        }
        Ok(class)
    }

    /// Number of classes currently cached
    pub fn cached_class_count(&self) -> usize {
        self.classes.borrow().len()
    }

    /// Drop every cached class, deleting the global references
    pub fn clear_class_cache(&self) {
        let classes: Vec<JClass> = self.classes.borrow_mut().drain().map(|(_, c)| c).collect();
        let uncached = std::mem::take(&mut *self.uncached.borrow_mut());
        debug!(count = classes.len() + uncached.len(), "clearing class cache");
        for class in classes.into_iter().chain(uncached) {
            self.native.delete_global_ref(class);
        }
    }

    // ========================================================================
    // Member IDs
    // ========================================================================

    pub(crate) fn method_id(
        &self,
        class: JClass,
        name: &str,
        sig: &str,
        is_static: bool,
    ) -> BridgeResult<JMethodId> {
        let id = if is_static {
            self.native.get_static_method_id(class, name, sig)
        } else {
            self.native.get_method_id(class, name, sig)
        };
        if id.is_null() {
            return Err(self.pending_error(|| {
                BridgeError::Resolution(format!("method {name}{sig} not found"))
            }));
        }
        Ok(id)
    }

    pub(crate) fn field_id(
        &self,
        class: JClass,
        name: &str,
        sig: &str,
        is_static: bool,
    ) -> BridgeResult<JFieldId> {
        let id = if is_static {
            self.native.get_static_field_id(class, name, sig)
        } else {
            self.native.get_field_id(class, name, sig)
        };
        if id.is_null() {
            return Err(self.pending_error(|| {
                BridgeError::Resolution(format!("field {name} {sig} not found"))
            }));
        }
        Ok(id)
    }
}

impl Drop for Env {
    fn drop(&mut self) {
        self.clear_class_cache();
        if let Some(loader) = self.class_loader.get_mut().take() {
            loader.release(&*self.native);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jnibridge_mock::MockVm;

    #[test]
    fn test_signature_override_is_single_use() {
        let env = Env::new(MockVm::new());
        env.precalculate_signature("()V");
        assert_eq!(env.take_signature().as_deref(), Some("()V"));
        assert!(env.take_signature().is_none());
    }

    #[test]
    fn test_find_class_is_memoized() {
        let vm = MockVm::new();
        let env = Env::new(vm.clone());
        let a = env.find_class("java/lang/String").unwrap();
        let b = env.find_class("java/lang/String").unwrap();
        assert_eq!(a, b);
        assert_eq!(vm.find_class_calls("java/lang/String"), 1);
        assert_eq!(vm.live_local_refs(), 0);
        assert_eq!(vm.live_global_refs(), 1);
    }

    #[test]
    fn test_uncached_classes_are_still_released() {
        let vm = MockVm::new();
        let config = BridgeConfig {
            class_cache: false,
            ..BridgeConfig::default()
        };
        {
            let env = Env::with_config(vm.clone(), &config);
            env.find_class("java/lang/String").unwrap();
            env.find_class("java/lang/String").unwrap();
            assert_eq!(vm.find_class_calls("java/lang/String"), 2);
            assert_eq!(env.cached_class_count(), 0);
            assert_eq!(vm.live_global_refs(), 2);
        }
        assert_eq!(vm.live_global_refs(), 0);
    }

    #[test]
    fn test_missing_class_without_loader() {
        let vm = MockVm::new();
        let env = Env::new(vm.clone());
        let err = env.find_class("java/foo/bar").unwrap_err();
        assert_eq!(err, BridgeError::JavaException);
        assert!(!vm.has_pending_exception());
    }

    #[test]
    fn test_unset_handler_falls_back_to_describe() {
        let vm = MockVm::new();
        let env = Env::new(vm.clone());
        env.clear_exception_handler();
        assert!(env.find_class("java/foo/bar").is_err());
        assert_eq!(vm.described().len(), 1);
    }
}
