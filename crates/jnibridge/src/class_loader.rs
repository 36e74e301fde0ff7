//! Alternate class loader
//!
//! Native threads attached to the VM see only the system class loader, so
//! application classes fail to resolve there. An environment can instead be
//! given the loader of a known application object; class lookups that fail on
//! the default path are retried through `ClassLoader.findClass`.

use jnibridge_sdk::{JMethodId, JObject, JValue, NativeInterface};
use tracing::debug;

use crate::env::Env;
use crate::error::{BridgeError, BridgeResult};
use crate::object::ObjectRef;
use crate::refs::LocalRef;
use crate::types::{CLASS_CLASS, OBJECT_CLASS};

const CLASS_LOADER_CLASS: &str = "java/lang/ClassLoader";
const FIND_CLASS_SIGNATURE: &str = "(Ljava/lang/String;)Ljava/lang/Class;";

/// Global reference to a class loader plus its `findClass` method
#[derive(Debug, Clone, Copy)]
pub(crate) struct ClassLoaderRef {
    loader: JObject,
    find_class: JMethodId,
}

impl ClassLoaderRef {
    /// Load `name` (slash-separated) through this loader.
    ///
    /// Returns a local class reference, or an error built from the pending
    /// exception.
    pub(crate) fn find_class(&self, env: &Env, name: &str) -> BridgeResult<JObject> {
        let ni = env.native();
        let dotted = LocalRef::new(env, ni.new_string_utf(&name.replace('/', ".")));
        if dotted.is_null() {
            return Err(env.pending_error(|| {
                BridgeError::Resolution(format!("could not name class {name}"))
            }));
        }
        let args = [JValue { l: dotted.handle() }];
        let class = ni.call_object_method_a(self.loader, self.find_class, &args);
        if env.exception_check() {
            if !class.is_null() {
                ni.delete_local_ref(class);
            }
            return Err(env.handle_exception());
        }
        Ok(class)
    }

    pub(crate) fn release(self, ni: &dyn NativeInterface) {
        ni.delete_global_ref(self.loader);
    }
}

impl Env {
    /// Use the class loader of `obj`'s class as the fallback for lookups
    /// the default loader cannot satisfy.
    ///
    /// Replaces any loader set earlier.
    pub fn set_class_loader_from(&self, obj: &ObjectRef) -> BridgeResult<()> {
        if obj.is_null() {
            return Err(BridgeError::ProtocolMisuse(
                "cannot take the class loader of a null reference".into(),
            ));
        }
        let class = obj
            .cast(OBJECT_CLASS)
            .invoke(self, None, "getClass", CLASS_CLASS, &[])?
            .into_object()?;
        let _class = LocalRef::new(self, class.handle());
        let loader = class
            .cast(CLASS_CLASS)
            .invoke(self, None, "getClassLoader", CLASS_LOADER_CLASS, &[])?
            .into_object()?;
        let _loader = LocalRef::new(self, loader.handle());
        if loader.is_null() {
            return Err(BridgeError::Resolution(
                "object was loaded by the bootstrap loader".into(),
            ));
        }

        let loader_class = self.find_class(CLASS_LOADER_CLASS)?;
        let find_class = self.method_id(loader_class, "findClass", FIND_CLASS_SIGNATURE, false)?;
        let global = self.new_global_ref(&loader)?;

        let previous = self.class_loader.replace(Some(ClassLoaderRef {
            loader: global.into_handle(),
            find_class,
        }));
        if let Some(previous) = previous {
            previous.release(self.native());
        }
        debug!("alternate class loader installed");
        Ok(())
    }

    pub fn has_class_loader(&self) -> bool {
        self.class_loader.borrow().is_some()
    }

    /// Stop using the alternate loader
    pub fn clear_class_loader(&self) {
        let previous = self.class_loader.borrow_mut().take();
        if let Some(previous) = previous {
            previous.release(self.native());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jnibridge_mock::MockVm;

    fn bootstrap(env: &Env) -> ObjectRef {
        env.new_object("java/util/ArrayList", &[]).unwrap()
    }

    #[test]
    fn test_loader_resolves_hidden_class() {
        let vm = MockVm::new();
        let env = Env::new(vm.clone());
        let obj = bootstrap(&env);
        env.set_class_loader_from(&obj).unwrap();
        assert!(env.has_class_loader());

        env.find_class("jnibridge/test/Hidden").unwrap();
        assert!(!vm.has_pending_exception());
        assert_eq!(vm.pending_violations(), 0);
    }

    #[test]
    fn test_loader_miss_reports_exception() {
        let vm = MockVm::new();
        let env = Env::new(vm.clone());
        env.set_exception_strategy(crate::exception::ExceptionStrategy::ToString);
        let obj = bootstrap(&env);
        env.set_class_loader_from(&obj).unwrap();

        let err = env.find_class("java/foo/bar").unwrap_err();
        assert_eq!(
            err,
            BridgeError::JavaMessage("java.lang.ClassNotFoundException: java.foo.bar".into())
        );
        assert!(!vm.has_pending_exception());
    }

    #[test]
    fn test_replacing_loader_releases_previous() {
        let vm = MockVm::new();
        let env = Env::new(vm.clone());
        let obj = bootstrap(&env);
        env.set_class_loader_from(&obj).unwrap();
        let globals = vm.live_global_refs();
        env.set_class_loader_from(&obj).unwrap();
        assert_eq!(vm.live_global_refs(), globals);
        env.clear_class_loader();
        assert_eq!(vm.live_global_refs(), globals - 1);
    }
}
