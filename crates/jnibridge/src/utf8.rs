//! Shared `"UTF-8"` charset name
//!
//! String conversion passes the charset name as a `java/lang/String` on every
//! call, so one global reference per VM is created on first use and kept for
//! the life of the process, or until [`release_utf8_string`] is called.

use std::sync::LazyLock;

use jnibridge_sdk::{JObject, JavaVm};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::env::Env;
use crate::error::{BridgeError, BridgeResult};
use crate::object::ObjectRef;
use crate::refs::LocalRef;
use crate::types::STRING_CLASS;

static UTF8_STRINGS: LazyLock<Mutex<FxHashMap<JavaVm, JObject>>> =
    LazyLock::new(|| Mutex::new(FxHashMap::default()));

impl Env {
    /// Global `"UTF-8"` string for this environment's VM
    pub fn utf8_string(&self) -> BridgeResult<ObjectRef> {
        let vm = self.native().java_vm();
        if let Some(existing) = UTF8_STRINGS.lock().get(&vm) {
            return Ok(ObjectRef::new(*existing, STRING_CLASS));
        }

        let local = LocalRef::new(self, self.native().new_string_utf("UTF-8"));
        if local.is_null() {
            return Err(self.pending_error(|| {
                BridgeError::ProtocolMisuse("could not create charset name".into())
            }));
        }
        let created = self.native().new_global_ref(local.handle());
        drop(local);
        if created.is_null() {
            return Err(self.pending_error(|| {
                BridgeError::ProtocolMisuse("could not promote charset name".into())
            }));
        }

        let winner = {
            let mut strings = UTF8_STRINGS.lock();
            *strings.entry(vm).or_insert(created)
        };
        if winner != created {
            self.native().delete_global_ref(created);
        } else {
            debug!(vm = vm.into_raw(), "created shared UTF-8 charset name");
        }
        Ok(ObjectRef::new(winner, STRING_CLASS))
    }
}

/// Delete the shared charset name for `env`'s VM, if one was created
pub fn release_utf8_string(env: &Env) {
    let vm = env.native().java_vm();
    let removed = UTF8_STRINGS.lock().remove(&vm);
    if let Some(global) = removed {
        env.native().delete_global_ref(global);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jnibridge_mock::MockVm;

    #[test]
    fn test_utf8_string_is_shared() {
        let vm = MockVm::new();
        let env = Env::new(vm.clone());
        let a = env.utf8_string().unwrap();
        let b = env.utf8_string().unwrap();
        assert_eq!(a.handle(), b.handle());
        assert_eq!(vm.string_value(a.handle()).as_deref(), Some("UTF-8"));
        assert_eq!(vm.live_global_refs(), 1);
        assert_eq!(vm.live_local_refs(), 0);

        release_utf8_string(&env);
        assert_eq!(vm.live_global_refs(), 0);
    }

    #[test]
    fn test_failed_promotion_is_not_cached() {
        let vm = MockVm::new();
        let env = Env::new(vm.clone());
        vm.exhaust_global_refs(true);
        assert_eq!(env.utf8_string().unwrap_err(), BridgeError::JavaException);
        assert!(vm.described()[0].starts_with("java.lang.OutOfMemoryError"));
        assert_eq!(vm.live_local_refs(), 0);

        vm.exhaust_global_refs(false);
        let name = env.utf8_string().unwrap();
        assert!(!name.is_null());
        assert_eq!(vm.string_value(name.handle()).as_deref(), Some("UTF-8"));
        release_utf8_string(&env);
    }

    #[test]
    fn test_each_vm_gets_its_own() {
        let first_vm = MockVm::new();
        let second_vm = MockVm::new();
        let first = Env::new(first_vm.clone());
        let second = Env::new(second_vm.clone());
        first.utf8_string().unwrap();
        let kept = second.utf8_string().unwrap();

        release_utf8_string(&first);
        assert_eq!(first_vm.live_global_refs(), 0);
        assert!(second_vm.is_live(kept.handle()));
        release_utf8_string(&second);
    }
}
