//! Reference lifecycle
//!
//! Explicit global/local reference management plus the RAII guards the bridge
//! uses for its own temporaries. Every reference created as a byproduct of a
//! call is held by a [`LocalRef`] or [`LocalRefs`] guard, so it is deleted on
//! success and on every error path.

use jnibridge_sdk::{JObject, JNI_OK};
use tracing::{debug, warn};

use crate::env::Env;
use crate::error::{BridgeError, BridgeResult};
use crate::object::ObjectRef;

// ============================================================================
// Guards
// ============================================================================

/// A single local reference, deleted on drop
pub struct LocalRef<'a> {
    env: &'a Env,
    handle: JObject,
    released: bool,
}

impl<'a> LocalRef<'a> {
    pub fn new(env: &'a Env, handle: JObject) -> Self {
        Self {
            env,
            handle,
            released: false,
        }
    }

    pub fn handle(&self) -> JObject {
        self.handle
    }

    pub fn is_null(&self) -> bool {
        self.handle.is_null()
    }

    /// Hand the reference to the caller instead of deleting it
    pub fn release(mut self) -> JObject {
        self.released = true;
        self.handle
    }
}

impl Drop for LocalRef<'_> {
    fn drop(&mut self) {
        if !self.released && !self.handle.is_null() {
            self.env.native().delete_local_ref(self.handle);
        }
    }
}

/// A set of temporaries, all deleted on drop
pub struct LocalRefs<'a> {
    env: &'a Env,
    handles: Vec<JObject>,
}

impl<'a> LocalRefs<'a> {
    pub fn new(env: &'a Env) -> Self {
        Self {
            env,
            handles: Vec::new(),
        }
    }

    /// Track `handle` and return it
    pub fn push(&mut self, handle: JObject) -> JObject {
        if !handle.is_null() {
            self.handles.push(handle);
        }
        handle
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

impl Drop for LocalRefs<'_> {
    fn drop(&mut self) {
        for handle in self.handles.drain(..).rev() {
            self.env.native().delete_local_ref(handle);
        }
    }
}

/// A pushed local frame, popped on drop unless popped explicitly
pub struct LocalFrame<'a> {
    env: &'a Env,
    popped: bool,
}

impl LocalFrame<'_> {
    /// Pop the frame, carrying `result` over into the enclosing frame
    pub fn pop(mut self, result: Option<&ObjectRef>) -> BridgeResult<Option<ObjectRef>> {
        self.popped = true;
        self.env.pop_local_frame(result)
    }
}

impl Drop for LocalFrame<'_> {
    fn drop(&mut self) {
        if !self.popped {
            let _ = self.env.pop_local_frame(None);
        }
    }
}

// ============================================================================
// Env Reference Operations
// ============================================================================

impl Env {
    /// Promote `obj` to a global reference with the same class information
    pub fn new_global_ref(&self, obj: &ObjectRef) -> BridgeResult<ObjectRef> {
        if obj.is_null() {
            return Err(BridgeError::ProtocolMisuse(
                "cannot promote a null reference".into(),
            ));
        }
        let global = self.native().new_global_ref(obj.handle());
        if global.is_null() {
            return Err(self.pending_error(|| {
                BridgeError::ProtocolMisuse("reference is no longer live".into())
            }));
        }
        Ok(obj.with_handle(global))
    }

    pub fn delete_global_ref(&self, obj: ObjectRef) {
        if !obj.is_null() {
            self.native().delete_global_ref(obj.into_handle());
        }
    }

    pub fn delete_local_ref(&self, obj: ObjectRef) {
        if !obj.is_null() {
            self.native().delete_local_ref(obj.into_handle());
        }
    }

    pub fn ensure_local_capacity(&self, capacity: i32) -> BridgeResult<()> {
        if self.native().ensure_local_capacity(capacity) == JNI_OK {
            Ok(())
        } else {
            Err(self.pending_error(|| {
                BridgeError::ProtocolMisuse(format!("cannot reserve {capacity} local references"))
            }))
        }
    }

    pub fn push_local_frame(&self, capacity: i32) -> BridgeResult<()> {
        if self.native().push_local_frame(capacity) != JNI_OK {
            return Err(self.pending_error(|| {
                BridgeError::ProtocolMisuse(format!("cannot push a frame of {capacity} references"))
            }));
        }
        let depth = self.frame_depth.get() + 1;
        self.frame_depth.set(depth);
        debug!(capacity, depth, "pushed local frame");
        Ok(())
    }

    /// Pop the innermost frame.
    ///
    /// Every local created inside it becomes invalid; `result`, if given, is
    /// re-created in the enclosing frame and returned.
    pub fn pop_local_frame(&self, result: Option<&ObjectRef>) -> BridgeResult<Option<ObjectRef>> {
        let depth = self.frame_depth.get();
        if depth == 0 {
            warn!("pop_local_frame without a matching push");
            return Err(BridgeError::ProtocolMisuse(
                "pop_local_frame without a matching push".into(),
            ));
        }
        self.frame_depth.set(depth - 1);

        let raw = result.map(ObjectRef::handle).unwrap_or(JObject::NULL);
        let promoted = self.native().pop_local_frame(raw);
        debug!(depth = depth - 1, promoted = !promoted.is_null(), "popped local frame");
        Ok(match result {
            Some(obj) if !promoted.is_null() => Some(obj.with_handle(promoted)),
            _ => None,
        })
    }

    /// Push a frame that is popped when the returned guard drops
    pub fn local_frame(&self, capacity: Option<i32>) -> BridgeResult<LocalFrame<'_>> {
        self.push_local_frame(capacity.unwrap_or(self.local_frame_capacity()))?;
        Ok(LocalFrame {
            env: self,
            popped: false,
        })
    }

    /// Run `f` inside a fresh local frame.
    ///
    /// The object `f` returns survives the pop; everything else it created
    /// locally is released. The frame is popped on error too.
    pub fn with_local_frame<F>(&self, capacity: Option<i32>, f: F) -> BridgeResult<Option<ObjectRef>>
    where
        F: FnOnce(&Env) -> BridgeResult<Option<ObjectRef>>,
    {
        let frame = self.local_frame(capacity)?;
        let result = f(self)?;
        frame.pop(result.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jnibridge_mock::MockVm;

    #[test]
    fn test_local_ref_guard_deletes() {
        let vm = MockVm::new();
        let env = Env::new(vm.clone());
        let handle = env.native().new_string_utf("x");
        {
            let _guard = LocalRef::new(&env, handle);
            assert!(vm.is_live(handle));
        }
        assert!(!vm.is_live(handle));
    }

    #[test]
    fn test_local_ref_release_keeps_reference() {
        let vm = MockVm::new();
        let env = Env::new(vm.clone());
        let handle = LocalRef::new(&env, env.native().new_string_utf("x")).release();
        assert!(vm.is_live(handle));
    }

    #[test]
    fn test_local_refs_delete_all() {
        let vm = MockVm::new();
        let env = Env::new(vm.clone());
        {
            let mut temps = LocalRefs::new(&env);
            temps.push(env.native().new_string_utf("a"));
            temps.push(env.native().new_string_utf("b"));
            temps.push(JObject::NULL);
            assert_eq!(temps.len(), 2);
        }
        assert_eq!(vm.live_local_refs(), 0);
    }

    #[test]
    fn test_unbalanced_pop() {
        let env = Env::new(MockVm::new());
        let err = env.pop_local_frame(None).unwrap_err();
        assert!(matches!(err, BridgeError::ProtocolMisuse(_)));
    }

    #[test]
    fn test_frame_guard_pops_on_drop() {
        let vm = MockVm::new();
        let env = Env::new(vm.clone());
        {
            let _frame = env.local_frame(None).unwrap();
            assert_eq!(vm.frame_depth(), 1);
        }
        assert_eq!(vm.frame_depth(), 0);
    }

    #[test]
    fn test_with_local_frame_pops_on_error() {
        let vm = MockVm::new();
        let env = Env::new(vm.clone());
        let result = env.with_local_frame(Some(4), |_| {
            Err(BridgeError::Marshal("boom".into()))
        });
        assert!(result.is_err());
        assert_eq!(vm.frame_depth(), 0);
    }

    #[test]
    fn test_global_ref_of_null() {
        let env = Env::new(MockVm::new());
        let err = env.new_global_ref(&ObjectRef::null("java/lang/String")).unwrap_err();
        assert!(matches!(err, BridgeError::ProtocolMisuse(_)));
    }
}
