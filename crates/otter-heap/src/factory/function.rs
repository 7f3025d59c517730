use super::ObjectFactory;
use super::init::primitive_u32;
use crate::error::{HeapError, HeapResult};
use crate::layout::{js_bound_function, js_function, js_function_base};
use crate::shape::ShapeRef;
use crate::types::JsType;
use crate::value::{HeapRef, LocalRef, TaggedValue};
use otter_heap_gc::MemSpace;

/// Kind of a function, stored in its `BitField` and its method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FunctionKind {
    Normal,
    Arrow,
    Method,
    Getter,
    Setter,
    ClassConstructor,
    DerivedConstructor,
    Generator,
    Async,
    AsyncArrow,
    AsyncGenerator,
    Builtin,
    BuiltinConstructor,
}

impl FunctionKind {
    pub const ALL: &'static [FunctionKind] = &[
        FunctionKind::Normal,
        FunctionKind::Arrow,
        FunctionKind::Method,
        FunctionKind::Getter,
        FunctionKind::Setter,
        FunctionKind::ClassConstructor,
        FunctionKind::DerivedConstructor,
        FunctionKind::Generator,
        FunctionKind::Async,
        FunctionKind::AsyncArrow,
        FunctionKind::AsyncGenerator,
        FunctionKind::Builtin,
        FunctionKind::BuiltinConstructor,
    ];

    pub const fn bits(self) -> i32 {
        self as i32
    }

    pub fn from_bits(bits: i32) -> Option<Self> {
        usize::try_from(bits).ok().and_then(|i| Self::ALL.get(i).copied())
    }

    /// Whether functions of this kind carry a `prototype` property
    pub const fn has_prototype(self) -> bool {
        matches!(
            self,
            FunctionKind::Normal
                | FunctionKind::ClassConstructor
                | FunctionKind::DerivedConstructor
                | FunctionKind::Generator
                | FunctionKind::AsyncGenerator
                | FunctionKind::BuiltinConstructor
        )
    }

    pub const fn is_constructor(self) -> bool {
        matches!(
            self,
            FunctionKind::Normal
                | FunctionKind::ClassConstructor
                | FunctionKind::DerivedConstructor
                | FunctionKind::BuiltinConstructor
        )
    }

    pub const fn is_class_constructor(self) -> bool {
        matches!(self, FunctionKind::ClassConstructor | FunctionKind::DerivedConstructor)
    }

    /// Type tag of a local function of this kind
    pub const fn js_type(self) -> JsType {
        match self {
            FunctionKind::Generator => JsType::JsGeneratorFunction,
            FunctionKind::Async | FunctionKind::AsyncArrow => JsType::JsAsyncFunction,
            FunctionKind::AsyncGenerator => JsType::JsAsyncGeneratorFunction,
            _ => JsType::JsFunction,
        }
    }
}

impl ObjectFactory<'_> {
    /// A method record for `kind` taking `length` parameters
    ///
    /// `CallField` holds the parameter count and `ExtraLiteralInfo` the kind.
    pub fn new_method(&mut self, kind: FunctionKind, length: u32) -> HeapResult<LocalRef> {
        let shape = self.heap.roots().record_shape(JsType::Method);
        let method = self.heap.construct(shape, MemSpace::Old)?;
        self.set_named(method, "CallField", primitive_u32(length));
        self.set_named(method, "ExtraLiteralInfo", TaggedValue::Int(kind.bits()));
        Ok(method)
    }

    /// Kind recorded in a method
    pub fn method_kind(&self, method: HeapRef) -> FunctionKind {
        self.heap
            .field_by_name(method, "ExtraLiteralInfo")
            .and_then(TaggedValue::as_int)
            .and_then(FunctionKind::from_bits)
            .unwrap_or(FunctionKind::Normal)
    }

    fn method_length(&self, method: HeapRef) -> u32 {
        self.heap
            .field_by_name(method, "CallField")
            .and_then(TaggedValue::as_number)
            .map_or(0, |n| n as u32)
    }

    /// Reset the function-specific fields of a fresh function object
    fn initialize_js_function(&mut self, func: LocalRef, method: HeapRef, kind: FunctionKind) {
        let length = self.method_length(method);
        self.heap.set_field(func, js_function_base::METHOD, method.into());
        self.heap
            .set_field(func, js_function_base::BIT_FIELD, TaggedValue::Int(kind.bits()));
        self.heap
            .set_field(func, js_function_base::LENGTH, primitive_u32(length));
        self.heap
            .set_field(func, js_function::PROTO_OR_HCLASS, TaggedValue::HOLE);
        self.heap
            .set_field(func, js_function::HOME_OBJECT, TaggedValue::UNDEFINED);
    }

    fn new_function_with_shape(&mut self, method: HeapRef, shape: ShapeRef) -> HeapResult<LocalRef> {
        let kind = self.method_kind(method);
        let func = self.new_js_function_object(shape)?;
        self.initialize_js_function(func, method, kind);
        Ok(func)
    }

    fn new_js_function_object(&mut self, shape: ShapeRef) -> HeapResult<LocalRef> {
        debug_assert!(self.heap.with_shape(shape, |s| s.ty().is_js_function()));
        self.heap.construct(shape, MemSpace::Young)
    }

    /// A function for `method`, its shape chosen by the method's kind
    pub fn new_js_function(&mut self, method: HeapRef) -> HeapResult<LocalRef> {
        let kind = self.method_kind(method);
        let shape = self.realm().function_class(kind);
        self.new_function_with_shape(method, shape)
    }

    /// A closure over `env`
    pub fn new_js_function_with_env(&mut self, method: HeapRef, env: TaggedValue) -> HeapResult<LocalRef> {
        let func = self.new_js_function(method)?;
        self.heap.set_field(func, js_function::LEXICAL_ENV, env);
        Ok(func)
    }

    /// `target.bind(this, ...args)`
    pub fn new_js_bound_function(
        &mut self,
        target: HeapRef,
        bound_this: TaggedValue,
        args: &[TaggedValue],
    ) -> HeapResult<LocalRef> {
        if !self.heap.with_shape(self.heap.shape_of(target), |s| s.is_callable()) {
            return Err(HeapError::type_error("bind target is not callable"));
        }
        let bound_args = self.new_tagged_array_from(args.to_vec(), MemSpace::Young)?;
        let target_length = self
            .heap
            .field(target, js_function_base::LENGTH)
            .as_number()
            .map_or(0, |n| n as u32);

        let shape = self.realm().bound_function_class();
        let bound = self.heap.construct(shape, MemSpace::Young)?;
        self.heap
            .set_field(bound, js_bound_function::BOUND_TARGET, target.into());
        self.heap
            .set_field(bound, js_bound_function::BOUND_THIS, bound_this);
        self.heap
            .set_field(bound, js_bound_function::BOUND_ARGUMENTS, bound_args.into());
        self.heap.set_field(
            bound,
            js_function_base::LENGTH,
            primitive_u32(target_length.saturating_sub(args.len() as u32)),
        );
        Ok(bound)
    }

    /// A new function sharing `func`'s shape and method
    ///
    /// The in-object `length` slot, the declared length and the module are
    /// copied; the environment and home object are left for the caller.
    pub fn clone_js_function(&mut self, func: HeapRef) -> HeapResult<LocalRef> {
        let shape = self.heap.shape_of(func);
        let method = self.heap.field(func, js_function_base::METHOD);
        let Some(method) = method.heap_ref() else {
            panic!("function {func:?} has no method");
        };
        let clone = self.new_function_with_shape(method, shape)?;
        self.copy_function_identity(func, clone)?;
        Ok(clone)
    }

    pub(crate) fn copy_function_identity(&mut self, from: HeapRef, to: LocalRef) -> HeapResult<()> {
        if self.heap.with_shape(self.heap.shape_of(from), |s| s.inline_capacity() > 0) {
            let length = self.heap.inline_value(from, 0);
            self.heap.set_inline(to.into(), 0, length)?;
        }
        let length = self.heap.field(from, js_function_base::LENGTH);
        self.heap.set_field(to, js_function_base::LENGTH, length);
        let module = self.heap.field(from, js_function::MODULE);
        self.heap.set_field(to, js_function::MODULE, module);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_bits_round_trip() {
        for &kind in FunctionKind::ALL {
            assert_eq!(FunctionKind::from_bits(kind.bits()), Some(kind));
        }
        assert_eq!(FunctionKind::from_bits(-1), None);
    }

    #[test]
    fn test_kind_types() {
        assert_eq!(FunctionKind::Normal.js_type(), JsType::JsFunction);
        assert_eq!(FunctionKind::AsyncArrow.js_type(), JsType::JsAsyncFunction);
        assert!(!FunctionKind::Arrow.has_prototype());
        assert!(FunctionKind::DerivedConstructor.is_class_constructor());
    }
}
