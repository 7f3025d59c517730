//! Heap object type tags
//!
//! The declaration order is part of the binary layout contract: compiled
//! code compares tags by range, so new kinds are appended inside the range
//! they belong to and never reordered.

use std::fmt;

macro_rules! js_types {
    ($($variant:ident => $name:literal,)*) => {
        /// Type tag of a heap object
        #[repr(u8)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum JsType {
            $(
                #[doc = $name]
                $variant,
            )*
        }

        impl JsType {
            /// Every tag in declaration order
            pub const ALL: &'static [JsType] = &[$(JsType::$variant,)*];

            /// Canonical upper-snake name
            pub const fn name(self) -> &'static str {
                match self {
                    $(JsType::$variant => $name,)*
                }
            }
        }
    };
}

js_types! {
    Invalid => "INVALID",
    JsObject => "JS_OBJECT",
    JsSharedObject => "JS_SHARED_OBJECT",
    JsRealm => "JS_REALM",
    JsFunctionBase => "JS_FUNCTION_BASE",
    JsFunction => "JS_FUNCTION",
    JsSharedFunction => "JS_SHARED_FUNCTION",
    JsProxyRevocFunction => "JS_PROXY_REVOC_FUNCTION",
    JsPromiseReactionsFunction => "JS_PROMISE_REACTIONS_FUNCTION",
    JsPromiseExecutorFunction => "JS_PROMISE_EXECUTOR_FUNCTION",
    JsAsyncModuleFulfilledFunction => "JS_ASYNC_MODULE_FULFILLED_FUNCTION",
    JsAsyncModuleRejectedFunction => "JS_ASYNC_MODULE_REJECTED_FUNCTION",
    JsAsyncFromSyncIterUnwarpFunction => "JS_ASYNC_FROM_SYNC_ITER_UNWARP_FUNCTION",
    JsPromiseAllResolveElementFunction => "JS_PROMISE_ALL_RESOLVE_ELEMENT_FUNCTION",
    JsAsyncGeneratorResumeNextReturnProcessorRstFtn => "JS_ASYNC_GENERATOR_RESUME_NEXT_RETURN_PROCESSOR_RST_FTN",
    JsPromiseAnyRejectElementFunction => "JS_PROMISE_ANY_REJECT_ELEMENT_FUNCTION",
    JsPromiseAllSettledElementFunction => "JS_PROMISE_ALL_SETTLED_ELEMENT_FUNCTION",
    JsPromiseFinallyFunction => "JS_PROMISE_FINALLY_FUNCTION",
    JsPromiseValueThunkOrThrowerFunction => "JS_PROMISE_VALUE_THUNK_OR_THROWER_FUNCTION",
    JsGeneratorFunction => "JS_GENERATOR_FUNCTION",
    JsAsyncGeneratorFunction => "JS_ASYNC_GENERATOR_FUNCTION",
    JsAsyncFunction => "JS_ASYNC_FUNCTION",
    JsSharedAsyncFunction => "JS_SHARED_ASYNC_FUNCTION",
    JsIntlBoundFunction => "JS_INTL_BOUND_FUNCTION",
    JsAsyncAwaitStatusFunction => "JS_ASYNC_AWAIT_STATUS_FUNCTION",
    JsBoundFunction => "JS_BOUND_FUNCTION",
    JsError => "JS_ERROR",
    JsEvalError => "JS_EVAL_ERROR",
    JsRangeError => "JS_RANGE_ERROR",
    JsReferenceError => "JS_REFERENCE_ERROR",
    JsTypeError => "JS_TYPE_ERROR",
    JsAggregateError => "JS_AGGREGATE_ERROR",
    JsUriError => "JS_URI_ERROR",
    JsSyntaxError => "JS_SYNTAX_ERROR",
    JsOomError => "JS_OOM_ERROR",
    JsTerminationError => "JS_TERMINATION_ERROR",
    JsRegExp => "JS_REG_EXP",
    JsSet => "JS_SET",
    JsSharedSet => "JS_SHARED_SET",
    JsMap => "JS_MAP",
    JsSharedMap => "JS_SHARED_MAP",
    JsWeakMap => "JS_WEAK_MAP",
    JsWeakSet => "JS_WEAK_SET",
    JsWeakRef => "JS_WEAK_REF",
    JsFinalizationRegistry => "JS_FINALIZATION_REGISTRY",
    JsDate => "JS_DATE",
    JsIterator => "JS_ITERATOR",
    JsAsynciterator => "JS_ASYNCITERATOR",
    JsAsyncFromSyncIterator => "JS_ASYNC_FROM_SYNC_ITERATOR",
    JsForinIterator => "JS_FORIN_ITERATOR",
    JsMapIterator => "JS_MAP_ITERATOR",
    JsSharedMapIterator => "JS_SHARED_MAP_ITERATOR",
    JsSetIterator => "JS_SET_ITERATOR",
    JsSharedSetIterator => "JS_SHARED_SET_ITERATOR",
    JsRegExpIterator => "JS_REG_EXP_ITERATOR",
    JsApiArraylistIterator => "JS_API_ARRAYLIST_ITERATOR",
    JsApiDequeIterator => "JS_API_DEQUE_ITERATOR",
    JsApiHashmapIterator => "JS_API_HASHMAP_ITERATOR",
    JsApiHashsetIterator => "JS_API_HASHSET_ITERATOR",
    JsApiLightWeightMapIterator => "JS_API_LIGHT_WEIGHT_MAP_ITERATOR",
    JsApiLightWeightSetIterator => "JS_API_LIGHT_WEIGHT_SET_ITERATOR",
    JsApiPlainArrayIterator => "JS_API_PLAIN_ARRAY_ITERATOR",
    JsApiQueueIterator => "JS_API_QUEUE_ITERATOR",
    JsApiStackIterator => "JS_API_STACK_ITERATOR",
    JsApiTreemapIterator => "JS_API_TREEMAP_ITERATOR",
    JsApiTreesetIterator => "JS_API_TREESET_ITERATOR",
    JsApiVectorIterator => "JS_API_VECTOR_ITERATOR",
    JsApiBitvectorIterator => "JS_API_BITVECTOR_ITERATOR",
    JsApiLinkedListIterator => "JS_API_LINKED_LIST_ITERATOR",
    JsApiListIterator => "JS_API_LIST_ITERATOR",
    JsArrayIterator => "JS_ARRAY_ITERATOR",
    JsSharedArrayIterator => "JS_SHARED_ARRAY_ITERATOR",
    JsSegmentIterator => "JS_SEGMENT_ITERATOR",
    JsStringIterator => "JS_STRING_ITERATOR",
    JsIntl => "JS_INTL",
    JsLocale => "JS_LOCALE",
    JsDateTimeFormat => "JS_DATE_TIME_FORMAT",
    JsRelativeTimeFormat => "JS_RELATIVE_TIME_FORMAT",
    JsNumberFormat => "JS_NUMBER_FORMAT",
    JsCollator => "JS_COLLATOR",
    JsPluralRules => "JS_PLURAL_RULES",
    JsDisplaynames => "JS_DISPLAYNAMES",
    JsListFormat => "JS_LIST_FORMAT",
    JsSegmenter => "JS_SEGMENTER",
    JsSegments => "JS_SEGMENTS",
    JsArrayBuffer => "JS_ARRAY_BUFFER",
    JsSharedArrayBuffer => "JS_SHARED_ARRAY_BUFFER",
    JsSendableArrayBuffer => "JS_SENDABLE_ARRAY_BUFFER",
    JsPromise => "JS_PROMISE",
    JsDataView => "JS_DATA_VIEW",
    JsArguments => "JS_ARGUMENTS",
    JsGeneratorObject => "JS_GENERATOR_OBJECT",
    JsAsyncGeneratorObject => "JS_ASYNC_GENERATOR_OBJECT",
    JsAsyncFuncObject => "JS_ASYNC_FUNC_OBJECT",
    JsArray => "JS_ARRAY",
    JsSharedArray => "JS_SHARED_ARRAY",
    JsApiArrayList => "JS_API_ARRAY_LIST",
    JsApiLightWeightMap => "JS_API_LIGHT_WEIGHT_MAP",
    JsApiLightWeightSet => "JS_API_LIGHT_WEIGHT_SET",
    JsApiVector => "JS_API_VECTOR",
    JsApiBitvector => "JS_API_BITVECTOR",
    JsApiLinkedList => "JS_API_LINKED_LIST",
    JsApiList => "JS_API_LIST",
    JsApiHashMap => "JS_API_HASH_MAP",
    JsApiHashSet => "JS_API_HASH_SET",
    JsApiTreeMap => "JS_API_TREE_MAP",
    JsApiTreeSet => "JS_API_TREE_SET",
    JsApiDeque => "JS_API_DEQUE",
    JsApiStack => "JS_API_STACK",
    JsApiPlainArray => "JS_API_PLAIN_ARRAY",
    JsApiQueue => "JS_API_QUEUE",
    JsTypedArray => "JS_TYPED_ARRAY",
    JsInt8Array => "JS_INT8_ARRAY",
    JsUint8Array => "JS_UINT8_ARRAY",
    JsUint8ClampedArray => "JS_UINT8_CLAMPED_ARRAY",
    JsInt16Array => "JS_INT16_ARRAY",
    JsUint16Array => "JS_UINT16_ARRAY",
    JsInt32Array => "JS_INT32_ARRAY",
    JsUint32Array => "JS_UINT32_ARRAY",
    JsFloat32Array => "JS_FLOAT32_ARRAY",
    JsFloat64Array => "JS_FLOAT64_ARRAY",
    JsBigint64Array => "JS_BIGINT64_ARRAY",
    JsBiguint64Array => "JS_BIGUINT64_ARRAY",
    JsSharedTypedArray => "JS_SHARED_TYPED_ARRAY",
    JsSharedInt8Array => "JS_SHARED_INT8_ARRAY",
    JsSharedUint8Array => "JS_SHARED_UINT8_ARRAY",
    JsSharedUint8ClampedArray => "JS_SHARED_UINT8_CLAMPED_ARRAY",
    JsSharedInt16Array => "JS_SHARED_INT16_ARRAY",
    JsSharedUint16Array => "JS_SHARED_UINT16_ARRAY",
    JsSharedInt32Array => "JS_SHARED_INT32_ARRAY",
    JsSharedUint32Array => "JS_SHARED_UINT32_ARRAY",
    JsSharedFloat32Array => "JS_SHARED_FLOAT32_ARRAY",
    JsSharedFloat64Array => "JS_SHARED_FLOAT64_ARRAY",
    JsSharedBigint64Array => "JS_SHARED_BIGINT64_ARRAY",
    JsSharedBiguint64Array => "JS_SHARED_BIGUINT64_ARRAY",
    JsPrimitiveRef => "JS_PRIMITIVE_REF",
    JsModuleNamespace => "JS_MODULE_NAMESPACE",
    JsCjsModule => "JS_CJS_MODULE",
    JsCjsExports => "JS_CJS_EXPORTS",
    JsCjsRequire => "JS_CJS_REQUIRE",
    NativeModuleFailureInfo => "NATIVE_MODULE_FAILURE_INFO",
    JsGlobalObject => "JS_GLOBAL_OBJECT",
    JsProxy => "JS_PROXY",
    Hclass => "HCLASS",
    LineString => "LINE_STRING",
    ConstantString => "CONSTANT_STRING",
    SlicedString => "SLICED_STRING",
    TreeString => "TREE_STRING",
    Bigint => "BIGINT",
    TaggedArray => "TAGGED_ARRAY",
    MutantTaggedArray => "MUTANT_TAGGED_ARRAY",
    ByteArray => "BYTE_ARRAY",
    LexicalEnv => "LEXICAL_ENV",
    SendableEnv => "SENDABLE_ENV",
    TaggedDictionary => "TAGGED_DICTIONARY",
    ConstantPool => "CONSTANT_POOL",
    ProfileTypeInfo => "PROFILE_TYPE_INFO",
    CowMutantTaggedArray => "COW_MUTANT_TAGGED_ARRAY",
    CowTaggedArray => "COW_TAGGED_ARRAY",
    LinkedNode => "LINKED_NODE",
    RbTreenode => "RB_TREENODE",
    FreeObjectWithOneField => "FREE_OBJECT_WITH_ONE_FIELD",
    FreeObjectWithNoneField => "FREE_OBJECT_WITH_NONE_FIELD",
    FreeObjectWithTwoField => "FREE_OBJECT_WITH_TWO_FIELD",
    JsNativePointer => "JS_NATIVE_POINTER",
    GlobalEnv => "GLOBAL_ENV",
    AccessorData => "ACCESSOR_DATA",
    InternalAccessor => "INTERNAL_ACCESSOR",
    Symbol => "SYMBOL",
    JsGeneratorContext => "JS_GENERATOR_CONTEXT",
    PrototypeHandler => "PROTOTYPE_HANDLER",
    TransitionHandler => "TRANSITION_HANDLER",
    TransWithProtoHandler => "TRANS_WITH_PROTO_HANDLER",
    StoreTsHandler => "STORE_TS_HANDLER",
    PropertyBox => "PROPERTY_BOX",
    ProtoChangeMarker => "PROTO_CHANGE_MARKER",
    MarkerCell => "MARKER_CELL",
    TrackInfo => "TRACK_INFO",
    PrototypeInfo => "PROTOTYPE_INFO",
    TemplateMap => "TEMPLATE_MAP",
    Program => "PROGRAM",
    Method => "METHOD",
    ClassLiteral => "CLASS_LITERAL",
    PromiseCapability => "PROMISE_CAPABILITY",
    PromiseRecord => "PROMISE_RECORD",
    ResolvingFunctionsRecord => "RESOLVING_FUNCTIONS_RECORD",
    PromiseReactions => "PROMISE_REACTIONS",
    AsyncGeneratorRequest => "ASYNC_GENERATOR_REQUEST",
    AsyncIteratorRecord => "ASYNC_ITERATOR_RECORD",
    PromiseIteratorRecord => "PROMISE_ITERATOR_RECORD",
    MicroJobQueue => "MICRO_JOB_QUEUE",
    PendingJob => "PENDING_JOB",
    ModuleRecord => "MODULE_RECORD",
    SourceTextModuleRecord => "SOURCE_TEXT_MODULE_RECORD",
    ImportentryRecord => "IMPORTENTRY_RECORD",
    LocalExportentryRecord => "LOCAL_EXPORTENTRY_RECORD",
    IndirectExportentryRecord => "INDIRECT_EXPORTENTRY_RECORD",
    StarExportentryRecord => "STAR_EXPORTENTRY_RECORD",
    ResolvedbindingRecord => "RESOLVEDBINDING_RECORD",
    ResolvedindexbindingRecord => "RESOLVEDINDEXBINDING_RECORD",
    ResolvedrecordindexbindingRecord => "RESOLVEDRECORDINDEXBINDING_RECORD",
    ResolvedrecordbindingRecord => "RESOLVEDRECORDBINDING_RECORD",
    CellRecord => "CELL_RECORD",
    CompletionRecord => "COMPLETION_RECORD",
    MachineCodeObject => "MACHINE_CODE_OBJECT",
    ClassInfoExtractor => "CLASS_INFO_EXTRACTOR",
    ProfileTypeInfoCell0 => "PROFILE_TYPE_INFO_CELL_0",
    ProfileTypeInfoCell1 => "PROFILE_TYPE_INFO_CELL_1",
    ProfileTypeInfoCellN => "PROFILE_TYPE_INFO_CELL_N",
    ExtraProfileTypeInfo => "EXTRA_PROFILE_TYPE_INFO",
    FunctionTemplate => "FUNCTION_TEMPLATE",
    Vtable => "VTABLE",
    AotLiteralInfo => "AOT_LITERAL_INFO",}

impl JsType {
    /// Number of tags
    pub const COUNT: usize = Self::ALL.len();

    /// First plain-object kind
    pub const JS_OBJECT_FIRST: JsType = JsType::JsObject;
    /// Last plain-object kind
    pub const JS_OBJECT_LAST: JsType = JsType::JsGlobalObject;
    /// First ECMAScript object kind
    pub const ECMA_OBJECT_FIRST: JsType = JsType::JsObject;
    /// Last ECMAScript object kind
    pub const ECMA_OBJECT_LAST: JsType = JsType::JsProxy;
    /// First callable function kind
    pub const JS_FUNCTION_FIRST: JsType = JsType::JsFunction;
    /// Last callable function kind
    pub const JS_FUNCTION_LAST: JsType = JsType::JsAsyncAwaitStatusFunction;
    /// First error kind
    pub const JS_ERROR_FIRST: JsType = JsType::JsError;
    /// Last error kind
    pub const JS_ERROR_LAST: JsType = JsType::JsTerminationError;
    /// First iterator kind
    pub const JS_ITERATOR_FIRST: JsType = JsType::JsIterator;
    /// Last iterator kind
    pub const JS_ITERATOR_LAST: JsType = JsType::JsStringIterator;
    /// First typed array kind
    pub const JS_TYPED_ARRAY_FIRST: JsType = JsType::JsTypedArray;
    /// Last typed array kind
    pub const JS_TYPED_ARRAY_LAST: JsType = JsType::JsBiguint64Array;
    /// First shared typed array kind
    pub const JS_SHARED_TYPED_ARRAY_FIRST: JsType = JsType::JsSharedTypedArray;
    /// Last shared typed array kind
    pub const JS_SHARED_TYPED_ARRAY_LAST: JsType = JsType::JsSharedBiguint64Array;
    /// First string kind
    pub const STRING_FIRST: JsType = JsType::LineString;
    /// Last string kind
    pub const STRING_LAST: JsType = JsType::TreeString;
    /// First record kind
    pub const JS_RECORD_FIRST: JsType = JsType::PromiseCapability;
    /// Last record kind
    pub const JS_RECORD_LAST: JsType = JsType::CompletionRecord;
    /// First module record kind
    pub const MODULE_RECORD_FIRST: JsType = JsType::ModuleRecord;
    /// Last module record kind
    pub const MODULE_RECORD_LAST: JsType = JsType::SourceTextModuleRecord;
    /// First profile cell kind
    pub const PROFILE_TYPE_INFO_CELL_FIRST: JsType = JsType::ProfileTypeInfoCell0;
    /// Last profile cell kind
    pub const PROFILE_TYPE_INFO_CELL_LAST: JsType = JsType::ProfileTypeInfoCellN;

    /// Tag from its numeric value
    pub fn from_u8(raw: u8) -> Option<Self> {
        Self::ALL.get(raw as usize).copied()
    }

    /// Tag from its canonical name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|ty| ty.name() == name)
    }

    /// Numeric value
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    const fn in_range(self, first: JsType, last: JsType) -> bool {
        let raw = self as u8;
        raw >= first as u8 && raw <= last as u8
    }

    pub const fn is_js_object(self) -> bool {
        self.in_range(Self::JS_OBJECT_FIRST, Self::JS_OBJECT_LAST)
    }

    pub const fn is_ecma_object(self) -> bool {
        self.in_range(Self::ECMA_OBJECT_FIRST, Self::ECMA_OBJECT_LAST)
    }

    pub const fn is_js_function(self) -> bool {
        self.in_range(Self::JS_FUNCTION_FIRST, Self::JS_FUNCTION_LAST)
    }

    /// Function kinds including bound functions and the abstract base
    pub const fn is_js_function_base(self) -> bool {
        self.in_range(JsType::JsFunctionBase, JsType::JsBoundFunction)
    }

    pub const fn is_js_error(self) -> bool {
        self.in_range(Self::JS_ERROR_FIRST, Self::JS_ERROR_LAST)
    }

    pub const fn is_iterator(self) -> bool {
        self.in_range(Self::JS_ITERATOR_FIRST, Self::JS_ITERATOR_LAST)
    }

    pub const fn is_typed_array(self) -> bool {
        self.in_range(Self::JS_TYPED_ARRAY_FIRST, Self::JS_TYPED_ARRAY_LAST)
    }

    pub const fn is_shared_typed_array(self) -> bool {
        self.in_range(
            Self::JS_SHARED_TYPED_ARRAY_FIRST,
            Self::JS_SHARED_TYPED_ARRAY_LAST,
        )
    }

    pub const fn is_string(self) -> bool {
        self.in_range(Self::STRING_FIRST, Self::STRING_LAST)
    }

    pub const fn is_record(self) -> bool {
        self.in_range(Self::JS_RECORD_FIRST, Self::JS_RECORD_LAST)
    }

    pub const fn is_module_record(self) -> bool {
        self.in_range(Self::MODULE_RECORD_FIRST, Self::MODULE_RECORD_LAST)
    }

    pub const fn is_profile_type_info_cell(self) -> bool {
        self.in_range(
            Self::PROFILE_TYPE_INFO_CELL_FIRST,
            Self::PROFILE_TYPE_INFO_CELL_LAST,
        )
    }

    /// Tagged-array backed containers (length-prefixed slot payload)
    pub const fn is_tagged_array(self) -> bool {
        matches!(
            self,
            JsType::TaggedArray
                | JsType::MutantTaggedArray
                | JsType::CowTaggedArray
                | JsType::CowMutantTaggedArray
                | JsType::LexicalEnv
                | JsType::SendableEnv
                | JsType::TaggedDictionary
                | JsType::ConstantPool
                | JsType::ProfileTypeInfo
                | JsType::TemplateMap
                | JsType::Vtable
                | JsType::AotLiteralInfo
        )
    }

    /// Copy-on-write array kinds
    pub const fn is_cow_array(self) -> bool {
        matches!(self, JsType::CowTaggedArray | JsType::CowMutantTaggedArray)
    }

    /// Arrays holding raw untagged words
    pub const fn is_mutant_array(self) -> bool {
        matches!(
            self,
            JsType::MutantTaggedArray | JsType::CowMutantTaggedArray
        )
    }

    /// Script-visible kinds that only ever live in the shared heap
    pub const fn is_shared_js_kind(self) -> bool {
        matches!(
            self,
            JsType::JsSharedObject
                | JsType::JsSharedFunction
                | JsType::JsSharedAsyncFunction
                | JsType::JsSharedSet
                | JsType::JsSharedMap
                | JsType::JsSharedArray
                | JsType::JsSendableArrayBuffer
        ) || self.is_shared_typed_array()
    }
}

impl fmt::Display for JsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
