//! Declared field tables for every layout class
//!
//! Parents are declared before their children. Field order is layout order.

use super::{ClassDecl, FieldDecl, FieldDefault, Payload};
use crate::types::JsType;

const TAGGED_OBJECT: &str = "TAGGED_OBJECT";
const ECMA_OBJECT: &str = "ECMA_OBJECT";
const BASE_STRING: &str = "BASE_STRING";
const TAGGED_NODE: &str = "TAGGED_NODE";
const JS_OBJECT: &str = "JS_OBJECT";
const JS_FUNCTION_BASE: &str = "JS_FUNCTION_BASE";
const JS_FUNCTION: &str = "JS_FUNCTION";
const JS_GENERATOR_OBJECT: &str = "JS_GENERATOR_OBJECT";
const JS_TYPED_ARRAY: &str = "JS_TYPED_ARRAY";
const JS_SHARED_TYPED_ARRAY: &str = "JS_SHARED_TYPED_ARRAY";
const TAGGED_ARRAY: &str = "TAGGED_ARRAY";
const MUTANT_TAGGED_ARRAY: &str = "MUTANT_TAGGED_ARRAY";
const MODULE_RECORD: &str = "MODULE_RECORD";
const PROFILE_TYPE_INFO_CELL_0: &str = "PROFILE_TYPE_INFO_CELL_0";

const fn t(name: &'static str) -> FieldDecl {
    FieldDecl::tagged(name, FieldDefault::Undefined)
}

const fn td(name: &'static str, default: FieldDefault) -> FieldDecl {
    FieldDecl::tagged(name, default)
}

const fn u32f(name: &'static str) -> FieldDecl {
    FieldDecl::u32(name, 0)
}

const fn u64f(name: &'static str) -> FieldDecl {
    FieldDecl::u64(name)
}

const fn flag(name: &'static str, value: bool) -> FieldDecl {
    FieldDecl::boolean(name, value)
}

const fn class(ty: JsType, parent: &'static str, fields: &'static [FieldDecl]) -> ClassDecl {
    ClassDecl::concrete(ty, parent, fields)
}

const TYPED_ARRAY_FIELDS: &[FieldDecl] = &[
    t("ViewedArrayBufferOrByteArray"),
    t("TypedArrayName"),
    u32f("ByteLength"),
    u32f("ByteOffset"),
    u32f("ArrayLength"),
    u32f("ContentType"),
];

const PROFILE_CELL_FIELDS: &[FieldDecl] = &[t("Value"), t("MachineCode"), t("BaselineCode"), t("Handle")];

const COLLECTION_ITERATOR_FIELDS: [&[FieldDecl]; 3] = [
    &[t("IteratorMap"), u32f("NextIndex"), u32f("IterationKind")],
    &[t("IteratorSet"), u32f("NextIndex"), u32f("IterationKind")],
    &[t("IteratedArray"), u32f("NextIndex"), u32f("IterationKind")],
];

pub(super) const CLASSES: &[ClassDecl] = &[
    ClassDecl::root(TAGGED_OBJECT, &[FieldDecl::shape_word("HClass")]),
    ClassDecl::abstract_class(ECMA_OBJECT, TAGGED_OBJECT, &[td("Hash", FieldDefault::Int(0))]),
    class(JsType::Invalid, TAGGED_OBJECT, &[]),
    // Plain objects
    class(
        JsType::JsObject,
        ECMA_OBJECT,
        &[
            td("Properties", FieldDefault::EmptyArray),
            td("Elements", FieldDefault::EmptyArray),
        ],
    ),
    class(JsType::JsSharedObject, JS_OBJECT, &[]),
    class(JsType::JsRealm, JS_OBJECT, &[t("Value"), t("GlobalEnv")]),
    // Functions
    class(JsType::JsFunctionBase, JS_OBJECT, &[t("Method"), u32f("BitField"), u32f("Length")]),
    class(
        JsType::JsFunction,
        JS_FUNCTION_BASE,
        &[
            td("ProtoOrHClass", FieldDefault::Hole),
            t("LexicalEnv"),
            t("MachineCode"),
            t("BaselineCode"),
            t("RawProfileTypeInfo"),
            t("HomeObject"),
            t("Module"),
        ],
    ),
    class(JsType::JsSharedFunction, JS_FUNCTION, &[]),
    class(JsType::JsProxyRevocFunction, JS_FUNCTION, &[t("RevocableProxy")]),
    class(
        JsType::JsPromiseReactionsFunction,
        JS_FUNCTION,
        &[t("Promise"), t("AlreadyResolved")],
    ),
    class(JsType::JsPromiseExecutorFunction, JS_FUNCTION, &[t("Capability")]),
    class(JsType::JsAsyncModuleFulfilledFunction, JS_FUNCTION, &[]),
    class(JsType::JsAsyncModuleRejectedFunction, JS_FUNCTION, &[]),
    class(JsType::JsAsyncFromSyncIterUnwarpFunction, JS_FUNCTION, &[t("Done")]),
    class(
        JsType::JsPromiseAllResolveElementFunction,
        JS_FUNCTION,
        &[
            t("Index"),
            t("Values"),
            t("Capabilities"),
            t("RemainingElements"),
            t("AlreadyCalled"),
        ],
    ),
    class(
        JsType::JsAsyncGeneratorResumeNextReturnProcessorRstFtn,
        JS_FUNCTION,
        &[t("AsyncGeneratorObject")],
    ),
    class(
        JsType::JsPromiseAnyRejectElementFunction,
        JS_FUNCTION,
        &[
            t("Errors"),
            t("Capability"),
            t("RemainingElements"),
            t("AlreadyCalled"),
            u32f("Index"),
        ],
    ),
    class(
        JsType::JsPromiseAllSettledElementFunction,
        JS_FUNCTION,
        &[
            t("AlreadyCalled"),
            t("Values"),
            t("Capability"),
            t("RemainingElements"),
            u32f("Index"),
        ],
    ),
    class(JsType::JsPromiseFinallyFunction, JS_FUNCTION, &[t("Constructor"), t("OnFinally")]),
    class(JsType::JsPromiseValueThunkOrThrowerFunction, JS_FUNCTION, &[t("Result")]),
    class(JsType::JsGeneratorFunction, JS_FUNCTION, &[]),
    class(JsType::JsAsyncGeneratorFunction, JS_FUNCTION, &[]),
    class(JsType::JsAsyncFunction, JS_FUNCTION, &[]),
    class(JsType::JsSharedAsyncFunction, JS_FUNCTION, &[]),
    class(
        JsType::JsIntlBoundFunction,
        JS_FUNCTION,
        &[t("NumberFormat"), t("DateTimeFormat"), t("Collator")],
    ),
    class(JsType::JsAsyncAwaitStatusFunction, JS_FUNCTION, &[t("AsyncContext")]),
    class(
        JsType::JsBoundFunction,
        JS_FUNCTION_BASE,
        &[t("BoundTarget"), t("BoundThis"), t("BoundArguments")],
    ),
    // Errors
    class(JsType::JsError, JS_OBJECT, &[]),
    class(JsType::JsEvalError, JS_OBJECT, &[]),
    class(JsType::JsRangeError, JS_OBJECT, &[]),
    class(JsType::JsReferenceError, JS_OBJECT, &[]),
    class(JsType::JsTypeError, JS_OBJECT, &[]),
    class(JsType::JsAggregateError, JS_OBJECT, &[]),
    class(JsType::JsUriError, JS_OBJECT, &[]),
    class(JsType::JsSyntaxError, JS_OBJECT, &[]),
    class(JsType::JsOomError, JS_OBJECT, &[]),
    class(JsType::JsTerminationError, JS_OBJECT, &[]),
    // Built-in object kinds
    class(
        JsType::JsRegExp,
        JS_OBJECT,
        &[
            t("ByteCodeBuffer"),
            t("OriginalSource"),
            td("OriginalFlags", FieldDefault::Int(0)),
            t("GroupName"),
            u32f("Length"),
        ],
    ),
    class(JsType::JsSet, JS_OBJECT, &[t("LinkedSet")]),
    class(JsType::JsSharedSet, JS_OBJECT, &[t("LinkedSet"), u32f("ModRecord")]),
    class(JsType::JsMap, JS_OBJECT, &[t("LinkedMap")]),
    class(JsType::JsSharedMap, JS_OBJECT, &[t("LinkedMap"), u32f("ModRecord")]),
    class(JsType::JsWeakMap, JS_OBJECT, &[t("LinkedMap")]),
    class(JsType::JsWeakSet, JS_OBJECT, &[t("LinkedSet")]),
    class(JsType::JsWeakRef, JS_OBJECT, &[t("WeakObject")]),
    class(
        JsType::JsFinalizationRegistry,
        JS_OBJECT,
        &[
            t("CleanupCallback"),
            t("NoUnregister"),
            t("MaybeUnregister"),
            td("Next", FieldDefault::Null),
            td("Prev", FieldDefault::Null),
        ],
    ),
    class(
        JsType::JsDate,
        JS_OBJECT,
        &[
            td("TimeValue", FieldDefault::Double(0.0)),
            td("LocalOffset", FieldDefault::Double(f64::MAX)),
        ],
    ),
    // Iterators
    class(JsType::JsIterator, JS_OBJECT, &[]),
    class(JsType::JsAsynciterator, JS_OBJECT, &[]),
    class(JsType::JsAsyncFromSyncIterator, JS_OBJECT, &[t("SyncIteratorRecord")]),
    class(
        JsType::JsForinIterator,
        JS_OBJECT,
        &[t("Object"), t("CachedHClass"), t("Keys"), u32f("Index"), u32f("Length")],
    ),
    class(JsType::JsMapIterator, JS_OBJECT, COLLECTION_ITERATOR_FIELDS[0]),
    class(JsType::JsSharedMapIterator, JS_OBJECT, COLLECTION_ITERATOR_FIELDS[0]),
    class(JsType::JsSetIterator, JS_OBJECT, COLLECTION_ITERATOR_FIELDS[1]),
    class(JsType::JsSharedSetIterator, JS_OBJECT, COLLECTION_ITERATOR_FIELDS[1]),
    class(
        JsType::JsRegExpIterator,
        JS_OBJECT,
        &[t("IteratingRegExp"), t("IteratedString"), u32f("BitField")],
    ),
    class(JsType::JsApiArraylistIterator, JS_OBJECT, &[t("IteratedArrayList"), u32f("NextIndex")]),
    class(JsType::JsApiDequeIterator, JS_OBJECT, &[t("IteratedDeque"), u32f("NextIndex")]),
    class(
        JsType::JsApiHashmapIterator,
        JS_OBJECT,
        &[t("IteratedHashMap"), t("TaggedQueue"), t("CurrentNodeResult"), u32f("BitField")],
    ),
    class(
        JsType::JsApiHashsetIterator,
        JS_OBJECT,
        &[t("IteratedHashSet"), t("TaggedQueue"), t("CurrentNodeResult"), u32f("BitField")],
    ),
    class(
        JsType::JsApiLightWeightMapIterator,
        JS_OBJECT,
        &[t("IteratedLightWeightMap"), u32f("BitField")],
    ),
    class(
        JsType::JsApiLightWeightSetIterator,
        JS_OBJECT,
        &[t("IteratedLightWeightSet"), u32f("BitField")],
    ),
    class(JsType::JsApiPlainArrayIterator, JS_OBJECT, &[t("IteratedPlainArray"), u32f("BitField")]),
    class(JsType::JsApiQueueIterator, JS_OBJECT, &[t("IteratedQueue"), u32f("NextIndex")]),
    class(JsType::JsApiStackIterator, JS_OBJECT, &[t("IteratedStack"), u32f("NextIndex")]),
    class(JsType::JsApiTreemapIterator, JS_OBJECT, &[t("IteratedMap"), t("Entries"), u32f("BitField")]),
    class(JsType::JsApiTreesetIterator, JS_OBJECT, &[t("IteratedSet"), t("Entries"), u32f("BitField")]),
    class(JsType::JsApiVectorIterator, JS_OBJECT, &[t("IteratedVector"), u32f("NextIndex")]),
    class(JsType::JsApiBitvectorIterator, JS_OBJECT, &[t("IteratedBitVector"), u32f("NextIndex")]),
    class(JsType::JsApiLinkedListIterator, JS_OBJECT, &[t("IteratedLinkedList"), u32f("DataIndex")]),
    class(JsType::JsApiListIterator, JS_OBJECT, &[t("IteratedList"), u32f("DataIndex")]),
    class(JsType::JsArrayIterator, JS_OBJECT, COLLECTION_ITERATOR_FIELDS[2]),
    class(JsType::JsSharedArrayIterator, JS_OBJECT, COLLECTION_ITERATOR_FIELDS[2]),
    class(
        JsType::JsSegmentIterator,
        JS_OBJECT,
        &[t("IcuField"), t("IteratedString"), t("UnicodeString")],
    ),
    class(
        JsType::JsStringIterator,
        JS_OBJECT,
        &[t("IteratedString"), u32f("StringIteratorNextIndex")],
    ),
    // Intl holders
    class(JsType::JsIntl, JS_OBJECT, &[t("FallbackSymbol")]),
    class(JsType::JsLocale, JS_OBJECT, &[t("IcuField")]),
    class(
        JsType::JsDateTimeFormat,
        JS_OBJECT,
        &[
            t("Locale"),
            t("Calendar"),
            t("NumberingSystem"),
            t("TimeZone"),
            t("LocaleIcu"),
            t("SimpleDateTimeFormatIcu"),
            t("Iso8601"),
            t("BoundFormat"),
        ],
    ),
    class(
        JsType::JsRelativeTimeFormat,
        JS_OBJECT,
        &[t("Locale"), t("NumberingSystem"), t("IcuField")],
    ),
    class(
        JsType::JsNumberFormat,
        JS_OBJECT,
        &[
            t("Locale"),
            t("NumberingSystem"),
            t("Currency"),
            t("Unit"),
            t("MinimumIntegerDigits"),
            t("MinimumFractionDigits"),
            t("MaximumFractionDigits"),
            t("MinimumSignificantDigits"),
            t("MaximumSignificantDigits"),
            t("UseGrouping"),
            t("BoundFormat"),
            t("IcuField"),
        ],
    ),
    class(
        JsType::JsCollator,
        JS_OBJECT,
        &[t("IcuField"), t("Locale"), t("Collation"), t("BoundCompare")],
    ),
    class(
        JsType::JsPluralRules,
        JS_OBJECT,
        &[
            t("Locale"),
            t("MinimumIntegerDigits"),
            t("MinimumFractionDigits"),
            t("MaximumFractionDigits"),
            t("MinimumSignificantDigits"),
            t("MaximumSignificantDigits"),
            t("IcuPR"),
            t("IcuNF"),
        ],
    ),
    class(JsType::JsDisplaynames, JS_OBJECT, &[t("Locale"), t("IcuLDN")]),
    class(JsType::JsListFormat, JS_OBJECT, &[t("Locale"), t("IcuLF")]),
    class(JsType::JsSegmenter, JS_OBJECT, &[t("Locale"), t("IcuField")]),
    class(
        JsType::JsSegments,
        JS_OBJECT,
        &[t("IcuField"), t("SegmentsString"), t("UnicodeString")],
    ),
    // Buffers, promises, generators
    class(
        JsType::JsArrayBuffer,
        JS_OBJECT,
        &[t("ArrayBufferData"), u32f("ArrayBufferByteLength"), u32f("BitField")],
    ),
    class(
        JsType::JsSharedArrayBuffer,
        JS_OBJECT,
        &[
            t("ArrayBufferData"),
            u32f("ArrayBufferByteLength"),
            FieldDecl::u32("BitField", 1),
        ],
    ),
    class(
        JsType::JsSendableArrayBuffer,
        JS_OBJECT,
        &[t("ArrayBufferData"), u32f("ArrayBufferByteLength"), u32f("BitField")],
    ),
    class(
        JsType::JsPromise,
        JS_OBJECT,
        &[
            t("PromiseResult"),
            td("PromiseFulfillReactions", FieldDefault::EmptyQueue),
            td("PromiseRejectReactions", FieldDefault::EmptyQueue),
            u32f("PromiseState"),
            u32f("AsyncTaskId"),
            flag("PromiseIsHandled", false),
        ],
    ),
    class(
        JsType::JsDataView,
        JS_OBJECT,
        &[
            td("DataView", FieldDefault::Bool(false)),
            t("ViewedArrayBuffer"),
            u32f("ByteLength"),
            u32f("ByteOffset"),
        ],
    ),
    class(JsType::JsArguments, JS_OBJECT, &[]),
    class(
        JsType::JsGeneratorObject,
        JS_OBJECT,
        &[
            t("GeneratorContext"),
            t("ResumeResult"),
            u32f("GeneratorState"),
            u32f("ResumeMode"),
        ],
    ),
    class(
        JsType::JsAsyncGeneratorObject,
        JS_OBJECT,
        &[
            t("GeneratorContext"),
            td("AsyncGeneratorQueue", FieldDefault::EmptyQueue),
            t("GeneratorBrand"),
            t("ResumeResult"),
            u32f("AsyncGeneratorState"),
            u32f("ResumeMode"),
        ],
    ),
    class(JsType::JsAsyncFuncObject, JS_GENERATOR_OBJECT, &[t("Promise")]),
    // Arrays and containers
    class(JsType::JsArray, JS_OBJECT, &[u32f("Length"), t("TrackInfo")]),
    class(
        JsType::JsSharedArray,
        JS_OBJECT,
        &[u32f("Length"), t("TrackInfo"), u32f("ModRecord")],
    ),
    class(JsType::JsApiArrayList, JS_OBJECT, &[td("Length", FieldDefault::Int(0))]),
    class(
        JsType::JsApiLightWeightMap,
        JS_OBJECT,
        &[t("Hashes"), t("Keys"), t("Values"), u32f("Length")],
    ),
    class(JsType::JsApiLightWeightSet, JS_OBJECT, &[t("Hashes"), t("Values"), u32f("Length")]),
    class(JsType::JsApiVector, JS_OBJECT, &[u32f("Length")]),
    class(
        JsType::JsApiBitvector,
        JS_OBJECT,
        &[t("NativePointer"), u32f("Length"), u32f("ModRecord")],
    ),
    class(JsType::JsApiLinkedList, JS_OBJECT, &[t("DoubleList")]),
    class(JsType::JsApiList, JS_OBJECT, &[t("SingleList"), u32f("BitField")]),
    class(JsType::JsApiHashMap, JS_OBJECT, &[t("Table"), u32f("Size")]),
    class(JsType::JsApiHashSet, JS_OBJECT, &[t("Table"), u32f("Size")]),
    class(JsType::JsApiTreeMap, JS_OBJECT, &[t("TreeMap")]),
    class(JsType::JsApiTreeSet, JS_OBJECT, &[t("TreeSet")]),
    class(JsType::JsApiDeque, JS_OBJECT, &[u32f("First"), u32f("Last")]),
    class(JsType::JsApiStack, JS_OBJECT, &[u32f("Top")]),
    class(
        JsType::JsApiPlainArray,
        JS_OBJECT,
        &[
            td("Keys", FieldDefault::Int(0)),
            td("Values", FieldDefault::Int(0)),
            u32f("Length"),
        ],
    ),
    class(
        JsType::JsApiQueue,
        JS_OBJECT,
        &[td("Length", FieldDefault::Int(0)), u32f("Front"), u32f("Tail")],
    ),
    // Typed arrays
    class(JsType::JsTypedArray, JS_OBJECT, TYPED_ARRAY_FIELDS),
    class(JsType::JsInt8Array, JS_TYPED_ARRAY, &[]),
    class(JsType::JsUint8Array, JS_TYPED_ARRAY, &[]),
    class(JsType::JsUint8ClampedArray, JS_TYPED_ARRAY, &[]),
    class(JsType::JsInt16Array, JS_TYPED_ARRAY, &[]),
    class(JsType::JsUint16Array, JS_TYPED_ARRAY, &[]),
    class(JsType::JsInt32Array, JS_TYPED_ARRAY, &[]),
    class(JsType::JsUint32Array, JS_TYPED_ARRAY, &[]),
    class(JsType::JsFloat32Array, JS_TYPED_ARRAY, &[]),
    class(JsType::JsFloat64Array, JS_TYPED_ARRAY, &[]),
    class(JsType::JsBigint64Array, JS_TYPED_ARRAY, &[]),
    class(JsType::JsBiguint64Array, JS_TYPED_ARRAY, &[]),
    class(JsType::JsSharedTypedArray, JS_TYPED_ARRAY, &[u32f("ModRecord")]),
    class(JsType::JsSharedInt8Array, JS_SHARED_TYPED_ARRAY, &[]),
    class(JsType::JsSharedUint8Array, JS_SHARED_TYPED_ARRAY, &[]),
    class(JsType::JsSharedUint8ClampedArray, JS_SHARED_TYPED_ARRAY, &[]),
    class(JsType::JsSharedInt16Array, JS_SHARED_TYPED_ARRAY, &[]),
    class(JsType::JsSharedUint16Array, JS_SHARED_TYPED_ARRAY, &[]),
    class(JsType::JsSharedInt32Array, JS_SHARED_TYPED_ARRAY, &[]),
    class(JsType::JsSharedUint32Array, JS_SHARED_TYPED_ARRAY, &[]),
    class(JsType::JsSharedFloat32Array, JS_SHARED_TYPED_ARRAY, &[]),
    class(JsType::JsSharedFloat64Array, JS_SHARED_TYPED_ARRAY, &[]),
    class(JsType::JsSharedBigint64Array, JS_SHARED_TYPED_ARRAY, &[]),
    class(JsType::JsSharedBiguint64Array, JS_SHARED_TYPED_ARRAY, &[]),
    // Wrappers, modules, globals
    class(JsType::JsPrimitiveRef, JS_OBJECT, &[t("Value")]),
    class(
        JsType::JsModuleNamespace,
        JS_OBJECT,
        &[t("Module"), t("Exports"), t("DeregisterProcession")],
    ),
    class(
        JsType::JsCjsModule,
        JS_OBJECT,
        &[t("Id"), t("Path"), t("Exports"), t("Filename"), u32f("Status")],
    ),
    class(JsType::JsCjsExports, JS_OBJECT, &[t("Exports")]),
    class(JsType::JsCjsRequire, JS_OBJECT, &[t("Cache"), t("Parent")]),
    class(JsType::NativeModuleFailureInfo, JS_OBJECT, &[t("ArkNativeModuleFailureInfo")]),
    class(JsType::JsGlobalObject, JS_OBJECT, &[]),
    class(
        JsType::JsProxy,
        ECMA_OBJECT,
        &[t("Target"), t("Handler"), t("Method"), t("PrivateField")],
    ),
    // Hidden class word layout
    class(
        JsType::Hclass,
        TAGGED_OBJECT,
        &[
            u32f("BitField"),
            u32f("BitField1"),
            t("Proto"),
            t("Layout"),
            t("Transitions"),
            t("Parent"),
            t("ProtoChangeMarker"),
            t("ProtoChangeDetails"),
            t("EnumCache"),
            t("DependentInfos"),
            u64f("ProfilerType"),
        ],
    ),
    // Strings
    ClassDecl::abstract_class(
        BASE_STRING,
        TAGGED_OBJECT,
        &[u32f("LengthAndFlags"), u32f("MixHashcode")],
    ),
    class(JsType::LineString, BASE_STRING, &[]).with_payload(Payload::Chars),
    class(JsType::ConstantString, BASE_STRING, &[u64f("ConstantData")]),
    class(
        JsType::SlicedString,
        BASE_STRING,
        &[t("Parent"), u32f("StartIndexAndFlags")],
    ),
    class(JsType::TreeString, BASE_STRING, &[t("First"), t("Second")]),
    class(JsType::Bigint, TAGGED_OBJECT, &[u32f("Length"), flag("Sign", false)])
        .with_payload(Payload::Bytes),
    // Arrays
    class(JsType::TaggedArray, TAGGED_OBJECT, &[u32f("Length"), u32f("ExtraLength")])
        .with_payload(Payload::TaggedSlots),
    class(JsType::MutantTaggedArray, TAGGED_ARRAY, &[]).with_payload(Payload::RawSlots),
    class(JsType::ByteArray, TAGGED_OBJECT, &[u32f("Length"), u32f("Size")])
        .with_payload(Payload::Bytes),
    class(JsType::LexicalEnv, TAGGED_ARRAY, &[]).with_payload(Payload::TaggedSlots),
    class(JsType::SendableEnv, TAGGED_ARRAY, &[]).with_payload(Payload::TaggedSlots),
    class(JsType::TaggedDictionary, TAGGED_ARRAY, &[]).with_payload(Payload::Dictionary),
    class(JsType::ConstantPool, TAGGED_ARRAY, &[]).with_payload(Payload::TaggedSlots),
    class(JsType::ProfileTypeInfo, TAGGED_ARRAY, &[]).with_payload(Payload::TaggedSlots),
    class(JsType::CowMutantTaggedArray, MUTANT_TAGGED_ARRAY, &[]).with_payload(Payload::RawSlots),
    class(JsType::CowTaggedArray, TAGGED_ARRAY, &[]).with_payload(Payload::TaggedSlots),
    // Container nodes
    ClassDecl::abstract_class(TAGGED_NODE, TAGGED_OBJECT, &[t("Hash"), t("Key"), t("Value")]),
    class(JsType::LinkedNode, TAGGED_NODE, &[t("Next")]),
    class(
        JsType::RbTreenode,
        TAGGED_NODE,
        &[t("Left"), t("Right"), td("IsRed", FieldDefault::Bool(true)), u32f("Count")],
    ),
    // Free space fillers
    class(JsType::FreeObjectWithOneField, TAGGED_OBJECT, &[u64f("Next")]),
    class(JsType::FreeObjectWithNoneField, TAGGED_OBJECT, &[]),
    class(JsType::FreeObjectWithTwoField, TAGGED_OBJECT, &[u64f("Next"), u64f("Available")]),
    class(
        JsType::JsNativePointer,
        TAGGED_OBJECT,
        &[u64f("BindingSize"), u64f("ExternalPointer"), u64f("DeleteCallback")],
    ),
    class(JsType::GlobalEnv, TAGGED_OBJECT, &[]).with_payload(Payload::TaggedSlots),
    // Records
    class(JsType::AccessorData, TAGGED_OBJECT, &[t("Getter"), t("Setter")]),
    class(JsType::InternalAccessor, TAGGED_OBJECT, &[u64f("Getter"), u64f("Setter")]),
    class(
        JsType::Symbol,
        TAGGED_OBJECT,
        &[t("Description"), u32f("Flags"), u32f("HashField")],
    ),
    class(
        JsType::JsGeneratorContext,
        TAGGED_OBJECT,
        &[
            t("RegsArray"),
            t("Method"),
            t("This"),
            t("Acc"),
            t("GeneratorObject"),
            t("LexicalEnv"),
            u32f("NRegs"),
            u32f("BcOffset"),
        ],
    ),
    class(
        JsType::PrototypeHandler,
        TAGGED_OBJECT,
        &[t("HandlerInfo"), t("ProtoCell"), t("Holder"), t("AccessorJSFunction")],
    ),
    class(JsType::TransitionHandler, TAGGED_OBJECT, &[t("HandlerInfo"), t("TransitionHClass")]),
    class(
        JsType::TransWithProtoHandler,
        TAGGED_OBJECT,
        &[t("HandlerInfo"), t("TransitionHClass"), t("ProtoCell")],
    ),
    class(
        JsType::StoreTsHandler,
        TAGGED_OBJECT,
        &[t("HandlerInfo"), t("ProtoCell"), t("Holder")],
    ),
    class(JsType::PropertyBox, TAGGED_OBJECT, &[t("Value")]),
    class(JsType::ProtoChangeMarker, TAGGED_OBJECT, &[u32f("BitField")]),
    class(JsType::MarkerCell, TAGGED_OBJECT, &[u32f("BitField")]),
    class(
        JsType::TrackInfo,
        TAGGED_OBJECT,
        &[t("CachedHClass"), t("CachedFunc"), u32f("BitField"), u32f("ArrayLength")],
    ),
    class(JsType::PrototypeInfo, TAGGED_OBJECT, &[t("ChangeListener"), u32f("RegisterIndex")]),
    class(JsType::TemplateMap, TAGGED_ARRAY, &[]).with_payload(Payload::Dictionary),
    class(JsType::Program, ECMA_OBJECT, &[t("MainFunction")]),
    class(
        JsType::Method,
        TAGGED_OBJECT,
        &[
            t("ConstantPool"),
            u64f("CallField"),
            u64f("LiteralInfo"),
            u64f("ExtraLiteralInfo"),
            u64f("NativePointer"),
        ],
    ),
    class(JsType::ClassLiteral, TAGGED_OBJECT, &[t("Array"), flag("IsAOTUsed", false)]),
    class(
        JsType::PromiseCapability,
        TAGGED_OBJECT,
        &[t("Promise"), t("Resolve"), t("Reject")],
    ),
    class(JsType::PromiseRecord, TAGGED_OBJECT, &[t("Value")]),
    class(
        JsType::ResolvingFunctionsRecord,
        TAGGED_OBJECT,
        &[t("ResolveFunction"), t("RejectFunction")],
    ),
    class(
        JsType::PromiseReactions,
        TAGGED_OBJECT,
        &[t("PromiseCapability"), t("Handler"), u32f("Type")],
    ),
    class(JsType::AsyncGeneratorRequest, TAGGED_OBJECT, &[t("Completion"), t("Capability")]),
    class(
        JsType::AsyncIteratorRecord,
        TAGGED_OBJECT,
        &[t("Iterator"), t("NextMethod"), flag("Done", false)],
    ),
    class(JsType::PromiseIteratorRecord, TAGGED_OBJECT, &[t("Iterator"), flag("Done", false)]),
    class(
        JsType::MicroJobQueue,
        TAGGED_OBJECT,
        &[t("PromiseJobQueue"), t("ScriptJobQueue")],
    ),
    class(JsType::PendingJob, TAGGED_OBJECT, &[t("Job"), t("Arguments")]),
    class(JsType::ModuleRecord, TAGGED_OBJECT, &[]),
    class(
        JsType::SourceTextModuleRecord,
        MODULE_RECORD,
        &[
            t("Environment"),
            t("Namespace"),
            t("ModuleRequests"),
            t("RequestedModules"),
            t("ImportEntries"),
            t("LocalExportEntries"),
            t("IndirectExportEntries"),
            t("StarExportEntries"),
            t("NameDictionary"),
            t("CycleRoot"),
            t("TopLevelCapability"),
            t("AsyncParentModules"),
            t("SendableEnv"),
            t("Exception"),
            u32f("Status"),
        ],
    ),
    class(
        JsType::ImportentryRecord,
        TAGGED_OBJECT,
        &[t("ImportName"), t("LocalName"), u32f("ModuleRequestIndex")],
    ),
    class(JsType::LocalExportentryRecord, TAGGED_OBJECT, &[t("ExportName"), t("LocalName")]),
    class(
        JsType::IndirectExportentryRecord,
        TAGGED_OBJECT,
        &[t("ExportName"), t("ImportName"), u32f("ModuleRequestIndex")],
    ),
    class(JsType::StarExportentryRecord, TAGGED_OBJECT, &[t("ModuleRequest")]),
    class(JsType::ResolvedbindingRecord, TAGGED_OBJECT, &[t("Module"), t("BindingName")]),
    class(
        JsType::ResolvedindexbindingRecord,
        TAGGED_OBJECT,
        &[t("Module"), u32f("Index"), u32f("BitField")],
    ),
    class(
        JsType::ResolvedrecordindexbindingRecord,
        TAGGED_OBJECT,
        &[t("ModuleRecord"), t("AbcFileName"), u32f("Index")],
    ),
    class(
        JsType::ResolvedrecordbindingRecord,
        TAGGED_OBJECT,
        &[t("ModuleRecord"), t("BindingName")],
    ),
    class(JsType::CellRecord, TAGGED_OBJECT, &[t("WeakRefTarget"), t("HeldValue")]),
    class(JsType::CompletionRecord, TAGGED_OBJECT, &[t("Value"), u32f("Type")]),
    class(
        JsType::MachineCodeObject,
        TAGGED_OBJECT,
        &[u32f("InstructionSize"), u32f("StackMapSize")],
    )
    .with_payload(Payload::Bytes),
    class(
        JsType::ClassInfoExtractor,
        TAGGED_OBJECT,
        &[
            t("NonStaticKeys"),
            t("NonStaticProperties"),
            t("NonStaticElements"),
            t("StaticKeys"),
            t("StaticProperties"),
            t("StaticElements"),
            t("ConstructorMethod"),
            u32f("BitField"),
        ],
    ),
    class(JsType::ProfileTypeInfoCell0, TAGGED_OBJECT, PROFILE_CELL_FIELDS),
    class(JsType::ProfileTypeInfoCell1, PROFILE_TYPE_INFO_CELL_0, &[]),
    class(JsType::ProfileTypeInfoCellN, PROFILE_TYPE_INFO_CELL_0, &[]),
    class(
        JsType::ExtraProfileTypeInfo,
        TAGGED_OBJECT,
        &[t("ReceiverObject"), t("HolderObject")],
    ),
    class(
        JsType::FunctionTemplate,
        TAGGED_OBJECT,
        &[t("Method"), t("Module"), t("RawProfileTypeInfo"), u32f("Length")],
    ),
    class(JsType::Vtable, TAGGED_ARRAY, &[]).with_payload(Payload::TaggedSlots),
    class(JsType::AotLiteralInfo, TAGGED_ARRAY, &[]).with_payload(Payload::TaggedSlots),
];
