use super::ObjectFactory;
use crate::env_constants::ConstantString;
use crate::error::{HeapError, HeapResult};
use crate::property::PropertyAttributes;
use crate::types::JsType;
use crate::value::TaggedValue;

/// Native error constructors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorType {
    Error,
    EvalError,
    RangeError,
    ReferenceError,
    TypeError,
    AggregateError,
    UriError,
    SyntaxError,
    OomError,
    TerminationError,
}

impl ErrorType {
    pub const ALL: &'static [ErrorType] = &[
        ErrorType::Error,
        ErrorType::EvalError,
        ErrorType::RangeError,
        ErrorType::ReferenceError,
        ErrorType::TypeError,
        ErrorType::AggregateError,
        ErrorType::UriError,
        ErrorType::SyntaxError,
        ErrorType::OomError,
        ErrorType::TerminationError,
    ];

    pub const fn js_type(self) -> JsType {
        match self {
            ErrorType::Error => JsType::JsError,
            ErrorType::EvalError => JsType::JsEvalError,
            ErrorType::RangeError => JsType::JsRangeError,
            ErrorType::ReferenceError => JsType::JsReferenceError,
            ErrorType::TypeError => JsType::JsTypeError,
            ErrorType::AggregateError => JsType::JsAggregateError,
            ErrorType::UriError => JsType::JsUriError,
            ErrorType::SyntaxError => JsType::JsSyntaxError,
            ErrorType::OomError => JsType::JsOomError,
            ErrorType::TerminationError => JsType::JsTerminationError,
        }
    }
}

impl ObjectFactory<'_> {
    /// An error object with `message`
    ///
    /// While an exception is pending it is returned unchanged instead.
    pub fn new_js_error(&mut self, error: ErrorType, message: &str) -> HeapResult<TaggedValue> {
        if let Some(pending) = self.heap.pending_exception() {
            return Ok(pending);
        }
        let shape = self.realm().error_class(error);
        let obj = self.new_js_object(shape)?;
        let message = self.new_line_string(message)?;
        self.heap.add_property(
            obj.into(),
            ConstantString::Message.key(),
            message.into(),
            PropertyAttributes::data_with(true, false, true),
        )?;
        Ok(obj.into())
    }

    /// Make a new error the pending exception; returns the exception marker
    pub fn throw_error(&mut self, error: ErrorType, message: &str) -> TaggedValue {
        match self.new_js_error(error, message) {
            Ok(exception) => self.heap.set_pending_exception(exception),
            Err(_) => return self.throw_oom_error(),
        }
        TaggedValue::EXCEPTION
    }

    /// Make the preallocated out-of-memory error the pending exception
    pub fn throw_oom_error(&mut self) -> TaggedValue {
        let oom = self.realm().oom_error();
        self.heap.set_pending_exception(oom.into());
        TaggedValue::EXCEPTION
    }

    /// Turn a heap failure into a pending exception
    pub fn throw_heap_error(&mut self, err: &HeapError) -> TaggedValue {
        tracing::debug!(target: "otter::heap", error = %err, "heap error raised as exception");
        match err {
            HeapError::OutOfMemory { .. } => self.throw_oom_error(),
            HeapError::TypeError(message) => self.throw_error(ErrorType::TypeError, message),
            HeapError::RangeError(message) => self.throw_error(ErrorType::RangeError, message),
            other => self.throw_error(ErrorType::Error, &other.to_string()),
        }
    }
}
