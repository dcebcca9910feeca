//! The semantic type representation: what a `faxc_par::ast::TypeSpecifier`
//! lowers to once names have been resolved to definitions.
//!
//! Unlike the AST's `TypeSpecifier`, which carries a `Path` that may or may
//! not resolve to anything, `Type` always refers to a concrete `DefId` for
//! named types — lowering a `TypeSpecifier` can fail (unknown name,
//! dependent name not yet resolvable) and produces `Type::Error` rather than
//! panicking, the same recovery style `faxc-par` uses for malformed syntax.

use faxc_util::DefId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    Error,
    Void,
    Bool,
    Char,
    Char8T,
    Char16T,
    Char32T,
    WCharT,
    SChar,
    UChar,
    Short,
    UShort,
    Int,
    UInt,
    Long,
    ULong,
    LongLong,
    ULongLong,
    Float,
    Double,
    LongDouble,
    /// A class/struct/union/enum definition.
    Record(DefId),
    /// An unsubstituted template parameter, kept symbolic until
    /// instantiation supplies a concrete argument.
    TemplateParam(DefId),
    Pointer(Box<Type>, CvQualifiers),
    LValueRef(Box<Type>),
    RValueRef(Box<Type>),
    Array(Box<Type>, Option<u64>),
    Function { params: Vec<Type>, ret: Box<Type>, is_variadic: bool },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CvQualifiers {
    pub is_const: bool,
    pub is_volatile: bool,
}

impl Type {
    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            Type::Bool
                | Type::Char
                | Type::Char8T
                | Type::Char16T
                | Type::Char32T
                | Type::WCharT
                | Type::SChar
                | Type::UChar
                | Type::Short
                | Type::UShort
                | Type::Int
                | Type::UInt
                | Type::Long
                | Type::ULong
                | Type::LongLong
                | Type::ULongLong
                | Type::Float
                | Type::Double
                | Type::LongDouble
        )
    }

    pub fn is_integral(&self) -> bool {
        self.is_arithmetic() && !matches!(self, Type::Float | Type::Double | Type::LongDouble)
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, Type::Pointer(..))
    }

    /// Rank used by integral promotion and the usual arithmetic
    /// conversions: wider types win, signed loses to unsigned of the same
    /// or greater width. Not a complete conversion-rank ladder (overload
    /// resolution's implicit-conversion sequence does more than this), just
    /// the common-type computation for binary arithmetic.
    pub fn arithmetic_rank(&self) -> u8 {
        match self {
            Type::Bool => 0,
            Type::Char | Type::SChar | Type::UChar | Type::Char8T => 1,
            Type::Short | Type::UShort | Type::Char16T => 2,
            Type::Int | Type::UInt | Type::Char32T | Type::WCharT => 3,
            Type::Long | Type::ULong => 4,
            Type::LongLong | Type::ULongLong => 5,
            Type::Float => 6,
            Type::Double => 7,
            Type::LongDouble => 8,
            _ => 0,
        }
    }

    pub fn is_unsigned(&self) -> bool {
        matches!(
            self,
            Type::UChar | Type::UShort | Type::UInt | Type::ULong | Type::ULongLong | Type::Char8T
        )
    }
}
